use std::fmt;
use std::str::FromStr;

use deck::dom::NodeId;

use crate::error::ViewerError;
use crate::host::HistoryState;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Click { target: NodeId },
    /// Back/forward navigation. `state` is what the entry was pushed with,
    /// or `None` for entries the page never wrote.
    PopState { state: Option<HistoryState> },
    KeyUp(KeyEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    PopState,
    KeyUp,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Click { .. } => EventKind::Click,
            Event::PopState { .. } => EventKind::PopState,
            Event::KeyUp(_) => EventKind::KeyUp,
        }
    }
}

/// What listeners did with an event, ordered by strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dispatch {
    Ignored,
    Handled,
    /// Handled, and the host must skip its own default action.
    DefaultPrevented,
}

/// Listeners registered per event kind, called in registration order.
#[derive(Debug)]
pub struct Listeners<L> {
    entries: Vec<(EventKind, L)>,
}

impl<L> Default for Listeners<L> {
    fn default() -> Self {
        Listeners {
            entries: Vec::new(),
        }
    }
}

impl<L> Listeners<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener(&mut self, kind: EventKind, listener: L) {
        self.entries.push((kind, listener));
    }

    pub fn matching(&self, kind: EventKind) -> impl Iterator<Item = &L> {
        self.entries
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, l)| l)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub fn any(&self) -> bool {
        self.ctrl || self.shift || self.alt || self.meta
    }
}

/// Physical key, named after the DOM `KeyboardEvent.code` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCode {
    ArrowLeft,
    ArrowRight,
    Enter,
    Space,
    KeyN,
    Other(String),
}

impl KeyCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "ArrowLeft" => KeyCode::ArrowLeft,
            "ArrowRight" => KeyCode::ArrowRight,
            "Enter" => KeyCode::Enter,
            "Space" => KeyCode::Space,
            "KeyN" => KeyCode::KeyN,
            other => KeyCode::Other(other.to_string()),
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowRight => "ArrowRight",
            KeyCode::Enter => "Enter",
            KeyCode::Space => "Space",
            KeyCode::KeyN => "KeyN",
            KeyCode::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode) -> Self {
        KeyEvent {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(code: KeyCode, modifiers: Modifiers) -> Self {
        KeyEvent { code, modifiers }
    }
}

/// Parses `[Mod+]...Code`, e.g. `ArrowRight`, `Shift+Space`, `ctrl+n`.
/// Codes are DOM codes; `left`, `right`, `n` and `space` are accepted as
/// shorthands in any case.
impl FromStr for KeyEvent {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let code = parts.pop().unwrap_or_default();
        if code.is_empty() {
            return Err(ViewerError::InvalidKey(s.to_string()));
        }

        let mut modifiers = Modifiers::NONE;
        for part in parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                _ => return Err(ViewerError::InvalidKey(s.to_string())),
            }
        }

        let code = match code.to_ascii_lowercase().as_str() {
            "left" | "arrowleft" => KeyCode::ArrowLeft,
            "right" | "arrowright" => KeyCode::ArrowRight,
            "enter" | "return" => KeyCode::Enter,
            "space" => KeyCode::Space,
            "n" | "keyn" => KeyCode::KeyN,
            _ => KeyCode::from_code(code),
        };

        Ok(KeyEvent { code, modifiers })
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (held, name) in [(m.ctrl, "Ctrl"), (m.shift, "Shift"), (m.alt, "Alt"), (m.meta, "Meta")] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.code.as_code())
    }
}
