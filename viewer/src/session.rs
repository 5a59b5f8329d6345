use tracing::{debug, trace};

use crate::event::Event;
use crate::host::{HistoryState, Host};

/// One entry of the session history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub fragment: Option<String>,
    pub state: Option<HistoryState>,
}

/// An in-memory browser tab: address, title, scroll position and a
/// back/forward history stack.
#[derive(Debug, Clone)]
pub struct Session {
    base: String,
    title: String,
    entries: Vec<HistoryEntry>,
    cursor: usize,
    scroll: (u32, u32),
    left_page: Option<String>,
}

impl Session {
    /// Open `url`, e.g. `deck.md` or `deck.md#3`. The address becomes the
    /// first history entry, with no state.
    pub fn open(url: &str) -> Self {
        let (base, fragment) = match url.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment.to_string())),
            None => (url, None),
        };
        Session {
            base: base.to_string(),
            title: String::new(),
            entries: vec![HistoryEntry {
                fragment,
                state: None,
            }],
            cursor: 0,
            scroll: (0, 0),
            left_page: None,
        }
    }

    /// Full address of the current entry.
    pub fn location(&self) -> String {
        match &self.current().fragment {
            Some(fragment) => format!("{}#{}", self.base, fragment),
            None => self.base.clone(),
        }
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.cursor]
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Position of the current entry within [`Session::history`].
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll_position(&self) -> (u32, u32) {
        self.scroll
    }

    /// Where a followed non-fragment link went, if one was followed.
    pub fn left_page(&self) -> Option<&str> {
        self.left_page.as_deref()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Step back one entry. Returns the popstate event to deliver, or `None`
    /// at the start of the history.
    pub fn back(&mut self) -> Option<Event> {
        if !self.can_go_back() {
            return None;
        }
        self.cursor -= 1;
        trace!(cursor = self.cursor, "history back");
        Some(self.pop_state())
    }

    /// Step forward one entry. Returns `None` at the end of the history.
    pub fn forward(&mut self) -> Option<Event> {
        if !self.can_go_forward() {
            return None;
        }
        self.cursor += 1;
        trace!(cursor = self.cursor, "history forward");
        Some(self.pop_state())
    }

    /// Navigate to `#<fragment>` the way following a link or editing the
    /// address does: a new entry without state, then a popstate event.
    pub fn navigate_fragment(&mut self, fragment: &str) -> Event {
        self.push_entry(HistoryEntry {
            fragment: Some(fragment.to_string()),
            state: None,
        });
        debug!(fragment, "fragment navigation");
        self.pop_state()
    }

    /// Record that the page was left for `url`.
    pub fn leave(&mut self, url: &str) {
        debug!(url, "leaving page");
        self.left_page = Some(url.to_string());
    }

    fn pop_state(&self) -> Event {
        Event::PopState {
            state: self.current().state,
        }
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
    }
}

fn fragment_of(url: &str) -> Option<String> {
    url.split_once('#').map(|(_, fragment)| fragment.to_string())
}

impl Host for Session {
    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }

    fn fragment(&self) -> Option<&str> {
        self.current().fragment.as_deref()
    }

    fn push_state(&mut self, state: HistoryState, url: &str) {
        self.push_entry(HistoryEntry {
            fragment: fragment_of(url),
            state: Some(state),
        });
    }

    fn replace_state(&mut self, state: HistoryState, url: &str) {
        self.entries[self.cursor] = HistoryEntry {
            fragment: fragment_of(url),
            state: Some(state),
        };
    }

    fn scroll_to(&mut self, x: u32, y: u32) {
        self.scroll = (x, y);
    }
}
