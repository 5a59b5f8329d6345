use deck::dom::{Dom, NodeId};
use deck::{TITLE_ATTRIBUTE, TOC_ID};
use tracing::{debug, trace, warn};

use crate::event::{Dispatch, Event, EventKind, KeyCode, KeyEvent, Listeners};
use crate::host::{HistoryState, Host};

/// Class that takes a section out of view.
pub const HIDDEN_CLASS: &str = "hidden";
/// Class marking the table of contents entry of the visible section.
pub const ACTIVE_CLASS: &str = "active";

/// An event handler bound to the controller at registration time.
pub type Listener = fn(&mut PresentationController, &mut Dom, &mut dyn Host, &Event) -> Dispatch;

/// Shows one section of a page at a time and keeps the window title, the
/// table of contents, the prev/next links and the session history in step.
///
/// Section 0 is the table of contents and stays visible. `index` is 0 until
/// the first section is shown, and a valid content position afterwards.
#[derive(Debug)]
pub struct PresentationController {
    sections: Vec<NodeId>,
    nav: Option<NodeId>,
    /// Prev and next links, once created.
    nav_links: (Option<NodeId>, Option<NodeId>),
    index: usize,
    title_prefix: String,
    history_locked: bool,
}

impl PresentationController {
    /// Discover the sections, capture the window title and register the
    /// click, popstate and key-up listeners.
    pub fn new(dom: &Dom, host: &dyn Host, listeners: &mut Listeners<Listener>) -> Self {
        let root = dom.root();
        let sections = dom.elements_by_tag(root, "section");
        let nav = dom.elements_by_tag(root, "nav").first().copied();

        listeners.add_event_listener(EventKind::Click, handle_click);
        listeners.add_event_listener(EventKind::PopState, handle_pop_state);
        listeners.add_event_listener(EventKind::KeyUp, handle_key_up);

        debug!(sections = sections.len(), has_nav = nav.is_some(), "controller created");

        PresentationController {
            sections,
            nav,
            nav_links: (None, None),
            index: 0,
            title_prefix: host.title().to_string(),
            history_locked: false,
        }
    }

    /// Prepare the page and show the section named by the address fragment,
    /// or section 1 when there is none.
    pub fn start(&mut self, dom: &mut Dom, host: &mut dyn Host) {
        self.hide_all_sections(dom);
        self.insert_headings(dom);
        self.build_toc(dom);

        let index = host.fragment().and_then(parse_index).unwrap_or(1);
        self.show_section(dom, host, index);
    }

    pub fn sections(&self) -> &[NodeId] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn title_prefix(&self) -> &str {
        &self.title_prefix
    }

    pub fn is_history_locked(&self) -> bool {
        self.history_locked
    }

    pub fn nav(&self) -> Option<NodeId> {
        self.nav
    }

    /// Hide every section except the table of contents.
    pub fn hide_all_sections(&self, dom: &mut Dom) {
        for &section in &self.sections {
            if is_toc(dom, section) {
                continue;
            }
            dom.add_class(section, HIDDEN_CLASS);
        }
    }

    /// Show the section at `index`, hiding all others. Indices outside
    /// `1..section_count` fall back to 1.
    pub fn show_section(&mut self, dom: &mut Dom, host: &mut dyn Host, index: i64) {
        let count = self.sections.len() as i64;
        let index = if index < 1 || index >= count { 1 } else { index };

        self.push_navigation_history(host, index, self.index);
        self.index = index as usize;

        self.hide_all_sections(dom);
        let Some(&section) = self.sections.get(self.index) else {
            warn!(index, count, "no section to show");
            return;
        };
        dom.remove_class(section, HIDDEN_CLASS);

        host.scroll_to(0, 0);

        match section_title(dom, section) {
            Some(title) => host.set_title(format!("{} – {}", self.title_prefix, title)),
            None => host.set_title(self.title_prefix.clone()),
        }

        self.mark_toc_entry(dom);
        self.rebuild_nav(dom);

        debug!(index = self.index, "showing section");
    }

    /// Insert a heading carrying the declared title at the top of every
    /// titled section: `h2` for content, `h3` for the table of contents.
    pub fn insert_headings(&self, dom: &mut Dom) {
        for &section in &self.sections {
            let Some(title) = section_title(dom, section) else {
                continue;
            };
            let tag = if is_toc(dom, section) { "h3" } else { "h2" };
            let heading = dom.create_element(tag);
            dom.set_text_content(heading, title);
            dom.insert_first(section, heading);
        }
    }

    /// Append an ordered list linking every titled content section to the
    /// table of contents. Untitled sections get no entry.
    pub fn build_toc(&self, dom: &mut Dom) {
        let list = dom.create_element("ol");
        let mut toc = None;

        for (index, &section) in self.sections.iter().enumerate() {
            if is_toc(dom, section) {
                toc.get_or_insert(section);
                continue;
            }

            let Some(title) = section_title(dom, section) else {
                continue;
            };

            let link = create_link(dom, &title, index);
            let item = dom.create_element("li");
            dom.append_child(item, link);
            dom.append_child(list, item);
        }

        match toc {
            Some(toc) => dom.append_child(toc, list),
            None => debug!("page has no table of contents section"),
        }
    }

    /// Intercept clicks on links of the form `#<index>`. Any other link is
    /// left to the host.
    pub fn on_link_clicked(&mut self, dom: &mut Dom, host: &mut dyn Host, target: NodeId) -> Dispatch {
        let Some(link) = dom.closest(target, |dom, node| dom.is_element(node, "a")) else {
            return Dispatch::Ignored;
        };

        let Some(fragment) = dom.attribute(link, "href").and_then(|href| href.strip_prefix('#')) else {
            return Dispatch::Ignored;
        };
        if fragment.is_empty() {
            return Dispatch::Ignored;
        }

        let Some(index) = parse_index(fragment) else {
            trace!(fragment, "link fragment is not a section index");
            return Dispatch::Ignored;
        };

        self.show_section(dom, host, index);
        Dispatch::DefaultPrevented
    }

    /// Follow a back/forward navigation the host already performed, without
    /// writing history of our own.
    pub fn on_history_changed(
        &mut self,
        dom: &mut Dom,
        host: &mut dyn Host,
        state: Option<HistoryState>,
    ) -> Dispatch {
        let index = match state {
            Some(state) => state.index,
            None => host.fragment().and_then(parse_index).unwrap_or(1),
        };

        self.history_locked = true;
        self.show_section(dom, host, index);
        self.history_locked = false;
        Dispatch::Handled
    }

    /// Left goes back one section; right, enter, space and N go forward.
    /// Keys held with a modifier are not ours.
    pub fn on_key_up(&mut self, dom: &mut Dom, host: &mut dyn Host, key: &KeyEvent) -> Dispatch {
        if key.modifiers.any() {
            return Dispatch::Ignored;
        }

        match key.code {
            KeyCode::ArrowLeft if self.index > 1 => {
                self.show_section(dom, host, self.index as i64 - 1);
                Dispatch::Handled
            }
            KeyCode::ArrowRight | KeyCode::Enter | KeyCode::Space | KeyCode::KeyN
                if self.index + 1 < self.sections.len() =>
            {
                self.show_section(dom, host, self.index as i64 + 1);
                Dispatch::Handled
            }
            _ => Dispatch::Ignored,
        }
    }

    /// The first navigation after load replaces the entry the page was
    /// opened with; later ones push.
    fn push_navigation_history(&self, host: &mut dyn Host, new_index: i64, old_index: usize) {
        if self.history_locked {
            return;
        }

        let state = HistoryState { index: new_index };
        let url = format!("#{}", new_index);

        if old_index == 0 {
            host.replace_state(state, &url);
        } else {
            host.push_state(state, &url);
        }
    }

    /// Mark the n-th table of contents link (1-based) as active, where n is
    /// the current index.
    fn mark_toc_entry(&self, dom: &mut Dom) {
        let Some(toc) = dom.element_by_id(TOC_ID) else {
            return;
        };

        let entries: Vec<NodeId> = dom
            .elements_by_tag(toc, "a")
            .into_iter()
            .filter(|&link| in_list_item(dom, link, toc))
            .collect();

        for (position, link) in entries.into_iter().enumerate() {
            if position + 1 == self.index {
                dom.add_class(link, ACTIVE_CLASS);
            } else {
                dom.remove_class(link, ACTIVE_CLASS);
            }
        }
    }

    /// Point the nav's prev/next links at the neighbours of the current
    /// section. The two link nodes are created once and reused.
    fn rebuild_nav(&mut self, dom: &mut Dom) {
        let Some(nav) = self.nav else {
            return;
        };
        dom.clear_children(nav);

        let index = self.index;
        let prev = (index > 1).then(|| index - 1);
        let next = (index + 1 < self.sections.len()).then(|| index + 1);

        for (target, class) in [(prev, "prev"), (next, "next")] {
            let Some(target) = target else {
                continue;
            };
            let Some(title) = section_title(dom, self.sections[target]) else {
                continue;
            };
            let link = self.nav_link(dom, class);
            dom.set_attribute(link, "href", format!("#{}", target));
            dom.set_text_content(link, title);
            dom.append_child(nav, link);
        }
    }

    fn nav_link(&mut self, dom: &mut Dom, class: &str) -> NodeId {
        let slot = if class == "prev" {
            &mut self.nav_links.0
        } else {
            &mut self.nav_links.1
        };
        *slot.get_or_insert_with(|| {
            let link = dom.create_element("a");
            dom.add_class(link, class);
            link
        })
    }
}

fn handle_click(
    controller: &mut PresentationController,
    dom: &mut Dom,
    host: &mut dyn Host,
    event: &Event,
) -> Dispatch {
    match event {
        Event::Click { target } => controller.on_link_clicked(dom, host, *target),
        _ => Dispatch::Ignored,
    }
}

fn handle_pop_state(
    controller: &mut PresentationController,
    dom: &mut Dom,
    host: &mut dyn Host,
    event: &Event,
) -> Dispatch {
    match event {
        Event::PopState { state } => controller.on_history_changed(dom, host, *state),
        _ => Dispatch::Ignored,
    }
}

fn handle_key_up(
    controller: &mut PresentationController,
    dom: &mut Dom,
    host: &mut dyn Host,
    event: &Event,
) -> Dispatch {
    match event {
        Event::KeyUp(key) => controller.on_key_up(dom, host, key),
        _ => Dispatch::Ignored,
    }
}

fn is_toc(dom: &Dom, section: NodeId) -> bool {
    dom.id(section) == Some(TOC_ID)
}

fn section_title(dom: &Dom, section: NodeId) -> Option<String> {
    dom.attribute(section, TITLE_ATTRIBUTE).map(str::to_string)
}

fn create_link(dom: &mut Dom, text: &str, index: usize) -> NodeId {
    let link = dom.create_element("a");
    dom.set_attribute(link, "href", format!("#{}", index));
    dom.set_text_content(link, text);
    link
}

/// Whether `node` sits inside an `li` that is itself below `scope`.
fn in_list_item(dom: &Dom, node: NodeId, scope: NodeId) -> bool {
    let mut current = dom.parent(node);
    while let Some(id) = current {
        if id == scope {
            return false;
        }
        if dom.is_element(id, "li") {
            return true;
        }
        current = dom.parent(id);
    }
    false
}

/// Read a section index from an address fragment: optional leading
/// whitespace and sign, then decimal digits; anything after the digits is
/// ignored. Returns `None` when there are no digits. Values too large for
/// `i64` saturate.
pub fn parse_index(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value = digits[..end].bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -value } else { value })
}

