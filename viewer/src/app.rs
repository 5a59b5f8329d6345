use deck::Page;
use deck::dom::{Dom, NodeId};
use tracing::debug;

use crate::controller::{ACTIVE_CLASS, HIDDEN_CLASS, Listener, PresentationController};
use crate::error::ViewerError;
use crate::event::{Dispatch, Event, KeyEvent, Listeners};
use crate::host::Host;
use crate::session::Session;

/// A link as rendered in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub text: String,
    pub href: String,
}

/// An entry of the generated table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub text: String,
    pub href: String,
    pub active: bool,
}

/// A page loaded into a host, with its controller and event listeners.
pub struct Viewer<H: Host> {
    page: Page,
    host: H,
    controller: PresentationController,
    listeners: Listeners<Listener>,
}

impl<H: Host> Viewer<H> {
    /// Load `page` into `host` and show the section its address names.
    pub fn load(mut page: Page, mut host: H) -> Self {
        host.set_title(page.title.clone());

        let mut listeners = Listeners::new();
        let mut controller = PresentationController::new(&page.dom, &host, &mut listeners);
        controller.start(&mut page.dom, &mut host);

        Viewer {
            page,
            host,
            controller,
            listeners,
        }
    }

    /// Deliver `event` to every listener registered for its kind.
    pub fn dispatch(&mut self, event: &Event) -> Dispatch {
        let mut outcome = Dispatch::Ignored;
        for listener in self.listeners.matching(event.kind()) {
            let result = listener(&mut self.controller, &mut self.page.dom, &mut self.host, event);
            outcome = outcome.max(result);
        }
        outcome
    }

    pub fn show_section(&mut self, index: i64) {
        self.controller
            .show_section(&mut self.page.dom, &mut self.host, index);
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn dom(&self) -> &Dom {
        &self.page.dom
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, for acting on it directly, as a user scrolling would.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn controller(&self) -> &PresentationController {
        &self.controller
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn current_index(&self) -> usize {
        self.controller.current_index()
    }

    pub fn title(&self) -> &str {
        self.host.title()
    }

    /// Positions of the sections that are not hidden.
    pub fn visible_sections(&self) -> Vec<usize> {
        let dom = &self.page.dom;
        self.controller
            .sections()
            .iter()
            .enumerate()
            .filter(|&(_, &section)| !dom.has_class(section, HIDDEN_CLASS))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn prev_link(&self) -> Option<NavLink> {
        self.nav_link("prev")
    }

    pub fn next_link(&self) -> Option<NavLink> {
        self.nav_link("next")
    }

    fn nav_link(&self, class: &str) -> Option<NavLink> {
        let dom = &self.page.dom;
        let nav = self.controller.nav()?;
        dom.children(nav)
            .iter()
            .find(|&&link| dom.has_class(link, class))
            .map(|&link| link_of(dom, link))
    }

    pub fn toc_entries(&self) -> Vec<TocEntry> {
        let dom = &self.page.dom;
        let Some(toc) = dom.element_by_id(deck::TOC_ID) else {
            return Vec::new();
        };
        dom.elements_by_tag(toc, "li")
            .into_iter()
            .flat_map(|item| dom.elements_by_tag(item, "a"))
            .map(|link| {
                let NavLink { text, href } = link_of(dom, link);
                TocEntry {
                    text,
                    href,
                    active: dom.has_class(link, ACTIVE_CLASS),
                }
            })
            .collect()
    }

    /// First link to `href` that is not inside a hidden section.
    pub fn find_link(&self, href: &str) -> Option<NodeId> {
        let dom = &self.page.dom;
        dom.elements_by_tag(dom.root(), "a")
            .into_iter()
            .find(|&link| dom.attribute(link, "href") == Some(href) && !dom.within_class(link, HIDDEN_CLASS))
    }
}

fn link_of(dom: &Dom, link: NodeId) -> NavLink {
    NavLink {
        text: dom.text_content(link),
        href: dom.attribute(link, "href").unwrap_or_default().to_string(),
    }
}

/// Browser behaviour around the listeners: default link actions and the
/// back/forward buttons.
impl Viewer<Session> {
    /// Click `target`. Unless a listener prevented it, a link is followed:
    /// fragments navigate within the page, anything else leaves it.
    pub fn click(&mut self, target: NodeId) -> Dispatch {
        let outcome = self.dispatch(&Event::Click { target });
        if outcome == Dispatch::DefaultPrevented {
            return outcome;
        }

        let dom = &self.page.dom;
        let href = dom
            .closest(target, |dom, node| dom.is_element(node, "a"))
            .and_then(|link| dom.attribute(link, "href"))
            .map(str::to_string);

        match href {
            Some(href) => match href.strip_prefix('#') {
                Some(fragment) => {
                    let event = self.host.navigate_fragment(fragment);
                    self.dispatch(&event).max(outcome)
                }
                None => {
                    self.host.leave(&href);
                    outcome
                }
            },
            None => outcome,
        }
    }

    /// Click the first visible link to `href`.
    pub fn click_link(&mut self, href: &str) -> Result<Dispatch, ViewerError> {
        let link = self
            .find_link(href)
            .ok_or_else(|| ViewerError::NoSuchLink(href.to_string()))?;
        Ok(self.click(link))
    }

    pub fn key(&mut self, key: KeyEvent) -> Dispatch {
        self.dispatch(&Event::KeyUp(key))
    }

    /// Press the back button. `None` when there is nothing to go back to.
    pub fn back(&mut self) -> Option<Dispatch> {
        let event = self.host.back()?;
        Some(self.dispatch(&event))
    }

    pub fn forward(&mut self) -> Option<Dispatch> {
        let event = self.host.forward()?;
        Some(self.dispatch(&event))
    }

    /// Change the address fragment, as typing `#<fragment>` into the
    /// address bar would.
    pub fn open_fragment(&mut self, fragment: &str) -> Dispatch {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let event = self.host.navigate_fragment(fragment);
        debug!(fragment, "address fragment changed");
        self.dispatch(&event)
    }
}
