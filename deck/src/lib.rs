pub mod dom;
pub mod parser;

use crate::dom::Dom;

/// `id` of the section acting as the table of contents.
pub const TOC_ID: &str = "toc";

/// Attribute holding a section's declared title.
pub const TITLE_ATTRIBUTE: &str = "data-title";

/// A parsed deck: the host document a viewer runs against.
#[derive(Debug, Clone)]
pub struct Page {
    /// Document tree rooted at `body`: one `section` per slide, then a `nav`.
    pub dom: Dom,
    /// Document title, shown as the window title prefix.
    pub title: String,
    pub lang: Option<String>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl Page {
    /// The `section` elements in document order.
    pub fn sections(&self) -> Vec<dom::NodeId> {
        self.dom.elements_by_tag(self.dom.root(), "section")
    }
}
