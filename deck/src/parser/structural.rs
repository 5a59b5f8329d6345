use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};
use tracing::trace;

use crate::dom::{Dom, NodeId};
use crate::parser::error::ParseError;
use crate::{TITLE_ATTRIBUTE, TOC_ID};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the document tree for a deck body.
///
/// `offset` is the position of `source` within the file, so that error spans
/// point into the original text rather than the body alone.
pub fn build_dom(source: &str, offset: usize, file_id: usize) -> Result<Dom, Vec<ParseError>> {
    let options = Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TABLES
        | Options::ENABLE_HEADING_ATTRIBUTES;
    let parser = CmarkParser::new_ext(source, options);
    let events: Vec<(Event<'_>, Range<usize>)> = parser.into_offset_iter().collect();

    let mut state = ParseState::new(offset, offset + source.len(), file_id);
    state.process_events(&events);
    state.finalize()
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState {
    offset: usize,
    end: usize,
    file_id: usize,
    dom: Dom,
    /// Open elements. The bottom entry is the current section.
    stack: Vec<NodeId>,
    /// Markdown nesting depth; only depth 0 headings and rules open sections.
    depth: usize,
    in_table_head: bool,
    sections: Vec<SectionInfo>,
    reported_stray_content: bool,
    errors: Vec<ParseError>,
}

struct SectionInfo {
    span: Range<usize>,
    is_toc: bool,
}

impl ParseState {
    fn new(offset: usize, end: usize, file_id: usize) -> Self {
        ParseState {
            offset,
            end,
            file_id,
            dom: Dom::new(),
            stack: Vec::new(),
            depth: 0,
            in_table_head: false,
            sections: Vec::new(),
            reported_stray_content: false,
            errors: Vec::new(),
        }
    }

    fn span(&self, range: &Range<usize>) -> Range<usize> {
        range.start + self.offset..range.end + self.offset
    }

    fn process_events(&mut self, events: &[(Event<'_>, Range<usize>)]) {
        let mut i = 0;

        while i < events.len() {
            let (ref ev, ref range) = events[i];
            let span = self.span(range);

            if self.depth == 0 {
                match ev {
                    // Level-1 heading = new titled section
                    Event::Start(Tag::Heading {
                        level: HeadingLevel::H1,
                        id,
                        ..
                    }) => {
                        let id = id.as_deref().map(str::to_string);
                        i += 1;
                        let title = collect_text(events, &mut i, |e| {
                            matches!(e, TagEnd::Heading(_))
                        });
                        self.open_section(normalize_title(&title), id, span);
                        continue;
                    }

                    // Thematic break = new untitled section
                    Event::Rule => {
                        i += 1;
                        self.open_section(None, None, span);
                        continue;
                    }

                    _ => {}
                }
            }

            match ev {
                Event::Start(_) => self.depth += 1,
                Event::End(_) => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }

            if self.stack.is_empty() {
                self.report_stray_content(span);
                i += 1;
                continue;
            }

            i += 1;
            match ev {
                Event::Start(tag) => self.start_tag(tag, events, &mut i),
                Event::End(tag_end) => self.end_tag(tag_end),
                Event::Text(s) => {
                    let text = self.dom.create_text(s.to_string());
                    self.append(text);
                }
                Event::Code(s) => {
                    let code = self.dom.create_element("code");
                    self.dom.set_text_content(code, s.to_string());
                    self.append(code);
                }
                Event::Html(s) | Event::InlineHtml(s) => {
                    let raw = self.dom.create_raw(s.to_string());
                    self.append(raw);
                }
                Event::SoftBreak => {
                    let text = self.dom.create_text("\n");
                    self.append(text);
                }
                Event::HardBreak => {
                    let br = self.dom.create_element("br");
                    self.append(br);
                }
                Event::Rule => {
                    let hr = self.dom.create_element("hr");
                    self.append(hr);
                }
                _ => {}
            }
        }
    }

    fn start_tag(&mut self, tag: &Tag<'_>, events: &[(Event<'_>, Range<usize>)], i: &mut usize) {
        match tag {
            Tag::Paragraph => {
                self.open("p");
            }
            Tag::Heading { level, .. } => {
                self.open(&body_heading_tag(level));
            }
            Tag::BlockQuote(_) => {
                self.open("blockquote");
            }
            Tag::CodeBlock(kind) => {
                self.open("pre");
                let code = self.open("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(lang) = info.split_whitespace().next() {
                        self.dom.add_class(code, &format!("language-{}", lang));
                    }
                }
            }
            Tag::List(Some(start)) => {
                let list = self.open("ol");
                if *start != 1 {
                    self.dom.set_attribute(list, "start", start.to_string());
                }
            }
            Tag::List(None) => {
                self.open("ul");
            }
            Tag::Item => {
                self.open("li");
            }
            Tag::Table(_) => {
                self.open("table");
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.open("thead");
                self.open("tr");
            }
            Tag::TableRow => {
                if self.top().is_some_and(|top| self.dom.is_element(top, "table")) {
                    self.open("tbody");
                }
                self.open("tr");
            }
            Tag::TableCell => {
                self.open(if self.in_table_head { "th" } else { "td" });
            }
            Tag::Emphasis => {
                self.open("em");
            }
            Tag::Strong => {
                self.open("strong");
            }
            Tag::Strikethrough => {
                self.open("del");
            }
            Tag::Link { dest_url, title, .. } => {
                let link = self.open("a");
                self.dom.set_attribute(link, "href", dest_url.to_string());
                if !title.is_empty() {
                    self.dom.set_attribute(link, "title", title.to_string());
                }
            }
            Tag::Image { dest_url, title, .. } => {
                let img = self.dom.create_element("img");
                self.dom.set_attribute(img, "src", dest_url.to_string());
                let alt = collect_text(events, i, |e| matches!(e, TagEnd::Image));
                // collect_text consumed the matching End
                self.depth = self.depth.saturating_sub(1);
                self.dom.set_attribute(img, "alt", alt);
                if !title.is_empty() {
                    self.dom.set_attribute(img, "title", title.to_string());
                }
                self.append(img);
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag_end: &TagEnd) {
        let closing = match tag_end {
            TagEnd::Paragraph => "p".to_string(),
            TagEnd::Heading(level) => body_heading_tag(level),
            TagEnd::BlockQuote(_) => "blockquote".to_string(),
            TagEnd::CodeBlock => "pre".to_string(),
            TagEnd::List(true) => "ol".to_string(),
            TagEnd::List(false) => "ul".to_string(),
            TagEnd::Item => "li".to_string(),
            TagEnd::Table => "table".to_string(),
            TagEnd::TableHead => {
                self.in_table_head = false;
                "thead".to_string()
            }
            TagEnd::TableRow => "tr".to_string(),
            TagEnd::TableCell if self.in_table_head => "th".to_string(),
            TagEnd::TableCell => "td".to_string(),
            TagEnd::Emphasis => "em".to_string(),
            TagEnd::Strong => "strong".to_string(),
            TagEnd::Strikethrough => "del".to_string(),
            TagEnd::Link => "a".to_string(),
            _ => return,
        };
        self.close(&closing);
    }

    fn top(&self) -> Option<NodeId> {
        self.stack.last().copied()
    }

    /// Append `node` to the innermost open element.
    fn append(&mut self, node: NodeId) {
        if let Some(parent) = self.top() {
            self.dom.append_child(parent, node);
        }
    }

    /// Append a new element and make it the innermost open element.
    fn open(&mut self, tag: &str) -> NodeId {
        let node = self.dom.create_element(tag);
        self.append(node);
        self.stack.push(node);
        node
    }

    /// Pop open elements up to and including the nearest `tag`. The section
    /// at the bottom of the stack is never popped.
    fn close(&mut self, tag: &str) {
        while self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                if self.dom.is_element(node, tag) {
                    break;
                }
            }
        }
    }

    fn open_section(&mut self, title: Option<String>, id: Option<String>, span: Range<usize>) {
        let section = self.dom.create_element("section");
        if let Some(title) = &title {
            self.dom.set_attribute(section, TITLE_ATTRIBUTE, title.clone());
        }
        let is_toc = id.as_deref() == Some(TOC_ID);
        if let Some(id) = id {
            self.dom.set_attribute(section, "id", id);
        }

        let root = self.dom.root();
        self.dom.append_child(root, section);
        self.stack.clear();
        self.stack.push(section);
        self.in_table_head = false;

        trace!(index = self.sections.len(), ?title, is_toc, "opened section");
        self.sections.push(SectionInfo { span, is_toc });
    }

    fn report_stray_content(&mut self, span: Range<usize>) {
        if self.reported_stray_content {
            return;
        }
        self.reported_stray_content = true;
        self.errors.push(
            ParseError::error("content outside of a section", span, self.file_id)
                .with_note("start the deck with a table of contents heading, e.g. `# Contents {#toc}`"),
        );
    }

    fn finalize(mut self) -> Result<Dom, Vec<ParseError>> {
        let root = self.dom.root();
        let nav = self.dom.create_element("nav");
        self.dom.append_child(root, nav);

        match self.sections.first() {
            None => self.errors.push(
                ParseError::error("deck has no sections", self.end..self.end, self.file_id)
                    .with_note("start a section with a level-1 heading"),
            ),
            Some(first) if !first.is_toc => self.errors.push(
                ParseError::error(
                    "the first section must be the table of contents",
                    first.span.clone(),
                    self.file_id,
                )
                .with_note("mark it with a heading attribute, e.g. `# Contents {#toc}`"),
            ),
            Some(_) => {}
        }

        for extra in self.sections.iter().skip(1).filter(|s| s.is_toc) {
            self.errors.push(
                ParseError::error(
                    "duplicate table of contents section",
                    extra.span.clone(),
                    self.file_id,
                )
                .with_note("only the first section may carry `{#toc}`"),
            );
        }

        if self.sections.len() == 1 {
            self.errors.push(ParseError::error(
                "deck has no content sections",
                self.end..self.end,
                self.file_id,
            ));
        }

        if self.errors.is_empty() {
            Ok(self.dom)
        } else {
            Err(self.errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Headings inside a section sit one level below the section heading (`h2`).
fn body_heading_tag(level: &HeadingLevel) -> String {
    format!("h{}", (heading_level_to_u8(level) + 1).min(6))
}

/// Collect text (including code spans) up to the End that closes the
/// enclosing tag. Text of nested tags is included.
fn collect_text(
    events: &[(Event<'_>, Range<usize>)],
    i: &mut usize,
    is_end: impl Fn(&TagEnd) -> bool,
) -> String {
    let mut text = String::new();
    let mut nested = 0usize;
    while *i < events.len() {
        let (ref ev, _) = events[*i];
        *i += 1;
        match ev {
            Event::Start(_) => nested += 1,
            Event::End(tag_end) if nested == 0 && is_end(tag_end) => break,
            Event::End(_) => nested = nested.saturating_sub(1),
            Event::Text(s) | Event::Code(s) => text.push_str(s),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

/// Strip leading/trailing whitespace and collapse interior whitespace.
/// Blank titles count as no title.
fn normalize_title(title: &str) -> Option<String> {
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() { None } else { Some(title) }
}
