//! Output for a loaded page: plain text for the terminal and a standalone
//! HTML document.

use deck::Page;
use deck::dom::html::{escape_attribute, escape_text, inner_html};
use deck::dom::{Dom, NodeId, NodeKind};

use crate::controller::{ACTIVE_CLASS, HIDDEN_CLASS};

const STYLESHEET: &str = ".hidden { display: none; } nav a.next { float: right; } a.active { font-weight: bold; }";

/// Render the visible part of the page as plain text.
pub fn render_text(dom: &Dom) -> String {
    let mut out = String::new();
    let mut renderer = TextRenderer {
        dom,
        out: &mut out,
        line: String::new(),
    };
    renderer.block(dom.root(), "");
    renderer.flush("");
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out.push('\n');
    out
}

/// Render the page as a complete HTML document titled `title`.
pub fn render_html(page: &Page, title: &str) -> String {
    let lang = page
        .lang
        .as_deref()
        .map(|lang| format!(" lang=\"{}\"", escape_attribute(lang)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html{}>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>{}</body>\n</html>\n",
        lang,
        escape_text(title),
        STYLESHEET,
        inner_html(&page.dom, page.dom.root()),
    )
}

struct TextRenderer<'a> {
    dom: &'a Dom,
    out: &'a mut String,
    /// Inline text waiting to be written as one paragraph.
    line: String,
}

impl TextRenderer<'_> {
    fn block(&mut self, node: NodeId, indent: &str) {
        let dom = self.dom;
        for &child in dom.children(node) {
            if dom.has_class(child, HIDDEN_CLASS) {
                continue;
            }
            let Some(tag) = dom.tag(child) else {
                self.inline(child);
                continue;
            };

            match tag {
                "h2" | "h3" | "h4" | "h5" | "h6" => {
                    self.flush(indent);
                    let text = dom.text_content(child);
                    let rule = if tag == "h2" { '=' } else { '-' };
                    let underline: String = std::iter::repeat_n(rule, text.chars().count()).collect();
                    self.out.push_str(&format!("{indent}{text}\n{indent}{underline}\n\n"));
                }
                "p" => {
                    self.flush(indent);
                    self.inline(child);
                    self.flush(indent);
                }
                "ol" | "ul" => {
                    self.flush(indent);
                    self.list(child, tag == "ol", indent);
                    self.out.push('\n');
                }
                "pre" => {
                    self.flush(indent);
                    for line in dom.text_content(child).lines() {
                        self.out.push_str(&format!("{indent}    {line}\n"));
                    }
                    self.out.push('\n');
                }
                "blockquote" => {
                    self.flush(indent);
                    self.block(child, &format!("{indent}> "));
                    self.flush(&format!("{indent}> "));
                }
                "table" => {
                    self.flush(indent);
                    for row in dom.elements_by_tag(child, "tr") {
                        let cells: Vec<String> = dom
                            .children(row)
                            .iter()
                            .map(|&cell| dom.text_content(cell))
                            .collect();
                        self.out.push_str(&format!("{indent}| {} |\n", cells.join(" | ")));
                    }
                    self.out.push('\n');
                }
                "hr" => {
                    self.flush(indent);
                    self.out.push_str(&format!("{indent}----\n\n"));
                }
                "nav" => {
                    self.flush(indent);
                    self.nav(child, indent);
                }
                "section" | "body" | "div" => {
                    self.flush(indent);
                    self.block(child, indent);
                    self.flush(indent);
                }
                _ => self.inline(child),
            }
        }
    }

    fn list(&mut self, list: NodeId, ordered: bool, indent: &str) {
        let dom = self.dom;
        let start = dom
            .attribute(list, "start")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(1);

        let items = dom
            .children(list)
            .iter()
            .copied()
            .filter(|&item| dom.is_element(item, "li"));

        for (n, item) in items.enumerate() {
            let active = dom
                .elements_by_tag(item, "a")
                .iter()
                .any(|&link| dom.has_class(link, ACTIVE_CLASS));
            let marker = if ordered {
                format!("{}.", start + n)
            } else {
                "-".to_string()
            };
            let pointer = if active { ">" } else { " " };
            let prefix = format!("{indent}{pointer} {marker} ");
            let nested = format!("{indent}{}", " ".repeat(marker.len() + 3));

            let mut body = String::new();
            let mut inner = TextRenderer {
                dom,
                out: &mut body,
                line: String::new(),
            };
            inner.block(item, &nested);
            inner.flush(&nested);

            let body = body.trim();
            let body = body.strip_prefix(nested.trim_end()).unwrap_or(body).trim_start();
            self.out.push_str(&prefix);
            self.out.push_str(body);
            self.out.push('\n');
        }
    }

    fn nav(&mut self, nav: NodeId, indent: &str) {
        let dom = self.dom;
        let mut parts = Vec::new();
        for &link in dom.children(nav) {
            let text = dom.text_content(link);
            let href = dom.attribute(link, "href").unwrap_or_default();
            if dom.has_class(link, "prev") {
                parts.push(format!("<- {text} ({href})"));
            } else {
                parts.push(format!("{text} ({href}) ->"));
            }
        }
        if !parts.is_empty() {
            self.out.push_str(&format!("{indent}{}\n", parts.join("    ")));
        }
    }

    fn inline(&mut self, node: NodeId) {
        let dom = self.dom;
        match &dom.node(node).kind {
            NodeKind::Text(text) => self.line.push_str(text),
            NodeKind::Raw(markup) => self.line.push_str(markup.trim_end()),
            NodeKind::Element(element) => {
                let (open, close) = match element.tag.as_str() {
                    "strong" => ("**", "**"),
                    "em" => ("_", "_"),
                    "del" => ("~~", "~~"),
                    "code" => ("`", "`"),
                    _ => ("", ""),
                };
                match element.tag.as_str() {
                    "br" => self.line.push('\n'),
                    "img" => {
                        let alt = dom.attribute(node, "alt").unwrap_or_default();
                        self.line.push_str(&format!("[image: {alt}]"));
                    }
                    "a" => {
                        for &child in dom.children(node) {
                            self.inline(child);
                        }
                        if let Some(href) = dom.attribute(node, "href") {
                            self.line.push_str(&format!(" <{href}>"));
                        }
                    }
                    _ => {
                        self.line.push_str(open);
                        for &child in dom.children(node) {
                            self.inline(child);
                        }
                        self.line.push_str(close);
                    }
                }
            }
        }
    }

    /// Write pending inline text as a paragraph.
    fn flush(&mut self, indent: &str) {
        let line = std::mem::take(&mut self.line);
        let text = line.trim();
        if text.is_empty() {
            return;
        }
        for l in text.lines() {
            self.out.push_str(indent);
            self.out.push_str(l.trim_end());
            self.out.push('\n');
        }
        self.out.push('\n');
    }
}
