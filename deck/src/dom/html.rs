use std::fmt::Write;

use super::{Dom, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta"];

/// Serialise `node` and its subtree as HTML.
pub fn to_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, node, &mut out);
    out
}

/// Serialise only the children of `node`.
pub fn inner_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    for &child in dom.children(node) {
        write_node(dom, child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, node: NodeId, out: &mut String) {
    match &dom.node(node).kind {
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Raw(markup) => out.push_str(markup),
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            if !element.classes.is_empty() {
                let _ = write!(out, " class=\"{}\"", escape_attribute(&element.classes.join(" ")));
            }
            for (name, value) in &element.attributes {
                let _ = write!(out, " {}=\"{}\"", name, escape_attribute(value));
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                return;
            }

            for &child in dom.children(node) {
                write_node(dom, child, out);
            }
            let _ = write!(out, "</{}>", element.tag);
        }
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
