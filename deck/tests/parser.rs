use deck::dom::html::to_html;
use deck::parser::Parser;
use deck::parser::frontmatter;
use deck::{Page, TITLE_ATTRIBUTE, TOC_ID};

fn parse(source: &str) -> Page {
    Parser::new(source.to_string(), 0).parse().expect("parse failed")
}

fn parse_errors(source: &str) -> Vec<String> {
    match Parser::new(source.to_string(), 0).parse() {
        Ok(_) => panic!("expected parse errors"),
        Err(errors) => errors.into_iter().map(|e| e.message).collect(),
    }
}

fn titles(page: &Page) -> Vec<Option<String>> {
    page.sections()
        .into_iter()
        .map(|s| page.dom.attribute(s, TITLE_ATTRIBUTE).map(str::to_string))
        .collect()
}

const BASIC: &str = "\
---
title = \"Git Basics\"
lang = \"en\"
---
# Contents {#toc}

Pick a chapter.

# Intro

Hello *there*.

# Setup

1. Install
2. Configure
";

#[test]
fn sections_in_document_order() {
    let page = parse(BASIC);
    assert_eq!(
        titles(&page),
        vec![
            Some("Contents".to_string()),
            Some("Intro".to_string()),
            Some("Setup".to_string()),
        ]
    );
    let sections = page.sections();
    assert_eq!(page.dom.id(sections[0]), Some(TOC_ID));
    assert_eq!(page.dom.id(sections[1]), None);
}

#[test]
fn frontmatter_sets_title_and_lang() {
    let page = parse(BASIC);
    assert_eq!(page.title, "Git Basics");
    assert_eq!(page.lang.as_deref(), Some("en"));
}

#[test]
fn missing_frontmatter_defaults_title() {
    let page = parse("# Contents {#toc}\n\n# One\n\nBody\n");
    assert_eq!(page.title, "Untitled");
    assert_eq!(page.lang, None);
}

#[test]
fn headings_are_not_kept_in_the_body() {
    let page = parse(BASIC);
    let intro = page.sections()[1];
    assert_eq!(to_html(&page.dom, intro), "<section data-title=\"Intro\"><p>Hello <em>there</em>.</p></section>");
}

#[test]
fn body_is_converted_to_elements() {
    let page = parse(BASIC);
    let setup = page.sections()[2];
    assert_eq!(
        to_html(&page.dom, setup),
        "<section data-title=\"Setup\"><ol><li>Install</li><li>Configure</li></ol></section>"
    );
}

#[test]
fn nav_follows_the_sections() {
    let page = parse(BASIC);
    let root = page.dom.root();
    let children = page.dom.children(root);
    assert_eq!(children.len(), 4);
    assert!(page.dom.is_element(children[3], "nav"));
    assert!(page.dom.children(children[3]).is_empty());
}

#[test]
fn thematic_break_starts_untitled_section() {
    let page = parse("# Contents {#toc}\n\n# One\n\nfirst\n\n---\n\nanonymous\n\n# Three\n");
    assert_eq!(
        titles(&page),
        vec![
            Some("Contents".to_string()),
            Some("One".to_string()),
            None,
            Some("Three".to_string()),
        ]
    );
    let untitled = page.sections()[2];
    assert_eq!(page.dom.text_content(untitled), "anonymous");
}

#[test]
fn custom_section_id_is_kept() {
    let page = parse("# Contents {#toc}\n\n# Install {#install}\n\ntext\n");
    let install = page.sections()[1];
    assert_eq!(page.dom.id(install), Some("install"));
    assert_eq!(page.dom.element_by_id("install"), Some(install));
}

#[test]
fn title_whitespace_is_normalized() {
    let page = parse("# Contents {#toc}\n\n#   Many    spaces   here\n\ntext\n");
    assert_eq!(titles(&page)[1].as_deref(), Some("Many spaces here"));
}

#[test]
fn nested_headings_shift_down_one_level() {
    let page = parse("# Contents {#toc}\n\n# One\n\n## Detail\n\n### Finer\n");
    let one = page.sections()[1];
    assert_eq!(
        to_html(&page.dom, one),
        "<section data-title=\"One\"><h3>Detail</h3><h4>Finer</h4></section>"
    );
}

#[test]
fn code_blocks_keep_language_class() {
    let page = parse("# Contents {#toc}\n\n# One\n\n```rust\nfn main() {}\n```\n");
    let one = page.sections()[1];
    assert_eq!(
        to_html(&page.dom, one),
        "<section data-title=\"One\"><pre><code class=\"language-rust\">fn main() {}\n</code></pre></section>"
    );
}

#[test]
fn links_and_images_become_elements() {
    let page = parse(
        "# Contents {#toc}\n\n# One\n\nSee [chapter two](#2 \"next\") and ![a logo](logo.png).\n",
    );
    let one = page.sections()[1];
    let html = to_html(&page.dom, one);
    assert!(html.contains("<a href=\"#2\" title=\"next\">chapter two</a>"), "{}", html);
    assert!(html.contains("<img alt=\"a logo\" src=\"logo.png\">"), "{}", html);
}

#[test]
fn image_inside_image_alt_keeps_section_structure() {
    let page = parse("# Contents {#toc}\n\n# One\n\n> ![a ![b](x)](y)\n>\n> # Inner\n");
    assert_eq!(
        titles(&page),
        vec![Some("Contents".to_string()), Some("One".to_string())]
    );

    let one = page.sections()[1];
    let html = to_html(&page.dom, one);
    assert_eq!(html.matches("<img").count(), 1, "{}", html);
    assert!(html.contains("<img alt=\"a b\" src=\"y\">"), "{}", html);
    assert!(html.contains("<h2>Inner</h2></blockquote>"), "{}", html);
}

#[test]
fn tables_get_head_and_body() {
    let page = parse("# Contents {#toc}\n\n# One\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
    let one = page.sections()[1];
    assert_eq!(
        to_html(&page.dom, one),
        "<section data-title=\"One\"><table><thead><tr><th>a</th><th>b</th></tr></thead>\
         <tbody><tr><td>1</td><td>2</td></tr></tbody></table></section>"
    );
}

#[test]
fn text_is_escaped_on_output() {
    let page = parse("# Contents {#toc}\n\n# One\n\n`a < b && c`\n");
    let one = page.sections()[1];
    assert_eq!(
        to_html(&page.dom, one),
        "<section data-title=\"One\"><p><code>a &lt; b &amp;&amp; c</code></p></section>"
    );
}

#[test]
fn first_section_must_be_toc() {
    let errors = parse_errors("# One\n\ntext\n\n# Two\n");
    assert_eq!(errors, vec!["the first section must be the table of contents"]);
}

#[test]
fn content_before_first_section_is_rejected() {
    let errors = parse_errors("stray paragraph\n\n# Contents {#toc}\n\n# One\n");
    assert_eq!(errors, vec!["content outside of a section"]);
}

#[test]
fn duplicate_toc_is_rejected() {
    let errors = parse_errors("# Contents {#toc}\n\n# One\n\n# Again {#toc}\n");
    assert_eq!(errors, vec!["duplicate table of contents section"]);
}

#[test]
fn deck_without_content_sections_is_rejected() {
    let errors = parse_errors("# Contents {#toc}\n\nnothing else\n");
    assert_eq!(errors, vec!["deck has no content sections"]);
    let errors = parse_errors("");
    assert_eq!(errors, vec!["deck has no sections"]);
}

#[test]
fn bad_frontmatter_is_reported_with_span() {
    let source = "---\ntitle = 3\n---\n# Contents {#toc}\n\n# One\n";
    let errors = Parser::new(source.to_string(), 7).parse().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.starts_with("invalid frontmatter"), "{}", errors[0].message);
    assert_eq!(errors[0].file_id, 7);
    assert!(errors[0].span.start >= 4 && errors[0].span.end <= 14, "{:?}", errors[0].span);
}

#[test]
fn unknown_frontmatter_keys_are_rejected() {
    let errors = parse_errors("---\ntheme = \"dark\"\n---\n# Contents {#toc}\n\n# One\n");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("theme"), "{}", errors[0]);
}

#[test]
fn unterminated_frontmatter_is_rejected() {
    let errors = parse_errors("---\ntitle = \"x\"\n# Contents {#toc}\n");
    assert_eq!(errors, vec!["missing closing --- frontmatter delimiter"]);
}

#[test]
fn error_spans_point_into_the_full_source() {
    let source = "---\ntitle = \"x\"\n---\n# One\n\n# Two\n";
    let errors = Parser::new(source.to_string(), 0).parse().unwrap_err();
    let heading_start = source.find("# One").unwrap();
    assert_eq!(errors[0].span.start, heading_start);
}

#[test]
fn frontmatter_split_offsets() {
    let source = "---\na = 1\n---\nbody\n";
    let split = frontmatter::split(source).unwrap();
    assert_eq!(split.header, Some("a = 1\n"));
    assert_eq!(split.header_offset, 4);
    assert_eq!(split.body, "body\n");
    assert_eq!(&source[split.body_offset..], "body\n");

    let split = frontmatter::split("no header\n").unwrap();
    assert_eq!(split.header, None);
    assert_eq!(split.body, "no header\n");
}
