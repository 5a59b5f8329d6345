/// A source split into its optional `---` delimited header and the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split<'a> {
    /// Text between the delimiters, if the source opens with one.
    pub header: Option<&'a str>,
    /// Byte offset of `header` within the original source.
    pub header_offset: usize,
    pub body: &'a str,
    /// Byte offset of `body` within the original source.
    pub body_offset: usize,
}

/// Split off a frontmatter block: a first line that is exactly `---`, up to
/// the next line that is exactly `---`. Sources without an opening
/// delimiter are all body.
pub fn split(content: &str) -> Result<Split<'_>, String> {
    let bom = if content.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };
    let text = &content[bom..];

    let first_line_end = text.find('\n').unwrap_or(text.len());
    if text[..first_line_end].trim_end() != "---" {
        return Ok(Split {
            header: None,
            header_offset: bom,
            body: text,
            body_offset: bom,
        });
    }

    let header_offset = (bom + first_line_end + 1).min(content.len());
    let after_open = &content[header_offset..];

    let mut pos = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let body_offset = header_offset + pos + line.len();
            return Ok(Split {
                header: Some(&after_open[..pos]),
                header_offset,
                body: &content[body_offset..],
                body_offset,
            });
        }
        pos += line.len();
    }

    Err("missing closing --- frontmatter delimiter".into())
}
