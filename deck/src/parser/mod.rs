pub mod error;
pub mod frontmatter;
mod structural;

pub use error::ParseError;

use serde::Deserialize;

use crate::Page;

/// Window title used when the frontmatter does not name one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Keys accepted in a deck's TOML frontmatter.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeckMeta {
    pub title: Option<String>,
    pub lang: Option<String>,
}

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the deck source into a page ready to be presented.
    pub fn parse(&self) -> Result<Page, Vec<ParseError>> {
        let split = frontmatter::split(&self.source)
            .map_err(|message| vec![ParseError::error(message, 0..3, self.file_id)])?;

        let meta = match split.header {
            Some(header) => parse_meta(header, split.header_offset, self.file_id)?,
            None => DeckMeta::default(),
        };

        let dom = structural::build_dom(split.body, split.body_offset, self.file_id)?;

        Ok(Page {
            dom,
            title: meta.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            lang: meta.lang,
            source_id: self.file_id,
        })
    }
}

fn parse_meta(header: &str, offset: usize, file_id: usize) -> Result<DeckMeta, Vec<ParseError>> {
    toml::from_str(header).map_err(|e| {
        let span = e
            .span()
            .map(|s| s.start + offset..s.end + offset)
            .unwrap_or(offset..offset + header.len());
        vec![ParseError::error(
            format!("invalid frontmatter: {}", e.message()),
            span,
            file_id,
        )]
    })
}
