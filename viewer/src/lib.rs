pub mod app;
pub mod controller;
pub mod error;
pub mod event;
pub mod host;
pub mod render;
pub mod session;

use std::path::Path;

use deck::Page;
use deck::parser::Parser;

pub use app::{NavLink, TocEntry, Viewer};
pub use controller::{PresentationController, parse_index};
pub use error::ViewerError;
pub use event::{Dispatch, Event, EventKind, KeyCode, KeyEvent, Modifiers};
pub use host::{Host, HistoryState};
pub use session::Session;

/// Read and parse a deck file.
pub fn open_page(path: impl AsRef<Path>) -> Result<Page, ViewerError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|error| ViewerError::Io {
        path: path.to_path_buf(),
        error,
    })?;
    parse_page(&path.display().to_string(), source)
}

/// Parse deck source held in memory. `name` is used for diagnostics.
pub fn parse_page(name: &str, source: String) -> Result<Page, ViewerError> {
    Parser::new(source.clone(), 0)
        .parse()
        .map_err(|errors| ViewerError::Parse {
            name: name.to_string(),
            source,
            errors,
        })
}
