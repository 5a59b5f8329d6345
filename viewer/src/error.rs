use std::fmt;
use std::path::PathBuf;

use deck::parser::ParseError;

#[derive(Debug)]
pub enum ViewerError {
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    /// The deck did not parse. Carries the source so callers can render
    /// the diagnostics.
    Parse {
        name: String,
        source: String,
        errors: Vec<ParseError>,
    },
    InvalidKey(String),
    NoSuchLink(String),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::Io { path, error } => {
                write!(f, "cannot read '{}': {}", path.display(), error)
            }
            ViewerError::Parse { name, errors, .. } => {
                write!(f, "{} parse error(s) in {}", errors.len(), name)?;
                if let Some(first) = errors.first() {
                    write!(f, ": {}", first)?;
                }
                Ok(())
            }
            ViewerError::InvalidKey(key) => write!(f, "invalid key: {:?}", key),
            ViewerError::NoSuchLink(href) => write!(f, "no visible link to {}", href),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::Io { error, .. } => Some(error),
            _ => None,
        }
    }
}
