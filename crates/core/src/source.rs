// Media source classification

use crate::error::{PlayerError, Result};
use std::fmt;

/// Where the media bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Http(String),
    File(String),
}

impl SourceKind {
    /// Classify a locator: `http://` and `https://` are network sources,
    /// everything else is treated as a local path.
    pub fn classify(locator: &str) -> Result<Self> {
        let trimmed = locator.trim();
        if trimmed.is_empty() {
            return Err(PlayerError::InvalidDataSource(
                "empty locator".to_string(),
            ));
        }

        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(SourceKind::Http(trimmed.to_string()))
        } else {
            Ok(SourceKind::File(trimmed.to_string()))
        }
    }

    pub fn locator(&self) -> &str {
        match self {
            SourceKind::Http(url) => url,
            SourceKind::File(path) => path,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            SourceKind::Http(_) => "HTTP",
            SourceKind::File(_) => "FILE",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.tag(), self.locator())
    }
}
