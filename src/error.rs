//! Unified error type for all domtap operations.

/// Error type for domtap operations.
///
/// Configuration defects (a resolver spec missing `value`, an invalid
/// expression pattern) are deliberately absent — they degrade the offending
/// resolver to a no-op with a diagnostic instead of failing the pipeline.
#[derive(Debug)]
pub enum Error {
    /// JSON configuration document parsing error.
    ConfigParse(serde_json::Error),
    /// The host event source refused a subscription.
    EventSource(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigParse(e) => write!(f, "config parse error: {e}"),
            Self::EventSource(s) => write!(f, "event source error: {s}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigParse(e) => Some(e),
            Self::EventSource(_) => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::ConfigParse(e)
    }
}
