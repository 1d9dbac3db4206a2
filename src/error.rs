/// Unified error types for the group name mapper
use thiserror::Error;

/// Main error type for directory access, caching and configuration
#[derive(Error, Debug)]
pub enum GroupMapperError {
    /// Required settings missing or invalid at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Client-credentials token exchange rejected or unreachable
    #[error("Authentication failed{}: {message}", status_suffix(.status))]
    Auth {
        status: Option<u16>,
        message: String,
    },

    /// Group listing page rejected, malformed, or otherwise unusable
    #[error("Group fetch failed{}: {message}", status_suffix(.status))]
    Fetch {
        status: Option<u16>,
        message: String,
    },

    /// Transport-level HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Metrics registry errors
    #[error("Metrics error: {0}")]
    Metrics(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl GroupMapperError {
    pub fn auth(status: Option<u16>, message: impl Into<String>) -> Self {
        GroupMapperError::Auth {
            status,
            message: message.into(),
        }
    }

    pub fn fetch(status: Option<u16>, message: impl Into<String>) -> Self {
        GroupMapperError::Fetch {
            status,
            message: message.into(),
        }
    }

    /// True for token exchange failures
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, GroupMapperError::Auth { .. })
    }

    /// True for group listing failures, including transport errors mid-fetch
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, GroupMapperError::Fetch { .. } | GroupMapperError::Http(_))
    }

    /// HTTP status carried by the failure, if the remote answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            GroupMapperError::Auth { status, .. } | GroupMapperError::Fetch { status, .. } => *status,
            GroupMapperError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<prometheus::Error> for GroupMapperError {
    fn from(e: prometheus::Error) -> Self {
        GroupMapperError::Metrics(e.to_string())
    }
}

/// Result type alias for mapper operations
pub type MapperResult<T> = Result<T, GroupMapperError>;
