//! Result and error types for Pagebind.

use thiserror::Error;

/// Result type for Pagebind operations
pub type PageResult<T> = Result<T, PageError>;

/// Errors that can occur while resolving, reading or writing page fields
#[derive(Debug, Error)]
pub enum PageError {
    /// A wait predicate was not satisfied before its deadline
    #[error("Operation timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of what was waited for
        waited_for: String,
    },

    /// Zero elements matched a locator
    #[error("No element found for {locator}")]
    NotFound {
        /// Rendered locator (or option text) that matched nothing
        locator: String,
    },

    /// A handle no longer refers to an attached element
    #[error("Element {element} is stale")]
    Stale {
        /// Handle id
        element: String,
    },

    /// Malformed write payload
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Any other failure reported by the driver
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Field not registered on the page object, or registered as another kind
    #[error("Unknown {kind} field: {name}")]
    UnknownField {
        /// Field name
        name: String,
        /// Kind the caller asked for
        kind: &'static str,
    },

    /// Transition target missing from the page registry
    #[error("Unknown page: {name}")]
    UnknownPage {
        /// Page name
        name: String,
    },

    /// Configuration parse error
    #[error("Config error: {0}")]
    Config(#[from] serde_yaml_ng::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PageError {
    /// Build an [`PageError::InvalidArgument`]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Build a [`PageError::Driver`]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Whether this is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether this is a not-found failure
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether a handle was detached
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// Failures that a read path treats as "element absent"
    #[must_use]
    pub const fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::NotFound { .. } | Self::Stale { .. } | Self::Driver { .. }
        )
    }
}
