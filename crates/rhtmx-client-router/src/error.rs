//! Errors raised by route configuration and navigation

use thiserror::Error;

/// Route wiring errors
///
/// Every variant is a bug on the caller's side. A URL that simply does not
/// match a pattern is never an error; it yields a non-matching
/// [`MatchResult`](crate::MatchResult).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The pattern text could not be compiled.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A route was mounted without a pattern.
    #[error("route has no pattern")]
    MissingPattern,

    /// A route was mounted without an element tag name.
    #[error("route `{route}` has no element to render")]
    MissingElement { route: String },

    /// The pattern of a route was changed after it had been set.
    #[error("route pattern is immutable once set (current: `{current}`)")]
    PatternImmutable { current: String },

    /// The root prefix was configured a second time.
    #[error("root prefix is already set to `{current}`")]
    RootAlreadySet { current: String },

    /// `navigate` composed a path that still holds `:name` placeholders.
    #[error("cannot navigate to `{path}`: unresolved parameters {params:?}")]
    UnresolvedParams { path: String, params: Vec<String> },

    /// A URL handed to the navigation layer could not be parsed.
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl RouterError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

pub type RouterResult<T> = Result<T, RouterError>;
