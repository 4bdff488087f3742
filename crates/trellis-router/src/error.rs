//! Errors raised while parsing patterns or building the path table.

use http::Method;
use thiserror::Error;

/// An error produced by the path-matching table.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Opening and closing optional brackets are not balanced.
    #[error("number of opening '[' and closing ']' does not match in route `{pattern}`")]
    UnbalancedOptional {
        /// The offending pattern
        pattern: String,
    },

    /// An optional segment is followed by a mandatory one.
    #[error("optional segments can only occur at the end of route `{pattern}`")]
    OptionalNotAtEnd {
        /// The offending pattern
        pattern: String,
    },

    /// An optional segment (`[]`) contains nothing.
    #[error("empty optional part in route `{pattern}`")]
    EmptyOptional {
        /// The offending pattern
        pattern: String,
    },

    /// A segment mixes literal text and a placeholder, or a placeholder is malformed.
    #[error("invalid segment `{segment}` in route `{pattern}`")]
    InvalidSegment {
        /// The offending pattern
        pattern: String,
        /// The segment that could not be parsed
        segment: String,
    },

    /// The same placeholder name appears twice in one pattern.
    #[error("cannot use the same placeholder `{name}` twice in route `{pattern}`")]
    DuplicatePlaceholder {
        /// The offending pattern
        pattern: String,
        /// The repeated name
        name: String,
    },

    /// A placeholder constraint is not a valid regular expression.
    #[error("invalid constraint for `{name}` in route `{pattern}`: {source}")]
    InvalidConstraint {
        /// The offending pattern
        pattern: String,
        /// Placeholder name
        name: String,
        /// Regex compilation failure
        #[source]
        source: regex::Error,
    },

    /// A catch-all wildcard is followed by further segments.
    #[error("wildcard must be the last segment in route `{pattern}`")]
    WildcardNotLast {
        /// The offending pattern
        pattern: String,
    },

    /// The same method was registered twice for an equivalent pattern.
    #[error("cannot register two routes matching `{pattern}` for method {method}")]
    DuplicateRoute {
        /// Method registered twice
        method: Method,
        /// The pattern as written
        pattern: String,
    },

    /// URL generation was asked to fill a placeholder it was not given.
    #[error("missing parameter `{name}` for route `{pattern}`")]
    MissingParameter {
        /// Pattern being rendered
        pattern: String,
        /// Placeholder without a value
        name: String,
    },

    /// URL generation was given a value that violates the placeholder constraint.
    #[error("value `{value}` for `{name}` does not satisfy `{constraint}`")]
    ConstraintViolation {
        /// Placeholder name
        name: String,
        /// Supplied value
        value: String,
        /// Constraint source
        constraint: String,
    },
}
