//! Error types for the query options engine.
//!
//! Every failure raised while parsing or validating client supplied option
//! text is a bad request; only [`Error::Internal`] signals a broken schema
//! configuration on the host side.

use crate::value::Value;
use thiserror::Error as ThisError;

/// Result type alias for engine operations.
pub type Result<T> = core::result::Result<T, Error>;

/// A syntax error raised by one of the option parsers.
///
/// Carries the byte offset of the offending character and the complete
/// input so the caller can point the client at the exact location.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message} at position {position} in '{input}'")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
    pub input: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize, input: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position,
            input: input.into(),
        }
    }
}

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed option text.
    Syntax,
    /// Well formed option text that the schema does not permit.
    Validation,
    /// Host configuration problem; never caused by client input.
    Internal,
}

/// Error types for query option handling.
#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum Error {
    /// Malformed filter, order, select or expand text.
    #[error("syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// Property is not part of the catalog.
    #[error("unknown property '{property}', allowed properties: {}", .allowed.join(", "))]
    UnknownProperty {
        property: String,
        allowed: Vec<String>,
    },

    /// Operator does not fit the shape of the value (null, array, `bw` arity).
    #[error("invalid value for '{property} {operator}': {message}")]
    InvalidValueShape {
        property: String,
        operator: String,
        message: String,
    },

    /// Value is outside the allowed set of the property.
    #[error("value {value} not allowed for '{property}', allowed: {}", join_values(.allowed))]
    ValueNotAllowed {
        property: String,
        value: Value,
        allowed: Vec<Value>,
    },

    /// Filter references a relation that is not part of the expand clause.
    #[error("filter on '{property}' requires '{expand}' to be expanded")]
    ExpandRequired { property: String, expand: String },

    /// Expand targets a property that is not an expandable relation.
    #[error("'{property}' of '{entity}' is not expandable, allowed: {}", .allowed.join(", "))]
    NotExpandable {
        property: String,
        entity: String,
        allowed: Vec<String>,
    },

    /// Entity type does not support query options.
    #[error("entity '{entity}' does not support query options")]
    NotQueryable { entity: String },

    /// Expand text could not be split into clauses.
    #[error("invalid expand: {message}")]
    InvalidExpand { message: String },

    /// Scalar option (`top`, `skip`, ...) has an invalid value.
    #[error("invalid value for option '{option}': {message}")]
    InvalidOption { option: String, message: String },

    /// Schema provider returned an inconsistent description.
    #[error("internal inconsistency: {message}")]
    Internal { message: String },
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>, position: usize, input: impl Into<String>) -> Self {
        Error::Syntax(ParseError::new(message, position, input))
    }

    /// Creates an unknown property error.
    pub fn unknown_property<I, S>(property: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::UnknownProperty {
            property: property.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an operator/value shape error.
    pub fn invalid_value_shape(
        property: impl Into<String>,
        operator: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::InvalidValueShape {
            property: property.into(),
            operator: operator.into(),
            message: message.into(),
        }
    }

    /// Creates a value-not-allowed error.
    pub fn value_not_allowed(
        property: impl Into<String>,
        value: Value,
        allowed: Vec<Value>,
    ) -> Self {
        Error::ValueNotAllowed {
            property: property.into(),
            value,
            allowed,
        }
    }

    /// Creates a missing expand error.
    pub fn expand_required(property: impl Into<String>, expand: impl Into<String>) -> Self {
        Error::ExpandRequired {
            property: property.into(),
            expand: expand.into(),
        }
    }

    /// Creates a not expandable error.
    pub fn not_expandable<I, S>(
        property: impl Into<String>,
        entity: impl Into<String>,
        allowed: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::NotExpandable {
            property: property.into(),
            entity: entity.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a not queryable error.
    pub fn not_queryable(entity: impl Into<String>) -> Self {
        Error::NotQueryable {
            entity: entity.into(),
        }
    }

    /// Creates an invalid expand error.
    pub fn invalid_expand(message: impl Into<String>) -> Self {
        Error::InvalidExpand {
            message: message.into(),
        }
    }

    /// Creates an invalid option error.
    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidOption {
            option: option.into(),
            message: message.into(),
        }
    }

    /// Creates an internal inconsistency error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Syntax(_) => ErrorKind::Syntax,
            Error::Internal { .. } => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }

    /// Returns true if the error was caused by client input and should be
    /// answered with a bad request.
    #[inline]
    pub fn is_bad_request(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}
