use std::fmt;

use thiserror::Error;

/// The two failure families every operation can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Well-typed input that is numerically invalid or outside the representable domain.
    Range,
    /// Structurally wrong input, e.g. a field bag missing a required field.
    Type,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Range => f.write_str("RangeError"),
            ErrorKind::Type => f.write_str("TypeError"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TemporalError {
    kind: ErrorKind,
    message: String,
}

pub type TemporalResult<T> = Result<T, TemporalError>;

impl TemporalError {
    pub fn range(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Range,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Type,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_range(&self) -> bool {
        self.kind == ErrorKind::Range
    }

    pub fn is_type(&self) -> bool {
        self.kind == ErrorKind::Type
    }
}
