//! Unit acquisition and forwarding errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type UnitResult<T> = Result<T, UnitError>;

/// Failure raised while resolving, acquiring, or operating on a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// No resolver in the chain knows the requested name.
    NotFound(String),
    MissingMember {
        unit: String,
        member: String,
    },
    NotCallable(String),
    NotIndexable(String),
    IndexOutOfRange {
        len: usize,
        index: i64,
    },
    /// The target does not support the forwarded operation at all.
    Unsupported {
        target: String,
        operation: &'static str,
    },
    /// The unit's initializer reported a failure.
    LoadFailed {
        unit: String,
        message: String,
    },
}

impl UnitError {
    pub fn load_failed(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadFailed {
            unit: unit.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(target: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            target: target.into(),
            operation,
        }
    }
}

impl Display for UnitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "no unit named `{name}`"),
            Self::MissingMember { unit, member } => {
                write!(f, "unit `{unit}` has no member `{member}`")
            }
            Self::NotCallable(value) => write!(f, "value is not callable: {value}"),
            Self::NotIndexable(value) => write!(f, "value is not indexable: {value}"),
            Self::IndexOutOfRange { len, index } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::Unsupported { target, operation } => {
                write!(f, "`{target}` does not support {operation}")
            }
            Self::LoadFailed { unit, message } => {
                write!(f, "failed to acquire unit `{unit}`: {message}")
            }
        }
    }
}

impl Error for UnitError {}
