//! Structured errors for the quantity engine
//!
//! Every failure is a `QuantaError` value returned synchronously at the
//! point of detection. `ErrorReport` is the serializable view used by
//! front ends that need machine-readable codes and a suggestion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const UNDEFINED_UNIT: &str = "UNDEFINED_UNIT";
    pub const INCOMPATIBLE_DIMENSIONS: &str = "INCOMPATIBLE_DIMENSIONS";
    pub const UNSUPPORTED_COMPOUND: &str = "UNSUPPORTED_COMPOUND";
    pub const INVALID_OPERAND: &str = "INVALID_OPERAND";
    pub const INVALID_DEFINITION: &str = "INVALID_DEFINITION";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const SHAPE_MISMATCH: &str = "SHAPE_MISMATCH";
    pub const REGISTRY_MISMATCH: &str = "REGISTRY_MISMATCH";
    pub const CATALOG_ERROR: &str = "CATALOG_ERROR";
}

/// Error type for registry, conversion and arithmetic operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantaError {
    #[error("undefined unit: {0}")]
    UndefinedUnit(String),

    /// Base tallies of the two sides differ. Both tallies are pre-rendered.
    #[error("incompatible dimensions: {left} vs {right}")]
    IncompatibleDimensions { left: String, right: String },

    #[error("cannot convert compound unit {units} to single unit {target}: more than one base unit")]
    UnsupportedCompoundConversion { units: String, target: String },

    #[error("invalid operand for {op}: {reason}")]
    InvalidOperand { op: &'static str, reason: String },

    #[error("invalid definition of unit {name:?}: {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("cannot parse {input:?} at position {position}: {reason}")]
    Parse {
        input: String,
        position: usize,
        reason: String,
    },

    #[error("element-wise operation on values of length {left} and {right}")]
    ShapeMismatch { left: usize, right: usize },

    #[error("operands belong to different unit registries")]
    RegistryMismatch,

    #[error("invalid unit catalog: {0}")]
    Catalog(String),
}

/// Shorthand `Result` type used throughout quanta.
pub type Result<T, E = QuantaError> = std::result::Result<T, E>;

impl QuantaError {
    /// `name` is not registered
    pub fn undefined_unit(name: impl Into<String>) -> Self {
        Self::UndefinedUnit(name.into())
    }

    /// Operand rejected by `op`
    pub fn invalid_operand(op: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOperand {
            op,
            reason: reason.into(),
        }
    }

    /// Definition of `name` rejected
    pub fn invalid_definition(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Syntax error at a character offset into `input`
    pub fn parse(input: &str, position: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.to_string(),
            position,
            reason: reason.into(),
        }
    }

    /// Machine-readable code, one of the constants in [`codes`]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UndefinedUnit(_) => codes::UNDEFINED_UNIT,
            Self::IncompatibleDimensions { .. } => codes::INCOMPATIBLE_DIMENSIONS,
            Self::UnsupportedCompoundConversion { .. } => codes::UNSUPPORTED_COMPOUND,
            Self::InvalidOperand { .. } => codes::INVALID_OPERAND,
            Self::InvalidDefinition { .. } => codes::INVALID_DEFINITION,
            Self::Parse { .. } => codes::PARSE_ERROR,
            Self::ShapeMismatch { .. } => codes::SHAPE_MISMATCH,
            Self::RegistryMismatch => codes::REGISTRY_MISMATCH,
            Self::Catalog(_) => codes::CATALOG_ERROR,
        }
    }

    /// Hint for fixing the error, if there is a generic one
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::UndefinedUnit(name) => Some(format!("Define '{}' or check spelling", name)),
            Self::IncompatibleDimensions { .. } => {
                Some("Check that both sides measure the same physical quantity".to_string())
            }
            Self::UnsupportedCompoundConversion { .. } => {
                Some("Convert to a compound target expression such as \"m/s\"".to_string())
            }
            Self::Parse { .. } => Some("Use forms like \"10 km/hr\" or \"kg*m/s^2\"".to_string()),
            Self::ShapeMismatch { .. } => {
                Some("Use arrays of equal length or a single-element array".to_string())
            }
            Self::RegistryMismatch => {
                Some("Build both quantities from the same registry".to_string())
            }
            _ => None,
        }
    }

    /// Code, message and suggestion as one serializable value
    pub fn report(&self) -> ErrorReport {
        ErrorReport::from(self)
    }
}

/// Serializable view of an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<&QuantaError> for ErrorReport {
    fn from(err: &QuantaError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            suggestion: err.suggestion(),
        }
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}
