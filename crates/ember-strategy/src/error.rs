//! Strategy construction and evaluation errors.

use std::fmt;

use ember_ir::{DType, IrError};
use ember_target::Arch;
use thiserror::Error;

/// Result type for strategy operations.
pub type StrategyResult<T> = Result<T, StrategyError>;

/// The stored function that reported an argument error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The compute function.
    Compute,
    /// The schedule function.
    Schedule,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compute => f.write_str("compute"),
            Self::Schedule => f.write_str("schedule"),
        }
    }
}

/// Errors raised while building or evaluating an operator strategy.
///
/// Every variant names the operator it was raised for.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StrategyError {
    /// A required attribute is absent.
    #[error("{op}: missing required attribute `{attr}`")]
    MissingAttribute {
        /// Operator name.
        op: String,
        /// Attribute key.
        attr: &'static str,
    },

    /// The `axis` attribute has an unsupported encoding.
    #[error("{op}: attribute `{attr}` has unsupported type {found}")]
    InvalidAttributeType {
        /// Operator name.
        op: String,
        /// Attribute key.
        attr: &'static str,
        /// Description of the value found.
        found: &'static str,
    },

    /// The `keepdim` attribute is present but not a boolean.
    #[error("{op}: attribute `keepdim` must be a boolean, found {found}")]
    InvalidKeepdim {
        /// Operator name.
        op: String,
        /// Description of the value found.
        found: &'static str,
    },

    /// Too many axes, or an axis outside the admitted range.
    #[error("{op}: reduce axes {axes:?} are out of range for input of rank {rank}")]
    AxisOutOfRange {
        /// Operator name.
        op: String,
        /// Normalised axes, sorted.
        axes: Vec<i64>,
        /// Rank of the input tensor.
        rank: usize,
    },

    /// The same axis appears more than once.
    #[error("{op}: the reduce axes should be unique, axis {axis} repeats")]
    DuplicateAxis {
        /// Operator name.
        op: String,
        /// The repeated axis.
        axis: usize,
    },

    /// The strategy was asked to build with no input tensor.
    #[error("{op}: expected an input tensor")]
    MissingInput {
        /// Operator name.
        op: String,
    },

    /// A stored function was called with no arguments.
    #[error("{op}: the input arguments of {stage} are empty")]
    EmptyArguments {
        /// Operator name.
        op: String,
        /// The failing function.
        stage: Stage,
    },

    /// The first argument of a stored function is not a nested pack.
    #[error("{op}: the first argument of {stage} must be an argument pack")]
    NotAPack {
        /// Operator name.
        op: String,
        /// The failing function.
        stage: Stage,
    },

    /// A stored function was called with the wrong number of entries.
    #[error("{op}: {stage} expects between {min} and {max} arguments, got {got}")]
    ArityMismatch {
        /// Operator name.
        op: String,
        /// The failing function.
        stage: Stage,
        /// Fewest accepted entries.
        min: usize,
        /// Most accepted entries.
        max: usize,
        /// Entries received.
        got: usize,
    },

    /// An argument that must be a tensor is not one.
    #[error("{op}: {stage} argument {index} is not a tensor")]
    NotATensor {
        /// Operator name.
        op: String,
        /// The failing function.
        stage: Stage,
        /// Position in the pack.
        index: usize,
    },

    /// An argument that must be a string is not one.
    #[error("{op}: {stage} argument {index} is not a string")]
    NotAString {
        /// Operator name.
        op: String,
        /// The failing function.
        stage: Stage,
        /// Position in the pack.
        index: usize,
    },

    /// The input element type does not suit the operator.
    #[error("{op}: input `{tensor}` must have element type {expected}, found {found}")]
    TypeMismatch {
        /// Operator name.
        op: String,
        /// Name of the offending tensor.
        tensor: String,
        /// Required element type.
        expected: DType,
        /// Actual element type.
        found: DType,
    },

    /// The schedule function received tensors but no statement trees.
    #[error("{op}: schedule received no statement trees")]
    EmptyExpressionSet {
        /// Operator name.
        op: String,
    },

    /// No schedule exists for the target architecture.
    #[error("{op}: scheduling is not implemented for architecture {arch}")]
    UnsupportedArchitecture {
        /// Operator name.
        op: String,
        /// The target architecture.
        arch: Arch,
    },

    /// An IR operation failed.
    #[error(transparent)]
    Ir(#[from] IrError),
}

impl StrategyError {
    /// The operator this error was raised for, if it names one.
    #[must_use]
    pub fn op(&self) -> Option<&str> {
        match self {
            Self::MissingAttribute { op, .. }
            | Self::InvalidAttributeType { op, .. }
            | Self::InvalidKeepdim { op, .. }
            | Self::AxisOutOfRange { op, .. }
            | Self::DuplicateAxis { op, .. }
            | Self::MissingInput { op }
            | Self::EmptyArguments { op, .. }
            | Self::NotAPack { op, .. }
            | Self::ArityMismatch { op, .. }
            | Self::NotATensor { op, .. }
            | Self::NotAString { op, .. }
            | Self::TypeMismatch { op, .. }
            | Self::EmptyExpressionSet { op }
            | Self::UnsupportedArchitecture { op, .. } => Some(op),
            Self::Ir(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_operator() {
        let err = StrategyError::DuplicateAxis {
            op: "reduce_sum".to_string(),
            axis: 1,
        };
        assert!(err.to_string().starts_with("reduce_sum:"));
        assert!(err.to_string().contains("should be unique"));
        assert_eq!(err.op(), Some("reduce_sum"));
    }

    #[test]
    fn test_unsupported_arch_message() {
        let err = StrategyError::UnsupportedArchitecture {
            op: "reduce_max".to_string(),
            arch: Arch::Unknown,
        };
        assert_eq!(
            err.to_string(),
            "reduce_max: scheduling is not implemented for architecture unknown"
        );
    }

    #[test]
    fn test_ir_error_has_no_op() {
        let err = StrategyError::from(IrError::EmptyModule);
        assert_eq!(err.op(), None);
    }
}
