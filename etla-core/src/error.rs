//! Error types for expression construction and element access

/// Broad error classes, mirroring the split between argument and range failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Operands or declarations that are incompatible with the requested operation
    InvalidArgument,
    /// Checked element access outside the bounds of a vector or matrix
    OutOfRange,
}

/// Errors that can occur while building or evaluating expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtlaError {
    /// Operand dimensions are incompatible, given as (rows, columns)
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// A square matrix was required (structure declarations)
    NotSquare { rows: usize, columns: usize },
    /// The operand/operator combination resolves to no result type
    UnsupportedOperation,
    /// Container data does not satisfy the requested structural flags
    InvalidStructure,
    /// Checked access outside the bounds, given as (index, bound) per dimension
    IndexOutOfBounds {
        index: (usize, usize),
        bounds: (usize, usize),
    },
}

impl EtlaError {
    /// Get the category of this error
    pub const fn category(&self) -> ErrorCategory {
        match self {
            EtlaError::IndexOutOfBounds { .. } => ErrorCategory::OutOfRange,
            _ => ErrorCategory::InvalidArgument,
        }
    }
}

impl core::fmt::Display for EtlaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EtlaError::ShapeMismatch { expected, found } => write!(
                f,
                "Matrix sizes do not match: expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            EtlaError::NotSquare { rows, columns } => {
                write!(f, "Invalid structure specification for non-square {rows}x{columns} matrix")
            }
            EtlaError::UnsupportedOperation => write!(f, "Unsupported operand combination"),
            EtlaError::InvalidStructure => write!(f, "Data violates the declared matrix structure"),
            EtlaError::IndexOutOfBounds { index, bounds } => write!(
                f,
                "Invalid access index ({}, {}) for {}x{} operand",
                index.0, index.1, bounds.0, bounds.1
            ),
        }
    }
}

impl core::error::Error for EtlaError {}

/// Result type for ETLA operations
pub type Result<T> = core::result::Result<T, EtlaError>;
