//! Operand shape validation for operators and declarations

use crate::EtlaError;

/// Validate that two matrices have identical dimensions (elementwise operators)
pub const fn check_same_shape(lhs: (usize, usize), rhs: (usize, usize)) -> Result<(), EtlaError> {
    if lhs.0 != rhs.0 || lhs.1 != rhs.1 {
        return Err(EtlaError::ShapeMismatch {
            expected: lhs,
            found: rhs,
        });
    }
    Ok(())
}

/// Validate that two vectors have the same size
pub const fn check_same_size(lhs: usize, rhs: usize) -> Result<(), EtlaError> {
    check_same_shape((lhs, 1), (rhs, 1))
}

/// Validate the inner dimension of a product `lhs * rhs`
pub const fn check_multipliable(lhs: (usize, usize), rhs: (usize, usize)) -> Result<(), EtlaError> {
    if lhs.1 != rhs.0 {
        return Err(EtlaError::ShapeMismatch {
            expected: (lhs.1, rhs.1),
            found: rhs,
        });
    }
    Ok(())
}

/// Validate that a matrix is square (structure declarations)
pub const fn check_square(rows: usize, columns: usize) -> Result<(), EtlaError> {
    if rows != columns {
        return Err(EtlaError::NotSquare { rows, columns });
    }
    Ok(())
}
