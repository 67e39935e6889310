//! Index validation for checked element access

use crate::EtlaError;

/// Validate a (row, column) index against matrix dimensions
pub const fn check_matrix_index(
    i: usize,
    j: usize,
    rows: usize,
    columns: usize,
) -> Result<(), EtlaError> {
    if i >= rows || j >= columns {
        return Err(EtlaError::IndexOutOfBounds {
            index: (i, j),
            bounds: (rows, columns),
        });
    }
    Ok(())
}

/// Validate a vector index against its size
///
/// Vectors report their bounds as a single column.
pub const fn check_vector_index(i: usize, size: usize) -> Result<(), EtlaError> {
    if i >= size {
        return Err(EtlaError::IndexOutOfBounds {
            index: (i, 0),
            bounds: (size, 1),
        });
    }
    Ok(())
}
