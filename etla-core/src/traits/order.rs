//! Storage order and transpose flag markers

use core::fmt::Debug;

/// Storage order of a matrix, as a zero-sized type-level tag
pub trait StorageOrder: Copy + Default + Debug + Send + Sync + 'static {
    const IS_ROW_MAJOR: bool;

    /// The order obtained by transposition
    type Opposite: StorageOrder<Opposite = Self>;

    /// Map (row, column) to (major, minor) coordinates
    #[inline]
    fn major_minor(row: usize, column: usize) -> (usize, usize) {
        if Self::IS_ROW_MAJOR {
            (row, column)
        } else {
            (column, row)
        }
    }

    /// Map (major, minor) coordinates back to (row, column)
    #[inline]
    fn row_column(major: usize, minor: usize) -> (usize, usize) {
        Self::major_minor(major, minor)
    }

    /// Runtime tag for the descriptor layer
    fn tag() -> Order {
        if Self::IS_ROW_MAJOR {
            Order::RowMajor
        } else {
            Order::ColumnMajor
        }
    }
}

/// Row-major storage: each row is stored contiguously
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMajor;

/// Column-major storage: each column is stored contiguously
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMajor;

impl StorageOrder for RowMajor {
    const IS_ROW_MAJOR: bool = true;
    type Opposite = ColumnMajor;
}

impl StorageOrder for ColumnMajor {
    const IS_ROW_MAJOR: bool = false;
    type Opposite = RowMajor;
}

/// Runtime storage order tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Order {
    RowMajor,
    ColumnMajor,
}

impl Order {
    pub const fn opposite(self) -> Order {
        match self {
            Order::RowMajor => Order::ColumnMajor,
            Order::ColumnMajor => Order::RowMajor,
        }
    }
}

/// Orientation of a vector
pub trait TransposeFlag: Copy + Default + Debug + Send + Sync + 'static {
    const IS_TRANSPOSED: bool;

    type Opposite: TransposeFlag<Opposite = Self>;
}

/// Non-transposed (column) vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnVector;

/// Transposed (row) vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowVector;

impl TransposeFlag for ColumnVector {
    const IS_TRANSPOSED: bool = false;
    type Opposite = RowVector;
}

impl TransposeFlag for RowVector {
    const IS_TRANSPOSED: bool = true;
    type Opposite = ColumnVector;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_minor() {
        assert_eq!(RowMajor::major_minor(1, 2), (1, 2));
        assert_eq!(ColumnMajor::major_minor(1, 2), (2, 1));
        assert_eq!(ColumnMajor::row_column(2, 1), (1, 2));
        assert_eq!(<RowMajor as StorageOrder>::Opposite::tag(), Order::ColumnMajor);
    }
}
