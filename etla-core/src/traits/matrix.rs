//! Matrix capability interface
//!
//! The expression engine consumes containers only through these traits:
//! dimensions, checked and unchecked element access, restartable
//! iteration over the non-zeros of a major line, raw data access and
//! the capability queries inherited from [`Expression`].

use crate::simd::{Pack, LANES};
use crate::structure::Structure;
use crate::traits::element::Element;
use crate::traits::expression::Expression;
use crate::traits::order::StorageOrder;
use crate::validation::check_matrix_index;
use crate::Result;

/// Storage density of an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Density {
    Dense,
    Sparse,
}

/// Core matrix trait
pub trait Matrix: Expression {
    type Element: Element;
    type Order: StorageOrder;

    const DENSITY: Density;

    /// Number of rows
    fn rows(&self) -> usize;

    /// Number of columns
    fn columns(&self) -> usize;

    /// Unchecked element access
    ///
    /// Precondition: `i < rows()` and `j < columns()`, checked only by
    /// debug assertions.
    fn get(&self, i: usize, j: usize) -> Self::Element;

    /// Checked element access
    fn at(&self, i: usize, j: usize) -> Result<Self::Element> {
        check_matrix_index(i, j, self.rows(), self.columns())?;
        Ok(self.get(i, j))
    }

    /// Structural flags known for this operand
    fn structure(&self) -> Structure {
        Structure::GENERAL
    }

    /// Number of major lines (rows for row-major, columns for column-major)
    fn major_len(&self) -> usize {
        if Self::Order::IS_ROW_MAJOR {
            self.rows()
        } else {
            self.columns()
        }
    }

    /// Number of elements per major line
    fn minor_len(&self) -> usize {
        if Self::Order::IS_ROW_MAJOR {
            self.columns()
        } else {
            self.rows()
        }
    }

    fn is_square(&self) -> bool {
        self.rows() == self.columns()
    }
}

/// Matrix with dense element storage
pub trait DenseMatrix: Matrix {
    /// Contiguous storage in the matrix' storage order, if available
    fn data(&self) -> Option<&[Self::Element]> {
        None
    }

    /// Vectorized read of `LANES` consecutive elements along the major line
    ///
    /// Precondition: the pack lies within the line.
    fn load(&self, i: usize, j: usize) -> Pack<Self::Element> {
        core::array::from_fn(|k| {
            if Self::Order::IS_ROW_MAJOR {
                self.get(i, j + k)
            } else {
                self.get(i + k, j)
            }
        })
    }
}

/// Matrix with compressed (non-zero only) storage
pub trait SparseMatrix: Matrix {
    /// Iterator over `(minor index, value)` pairs of one major line in ascending index order
    type MajorIter<'a>: Iterator<Item = (usize, Self::Element)> + Clone
    where
        Self: 'a;

    /// Non-zeros of major line `i` (row `i` for row-major, column `i` for column-major)
    fn major(&self, i: usize) -> Self::MajorIter<'_>;

    /// Number of non-zeros in major line `i`
    fn major_non_zeros(&self, i: usize) -> usize {
        self.major(i).count()
    }

    /// Total number of non-zeros
    fn non_zeros(&self) -> usize {
        (0..self.major_len()).map(|i| self.major_non_zeros(i)).sum()
    }
}

/// Dense matrix that can be written by the assignment kernels
pub trait DenseMatrixMut: DenseMatrix {
    /// Unchecked mutable element access, same precondition as [`Matrix::get`]
    fn get_mut(&mut self, i: usize, j: usize) -> &mut Self::Element;

    /// Contiguous mutable storage in the matrix' storage order, if available
    fn data_mut(&mut self) -> Option<&mut [Self::Element]> {
        None
    }

    fn set(&mut self, i: usize, j: usize, value: Self::Element) {
        *self.get_mut(i, j) = value;
    }

    /// Reset every element to its default value
    fn reset(&mut self) {
        for i in 0..self.rows() {
            for j in 0..self.columns() {
                self.set(i, j, num_traits::Zero::zero());
            }
        }
    }

    /// Vectorized write of `LANES` consecutive elements along the major line
    fn store(&mut self, i: usize, j: usize, pack: Pack<Self::Element>) {
        for (k, value) in pack.into_iter().enumerate().take(LANES) {
            if Self::Order::IS_ROW_MAJOR {
                self.set(i, j + k, value);
            } else {
                self.set(i + k, j, value);
            }
        }
    }
}

impl<M: Matrix + ?Sized> Matrix for &M {
    type Element = M::Element;
    type Order = M::Order;

    const DENSITY: Density = M::DENSITY;

    fn rows(&self) -> usize {
        (**self).rows()
    }

    fn columns(&self) -> usize {
        (**self).columns()
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> Self::Element {
        (**self).get(i, j)
    }

    fn structure(&self) -> Structure {
        (**self).structure()
    }
}

impl<M: DenseMatrix + ?Sized> DenseMatrix for &M {
    fn data(&self) -> Option<&[Self::Element]> {
        (**self).data()
    }

    fn load(&self, i: usize, j: usize) -> Pack<Self::Element> {
        (**self).load(i, j)
    }
}

impl<M: SparseMatrix + ?Sized> SparseMatrix for &M {
    type MajorIter<'a> = M::MajorIter<'a> where Self: 'a;

    fn major(&self, i: usize) -> Self::MajorIter<'_> {
        (**self).major(i)
    }

    fn major_non_zeros(&self, i: usize) -> usize {
        (**self).major_non_zeros(i)
    }

    fn non_zeros(&self) -> usize {
        (**self).non_zeros()
    }
}
