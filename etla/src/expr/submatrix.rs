//! Rectangular block view

use etla_core::simd::Pack;
use etla_core::{
    Address, DenseMatrix, Density, EtlaError, Expression, Matrix, Result,
    SparseMatrix, StorageOrder, Structure,
};

use crate::assign::MatrixAssign;

/// Block `rows x columns` of an operand starting at `(row, column)`
#[derive(Debug, Clone, Copy)]
pub struct Submatrix<M> {
    operand: M,
    row: usize,
    column: usize,
    rows: usize,
    columns: usize,
}

impl<M: Matrix> Submatrix<M> {
    pub fn new(operand: M, row: usize, column: usize, rows: usize, columns: usize) -> Result<Self> {
        if row + rows > operand.rows() || column + columns > operand.columns() {
            return Err(EtlaError::IndexOutOfBounds {
                index: (row + rows, column + columns),
                bounds: (operand.rows(), operand.columns()),
            });
        }
        Ok(Self {
            operand,
            row,
            column,
            rows,
            columns,
        })
    }

    /// Block without bounds validation, for internal partitioning
    pub(crate) fn within(operand: M, row: usize, column: usize, rows: usize, columns: usize) -> Self {
        debug_assert!(row + rows <= operand.rows() && column + columns <= operand.columns());
        Self {
            operand,
            row,
            column,
            rows,
            columns,
        }
    }

    fn major_minor_offsets(&self) -> (usize, usize) {
        M::Order::major_minor(self.row, self.column)
    }
}

impl<M: Matrix> Expression for Submatrix<M> {
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = M::IS_COMPUTATION;
    const REQUIRES_EVALUATION: bool = M::REQUIRES_EVALUATION;
    const SMP_ASSIGNABLE: bool = M::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        self.operand.can_alias(alias)
    }

    fn is_aliased(&self, alias: Address) -> bool {
        self.operand.is_aliased(alias)
    }
}

impl<M: Matrix> Matrix for Submatrix<M> {
    type Element = M::Element;
    type Order = M::Order;

    const DENSITY: Density = M::DENSITY;

    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> Self::Element {
        self.operand.get(self.row + i, self.column + j)
    }

    /// Principal blocks keep the operand's structure
    fn structure(&self) -> Structure {
        if self.row == self.column && self.rows == self.columns {
            self.operand.structure()
        } else {
            Structure::GENERAL
        }
    }
}

impl<M: DenseMatrix> DenseMatrix for Submatrix<M> {
    fn load(&self, i: usize, j: usize) -> Pack<Self::Element> {
        self.operand.load(self.row + i, self.column + j)
    }
}

/// Non-zeros of a major line restricted to a minor index window, re-based to the window start
#[derive(Debug, Clone)]
pub struct Window<I> {
    inner: I,
    start: usize,
    end: usize,
}

impl<T, I: Iterator<Item = (usize, T)>> Iterator for Window<I> {
    type Item = (usize, T);

    fn next(&mut self) -> Option<(usize, T)> {
        for (index, value) in self.inner.by_ref() {
            if index < self.start {
                continue;
            }
            if index >= self.end {
                return None;
            }
            return Some((index - self.start, value));
        }
        None
    }
}

impl<M: SparseMatrix> SparseMatrix for Submatrix<M> {
    type MajorIter<'a> = Window<M::MajorIter<'a>> where Self: 'a;

    fn major(&self, i: usize) -> Self::MajorIter<'_> {
        let (major, minor) = self.major_minor_offsets();
        Window {
            inner: self.operand.major(major + i),
            start: minor,
            end: minor + self.minor_len(),
        }
    }
}

impl<M: MatrixAssign> MatrixAssign for Submatrix<M> {}
