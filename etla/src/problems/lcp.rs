//! Linear complementarity problem
//!
//! Find `x` with `x >= 0`, `A*x + b >= 0` and `x . (A*x + b) = 0`. The
//! struct only holds the data and measures how far `x` is from a solution;
//! iterative solvers drive `x` through [`Lcp::project`] and
//! [`Lcp::residual`].

use etla_core::{check_same_size, check_square, check_vector_index, Element, Matrix, Result, RowMajor, Vector};
use num_traits::Float;
use tracing::trace;

use crate::expr::SMatDMatMult;
use crate::storage::{CompressedMatrix, DynamicMatrix, DynamicVector};

/// System matrix `a`, right-hand side `b` and unknowns `x`
#[derive(Debug, Clone, PartialEq)]
pub struct Lcp<T> {
    pub a: CompressedMatrix<T, RowMajor>,
    pub b: DynamicVector<T>,
    pub x: DynamicVector<T>,
}

impl<T: Element + Float> Lcp<T> {
    /// Fails unless `a` is square and `b`, `x` match its size
    pub fn new(a: CompressedMatrix<T, RowMajor>, b: DynamicVector<T>, x: DynamicVector<T>) -> Result<Self> {
        check_square(a.rows(), a.columns())?;
        check_same_size(a.rows(), b.size())?;
        check_same_size(a.rows(), x.size())?;
        Ok(Self { a, b, x })
    }

    /// Problem with all unknowns starting at zero
    pub fn with_zero_start(a: CompressedMatrix<T, RowMajor>, b: DynamicVector<T>) -> Result<Self> {
        let x = DynamicVector::new(b.size());
        Self::new(a, b, x)
    }

    /// Number of unknowns
    pub fn size(&self) -> usize {
        self.x.size()
    }

    /// Clamp unknown `index` onto `[lbound, ubound]`
    pub fn project(&mut self, index: usize) {
        self.x[index] = self.x[index].max(T::zero());
    }

    pub fn lbound(&self, _index: usize) -> T {
        T::zero()
    }

    pub fn ubound(&self, _index: usize) -> T {
        T::infinity()
    }

    /// `x` as a single-column matrix, the dense operand of `A * x`
    fn unknowns(&self) -> DynamicMatrix<T, RowMajor> {
        DynamicMatrix::from_fn(self.size(), 1, |i, _| self.x[i])
    }

    /// `min(x[index], (A*x)[index] + b[index])`
    ///
    /// Only row `index` of the product is computed.
    pub fn residual_at(&self, index: usize) -> Result<T> {
        check_vector_index(index, self.size())?;
        check_same_size(self.a.rows(), self.b.size())?;
        let x = self.unknowns();
        let ax = SMatDMatMult::new(&self.a, &x)?.get(index, 0);
        Ok(self.x[index].min(ax + self.b[index]))
    }

    /// Maximum norm of the residual over all unknowns
    pub fn residual(&self) -> Result<T> {
        let x = self.unknowns();
        let mut ax = DynamicMatrix::<T, RowMajor>::new(0, 0);
        ax.assign(&SMatDMatMult::new(&self.a, &x)?)?;
        check_same_size(ax.rows(), self.b.size())?;

        let max = (0..self.size()).fold(T::zero(), |max, i| {
            let r = self.x[i].min(ax[(i, 0)] + self.b[i]);
            max.max(r.abs())
        });
        trace!(size = self.size(), "lcp residual");
        Ok(max)
    }
}
