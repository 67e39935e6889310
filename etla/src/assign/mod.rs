//! Assignment of expressions into containers
//!
//! Every matrix operand implements [`MatrixAssign`] and every vector
//! operand [`VectorAssign`]. The default implementations walk the operand
//! element by element; sparse containers, products and binary nodes
//! override them with their own strategy. The front doors in this module
//! validate shapes before anything is written.

pub mod kernels;
pub mod plan;
pub mod smp;

use std::ops::Range;

use etla_core::simd::LANES;
use etla_core::{
    check_multipliable, check_same_shape, check_same_size, DenseMatrixMut, DenseVector,
    DenseVectorMut, Element, EtlaError, KernelConfig, Matrix, Result, SparseMatrix, SparseVector,
    StorageOrder, Vector,
};
use tracing::instrument;

use crate::storage::DynamicMatrix;

/// How a computed value is combined with the target element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombineMode {
    Assign,
    Add,
    Sub,
    Schur,
    /// Matrix targets: `C = C * E`; vector targets: componentwise
    Mult,
    /// Vector targets only: componentwise division
    Div,
}

impl CombineMode {
    #[inline]
    pub fn apply<T: Element>(self, target: &mut T, value: T) {
        match self {
            CombineMode::Assign => *target = value,
            CombineMode::Add => *target += value,
            CombineMode::Sub => *target -= value,
            CombineMode::Schur | CombineMode::Mult => *target *= value,
            CombineMode::Div => *target = *target / value,
        }
    }

    /// Mode for the second operand of a sum
    pub(crate) fn adding(self) -> CombineMode {
        match self {
            CombineMode::Assign => CombineMode::Add,
            other => other,
        }
    }

    /// Mode for the second operand of a difference
    pub(crate) fn subtracting(self) -> CombineMode {
        match self {
            CombineMode::Sub => CombineMode::Add,
            _ => CombineMode::Sub,
        }
    }
}

/// Materialization of an expression into its natural result container
pub trait Evaluate {
    type Output;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output;

    fn evaluate(&self) -> Self::Output {
        self.evaluate_with(crate::config::global())
    }
}

impl<X: Evaluate + ?Sized> Evaluate for &X {
    type Output = X::Output;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output {
        (**self).evaluate_with(config)
    }
}

/// Matrix operands that can be combined into dense targets
pub trait MatrixAssign: Matrix {
    /// Combine the whole operand into a target of the same shape
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = Self::Element>,
    {
        let _ = config;
        assign_elementwise(self, target, mode);
    }

    /// Combine the block `rows x columns` of the operand into a target of the block's shape
    fn assign_block_to<C>(
        &self,
        target: &mut C,
        rows: Range<usize>,
        columns: Range<usize>,
        mode: CombineMode,
        config: &KernelConfig,
    ) where
        C: DenseMatrixMut<Element = Self::Element>,
    {
        let _ = config;
        for i in 0..rows.len() {
            for j in 0..columns.len() {
                mode.apply(target.get_mut(i, j), self.get(rows.start + i, columns.start + j));
            }
        }
    }
}

impl<M: MatrixAssign + ?Sized> MatrixAssign for &M {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = Self::Element>,
    {
        (**self).assign_to(target, mode, config);
    }

    fn assign_block_to<C>(
        &self,
        target: &mut C,
        rows: Range<usize>,
        columns: Range<usize>,
        mode: CombineMode,
        config: &KernelConfig,
    ) where
        C: DenseMatrixMut<Element = Self::Element>,
    {
        (**self).assign_block_to(target, rows, columns, mode, config);
    }
}

/// Vector operands that can be combined into dense targets
pub trait VectorAssign: Vector {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode)
    where
        C: DenseVectorMut<Element = Self::Element>,
    {
        for i in 0..self.size() {
            mode.apply(target.get_mut(i), self.get(i));
        }
    }

    /// Combine elements `offset..offset + target.len()` into a slice
    fn assign_range_to(&self, target: &mut [Self::Element], offset: usize, mode: CombineMode) {
        for (k, slot) in target.iter_mut().enumerate() {
            mode.apply(slot, self.get(offset + k));
        }
    }
}

impl<V: VectorAssign + ?Sized> VectorAssign for &V {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode)
    where
        C: DenseVectorMut<Element = Self::Element>,
    {
        (**self).assign_to(target, mode);
    }

    fn assign_range_to(&self, target: &mut [Self::Element], offset: usize, mode: CombineMode) {
        (**self).assign_range_to(target, offset, mode);
    }
}

/// Element-by-element combination, traversing in the target's storage order
pub(crate) fn assign_elementwise<M, C>(source: &M, target: &mut C, mode: CombineMode)
where
    M: Matrix + ?Sized,
    C: DenseMatrixMut<Element = M::Element>,
{
    if C::Order::IS_ROW_MAJOR {
        for i in 0..source.rows() {
            for j in 0..source.columns() {
                mode.apply(target.get_mut(i, j), source.get(i, j));
            }
        }
    } else {
        for j in 0..source.columns() {
            for i in 0..source.rows() {
                mode.apply(target.get_mut(i, j), source.get(i, j));
            }
        }
    }
}

/// Combination that visits only the non-zeros of a sparse operand where the mode allows it
pub(crate) fn assign_sparse<M, C>(source: &M, target: &mut C, mode: CombineMode)
where
    M: SparseMatrix + ?Sized,
    C: DenseMatrixMut<Element = M::Element>,
{
    match mode {
        CombineMode::Assign | CombineMode::Add | CombineMode::Sub => {
            if mode == CombineMode::Assign {
                target.reset();
            }
            for major in 0..source.major_len() {
                for (minor, value) in source.major(major) {
                    let (i, j) = M::Order::row_column(major, minor);
                    mode.apply(target.get_mut(i, j), value);
                }
            }
        }
        _ => assign_elementwise(source, target, mode),
    }
}

/// Dense vector combination using packed loads when both sides allow it
pub(crate) fn assign_dense_vector<V, C>(source: &V, target: &mut C, mode: CombineMode)
where
    V: DenseVector + ?Sized,
    C: DenseVectorMut<Element = V::Element>,
{
    let size = source.size();
    let mut done = 0;
    if V::SIMD_ENABLED {
        if let Some(out) = target.data_mut() {
            while done + LANES <= size {
                let pack = source.load(done);
                for (slot, value) in out[done..done + LANES].iter_mut().zip(pack) {
                    mode.apply(slot, value);
                }
                done += LANES;
            }
        }
    }
    for i in done..size {
        mode.apply(target.get_mut(i), source.get(i));
    }
}

/// Sparse vector combination; componentwise products zero the gaps
pub(crate) fn assign_sparse_vector<V, C>(source: &V, target: &mut C, mode: CombineMode)
where
    V: SparseVector + ?Sized,
    C: DenseVectorMut<Element = V::Element>,
{
    match mode {
        CombineMode::Assign | CombineMode::Add | CombineMode::Sub => {
            if mode == CombineMode::Assign {
                target.reset();
            }
            for (i, value) in source.non_zero_iter() {
                mode.apply(target.get_mut(i), value);
            }
        }
        CombineMode::Schur | CombineMode::Mult => {
            let mut next = 0;
            for (i, value) in source.non_zero_iter() {
                for k in next..i {
                    *target.get_mut(k) = num_traits::Zero::zero();
                }
                mode.apply(target.get_mut(i), value);
                next = i + 1;
            }
            for k in next..source.size() {
                *target.get_mut(k) = num_traits::Zero::zero();
            }
        }
        CombineMode::Div => {
            for i in 0..source.size() {
                mode.apply(target.get_mut(i), source.get(i));
            }
        }
    }
}

/// Validated matrix assignment into a dense target of fixed shape
#[instrument(level = "trace", skip_all, fields(mode = ?mode, rows = target.rows(), columns = target.columns()))]
pub fn combine<C, E>(target: &mut C, expr: &E, mode: CombineMode, config: &KernelConfig) -> Result<()>
where
    C: DenseMatrixMut,
    E: MatrixAssign<Element = C::Element>,
{
    let shape = (target.rows(), target.columns());
    match mode {
        CombineMode::Assign | CombineMode::Add | CombineMode::Sub | CombineMode::Schur => {
            check_same_shape(shape, (expr.rows(), expr.columns()))?;
            expr.assign_to(target, mode, config);
        }
        CombineMode::Mult => {
            check_multipliable(shape, (expr.rows(), expr.columns()))?;
            check_same_shape(shape, (shape.0, expr.columns()))?;
            let rhs = DynamicMatrix::<C::Element, E::Order>::evaluated(expr, config);
            let product: DynamicMatrix<C::Element, C::Order> = kernels::dense_product(&*target, &rhs);
            product.assign_to(target, CombineMode::Assign, config);
        }
        CombineMode::Div => return Err(EtlaError::UnsupportedOperation),
    }
    Ok(())
}

/// Validated vector assignment into a dense target
#[instrument(level = "trace", skip_all, fields(mode = ?mode, size = target.size()))]
pub fn combine_vector<C, E>(target: &mut C, expr: &E, mode: CombineMode) -> Result<()>
where
    C: DenseVectorMut,
    E: VectorAssign<Element = C::Element, Transpose = C::Transpose>,
{
    check_same_size(target.size(), expr.size())?;
    if mode == CombineMode::Schur {
        expr.assign_to(target, CombineMode::Mult);
    } else {
        expr.assign_to(target, mode);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CompressedMatrix, DynamicVector};
    use etla_core::{ColumnMajor, RowMajor};

    #[test]
    fn test_combine_modes() {
        let mut value = 6.0;
        CombineMode::Add.apply(&mut value, 2.0);
        assert_eq!(value, 8.0);
        CombineMode::Sub.apply(&mut value, 3.0);
        assert_eq!(value, 5.0);
        CombineMode::Schur.apply(&mut value, 2.0);
        assert_eq!(value, 10.0);
        CombineMode::Div.apply(&mut value, 4.0);
        assert_eq!(value, 2.5);
        CombineMode::Assign.apply(&mut value, 1.0);
        assert_eq!(value, 1.0);
    }

    #[test]
    fn test_shape_mismatch_leaves_target_untouched() {
        let source = DynamicMatrix::<f64, RowMajor>::from_fn(2, 3, |i, j| (i + j) as f64);
        let mut target = DynamicMatrix::<f64, RowMajor>::from_fn(3, 2, |_, _| 7.0);
        let err = combine(&mut target, &source, CombineMode::Assign, &KernelConfig::default()).unwrap_err();
        assert_eq!(
            err,
            EtlaError::ShapeMismatch {
                expected: (3, 2),
                found: (2, 3)
            }
        );
        assert!(target.as_slice().iter().all(|&x| x == 7.0));
    }

    #[test]
    fn test_sparse_assign_resets_target() {
        let source = CompressedMatrix::<f64, ColumnMajor>::from_triplets(2, 2, &[(1, 0, 3.0)]).unwrap();
        let mut target = DynamicMatrix::<f64, RowMajor>::from_fn(2, 2, |_, _| 1.0);
        combine(&mut target, &source, CombineMode::Add, &KernelConfig::default()).unwrap();
        assert_eq!(target.as_slice(), &[1.0, 1.0, 4.0, 1.0]);
        combine(&mut target, &source, CombineMode::Assign, &KernelConfig::default()).unwrap();
        assert_eq!(target.as_slice(), &[0.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn test_mult_mode_multiplies_from_the_right() {
        let rhs = DynamicMatrix::<i64, ColumnMajor>::from_row_slice(2, 2, &[0, 1, 1, 0]).unwrap();
        let mut target = DynamicMatrix::<i64, RowMajor>::from_row_slice(2, 2, &[1, 2, 3, 4]).unwrap();
        combine(&mut target, &rhs, CombineMode::Mult, &KernelConfig::default()).unwrap();
        assert_eq!(target.as_slice(), &[2, 1, 4, 3]);

        let wide = DynamicMatrix::<i64, ColumnMajor>::new(2, 3);
        assert!(combine(&mut target, &wide, CombineMode::Mult, &KernelConfig::default()).is_err());
        assert_eq!(
            combine(&mut target, &rhs, CombineMode::Div, &KernelConfig::default()),
            Err(EtlaError::UnsupportedOperation)
        );
    }

    #[test]
    fn test_vector_modes() {
        let source = DynamicVector::<f64>::from_vec(vec![1.0, 2.0, 4.0, 8.0, 16.0]);
        let mut target = DynamicVector::<f64>::from_vec(vec![2.0; 5]);
        combine_vector(&mut target, &source, CombineMode::Mult).unwrap();
        assert_eq!(target.as_slice(), &[2.0, 4.0, 8.0, 16.0, 32.0]);
        combine_vector(&mut target, &source, CombineMode::Div).unwrap();
        assert_eq!(target.as_slice(), &[2.0; 5]);

        let short = DynamicVector::<f64>::new(3);
        assert!(combine_vector(&mut target, &short, CombineMode::Add).is_err());
    }
}
