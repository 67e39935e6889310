//! Scalar multiplication and division nodes

use std::ops::Range;

use etla_core::resolve::scalar_division_node;
use etla_core::simd::Pack;
use etla_core::{
    structure, Address, DenseMatrix, DenseMatrixMut, DenseVector, DenseVectorMut, Density,
    Element, Expression, KernelConfig, Matrix, NodeKind, SparseMatrix, SparseVector, Structure,
    Vector,
};

use crate::assign::{CombineMode, Evaluate, MatrixAssign, VectorAssign};
use crate::storage::{DynamicMatrix, DynamicVector};

/// How the scalar is applied to each element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarOp {
    Mult,
    Div,
}

impl ScalarOp {
    /// Operation for `operand / scalar`: floating point elements multiply by the reciprocal
    fn division<T: Element>(scalar: T) -> (ScalarOp, T) {
        match scalar_division_node(T::KIND) {
            NodeKind::ScalarMult => (ScalarOp::Mult, T::one() / scalar),
            _ => (ScalarOp::Div, scalar),
        }
    }

    #[inline]
    fn apply<T: Element>(self, value: T, scalar: T) -> T {
        match self {
            ScalarOp::Mult => value * scalar,
            ScalarOp::Div => value / scalar,
        }
    }

    fn combine_mode(self) -> CombineMode {
        match self {
            ScalarOp::Mult => CombineMode::Mult,
            ScalarOp::Div => CombineMode::Div,
        }
    }
}

/// Iterator over scaled elements
#[derive(Debug, Clone)]
pub struct ScaledValues<I, T> {
    inner: I,
    scalar: T,
    op: ScalarOp,
}

impl<T: Element, I: Iterator<Item = T>> Iterator for ScaledValues<I, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|value| self.op.apply(value, self.scalar))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over scaled `(index, value)` non-zeros
#[derive(Debug, Clone)]
pub struct ScaledPairs<I, T> {
    inner: I,
    scalar: T,
    op: ScalarOp,
}

impl<T: Element, I: Iterator<Item = (usize, T)>> Iterator for ScaledPairs<I, T> {
    type Item = (usize, T);

    fn next(&mut self) -> Option<(usize, T)> {
        self.inner
            .next()
            .map(|(index, value)| (index, self.op.apply(value, self.scalar)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// `operand * scalar` or `operand / scalar` for a matrix operand
#[derive(Debug, Clone, Copy)]
pub struct MatScalar<M, T> {
    operand: M,
    scalar: T,
    op: ScalarOp,
}

impl<T: Element, M: Matrix<Element = T>> MatScalar<M, T> {
    pub fn mult(operand: M, scalar: T) -> Self {
        Self {
            operand,
            scalar,
            op: ScalarOp::Mult,
        }
    }

    pub fn div(operand: M, scalar: T) -> Self {
        let (op, scalar) = ScalarOp::division(scalar);
        Self { operand, scalar, op }
    }

    pub fn operand(&self) -> &M {
        &self.operand
    }

    pub fn scalar(&self) -> T {
        self.scalar
    }

    pub fn op(&self) -> ScalarOp {
        self.op
    }

    pub(crate) fn into_parts(self) -> (M, T, ScalarOp) {
        (self.operand, self.scalar, self.op)
    }

    pub(crate) fn from_parts(operand: M, scalar: T, op: ScalarOp) -> Self {
        Self { operand, scalar, op }
    }

    fn scale_in_place<C: DenseMatrixMut<Element = T>>(&self, target: &mut C, rows: usize, columns: usize) {
        let mode = self.op.combine_mode();
        if let Some(out) = target.data_mut() {
            for slot in out.iter_mut() {
                mode.apply(slot, self.scalar);
            }
            return;
        }
        for i in 0..rows {
            for j in 0..columns {
                mode.apply(target.get_mut(i, j), self.scalar);
            }
        }
    }
}

impl<T: Element, M: Matrix<Element = T>> Expression for MatScalar<M, T> {
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = true;
    const REQUIRES_EVALUATION: bool = M::REQUIRES_EVALUATION;
    const SIMD_ENABLED: bool = M::SIMD_ENABLED;
    const SMP_ASSIGNABLE: bool = M::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        self.operand.can_alias(alias)
    }

    fn is_aliased(&self, alias: Address) -> bool {
        self.operand.is_aliased(alias)
    }

    fn is_aligned(&self) -> bool {
        self.operand.is_aligned()
    }

    fn can_smp_assign(&self) -> bool {
        self.operand.can_smp_assign()
    }
}

impl<T: Element, M: Matrix<Element = T>> Matrix for MatScalar<M, T> {
    type Element = T;
    type Order = M::Order;

    const DENSITY: Density = M::DENSITY;

    fn rows(&self) -> usize {
        self.operand.rows()
    }

    fn columns(&self) -> usize {
        self.operand.columns()
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> T {
        self.op.apply(self.operand.get(i, j), self.scalar)
    }

    fn structure(&self) -> Structure {
        structure::scaled(self.operand.structure(), T::IS_BUILTIN)
    }
}

impl<T: Element, M: DenseMatrix<Element = T>> DenseMatrix for MatScalar<M, T> {
    fn load(&self, i: usize, j: usize) -> Pack<T> {
        self.operand.load(i, j).map(|value| self.op.apply(value, self.scalar))
    }
}

impl<T: Element, M: SparseMatrix<Element = T>> SparseMatrix for MatScalar<M, T> {
    type MajorIter<'a> = ScaledPairs<M::MajorIter<'a>, T> where Self: 'a;

    fn major(&self, i: usize) -> Self::MajorIter<'_> {
        ScaledPairs {
            inner: self.operand.major(i),
            scalar: self.scalar,
            op: self.op,
        }
    }

    fn major_non_zeros(&self, i: usize) -> usize {
        self.operand.major_non_zeros(i)
    }
}

impl<T: Element, M: MatrixAssign<Element = T>> MatrixAssign for MatScalar<M, T> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = T>,
    {
        if mode == CombineMode::Assign {
            self.operand.assign_to(target, CombineMode::Assign, config);
            self.scale_in_place(target, self.rows(), self.columns());
        } else if M::REQUIRES_EVALUATION || M::DENSITY == Density::Sparse {
            let evaluated = DynamicMatrix::<T, M::Order>::evaluated(self, config);
            evaluated.assign_to(target, mode, config);
        } else {
            crate::assign::assign_elementwise(self, target, mode);
        }
    }

    fn assign_block_to<C>(
        &self,
        target: &mut C,
        rows: Range<usize>,
        columns: Range<usize>,
        mode: CombineMode,
        config: &KernelConfig,
    ) where
        C: DenseMatrixMut<Element = T>,
    {
        let (height, width) = (rows.len(), columns.len());
        if mode == CombineMode::Assign {
            self.operand.assign_block_to(target, rows, columns, CombineMode::Assign, config);
            self.scale_in_place(target, height, width);
        } else {
            let mut block = DynamicMatrix::<T, C::Order>::new(height, width);
            self.assign_block_to(&mut block, rows, columns, CombineMode::Assign, config);
            block.assign_to(target, mode, config);
        }
    }
}

impl<T: Element, M: MatrixAssign<Element = T>> Evaluate for MatScalar<M, T> {
    type Output = DynamicMatrix<T, M::Order>;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output {
        DynamicMatrix::evaluated(self, config)
    }
}

/// `operand * scalar` or `operand / scalar` for a vector operand
#[derive(Debug, Clone, Copy)]
pub struct VecScalar<V, T> {
    operand: V,
    scalar: T,
    op: ScalarOp,
}

impl<T: Element, V: Vector<Element = T>> VecScalar<V, T> {
    pub fn mult(operand: V, scalar: T) -> Self {
        Self {
            operand,
            scalar,
            op: ScalarOp::Mult,
        }
    }

    pub fn div(operand: V, scalar: T) -> Self {
        let (op, scalar) = ScalarOp::division(scalar);
        Self { operand, scalar, op }
    }

    pub fn op(&self) -> ScalarOp {
        self.op
    }
}

impl<T: Element, V: Vector<Element = T>> Expression for VecScalar<V, T> {
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = true;
    const REQUIRES_EVALUATION: bool = V::REQUIRES_EVALUATION;
    const SIMD_ENABLED: bool = V::SIMD_ENABLED;
    const SMP_ASSIGNABLE: bool = V::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        self.operand.can_alias(alias)
    }

    fn is_aliased(&self, alias: Address) -> bool {
        self.operand.is_aliased(alias)
    }

    fn is_aligned(&self) -> bool {
        self.operand.is_aligned()
    }

    fn can_smp_assign(&self) -> bool {
        self.operand.can_smp_assign()
    }
}

impl<T: Element, V: Vector<Element = T>> Vector for VecScalar<V, T> {
    type Element = T;
    type Transpose = V::Transpose;

    const DENSITY: Density = V::DENSITY;

    fn size(&self) -> usize {
        self.operand.size()
    }

    #[inline]
    fn get(&self, i: usize) -> T {
        self.op.apply(self.operand.get(i), self.scalar)
    }
}

impl<T: Element, V: DenseVector<Element = T>> DenseVector for VecScalar<V, T> {
    type Iter<'a> = ScaledValues<V::Iter<'a>, T> where Self: 'a;

    fn iter(&self) -> Self::Iter<'_> {
        ScaledValues {
            inner: self.operand.iter(),
            scalar: self.scalar,
            op: self.op,
        }
    }

    fn load(&self, i: usize) -> Pack<T> {
        self.operand.load(i).map(|value| self.op.apply(value, self.scalar))
    }
}

impl<T: Element, V: SparseVector<Element = T>> SparseVector for VecScalar<V, T> {
    type NonZeroIter<'a> = ScaledPairs<V::NonZeroIter<'a>, T> where Self: 'a;

    fn non_zero_iter(&self) -> Self::NonZeroIter<'_> {
        ScaledPairs {
            inner: self.operand.non_zero_iter(),
            scalar: self.scalar,
            op: self.op,
        }
    }

    fn non_zeros(&self) -> usize {
        self.operand.non_zeros()
    }
}

impl<T: Element, V: VectorAssign<Element = T>> VectorAssign for VecScalar<V, T> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode)
    where
        C: DenseVectorMut<Element = T>,
    {
        if mode == CombineMode::Assign {
            self.operand.assign_to(target, CombineMode::Assign);
            let scale = self.op.combine_mode();
            for i in 0..self.size() {
                scale.apply(target.get_mut(i), self.scalar);
            }
        } else if V::REQUIRES_EVALUATION || V::DENSITY == Density::Sparse {
            let evaluated = DynamicVector::<T, V::Transpose>::evaluated(self);
            evaluated.assign_to(target, mode);
        } else {
            for i in 0..self.size() {
                mode.apply(target.get_mut(i), self.get(i));
            }
        }
    }
}

impl<T: Element, V: VectorAssign<Element = T>> Evaluate for VecScalar<V, T> {
    type Output = DynamicVector<T, V::Transpose>;

    fn evaluate_with(&self, _config: &KernelConfig) -> Self::Output {
        DynamicVector::evaluated(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CompressedMatrix, CompressedVector};
    use etla_core::{ColumnMajor, RowMajor};

    #[test]
    fn test_division_by_reciprocal() {
        let a = DynamicMatrix::<f64, RowMajor>::from_fn(2, 2, |i, j| (i + j) as f64);
        let halved = MatScalar::div(&a, 2.0);
        assert_eq!(halved.op(), ScalarOp::Mult);
        assert_eq!(halved.scalar(), 0.5);
        assert_eq!(halved.get(1, 1), 1.0);

        let b = DynamicMatrix::<i32, RowMajor>::from_fn(2, 2, |i, j| (i + j) as i32 * 3);
        let thirds = MatScalar::div(&b, 3);
        assert_eq!(thirds.op(), ScalarOp::Div);
        assert_eq!(thirds.evaluate().as_slice(), &[0, 1, 1, 2]);
    }

    #[test]
    fn test_scaled_structure() {
        let lower = DynamicMatrix::<f64, RowMajor>::from_row_slice(2, 2, &[1.0, 0.0, 2.0, 1.0])
            .unwrap()
            .with_structure(Structure::UNI_LOWER)
            .unwrap();
        let scaled = MatScalar::mult(&lower, 3.0);
        assert!(scaled.structure().is_lower());
        assert!(!scaled.structure().is_uni_lower());
    }

    #[test]
    fn test_sparse_operand_modes() {
        let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(2, 2, &[(0, 1, 2.0), (1, 0, 4.0)]).unwrap();
        let scaled = MatScalar::mult(&a, 2.0);
        assert_eq!(scaled.major(0).collect::<Vec<_>>(), vec![(1, 8.0)]);

        let mut c = DynamicMatrix::<f64, RowMajor>::from_fn(2, 2, |_, _| 1.0);
        c.add_assign(&scaled).unwrap();
        assert_eq!(c.as_slice(), &[1.0, 5.0, 9.0, 1.0]);
        c.assign(&scaled).unwrap();
        assert_eq!(c.as_slice(), &[0.0, 4.0, 8.0, 0.0]);
    }

    #[test]
    fn test_vector_scaling() {
        let v = DynamicVector::<f64>::from_vec(vec![2.0, 4.0]);
        let mut out = DynamicVector::<f64>::from_vec(vec![1.0, 1.0]);
        out.add_assign(&VecScalar::div(&v, 4.0)).unwrap();
        assert_eq!(out.as_slice(), &[1.5, 2.0]);

        let s = CompressedVector::<i64>::from_pairs(3, &[(2, 6)]).unwrap();
        let scaled = VecScalar::mult(&s, -1);
        assert_eq!(scaled.non_zero_iter().collect::<Vec<_>>(), vec![(2, -6)]);
        assert_eq!(scaled.evaluate().as_slice(), &[0, 0, -6]);
    }
}
