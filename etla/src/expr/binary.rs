//! Elementwise binary nodes
//!
//! [`MatMatMap2`] and [`VecVecMap2`] combine two operands of equal shape
//! element by element. Assignment splits the node into one pass per
//! operand whenever an operand is sparse or has to be materialized, so
//! each side is written through its own strategy.

use std::cmp::Ordering;
use std::ops::Range;

use etla_core::simd::Pack;
use etla_core::{
    check_same_shape, check_same_size, structure, Address, DenseMatrix, DenseMatrixMut,
    DenseVector, DenseVectorMut, Density, Element, Expression, KernelConfig, Matrix, NodeKind,
    Result, SparseMatrix, SparseVector, Structure, Vector,
};

use crate::assign::{self, CombineMode, Evaluate, MatrixAssign, VectorAssign};
use crate::storage::{DynamicMatrix, DynamicVector};

/// Operation combining two elements
pub trait BinaryOp: Copy + Default + Send + Sync {
    const KIND: NodeKind;
    /// A result element is structurally zero unless both operands are non-zero
    const INTERSECTS: bool = false;

    fn apply<T: Element>(self, lhs: T, rhs: T) -> T;

    fn structure(lhs: Structure, rhs: Structure) -> Structure;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Minus;

/// Schur product for matrices, componentwise product for vectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Times;

impl BinaryOp for Plus {
    const KIND: NodeKind = NodeKind::Sum;

    #[inline]
    fn apply<T: Element>(self, lhs: T, rhs: T) -> T {
        lhs + rhs
    }

    fn structure(lhs: Structure, rhs: Structure) -> Structure {
        structure::sum(lhs, rhs)
    }
}

impl BinaryOp for Minus {
    const KIND: NodeKind = NodeKind::Difference;

    #[inline]
    fn apply<T: Element>(self, lhs: T, rhs: T) -> T {
        lhs - rhs
    }

    fn structure(lhs: Structure, rhs: Structure) -> Structure {
        structure::difference(lhs, rhs)
    }
}

impl BinaryOp for Times {
    const KIND: NodeKind = NodeKind::SchurProduct;
    const INTERSECTS: bool = true;

    #[inline]
    fn apply<T: Element>(self, lhs: T, rhs: T) -> T {
        lhs * rhs
    }

    fn structure(lhs: Structure, rhs: Structure) -> Structure {
        structure::schur(lhs, rhs)
    }
}

/// Per-operand modes when a node is assigned one operand at a time
fn split_modes<Op: BinaryOp>(mode: CombineMode) -> Option<(CombineMode, CombineMode)> {
    match (Op::KIND, mode) {
        (NodeKind::Sum, CombineMode::Assign | CombineMode::Add | CombineMode::Sub) => {
            Some((mode, mode.adding()))
        }
        (NodeKind::Difference, CombineMode::Assign | CombineMode::Add | CombineMode::Sub) => {
            Some((mode, mode.subtracting()))
        }
        (NodeKind::SchurProduct, CombineMode::Assign) => Some((CombineMode::Assign, CombineMode::Schur)),
        (NodeKind::SchurProduct, CombineMode::Schur) => Some((mode, mode)),
        _ => None,
    }
}

const fn density(lhs: Density, rhs: Density) -> Density {
    match (lhs, rhs) {
        (Density::Sparse, Density::Sparse) => Density::Sparse,
        _ => Density::Dense,
    }
}

/// Union (or intersection for [`BinaryOp::INTERSECTS`]) of two ascending non-zero sequences
#[derive(Debug, Clone)]
pub struct Merge<I, J, T, Op> {
    lhs: I,
    rhs: J,
    next_lhs: Option<(usize, T)>,
    next_rhs: Option<(usize, T)>,
    op: Op,
}

impl<T: Element, I: Iterator<Item = (usize, T)>, J: Iterator<Item = (usize, T)>, Op: BinaryOp> Merge<I, J, T, Op> {
    fn new(mut lhs: I, mut rhs: J, op: Op) -> Self {
        let next_lhs = lhs.next();
        let next_rhs = rhs.next();
        Self {
            lhs,
            rhs,
            next_lhs,
            next_rhs,
            op,
        }
    }
}

impl<T, I, J, Op> Iterator for Merge<I, J, T, Op>
where
    T: Element,
    I: Iterator<Item = (usize, T)>,
    J: Iterator<Item = (usize, T)>,
    Op: BinaryOp,
{
    type Item = (usize, T);

    fn next(&mut self) -> Option<(usize, T)> {
        loop {
            let (index, lhs, rhs) = match (self.next_lhs, self.next_rhs) {
                (None, None) => return None,
                (Some((i, a)), None) => (i, Some(a), None),
                (None, Some((j, b))) => (j, None, Some(b)),
                (Some((i, a)), Some((j, b))) => match i.cmp(&j) {
                    Ordering::Less => (i, Some(a), None),
                    Ordering::Greater => (j, None, Some(b)),
                    Ordering::Equal => (i, Some(a), Some(b)),
                },
            };
            if lhs.is_some() {
                self.next_lhs = self.lhs.next();
            }
            if rhs.is_some() {
                self.next_rhs = self.rhs.next();
            }
            if Op::INTERSECTS && (lhs.is_none() || rhs.is_none()) {
                continue;
            }
            let value = self
                .op
                .apply(lhs.unwrap_or_else(T::zero), rhs.unwrap_or_else(T::zero));
            return Some((index, value));
        }
    }
}

/// Elementwise combination of two matrices of equal shape
#[derive(Debug, Clone, Copy)]
pub struct MatMatMap2<L, R, Op> {
    lhs: L,
    rhs: R,
    op: Op,
}

impl<T, L, R, Op> MatMatMap2<L, R, Op>
where
    T: Element,
    L: Matrix<Element = T>,
    R: Matrix<Element = T>,
    Op: BinaryOp,
{
    pub fn new(lhs: L, rhs: R) -> Result<Self> {
        check_same_shape((lhs.rows(), lhs.columns()), (rhs.rows(), rhs.columns()))?;
        Ok(Self {
            lhs,
            rhs,
            op: Op::default(),
        })
    }

    pub fn lhs(&self) -> &L {
        &self.lhs
    }

    pub fn rhs(&self) -> &R {
        &self.rhs
    }

    /// Whether assignment goes through the operands one at a time
    fn splits() -> bool {
        L::IS_COMPUTATION
            || R::IS_COMPUTATION
            || L::REQUIRES_EVALUATION
            || R::REQUIRES_EVALUATION
            || L::DENSITY == Density::Sparse
            || R::DENSITY == Density::Sparse
    }
}

impl<T, L, R, Op> Expression for MatMatMap2<L, R, Op>
where
    T: Element,
    L: Matrix<Element = T>,
    R: Matrix<Element = T>,
    Op: BinaryOp,
{
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = true;
    const REQUIRES_EVALUATION: bool = L::REQUIRES_EVALUATION || R::REQUIRES_EVALUATION;
    const SIMD_ENABLED: bool = L::SIMD_ENABLED && R::SIMD_ENABLED;
    const SMP_ASSIGNABLE: bool = L::SMP_ASSIGNABLE && R::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        self.lhs.can_alias(alias) || self.rhs.can_alias(alias)
    }

    fn is_aliased(&self, alias: Address) -> bool {
        self.lhs.is_aliased(alias) || self.rhs.is_aliased(alias)
    }

    fn is_aligned(&self) -> bool {
        self.lhs.is_aligned() && self.rhs.is_aligned()
    }

    fn can_smp_assign(&self) -> bool {
        self.lhs.can_smp_assign() || self.rhs.can_smp_assign()
    }
}

impl<T, L, R, Op> Matrix for MatMatMap2<L, R, Op>
where
    T: Element,
    L: Matrix<Element = T>,
    R: Matrix<Element = T>,
    Op: BinaryOp,
{
    type Element = T;
    type Order = L::Order;

    const DENSITY: Density = density(L::DENSITY, R::DENSITY);

    fn rows(&self) -> usize {
        self.lhs.rows()
    }

    fn columns(&self) -> usize {
        self.lhs.columns()
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> T {
        self.op.apply(self.lhs.get(i, j), self.rhs.get(i, j))
    }

    fn structure(&self) -> Structure {
        Op::structure(self.lhs.structure(), self.rhs.structure())
    }
}

impl<T, L, R, Op> DenseMatrix for MatMatMap2<L, R, Op>
where
    T: Element,
    L: DenseMatrix<Element = T>,
    R: DenseMatrix<Element = T, Order = L::Order>,
    Op: BinaryOp,
{
    fn load(&self, i: usize, j: usize) -> Pack<T> {
        let (lhs, rhs) = (self.lhs.load(i, j), self.rhs.load(i, j));
        std::array::from_fn(|k| self.op.apply(lhs[k], rhs[k]))
    }
}

impl<T, L, R, Op> SparseMatrix for MatMatMap2<L, R, Op>
where
    T: Element,
    L: SparseMatrix<Element = T>,
    R: SparseMatrix<Element = T, Order = L::Order>,
    Op: BinaryOp,
{
    type MajorIter<'a> = Merge<L::MajorIter<'a>, R::MajorIter<'a>, T, Op> where Self: 'a;

    fn major(&self, i: usize) -> Self::MajorIter<'_> {
        Merge::new(self.lhs.major(i), self.rhs.major(i), self.op)
    }
}

impl<T, L, R, Op> MatrixAssign for MatMatMap2<L, R, Op>
where
    T: Element,
    L: MatrixAssign<Element = T>,
    R: MatrixAssign<Element = T>,
    Op: BinaryOp,
{
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = T>,
    {
        match split_modes::<Op>(mode) {
            Some((lhs_mode, rhs_mode)) if Self::splits() => {
                self.lhs.assign_to(target, lhs_mode, config);
                self.rhs.assign_to(target, rhs_mode, config);
            }
            _ if Self::REQUIRES_EVALUATION => {
                let evaluated = DynamicMatrix::<T, L::Order>::evaluated(self, config);
                evaluated.assign_to(target, mode, config);
            }
            _ => assign::assign_elementwise(self, target, mode),
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
        match split_modes::<Op>(mode) {
            Some((lhs_mode, rhs_mode)) if Self::splits() => {
                self.lhs
                    .assign_block_to(target, rows.clone(), columns.clone(), lhs_mode, config);
                self.rhs.assign_block_to(target, rows, columns, rhs_mode, config);
            }
            _ => {
                for i in 0..rows.len() {
                    for j in 0..columns.len() {
                        mode.apply(target.get_mut(i, j), self.get(rows.start + i, columns.start + j));
                    }
                }
            }
        }
    }
}

impl<T, L, R, Op> Evaluate for MatMatMap2<L, R, Op>
where
    T: Element,
    L: MatrixAssign<Element = T>,
    R: MatrixAssign<Element = T>,
    Op: BinaryOp,
{
    type Output = DynamicMatrix<T, L::Order>;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output {
        DynamicMatrix::evaluated(self, config)
    }
}

/// Elementwise combination of two vectors of equal size and orientation
#[derive(Debug, Clone, Copy)]
pub struct VecVecMap2<L, R, Op> {
    lhs: L,
    rhs: R,
    op: Op,
}

impl<T, L, R, Op> VecVecMap2<L, R, Op>
where
    T: Element,
    L: Vector<Element = T>,
    R: Vector<Element = T, Transpose = L::Transpose>,
    Op: BinaryOp,
{
    pub fn new(lhs: L, rhs: R) -> Result<Self> {
        check_same_size(lhs.size(), rhs.size())?;
        Ok(Self {
            lhs,
            rhs,
            op: Op::default(),
        })
    }

    fn splits() -> bool {
        L::IS_COMPUTATION
            || R::IS_COMPUTATION
            || L::REQUIRES_EVALUATION
            || R::REQUIRES_EVALUATION
            || L::DENSITY == Density::Sparse
            || R::DENSITY == Density::Sparse
    }
}

impl<T, L, R, Op> Expression for VecVecMap2<L, R, Op>
where
    T: Element,
    L: Vector<Element = T>,
    R: Vector<Element = T, Transpose = L::Transpose>,
    Op: BinaryOp,
{
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = true;
    const REQUIRES_EVALUATION: bool = L::REQUIRES_EVALUATION || R::REQUIRES_EVALUATION;
    const SIMD_ENABLED: bool = L::SIMD_ENABLED && R::SIMD_ENABLED;
    const SMP_ASSIGNABLE: bool = L::SMP_ASSIGNABLE && R::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        self.lhs.can_alias(alias) || self.rhs.can_alias(alias)
    }

    fn is_aliased(&self, alias: Address) -> bool {
        self.lhs.is_aliased(alias) || self.rhs.is_aliased(alias)
    }

    fn is_aligned(&self) -> bool {
        self.lhs.is_aligned() && self.rhs.is_aligned()
    }

    fn can_smp_assign(&self) -> bool {
        self.lhs.can_smp_assign() || self.rhs.can_smp_assign()
    }
}

impl<T, L, R, Op> Vector for VecVecMap2<L, R, Op>
where
    T: Element,
    L: Vector<Element = T>,
    R: Vector<Element = T, Transpose = L::Transpose>,
    Op: BinaryOp,
{
    type Element = T;
    type Transpose = L::Transpose;

    const DENSITY: Density = density(L::DENSITY, R::DENSITY);

    fn size(&self) -> usize {
        self.lhs.size()
    }

    #[inline]
    fn get(&self, i: usize) -> T {
        self.op.apply(self.lhs.get(i), self.rhs.get(i))
    }
}

/// Pairwise combination of two dense element sequences
#[derive(Debug, Clone)]
pub struct Zip2<I, J, Op> {
    lhs: I,
    rhs: J,
    op: Op,
}

impl<T: Element, I: Iterator<Item = T>, J: Iterator<Item = T>, Op: BinaryOp> Iterator for Zip2<I, J, Op> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        Some(self.op.apply(self.lhs.next()?, self.rhs.next()?))
    }
}

impl<T, L, R, Op> DenseVector for VecVecMap2<L, R, Op>
where
    T: Element,
    L: DenseVector<Element = T>,
    R: DenseVector<Element = T, Transpose = L::Transpose>,
    Op: BinaryOp,
{
    type Iter<'a> = Zip2<L::Iter<'a>, R::Iter<'a>, Op> where Self: 'a;

    fn iter(&self) -> Self::Iter<'_> {
        Zip2 {
            lhs: self.lhs.iter(),
            rhs: self.rhs.iter(),
            op: self.op,
        }
    }

    fn load(&self, i: usize) -> Pack<T> {
        let (lhs, rhs) = (self.lhs.load(i), self.rhs.load(i));
        std::array::from_fn(|k| self.op.apply(lhs[k], rhs[k]))
    }
}

impl<T, L, R, Op> SparseVector for VecVecMap2<L, R, Op>
where
    T: Element,
    L: SparseVector<Element = T>,
    R: SparseVector<Element = T, Transpose = L::Transpose>,
    Op: BinaryOp,
{
    type NonZeroIter<'a> = Merge<L::NonZeroIter<'a>, R::NonZeroIter<'a>, T, Op> where Self: 'a;

    fn non_zero_iter(&self) -> Self::NonZeroIter<'_> {
        Merge::new(self.lhs.non_zero_iter(), self.rhs.non_zero_iter(), self.op)
    }
}

impl<T, L, R, Op> VectorAssign for VecVecMap2<L, R, Op>
where
    T: Element,
    L: VectorAssign<Element = T>,
    R: VectorAssign<Element = T, Transpose = L::Transpose>,
    Op: BinaryOp,
{
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode)
    where
        C: DenseVectorMut<Element = T>,
    {
        // componentwise products use the vector form of the Schur mode
        let split = match (Op::KIND, mode) {
            (NodeKind::SchurProduct, CombineMode::Assign) => Some((CombineMode::Assign, CombineMode::Mult)),
            (NodeKind::SchurProduct, CombineMode::Mult) => Some((mode, mode)),
            (NodeKind::SchurProduct, _) => None,
            _ => split_modes::<Op>(mode),
        };
        match split {
            Some((lhs_mode, rhs_mode)) if Self::splits() => {
                self.lhs.assign_to(target, lhs_mode);
                self.rhs.assign_to(target, rhs_mode);
            }
            _ if Self::REQUIRES_EVALUATION => {
                let evaluated = DynamicVector::<T, L::Transpose>::evaluated(self);
                evaluated.assign_to(target, mode);
            }
            _ => {
                for i in 0..self.size() {
                    mode.apply(target.get_mut(i), self.get(i));
                }
            }
        }
    }
}

impl<T, L, R, Op> Evaluate for VecVecMap2<L, R, Op>
where
    T: Element,
    L: VectorAssign<Element = T>,
    R: VectorAssign<Element = T, Transpose = L::Transpose>,
    Op: BinaryOp,
{
    type Output = DynamicVector<T, L::Transpose>;

    fn evaluate_with(&self, _config: &KernelConfig) -> Self::Output {
        DynamicVector::evaluated(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CompressedMatrix, CompressedVector};
    use etla_core::{ColumnMajor, EtlaError, RowMajor};

    #[test]
    fn test_shape_checked_construction() {
        let a = DynamicMatrix::<f64, RowMajor>::new(2, 3);
        let b = DynamicMatrix::<f64, RowMajor>::new(3, 2);
        let err = MatMatMap2::<_, _, Plus>::new(&a, &b).unwrap_err();
        assert_eq!(
            err,
            EtlaError::ShapeMismatch {
                expected: (2, 3),
                found: (3, 2)
            }
        );
    }

    #[test]
    fn test_dense_sparse_sum_and_difference() {
        let a = DynamicMatrix::<f64, RowMajor>::from_fn(2, 2, |i, j| (i * 2 + j) as f64);
        let s = CompressedMatrix::<f64, ColumnMajor>::from_triplets(2, 2, &[(1, 0, 10.0)]).unwrap();

        let sum = MatMatMap2::<_, _, Plus>::new(&a, &s).unwrap();
        let mut c = DynamicMatrix::<f64, RowMajor>::new(2, 2);
        c.assign(&sum).unwrap();
        assert_eq!(c.as_slice(), &[0.0, 1.0, 12.0, 3.0]);

        let diff = MatMatMap2::<_, _, Minus>::new(&s, &a).unwrap();
        c.sub_assign(&diff).unwrap();
        assert_eq!(c.as_slice(), &[0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_sparse_merge() {
        let a = CompressedMatrix::<i32, RowMajor>::from_triplets(2, 3, &[(0, 0, 1), (0, 2, 2), (1, 1, 3)]).unwrap();
        let b = CompressedMatrix::<i32, RowMajor>::from_triplets(2, 3, &[(0, 2, 5), (1, 0, 4)]).unwrap();
        let sum = MatMatMap2::<_, _, Plus>::new(&a, &b).unwrap();
        assert_eq!(sum.major(0).collect::<Vec<_>>(), vec![(0, 1), (2, 7)]);
        assert_eq!(sum.major(1).collect::<Vec<_>>(), vec![(0, 4), (1, 3)]);
        let diff = MatMatMap2::<_, _, Minus>::new(&a, &b).unwrap();
        assert_eq!(diff.major(1).collect::<Vec<_>>(), vec![(0, -4), (1, 3)]);
        let schur = MatMatMap2::<_, _, Times>::new(&a, &b).unwrap();
        assert_eq!(schur.major(0).collect::<Vec<_>>(), vec![(2, 10)]);
        assert_eq!(schur.non_zeros(), 1);
    }

    #[test]
    fn test_schur_assignment_modes() {
        let a = DynamicMatrix::<i64, RowMajor>::from_fn(2, 2, |i, j| (i + j + 1) as i64);
        let s = CompressedMatrix::<i64, RowMajor>::from_triplets(2, 2, &[(0, 0, 2), (1, 1, 3)])
            .unwrap()
            .with_structure(Structure::DIAGONAL)
            .unwrap();
        let schur = MatMatMap2::<_, _, Times>::new(&a, &s).unwrap();
        let mut c = DynamicMatrix::<i64, ColumnMajor>::new(2, 2);
        c.assign(&schur).unwrap();
        assert_eq!(c.get(0, 0), 2);
        assert_eq!(c.get(0, 1), 0);
        assert_eq!(c.get(1, 1), 9);
        c.schur_assign(&schur).unwrap();
        assert_eq!(c.get(0, 0), 4);
        assert_eq!(c.get(1, 1), 81);
        assert!(schur.structure().is_diagonal());
    }

    #[test]
    fn test_vector_maps() {
        let a = DynamicVector::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = DynamicVector::<f64>::from_vec(vec![5.0, 4.0, 3.0, 2.0, 1.0]);
        let product = VecVecMap2::<_, _, Times>::new(&a, &b).unwrap();
        assert_eq!(product.iter().collect::<Vec<_>>(), vec![5.0, 8.0, 9.0, 8.0, 5.0]);
        assert_eq!(product.load(1), [8.0, 9.0, 8.0, 5.0]);

        let s = CompressedVector::<f64>::from_pairs(5, &[(1, 1.0), (4, 2.0)]).unwrap();
        let mut out = DynamicVector::<f64>::new(5);
        out.assign(&VecVecMap2::<_, _, Times>::new(&a, &s).unwrap()).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 2.0, 0.0, 0.0, 10.0]);
        out.assign(&VecVecMap2::<_, _, Minus>::new(&s, &b).unwrap()).unwrap();
        assert_eq!(out.as_slice(), &[-5.0, -3.0, -3.0, -2.0, 1.0]);

        let short = DynamicVector::<f64>::new(2);
        assert!(VecVecMap2::<_, _, Plus>::new(&a, &short).is_err());
    }
}
