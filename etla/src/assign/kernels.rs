//! Sparse x dense product kernels
//!
//! All kernels accumulate `A * B` into a dense target. For every non-zero
//! of `A` only a band of result columns can be affected: the structure of
//! `B` and the declared flags of the product restrict it. [`Clip`] computes
//! that band once per non-zero (or once per group of four non-zeros in the
//! unrolled kernel).

use std::ops::Range;

use etla_core::{
    DenseMatrix, DenseMatrixMut, Element, KernelConfig, Matrix, ProductDecl, RowMajor,
    SparseMatrix, StorageOrder, Structure,
};
use tracing::debug;

use crate::assign::plan::{Kernel, MultPlan};
use crate::assign::CombineMode;
use crate::storage::{CompressedMatrix, DynamicMatrix};

/// Column band of the result reached by one non-zero `A(row, k)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clip {
    rhs: Structure,
    /// Skip columns left of the result row (upper triangle only)
    upper_band: bool,
    /// Skip columns right of the result row (lower triangle only)
    lower_band: bool,
}

impl Clip {
    /// Band rules for an assignment kernel
    pub fn assigning(rhs: Structure, decl: ProductDecl) -> Self {
        Self {
            rhs,
            upper_band: decl.sym() || decl.herm() || decl.upp(),
            lower_band: decl.low(),
        }
    }

    /// Band rules for addition and subtraction kernels, which never mirror
    pub fn accumulating(rhs: Structure, decl: ProductDecl) -> Self {
        Self {
            rhs,
            upper_band: decl.upp(),
            lower_band: decl.low(),
        }
    }

    fn for_mode(mode: CombineMode, rhs: Structure, decl: ProductDecl) -> Self {
        if mode == CombineMode::Assign {
            Self::assigning(rhs, decl)
        } else {
            Self::accumulating(rhs, decl)
        }
    }

    /// Columns of `block` reached by non-zeros in rows `first..=last` of inner index `k`
    #[inline]
    pub fn range(&self, first: usize, last: usize, k: usize, block: &Range<usize>) -> Range<usize> {
        let mut begin = block.start;
        if self.rhs.is_upper() {
            begin = begin.max(if self.rhs.is_strictly_upper() { k + 1 } else { k });
        }
        if self.upper_band {
            begin = begin.max(first);
        }

        let mut end = block.end;
        if self.rhs.is_lower() {
            end = end.min(if self.rhs.is_strictly_lower() { k } else { k + 1 });
        }
        if self.lower_band {
            end = end.min(last + 1);
        }
        begin..end.max(begin)
    }
}

#[inline]
fn accumulate<T: Element>(slot: &mut T, value: T, subtract: bool) {
    if subtract {
        *slot -= value;
    } else {
        *slot += value;
    }
}

/// Run the kernel selected by `plan` for `target (mode) a * b`
///
/// `mode` must be `Assign`, `Add` or `Sub`.
pub fn run<T, A, B, C>(a: &A, b: &B, target: &mut C, mode: CombineMode, plan: &MultPlan, config: &KernelConfig)
where
    T: Element,
    A: SparseMatrix<Element = T> + ?Sized,
    B: DenseMatrix<Element = T> + ?Sized,
    C: DenseMatrixMut<Element = T> + ?Sized,
{
    assert!(
        matches!(mode, CombineMode::Assign | CombineMode::Add | CombineMode::Sub),
        "Invalid kernel mode"
    );
    assert_eq!(a.columns(), b.rows(), "Invalid matrix sizes");
    assert_eq!((target.rows(), target.columns()), (a.rows(), b.columns()), "Invalid target size");
    debug_assert_eq!(plan.kernel == Kernel::RowWise, A::Order::IS_ROW_MAJOR);

    if mode == CombineMode::Assign {
        target.reset();
    }
    let clip = Clip::for_mode(mode, b.structure(), plan.decl);
    let subtract = mode == CombineMode::Sub;

    match plan.kernel {
        Kernel::RowWise => row_wise(a, b, target, &clip, subtract),
        Kernel::Default if b.structure().is_diagonal() => diagonal_rhs(a, b, target, &clip, subtract),
        Kernel::Default => column_default(a, b, target, &clip, config.default_block, subtract),
        Kernel::OptimizedSmall => {
            let block = config.small_block(C::Order::IS_ROW_MAJOR);
            column_unrolled(a, b, target, &clip, block, subtract);
        }
        Kernel::OptimizedLarge => {
            debug!(non_zeros = a.non_zeros(), "converting sparse operand to row-major");
            let rows = CompressedMatrix::<T, RowMajor>::from_sparse(a);
            row_wise(&rows, b, target, &clip, subtract);
        }
    }

    if mode == CombineMode::Assign && (plan.decl.sym() || plan.decl.herm()) {
        mirror(target, plan.decl.herm());
    }
}

/// Column-major `A`, diagonal `B`: `C(i1, i) = A(i1, i) * B(i, i)`
fn diagonal_rhs<T, A, B, C>(a: &A, b: &B, c: &mut C, clip: &Clip, subtract: bool)
where
    T: Element,
    A: SparseMatrix<Element = T> + ?Sized,
    B: DenseMatrix<Element = T> + ?Sized,
    C: DenseMatrixMut<Element = T> + ?Sized,
{
    for i in 0..a.major_len() {
        let diagonal = b.get(i, i);
        for (i1, value) in a.major(i) {
            if clip.range(i1, i1, i, &(i..i + 1)).is_empty() {
                continue;
            }
            accumulate(c.get_mut(i1, i), value * diagonal, subtract);
        }
    }
}

/// Column-major `A`, one non-zero at a time
fn column_default<T, A, B, C>(a: &A, b: &B, c: &mut C, clip: &Clip, block: usize, subtract: bool)
where
    T: Element,
    A: SparseMatrix<Element = T> + ?Sized,
    B: DenseMatrix<Element = T> + ?Sized,
    C: DenseMatrixMut<Element = T> + ?Sized,
{
    let (n, block) = (b.columns(), block.max(1));
    for jj in (0..n).step_by(block) {
        let columns = jj..(jj + block).min(n);
        for i in 0..a.major_len() {
            for (i1, value) in a.major(i) {
                for j in clip.range(i1, i1, i, &columns) {
                    accumulate(c.get_mut(i1, j), value * b.get(i, j), subtract);
                }
            }
        }
    }
}

/// Column-major `A`, four non-zeros of a column per iteration
fn column_unrolled<T, A, B, C>(a: &A, b: &B, c: &mut C, clip: &Clip, block: usize, subtract: bool)
where
    T: Element,
    A: SparseMatrix<Element = T> + ?Sized,
    B: DenseMatrix<Element = T> + ?Sized,
    C: DenseMatrixMut<Element = T> + ?Sized,
{
    let (n, block) = (b.columns(), block.max(1));
    for jj in (0..n).step_by(block) {
        let columns = jj..(jj + block).min(n);
        for i in 0..a.major_len() {
            let mut line = a.major(i).fuse();
            loop {
                match (line.next(), line.next(), line.next(), line.next()) {
                    (Some((i1, v1)), Some((i2, v2)), Some((i3, v3)), Some((i4, v4))) => {
                        debug_assert!(i1 < i2 && i2 < i3 && i3 < i4, "Invalid sparse matrix index detected");
                        for j in clip.range(i1, i4, i, &columns) {
                            let value = b.get(i, j);
                            accumulate(c.get_mut(i1, j), v1 * value, subtract);
                            accumulate(c.get_mut(i2, j), v2 * value, subtract);
                            accumulate(c.get_mut(i3, j), v3 * value, subtract);
                            accumulate(c.get_mut(i4, j), v4 * value, subtract);
                        }
                    }
                    (first, second, third, _) => {
                        for (i1, v1) in [first, second, third].into_iter().flatten() {
                            for j in clip.range(i1, i1, i, &columns) {
                                accumulate(c.get_mut(i1, j), v1 * b.get(i, j), subtract);
                            }
                        }
                        break;
                    }
                }
            }
        }
    }
}

/// Row-major `A`: row `i` of the result is a combination of rows of `B`
fn row_wise<T, A, B, C>(a: &A, b: &B, c: &mut C, clip: &Clip, subtract: bool)
where
    T: Element,
    A: SparseMatrix<Element = T> + ?Sized,
    B: DenseMatrix<Element = T> + ?Sized,
    C: DenseMatrixMut<Element = T> + ?Sized,
{
    let columns = 0..b.columns();
    for i in 0..a.major_len() {
        for (k, value) in a.major(i) {
            for j in clip.range(i, i, k, &columns) {
                accumulate(c.get_mut(i, j), value * b.get(k, j), subtract);
            }
        }
    }
}

/// Fill the strictly lower triangle from the upper one
pub fn mirror<T, C>(c: &mut C, conjugate: bool)
where
    T: Element,
    C: DenseMatrixMut<Element = T> + ?Sized,
{
    for j in 0..c.columns() {
        for i in j + 1..c.rows() {
            let value = c.get(j, i);
            *c.get_mut(i, j) = if conjugate { value.conj() } else { value };
        }
    }
}

/// Plain dense product used for `C = C * E`
pub fn dense_product<T, A, B, SO>(a: &A, b: &B) -> DynamicMatrix<T, SO>
where
    T: Element,
    A: Matrix<Element = T> + ?Sized,
    B: Matrix<Element = T> + ?Sized,
    SO: StorageOrder,
{
    assert_eq!(a.columns(), b.rows(), "Invalid matrix sizes");
    let mut out = DynamicMatrix::<T, SO>::new(a.rows(), b.columns());
    for i in 0..a.rows() {
        for k in 0..a.columns() {
            let value = a.get(i, k);
            if value.is_default() {
                continue;
            }
            for j in 0..b.columns() {
                out[(i, j)] += value * b.get(k, j);
            }
        }
    }
    out
}
