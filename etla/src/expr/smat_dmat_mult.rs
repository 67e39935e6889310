//! Sparse matrix x dense matrix product
//!
//! [`SMatDMatMult`] is the lazy product `A * B` of a sparse `A` and a
//! dense `B`. The node carries the declared flags of the product
//! ([`ProductDecl`]); declaring the product symmetric, Hermitian, lower,
//! upper or diagonal lets the kernels skip the part of the result that
//! follows from the declaration.
//!
//! Assignment goes through [`plan`](crate::assign::plan::plan): symmetric
//! column-major operands are replaced by their (row-major) transpose,
//! computational operands are materialized, and one of the kernels in
//! [`kernels`](crate::assign::kernels) runs on the result.

use std::ops::Range;

use etla_core::{
    check_multipliable, check_square, structure, Address, DeclKind, DenseMatrix, DenseMatrixMut,
    Density, Element, Expression, KernelConfig, Matrix, ProductDecl, Result, SparseMatrix,
    StorageOrder, Structure,
};
use tracing::debug;

use crate::assign::kernels;
use crate::assign::plan::{plan, MultPlan, PlanInput};
use crate::assign::{CombineMode, Evaluate, MatrixAssign};
use crate::expr::decl::Declare;
use crate::expr::submatrix::Submatrix;
use crate::expr::trans::Trans;
use crate::storage::{CompressedMatrix, DynamicMatrix};

/// `lhs * rhs` for a sparse `lhs` and a dense `rhs`
#[derive(Debug, Clone, Copy)]
pub struct SMatDMatMult<L, R> {
    lhs: L,
    rhs: R,
    decl: ProductDecl,
}

impl<T, L, R> SMatDMatMult<L, R>
where
    T: Element,
    L: SparseMatrix<Element = T>,
    R: DenseMatrix<Element = T>,
{
    /// Fails with `ShapeMismatch` unless `lhs.columns() == rhs.rows()`
    pub fn new(lhs: L, rhs: R) -> Result<Self> {
        check_multipliable((lhs.rows(), lhs.columns()), (rhs.rows(), rhs.columns()))?;
        Ok(Self {
            lhs,
            rhs,
            decl: ProductDecl::NONE,
        })
    }

    pub fn lhs(&self) -> &L {
        &self.lhs
    }

    pub fn rhs(&self) -> &R {
        &self.rhs
    }

    /// Declared flags of the product
    pub fn decl(&self) -> ProductDecl {
        self.decl
    }

    /// Kernel selection for an assignment into `target`
    pub fn plan_for<C: Matrix>(&self, target: &C, config: &KernelConfig) -> MultPlan {
        let input = PlanInput::new::<T>(
            self.rows(),
            self.columns(),
            (
                self.lhs.structure(),
                L::Order::IS_ROW_MAJOR,
                L::IS_COMPUTATION || L::REQUIRES_EVALUATION,
            ),
            (
                self.rhs.structure(),
                R::Order::IS_ROW_MAJOR,
                R::IS_COMPUTATION || R::REQUIRES_EVALUATION,
            ),
            C::Order::IS_ROW_MAJOR,
            target.structure().is_symmetric(),
            self.decl,
        );
        plan(&input, config)
    }
}

/// Materialize the operands the plan asks for, then run the kernel
fn execute<T, A, B, C>(a: &A, b: &B, target: &mut C, mode: CombineMode, plan: &MultPlan, config: &KernelConfig)
where
    T: Element,
    A: SparseMatrix<Element = T>,
    B: DenseMatrix<Element = T> + MatrixAssign,
    C: DenseMatrixMut<Element = T>,
{
    match (plan.evaluate_lhs, plan.evaluate_rhs) {
        (false, false) => kernels::run(a, b, target, mode, plan, config),
        (true, false) => {
            let a = CompressedMatrix::<T, A::Order>::from_sparse(a);
            kernels::run(&a, b, target, mode, plan, config);
        }
        (false, true) => {
            let b = DynamicMatrix::<T, B::Order>::evaluated(b, config);
            kernels::run(a, &b, target, mode, plan, config);
        }
        (true, true) => {
            let a = CompressedMatrix::<T, A::Order>::from_sparse(a);
            let b = DynamicMatrix::<T, B::Order>::evaluated(b, config);
            kernels::run(&a, &b, target, mode, plan, config);
        }
    }
}

const fn needs_evaluation(computation: bool, requires_evaluation: bool) -> bool {
    computation || requires_evaluation
}

impl<T, L, R> Expression for SMatDMatMult<L, R>
where
    T: Element,
    L: SparseMatrix<Element = T>,
    R: DenseMatrix<Element = T>,
{
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = true;
    const REQUIRES_EVALUATION: bool = true;
    const SMP_ASSIGNABLE: bool = !needs_evaluation(L::IS_COMPUTATION, L::REQUIRES_EVALUATION)
        && L::SMP_ASSIGNABLE
        && !needs_evaluation(R::IS_COMPUTATION, R::REQUIRES_EVALUATION)
        && R::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        self.lhs.is_aliased(alias) || self.rhs.is_aliased(alias)
    }

    fn is_aliased(&self, alias: Address) -> bool {
        self.lhs.is_aliased(alias) || self.rhs.is_aliased(alias)
    }

    fn is_aligned(&self) -> bool {
        self.rhs.is_aligned()
    }

    /// Products with a diagonal `rhs` are cheaper to assign serially
    fn can_smp_assign(&self) -> bool {
        !self.rhs.structure().is_diagonal()
    }
}

impl<T, L, R> Matrix for SMatDMatMult<L, R>
where
    T: Element,
    L: SparseMatrix<Element = T>,
    R: DenseMatrix<Element = T>,
{
    type Element = T;
    type Order = R::Order;

    const DENSITY: Density = Density::Dense;

    fn rows(&self) -> usize {
        self.lhs.rows()
    }

    fn columns(&self) -> usize {
        self.rhs.columns()
    }

    /// Inner product of row `i` of `lhs` and column `j` of `rhs`, clipped to
    /// the range where both triangular operands can be non-zero
    fn get(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.rows(), "Invalid row access index");
        debug_assert!(j < self.columns(), "Invalid column access index");

        let (l, r) = (self.lhs.structure(), self.rhs.structure());
        if l.is_diagonal() {
            return self.lhs.get(i, i) * self.rhs.get(i, j);
        }
        if r.is_diagonal() {
            return self.lhs.get(i, j) * self.rhs.get(j, j);
        }

        let mut begin = 0;
        if l.is_upper() {
            begin = begin.max(if l.is_strictly_upper() { i + 1 } else { i });
        }
        if r.is_lower() {
            begin = begin.max(if r.is_strictly_lower() { j + 1 } else { j });
        }
        let mut end = self.lhs.columns();
        if l.is_lower() {
            end = end.min(if l.is_strictly_lower() { i } else { i + 1 });
        }
        if r.is_upper() {
            end = end.min(if r.is_strictly_upper() { j } else { j + 1 });
        }

        (begin..end).fold(T::zero(), |sum, k| sum + self.lhs.get(i, k) * self.rhs.get(k, j))
    }

    fn structure(&self) -> Structure {
        structure::product(self.lhs.structure(), self.rhs.structure(), self.decl, T::IS_BUILTIN)
    }
}

impl<T, L, R> DenseMatrix for SMatDMatMult<L, R>
where
    T: Element,
    L: SparseMatrix<Element = T>,
    R: DenseMatrix<Element = T>,
{
}

impl<T, L, R> MatrixAssign for SMatDMatMult<L, R>
where
    T: Element,
    L: SparseMatrix<Element = T>,
    R: DenseMatrix<Element = T> + MatrixAssign,
{
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = T>,
    {
        if !matches!(mode, CombineMode::Assign | CombineMode::Add | CombineMode::Sub) {
            let product = DynamicMatrix::<T, R::Order>::evaluated(self, config);
            product.assign_to(target, mode, config);
            return;
        }

        let plan = self.plan_for(&*target, config);
        debug!(
            rows = self.rows(),
            columns = self.columns(),
            non_zeros = self.lhs.non_zeros(),
            ?mode,
            ?plan,
            "sparse x dense product"
        );
        match (plan.transpose_lhs, plan.transpose_rhs) {
            (false, false) => execute(&self.lhs, &self.rhs, target, mode, &plan, config),
            (true, false) => execute(&Trans::new(&self.lhs), &self.rhs, target, mode, &plan, config),
            (false, true) => execute(&self.lhs, &Trans::new(&self.rhs), target, mode, &plan, config),
            (true, true) => execute(
                &Trans::new(&self.lhs),
                &Trans::new(&self.rhs),
                target,
                mode,
                &plan,
                config,
            ),
        }
    }

    /// `rows x columns` block of the product, computed from the matching
    /// rows of `lhs` and columns of `rhs` without declared flags
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
        let block = SMatDMatMult {
            lhs: Submatrix::within(&self.lhs, rows.start, 0, rows.len(), self.lhs.columns()),
            rhs: Submatrix::within(&self.rhs, 0, columns.start, self.rhs.rows(), columns.len()),
            decl: ProductDecl::NONE,
        };
        block.assign_to(target, mode, config);
    }
}

impl<T, L, R> Evaluate for SMatDMatMult<L, R>
where
    T: Element,
    L: SparseMatrix<Element = T>,
    R: DenseMatrix<Element = T> + MatrixAssign,
{
    type Output = DynamicMatrix<T, R::Order>;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output {
        DynamicMatrix::evaluated(self, config)
    }
}

/// Declaring a product re-creates the node with the flag set
impl<T, L, R> Declare for SMatDMatMult<L, R>
where
    T: Element,
    L: SparseMatrix<Element = T>,
    R: DenseMatrix<Element = T>,
{
    type Output = Self;

    fn declare(self, kind: DeclKind) -> Result<Self> {
        check_square(self.rows(), self.columns())?;
        Ok(Self {
            decl: self.decl.with(kind),
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::plan::Kernel;
    use crate::expr::decl::{decldiag, declherm, decllow, declsym, declupp};
    use crate::storage::IdentityMatrix;
    use etla_core::{ColumnMajor, EtlaError, RowMajor};
    use num_complex::Complex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn naive<T, A, B>(a: &A, b: &B) -> DynamicMatrix<T, RowMajor>
    where
        T: Element,
        A: Matrix<Element = T>,
        B: Matrix<Element = T>,
    {
        DynamicMatrix::from_fn(a.rows(), b.columns(), |i, j| {
            (0..a.columns()).fold(T::zero(), |sum, k| sum + a.get(i, k) * b.get(k, j))
        })
    }

    fn assert_same<T, X, Y>(actual: &X, expected: &Y)
    where
        T: Element,
        X: Matrix<Element = T>,
        Y: Matrix<Element = T>,
    {
        assert_eq!((actual.rows(), actual.columns()), (expected.rows(), expected.columns()));
        for i in 0..expected.rows() {
            for j in 0..expected.columns() {
                assert_eq!(actual.get(i, j), expected.get(i, j), "mismatch at ({i}, {j})");
            }
        }
    }

    fn random_triplets(rng: &mut StdRng, rows: usize, columns: usize, density: f64) -> Vec<(usize, usize, f64)> {
        let mut triplets = Vec::new();
        for i in 0..rows {
            for j in 0..columns {
                if rng.gen_bool(density) {
                    triplets.push((i, j, rng.gen_range(-5..=5) as f64));
                }
            }
        }
        triplets
    }

    /// Triplets restricted by `keep(i, j)`, mirrored when `symmetric`
    fn structured_triplets(
        rng: &mut StdRng,
        n: usize,
        symmetric: bool,
        keep: impl Fn(usize, usize) -> bool,
    ) -> Vec<(usize, usize, f64)> {
        let mut triplets = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if !keep(i, j) || (symmetric && j < i) || !rng.gen_bool(0.4) {
                    continue;
                }
                let value = rng.gen_range(-5..=5) as f64;
                triplets.push((i, j, value));
                if symmetric && i != j {
                    triplets.push((j, i, value));
                }
            }
        }
        triplets
    }

    fn configs() -> Vec<KernelConfig> {
        let base = KernelConfig::default();
        vec![
            base,
            base.with_thresholds(0, 0),
            base.with_thresholds(usize::MAX, usize::MAX),
            base.with_optimized_kernels(false),
            base.with_blocks(3, 5, 2),
            base.with_exploit_symmetry(false).with_thresholds(0, 0),
        ]
    }

    fn check_orders<LO: StorageOrder, RO: StorageOrder, CO: StorageOrder>(rng: &mut StdRng) {
        let (m, k, n) = (rng.gen_range(1..=24), rng.gen_range(1..=24), rng.gen_range(1..=24));
        let a = CompressedMatrix::<f64, LO>::from_triplets(m, k, &random_triplets(rng, m, k, 0.3)).unwrap();
        let b = DynamicMatrix::<f64, RO>::from_fn(k, n, |_, _| rng.gen_range(-4..=4) as f64);
        let expected = naive(&a, &b);
        let product = SMatDMatMult::new(&a, &b).unwrap();

        for config in configs() {
            let mut c = DynamicMatrix::<f64, CO>::new(0, 0);
            c.assign_with(&product, &config).unwrap();
            assert_same(&c, &expected);

            let start = DynamicMatrix::<f64, CO>::from_fn(m, n, |i, j| (i * n + j) as f64);
            let mut c = start.clone();
            c.combine(&product, CombineMode::Add, &config).unwrap();
            assert_same(&c, &DynamicMatrix::<f64, RowMajor>::from_fn(m, n, |i, j| start.get(i, j) + expected.get(i, j)));
            c.combine(&product, CombineMode::Sub, &config).unwrap();
            assert_same(&c, &start);
        }
    }

    #[test]
    fn test_example_times_identity() {
        let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(
            3,
            3,
            &[(0, 0, 1.0), (1, 1, 3.0), (2, 0, -1.0), (0, 2, 2.0), (1, 2, -1.0), (2, 2, 2.0)],
        )
        .unwrap();
        let b = DynamicMatrix::<f64, ColumnMajor>::identity(3);
        let mut c = DynamicMatrix::<f64, ColumnMajor>::new(3, 3);
        c.assign(&SMatDMatMult::new(&a, &b).unwrap()).unwrap();
        assert_same(&c, &a);
        assert_eq!(c[(1, 2)], -1.0);
        assert_eq!(c[(2, 1)], 0.0);
    }

    #[test]
    fn test_shape_law() {
        let a = CompressedMatrix::<f64, ColumnMajor>::new(3, 4);
        let b = DynamicMatrix::<f64, RowMajor>::new(4, 2);
        let product = SMatDMatMult::new(&a, &b).unwrap();
        assert_eq!((product.rows(), product.columns()), (3, 2));
        assert_eq!(product.evaluate().as_slice(), &[0.0; 6]);

        let c = DynamicMatrix::<f64, RowMajor>::new(5, 2);
        assert_eq!(
            SMatDMatMult::new(&a, &c).unwrap_err(),
            EtlaError::ShapeMismatch {
                expected: (4, 2),
                found: (5, 2)
            }
        );
        assert!(product.at(3, 0).is_err());
        assert_eq!(declsym(product).unwrap_err(), EtlaError::NotSquare { rows: 3, columns: 2 });
    }

    #[test]
    fn test_kernel_equivalence() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..6 {
            check_orders::<ColumnMajor, RowMajor, RowMajor>(&mut rng);
            check_orders::<ColumnMajor, ColumnMajor, ColumnMajor>(&mut rng);
            check_orders::<ColumnMajor, RowMajor, ColumnMajor>(&mut rng);
            check_orders::<RowMajor, ColumnMajor, RowMajor>(&mut rng);
        }
    }

    #[test]
    fn test_element_access_matches_naive() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 9;
        let upper = CompressedMatrix::<f64, ColumnMajor>::from_triplets(n, n, &structured_triplets(&mut rng, n, false, |i, j| j > i))
            .unwrap()
            .with_structure(Structure::STRICTLY_UPPER)
            .unwrap();
        let lower = DynamicMatrix::<f64, RowMajor>::from_fn(n, n, |i, j| if j <= i { (i + 2 * j) as f64 } else { 0.0 })
            .with_structure(Structure::LOWER)
            .unwrap();
        let product = SMatDMatMult::new(&upper, &lower).unwrap();
        assert_same(&product, &naive(&upper, &lower));

        let identity = IdentityMatrix::<f64, ColumnMajor>::new(n);
        let scaled = SMatDMatMult::new(identity, &lower).unwrap();
        assert_same(&scaled, &lower);
        assert_same(&scaled.evaluate(), &lower);

        let diagonal = DynamicMatrix::<f64, RowMajor>::from_fn(n, n, |i, j| if i == j { i as f64 } else { 0.0 })
            .with_structure(Structure::DIAGONAL)
            .unwrap();
        let product = SMatDMatMult::new(&upper, &diagonal).unwrap();
        assert_same(&product, &naive(&upper, &diagonal));
        assert_same(&product.evaluate(), &naive(&upper, &diagonal));
    }

    #[test]
    fn test_symmetric_mirroring() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(12, 7, &random_triplets(&mut rng, 12, 7, 0.4)).unwrap();
        let at = DynamicMatrix::<f64, RowMajor>::from_fn(7, 12, |i, j| a.get(j, i));
        let expected = naive(&a, &at);

        for config in configs() {
            let product = declsym(SMatDMatMult::new(&a, &at).unwrap()).unwrap();
            assert!(product.structure().is_symmetric());
            let mut c = DynamicMatrix::<f64, ColumnMajor>::new(0, 0);
            c.assign_with(&product, &config).unwrap();
            assert_same(&c, &expected);
            for i in 0..12 {
                for j in 0..12 {
                    assert_eq!(c.get(i, j), c.get(j, i));
                }
            }
        }
    }

    #[test]
    fn test_hermitian_mirroring() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut triplets = Vec::new();
        for i in 0..8 {
            for j in 0..5 {
                if rng.gen_bool(0.5) {
                    let (re, im) = (rng.gen_range(-3..=3) as f64, rng.gen_range(-3..=3) as f64);
                    triplets.push((i, j, Complex::new(re, im)));
                }
            }
        }
        let a = CompressedMatrix::<Complex<f64>, ColumnMajor>::from_triplets(8, 5, &triplets).unwrap();
        let ah = DynamicMatrix::<Complex<f64>, RowMajor>::from_fn(5, 8, |i, j| a.get(j, i).conj());
        let expected = naive(&a, &ah);

        let product = declherm(SMatDMatMult::new(&a, &ah).unwrap()).unwrap();
        assert!(product.structure().is_hermitian());
        assert!(!product.structure().is_symmetric());
        for config in configs() {
            let mut c = DynamicMatrix::<Complex<f64>, RowMajor>::new(0, 0);
            c.assign_with(&product, &config).unwrap();
            assert_same(&c, &expected);
            for i in 0..8 {
                for j in 0..8 {
                    assert_eq!(c.get(i, j), c.get(j, i).conj());
                }
            }
        }
    }

    #[test]
    fn test_restructuring_equivalence() {
        let mut rng = StdRng::seed_from_u64(13);
        let n = 14;
        let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(n, n, &structured_triplets(&mut rng, n, true, |_, _| true))
            .unwrap()
            .with_structure(Structure::SYMMETRIC)
            .unwrap();
        let b = DynamicMatrix::<f64, ColumnMajor>::from_fn(n, n, |i, j| ((i + j) % 5) as f64 - 2.0)
            .with_structure(Structure::SYMMETRIC)
            .unwrap();
        let product = SMatDMatMult::new(&a, &b).unwrap();
        let target = DynamicMatrix::<f64, RowMajor>::new(n, n);

        let exploit = KernelConfig::default();
        let direct = exploit.with_exploit_symmetry(false);
        let restructured = product.plan_for(&target, &exploit);
        assert!(restructured.transpose_lhs && restructured.transpose_rhs);
        assert_eq!(restructured.kernel, Kernel::RowWise);
        assert!(!product.plan_for(&target, &direct).is_restructured());

        let mut c1 = target.clone();
        let mut c2 = target.clone();
        c1.assign_with(&product, &exploit).unwrap();
        c2.assign_with(&product, &direct).unwrap();
        assert_eq!(c1, c2);
        assert_same(&c1, &naive(&a, &b));

        let symmetric_target = DynamicMatrix::<f64, RowMajor>::identity(n);
        assert!(!product.plan_for(&symmetric_target, &exploit).is_restructured());
    }

    #[test]
    fn test_triangular_declarations() {
        let mut rng = StdRng::seed_from_u64(17);
        let n = 11;
        let lower_a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(n, n, &structured_triplets(&mut rng, n, false, |i, j| j <= i)).unwrap();
        let lower_b = DynamicMatrix::<f64, RowMajor>::from_fn(n, n, |i, j| if j <= i { (i * j % 7) as f64 + 1.0 } else { 0.0 });
        let upper_a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(n, n, &structured_triplets(&mut rng, n, false, |i, j| j >= i)).unwrap();
        let upper_b = DynamicMatrix::<f64, ColumnMajor>::from_fn(n, n, |i, j| if j >= i { (i + j) as f64 } else { 0.0 })
            .with_structure(Structure::UPPER)
            .unwrap();

        for config in configs() {
            let product = decllow(SMatDMatMult::new(&lower_a, &lower_b).unwrap()).unwrap();
            assert!(product.structure().is_lower());
            let mut c = DynamicMatrix::<f64, RowMajor>::from_fn(n, n, |_, _| 42.0);
            c.assign_with(&product, &config).unwrap();
            assert_same(&c, &naive(&lower_a, &lower_b));

            let product = declupp(SMatDMatMult::new(&upper_a, &upper_b).unwrap()).unwrap();
            let mut c = DynamicMatrix::<f64, ColumnMajor>::new(0, 0);
            c.assign_with(&product, &config).unwrap();
            assert_same(&c, &naive(&upper_a, &upper_b));
            c.combine(&product, CombineMode::Sub, &config).unwrap();
            assert!(c.as_slice().iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_diagonal_declaration() {
        let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(4, 4, &[(0, 0, 2.0), (2, 2, -1.0), (3, 3, 4.0)]).unwrap();
        let b = DynamicMatrix::<f64, RowMajor>::from_fn(4, 4, |i, j| if i == j { (i + 1) as f64 } else { 0.0 });
        let product = decldiag(SMatDMatMult::new(&a, &b).unwrap()).unwrap();
        assert!(product.structure().is_diagonal());
        let mut c = DynamicMatrix::<f64, RowMajor>::new(4, 4);
        c.assign(&product).unwrap();
        assert_eq!(c.as_slice(), &[2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -3.0, 0.0, 0.0, 0.0, 0.0, 16.0]);
    }

    #[test]
    fn test_schur_and_mult_assignment() {
        let a = CompressedMatrix::<i64, ColumnMajor>::from_triplets(2, 2, &[(0, 1, 1), (1, 0, 1)]).unwrap();
        let b = DynamicMatrix::<i64, RowMajor>::from_row_slice(2, 2, &[1, 2, 3, 4]).unwrap();
        let product = SMatDMatMult::new(&a, &b).unwrap();

        let mut c = DynamicMatrix::<i64, RowMajor>::from_row_slice(2, 2, &[1, 1, 2, 2]).unwrap();
        c.schur_assign(&product).unwrap();
        assert_eq!(c.as_slice(), &[3, 4, 2, 4]);

        let mut c = DynamicMatrix::<i64, RowMajor>::from_row_slice(2, 2, &[1, 0, 0, 2]).unwrap();
        c.mult_assign(&product).unwrap();
        assert_eq!(c.as_slice(), &[3, 4, 2, 4]);
    }

    #[test]
    fn test_block_assignment() {
        let mut rng = StdRng::seed_from_u64(23);
        let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(10, 6, &random_triplets(&mut rng, 10, 6, 0.5)).unwrap();
        let b = DynamicMatrix::<f64, ColumnMajor>::from_fn(6, 9, |i, j| (i as f64) - (j as f64));
        let expected = naive(&a, &b);
        let product = SMatDMatMult::new(&a, &b).unwrap();
        assert!(declsym(product).is_err());

        let mut block = DynamicMatrix::<f64, ColumnMajor>::new(4, 3);
        product.assign_block_to(&mut block, 5..9, 2..5, CombineMode::Assign, &KernelConfig::default());
        for i in 0..4 {
            for j in 0..3 {
                assert_eq!(block.get(i, j), expected.get(5 + i, 2 + j));
            }
        }
    }

    #[test]
    fn test_capabilities() {
        type Product<'a> = SMatDMatMult<&'a CompressedMatrix<f64, ColumnMajor>, &'a DynamicMatrix<f64, RowMajor>>;
        assert!(Product::SMP_ASSIGNABLE);
        assert!(Product::REQUIRES_EVALUATION);
        assert!(!<SMatDMatMult<&CompressedMatrix<f64, ColumnMajor>, Product>>::SMP_ASSIGNABLE);

        let a = CompressedMatrix::<f64, ColumnMajor>::new(2, 2);
        let b = DynamicMatrix::<f64, RowMajor>::new(2, 2);
        let other = DynamicMatrix::<f64, RowMajor>::new(2, 2);
        let product = SMatDMatMult::new(&a, &b).unwrap();
        assert!(product.is_aliased(Address::of(&b)));
        assert!(product.can_alias(Address::of(&a)));
        assert!(!product.can_alias(Address::of(&other)));
        assert!(product.is_aligned());
        assert!(product.can_smp_assign());

        let diagonal = DynamicMatrix::<f64, RowMajor>::identity(2).with_structure(Structure::DIAGONAL).unwrap();
        assert!(!SMatDMatMult::new(&a, &diagonal).unwrap().can_smp_assign());
    }
}
