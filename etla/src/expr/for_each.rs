//! Elementwise unary maps
//!
//! A map node applies a [`UnaryOp`] to every element of a dense operand.
//! The named maps (`sqrt`, `abs`, ...) are zero-sized operations whose
//! element bounds reject unsupported element types at compile time:
//!
//! ```compile_fail
//! use etla::{sqrt, DynamicVector};
//!
//! let v = DynamicVector::<i32>::from_vec(vec![4, 9]);
//! let _ = sqrt(&v);
//! ```

use etla_core::simd::Pack;
use etla_core::{
    structure, Address, DenseMatrix, DenseMatrixMut, DenseVector, DenseVectorMut, Density, Element,
    Expression, KernelConfig, Matrix, Structure, Vector,
};
use num_traits::{Float, Signed};

use crate::assign::{self, CombineMode, Evaluate, MatrixAssign, VectorAssign};
use crate::storage::{DynamicMatrix, DynamicVector};

/// Operation applied to each element by a map node
pub trait UnaryOp<T: Element>: Clone + Send + Sync {
    /// Packs can be processed through [`UnaryOp::load`]
    const SIMD_ENABLED: bool = false;
    /// `apply(0) == 0`
    const ZERO_PRESERVING: bool = false;
    /// `apply(1) == 1`
    const ONE_PRESERVING: bool = false;

    fn apply(&self, value: T) -> T;

    fn load(&self, pack: Pack<T>) -> Pack<T> {
        pack.map(|value| self.apply(value))
    }

    /// Structure of the mapped operand
    fn yields(structure: Structure) -> Structure {
        structure::map(structure, Self::ZERO_PRESERVING, Self::ONE_PRESERVING)
    }
}

/// Whether mapping an operand of the given structure with `Op` yields a uni-lower matrix
pub fn yields_uni_lower<T: Element, Op: UnaryOp<T>>(structure: Structure) -> bool {
    Op::yields(structure).is_uni_lower()
}

/// Arbitrary closure as a map operation
#[derive(Debug, Clone, Copy)]
pub struct Func<F>(pub F);

impl<T: Element, F: Fn(T) -> T + Clone + Send + Sync> UnaryOp<T> for Func<F> {
    fn apply(&self, value: T) -> T {
        (self.0)(value)
    }
}

macro_rules! float_op {
    ($($(#[$doc:meta])* $name:ident, simd = $simd:expr, zero = $zero:expr, one = $one:expr, |$x:ident| $body:expr;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl<T: Element + Float> UnaryOp<T> for $name {
                const SIMD_ENABLED: bool = $simd;
                const ZERO_PRESERVING: bool = $zero;
                const ONE_PRESERVING: bool = $one;

                #[inline]
                fn apply(&self, $x: T) -> T {
                    $body
                }
            }
        )*
    };
}

float_op! {
    /// Square root
    Sqrt, simd = true, zero = true, one = true, |x| x.sqrt();
    /// Inverse square root `1 / sqrt(x)`
    InvSqrt, simd = true, zero = false, one = true, |x| x.sqrt().recip();
    /// Cubic root
    Cbrt, simd = false, zero = true, one = true, |x| x.cbrt();
    /// Inverse cubic root `1 / cbrt(x)`
    InvCbrt, simd = false, zero = false, one = true, |x| x.cbrt().recip();
    Floor, simd = true, zero = true, one = true, |x| x.floor();
    Ceil, simd = true, zero = true, one = true, |x| x.ceil();
    Exp, simd = false, zero = false, one = false, |x| x.exp();
    /// Natural logarithm
    Log, simd = false, zero = false, one = false, |x| x.ln();
    Log10, simd = false, zero = false, one = false, |x| x.log10();
    Sin, simd = false, zero = true, one = false, |x| x.sin();
}

/// Power with a fixed exponent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pow<T> {
    pub exponent: T,
}

impl<T: Element + Float> UnaryOp<T> for Pow<T> {
    fn apply(&self, value: T) -> T {
        value.powf(self.exponent)
    }
}

/// Absolute value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Abs;

impl<T: Element + Signed> UnaryOp<T> for Abs {
    const SIMD_ENABLED: bool = true;
    const ZERO_PRESERVING: bool = true;
    const ONE_PRESERVING: bool = true;

    fn apply(&self, value: T) -> T {
        value.abs()
    }
}

/// Map node over a dense vector
#[derive(Debug, Clone, Copy)]
pub struct DVecForEach<V, Op> {
    operand: V,
    op: Op,
}

impl<V: DenseVector, Op: UnaryOp<V::Element>> DVecForEach<V, Op> {
    pub fn new(operand: V, op: Op) -> Self {
        Self { operand, op }
    }

    pub fn operand(&self) -> &V {
        &self.operand
    }

    pub fn operation(&self) -> &Op {
        &self.op
    }
}

/// Apply a closure to each element of a dense vector
pub fn for_each<V, F>(operand: V, f: F) -> DVecForEach<V, Func<F>>
where
    V: DenseVector,
    F: Fn(V::Element) -> V::Element + Clone + Send + Sync,
{
    DVecForEach::new(operand, Func(f))
}

/// Apply a map operation to each element of a dense vector
pub fn map<V: DenseVector, Op: UnaryOp<V::Element>>(operand: V, op: Op) -> DVecForEach<V, Op> {
    DVecForEach::new(operand, op)
}

macro_rules! named_map {
    ($($(#[$doc:meta])* $fn_name:ident => $op:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $fn_name<V>(operand: V) -> DVecForEach<V, $op>
            where
                V: DenseVector,
                $op: UnaryOp<V::Element>,
            {
                DVecForEach::new(operand, $op)
            }
        )*
    };
}

named_map! {
    /// Elementwise square root
    sqrt => Sqrt;
    invsqrt => InvSqrt;
    cbrt => Cbrt;
    invcbrt => InvCbrt;
    floor => Floor;
    ceil => Ceil;
    exp => Exp;
    /// Elementwise natural logarithm
    log => Log;
    log10 => Log10;
    sin => Sin;
    /// Elementwise absolute value
    abs => Abs;
}

/// Elementwise power `x^exponent`
pub fn pow<V>(operand: V, exponent: V::Element) -> DVecForEach<V, Pow<V::Element>>
where
    V: DenseVector,
    V::Element: Float,
{
    DVecForEach::new(operand, Pow { exponent })
}

impl<V: DenseVector, Op: UnaryOp<V::Element>> Expression for DVecForEach<V, Op> {
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = true;
    const REQUIRES_EVALUATION: bool = V::REQUIRES_EVALUATION;
    const SIMD_ENABLED: bool = V::SIMD_ENABLED && Op::SIMD_ENABLED;
    const SMP_ASSIGNABLE: bool = V::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        V::IS_COMPUTATION && self.operand.can_alias(alias)
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

impl<V: DenseVector, Op: UnaryOp<V::Element>> Vector for DVecForEach<V, Op> {
    type Element = V::Element;
    type Transpose = V::Transpose;

    const DENSITY: Density = Density::Dense;

    fn size(&self) -> usize {
        self.operand.size()
    }

    #[inline]
    fn get(&self, i: usize) -> V::Element {
        self.op.apply(self.operand.get(i))
    }
}

/// Iterator applying a map operation to an operand iterator
#[derive(Debug, Clone)]
pub struct MapIter<I, Op> {
    inner: I,
    op: Op,
}

impl<T: Element, I: Iterator<Item = T>, Op: UnaryOp<T>> Iterator for MapIter<I, Op> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|value| self.op.apply(value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V: DenseVector, Op: UnaryOp<V::Element>> DenseVector for DVecForEach<V, Op> {
    type Iter<'a> = MapIter<V::Iter<'a>, Op> where Self: 'a;

    fn iter(&self) -> Self::Iter<'_> {
        MapIter {
            inner: self.operand.iter(),
            op: self.op.clone(),
        }
    }

    fn load(&self, i: usize) -> Pack<V::Element> {
        self.op.load(self.operand.load(i))
    }
}

impl<V, Op> VectorAssign for DVecForEach<V, Op>
where
    V: DenseVector + VectorAssign,
    Op: UnaryOp<V::Element>,
{
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode)
    where
        C: DenseVectorMut<Element = V::Element>,
    {
        if !V::REQUIRES_EVALUATION {
            assign::assign_dense_vector(self, target, mode);
            return;
        }
        if mode == CombineMode::Assign {
            self.operand.assign_to(target, CombineMode::Assign);
            for i in 0..self.size() {
                let slot = target.get_mut(i);
                *slot = self.op.apply(*slot);
            }
        } else {
            let evaluated = DynamicVector::<V::Element, V::Transpose>::evaluated(&self.operand);
            for i in 0..self.size() {
                mode.apply(target.get_mut(i), self.op.apply(evaluated[i]));
            }
        }
    }
}

impl<V, Op> Evaluate for DVecForEach<V, Op>
where
    V: DenseVector + VectorAssign,
    Op: UnaryOp<V::Element>,
{
    type Output = DynamicVector<V::Element, V::Transpose>;

    fn evaluate_with(&self, _config: &KernelConfig) -> Self::Output {
        DynamicVector::evaluated(self)
    }
}

/// Map node over a dense matrix
#[derive(Debug, Clone, Copy)]
pub struct DMatForEach<M, Op> {
    operand: M,
    op: Op,
}

impl<M: DenseMatrix, Op: UnaryOp<M::Element>> DMatForEach<M, Op> {
    pub fn new(operand: M, op: Op) -> Self {
        Self { operand, op }
    }
}

/// Apply a closure to each element of a dense matrix
pub fn mat_for_each<M, F>(operand: M, f: F) -> DMatForEach<M, Func<F>>
where
    M: DenseMatrix,
    F: Fn(M::Element) -> M::Element + Clone + Send + Sync,
{
    DMatForEach::new(operand, Func(f))
}

/// Apply a map operation to each element of a dense matrix
pub fn mat_map<M: DenseMatrix, Op: UnaryOp<M::Element>>(operand: M, op: Op) -> DMatForEach<M, Op> {
    DMatForEach::new(operand, op)
}

impl<M: DenseMatrix, Op: UnaryOp<M::Element>> Expression for DMatForEach<M, Op> {
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = true;
    const REQUIRES_EVALUATION: bool = M::REQUIRES_EVALUATION;
    const SIMD_ENABLED: bool = M::SIMD_ENABLED && Op::SIMD_ENABLED;
    const SMP_ASSIGNABLE: bool = M::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        M::IS_COMPUTATION && self.operand.can_alias(alias)
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

impl<M: DenseMatrix, Op: UnaryOp<M::Element>> Matrix for DMatForEach<M, Op> {
    type Element = M::Element;
    type Order = M::Order;

    const DENSITY: Density = Density::Dense;

    fn rows(&self) -> usize {
        self.operand.rows()
    }

    fn columns(&self) -> usize {
        self.operand.columns()
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> M::Element {
        self.op.apply(self.operand.get(i, j))
    }

    fn structure(&self) -> Structure {
        Op::yields(self.operand.structure())
    }
}

impl<M: DenseMatrix, Op: UnaryOp<M::Element>> DenseMatrix for DMatForEach<M, Op> {
    fn load(&self, i: usize, j: usize) -> Pack<M::Element> {
        self.op.load(self.operand.load(i, j))
    }
}

impl<M, Op> MatrixAssign for DMatForEach<M, Op>
where
    M: DenseMatrix + MatrixAssign,
    Op: UnaryOp<M::Element>,
{
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = M::Element>,
    {
        if !M::REQUIRES_EVALUATION {
            assign::assign_elementwise(self, target, mode);
            return;
        }
        if mode == CombineMode::Assign {
            self.operand.assign_to(target, CombineMode::Assign, config);
            for i in 0..self.rows() {
                for j in 0..self.columns() {
                    let slot = target.get_mut(i, j);
                    *slot = self.op.apply(*slot);
                }
            }
        } else {
            let evaluated = DynamicMatrix::<M::Element, M::Order>::evaluated(&self.operand, config);
            assign::assign_elementwise(&DMatForEach::new(&evaluated, self.op.clone()), target, mode);
        }
    }
}

impl<M, Op> Evaluate for DMatForEach<M, Op>
where
    M: DenseMatrix + MatrixAssign,
    Op: UnaryOp<M::Element>,
{
    type Output = DynamicMatrix<M::Element, M::Order>;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output {
        DynamicMatrix::evaluated(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::eval;
    use etla_core::capability::{Predicate, SimdEnabled};
    use etla_core::RowMajor;

    #[test]
    fn test_sqrt_of_first_integers() {
        let v = DynamicVector::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let expected = [1.0, 1.414_213_562_373_095, 1.732_050_807_568_877_2, 2.0];

        let mut out = DynamicVector::<f64>::new(0);
        out.assign(&sqrt(&v)).unwrap();
        assert_eq!(out.size(), 4);
        for (x, e) in out.as_slice().iter().zip(expected) {
            assert!((x - e).abs() < 1e-9, "{x} != {e}");
        }

        let packed = sqrt(&v).load(0);
        for (x, e) in packed.iter().zip(expected) {
            assert!((x - e).abs() < 1e-9, "{x} != {e}");
        }
    }

    #[test]
    fn test_sqrt_perfect_squares() {
        let v = DynamicVector::<f64>::from_vec(vec![4.0, 9.0, 16.0]);
        let mut out = DynamicVector::<f64>::new(0);
        out.assign(&sqrt(&v)).unwrap();
        assert_eq!(out.as_slice(), &[2.0, 3.0, 4.0]);
        assert_eq!(sqrt(&v).at(1), Ok(3.0));
        assert!(sqrt(&v).at(3).is_err());
    }

    #[test]
    fn test_for_each_closure_and_iter() {
        let v = DynamicVector::<i64>::from_vec(vec![1, -2, 3]);
        let doubled = for_each(&v, |x| 2 * x);
        assert_eq!(doubled.iter().collect::<Vec<_>>(), vec![2, -4, 6]);
        assert_eq!(abs(&v).iter().sum::<i64>(), 6);
    }

    #[test]
    fn test_named_maps() {
        let v = DynamicVector::<f64>::from_vec(vec![1.0, 8.0, 100.0, 2.5]);
        assert_eq!(cbrt(&v).get(1), 2.0);
        assert_eq!(log10(&v).get(2), 2.0);
        assert_eq!(floor(&v).get(3), 2.0);
        assert_eq!(ceil(&v).get(3), 3.0);
        assert_eq!(pow(&v, 2.0).get(1), 64.0);
        assert_eq!(invsqrt(&v).get(0), 1.0);
        assert!((exp(&v).get(0) - std::f64::consts::E).abs() < 1e-12);
        assert_eq!(sin(&v).get(0), 1.0_f64.sin());
        assert_eq!(log(&v).get(0), 0.0);
        assert_eq!(invcbrt(&v).get(1), 0.5);
    }

    #[test]
    fn test_simd_flag_combines_operand_and_op() {
        type Rooted<'a> = DVecForEach<&'a DynamicVector<f32>, Sqrt>;
        type Closure<'a> = DVecForEach<&'a DynamicVector<f32>, Func<fn(f32) -> f32>>;
        assert!(<SimdEnabled<Rooted>>::VALUE);
        assert!(!<SimdEnabled<Closure>>::VALUE);

        let v = DynamicVector::<f32>::from_vec(vec![1.0, 4.0, 9.0, 16.0, 25.0]);
        assert_eq!(sqrt(&v).load(0), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_evaluated_operand_paths() {
        let v = DynamicVector::<f64>::from_vec(vec![1.0, 4.0, 9.0]);
        let mut out = DynamicVector::<f64>::from_vec(vec![1.0; 3]);
        out.add_assign(&sqrt(eval(&v))).unwrap();
        assert_eq!(out.as_slice(), &[2.0, 3.0, 4.0]);
        out.assign(&sqrt(eval(&v))).unwrap();
        assert_eq!(out.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(sqrt(eval(&v)).evaluate().as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_matrix_map_structure() {
        let lower = DynamicMatrix::<f64, RowMajor>::from_row_slice(2, 2, &[1.0, 0.0, 4.0, 1.0])
            .unwrap()
            .with_structure(Structure::UNI_LOWER)
            .unwrap();
        assert!(mat_map(&lower, Sqrt).structure().is_uni_lower());
        assert!(yields_uni_lower::<f64, Sqrt>(lower.structure()));
        assert!(!yields_uni_lower::<f64, Exp>(lower.structure()));
        assert!(!mat_map(&lower, Sin).structure().is_uni_lower());
        assert!(mat_map(&lower, Sin).structure().is_lower());
        let mapped = mat_for_each(&lower, |x| x + 1.0).evaluate();
        assert_eq!(mapped.as_slice(), &[2.0, 1.0, 5.0, 2.0]);
    }
}
