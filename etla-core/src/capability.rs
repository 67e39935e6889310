//! Compile-time capability predicates
//!
//! Each predicate is a zero-sized type implementing [`Predicate`]; the
//! combinators [`And`], [`Or`] and [`Not`] compose them into larger
//! conditions that are still evaluated entirely at compile time:
//!
//! ```
//! use etla_core::capability::{And, IsComputation, Not, Predicate, SmpAssignable};
//! use etla_core::traits::Expression;
//!
//! struct Leaf;
//! impl Expression for Leaf {
//!     const SMP_ASSIGNABLE: bool = true;
//! }
//!
//! assert!(<And<SmpAssignable<Leaf>, Not<IsComputation<Leaf>>>>::VALUE);
//! ```

use core::marker::PhantomData;

use crate::simd::has_simd_div;
use crate::traits::element::Element;
use crate::traits::expression::Expression;
use crate::traits::matrix::{Density, Matrix};
use crate::traits::order::StorageOrder;
use crate::traits::vector::Vector;

/// A boolean known at compile time
pub trait Predicate {
    const VALUE: bool;
}

/// Always true
pub struct True;

/// Always false
pub struct False;

impl Predicate for True {
    const VALUE: bool = true;
}

impl Predicate for False {
    const VALUE: bool = false;
}

pub struct And<A, B>(PhantomData<fn() -> (A, B)>);
pub struct Or<A, B>(PhantomData<fn() -> (A, B)>);
pub struct Not<A>(PhantomData<fn() -> A>);

impl<A: Predicate, B: Predicate> Predicate for And<A, B> {
    const VALUE: bool = A::VALUE && B::VALUE;
}

impl<A: Predicate, B: Predicate> Predicate for Or<A, B> {
    const VALUE: bool = A::VALUE || B::VALUE;
}

impl<A: Predicate> Predicate for Not<A> {
    const VALUE: bool = !A::VALUE;
}

macro_rules! expression_predicate {
    ($($(#[$doc:meta])* $name:ident => $flag:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub struct $name<T: ?Sized>(PhantomData<fn() -> *const T>);

            impl<T: Expression + ?Sized> Predicate for $name<T> {
                const VALUE: bool = T::$flag;
            }
        )*
    };
}

expression_predicate! {
    /// The type is an expression node
    IsExpression => IS_EXPRESSION,
    /// Element access of the type performs a computation
    IsComputation => IS_COMPUTATION,
    /// The type must be materialized before being assigned from
    RequiresEvaluation => REQUIRES_EVALUATION,
    /// The type supports vectorized loads
    SimdEnabled => SIMD_ENABLED,
    /// The type may be assigned from multiple threads
    SmpAssignable => SMP_ASSIGNABLE,
    /// The type exposes contiguous storage
    HasConstDataAccess => HAS_CONST_DATA_ACCESS,
}

/// Operand is materialized before kernels run: computation or evaluation required
pub type NeedsMaterialization<T> = Or<IsComputation<T>, RequiresEvaluation<T>>;

pub struct IsRowMajor<M: ?Sized>(PhantomData<fn() -> *const M>);
pub struct IsDenseMatrix<M: ?Sized>(PhantomData<fn() -> *const M>);
pub struct IsSparseMatrix<M: ?Sized>(PhantomData<fn() -> *const M>);
pub struct IsDenseVector<V: ?Sized>(PhantomData<fn() -> *const V>);
pub struct IsSparseVector<V: ?Sized>(PhantomData<fn() -> *const V>);
pub struct IsTransposeVector<V: ?Sized>(PhantomData<fn() -> *const V>);

impl<M: Matrix + ?Sized> Predicate for IsRowMajor<M> {
    const VALUE: bool = M::Order::IS_ROW_MAJOR;
}

impl<M: Matrix + ?Sized> Predicate for IsDenseMatrix<M> {
    const VALUE: bool = matches!(M::DENSITY, Density::Dense);
}

impl<M: Matrix + ?Sized> Predicate for IsSparseMatrix<M> {
    const VALUE: bool = matches!(M::DENSITY, Density::Sparse);
}

impl<V: Vector + ?Sized> Predicate for IsDenseVector<V> {
    const VALUE: bool = matches!(V::DENSITY, Density::Dense);
}

impl<V: Vector + ?Sized> Predicate for IsSparseVector<V> {
    const VALUE: bool = matches!(V::DENSITY, Density::Sparse);
}

impl<V: Vector + ?Sized> Predicate for IsTransposeVector<V> {
    const VALUE: bool = <V::Transpose as crate::traits::order::TransposeFlag>::IS_TRANSPOSED;
}

/// `T` is exactly `f32`
pub struct IsFloat<T>(PhantomData<fn() -> T>);
/// `T` is a real floating point type
pub struct IsFloatingPoint<T>(PhantomData<fn() -> T>);
/// `T` is a built-in (non-complex) numeric type
pub struct IsBuiltin<T>(PhantomData<fn() -> T>);
/// `T` is a complex number
pub struct IsComplex<T>(PhantomData<fn() -> T>);
/// `T` owns resizable storage
pub struct IsResizable<T>(PhantomData<fn() -> T>);
/// A vectorized division `T1 / T2` is available
pub struct HasSimdDiv<T1, T2>(PhantomData<fn() -> (T1, T2)>);

impl<T: Element> Predicate for IsFloat<T> {
    const VALUE: bool = matches!(T::KIND, crate::ElementKind::F32);
}

impl<T: Element> Predicate for IsFloatingPoint<T> {
    const VALUE: bool = T::KIND.is_floating_point();
}

impl<T: Element> Predicate for IsBuiltin<T> {
    const VALUE: bool = T::IS_BUILTIN;
}

impl<T: Element> Predicate for IsComplex<T> {
    const VALUE: bool = T::KIND.is_complex();
}

impl<T: Element> Predicate for IsResizable<T> {
    const VALUE: bool = T::IS_RESIZABLE;
}

impl<T1: Element, T2: Element> Predicate for HasSimdDiv<T1, T2> {
    const VALUE: bool = has_simd_div(T1::KIND, T2::KIND);
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    struct Leaf;

    impl Expression for Leaf {
        const SMP_ASSIGNABLE: bool = true;
        const HAS_CONST_DATA_ACCESS: bool = true;
    }

    struct Computation;

    impl Expression for Computation {
        const IS_EXPRESSION: bool = true;
        const IS_COMPUTATION: bool = true;
    }

    #[test]
    fn test_conservative_defaults() {
        assert!(!<IsComputation<Leaf>>::VALUE);
        assert!(!<RequiresEvaluation<Leaf>>::VALUE);
        assert!(!<SimdEnabled<Leaf>>::VALUE);
        assert!(<SmpAssignable<Leaf>>::VALUE);
        assert!(!<IsExpression<Leaf>>::VALUE);
    }

    #[test]
    fn test_combinators() {
        assert!(<NeedsMaterialization<Computation>>::VALUE);
        assert!(!<NeedsMaterialization<Leaf>>::VALUE);
        assert!(<And<HasConstDataAccess<Leaf>, Not<IsExpression<Leaf>>>>::VALUE);
        assert!(!<And<True, False>>::VALUE);
        assert!(<Or<False, IsComputation<&Computation>>>::VALUE);
    }

    #[test]
    fn test_element_predicates() {
        assert!(<IsFloat<f32>>::VALUE);
        assert!(!<IsFloat<f64>>::VALUE);
        assert!(!<IsFloat<Complex<f32>>>::VALUE);
        assert!(<IsFloatingPoint<f64>>::VALUE);
        assert!(!<IsFloatingPoint<i32>>::VALUE);
        assert!(<IsBuiltin<i64>>::VALUE);
        assert!(!<IsBuiltin<Complex<f64>>>::VALUE);
        assert!(<IsComplex<Complex<f64>>>::VALUE);
        assert!(!<IsResizable<f64>>::VALUE);
        assert!(!<HasSimdDiv<i32, i32>>::VALUE);
        assert!(!<HasSimdDiv<f64, f32>>::VALUE);
    }
}
