//! Vector and matrix norms
//!
//! Every norm folds over the stored values only. Implicit zeros of sparse
//! operands contribute nothing to any of the supported norms, so sparse
//! containers are visited through their non-zero iterators. Expression
//! nodes are evaluated first (`norm(&expr.evaluate())`).

use etla_core::{Element, SparseMatrix, SparseVector, StorageOrder, TransposeFlag};
use num_complex::Complex;

use crate::storage::{CompressedMatrix, CompressedVector, DynamicMatrix, DynamicVector, IdentityMatrix};

/// Elements with an absolute value
pub trait Magnitude: Element {
    fn abs_value(self) -> f64;

    /// Square of the absolute value
    fn sqr_abs(self) -> f64 {
        let abs = self.abs_value();
        abs * abs
    }
}

macro_rules! impl_real_magnitude {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Magnitude for $ty {
                #[inline]
                fn abs_value(self) -> f64 {
                    (self as f64).abs()
                }
            }
        )*
    };
}

impl_real_magnitude!(f32, f64, i32, i64, u32, u64);

impl Magnitude for Complex<f32> {
    fn abs_value(self) -> f64 {
        self.sqr_abs().sqrt()
    }

    fn sqr_abs(self) -> f64 {
        f64::from(self.norm_sqr())
    }
}

impl Magnitude for Complex<f64> {
    fn abs_value(self) -> f64 {
        self.norm()
    }

    fn sqr_abs(self) -> f64 {
        self.norm_sqr()
    }
}

/// Operands whose stored values can be folded
pub trait NormOperand {
    type Element: Magnitude;

    fn fold_values<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, Self::Element) -> B;
}

impl<X: NormOperand + ?Sized> NormOperand for &X {
    type Element = X::Element;

    fn fold_values<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, Self::Element) -> B,
    {
        (**self).fold_values(init, f)
    }
}

impl<T: Magnitude, TF: TransposeFlag> NormOperand for DynamicVector<T, TF> {
    type Element = T;

    fn fold_values<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, T) -> B,
    {
        self.as_slice().iter().copied().fold(init, f)
    }
}

impl<T: Magnitude, TF: TransposeFlag> NormOperand for CompressedVector<T, TF> {
    type Element = T;

    fn fold_values<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, T) -> B,
    {
        self.non_zero_iter().map(|(_, value)| value).fold(init, f)
    }
}

impl<T: Magnitude, SO: StorageOrder> NormOperand for DynamicMatrix<T, SO> {
    type Element = T;

    fn fold_values<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, T) -> B,
    {
        self.as_slice().iter().copied().fold(init, f)
    }
}

fn fold_sparse<M, B, F>(matrix: &M, init: B, f: F) -> B
where
    M: SparseMatrix,
    F: FnMut(B, M::Element) -> B,
{
    (0..matrix.major_len())
        .flat_map(|i| matrix.major(i))
        .map(|(_, value)| value)
        .fold(init, f)
}

impl<T: Magnitude, SO: StorageOrder> NormOperand for CompressedMatrix<T, SO> {
    type Element = T;

    fn fold_values<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, T) -> B,
    {
        fold_sparse(self, init, f)
    }
}

impl<T: Magnitude, SO: StorageOrder> NormOperand for IdentityMatrix<T, SO> {
    type Element = T;

    fn fold_values<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, T) -> B,
    {
        fold_sparse(self, init, f)
    }
}

/// Sum of the squared absolute values
pub fn sqr_norm<X: NormOperand>(operand: &X) -> f64 {
    operand.fold_values(0.0, |acc, value| acc + value.sqr_abs())
}

/// Euclidean (vectors) or Frobenius (matrices) norm
pub fn norm<X: NormOperand>(operand: &X) -> f64 {
    sqr_norm(operand).sqrt()
}

/// Sum of the absolute values
pub fn l1_norm<X: NormOperand>(operand: &X) -> f64 {
    operand.fold_values(0.0, |acc, value| acc + value.abs_value())
}

/// Largest absolute value; zero for empty operands
pub fn linf_norm<X: NormOperand>(operand: &X) -> f64 {
    operand.fold_values(0.0, |acc: f64, value| acc.max(value.abs_value()))
}
