//! Implicit identity matrix

use std::iter::Once;
use std::marker::PhantomData;

use etla_core::{
    DenseMatrixMut, Density, Element, Expression, KernelConfig, Matrix, RowMajor, SparseMatrix,
    StorageOrder, Structure,
};

use crate::assign::{CombineMode, MatrixAssign};

/// `n x n` identity without element storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityMatrix<T, SO = RowMajor> {
    n: usize,
    marker: PhantomData<(T, SO)>,
}

impl<T: Element, SO: StorageOrder> IdentityMatrix<T, SO> {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            marker: PhantomData,
        }
    }
}

impl<T: Element, SO: StorageOrder> Expression for IdentityMatrix<T, SO> {
    const SMP_ASSIGNABLE: bool = true;
}

impl<T: Element, SO: StorageOrder> Matrix for IdentityMatrix<T, SO> {
    type Element = T;
    type Order = SO;

    const DENSITY: Density = Density::Sparse;

    fn rows(&self) -> usize {
        self.n
    }

    fn columns(&self) -> usize {
        self.n
    }

    fn get(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.n && j < self.n, "Invalid matrix access index");
        if i == j {
            T::one()
        } else {
            T::zero()
        }
    }

    fn structure(&self) -> Structure {
        Structure::IDENTITY
    }
}

impl<T: Element, SO: StorageOrder> SparseMatrix for IdentityMatrix<T, SO> {
    type MajorIter<'a> = Once<(usize, T)> where Self: 'a;

    fn major(&self, i: usize) -> Self::MajorIter<'_> {
        std::iter::once((i, T::one()))
    }

    fn major_non_zeros(&self, _i: usize) -> usize {
        1
    }

    fn non_zeros(&self) -> usize {
        self.n
    }
}

impl<T: Element, SO: StorageOrder> MatrixAssign for IdentityMatrix<T, SO> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, _config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = T>,
    {
        crate::assign::assign_sparse(self, target, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DynamicMatrix;

    #[test]
    fn test_identity_access() {
        let identity = IdentityMatrix::<f64, RowMajor>::new(3);
        assert_eq!(identity.get(1, 1), 1.0);
        assert_eq!(identity.get(1, 2), 0.0);
        assert_eq!(identity.non_zeros(), 3);
        assert!(identity.structure().is_identity());
        assert!(identity.structure().is_symmetric());
    }

    #[test]
    fn test_identity_assign() {
        let identity = IdentityMatrix::<i32, RowMajor>::new(2);
        let mut target = DynamicMatrix::<i32, RowMajor>::from_fn(2, 2, |_, _| 5);
        identity.assign_to(&mut target, CombineMode::Add, &KernelConfig::default());
        assert_eq!(target.as_slice(), &[6, 5, 5, 6]);
    }
}
