//! Transposed view
//!
//! Transposition only relabels the storage order: the major lines of the
//! operand become the major lines of the view.

use etla_core::simd::Pack;
use etla_core::{
    Address, DenseMatrix, Density, Expression, KernelConfig, Matrix, SparseMatrix, StorageOrder,
    Structure,
};

use crate::assign::{Evaluate, MatrixAssign};
use crate::storage::DynamicMatrix;

#[derive(Debug, Clone, Copy)]
pub struct Trans<M> {
    operand: M,
}

impl<M: Matrix> Trans<M> {
    pub fn new(operand: M) -> Self {
        Self { operand }
    }

    pub fn operand(&self) -> &M {
        &self.operand
    }
}

/// Transpose of a matrix operand
pub fn trans<M: Matrix>(operand: M) -> Trans<M> {
    Trans::new(operand)
}

impl<M: Matrix> Expression for Trans<M> {
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = M::IS_COMPUTATION;
    const REQUIRES_EVALUATION: bool = M::REQUIRES_EVALUATION;
    const SIMD_ENABLED: bool = M::SIMD_ENABLED;
    const SMP_ASSIGNABLE: bool = M::SMP_ASSIGNABLE;
    const HAS_CONST_DATA_ACCESS: bool = M::HAS_CONST_DATA_ACCESS;

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

impl<M: Matrix> Matrix for Trans<M> {
    type Element = M::Element;
    type Order = <M::Order as StorageOrder>::Opposite;

    const DENSITY: Density = M::DENSITY;

    fn rows(&self) -> usize {
        self.operand.columns()
    }

    fn columns(&self) -> usize {
        self.operand.rows()
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> Self::Element {
        self.operand.get(j, i)
    }

    fn structure(&self) -> Structure {
        self.operand.structure().transposed()
    }
}

impl<M: DenseMatrix> DenseMatrix for Trans<M> {
    fn data(&self) -> Option<&[Self::Element]> {
        self.operand.data()
    }

    fn load(&self, i: usize, j: usize) -> Pack<Self::Element> {
        self.operand.load(j, i)
    }
}

impl<M: SparseMatrix> SparseMatrix for Trans<M> {
    type MajorIter<'a> = M::MajorIter<'a> where Self: 'a;

    fn major(&self, i: usize) -> Self::MajorIter<'_> {
        self.operand.major(i)
    }

    fn major_non_zeros(&self, i: usize) -> usize {
        self.operand.major_non_zeros(i)
    }

    fn non_zeros(&self) -> usize {
        self.operand.non_zeros()
    }
}

impl<M: MatrixAssign> MatrixAssign for Trans<M> {}

impl<M: MatrixAssign> Evaluate for Trans<M> {
    type Output = DynamicMatrix<M::Element, <M::Order as StorageOrder>::Opposite>;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output {
        DynamicMatrix::evaluated(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CompressedMatrix;
    use etla_core::{ColumnMajor, RowMajor};

    #[test]
    fn test_transposed_view() {
        let a = DynamicMatrix::<f64, RowMajor>::from_fn(2, 3, |i, j| (10 * i + j) as f64);
        let t = trans(&a);
        assert_eq!((t.rows(), t.columns()), (3, 2));
        assert_eq!(t.get(2, 1), 12.0);
        assert!(!<Trans<&DynamicMatrix<f64, RowMajor>> as Matrix>::Order::IS_ROW_MAJOR);
        assert_eq!(t.data(), a.data());
        assert_eq!(t.load(0, 1), a.load(1, 0));
    }

    #[test]
    fn test_transposed_sparse_lines() {
        let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(3, 2, &[(2, 0, 1.0), (0, 1, 2.0)]).unwrap();
        let t = trans(&a);
        assert_eq!(t.major(0).collect::<Vec<_>>(), vec![(2, 1.0)]);
        assert_eq!(t.get(0, 2), 1.0);
        assert_eq!(t.get(1, 0), 2.0);
    }

    #[test]
    fn test_transposed_structure() {
        let lower = DynamicMatrix::<f64, RowMajor>::from_row_slice(2, 2, &[1.0, 0.0, 2.0, 1.0])
            .unwrap()
            .with_structure(Structure::UNI_LOWER)
            .unwrap();
        assert!(trans(&lower).structure().is_uni_upper());
    }
}
