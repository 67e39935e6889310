//! Structure declarations
//!
//! `declsym`, `declherm`, `decllow`, `declupp` and `decldiag` assert a
//! structural property of a square operand without checking the data.
//! A declaration the operand already satisfies returns the operand
//! itself, and a uni-triangular operand declared symmetric, Hermitian or
//! diagonal collapses to the identity.

use std::ops::Range;

use etla_core::simd::Pack;
use etla_core::{
    check_square, Address, DeclKind, DenseMatrix, DenseMatrixMut, Density, Element, Expression,
    KernelConfig, Matrix, Result, SparseMatrix, Structure,
};

use crate::assign::{self, CombineMode, Evaluate, MatrixAssign};
use crate::expr::scalar::MatScalar;
use crate::storage::{DynamicMatrix, IdentityMatrix};

/// Operand wrapped with a declared structural property
#[derive(Debug, Clone, Copy)]
pub struct DeclExpr<M> {
    operand: M,
    kind: DeclKind,
}

impl<M: Matrix> DeclExpr<M> {
    fn new(operand: M, kind: DeclKind) -> Self {
        Self { operand, kind }
    }

    pub fn operand(&self) -> &M {
        &self.operand
    }

    pub fn kind(&self) -> DeclKind {
        self.kind
    }
}

impl<M: Matrix> Expression for DeclExpr<M> {
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

impl<M: Matrix> Matrix for DeclExpr<M> {
    type Element = M::Element;
    type Order = M::Order;

    const DENSITY: Density = M::DENSITY;

    fn rows(&self) -> usize {
        self.operand.rows()
    }

    fn columns(&self) -> usize {
        self.operand.columns()
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> M::Element {
        self.operand.get(i, j)
    }

    fn structure(&self) -> Structure {
        let declared = self.operand.structure().declare(self.kind);
        if self.kind == DeclKind::Hermitian && <M::Element as Element>::IS_BUILTIN {
            declared.union(Structure::SYMMETRIC)
        } else {
            declared
        }
    }
}

impl<M: DenseMatrix> DenseMatrix for DeclExpr<M> {
    fn data(&self) -> Option<&[M::Element]> {
        self.operand.data()
    }

    fn load(&self, i: usize, j: usize) -> Pack<M::Element> {
        self.operand.load(i, j)
    }
}

impl<M: SparseMatrix> SparseMatrix for DeclExpr<M> {
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

impl<M: MatrixAssign> MatrixAssign for DeclExpr<M> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = M::Element>,
    {
        if M::REQUIRES_EVALUATION || M::DENSITY == Density::Sparse {
            self.operand.assign_to(target, mode, config);
        } else {
            assign::assign_elementwise(self, target, mode);
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
        C: DenseMatrixMut<Element = M::Element>,
    {
        self.operand.assign_block_to(target, rows, columns, mode, config);
    }
}

impl<M: MatrixAssign> Evaluate for DeclExpr<M> {
    type Output = DynamicMatrix<M::Element, M::Order>;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output {
        DynamicMatrix::evaluated(self, config)
    }
}

/// Result of declaring a structure on a borrowed operand
#[derive(Debug, Clone, Copy)]
pub enum Declared<M: Matrix> {
    /// The operand already satisfies the declaration
    Alias(M),
    /// Uni-triangular operand collapsed to the identity
    Identity(IdentityMatrix<M::Element, M::Order>),
    Wrapped(DeclExpr<M>),
}

impl<M: Matrix> Declared<M> {
    pub fn is_alias(&self) -> bool {
        matches!(self, Declared::Alias(_))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Declared::Identity(_))
    }
}

impl<M: Matrix> Expression for Declared<M> {
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = M::IS_COMPUTATION;
    const REQUIRES_EVALUATION: bool = M::REQUIRES_EVALUATION;
    const SMP_ASSIGNABLE: bool = M::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        match self {
            Declared::Alias(operand) => operand.can_alias(alias),
            Declared::Identity(_) => false,
            Declared::Wrapped(wrapped) => wrapped.can_alias(alias),
        }
    }

    fn is_aliased(&self, alias: Address) -> bool {
        match self {
            Declared::Alias(operand) => operand.is_aliased(alias),
            Declared::Identity(_) => false,
            Declared::Wrapped(wrapped) => wrapped.is_aliased(alias),
        }
    }

    fn is_aligned(&self) -> bool {
        match self {
            Declared::Alias(operand) => operand.is_aligned(),
            Declared::Identity(_) => false,
            Declared::Wrapped(wrapped) => wrapped.is_aligned(),
        }
    }

    fn can_smp_assign(&self) -> bool {
        match self {
            Declared::Alias(operand) => operand.can_smp_assign(),
            Declared::Identity(_) => false,
            Declared::Wrapped(wrapped) => wrapped.can_smp_assign(),
        }
    }
}

impl<M: Matrix> Matrix for Declared<M> {
    type Element = M::Element;
    type Order = M::Order;

    const DENSITY: Density = M::DENSITY;

    fn rows(&self) -> usize {
        match self {
            Declared::Alias(operand) => operand.rows(),
            Declared::Identity(identity) => identity.rows(),
            Declared::Wrapped(wrapped) => wrapped.rows(),
        }
    }

    fn columns(&self) -> usize {
        self.rows()
    }

    fn get(&self, i: usize, j: usize) -> M::Element {
        match self {
            Declared::Alias(operand) => operand.get(i, j),
            Declared::Identity(identity) => identity.get(i, j),
            Declared::Wrapped(wrapped) => wrapped.get(i, j),
        }
    }

    fn structure(&self) -> Structure {
        match self {
            Declared::Alias(operand) => operand.structure(),
            Declared::Identity(identity) => identity.structure(),
            Declared::Wrapped(wrapped) => wrapped.structure(),
        }
    }
}

impl<M: DenseMatrix> DenseMatrix for Declared<M> {
    fn data(&self) -> Option<&[M::Element]> {
        match self {
            Declared::Alias(operand) => operand.data(),
            Declared::Identity(_) => None,
            Declared::Wrapped(wrapped) => wrapped.data(),
        }
    }
}

/// Non-zeros of a major line of a [`Declared`] sparse operand
#[derive(Debug, Clone)]
pub enum DeclaredIter<I, T> {
    Operand(I),
    Identity(std::iter::Once<(usize, T)>),
}

impl<T, I: Iterator<Item = (usize, T)>> Iterator for DeclaredIter<I, T> {
    type Item = (usize, T);

    fn next(&mut self) -> Option<(usize, T)> {
        match self {
            DeclaredIter::Operand(inner) => inner.next(),
            DeclaredIter::Identity(inner) => inner.next(),
        }
    }
}

impl<M: SparseMatrix> SparseMatrix for Declared<M> {
    type MajorIter<'a> = DeclaredIter<M::MajorIter<'a>, M::Element> where Self: 'a;

    fn major(&self, i: usize) -> Self::MajorIter<'_> {
        match self {
            Declared::Alias(operand) => DeclaredIter::Operand(operand.major(i)),
            Declared::Identity(identity) => DeclaredIter::Identity(identity.major(i)),
            Declared::Wrapped(wrapped) => DeclaredIter::Operand(wrapped.major(i)),
        }
    }
}

impl<M: MatrixAssign> MatrixAssign for Declared<M> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = M::Element>,
    {
        match self {
            Declared::Alias(operand) => operand.assign_to(target, mode, config),
            Declared::Identity(identity) => identity.assign_to(target, mode, config),
            Declared::Wrapped(wrapped) => wrapped.assign_to(target, mode, config),
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
        C: DenseMatrixMut<Element = M::Element>,
    {
        match self {
            Declared::Alias(operand) => operand.assign_block_to(target, rows, columns, mode, config),
            Declared::Identity(identity) => identity.assign_block_to(target, rows, columns, mode, config),
            Declared::Wrapped(wrapped) => wrapped.assign_block_to(target, rows, columns, mode, config),
        }
    }
}

impl<M: MatrixAssign> Evaluate for Declared<M> {
    type Output = DynamicMatrix<M::Element, M::Order>;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output {
        DynamicMatrix::evaluated(self, config)
    }
}

/// Operands accepting a structure declaration
pub trait Declare: Sized {
    type Output;

    /// Fails with `NotSquare` for non-square operands
    fn declare(self, kind: DeclKind) -> Result<Self::Output>;
}

impl<'a, M: Matrix> Declare for &'a M {
    type Output = Declared<&'a M>;

    fn declare(self, kind: DeclKind) -> Result<Self::Output> {
        check_square(self.rows(), self.columns())?;
        let structure = self.structure();
        let satisfied = kind.is_satisfied_by(structure)
            || (kind == DeclKind::Hermitian && <M::Element as Element>::IS_BUILTIN && structure.is_symmetric());
        if satisfied {
            return Ok(Declared::Alias(self));
        }
        if kind.collapses_uni_triangular() && structure.is_uni_triangular() {
            return Ok(Declared::Identity(IdentityMatrix::new(self.rows())));
        }
        Ok(Declared::Wrapped(DeclExpr::new(self, kind)))
    }
}

/// `decl(M * s) = decl(M) * s`
impl<T, M> Declare for MatScalar<M, T>
where
    T: Element,
    M: Matrix<Element = T> + Declare,
    M::Output: Matrix<Element = T>,
{
    type Output = MatScalar<M::Output, T>;

    fn declare(self, kind: DeclKind) -> Result<Self::Output> {
        let (operand, scalar, op) = self.into_parts();
        Ok(MatScalar::from_parts(operand.declare(kind)?, scalar, op))
    }
}

/// Declare the operand symmetric
pub fn declsym<X: Declare>(operand: X) -> Result<X::Output> {
    operand.declare(DeclKind::Symmetric)
}

/// Declare the operand Hermitian
pub fn declherm<X: Declare>(operand: X) -> Result<X::Output> {
    operand.declare(DeclKind::Hermitian)
}

/// Declare the operand lower triangular
pub fn decllow<X: Declare>(operand: X) -> Result<X::Output> {
    operand.declare(DeclKind::Lower)
}

/// Declare the operand upper triangular
pub fn declupp<X: Declare>(operand: X) -> Result<X::Output> {
    operand.declare(DeclKind::Upper)
}

/// Declare the operand diagonal
pub fn decldiag<X: Declare>(operand: X) -> Result<X::Output> {
    operand.declare(DeclKind::Diagonal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CompressedMatrix;
    use etla_core::{ColumnMajor, EtlaError, RowMajor};
    use num_complex::Complex;

    #[test]
    fn test_non_square_is_rejected() {
        let a = DynamicMatrix::<f64, RowMajor>::new(2, 3);
        assert_eq!(
            declsym(&a).unwrap_err(),
            EtlaError::NotSquare { rows: 2, columns: 3 }
        );
        assert!(decldiag(&a).is_err());
    }

    #[test]
    fn test_symmetric_operand_is_returned_as_is() {
        let a = DynamicMatrix::<f64, RowMajor>::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0])
            .unwrap()
            .with_structure(Structure::SYMMETRIC)
            .unwrap();
        match declsym(&a).unwrap() {
            Declared::Alias(operand) => assert!(std::ptr::eq(operand, &a)),
            other => panic!("expected alias, got {other:?}"),
        }
        assert!(declherm(&a).unwrap().is_alias());
    }

    #[test]
    fn test_uni_triangular_collapses_to_identity() {
        let a = DynamicMatrix::<f64, RowMajor>::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 5.0, 1.0, 0.0, 6.0, 7.0, 1.0])
            .unwrap()
            .with_structure(Structure::UNI_LOWER)
            .unwrap();
        let declared = declsym(&a).unwrap();
        assert!(declared.is_identity());
        assert_eq!(declared.get(1, 0), 0.0);
        assert_eq!(declared.get(2, 2), 1.0);
        assert!(decldiag(&a).unwrap().is_identity());
        assert!(decllow(&a).unwrap().is_alias());
        assert!(!declupp(&a).unwrap().is_identity());
    }

    #[test]
    fn test_wrapper_asserts_declared_flags() {
        let a = DynamicMatrix::<f64, ColumnMajor>::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
        let declared = declsym(&a).unwrap();
        assert!(matches!(declared, Declared::Wrapped(_)));
        assert!(declared.structure().is_symmetric());
        assert_eq!(declared.get(0, 2), a.get(0, 2));
        assert_eq!(declared.data(), a.data());
        assert_eq!(declared.evaluate(), a);

        assert!(declherm(&a).unwrap().structure().is_symmetric());
        let z = DynamicMatrix::<Complex<f64>, RowMajor>::new(2, 2);
        let herm = declherm(&z).unwrap();
        assert!(herm.structure().is_hermitian());
        assert!(!herm.structure().is_symmetric());
        assert!(decldiag(&a).unwrap().structure().is_diagonal());
    }

    #[test]
    fn test_declared_sparse_operand() {
        let a = CompressedMatrix::<f64, RowMajor>::from_triplets(2, 2, &[(0, 1, 3.0), (1, 0, 3.0)]).unwrap();
        let declared = declsym(&a).unwrap();
        assert_eq!(declared.major(1).collect::<Vec<_>>(), vec![(0, 3.0)]);
        let mut c = DynamicMatrix::<f64, RowMajor>::new(2, 2);
        c.assign(&declared).unwrap();
        assert_eq!(c.as_slice(), &[0.0, 3.0, 3.0, 0.0]);
    }

    #[test]
    fn test_declaration_moves_inside_scalar_multiplication() {
        let a = DynamicMatrix::<f64, RowMajor>::from_fn(2, 2, |i, j| (i + 2 * j) as f64);
        let scaled = declsym(MatScalar::mult(&a, 2.0)).unwrap();
        assert!(matches!(scaled.operand(), Declared::Wrapped(_)));
        assert!(scaled.structure().is_symmetric());
        assert_eq!(scaled.get(0, 1), 4.0);
    }
}
