//! Operator entry points
//!
//! Each function resolves the operand combination, validates the shapes
//! and returns the lazy node. Nothing is computed until the node is
//! assigned to a container.

use etla_core::{
    resolve, EtlaError, Matrix, OperandDescriptor, Operation, Resolved, Result, SparseMatrix,
    SparseVector, DenseMatrix, DenseVector, Vector,
};

use crate::expr::{MatMatMap2, MatScalar, Minus, Plus, SMatDMatMult, SVecDVecSub, Times, VecScalar, VecVecMap2};

/// Fail with `UnsupportedOperation` when the combination has no result type
pub(crate) fn require(op: Operation, lhs: OperandDescriptor, rhs: OperandDescriptor) -> Result<Resolved> {
    match resolve::resolve(op, lhs, rhs) {
        Resolved::Invalid => Err(EtlaError::UnsupportedOperation),
        resolved => Ok(resolved),
    }
}

/// `lhs + rhs` for matrices of equal shape
pub fn add<L, R>(lhs: L, rhs: R) -> Result<MatMatMap2<L, R, Plus>>
where
    L: Matrix,
    R: Matrix<Element = L::Element>,
{
    require(Operation::Add, OperandDescriptor::of_matrix::<L>(), OperandDescriptor::of_matrix::<R>())?;
    MatMatMap2::new(lhs, rhs)
}

/// `lhs - rhs` for matrices of equal shape
pub fn sub<L, R>(lhs: L, rhs: R) -> Result<MatMatMap2<L, R, Minus>>
where
    L: Matrix,
    R: Matrix<Element = L::Element>,
{
    require(Operation::Sub, OperandDescriptor::of_matrix::<L>(), OperandDescriptor::of_matrix::<R>())?;
    MatMatMap2::new(lhs, rhs)
}

/// Schur (elementwise) product of matrices of equal shape
pub fn schur<L, R>(lhs: L, rhs: R) -> Result<MatMatMap2<L, R, Times>>
where
    L: Matrix,
    R: Matrix<Element = L::Element>,
{
    require(Operation::Schur, OperandDescriptor::of_matrix::<L>(), OperandDescriptor::of_matrix::<R>())?;
    MatMatMap2::new(lhs, rhs)
}

/// Sparse times dense matrix product
///
/// Fails with `ShapeMismatch` unless `lhs.columns() == rhs.rows()`.
pub fn mult<L, R>(lhs: L, rhs: R) -> Result<SMatDMatMult<L, R>>
where
    L: SparseMatrix,
    R: DenseMatrix<Element = L::Element>,
{
    require(Operation::Mult, OperandDescriptor::of_matrix::<L>(), OperandDescriptor::of_matrix::<R>())?;
    SMatDMatMult::new(lhs, rhs)
}

/// `operand * scalar`
pub fn scale<M: Matrix>(operand: M, scalar: M::Element) -> Result<MatScalar<M, M::Element>> {
    require(
        Operation::Mult,
        OperandDescriptor::of_matrix::<M>(),
        OperandDescriptor::of_scalar::<M::Element>(),
    )?;
    Ok(MatScalar::mult(operand, scalar))
}

/// `operand / scalar`; real floating point elements multiply by the reciprocal
pub fn div<M: Matrix>(operand: M, scalar: M::Element) -> Result<MatScalar<M, M::Element>> {
    require(
        Operation::Div,
        OperandDescriptor::of_matrix::<M>(),
        OperandDescriptor::of_scalar::<M::Element>(),
    )?;
    Ok(MatScalar::div(operand, scalar))
}

pub fn vec_add<L, R>(lhs: L, rhs: R) -> Result<VecVecMap2<L, R, Plus>>
where
    L: Vector,
    R: Vector<Element = L::Element, Transpose = L::Transpose>,
{
    require(Operation::Add, OperandDescriptor::of_vector::<L>(), OperandDescriptor::of_vector::<R>())?;
    VecVecMap2::new(lhs, rhs)
}

pub fn vec_sub<L, R>(lhs: L, rhs: R) -> Result<VecVecMap2<L, R, Minus>>
where
    L: Vector,
    R: Vector<Element = L::Element, Transpose = L::Transpose>,
{
    require(Operation::Sub, OperandDescriptor::of_vector::<L>(), OperandDescriptor::of_vector::<R>())?;
    VecVecMap2::new(lhs, rhs)
}

/// Componentwise product of vectors with the same orientation
pub fn vec_mult<L, R>(lhs: L, rhs: R) -> Result<VecVecMap2<L, R, Times>>
where
    L: Vector,
    R: Vector<Element = L::Element, Transpose = L::Transpose>,
{
    require(Operation::Mult, OperandDescriptor::of_vector::<L>(), OperandDescriptor::of_vector::<R>())?;
    VecVecMap2::new(lhs, rhs)
}

/// Sparse minus dense vector
pub fn sparse_dense_sub<L, R>(lhs: L, rhs: R) -> Result<SVecDVecSub<L, R>>
where
    L: SparseVector,
    R: DenseVector<Element = L::Element, Transpose = L::Transpose>,
{
    require(Operation::Sub, OperandDescriptor::of_vector::<L>(), OperandDescriptor::of_vector::<R>())?;
    SVecDVecSub::new(lhs, rhs)
}

pub fn vec_scale<V: Vector>(operand: V, scalar: V::Element) -> Result<VecScalar<V, V::Element>> {
    require(
        Operation::Mult,
        OperandDescriptor::of_vector::<V>(),
        OperandDescriptor::of_scalar::<V::Element>(),
    )?;
    Ok(VecScalar::mult(operand, scalar))
}

pub fn vec_div<V: Vector>(operand: V, scalar: V::Element) -> Result<VecScalar<V, V::Element>> {
    require(
        Operation::Div,
        OperandDescriptor::of_vector::<V>(),
        OperandDescriptor::of_scalar::<V::Element>(),
    )?;
    Ok(VecScalar::div(operand, scalar))
}
