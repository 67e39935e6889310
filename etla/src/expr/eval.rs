//! Forced evaluation
//!
//! Wrapping an operand in [`Eval`] marks it as requiring evaluation: nodes
//! above it materialize it once instead of reading it element by element.

use std::ops::Range;

use etla_core::simd::Pack;
use etla_core::{
    Address, DenseMatrix, DenseMatrixMut, DenseVector, DenseVectorMut, Density, Expression,
    KernelConfig, Matrix, SparseMatrix, SparseVector, Structure, Vector,
};

use crate::assign::{CombineMode, Evaluate, MatrixAssign, VectorAssign};

#[derive(Debug, Clone, Copy)]
pub struct Eval<X> {
    operand: X,
}

/// Mark an operand for evaluation before use
pub fn eval<X: Expression>(operand: X) -> Eval<X> {
    Eval { operand }
}

impl<X> Eval<X> {
    pub fn operand(&self) -> &X {
        &self.operand
    }
}

impl<X: Expression> Expression for Eval<X> {
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = X::IS_COMPUTATION;
    const REQUIRES_EVALUATION: bool = true;
    const SMP_ASSIGNABLE: bool = X::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        self.operand.can_alias(alias)
    }

    fn is_aliased(&self, alias: Address) -> bool {
        self.operand.is_aliased(alias)
    }

    fn can_smp_assign(&self) -> bool {
        self.operand.can_smp_assign()
    }
}

impl<X: Vector> Vector for Eval<X> {
    type Element = X::Element;
    type Transpose = X::Transpose;

    const DENSITY: Density = X::DENSITY;

    fn size(&self) -> usize {
        self.operand.size()
    }

    fn get(&self, i: usize) -> X::Element {
        self.operand.get(i)
    }
}

impl<X: DenseVector> DenseVector for Eval<X> {
    type Iter<'a> = X::Iter<'a> where Self: 'a;

    fn iter(&self) -> Self::Iter<'_> {
        self.operand.iter()
    }

    fn load(&self, i: usize) -> Pack<X::Element> {
        self.operand.load(i)
    }
}

impl<X: SparseVector> SparseVector for Eval<X> {
    type NonZeroIter<'a> = X::NonZeroIter<'a> where Self: 'a;

    fn non_zero_iter(&self) -> Self::NonZeroIter<'_> {
        self.operand.non_zero_iter()
    }
}

impl<X: VectorAssign> VectorAssign for Eval<X> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode)
    where
        C: DenseVectorMut<Element = X::Element>,
    {
        self.operand.assign_to(target, mode);
    }

    fn assign_range_to(&self, target: &mut [X::Element], offset: usize, mode: CombineMode) {
        self.operand.assign_range_to(target, offset, mode);
    }
}

impl<X: Matrix> Matrix for Eval<X> {
    type Element = X::Element;
    type Order = X::Order;

    const DENSITY: Density = X::DENSITY;

    fn rows(&self) -> usize {
        self.operand.rows()
    }

    fn columns(&self) -> usize {
        self.operand.columns()
    }

    fn get(&self, i: usize, j: usize) -> X::Element {
        self.operand.get(i, j)
    }

    fn structure(&self) -> Structure {
        self.operand.structure()
    }
}

impl<X: DenseMatrix> DenseMatrix for Eval<X> {
    fn load(&self, i: usize, j: usize) -> Pack<X::Element> {
        self.operand.load(i, j)
    }
}

impl<X: SparseMatrix> SparseMatrix for Eval<X> {
    type MajorIter<'a> = X::MajorIter<'a> where Self: 'a;

    fn major(&self, i: usize) -> Self::MajorIter<'_> {
        self.operand.major(i)
    }
}

impl<X: MatrixAssign> MatrixAssign for Eval<X> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = X::Element>,
    {
        self.operand.assign_to(target, mode, config);
    }

    fn assign_block_to<C>(
        &self,
        target: &mut C,
        rows: Range<usize>,
        columns: Range<usize>,
        mode: CombineMode,
        config: &KernelConfig,
    ) where
        C: DenseMatrixMut<Element = X::Element>,
    {
        self.operand.assign_block_to(target, rows, columns, mode, config);
    }
}

impl<X: Evaluate> Evaluate for Eval<X> {
    type Output = X::Output;

    fn evaluate_with(&self, config: &KernelConfig) -> Self::Output {
        self.operand.evaluate_with(config)
    }
}
