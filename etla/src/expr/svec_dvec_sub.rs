//! Sparse vector minus dense vector

use etla_core::{
    check_same_size, Address, DenseVector, DenseVectorMut, Density, Element, Expression,
    KernelConfig, Result, SparseVector, Vector,
};

use crate::assign::{CombineMode, Evaluate, VectorAssign};
use crate::expr::binary::{Minus, Plus, VecVecMap2};
use crate::storage::DynamicVector;

/// `lhs - rhs` for a sparse `lhs` and a dense `rhs`
#[derive(Debug, Clone, Copy)]
pub struct SVecDVecSub<L, R> {
    lhs: L,
    rhs: R,
}

impl<T, L, R> SVecDVecSub<L, R>
where
    T: Element,
    L: SparseVector<Element = T>,
    R: DenseVector<Element = T, Transpose = L::Transpose>,
{
    pub fn new(lhs: L, rhs: R) -> Result<Self> {
        check_same_size(lhs.size(), rhs.size())?;
        Ok(Self { lhs, rhs })
    }

    /// `(a - b) + c` evaluated as `(c - b) + a`
    #[allow(clippy::type_complexity)]
    pub fn plus<C>(self, c: C) -> Result<VecVecMap2<VecVecMap2<C, R, Minus>, L, Plus>>
    where
        C: DenseVector<Element = T, Transpose = L::Transpose>,
    {
        VecVecMap2::new(VecVecMap2::new(c, self.rhs)?, self.lhs)
    }

    /// `(a - b) - c` evaluated as `a - (b + c)`
    pub fn minus<C>(self, c: C) -> Result<SVecDVecSub<L, VecVecMap2<R, C, Plus>>>
    where
        C: DenseVector<Element = T, Transpose = L::Transpose>,
    {
        SVecDVecSub::new(self.lhs, VecVecMap2::new(self.rhs, c)?)
    }
}

impl<T, L, R> Expression for SVecDVecSub<L, R>
where
    T: Element,
    L: SparseVector<Element = T>,
    R: DenseVector<Element = T, Transpose = L::Transpose>,
{
    const IS_EXPRESSION: bool = true;
    const IS_COMPUTATION: bool = true;
    const REQUIRES_EVALUATION: bool = L::REQUIRES_EVALUATION || R::REQUIRES_EVALUATION;
    const SMP_ASSIGNABLE: bool = L::SMP_ASSIGNABLE && R::SMP_ASSIGNABLE;

    fn can_alias(&self, alias: Address) -> bool {
        self.lhs.can_alias(alias) || self.rhs.can_alias(alias)
    }

    fn is_aliased(&self, alias: Address) -> bool {
        self.lhs.is_aliased(alias) || self.rhs.is_aliased(alias)
    }

    fn can_smp_assign(&self) -> bool {
        self.rhs.can_smp_assign()
    }
}

impl<T, L, R> Vector for SVecDVecSub<L, R>
where
    T: Element,
    L: SparseVector<Element = T>,
    R: DenseVector<Element = T, Transpose = L::Transpose>,
{
    type Element = T;
    type Transpose = L::Transpose;

    const DENSITY: Density = Density::Dense;

    fn size(&self) -> usize {
        self.lhs.size()
    }

    #[inline]
    fn get(&self, i: usize) -> T {
        self.lhs.get(i) - self.rhs.get(i)
    }
}

/// Differences in index order
#[derive(Debug)]
pub struct Differences<'a, L, R> {
    node: &'a SVecDVecSub<L, R>,
    index: usize,
}

impl<L, R> Clone for Differences<'_, L, R> {
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            index: self.index,
        }
    }
}

impl<T, L, R> Iterator for Differences<'_, L, R>
where
    T: Element,
    L: SparseVector<Element = T>,
    R: DenseVector<Element = T, Transpose = L::Transpose>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.index >= self.node.size() {
            return None;
        }
        let value = self.node.get(self.index);
        self.index += 1;
        Some(value)
    }
}

impl<T, L, R> DenseVector for SVecDVecSub<L, R>
where
    T: Element,
    L: SparseVector<Element = T>,
    R: DenseVector<Element = T, Transpose = L::Transpose>,
{
    type Iter<'a> = Differences<'a, L, R> where Self: 'a;

    fn iter(&self) -> Self::Iter<'_> {
        Differences { node: self, index: 0 }
    }
}

impl<T, L, R> VectorAssign for SVecDVecSub<L, R>
where
    T: Element,
    L: SparseVector<Element = T> + VectorAssign,
    R: DenseVector<Element = T, Transpose = L::Transpose> + VectorAssign,
{
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode)
    where
        C: DenseVectorMut<Element = T>,
    {
        match mode {
            CombineMode::Assign => {
                self.rhs.assign_to(target, CombineMode::Assign);
                for i in 0..self.size() {
                    let slot = target.get_mut(i);
                    *slot = T::zero() - *slot;
                }
                self.lhs.assign_to(target, CombineMode::Add);
            }
            CombineMode::Add => {
                self.lhs.assign_to(target, CombineMode::Add);
                self.rhs.assign_to(target, CombineMode::Sub);
            }
            CombineMode::Sub => {
                self.lhs.assign_to(target, CombineMode::Sub);
                self.rhs.assign_to(target, CombineMode::Add);
            }
            _ => {
                let evaluated = DynamicVector::<T, L::Transpose>::evaluated(self);
                evaluated.assign_to(target, mode);
            }
        }
    }
}

impl<T, L, R> Evaluate for SVecDVecSub<L, R>
where
    T: Element,
    L: SparseVector<Element = T> + VectorAssign,
    R: DenseVector<Element = T, Transpose = L::Transpose> + VectorAssign,
{
    type Output = DynamicVector<T, L::Transpose>;

    fn evaluate_with(&self, _config: &KernelConfig) -> Self::Output {
        DynamicVector::evaluated(self)
    }
}
