//! Dense and compressed vectors

use std::iter::{Copied, Zip};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::slice;

use etla_core::simd::{Pack, LANES};
use etla_core::{
    check_vector_index, Address, ColumnVector, DenseVector, DenseVectorMut, Density, Element,
    Expression, KernelConfig, Result, SparseVector, TransposeFlag, Vector,
};

use crate::assign::{self, smp, CombineMode, Evaluate, VectorAssign};

/// Heap-allocated dense vector with transpose flag `TF`
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicVector<T, TF = ColumnVector> {
    data: Vec<T>,
    transpose: PhantomData<TF>,
}

impl<T: Element, TF: TransposeFlag> DynamicVector<T, TF> {
    /// Zero-filled vector of the given size
    pub fn new(size: usize) -> Self {
        Self::from_vec(vec![T::zero(); size])
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            data,
            transpose: PhantomData,
        }
    }

    /// Copy of any vector operand through element access
    pub fn from_vector<V: Vector<Element = T> + ?Sized>(source: &V) -> Self {
        Self::from_vec((0..source.size()).map(|i| source.get(i)).collect())
    }

    /// Materialize an operand through its own assignment strategy
    pub fn evaluated<V: VectorAssign<Element = T> + ?Sized>(source: &V) -> Self {
        let mut vector = Self::new(source.size());
        source.assign_to(&mut vector, CombineMode::Assign);
        vector
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Resize, discarding the contents
    pub fn resize(&mut self, size: usize) {
        self.data.clear();
        self.data.resize(size, T::zero());
    }

    /// `self = expr`, resizing to the expression's size
    pub fn assign<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E) -> Result<()> {
        if self.data.len() != expr.size() {
            self.resize(expr.size());
        }
        assign::combine_vector(self, expr, CombineMode::Assign)
    }

    pub fn add_assign<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E) -> Result<()> {
        assign::combine_vector(self, expr, CombineMode::Add)
    }

    pub fn sub_assign<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E) -> Result<()> {
        assign::combine_vector(self, expr, CombineMode::Sub)
    }

    /// Componentwise multiplication
    pub fn mult_assign<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E) -> Result<()> {
        assign::combine_vector(self, expr, CombineMode::Mult)
    }

    /// Componentwise division
    pub fn div_assign<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E) -> Result<()> {
        assign::combine_vector(self, expr, CombineMode::Div)
    }

    /// Parallel `self = expr`, resizing to the expression's size
    pub fn smp_assign<E: VectorAssign<Element = T, Transpose = TF> + Sync>(&mut self, expr: &E) -> Result<()> {
        if self.data.len() != expr.size() {
            self.resize(expr.size());
        }
        smp::smp_combine_vector(self, expr, CombineMode::Assign, crate::config::global())
    }

    pub fn smp_add_assign<E: VectorAssign<Element = T, Transpose = TF> + Sync>(&mut self, expr: &E) -> Result<()> {
        smp::smp_combine_vector(self, expr, CombineMode::Add, crate::config::global())
    }

    pub fn smp_sub_assign<E: VectorAssign<Element = T, Transpose = TF> + Sync>(&mut self, expr: &E) -> Result<()> {
        smp::smp_combine_vector(self, expr, CombineMode::Sub, crate::config::global())
    }

    pub fn smp_mult_assign<E: VectorAssign<Element = T, Transpose = TF> + Sync>(&mut self, expr: &E) -> Result<()> {
        smp::smp_combine_vector(self, expr, CombineMode::Mult, crate::config::global())
    }

    pub fn smp_div_assign<E: VectorAssign<Element = T, Transpose = TF> + Sync>(&mut self, expr: &E) -> Result<()> {
        smp::smp_combine_vector(self, expr, CombineMode::Div, crate::config::global())
    }
}

impl<T: Element, TF: TransposeFlag> Index<usize> for DynamicVector<T, TF> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T: Element, TF: TransposeFlag> IndexMut<usize> for DynamicVector<T, TF> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

impl<T: Element, TF: TransposeFlag> Expression for DynamicVector<T, TF> {
    const SIMD_ENABLED: bool = true;
    const SMP_ASSIGNABLE: bool = true;
    const HAS_CONST_DATA_ACCESS: bool = true;

    fn can_alias(&self, alias: Address) -> bool {
        Address::of(self) == alias
    }

    fn is_aliased(&self, alias: Address) -> bool {
        Address::of(self) == alias
    }

    fn is_aligned(&self) -> bool {
        true
    }

    fn can_smp_assign(&self) -> bool {
        true
    }
}

impl<T: Element, TF: TransposeFlag> Vector for DynamicVector<T, TF> {
    type Element = T;
    type Transpose = TF;

    const DENSITY: Density = Density::Dense;

    fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn get(&self, i: usize) -> T {
        debug_assert!(i < self.data.len(), "Invalid vector access index");
        self.data[i]
    }
}

impl<T: Element, TF: TransposeFlag> DenseVector for DynamicVector<T, TF> {
    type Iter<'a> = Copied<slice::Iter<'a, T>> where Self: 'a;

    fn iter(&self) -> Self::Iter<'_> {
        self.data.iter().copied()
    }

    fn data(&self) -> Option<&[T]> {
        Some(&self.data)
    }

    fn load(&self, i: usize) -> Pack<T> {
        let mut pack = [T::zero(); LANES];
        pack.copy_from_slice(&self.data[i..i + LANES]);
        pack
    }
}

impl<T: Element, TF: TransposeFlag> DenseVectorMut for DynamicVector<T, TF> {
    #[inline]
    fn get_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }

    fn data_mut(&mut self) -> Option<&mut [T]> {
        Some(&mut self.data)
    }

    fn reset(&mut self) {
        self.data.fill(T::zero());
    }
}

impl<T: Element, TF: TransposeFlag> VectorAssign for DynamicVector<T, TF> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode)
    where
        C: DenseVectorMut<Element = T>,
    {
        assign::assign_dense_vector(self, target, mode);
    }

    fn assign_range_to(&self, target: &mut [T], offset: usize, mode: CombineMode) {
        for (slot, &value) in target.iter_mut().zip(&self.data[offset..]) {
            mode.apply(slot, value);
        }
    }
}

impl<T: Element, TF: TransposeFlag> Evaluate for DynamicVector<T, TF> {
    type Output = DynamicVector<T, TF>;

    fn evaluate_with(&self, _config: &KernelConfig) -> Self::Output {
        self.clone()
    }
}

/// Sparse vector storing sorted `(index, value)` pairs
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedVector<T, TF = ColumnVector> {
    size: usize,
    indices: Vec<usize>,
    values: Vec<T>,
    transpose: PhantomData<TF>,
}

impl<T: Element, TF: TransposeFlag> CompressedVector<T, TF> {
    /// Empty vector of the given size
    pub fn new(size: usize) -> Self {
        Self {
            size,
            indices: Vec::new(),
            values: Vec::new(),
            transpose: PhantomData,
        }
    }

    /// Build from `(index, value)` pairs in any order; duplicates are summed
    pub fn from_pairs(size: usize, pairs: &[(usize, T)]) -> Result<Self> {
        let mut sorted = pairs.to_vec();
        for &(i, _) in &sorted {
            check_vector_index(i, size)?;
        }
        sorted.sort_by_key(|&(i, _)| i);

        let mut vector = Self::new(size);
        for (i, value) in sorted {
            match vector.indices.last() {
                Some(&last) if last == i => {
                    if let Some(slot) = vector.values.last_mut() {
                        *slot += value;
                    }
                }
                _ => {
                    vector.indices.push(i);
                    vector.values.push(value);
                }
            }
        }
        Ok(vector)
    }

    /// Compress any vector operand, dropping default elements
    pub fn from_vector<V: Vector<Element = T> + ?Sized>(source: &V) -> Self {
        let mut vector = Self::new(source.size());
        for i in 0..source.size() {
            let value = source.get(i);
            if !value.is_default() {
                vector.indices.push(i);
                vector.values.push(value);
            }
        }
        vector
    }

    /// Dense temporary, combined, then compressed back
    fn combine_through_dense<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E, mode: CombineMode) -> Result<()> {
        let mut dense = DynamicVector::<T, TF>::from_vector(&*self);
        if mode == CombineMode::Assign {
            dense.assign(expr)?;
        } else {
            assign::combine_vector(&mut dense, expr, mode)?;
        }
        *self = Self::from_vector(&dense);
        Ok(())
    }

    /// `self = expr`, resizing to the expression's size
    pub fn assign<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E) -> Result<()> {
        self.combine_through_dense(expr, CombineMode::Assign)
    }

    pub fn add_assign<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E) -> Result<()> {
        self.combine_through_dense(expr, CombineMode::Add)
    }

    pub fn sub_assign<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E) -> Result<()> {
        self.combine_through_dense(expr, CombineMode::Sub)
    }

    pub fn mult_assign<E: VectorAssign<Element = T, Transpose = TF>>(&mut self, expr: &E) -> Result<()> {
        self.combine_through_dense(expr, CombineMode::Mult)
    }
}

impl<T: Element, TF: TransposeFlag> Expression for CompressedVector<T, TF> {
    const SMP_ASSIGNABLE: bool = true;

    fn can_alias(&self, alias: Address) -> bool {
        Address::of(self) == alias
    }

    fn is_aliased(&self, alias: Address) -> bool {
        Address::of(self) == alias
    }

    fn can_smp_assign(&self) -> bool {
        true
    }
}

impl<T: Element, TF: TransposeFlag> Vector for CompressedVector<T, TF> {
    type Element = T;
    type Transpose = TF;

    const DENSITY: Density = Density::Sparse;

    fn size(&self) -> usize {
        self.size
    }

    fn get(&self, i: usize) -> T {
        debug_assert!(i < self.size, "Invalid vector access index");
        self.indices
            .binary_search(&i)
            .map_or_else(|_| T::zero(), |k| self.values[k])
    }
}

impl<T: Element, TF: TransposeFlag> SparseVector for CompressedVector<T, TF> {
    type NonZeroIter<'a> = Zip<Copied<slice::Iter<'a, usize>>, Copied<slice::Iter<'a, T>>> where Self: 'a;

    fn non_zero_iter(&self) -> Self::NonZeroIter<'_> {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    fn non_zeros(&self) -> usize {
        self.values.len()
    }
}

impl<T: Element, TF: TransposeFlag> VectorAssign for CompressedVector<T, TF> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode)
    where
        C: DenseVectorMut<Element = T>,
    {
        assign::assign_sparse_vector(self, target, mode);
    }

    fn assign_range_to(&self, target: &mut [T], offset: usize, mode: CombineMode) {
        if !matches!(mode, CombineMode::Assign | CombineMode::Add | CombineMode::Sub) {
            for (k, slot) in target.iter_mut().enumerate() {
                mode.apply(slot, self.get(offset + k));
            }
            return;
        }
        if mode == CombineMode::Assign {
            target.fill(T::zero());
        }
        let end = offset + target.len();
        let first = self.indices.partition_point(|&i| i < offset);
        for (i, value) in self.non_zero_iter().skip(first).take_while(|&(i, _)| i < end) {
            mode.apply(&mut target[i - offset], value);
        }
    }
}

impl<T: Element, TF: TransposeFlag> Evaluate for CompressedVector<T, TF> {
    type Output = CompressedVector<T, TF>;

    fn evaluate_with(&self, _config: &KernelConfig) -> Self::Output {
        self.clone()
    }
}
