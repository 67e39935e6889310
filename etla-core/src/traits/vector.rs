//! Vector capability interface

use crate::simd::Pack;
use crate::traits::element::Element;
use crate::traits::expression::Expression;
use crate::traits::matrix::Density;
use crate::traits::order::TransposeFlag;
use crate::validation::check_vector_index;
use crate::Result;

/// Core vector trait
pub trait Vector: Expression {
    type Element: Element;
    type Transpose: TransposeFlag;

    const DENSITY: Density;

    fn size(&self) -> usize;

    /// Unchecked element access, precondition `i < size()`
    fn get(&self, i: usize) -> Self::Element;

    /// Checked element access
    fn at(&self, i: usize) -> Result<Self::Element> {
        check_vector_index(i, self.size())?;
        Ok(self.get(i))
    }
}

/// Vector with dense element storage
pub trait DenseVector: Vector {
    /// Restartable iterator over all elements
    type Iter<'a>: Iterator<Item = Self::Element> + Clone
    where
        Self: 'a;

    fn iter(&self) -> Self::Iter<'_>;

    /// Contiguous storage, if available
    fn data(&self) -> Option<&[Self::Element]> {
        None
    }

    /// Vectorized read of the pack starting at `i`
    fn load(&self, i: usize) -> Pack<Self::Element> {
        core::array::from_fn(|k| self.get(i + k))
    }
}

/// Vector with compressed storage
pub trait SparseVector: Vector {
    /// Iterator over `(index, value)` pairs in ascending index order
    type NonZeroIter<'a>: Iterator<Item = (usize, Self::Element)> + Clone
    where
        Self: 'a;

    fn non_zero_iter(&self) -> Self::NonZeroIter<'_>;

    fn non_zeros(&self) -> usize {
        self.non_zero_iter().count()
    }
}

/// Dense vector that can be written by assignments
pub trait DenseVectorMut: DenseVector {
    fn get_mut(&mut self, i: usize) -> &mut Self::Element;

    /// Contiguous mutable storage, if available
    fn data_mut(&mut self) -> Option<&mut [Self::Element]> {
        None
    }

    fn reset(&mut self) {
        for i in 0..self.size() {
            *self.get_mut(i) = num_traits::Zero::zero();
        }
    }
}

impl<V: Vector + ?Sized> Vector for &V {
    type Element = V::Element;
    type Transpose = V::Transpose;

    const DENSITY: Density = V::DENSITY;

    fn size(&self) -> usize {
        (**self).size()
    }

    #[inline]
    fn get(&self, i: usize) -> Self::Element {
        (**self).get(i)
    }
}

impl<V: DenseVector + ?Sized> DenseVector for &V {
    type Iter<'a> = V::Iter<'a> where Self: 'a;

    fn iter(&self) -> Self::Iter<'_> {
        (**self).iter()
    }

    fn data(&self) -> Option<&[Self::Element]> {
        (**self).data()
    }

    fn load(&self, i: usize) -> Pack<Self::Element> {
        (**self).load(i)
    }
}

impl<V: SparseVector + ?Sized> SparseVector for &V {
    type NonZeroIter<'a> = V::NonZeroIter<'a> where Self: 'a;

    fn non_zero_iter(&self) -> Self::NonZeroIter<'_> {
        (**self).non_zero_iter()
    }

    fn non_zeros(&self) -> usize {
        (**self).non_zeros()
    }
}
