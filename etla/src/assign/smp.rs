//! Parallel assignment
//!
//! The target's major dimension is split into one contiguous band per
//! rayon worker. Every band is a disjoint `&mut` slice of the target's
//! storage, wrapped in a [`BlockMut`] and filled through
//! [`MatrixAssign::assign_block_to`]. Expressions that are not
//! SMP-assignable, or smaller than the configured SMP threshold, fall back
//! to the serial path.

use std::marker::PhantomData;

use etla_core::{
    check_same_shape, check_same_size, DenseMatrix, DenseMatrixMut, Density, Element, Expression,
    KernelConfig, Matrix, Result, StorageOrder, TransposeFlag, Vector,
};
use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use crate::assign::{self, CombineMode, MatrixAssign, VectorAssign};
use crate::storage::{DynamicMatrix, DynamicVector};

/// Mutable dense view over one band of a target's storage
#[derive(Debug)]
pub struct BlockMut<'a, T, SO> {
    data: &'a mut [T],
    rows: usize,
    columns: usize,
    order: PhantomData<SO>,
}

impl<'a, T: Element, SO: StorageOrder> BlockMut<'a, T, SO> {
    /// View `data` as a `rows x columns` matrix in storage order `SO`
    pub fn new(data: &'a mut [T], rows: usize, columns: usize) -> Self {
        assert_eq!(data.len(), rows * columns, "Invalid block size");
        Self {
            data,
            rows,
            columns,
            order: PhantomData,
        }
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.rows && j < self.columns, "Invalid block access index");
        if SO::IS_ROW_MAJOR {
            i * self.columns + j
        } else {
            j * self.rows + i
        }
    }
}

impl<T: Element, SO: StorageOrder> Expression for BlockMut<'_, T, SO> {
    const HAS_CONST_DATA_ACCESS: bool = true;
}

impl<T: Element, SO: StorageOrder> Matrix for BlockMut<'_, T, SO> {
    type Element = T;
    type Order = SO;

    const DENSITY: Density = Density::Dense;

    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> T {
        self.data[self.offset(i, j)]
    }
}

impl<T: Element, SO: StorageOrder> DenseMatrix for BlockMut<'_, T, SO> {
    fn data(&self) -> Option<&[T]> {
        Some(self.data)
    }
}

impl<T: Element, SO: StorageOrder> DenseMatrixMut for BlockMut<'_, T, SO> {
    #[inline]
    fn get_mut(&mut self, i: usize, j: usize) -> &mut T {
        let offset = self.offset(i, j);
        &mut self.data[offset]
    }

    fn data_mut(&mut self) -> Option<&mut [T]> {
        Some(self.data)
    }

    fn reset(&mut self) {
        self.data.fill(T::zero());
    }
}

/// Width of each band when `majors` lines are spread over the rayon pool
fn band_width(majors: usize) -> usize {
    majors.div_ceil(rayon::current_num_threads().max(1)).max(1)
}

/// Parallel counterpart of [`assign::combine`] for dense matrix targets
#[instrument(level = "trace", skip_all, fields(mode = ?mode, rows = target.rows(), columns = target.columns()))]
pub fn smp_combine<T, SO, E>(
    target: &mut DynamicMatrix<T, SO>,
    expr: &E,
    mode: CombineMode,
    config: &KernelConfig,
) -> Result<()>
where
    T: Element,
    SO: StorageOrder,
    E: MatrixAssign<Element = T> + Sync,
{
    let (rows, columns) = (target.rows(), target.columns());
    let parallel = matches!(
        mode,
        CombineMode::Assign | CombineMode::Add | CombineMode::Sub | CombineMode::Schur
    ) && E::SMP_ASSIGNABLE
        && expr.can_smp_assign()
        && config.is_smp_sized(rows, columns)
        && rows > 0
        && columns > 0;
    if !parallel {
        debug!(smp_assignable = E::SMP_ASSIGNABLE, "serial assignment");
        return assign::combine(target, expr, mode, config);
    }
    check_same_shape((rows, columns), (expr.rows(), expr.columns()))?;

    let (majors, minors) = SO::major_minor(rows, columns);
    let band = band_width(majors);
    trace!(bands = majors.div_ceil(band), band, "partitioned assignment");

    target
        .as_mut_slice()
        .par_chunks_mut(band * minors)
        .enumerate()
        .for_each(|(index, chunk)| {
            let start = index * band;
            let lines = chunk.len() / minors;
            let (row_range, column_range) = if SO::IS_ROW_MAJOR {
                (start..start + lines, 0..columns)
            } else {
                (0..rows, start..start + lines)
            };
            let mut block = BlockMut::<T, SO>::new(chunk, row_range.len(), column_range.len());
            expr.assign_block_to(&mut block, row_range, column_range, mode, config);
        });
    Ok(())
}

/// Parallel counterpart of [`assign::combine_vector`]
#[instrument(level = "trace", skip_all, fields(mode = ?mode, size = target.size()))]
pub fn smp_combine_vector<T, TF, E>(
    target: &mut DynamicVector<T, TF>,
    expr: &E,
    mode: CombineMode,
    config: &KernelConfig,
) -> Result<()>
where
    T: Element,
    TF: TransposeFlag,
    E: VectorAssign<Element = T, Transpose = TF> + Sync,
{
    let size = target.size();
    let parallel = E::SMP_ASSIGNABLE && expr.can_smp_assign() && size >= config.smp_threshold;
    if !parallel || size == 0 {
        debug!(smp_assignable = E::SMP_ASSIGNABLE, "serial assignment");
        return assign::combine_vector(target, expr, mode);
    }
    check_same_size(size, expr.size())?;

    let mode = if mode == CombineMode::Schur { CombineMode::Mult } else { mode };
    let band = band_width(size);
    trace!(bands = size.div_ceil(band), band, "partitioned assignment");

    target
        .as_mut_slice()
        .par_chunks_mut(band)
        .enumerate()
        .for_each(|(index, chunk)| expr.assign_range_to(chunk, index * band, mode));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::SMatDMatMult;
    use crate::storage::{CompressedMatrix, CompressedVector};
    use etla_core::{ColumnMajor, RowMajor};

    fn large_product_operands() -> (CompressedMatrix<f64, ColumnMajor>, DynamicMatrix<f64, RowMajor>) {
        let n = 160;
        let triplets: Vec<_> = (0..n)
            .flat_map(|i| [(i, i, 2.0), ((i * 7) % n, (i * 3 + 1) % n, 1.0)])
            .collect();
        let a = CompressedMatrix::from_triplets(n, n, &triplets).unwrap();
        let b = DynamicMatrix::from_fn(n, n, |i, j| ((i + 2 * j) % 11) as f64);
        (a, b)
    }

    #[test]
    fn test_block_view() {
        let mut data = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let mut block = BlockMut::<f64, ColumnMajor>::new(&mut data, 2, 3);
        assert_eq!(block.get(1, 2), 5.0);
        *block.get_mut(0, 1) = 9.0;
        block.reset();
        assert!(block.data().unwrap().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_parallel_product_matches_serial() {
        let (a, b) = large_product_operands();
        let product = SMatDMatMult::new(&a, &b).unwrap();
        assert!(product.can_smp_assign());

        let mut serial = DynamicMatrix::<f64, RowMajor>::new(0, 0);
        serial.assign(&product).unwrap();
        let mut parallel = DynamicMatrix::<f64, RowMajor>::new(0, 0);
        parallel.smp_assign(&product).unwrap();
        assert_eq!(serial, parallel);

        let mut column = DynamicMatrix::<f64, ColumnMajor>::from_fn(160, 160, |i, j| (i * j) as f64);
        let mut expected = column.clone();
        expected.add_assign(&product).unwrap();
        column.smp_add_assign(&product).unwrap();
        assert_eq!(column, expected);

        expected.sub_assign(&product).unwrap();
        column.smp_sub_assign(&product).unwrap();
        assert_eq!(column, expected);

        expected.schur_assign(&product).unwrap();
        column.smp_schur_assign(&product).unwrap();
        assert_eq!(column, expected);
    }

    #[test]
    fn test_small_expressions_fall_back() {
        let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(3, 3, &[(0, 0, 1.0), (2, 1, 2.0)]).unwrap();
        let b = DynamicMatrix::<f64, RowMajor>::from_fn(3, 3, |i, j| (i + j) as f64);
        let product = SMatDMatMult::new(&a, &b).unwrap();
        let mut c = DynamicMatrix::<f64, RowMajor>::new(3, 3);
        smp_combine(&mut c, &product, CombineMode::Assign, &KernelConfig::default()).unwrap();
        assert_eq!(c.get(2, 2), 6.0);

        let wrong = DynamicMatrix::<f64, RowMajor>::new(2, 3);
        assert!(smp_combine(&mut c, &wrong, CombineMode::Add, &KernelConfig::default()).is_err());
    }

    #[test]
    fn test_lowered_threshold_runs_parallel() {
        let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(
            10,
            10,
            &[(0, 0, 1.0), (3, 7, -2.0), (9, 2, 4.0), (5, 5, 0.5)],
        )
        .unwrap();
        let b = DynamicMatrix::<f64, RowMajor>::from_fn(10, 10, |i, j| (i * 10 + j) as f64);
        let product = SMatDMatMult::new(&a, &b).unwrap();
        let config = KernelConfig::default().with_smp_threshold(16);
        assert!(config.is_smp_sized(10, 10));
        assert!(!KernelConfig::default().is_smp_sized(10, 10));

        let mut serial = DynamicMatrix::<f64, RowMajor>::from_fn(10, 10, |i, j| (i + j) as f64);
        let mut parallel = serial.clone();
        serial.combine(&product, CombineMode::Add, &config).unwrap();
        parallel.smp_combine(&product, CombineMode::Add, &config).unwrap();
        assert_eq!(serial, parallel);
        assert_eq!(parallel.get(3, 4), 7.0 - 2.0 * 74.0);

        let mut column = DynamicMatrix::<f64, ColumnMajor>::new(10, 10);
        smp_combine(&mut column, &product, CombineMode::Assign, &config).unwrap();
        assert_eq!(column.get(9, 0), 4.0 * 20.0);
    }

    #[test]
    fn test_parallel_vector_assignment() {
        let n = 30_000;
        let dense = DynamicVector::<f64>::from_vec((0..n).map(|i| (i % 13) as f64).collect());
        let sparse = CompressedVector::<f64>::from_pairs(n, &[(5, 1.0), (29_999, 3.0)]).unwrap();

        let mut target = DynamicVector::<f64>::new(0);
        target.smp_assign(&dense).unwrap();
        assert_eq!(target, dense);
        target.smp_add_assign(&dense).unwrap();
        assert_eq!(target[12], 24.0);
        target.smp_mult_assign(&sparse).unwrap();
        assert_eq!(target[5], 10.0);
        assert_eq!(target[29_999], 3.0 * 2.0 * (29_999 % 13) as f64);
        assert_eq!(target[6], 0.0);

        let short = DynamicVector::<f64>::new(4);
        assert!(target.smp_sub_assign(&short).is_err());
    }
}
