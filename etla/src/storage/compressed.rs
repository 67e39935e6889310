//! Compressed sparse matrix (CSR for row-major, CSC for column-major)

use std::iter::{Copied, Zip};
use std::marker::PhantomData;
use std::ops::Range;
use std::slice;

use etla_core::{
    check_matrix_index, Address, DenseMatrixMut, Density, Element, Expression, KernelConfig, Matrix,
    Result, RowMajor, SparseMatrix, StorageOrder, Structure,
};
use hashbrown::HashMap;

use crate::assign::{self, CombineMode, Evaluate, MatrixAssign};
use crate::storage::{check_structure, DynamicMatrix};

/// Sparse matrix storing the non-zeros of each major line in ascending minor order
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedMatrix<T, SO = RowMajor> {
    rows: usize,
    columns: usize,
    /// Start of each major line in `indices`/`values`, plus the end sentinel
    offsets: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<T>,
    structure: Structure,
    order: PhantomData<SO>,
}

impl<T: Element, SO: StorageOrder> CompressedMatrix<T, SO> {
    /// Empty `rows x columns` matrix
    pub fn new(rows: usize, columns: usize) -> Self {
        let (major, _) = SO::major_minor(rows, columns);
        Self {
            rows,
            columns,
            offsets: vec![0; major + 1],
            indices: Vec::new(),
            values: Vec::new(),
            structure: Structure::GENERAL,
            order: PhantomData,
        }
    }

    /// Build from `(row, column, value)` triplets; duplicates are summed
    pub fn from_triplets(rows: usize, columns: usize, triplets: &[(usize, usize, T)]) -> Result<Self> {
        let mut entries: HashMap<(usize, usize), T> = HashMap::with_capacity(triplets.len());
        for &(i, j, value) in triplets {
            check_matrix_index(i, j, rows, columns)?;
            *entries.entry(SO::major_minor(i, j)).or_insert_with(T::zero) += value;
        }

        let mut sorted: Vec<((usize, usize), T)> = entries.into_iter().collect();
        sorted.sort_unstable_by_key(|&(position, _)| position);

        let mut matrix = Self::new(rows, columns);
        matrix.indices.reserve(sorted.len());
        matrix.values.reserve(sorted.len());
        for ((major, minor), value) in sorted {
            matrix.offsets[major + 1] += 1;
            matrix.indices.push(minor);
            matrix.values.push(value);
        }
        for k in 1..matrix.offsets.len() {
            matrix.offsets[k] += matrix.offsets[k - 1];
        }
        Ok(matrix)
    }

    /// Copy of a sparse operand in either storage order
    pub fn from_sparse<A: SparseMatrix<Element = T> + ?Sized>(source: &A) -> Self {
        let mut matrix = Self::new(source.rows(), source.columns());
        if A::Order::IS_ROW_MAJOR == SO::IS_ROW_MAJOR {
            for major in 0..source.major_len() {
                for (minor, value) in source.major(major) {
                    matrix.indices.push(minor);
                    matrix.values.push(value);
                }
                matrix.offsets[major + 1] = matrix.indices.len();
            }
            return matrix;
        }

        // Transposing conversion: count per target line, then scatter in source order
        for major in 0..source.major_len() {
            for (minor, _) in source.major(major) {
                matrix.offsets[minor + 1] += 1;
            }
        }
        for k in 1..matrix.offsets.len() {
            matrix.offsets[k] += matrix.offsets[k - 1];
        }
        let nnz = matrix.offsets[matrix.offsets.len() - 1];
        matrix.indices = vec![0; nnz];
        matrix.values = vec![T::zero(); nnz];
        let mut cursor = matrix.offsets.clone();
        for major in 0..source.major_len() {
            for (minor, value) in source.major(major) {
                let position = cursor[minor];
                matrix.indices[position] = major;
                matrix.values[position] = value;
                cursor[minor] += 1;
            }
        }
        matrix
    }

    /// Compress any matrix operand, dropping default elements
    pub fn from_matrix<M: Matrix<Element = T> + ?Sized>(source: &M) -> Self {
        let mut matrix = Self::new(source.rows(), source.columns());
        let (majors, minors) = SO::major_minor(source.rows(), source.columns());
        for major in 0..majors {
            for minor in 0..minors {
                let (i, j) = SO::row_column(major, minor);
                let value = source.get(i, j);
                if !value.is_default() {
                    matrix.indices.push(minor);
                    matrix.values.push(value);
                }
            }
            matrix.offsets[major + 1] = matrix.indices.len();
        }
        matrix
    }

    /// Attach structural flags after verifying them against the data
    pub fn with_structure(mut self, structure: Structure) -> Result<Self> {
        check_structure(&self, structure)?;
        self.structure = structure;
        Ok(self)
    }

    /// Position of `(major, minor)` within the compressed arrays
    fn find(&self, major: usize, minor: usize) -> Option<usize> {
        let line = self.offsets[major]..self.offsets[major + 1];
        self.indices[line.clone()]
            .binary_search(&minor)
            .ok()
            .map(|k| line.start + k)
    }

    /// Dense temporary of the target's order, combined, then compressed back
    fn combine_through_dense<E: MatrixAssign<Element = T>>(
        &mut self,
        expr: &E,
        mode: CombineMode,
        config: &KernelConfig,
    ) -> Result<()> {
        let mut dense = if mode == CombineMode::Assign {
            DynamicMatrix::<T, SO>::new(expr.rows(), expr.columns())
        } else {
            let mut dense = DynamicMatrix::<T, SO>::new(self.rows, self.columns);
            assign::assign_sparse(&*self, &mut dense, CombineMode::Assign);
            dense
        };
        if mode == CombineMode::Mult {
            dense.mult_assign_with(expr, config)?;
        } else {
            dense.combine(expr, mode, config)?;
        }
        *self = Self::from_matrix(&dense);
        Ok(())
    }

    /// `self = expr`, resizing to the expression's shape
    pub fn assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.combine_through_dense(expr, CombineMode::Assign, crate::config::global())
    }

    pub fn add_assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.combine_through_dense(expr, CombineMode::Add, crate::config::global())
    }

    pub fn sub_assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.combine_through_dense(expr, CombineMode::Sub, crate::config::global())
    }

    pub fn schur_assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.combine_through_dense(expr, CombineMode::Schur, crate::config::global())
    }

    pub fn mult_assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.combine_through_dense(expr, CombineMode::Mult, crate::config::global())
    }

    /// Combine with an explicit mode and configuration
    pub fn combine<E: MatrixAssign<Element = T>>(&mut self, expr: &E, mode: CombineMode, config: &KernelConfig) -> Result<()> {
        self.combine_through_dense(expr, mode, config)
    }
}

impl<T: Element, SO: StorageOrder> Expression for CompressedMatrix<T, SO> {
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

impl<T: Element, SO: StorageOrder> Matrix for CompressedMatrix<T, SO> {
    type Element = T;
    type Order = SO;

    const DENSITY: Density = Density::Sparse;

    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    fn get(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.rows && j < self.columns, "Invalid matrix access index");
        let (major, minor) = SO::major_minor(i, j);
        self.find(major, minor).map_or_else(T::zero, |k| self.values[k])
    }

    fn structure(&self) -> Structure {
        self.structure
    }
}

impl<T: Element, SO: StorageOrder> SparseMatrix for CompressedMatrix<T, SO> {
    type MajorIter<'a> = Zip<Copied<slice::Iter<'a, usize>>, Copied<slice::Iter<'a, T>>> where Self: 'a;

    fn major(&self, i: usize) -> Self::MajorIter<'_> {
        let line = self.offsets[i]..self.offsets[i + 1];
        self.indices[line.clone()]
            .iter()
            .copied()
            .zip(self.values[line].iter().copied())
    }

    fn major_non_zeros(&self, i: usize) -> usize {
        self.offsets[i + 1] - self.offsets[i]
    }

    fn non_zeros(&self) -> usize {
        self.values.len()
    }
}

impl<T: Element, SO: StorageOrder> MatrixAssign for CompressedMatrix<T, SO> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, _config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = T>,
    {
        assign::assign_sparse(self, target, mode);
    }

    fn assign_block_to<C>(
        &self,
        target: &mut C,
        rows: Range<usize>,
        columns: Range<usize>,
        mode: CombineMode,
        _config: &KernelConfig,
    ) where
        C: DenseMatrixMut<Element = T>,
    {
        if !matches!(mode, CombineMode::Assign | CombineMode::Add | CombineMode::Sub) {
            for i in 0..rows.len() {
                for j in 0..columns.len() {
                    mode.apply(target.get_mut(i, j), self.get(rows.start + i, columns.start + j));
                }
            }
            return;
        }
        if mode == CombineMode::Assign {
            target.reset();
        }
        let (majors, minors) = major_minor_ranges::<SO>(rows, columns);
        for major in majors.clone() {
            for (minor, value) in self.major(major) {
                if minor < minors.start {
                    continue;
                }
                if minor >= minors.end {
                    break;
                }
                let (i, j) = SO::row_column(major - majors.start, minor - minors.start);
                mode.apply(target.get_mut(i, j), value);
            }
        }
    }
}

/// Range counterpart of [`StorageOrder::major_minor`]
fn major_minor_ranges<SO: StorageOrder>(rows: Range<usize>, columns: Range<usize>) -> (Range<usize>, Range<usize>) {
    if SO::IS_ROW_MAJOR {
        (rows, columns)
    } else {
        (columns, rows)
    }
}

impl<T: Element, SO: StorageOrder> Evaluate for CompressedMatrix<T, SO> {
    type Output = CompressedMatrix<T, SO>;

    fn evaluate_with(&self, _config: &KernelConfig) -> Self::Output {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etla_core::ColumnMajor;

    fn sample<SO: StorageOrder>() -> CompressedMatrix<f64, SO> {
        CompressedMatrix::from_triplets(
            3,
            4,
            &[(0, 1, 1.0), (2, 3, 2.0), (1, 0, 3.0), (0, 1, 4.0), (2, 0, 5.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_triplets_sum_duplicates() {
        let matrix = sample::<RowMajor>();
        assert_eq!(matrix.non_zeros(), 4);
        assert_eq!(matrix.get(0, 1), 5.0);
        assert_eq!(matrix.get(1, 1), 0.0);
        assert_eq!(matrix.major(2).collect::<Vec<_>>(), vec![(0, 5.0), (3, 2.0)]);
    }

    #[test]
    fn test_triplets_out_of_bounds() {
        let err = CompressedMatrix::<f64, RowMajor>::from_triplets(2, 2, &[(2, 0, 1.0)]).unwrap_err();
        assert_eq!(err.category(), etla_core::ErrorCategory::OutOfRange);
    }

    #[test]
    fn test_order_conversion() {
        let row = sample::<RowMajor>();
        let column = CompressedMatrix::<f64, ColumnMajor>::from_sparse(&row);
        assert_eq!(column, sample::<ColumnMajor>());
        assert_eq!(column.major(0).collect::<Vec<_>>(), vec![(1, 3.0), (2, 5.0)]);
        assert_eq!(column.major_non_zeros(2), 0);
        assert_eq!(CompressedMatrix::<f64, RowMajor>::from_sparse(&column), row);
    }

    #[test]
    fn test_from_matrix_drops_zeros() {
        let dense = DynamicMatrix::<f64, RowMajor>::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]).unwrap();
        let sparse = CompressedMatrix::<f64, ColumnMajor>::from_matrix(&dense);
        assert_eq!(sparse.non_zeros(), 1);
        assert_eq!(sparse.get(0, 1), 1.0);
    }

    #[test]
    fn test_block_assign() {
        let matrix = sample::<ColumnMajor>();
        let mut block = DynamicMatrix::<f64, RowMajor>::new(2, 2);
        matrix.assign_block_to(&mut block, 1..3, 0..2, CombineMode::Assign, &KernelConfig::default());
        assert_eq!(block.as_slice(), &[3.0, 0.0, 5.0, 0.0]);
    }

    #[test]
    fn test_assign_through_dense() {
        let mut target = CompressedMatrix::<f64, RowMajor>::new(0, 0);
        target.assign(&sample::<ColumnMajor>()).unwrap();
        assert_eq!(target, sample::<RowMajor>());
        target.sub_assign(&sample::<ColumnMajor>()).unwrap();
        assert_eq!(target.non_zeros(), 0);
        assert!(target.add_assign(&CompressedMatrix::<f64, RowMajor>::new(2, 2)).is_err());
    }
}
