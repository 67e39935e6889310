//! Dense row- or column-major matrix

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use etla_core::simd::{Pack, LANES};
use etla_core::{
    Address, DenseMatrix, DenseMatrixMut, Density, Element, EtlaError, Expression, KernelConfig,
    Matrix, Result, RowMajor, StorageOrder, Structure,
};

use crate::assign::{self, smp, CombineMode, Evaluate, MatrixAssign};
use crate::storage::check_structure;

/// Heap-allocated dense matrix with storage order `SO`
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMatrix<T, SO = RowMajor> {
    rows: usize,
    columns: usize,
    data: Vec<T>,
    structure: Structure,
    order: PhantomData<SO>,
}

impl<T: Element, SO: StorageOrder> DynamicMatrix<T, SO> {
    /// Zero-filled `rows x columns` matrix
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            data: vec![T::zero(); rows * columns],
            structure: Structure::GENERAL,
            order: PhantomData,
        }
    }

    pub fn from_fn(rows: usize, columns: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut matrix = Self::new(rows, columns);
        for i in 0..rows {
            for j in 0..columns {
                matrix[(i, j)] = f(i, j);
            }
        }
        matrix
    }

    /// Build from values listed row by row, regardless of the storage order
    pub fn from_row_slice(rows: usize, columns: usize, values: &[T]) -> Result<Self> {
        if values.len() != rows * columns {
            return Err(EtlaError::ShapeMismatch {
                expected: (rows * columns, 1),
                found: (values.len(), 1),
            });
        }
        Ok(Self::from_fn(rows, columns, |i, j| values[i * columns + j]))
    }

    pub fn identity(n: usize) -> Self {
        let mut matrix = Self::new(n, n);
        for i in 0..n {
            matrix[(i, i)] = T::one();
        }
        matrix.structure = Structure::IDENTITY;
        matrix
    }

    /// Copy of any matrix operand through element access
    pub fn from_matrix<M: Matrix<Element = T> + ?Sized>(source: &M) -> Self {
        Self::from_fn(source.rows(), source.columns(), |i, j| source.get(i, j))
    }

    /// Materialize an operand through its own assignment strategy
    pub fn evaluated<M: MatrixAssign<Element = T> + ?Sized>(source: &M, config: &KernelConfig) -> Self {
        let mut matrix = Self::new(source.rows(), source.columns());
        source.assign_to(&mut matrix, CombineMode::Assign, config);
        matrix
    }

    /// Attach structural flags after verifying them against the data
    pub fn with_structure(mut self, structure: Structure) -> Result<Self> {
        check_structure(&self, structure)?;
        self.structure = structure;
        Ok(self)
    }

    /// Resize to `rows x columns`, discarding the contents
    pub fn resize(&mut self, rows: usize, columns: usize) {
        self.rows = rows;
        self.columns = columns;
        self.data.clear();
        self.data.resize(rows * columns, T::zero());
        self.structure = Structure::GENERAL;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.structure = Structure::GENERAL;
        &mut self.data
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.rows && j < self.columns, "Invalid matrix access index");
        if SO::IS_ROW_MAJOR {
            i * self.columns + j
        } else {
            j * self.rows + i
        }
    }

    /// `self = expr`, resizing to the expression's shape
    pub fn assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.assign_with(expr, crate::config::global())
    }

    pub fn assign_with<E: MatrixAssign<Element = T>>(&mut self, expr: &E, config: &KernelConfig) -> Result<()> {
        if self.rows != expr.rows() || self.columns != expr.columns() {
            self.resize(expr.rows(), expr.columns());
        }
        self.combine(expr, CombineMode::Assign, config)
    }

    pub fn add_assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.combine(expr, CombineMode::Add, crate::config::global())
    }

    pub fn sub_assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.combine(expr, CombineMode::Sub, crate::config::global())
    }

    pub fn schur_assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.combine(expr, CombineMode::Schur, crate::config::global())
    }

    /// `self = self * expr`, resizing to the product's shape
    pub fn mult_assign<E: MatrixAssign<Element = T>>(&mut self, expr: &E) -> Result<()> {
        self.mult_assign_with(expr, crate::config::global())
    }

    pub fn mult_assign_with<E: MatrixAssign<Element = T>>(&mut self, expr: &E, config: &KernelConfig) -> Result<()> {
        etla_core::check_multipliable((self.rows, self.columns), (expr.rows(), expr.columns()))?;
        let rhs = DynamicMatrix::<T, E::Order>::evaluated(expr, config);
        *self = assign::kernels::dense_product(&*self, &rhs);
        Ok(())
    }

    /// Combine with an explicit mode and configuration
    pub fn combine<E: MatrixAssign<Element = T>>(&mut self, expr: &E, mode: CombineMode, config: &KernelConfig) -> Result<()> {
        assign::combine(self, expr, mode, config)?;
        self.structure = Structure::GENERAL;
        Ok(())
    }

    /// Parallel `self = expr`, resizing to the expression's shape
    pub fn smp_assign<E: MatrixAssign<Element = T> + Sync>(&mut self, expr: &E) -> Result<()> {
        if self.rows != expr.rows() || self.columns != expr.columns() {
            self.resize(expr.rows(), expr.columns());
        }
        self.smp_combine(expr, CombineMode::Assign, crate::config::global())
    }

    pub fn smp_add_assign<E: MatrixAssign<Element = T> + Sync>(&mut self, expr: &E) -> Result<()> {
        self.smp_combine(expr, CombineMode::Add, crate::config::global())
    }

    pub fn smp_sub_assign<E: MatrixAssign<Element = T> + Sync>(&mut self, expr: &E) -> Result<()> {
        self.smp_combine(expr, CombineMode::Sub, crate::config::global())
    }

    pub fn smp_schur_assign<E: MatrixAssign<Element = T> + Sync>(&mut self, expr: &E) -> Result<()> {
        self.smp_combine(expr, CombineMode::Schur, crate::config::global())
    }

    /// Multiplication assignment always runs serially
    pub fn smp_mult_assign<E: MatrixAssign<Element = T> + Sync>(&mut self, expr: &E) -> Result<()> {
        self.mult_assign(expr)
    }

    pub fn smp_combine<E: MatrixAssign<Element = T> + Sync>(
        &mut self,
        expr: &E,
        mode: CombineMode,
        config: &KernelConfig,
    ) -> Result<()> {
        smp::smp_combine(self, expr, mode, config)?;
        self.structure = Structure::GENERAL;
        Ok(())
    }
}

impl<T: Element, SO: StorageOrder> Index<(usize, usize)> for DynamicMatrix<T, SO> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[self.offset(i, j)]
    }
}

impl<T: Element, SO: StorageOrder> IndexMut<(usize, usize)> for DynamicMatrix<T, SO> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        let offset = self.offset(i, j);
        &mut self.data[offset]
    }
}

impl<T: Element, SO: StorageOrder> Expression for DynamicMatrix<T, SO> {
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

impl<T: Element, SO: StorageOrder> Matrix for DynamicMatrix<T, SO> {
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

    fn structure(&self) -> Structure {
        self.structure
    }
}

impl<T: Element, SO: StorageOrder> DenseMatrix for DynamicMatrix<T, SO> {
    fn data(&self) -> Option<&[T]> {
        Some(&self.data)
    }

    fn load(&self, i: usize, j: usize) -> Pack<T> {
        let start = self.offset(i, j);
        let mut pack = [T::zero(); LANES];
        pack.copy_from_slice(&self.data[start..start + LANES]);
        pack
    }
}

impl<T: Element, SO: StorageOrder> DenseMatrixMut for DynamicMatrix<T, SO> {
    #[inline]
    fn get_mut(&mut self, i: usize, j: usize) -> &mut T {
        let offset = self.offset(i, j);
        &mut self.data[offset]
    }

    fn data_mut(&mut self) -> Option<&mut [T]> {
        Some(&mut self.data)
    }

    fn reset(&mut self) {
        self.data.fill(T::zero());
    }

    fn store(&mut self, i: usize, j: usize, pack: Pack<T>) {
        let start = self.offset(i, j);
        self.data[start..start + LANES].copy_from_slice(&pack);
    }
}

impl<T: Element, SO: StorageOrder> MatrixAssign for DynamicMatrix<T, SO> {
    fn assign_to<C>(&self, target: &mut C, mode: CombineMode, _config: &KernelConfig)
    where
        C: DenseMatrixMut<Element = T>,
    {
        if C::Order::IS_ROW_MAJOR == SO::IS_ROW_MAJOR {
            if let Some(out) = target.data_mut() {
                for (slot, &value) in out.iter_mut().zip(&self.data) {
                    mode.apply(slot, value);
                }
                return;
            }
        }
        assign::assign_elementwise(self, target, mode);
    }
}

impl<T: Element, SO: StorageOrder> Evaluate for DynamicMatrix<T, SO> {
    type Output = DynamicMatrix<T, SO>;

    fn evaluate_with(&self, _config: &KernelConfig) -> Self::Output {
        self.clone()
    }
}
