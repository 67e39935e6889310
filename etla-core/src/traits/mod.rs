//! Abstract interfaces consumed by the expression engine
//!
//! This module defines the trait abstractions for elements, storage
//! orders and vector/matrix operands. Traits are pure interfaces - the
//! concrete containers live in the `etla` crate.

pub mod element;
pub mod expression;
pub mod matrix;
pub mod order;
pub mod vector;

pub use element::{Element, ElementKind};
pub use expression::{Address, Expression};
pub use matrix::{DenseMatrix, DenseMatrixMut, Density, Matrix, SparseMatrix};
pub use order::{ColumnMajor, ColumnVector, Order, RowMajor, RowVector, StorageOrder, TransposeFlag};
pub use vector::{DenseVector, DenseVectorMut, SparseVector, Vector};
