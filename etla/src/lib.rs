//! ETLA - Expression-Template Linear Algebra
//!
//! This library builds lazy expression trees over dense and sparse vectors
//! and matrices and evaluates them into targets through structure-aware
//! kernels.
//!
//! ## Architecture
//!
//! ETLA follows a clean definition/implementation separation:
//!
//! - **etla-core**: Pure traits, capability predicates, structural flags,
//!   type resolution and kernel configuration (no allocation)
//! - **etla**: Containers, expression nodes, kernels and the parallel
//!   assignment layer
//!
//! ## Quick Start
//!
//! ```rust
//! use etla::{mult, ColumnMajor, CompressedMatrix, DynamicMatrix, RowMajor};
//!
//! fn example() -> etla::Result<()> {
//!     let a = CompressedMatrix::<f64, ColumnMajor>::from_triplets(
//!         3,
//!         3,
//!         &[(0, 0, 1.0), (1, 1, 2.0), (2, 0, 3.0), (2, 2, 4.0)],
//!     )?;
//!     let b = DynamicMatrix::<f64, RowMajor>::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0])?;
//!
//!     let mut c = DynamicMatrix::<f64, RowMajor>::new(0, 0);
//!     c.assign(&mult(&a, &b)?)?;
//!     assert_eq!(c[(2, 0)], 7.0);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! ## Features
//!
//! - **Structure declarations**: `declsym`, `declherm`, `decllow`,
//!   `declupp` and `decldiag` restrict the work done by the kernels
//! - **Kernel selection**: small/large thresholds, unrolled kernels and
//!   symmetric-operand restructuring steered by [`KernelConfig`]
//! - **Parallel assignment**: `smp_*` entry points split the target into
//!   bands processed with rayon
//! - **Problems**: [`Lcp`] holds a linear complementarity problem and
//!   measures its residual through the sparse x dense product

pub use etla_core::{
    // Core traits
    Address, Density, ElementKind, DenseMatrix, DenseMatrixMut, DenseVector, DenseVectorMut, Element, Expression, Matrix,
    SparseMatrix, SparseVector, Vector,
    // Storage order markers
    ColumnMajor, ColumnVector, RowMajor, RowVector, StorageOrder, TransposeFlag,
    // Structure and resolution
    DeclKind, NodeKind, OperandDescriptor, Operation, ProductDecl, Resolved, Structure,
    // Configuration
    KernelConfig, KernelSize,
    // Error handling
    ErrorCategory, EtlaError, Result,
};

pub use etla_core::{capability, resolve, simd, structure};

pub mod assign;
pub mod config;
pub mod expr;
pub mod norms;
pub mod ops;
pub mod problems;
pub mod storage;

pub use assign::{CombineMode, Evaluate, MatrixAssign, VectorAssign};
pub use expr::{
    decldiag, declherm, decllow, declsym, declupp, eval, for_each, trans, DMatForEach,
    DVecForEach, Declare, Declared, DeclExpr, Eval, MatMatMap2, MatScalar, SMatDMatMult,
    SVecDVecSub, Submatrix, Trans, VecScalar, VecVecMap2,
};
pub use norms::{l1_norm, linf_norm, norm, sqr_norm, Magnitude, NormOperand};
pub use ops::{
    add, div, mult, schur, scale, sparse_dense_sub, sub, vec_add, vec_div, vec_mult, vec_scale, vec_sub,
};
pub use problems::Lcp;
pub use storage::{CompressedMatrix, CompressedVector, DynamicMatrix, DynamicVector, IdentityMatrix};
