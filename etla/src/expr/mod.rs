//! Expression nodes
//!
//! Nodes are lazy: building one validates the operand shapes and stores
//! the operands (containers by reference, nested nodes by value). Element
//! access computes on demand; the assignment traits evaluate whole nodes
//! through the kernels.

pub mod binary;
pub mod decl;
pub mod eval;
pub mod for_each;
pub mod scalar;
pub mod smat_dmat_mult;
pub mod submatrix;
pub mod svec_dvec_sub;
pub mod trans;

pub use binary::{BinaryOp, MatMatMap2, Minus, Plus, Times, VecVecMap2};
pub use decl::{decldiag, declherm, decllow, declsym, declupp, DeclExpr, Declare, Declared};
pub use eval::{eval, Eval};
pub use for_each::{
    abs, cbrt, ceil, exp, floor, for_each, invcbrt, invsqrt, log, log10, mat_for_each, mat_map,
    map, pow, sin, sqrt, DMatForEach, DVecForEach, Func, UnaryOp,
};
pub use scalar::{MatScalar, ScalarOp, VecScalar};
pub use smat_dmat_mult::SMatDMatMult;
pub use submatrix::{Submatrix, Window};
pub use svec_dvec_sub::SVecDVecSub;
pub use trans::{trans, Trans};
