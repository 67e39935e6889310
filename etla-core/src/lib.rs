#![no_std]

//! ETLA Core - Expression-Template Linear Algebra Definitions
//!
//! This crate provides the pure, allocation-free part of the expression
//! engine: element and operand traits, compile-time capability predicates,
//! structural flags with their propagation formulas, type resolution over
//! operand descriptors, kernel configuration and shape validation.

#[cfg(test)]
extern crate std;

pub mod capability;
pub mod config;
pub mod error;
pub mod resolve;
pub mod simd;
pub mod structure;
pub mod traits;
pub mod validation;

pub use config::{KernelConfig, KernelSize};
pub use error::*;
pub use resolve::{NodeKind, OperandDescriptor, Operation, Resolved};
pub use structure::{DeclKind, ProductDecl, Structure};
pub use traits::*;
pub use validation::*;
