//! Shape and index validation
//!
//! This module contains pure validation functions used at the call
//! boundary of every operator and checked accessor. All functions are
//! `const` checks on dimensions with no element access.

pub mod bounds;
pub mod shape;

pub use bounds::{check_matrix_index, check_vector_index};
pub use shape::{check_multipliable, check_same_shape, check_same_size, check_square};
