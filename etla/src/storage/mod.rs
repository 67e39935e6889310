//! Concrete vector and matrix containers
//!
//! Containers carry a runtime [`Structure`] record. It starts out general
//! and is only set through `with_structure`, which verifies the flags
//! against the stored data first.

pub mod compressed;
pub mod dense;
pub mod identity;
pub mod vector;

pub use compressed::CompressedMatrix;
pub use dense::DynamicMatrix;
pub use identity::IdentityMatrix;
pub use vector::{CompressedVector, DynamicVector};

use etla_core::{check_square, Element, EtlaError, Matrix, Result, Structure};
use num_traits::One;

/// Verify that the elements of `matrix` satisfy every flag of `structure`
pub(crate) fn check_structure<M: Matrix + ?Sized>(matrix: &M, structure: Structure) -> Result<()> {
    if structure == Structure::GENERAL {
        return Ok(());
    }
    check_square(matrix.rows(), matrix.columns())?;

    let one = M::Element::one();
    for i in 0..matrix.rows() {
        for j in 0..matrix.columns() {
            let value = matrix.get(i, j);
            let valid = !(structure.is_symmetric() && value != matrix.get(j, i))
                && !(structure.is_hermitian() && value != Element::conj(matrix.get(j, i)))
                && !(j > i && structure.is_lower() && !value.is_default())
                && !(j < i && structure.is_upper() && !value.is_default())
                && !(i == j && structure.is_uni_triangular() && value != one)
                && !(i == j && structure.is_strictly_triangular() && !value.is_default());
            if !valid {
                return Err(EtlaError::InvalidStructure);
            }
        }
    }
    Ok(())
}
