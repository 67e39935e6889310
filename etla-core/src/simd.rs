//! SIMD configuration
//!
//! Instruction-set modes are taken from the compilation target; the
//! engine never emits intrinsics itself but uses these flags to decide
//! which operands may be processed in packs of [`LANES`] elements.

use crate::traits::element::ElementKind;

/// Number of elements per vectorized pack
pub const LANES: usize = 4;

/// A pack of elements processed together by `load`/`store`
pub type Pack<T> = [T; LANES];

pub const SSE_MODE: bool = cfg!(target_feature = "sse");
pub const SSE2_MODE: bool = cfg!(target_feature = "sse2");
pub const AVX_MODE: bool = cfg!(target_feature = "avx");
pub const AVX512F_MODE: bool = cfg!(target_feature = "avx512f");
pub const AVX512BW_MODE: bool = cfg!(target_feature = "avx512bw");

/// Short vector math library support (never available in this build)
pub const SVML_MODE: bool = false;

/// Whether a vectorized division `T1 / T2` is available
pub const fn has_simd_div(lhs: ElementKind, rhs: ElementKind) -> bool {
    match (lhs, rhs) {
        (ElementKind::F32, ElementKind::F32) | (ElementKind::C32, ElementKind::F32) => {
            SSE_MODE || AVX_MODE || AVX512F_MODE
        }
        (ElementKind::F64, ElementKind::F64) | (ElementKind::C64, ElementKind::F64) => {
            SSE2_MODE || AVX_MODE || AVX512F_MODE
        }
        (ElementKind::I32, ElementKind::I32) | (ElementKind::I64, ElementKind::I64) => {
            SVML_MODE && AVX512F_MODE
        }
        _ => false,
    }
}
