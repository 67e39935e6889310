//! Element type constraints
//!
//! This module defines the trait that constrains what types can be
//! stored in vectors and matrices, and the closed set of element kinds
//! used by the type-resolution descriptors.

use core::fmt::Debug;
use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub, SubAssign};

use num_complex::Complex;
use num_traits::{One, Zero};

/// Closed set of numeric element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    C32,
    C64,
}

impl ElementKind {
    /// Whether the kind is a real floating point type
    pub const fn is_floating_point(self) -> bool {
        matches!(self, ElementKind::F32 | ElementKind::F64)
    }

    pub const fn is_complex(self) -> bool {
        matches!(self, ElementKind::C32 | ElementKind::C64)
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            ElementKind::I32 | ElementKind::I64 | ElementKind::U32 | ElementKind::U64
        )
    }

    pub const fn is_signed(self) -> bool {
        !matches!(self, ElementKind::U32 | ElementKind::U64)
    }

    /// Size in bytes of one element of this kind
    pub const fn size_bytes(self) -> usize {
        match self {
            ElementKind::I32 | ElementKind::U32 | ElementKind::F32 => 4,
            ElementKind::I64 | ElementKind::U64 | ElementKind::F64 | ElementKind::C32 => 8,
            ElementKind::C64 => 16,
        }
    }

    /// Real counterpart of a complex kind; real kinds map to themselves
    pub const fn real(self) -> ElementKind {
        match self {
            ElementKind::C32 => ElementKind::F32,
            ElementKind::C64 => ElementKind::F64,
            other => other,
        }
    }

    const fn rank(self) -> u8 {
        match self {
            ElementKind::U32 => 0,
            ElementKind::I32 => 1,
            ElementKind::U64 => 2,
            ElementKind::I64 => 3,
            ElementKind::F32 => 4,
            ElementKind::F64 => 5,
            ElementKind::C32 => 4,
            ElementKind::C64 => 5,
        }
    }

    /// Numeric promotion of two element kinds
    ///
    /// Integers promote to the wider (signed on ties) integer, any
    /// floating point operand wins over integers, and a complex operand
    /// yields the complex kind of the promoted real type.
    pub const fn promote(self, other: ElementKind) -> ElementKind {
        let complex = self.is_complex() || other.is_complex();
        let (a, b) = (self.real(), other.real());
        let real = if a.rank() >= b.rank() { a } else { b };
        if !complex {
            return real;
        }
        match real {
            ElementKind::F64 | ElementKind::I64 | ElementKind::U64 => ElementKind::C64,
            _ => ElementKind::C32,
        }
    }
}

/// Trait for types that can be stored as vector and matrix elements
///
/// All element types are plain numeric values:
/// - Copy: combined without allocation
/// - closed under `+`, `-`, `*`, `/`
/// - with additive and multiplicative identities
pub trait Element:
    Copy
    + PartialEq
    + Debug
    + Send
    + Sync
    + 'static
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    /// Kind of this element for type-resolution descriptors
    const KIND: ElementKind;

    /// Built-in (non-complex) numeric type
    const IS_BUILTIN: bool = true;

    /// Elements that own resizable storage cannot use the unrolled kernels
    const IS_RESIZABLE: bool = false;

    /// Complex conjugate, the identity for real elements
    fn conj(self) -> Self {
        self
    }

    /// Whether the element holds its default (zero) value
    fn is_default(&self) -> bool {
        self.is_zero()
    }

    /// Convert from f64 for generic construction
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_real_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$kind;

                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_real_element! {
    f32 => F32,
    f64 => F64,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
}

impl Element for Complex<f32> {
    const KIND: ElementKind = ElementKind::C32;
    const IS_BUILTIN: bool = false;

    fn conj(self) -> Self {
        Complex::conj(&self)
    }

    fn from_f64(value: f64) -> Self {
        Complex::new(value as f32, 0.0)
    }
}

impl Element for Complex<f64> {
    const KIND: ElementKind = ElementKind::C64;
    const IS_BUILTIN: bool = false;

    fn conj(self) -> Self {
        Complex::conj(&self)
    }

    fn from_f64(value: f64) -> Self {
        Complex::new(value, 0.0)
    }
}
