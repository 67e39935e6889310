//! Structural properties of matrices and their propagation through expressions
//!
//! A [`Structure`] is a small record of boolean facts (symmetric, Hermitian,
//! lower, uni-lower, strictly-lower and the upper analogues). Every
//! expression node derives its record from its operands through the pure,
//! monotone formulas in this module.

const SYMMETRIC: u16 = 1;
const HERMITIAN: u16 = 1 << 1;
const LOWER: u16 = 1 << 2;
const UNI_LOWER: u16 = 1 << 3;
const STRICTLY_LOWER: u16 = 1 << 4;
const UPPER: u16 = 1 << 5;
const UNI_UPPER: u16 = 1 << 6;
const STRICTLY_UPPER: u16 = 1 << 7;

/// Structural flags of a matrix type or expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Structure {
    bits: u16,
}

impl Structure {
    /// No known structure
    pub const GENERAL: Structure = Structure { bits: 0 };
    pub const SYMMETRIC: Structure = Structure::from_bits(SYMMETRIC);
    pub const HERMITIAN: Structure = Structure::from_bits(HERMITIAN);
    pub const LOWER: Structure = Structure::from_bits(LOWER);
    pub const UNI_LOWER: Structure = Structure::from_bits(UNI_LOWER);
    pub const STRICTLY_LOWER: Structure = Structure::from_bits(STRICTLY_LOWER);
    pub const UPPER: Structure = Structure::from_bits(UPPER);
    pub const UNI_UPPER: Structure = Structure::from_bits(UNI_UPPER);
    pub const STRICTLY_UPPER: Structure = Structure::from_bits(STRICTLY_UPPER);
    pub const DIAGONAL: Structure = Structure::from_bits(LOWER | UPPER);
    pub const IDENTITY: Structure = Structure::from_bits(UNI_LOWER | UNI_UPPER);

    /// Build a record from raw bits, closing it under implication
    ///
    /// Uni- and strictly-triangular imply triangular, lower and upper
    /// together imply symmetric, and symmetric plus one triangle implies
    /// the other. A symmetric record carries unit and strict diagonals
    /// over to both triangles.
    pub const fn from_bits(bits: u16) -> Structure {
        let mut bits = bits;
        if bits & (UNI_LOWER | STRICTLY_LOWER) != 0 {
            bits |= LOWER;
        }
        if bits & (UNI_UPPER | STRICTLY_UPPER) != 0 {
            bits |= UPPER;
        }
        if bits & SYMMETRIC != 0 && bits & (LOWER | UPPER) != 0 {
            bits |= LOWER | UPPER;
        }
        if bits & LOWER != 0 && bits & UPPER != 0 {
            bits |= SYMMETRIC;
        }
        if bits & SYMMETRIC != 0 {
            if bits & (UNI_LOWER | UNI_UPPER) != 0 {
                bits |= UNI_LOWER | UNI_UPPER;
            }
            if bits & (STRICTLY_LOWER | STRICTLY_UPPER) != 0 {
                bits |= STRICTLY_LOWER | STRICTLY_UPPER;
            }
        }
        Structure { bits }
    }

    pub const fn bits(self) -> u16 {
        self.bits
    }

    pub const fn union(self, other: Structure) -> Structure {
        Structure::from_bits(self.bits | other.bits)
    }

    /// Whether every flag of `other` is also set in `self`
    pub const fn contains(self, other: Structure) -> bool {
        self.bits & other.bits == other.bits
    }

    pub const fn is_symmetric(self) -> bool {
        self.bits & SYMMETRIC != 0
    }

    pub const fn is_hermitian(self) -> bool {
        self.bits & HERMITIAN != 0
    }

    pub const fn is_lower(self) -> bool {
        self.bits & LOWER != 0
    }

    pub const fn is_uni_lower(self) -> bool {
        self.bits & UNI_LOWER != 0
    }

    pub const fn is_strictly_lower(self) -> bool {
        self.bits & STRICTLY_LOWER != 0
    }

    pub const fn is_upper(self) -> bool {
        self.bits & UPPER != 0
    }

    pub const fn is_uni_upper(self) -> bool {
        self.bits & UNI_UPPER != 0
    }

    pub const fn is_strictly_upper(self) -> bool {
        self.bits & STRICTLY_UPPER != 0
    }

    pub const fn is_diagonal(self) -> bool {
        self.is_lower() && self.is_upper()
    }

    pub const fn is_triangular(self) -> bool {
        self.is_lower() || self.is_upper()
    }

    pub const fn is_uni_triangular(self) -> bool {
        self.is_uni_lower() || self.is_uni_upper()
    }

    pub const fn is_strictly_triangular(self) -> bool {
        self.is_strictly_lower() || self.is_strictly_upper()
    }

    pub const fn is_identity(self) -> bool {
        self.is_uni_lower() && self.is_uni_upper()
    }

    /// Structure of the transposed operand
    pub const fn transposed(self) -> Structure {
        let mut bits = self.bits & (SYMMETRIC | HERMITIAN);
        if self.is_lower() {
            bits |= UPPER;
        }
        if self.is_uni_lower() {
            bits |= UNI_UPPER;
        }
        if self.is_strictly_lower() {
            bits |= STRICTLY_UPPER;
        }
        if self.is_upper() {
            bits |= LOWER;
        }
        if self.is_uni_upper() {
            bits |= UNI_LOWER;
        }
        if self.is_strictly_upper() {
            bits |= STRICTLY_LOWER;
        }
        Structure::from_bits(bits)
    }

    /// Structure with a declared property asserted unconditionally
    pub const fn declare(self, kind: DeclKind) -> Structure {
        self.union(kind.structure())
    }
}

/// Kinds of structure declarations (`declsym`, `declherm`, `decllow`, `declupp`, `decldiag`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeclKind {
    Symmetric,
    Hermitian,
    Lower,
    Upper,
    Diagonal,
}

impl DeclKind {
    pub const fn structure(self) -> Structure {
        match self {
            DeclKind::Symmetric => Structure::SYMMETRIC,
            DeclKind::Hermitian => Structure::HERMITIAN,
            DeclKind::Lower => Structure::LOWER,
            DeclKind::Upper => Structure::UPPER,
            DeclKind::Diagonal => Structure::DIAGONAL,
        }
    }

    /// Whether an operand with structure `s` already satisfies the declaration
    pub const fn is_satisfied_by(self, s: Structure) -> bool {
        match self {
            DeclKind::Symmetric => s.is_symmetric(),
            DeclKind::Hermitian => s.is_hermitian(),
            DeclKind::Lower => s.is_lower(),
            DeclKind::Upper => s.is_upper(),
            DeclKind::Diagonal => s.is_diagonal(),
        }
    }

    /// Whether a uni-triangular operand collapses to the identity under this declaration
    pub const fn collapses_uni_triangular(self) -> bool {
        matches!(
            self,
            DeclKind::Symmetric | DeclKind::Hermitian | DeclKind::Diagonal
        )
    }
}

/// Declared flags of a matrix product (SF, HF, LF, UF)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProductDecl {
    pub symmetric: bool,
    pub hermitian: bool,
    pub lower: bool,
    pub upper: bool,
}

impl ProductDecl {
    pub const NONE: ProductDecl = ProductDecl::new(false, false, false, false);

    pub const fn new(symmetric: bool, hermitian: bool, lower: bool, upper: bool) -> Self {
        Self {
            symmetric,
            hermitian,
            lower,
            upper,
        }
    }

    /// Add a declaration to the flag set
    pub const fn with(self, kind: DeclKind) -> Self {
        let mut next = self;
        match kind {
            DeclKind::Symmetric => next.symmetric = true,
            DeclKind::Hermitian => next.hermitian = true,
            DeclKind::Lower => next.lower = true,
            DeclKind::Upper => next.upper = true,
            DeclKind::Diagonal => {
                next.lower = true;
                next.upper = true;
            }
        }
        next
    }

    /// Result is filled through symmetric mirroring
    pub const fn sym(self) -> bool {
        self.symmetric && !(self.hermitian || self.lower || self.upper)
    }

    /// Result is filled through Hermitian (conjugated) mirroring
    pub const fn herm(self) -> bool {
        self.hermitian && !(self.lower || self.upper)
    }

    /// Only the lower part is computed
    pub const fn low(self) -> bool {
        self.lower || ((self.symmetric || self.hermitian) && self.upper)
    }

    /// Only the upper part is computed
    pub const fn upp(self) -> bool {
        self.upper || ((self.symmetric || self.hermitian) && self.lower)
    }

    /// Declaration applied when a product is forwarded to another kernel
    pub const fn forward(self) -> Option<DeclKind> {
        if self.herm() {
            Some(DeclKind::Hermitian)
        } else if self.sym() {
            Some(DeclKind::Symmetric)
        } else if self.low() && self.upp() {
            Some(DeclKind::Diagonal)
        } else if self.low() {
            Some(DeclKind::Lower)
        } else if self.upp() {
            Some(DeclKind::Upper)
        } else {
            None
        }
    }
}

/// Structure of the product `l * r` carrying declared flags `decl`
///
/// `builtin` tells whether the result element is a built-in (real) type,
/// for which Hermitian implies symmetric.
pub const fn product(l: Structure, r: Structure, decl: ProductDecl, builtin: bool) -> Structure {
    let sf_or_hf = decl.symmetric || decl.hermitian;
    let mut bits = 0;

    if decl.symmetric || (decl.hermitian && builtin) || (decl.lower && decl.upper) {
        bits |= SYMMETRIC;
    }
    if decl.hermitian {
        bits |= HERMITIAN;
    }
    if decl.lower
        || (l.is_lower() && r.is_lower())
        || (sf_or_hf && l.is_upper() && r.is_upper())
    {
        bits |= LOWER;
    }
    if (l.is_uni_lower() && r.is_uni_lower())
        || (sf_or_hf && l.is_uni_upper() && r.is_uni_upper())
    {
        bits |= UNI_LOWER;
    }
    if (l.is_strictly_lower() && r.is_lower())
        || (r.is_strictly_lower() && l.is_lower())
        || (sf_or_hf
            && ((l.is_strictly_upper() && r.is_upper()) || (r.is_strictly_upper() && l.is_upper())))
    {
        bits |= STRICTLY_LOWER;
    }
    if decl.upper
        || (l.is_upper() && r.is_upper())
        || (sf_or_hf && l.is_lower() && r.is_lower())
    {
        bits |= UPPER;
    }
    if (l.is_uni_upper() && r.is_uni_upper())
        || (sf_or_hf && l.is_uni_lower() && r.is_uni_lower())
    {
        bits |= UNI_UPPER;
    }
    if (l.is_strictly_upper() && r.is_upper())
        || (r.is_strictly_upper() && l.is_upper())
        || (sf_or_hf
            && ((l.is_strictly_lower() && r.is_lower()) || (r.is_strictly_lower() && l.is_lower())))
    {
        bits |= STRICTLY_UPPER;
    }
    Structure::from_bits(bits)
}

/// Structure of the elementwise sum `l + r`
pub const fn sum(l: Structure, r: Structure) -> Structure {
    let mut bits = common(l, r);
    if (l.is_uni_lower() && r.is_strictly_lower()) || (l.is_strictly_lower() && r.is_uni_lower()) {
        bits |= UNI_LOWER;
    }
    if (l.is_uni_upper() && r.is_strictly_upper()) || (l.is_strictly_upper() && r.is_uni_upper()) {
        bits |= UNI_UPPER;
    }
    if l.is_strictly_lower() && r.is_strictly_lower() {
        bits |= STRICTLY_LOWER;
    }
    if l.is_strictly_upper() && r.is_strictly_upper() {
        bits |= STRICTLY_UPPER;
    }
    Structure::from_bits(bits)
}

/// Structure of the elementwise difference `l - r`
pub const fn difference(l: Structure, r: Structure) -> Structure {
    let mut bits = common(l, r);
    if l.is_uni_lower() && r.is_strictly_lower() {
        bits |= UNI_LOWER;
    }
    if l.is_uni_upper() && r.is_strictly_upper() {
        bits |= UNI_UPPER;
    }
    if (l.is_strictly_lower() && r.is_strictly_lower()) || (l.is_uni_lower() && r.is_uni_lower()) {
        bits |= STRICTLY_LOWER;
    }
    if (l.is_strictly_upper() && r.is_strictly_upper()) || (l.is_uni_upper() && r.is_uni_upper()) {
        bits |= STRICTLY_UPPER;
    }
    Structure::from_bits(bits)
}

/// Structure of the Schur (elementwise) product `l % r`
pub const fn schur(l: Structure, r: Structure) -> Structure {
    let mut bits = 0;
    if l.is_symmetric() && r.is_symmetric() {
        bits |= SYMMETRIC;
    }
    if l.is_hermitian() && r.is_hermitian() {
        bits |= HERMITIAN;
    }
    if l.is_lower() || r.is_lower() {
        bits |= LOWER;
    }
    if l.is_upper() || r.is_upper() {
        bits |= UPPER;
    }
    if l.is_uni_lower() && r.is_uni_lower() {
        bits |= UNI_LOWER;
    }
    if l.is_uni_upper() && r.is_uni_upper() {
        bits |= UNI_UPPER;
    }
    if l.is_strictly_lower() || r.is_strictly_lower() {
        bits |= STRICTLY_LOWER;
    }
    if l.is_strictly_upper() || r.is_strictly_upper() {
        bits |= STRICTLY_UPPER;
    }
    Structure::from_bits(bits)
}

/// Structure of `s * m` for a scalar `s`
///
/// Scaling keeps the zero pattern and symmetry but not the unit diagonal;
/// Hermitian survives only a real scalar.
pub const fn scaled(m: Structure, real_scalar: bool) -> Structure {
    let mut bits = m.bits & (SYMMETRIC | LOWER | STRICTLY_LOWER | UPPER | STRICTLY_UPPER);
    if real_scalar && m.is_hermitian() {
        bits |= HERMITIAN;
    }
    Structure::from_bits(bits)
}

/// Structure of an elementwise map `op(m)`
///
/// Triangular flags survive only if `op(0) == 0`, unit diagonals only if
/// additionally `op(1) == 1`.
pub const fn map(m: Structure, zero_preserving: bool, one_preserving: bool) -> Structure {
    let mut bits = m.bits & SYMMETRIC;
    if zero_preserving {
        bits |= m.bits & (LOWER | STRICTLY_LOWER | UPPER | STRICTLY_UPPER);
        if one_preserving {
            bits |= m.bits & (UNI_LOWER | UNI_UPPER);
        }
    }
    Structure::from_bits(bits)
}

/// Bits shared by sums and differences
const fn common(l: Structure, r: Structure) -> u16 {
    let mut bits = 0;
    if l.is_symmetric() && r.is_symmetric() {
        bits |= SYMMETRIC;
    }
    if l.is_hermitian() && r.is_hermitian() {
        bits |= HERMITIAN;
    }
    if l.is_lower() && r.is_lower() {
        bits |= LOWER;
    }
    if l.is_upper() && r.is_upper() {
        bits |= UPPER;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_rules() {
        assert!(Structure::UNI_LOWER.is_lower());
        assert!(Structure::STRICTLY_UPPER.is_upper());
        assert!(Structure::DIAGONAL.is_symmetric());
        assert!(Structure::SYMMETRIC.union(Structure::LOWER).is_diagonal());
        assert!(Structure::IDENTITY.is_identity());
        assert!(!Structure::GENERAL.is_triangular());
    }

    #[test]
    fn test_symmetric_closure_mirrors_diagonal_flags() {
        let uni = Structure::SYMMETRIC.union(Structure::UNI_LOWER);
        assert!(uni.is_uni_upper());
        assert!(uni.is_identity());
        assert_eq!(Structure::UNI_UPPER.union(Structure::SYMMETRIC), uni);

        let strict = Structure::SYMMETRIC.union(Structure::STRICTLY_LOWER);
        assert!(strict.is_strictly_upper());
        assert!(strict.is_diagonal());
        assert!(Structure::UNI_LOWER.union(Structure::UPPER).is_uni_upper());
        assert!(!Structure::UNI_LOWER.is_uni_upper());
    }

    #[test]
    fn test_product_declared_flags() {
        let g = Structure::GENERAL;
        assert!(product(g, g, ProductDecl::NONE.with(DeclKind::Symmetric), true).is_symmetric());
        let herm = product(g, g, ProductDecl::NONE.with(DeclKind::Hermitian), false);
        assert!(herm.is_hermitian());
        assert!(!herm.is_symmetric());
        assert!(product(g, g, ProductDecl::NONE.with(DeclKind::Hermitian), true).is_symmetric());
        assert!(product(g, g, ProductDecl::NONE.with(DeclKind::Diagonal), true).is_symmetric());
    }

    #[test]
    fn test_product_triangular_propagation() {
        let l = Structure::LOWER;
        let sl = Structure::STRICTLY_LOWER;
        let ul = Structure::UNI_LOWER;
        assert!(product(l, l, ProductDecl::NONE, true).is_lower());
        assert!(!product(l, Structure::UPPER, ProductDecl::NONE, true).is_triangular());
        assert!(product(sl, l, ProductDecl::NONE, true).is_strictly_lower());
        assert!(product(l, sl, ProductDecl::NONE, true).is_strictly_lower());
        assert!(product(ul, ul, ProductDecl::NONE, true).is_uni_lower());

        let sym = ProductDecl::NONE.with(DeclKind::Symmetric);
        let upp = product(Structure::UPPER, Structure::UPPER, sym, true);
        assert!(upp.is_lower());
        assert!(upp.is_upper());
        let su = product(Structure::STRICTLY_UPPER, Structure::UPPER, sym, true);
        assert!(su.is_strictly_lower());
    }

    #[test]
    fn test_product_decl_derived_flags() {
        let d = ProductDecl::new(true, false, false, false);
        assert!(d.sym() && !d.herm() && !d.low() && !d.upp());
        assert_eq!(d.forward(), Some(DeclKind::Symmetric));

        let d = ProductDecl::new(true, true, false, false);
        assert!(!d.sym() && d.herm());
        assert_eq!(d.forward(), Some(DeclKind::Hermitian));

        let d = ProductDecl::new(true, false, false, true);
        assert!(!d.sym() && d.low() && d.upp());
        assert_eq!(d.forward(), Some(DeclKind::Diagonal));

        assert_eq!(ProductDecl::NONE.with(DeclKind::Lower).forward(), Some(DeclKind::Lower));
        assert_eq!(ProductDecl::NONE.forward(), None);
    }

    #[test]
    fn test_elementwise_rules() {
        let ul = Structure::UNI_LOWER;
        let sl = Structure::STRICTLY_LOWER;
        assert!(sum(ul, sl).is_uni_lower());
        assert!(!sum(ul, ul).is_uni_lower());
        assert!(sum(ul, ul).is_lower());
        assert!(difference(ul, ul).is_strictly_lower());
        assert!(schur(Structure::LOWER, Structure::GENERAL).is_lower());
        assert!(schur(Structure::LOWER, Structure::UPPER).is_diagonal());
        assert!(!sum(Structure::SYMMETRIC, Structure::GENERAL).is_symmetric());
    }

    #[test]
    fn test_transpose_scale_map() {
        let t = Structure::UNI_LOWER.transposed();
        assert!(t.is_uni_upper());
        assert!(!t.is_lower());
        assert!(!scaled(Structure::UNI_LOWER, true).is_uni_lower());
        assert!(scaled(Structure::UNI_LOWER, true).is_lower());
        assert!(!scaled(Structure::HERMITIAN, false).is_hermitian());
        assert!(map(Structure::UNI_UPPER, true, true).is_uni_upper());
        assert!(!map(Structure::UPPER, false, false).is_upper());
        assert!(map(Structure::SYMMETRIC, false, false).is_symmetric());
    }
}
