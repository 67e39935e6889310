//! Capabilities shared by every vector and matrix operand

/// Address of an assignment target, used for aliasing checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(usize);

impl Address {
    /// Address of the given value
    pub fn of<T: ?Sized>(value: &T) -> Self {
        Address(value as *const T as *const () as usize)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }
}

/// Compile-time and runtime capability queries
///
/// Every flag defaults to "no capability": a type asserts a capability
/// only by overriding the constant or method explicitly.
pub trait Expression {
    /// The type is an expression node rather than a container
    const IS_EXPRESSION: bool = false;

    /// Element access performs a computation (e.g. an inner product)
    const IS_COMPUTATION: bool = false;

    /// The operand must be materialized before it can be assigned from
    const REQUIRES_EVALUATION: bool = false;

    /// Vectorized `load` access is available
    const SIMD_ENABLED: bool = false;

    /// The type may take part in a multi-threaded assignment
    const SMP_ASSIGNABLE: bool = false;

    /// `data()` exposes contiguous storage
    const HAS_CONST_DATA_ACCESS: bool = false;

    /// Whether the expression may share storage with the given address
    fn can_alias(&self, _alias: Address) -> bool {
        false
    }

    /// Whether the expression definitely shares storage with the given address
    fn is_aliased(&self, _alias: Address) -> bool {
        false
    }

    /// Whether the underlying storage is suitably aligned for vectorized access
    fn is_aligned(&self) -> bool {
        false
    }

    /// Whether the expression may be assigned in parallel. The size
    /// threshold is checked separately by the parallel entry points.
    fn can_smp_assign(&self) -> bool {
        false
    }
}

impl<E: Expression + ?Sized> Expression for &E {
    const IS_EXPRESSION: bool = E::IS_EXPRESSION;
    const IS_COMPUTATION: bool = E::IS_COMPUTATION;
    const REQUIRES_EVALUATION: bool = E::REQUIRES_EVALUATION;
    const SIMD_ENABLED: bool = E::SIMD_ENABLED;
    const SMP_ASSIGNABLE: bool = E::SMP_ASSIGNABLE;
    const HAS_CONST_DATA_ACCESS: bool = E::HAS_CONST_DATA_ACCESS;

    fn can_alias(&self, alias: Address) -> bool {
        (**self).can_alias(alias)
    }

    fn is_aliased(&self, alias: Address) -> bool {
        (**self).is_aliased(alias)
    }

    fn is_aligned(&self) -> bool {
        (**self).is_aligned()
    }

    fn can_smp_assign(&self) -> bool {
        (**self).can_smp_assign()
    }
}
