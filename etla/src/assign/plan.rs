//! Kernel selection for sparse x dense products
//!
//! [`plan`] is a pure function of the operand descriptors and the kernel
//! configuration. The product node builds a [`PlanInput`] from its
//! operand types and runtime structure, and executes whatever plan comes
//! back. Keeping the decision separate from the execution makes every
//! dispatch rule testable without touching matrix data.

use etla_core::{Element, KernelConfig, KernelSize, ProductDecl, Structure};

/// Loop nest used to compute the product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// One column non-zero at a time, blocked by `default_block`
    Default,
    /// Column kernel unrolled over four non-zeros, blocked by the small block width
    OptimizedSmall,
    /// Convert the sparse operand to row-major and run [`Kernel::RowWise`]
    OptimizedLarge,
    /// Row-major sparse operand: one row of the result per sparse row
    RowWise,
}

/// Everything the planner needs to know about one product assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanInput {
    pub rows: usize,
    pub columns: usize,
    pub lhs_structure: Structure,
    pub rhs_structure: Structure,
    pub lhs_row_major: bool,
    pub rhs_row_major: bool,
    pub target_row_major: bool,
    pub target_symmetric: bool,
    /// The sparse operand is a computation or requires evaluation
    pub lhs_needs_evaluation: bool,
    pub rhs_needs_evaluation: bool,
    /// Element type of either operand or the target owns resizable storage
    pub resizable_elements: bool,
    pub decl: ProductDecl,
}

impl PlanInput {
    /// Descriptor for an `A * B` assignment into a target with element type `T`
    #[allow(clippy::too_many_arguments)]
    pub fn new<T: Element>(
        rows: usize,
        columns: usize,
        lhs: (Structure, bool, bool),
        rhs: (Structure, bool, bool),
        target_row_major: bool,
        target_symmetric: bool,
        decl: ProductDecl,
    ) -> Self {
        Self {
            rows,
            columns,
            lhs_structure: lhs.0,
            lhs_row_major: lhs.1,
            lhs_needs_evaluation: lhs.2,
            rhs_structure: rhs.0,
            rhs_row_major: rhs.1,
            rhs_needs_evaluation: rhs.2,
            target_row_major,
            target_symmetric,
            resizable_elements: T::IS_RESIZABLE,
            decl,
        }
    }
}

/// Outcome of the kernel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultPlan {
    /// Replace the symmetric column-major sparse operand by its transpose
    pub transpose_lhs: bool,
    /// Replace the symmetric column-major dense operand by its transpose
    pub transpose_rhs: bool,
    pub evaluate_lhs: bool,
    pub evaluate_rhs: bool,
    pub size: KernelSize,
    pub kernel: Kernel,
    pub decl: ProductDecl,
}

impl MultPlan {
    /// Symmetry was exploited through a transpose rewrite
    pub fn is_restructured(&self) -> bool {
        self.transpose_lhs || self.transpose_rhs
    }

    /// Operands are materialized before the kernel runs and no rewrite applies
    pub fn is_evaluation_required(&self) -> bool {
        (self.evaluate_lhs || self.evaluate_rhs) && !self.is_restructured()
    }
}

/// Choose restructuring, evaluation and kernel for one product assignment
pub fn plan(input: &PlanInput, config: &KernelConfig) -> MultPlan {
    let exploit = config.exploit_symmetry && !input.target_symmetric;
    let transpose_lhs = exploit && input.lhs_structure.is_symmetric() && !input.lhs_row_major;
    let transpose_rhs = exploit && input.rhs_structure.is_symmetric() && !input.rhs_row_major;

    // transposing flips the storage order and, for a symmetric operand, nothing else
    let lhs_row_major = input.lhs_row_major != transpose_lhs;

    let size = config.kernel_size(input.rows, input.columns, input.target_row_major);
    let optimized = config.use_optimized_kernels
        && !input.rhs_structure.is_diagonal()
        && !input.resizable_elements;

    let kernel = if lhs_row_major {
        Kernel::RowWise
    } else if !optimized {
        Kernel::Default
    } else {
        match size {
            KernelSize::Small => Kernel::OptimizedSmall,
            KernelSize::Large => Kernel::OptimizedLarge,
        }
    };

    MultPlan {
        transpose_lhs,
        transpose_rhs,
        evaluate_lhs: input.lhs_needs_evaluation,
        evaluate_rhs: input.rhs_needs_evaluation,
        size,
        kernel,
        decl: input.decl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(lhs: Structure, rhs: Structure) -> PlanInput {
        PlanInput::new::<f64>(
            10,
            10,
            (lhs, false, false),
            (rhs, false, false),
            true,
            false,
            ProductDecl::NONE,
        )
    }

    #[test]
    fn test_column_major_general_operands() {
        let config = KernelConfig::default();
        let p = plan(&input(Structure::GENERAL, Structure::GENERAL), &config);
        assert!(!p.is_restructured());
        assert_eq!(p.size, KernelSize::Small);
        assert_eq!(p.kernel, Kernel::OptimizedSmall);

        let p = plan(&input(Structure::GENERAL, Structure::GENERAL), &config.with_thresholds(50, 50));
        assert_eq!(p.size, KernelSize::Large);
        assert_eq!(p.kernel, Kernel::OptimizedLarge);

        let p = plan(&input(Structure::GENERAL, Structure::GENERAL), &config.with_optimized_kernels(false));
        assert_eq!(p.kernel, Kernel::Default);
    }

    #[test]
    fn test_symmetric_operands_are_transposed() {
        let config = KernelConfig::default();
        let p = plan(&input(Structure::SYMMETRIC, Structure::GENERAL), &config);
        assert!(p.transpose_lhs && !p.transpose_rhs);
        assert_eq!(p.kernel, Kernel::RowWise);

        let p = plan(&input(Structure::GENERAL, Structure::SYMMETRIC), &config);
        assert!(!p.transpose_lhs && p.transpose_rhs);
        assert_eq!(p.kernel, Kernel::OptimizedSmall);

        let p = plan(&input(Structure::SYMMETRIC, Structure::SYMMETRIC), &config.with_exploit_symmetry(false));
        assert!(!p.is_restructured());
    }

    #[test]
    fn test_symmetric_target_disables_rewrite() {
        let mut descriptor = input(Structure::SYMMETRIC, Structure::SYMMETRIC);
        descriptor.target_symmetric = true;
        assert!(!plan(&descriptor, &KernelConfig::default()).is_restructured());
    }

    #[test]
    fn test_row_major_operands_are_not_transposed() {
        let mut descriptor = input(Structure::SYMMETRIC, Structure::GENERAL);
        descriptor.lhs_row_major = true;
        let p = plan(&descriptor, &KernelConfig::default());
        assert!(!p.transpose_lhs);
        assert_eq!(p.kernel, Kernel::RowWise);
    }

    #[test]
    fn test_diagonal_rhs_uses_default_kernel() {
        let p = plan(&input(Structure::GENERAL, Structure::DIAGONAL), &KernelConfig::default());
        assert_eq!(p.kernel, Kernel::Default);
    }

    #[test]
    fn test_threshold_depends_on_target_order() {
        let mut descriptor = input(Structure::GENERAL, Structure::GENERAL);
        descriptor.rows = 30;
        descriptor.columns = 30;
        assert_eq!(plan(&descriptor, &KernelConfig::default()).size, KernelSize::Small);
        descriptor.target_row_major = false;
        assert_eq!(plan(&descriptor, &KernelConfig::default()).size, KernelSize::Large);
    }

    #[test]
    fn test_evaluation_requirement() {
        let mut descriptor = input(Structure::GENERAL, Structure::GENERAL);
        descriptor.rhs_needs_evaluation = true;
        let p = plan(&descriptor, &KernelConfig::default());
        assert!(p.evaluate_rhs && p.is_evaluation_required());

        descriptor.lhs_structure = Structure::SYMMETRIC;
        let p = plan(&descriptor, &KernelConfig::default());
        assert!(p.evaluate_rhs && !p.is_evaluation_required());
    }
}
