//! Kernel configuration
//!
//! Thresholds and block sizes that steer the kernel selection. The
//! defaults are tuned for common desktop caches; every value can be
//! overridden through the `with_*` builder methods.

/// Default output size (rows * columns) below which a row-major target uses the small kernel
pub const SMAT_DMAT_MULT_THRESHOLD: usize = 4900;

/// Default output size below which a column-major target uses the small kernel
pub const COLUMN_MAJOR_SMALL_THRESHOLD: usize = 625;

/// Default output size from which a product may be assigned in parallel
pub const SMP_SMAT_DMAT_MULT_THRESHOLD: usize = 22500;

/// Column block width of the default kernel
pub const DEFAULT_BLOCK: usize = 64;

/// Column block width of the small optimized kernel for row-major targets
pub const ROW_MAJOR_SMALL_BLOCK: usize = 128;

/// Column block width of the small optimized kernel for column-major targets
pub const COLUMN_MAJOR_SMALL_BLOCK: usize = 64;

/// Size class of an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KernelSize {
    Small,
    Large,
}

/// Configuration for the kernel dispatch engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KernelConfig {
    /// Small/large threshold for row-major targets
    pub row_major_threshold: usize,
    /// Small/large threshold for column-major targets
    pub column_major_threshold: usize,
    /// Minimum output size for parallel assignment
    pub smp_threshold: usize,
    /// Enable the unrolled kernels for plain numeric elements
    pub use_optimized_kernels: bool,
    /// Enable the transpose rewrite for symmetric operands
    pub exploit_symmetry: bool,
    /// Column block width of the default kernel
    pub default_block: usize,
    /// Column block width of the small optimized kernel (row-major target)
    pub row_major_small_block: usize,
    /// Column block width of the small optimized kernel (column-major target)
    pub column_major_small_block: usize,
}

impl KernelConfig {
    /// Set both small/large thresholds
    pub fn with_thresholds(mut self, row_major: usize, column_major: usize) -> Self {
        self.row_major_threshold = row_major;
        self.column_major_threshold = column_major;
        self
    }

    /// Set the parallel assignment threshold
    pub fn with_smp_threshold(mut self, threshold: usize) -> Self {
        self.smp_threshold = threshold;
        self
    }

    pub fn with_optimized_kernels(mut self, enabled: bool) -> Self {
        self.use_optimized_kernels = enabled;
        self
    }

    /// Enable or disable the symmetric-operand rewrite
    pub fn with_exploit_symmetry(mut self, enabled: bool) -> Self {
        self.exploit_symmetry = enabled;
        self
    }

    /// Set the column block widths (default kernel, small row-major, small column-major)
    pub fn with_blocks(mut self, default: usize, row_major_small: usize, column_major_small: usize) -> Self {
        self.default_block = default.max(1);
        self.row_major_small_block = row_major_small.max(1);
        self.column_major_small_block = column_major_small.max(1);
        self
    }

    /// Size class of an assignment into a `rows x columns` target
    pub const fn kernel_size(&self, rows: usize, columns: usize, row_major_target: bool) -> KernelSize {
        let size = rows.saturating_mul(columns);
        let threshold = if row_major_target {
            self.row_major_threshold
        } else {
            self.column_major_threshold
        };
        if size < threshold {
            KernelSize::Small
        } else {
            KernelSize::Large
        }
    }

    /// Block width of the small optimized kernel for the given target order
    pub const fn small_block(&self, row_major_target: bool) -> usize {
        if row_major_target {
            self.row_major_small_block
        } else {
            self.column_major_small_block
        }
    }

    /// Whether a `rows x columns` output is large enough for parallel assignment
    pub const fn is_smp_sized(&self, rows: usize, columns: usize) -> bool {
        rows.saturating_mul(columns) >= self.smp_threshold
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            row_major_threshold: SMAT_DMAT_MULT_THRESHOLD,
            column_major_threshold: COLUMN_MAJOR_SMALL_THRESHOLD,
            smp_threshold: SMP_SMAT_DMAT_MULT_THRESHOLD,
            use_optimized_kernels: true,
            exploit_symmetry: true,
            default_block: DEFAULT_BLOCK,
            row_major_small_block: ROW_MAJOR_SMALL_BLOCK,
            column_major_small_block: COLUMN_MAJOR_SMALL_BLOCK,
        }
    }
}
