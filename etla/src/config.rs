//! Process-wide kernel configuration
//!
//! The assignment entry points without an explicit configuration read the
//! record installed here. It can be installed once, before the first
//! assignment; afterwards it is fixed for the lifetime of the process.

use std::sync::OnceLock;

use etla_core::KernelConfig;

static GLOBAL: OnceLock<KernelConfig> = OnceLock::new();

/// Install the process-wide configuration
///
/// Returns the rejected configuration if one was already installed or
/// the default was already in use.
pub fn install(config: KernelConfig) -> std::result::Result<(), KernelConfig> {
    GLOBAL.set(config)
}

/// The process-wide configuration, falling back to [`KernelConfig::default`]
pub fn global() -> &'static KernelConfig {
    GLOBAL.get_or_init(KernelConfig::default)
}

/// Parse a configuration from JSON; missing fields keep their defaults
#[cfg(feature = "serde")]
pub fn from_json(json: &str) -> serde_json::Result<KernelConfig> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_is_stable() {
        let first = global() as *const KernelConfig;
        let second = global() as *const KernelConfig;
        assert_eq!(first, second);
        assert!(install(KernelConfig::default()).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_partial() {
        let config = from_json(r#"{"row_major_threshold": 16, "exploit_symmetry": false}"#).unwrap();
        assert_eq!(config.row_major_threshold, 16);
        assert!(!config.exploit_symmetry);
        assert_eq!(config.column_major_threshold, KernelConfig::default().column_major_threshold);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(from_json("{\"smp_threshold\": \"many\"}").is_err());
    }
}
