use serde::Deserialize;

/// Bytes of script stack accounted to one call frame
pub const FRAME_BYTES: usize = 128;

/// Script environment settings, read from `bridge.json`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Memory ceiling for script values, in bytes
    pub memory_budget: usize,
    /// Stack budget for nested calls, in bytes
    pub stack_budget: usize,
    /// Operations a single script run may perform before it is stopped
    pub max_operations: u64,
    /// Standard library package: "standard" or "core"
    pub stdlib: String,
    /// Compile scripts without running them
    pub compile_only: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            memory_budget: 8 * 1024 * 1024,
            stack_budget: 8 * 1024,
            max_operations: 100_000,
            stdlib: "standard".to_string(),
            compile_only: false,
        }
    }
}

impl BridgeSettings {
    /// Call depth the stack budget allows
    pub fn max_call_levels(&self) -> usize {
        self.stack_budget / FRAME_BYTES
    }
}
