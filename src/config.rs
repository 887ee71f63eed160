//! Worker configuration
//!
//! Execution limits and paths, loaded from the environment. The config is an
//! explicit value passed into constructors, not process-global state, so the
//! core stays testable in isolation.

use std::path::PathBuf;

use tracing::warn;

/// Limits and paths honored by the judging core
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Wall-clock limit for one execution in milliseconds (default: 5000ms)
    pub execution_timeout_ms: u64,
    /// Wall-clock limit for a compile step in milliseconds (default: 10000ms)
    pub compile_timeout_ms: u64,
    /// Retained bytes per captured stream (default: 10000)
    pub max_output_bytes: usize,
    /// Directory that holds per-execution workspaces (default: "temp")
    pub workspace_root: PathBuf,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            execution_timeout_ms: 5_000,
            compile_timeout_ms: 10_000,
            max_output_bytes: 10_000,
            workspace_root: PathBuf::from("temp"),
        }
    }
}

impl JudgeConfig {
    /// Load configuration from environment variables.
    /// Unset or invalid values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            execution_timeout_ms: env_u64("EXECUTION_TIMEOUT_MS", defaults.execution_timeout_ms),
            compile_timeout_ms: env_u64("COMPILE_TIMEOUT_MS", defaults.compile_timeout_ms),
            max_output_bytes: env_u64("MAX_OUTPUT_BYTES", defaults.max_output_bytes as u64)
                as usize,
            workspace_root: std::env::var("WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
        }
    }

    pub fn with_execution_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.execution_timeout_ms = timeout_ms;
        self
    }

    pub fn with_compile_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.compile_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_output_bytes(mut self, max_bytes: usize) -> Self {
        self.max_output_bytes = max_bytes;
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }
}

/// Read a numeric env var, warning and falling back on garbage values
fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid {} value {:?}, using default {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}
