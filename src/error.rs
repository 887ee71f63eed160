//! Error taxonomy for the judging core.
//!
//! Variants never escape to queue clients: execution errors fold into a
//! failed `ExecutionResult` at the executor, and an unsupported language
//! folds into an error result at the jobs layer.

use thiserror::Error;

/// Errors produced while preparing or running submitted code
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Language not in the recognized set, rejected before any resource allocation
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Workspace directory could not be allocated or written
    #[error("workspace error: {0}")]
    Workspace(String),

    /// Toolchain rejected the source
    #[error("compilation failed: {0}")]
    Compilation(String),

    /// Wall-clock limit exceeded, process group killed
    #[error("execution timeout exceeded ({0}ms)")]
    Timeout(u64),

    /// Process could not be spawned or waited on
    #[error("runtime error: {0}")]
    Runtime(String),
}
