//! Language support - the adapter seam between source code and runnable commands
//!
//! Each supported language implements [`LanguageAdapter`]: it materializes the
//! submitted code inside a workspace (compiling when the language needs it)
//! and hands back the command that runs it. Everything above this seam is
//! language-agnostic.

pub mod java;
pub mod javascript;
pub mod python;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::process::{CommandRunner, CommandSpec};
use crate::workspace::Workspace;

pub use java::Java;
pub use javascript::Javascript;
pub use python::Python;

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
    Java,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "javascript" => Ok(Language::Javascript),
            "python" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            other => Err(JudgeError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Per-language preparation of a workspace
#[async_trait]
pub trait LanguageAdapter: Send + Sync {
    /// Language this adapter handles
    fn language(&self) -> Language;

    /// Write (and compile, where applicable) `code` into the workspace and
    /// return the command that executes it from the workspace directory.
    async fn prepare(
        &self,
        workspace: &Workspace,
        code: &str,
        runner: &dyn CommandRunner,
        config: &JudgeConfig,
    ) -> Result<CommandSpec, JudgeError>;
}

/// Adapter lookup for a language
pub fn adapter_for(language: Language) -> &'static dyn LanguageAdapter {
    match language {
        Language::Javascript => &Javascript,
        Language::Python => &Python,
        Language::Java => &Java,
    }
}
