//! Python adapter - CPython, source written verbatim
//!
//! No driver prelude: `input()` already reads stdin line by line.

use async_trait::async_trait;

use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::process::{CommandRunner, CommandSpec};
use crate::workspace::Workspace;

use super::{Language, LanguageAdapter};

const SOURCE_FILE: &str = "main.py";

pub struct Python;

#[async_trait]
impl LanguageAdapter for Python {
    fn language(&self) -> Language {
        Language::Python
    }

    async fn prepare(
        &self,
        workspace: &Workspace,
        code: &str,
        _runner: &dyn CommandRunner,
        _config: &JudgeConfig,
    ) -> Result<CommandSpec, JudgeError> {
        let source_path = workspace.path().join(SOURCE_FILE);
        tokio::fs::write(&source_path, code).await.map_err(|e| {
            JudgeError::Workspace(format!("failed to write {}: {}", source_path.display(), e))
        })?;

        Ok(CommandSpec::new("python3").arg(SOURCE_FILE))
    }
}
