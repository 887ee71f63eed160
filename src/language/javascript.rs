//! JavaScript adapter - Node.js with a readline driver prelude

use async_trait::async_trait;

use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::process::{CommandRunner, CommandSpec};
use crate::workspace::Workspace;

use super::{Language, LanguageAdapter};

const SOURCE_FILE: &str = "main.js";

/// Injected above the submission so the competitive-programming style
/// `readline()` / `readLine()` helpers exist. All of stdin is read up front;
/// each call returns the next line, or `undefined` past the end.
const DRIVER_PRELUDE: &str = r#"const __input = require('fs').readFileSync(0, 'utf8');
const __lines = __input.split('\n');
let __lineCursor = 0;
function readline() { return __lines[__lineCursor++]; }
const readLine = readline;"#;

fn assemble_driver(code: &str) -> String {
    format!("{}\n{}\n", DRIVER_PRELUDE, code)
}

/// Node.js runner. No compile step; the driver prelude is prepended at
/// write time.
pub struct Javascript;

#[async_trait]
impl LanguageAdapter for Javascript {
    fn language(&self) -> Language {
        Language::Javascript
    }

    async fn prepare(
        &self,
        workspace: &Workspace,
        code: &str,
        _runner: &dyn CommandRunner,
        _config: &JudgeConfig,
    ) -> Result<CommandSpec, JudgeError> {
        let source_path = workspace.path().join(SOURCE_FILE);
        tokio::fs::write(&source_path, assemble_driver(code))
            .await
            .map_err(|e| {
                JudgeError::Workspace(format!("failed to write {}: {}", source_path.display(), e))
            })?;

        Ok(CommandSpec::new("node").arg(SOURCE_FILE))
    }
}
