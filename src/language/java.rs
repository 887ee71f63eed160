//! Java adapter - javac compile step, then the JVM
//!
//! Java requires the file name to match the public class, so the class name
//! is extracted from the source before writing. Compilation runs through the
//! same runner as execution, under the compile timeout.

use async_trait::async_trait;

use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::process::{CommandRunner, CommandSpec, RunLimits, RunOutcome};
use crate::workspace::Workspace;

use super::{Language, LanguageAdapter};

/// Class name assumed when the source declares no `public class`
const DEFAULT_CLASS: &str = "Solution";

/// Extract the public class name, or fall back to [`DEFAULT_CLASS`].
///
/// Token-based scan for `public class <Name>`; the name is cut at the first
/// character that cannot appear in an identifier, so `Main{` and `Main<T>`
/// both yield `Main`.
fn extract_class_name(code: &str) -> String {
    let tokens: Vec<&str> = code.split_whitespace().collect();
    for window in tokens.windows(3) {
        if window[0] == "public" && window[1] == "class" {
            let name: String = window[2]
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
                .collect();
            if !name.is_empty() {
                return name;
            }
        }
    }
    DEFAULT_CLASS.to_string()
}

fn compile_message(outcome: &RunOutcome) -> String {
    let stderr = outcome.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = outcome.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    format!("compiler exited with code {}", outcome.exit_code)
}

pub struct Java;

#[async_trait]
impl LanguageAdapter for Java {
    fn language(&self) -> Language {
        Language::Java
    }

    async fn prepare(
        &self,
        workspace: &Workspace,
        code: &str,
        runner: &dyn CommandRunner,
        config: &JudgeConfig,
    ) -> Result<CommandSpec, JudgeError> {
        let class_name = extract_class_name(code);
        let source_file = format!("{}.java", class_name);

        let source_path = workspace.path().join(&source_file);
        tokio::fs::write(&source_path, code).await.map_err(|e| {
            JudgeError::Workspace(format!("failed to write {}: {}", source_path.display(), e))
        })?;

        let compile_cmd = CommandSpec::new("javac")
            .with_args(["-encoding", "UTF-8"])
            .arg(source_file.as_str());
        let limits = RunLimits::new(config.compile_timeout_ms, config.max_output_bytes);

        let outcome = runner
            .run(&compile_cmd, workspace.path(), "", &limits)
            .await
            .map_err(|e| match e {
                JudgeError::Timeout(_) => {
                    JudgeError::Compilation("Compilation timed out".to_string())
                }
                other => other,
            })?;

        if outcome.exit_code != 0 {
            return Err(JudgeError::Compilation(compile_message(&outcome)));
        }

        Ok(CommandSpec::new("java").with_args(["-cp", "."]).arg(class_name))
    }
}
