//! Single-run execution - one submission, one workspace, one result
//!
//! The executor owns the lifecycle around a run: acquire a workspace, let the
//! language adapter prepare it, run the command with stdin, classify what
//! came back, and release the workspace no matter which step failed.
//! Every infrastructure error is folded into a failed [`ExecutionResult`];
//! `execute` itself never returns `Err`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::language::{adapter_for, Language};
use crate::process::{filter_runtime_noise, CommandRunner, ProcessRunner, RunLimits, RunOutcome};
use crate::workspace::WorkspaceManager;

/// One execution request: code, language, and the stdin to feed it
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub code: String,
    pub language: Language,
    pub stdin: String,
}

/// Classified result of one execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// True when the process exited 0 with no meaningful stderr
    pub success: bool,
    /// Trimmed stdout
    pub output: String,
    /// Failure detail; `None` on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Wall-clock time in milliseconds
    pub elapsed_ms: u64,
}

/// Runs submissions start to finish
pub struct Executor {
    config: JudgeConfig,
    workspaces: WorkspaceManager,
    runner: Arc<dyn CommandRunner>,
}

impl Executor {
    pub fn new(config: JudgeConfig) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner))
    }

    /// Build with a custom runner (tests, alternative isolation)
    pub fn with_runner(config: JudgeConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let workspaces = WorkspaceManager::new(config.workspace_root.clone());
        Self {
            config,
            workspaces,
            runner,
        }
    }

    /// Execute one request. Infrastructure failures come back as a failed
    /// result, never as a panic or a propagated error.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        match self.try_execute(request).await {
            Ok(result) => result,
            Err(e) => failure_result(e),
        }
    }

    async fn try_execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError> {
        let adapter = adapter_for(request.language);
        let workspace = self.workspaces.acquire().await?;
        debug!(
            "Executing {} request in workspace {}",
            adapter.language(),
            workspace.id()
        );

        let run = async {
            let cmd = adapter
                .prepare(&workspace, &request.code, self.runner.as_ref(), &self.config)
                .await?;
            let limits = RunLimits::new(
                self.config.execution_timeout_ms,
                self.config.max_output_bytes,
            );
            self.runner
                .run(&cmd, workspace.path(), &request.stdin, &limits)
                .await
        }
        .await;

        // Release before surfacing any error from the run
        self.workspaces.release(workspace).await;

        run.map(classify_outcome)
    }
}

fn classify_outcome(outcome: RunOutcome) -> ExecutionResult {
    if outcome.stdout_truncated || outcome.stderr_truncated {
        debug!(
            "Captured output truncated (stdout: {}, stderr: {})",
            outcome.stdout_truncated, outcome.stderr_truncated
        );
    }

    let output = outcome.stdout.trim().to_string();

    if outcome.is_clean() {
        return ExecutionResult {
            success: true,
            output,
            error_message: None,
            elapsed_ms: outcome.elapsed_ms,
        };
    }

    let filtered = filter_runtime_noise(&outcome.stderr);
    let stderr = filtered.trim();
    let message = if stderr.is_empty() {
        format!("process exited with code {}", outcome.exit_code)
    } else {
        stderr.to_string()
    };

    ExecutionResult {
        success: false,
        output,
        error_message: Some(message),
        elapsed_ms: outcome.elapsed_ms,
    }
}

fn failure_result(error: JudgeError) -> ExecutionResult {
    let (message, elapsed_ms) = match &error {
        JudgeError::Timeout(timeout_ms) => ("Execution timed out".to_string(), *timeout_ms),
        other => (other.to_string(), 0),
    };

    ExecutionResult {
        success: false,
        output: String::new(),
        error_message: Some(message),
        elapsed_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::test_support::ScriptedRunner;

    fn test_config(root: &std::path::Path) -> JudgeConfig {
        JudgeConfig::default().with_workspace_root(root)
    }

    fn request(language: Language, code: &str, stdin: &str) -> ExecutionRequest {
        ExecutionRequest {
            code: code.to_string(),
            language,
            stdin: stdin.to_string(),
        }
    }

    fn scripted_executor(
        root: &std::path::Path,
        outcomes: Vec<Result<RunOutcome, JudgeError>>,
    ) -> Executor {
        Executor::with_runner(test_config(root), Arc::new(ScriptedRunner::new(outcomes)))
    }

    async fn binary_available(program: &str) -> bool {
        tokio::process::Command::new(program)
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_execute_clean_run_succeeds_with_trimmed_output() {
        let root = tempfile::tempdir().unwrap();
        let executor =
            scripted_executor(root.path(), vec![ScriptedRunner::exited(0, "  42\n", "")]);

        let result = executor
            .execute(&request(Language::Python, "print(42)", ""))
            .await;

        assert!(result.success);
        assert_eq!(result.output, "42");
        assert!(result.error_message.is_none());
    }

    #[tokio::test]
    async fn test_execute_maps_stderr_to_error_message() {
        let root = tempfile::tempdir().unwrap();
        let executor = scripted_executor(
            root.path(),
            vec![ScriptedRunner::exited(1, "", "Traceback: boom\n")],
        );

        let result = executor
            .execute(&request(Language::Python, "raise", ""))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Traceback: boom"));
    }

    #[tokio::test]
    async fn test_execute_reports_exit_code_when_stderr_empty() {
        let root = tempfile::tempdir().unwrap();
        let executor = scripted_executor(root.path(), vec![ScriptedRunner::exited(7, "", "")]);

        let result = executor
            .execute(&request(Language::Python, "exit(7)", ""))
            .await;

        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("process exited with code 7")
        );
    }

    #[tokio::test]
    async fn test_execute_ignores_runtime_banner_noise() {
        let root = tempfile::tempdir().unwrap();
        // The Java adapter makes two runner calls: javac, then the run
        let executor = scripted_executor(
            root.path(),
            vec![
                ScriptedRunner::exited(0, "", ""),
                ScriptedRunner::exited(0, "ok\n", "Picked up JAVA_TOOL_OPTIONS: -Xmx512m\n"),
            ],
        );

        let result = executor
            .execute(&request(Language::Java, "public class Main {}", ""))
            .await;

        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.output, "ok");
    }

    #[tokio::test]
    async fn test_execute_maps_timeout_to_failed_result() {
        let root = tempfile::tempdir().unwrap();
        let executor =
            scripted_executor(root.path(), vec![Err(JudgeError::Timeout(5_000))]);

        let result = executor
            .execute(&request(Language::Python, "while True: pass", ""))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Execution timed out"));
        assert_eq!(result.elapsed_ms, 5_000);
    }

    #[tokio::test]
    async fn test_execute_maps_runner_error_to_failed_result() {
        let root = tempfile::tempdir().unwrap();
        let executor = scripted_executor(
            root.path(),
            vec![Err(JudgeError::Runtime("failed to spawn node: ...".to_string()))],
        );

        let result = executor
            .execute(&request(Language::Javascript, "1", ""))
            .await;

        assert!(!result.success);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("failed to spawn node"));
        assert_eq!(result.elapsed_ms, 0);
    }

    #[tokio::test]
    async fn test_execute_releases_workspace() {
        let root = tempfile::tempdir().unwrap();
        let executor = scripted_executor(root.path(), vec![ScriptedRunner::exited(0, "", "")]);

        executor
            .execute(&request(Language::Python, "pass", ""))
            .await;

        let mut entries = tokio::fs::read_dir(root.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_execute_releases_workspace_on_failure() {
        let root = tempfile::tempdir().unwrap();
        let executor =
            scripted_executor(root.path(), vec![Err(JudgeError::Timeout(5_000))]);

        executor
            .execute(&request(Language::Python, "while True: pass", ""))
            .await;

        let mut entries = tokio::fs::read_dir(root.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_execute_surfaces_workspace_failure() {
        let root = tempfile::tempdir().unwrap();
        let blocked = root.path().join("not-a-dir");
        tokio::fs::write(&blocked, "file").await.unwrap();

        let executor = Executor::new(test_config(&blocked));
        let result = executor
            .execute(&request(Language::Python, "pass", ""))
            .await;

        assert!(!result.success);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("workspace error"));
    }

    #[tokio::test]
    async fn test_execute_python_end_to_end() {
        if !binary_available("python3").await {
            eprintln!("skipping: python3 not installed");
            return;
        }

        let root = tempfile::tempdir().unwrap();
        let executor = Executor::new(test_config(root.path()));

        let result = executor
            .execute(&request(Language::Python, "print(input())", "echo me\n"))
            .await;

        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.output, "echo me");
    }

    #[tokio::test]
    async fn test_execute_javascript_end_to_end() {
        if !binary_available("node").await {
            eprintln!("skipping: node not installed");
            return;
        }

        let root = tempfile::tempdir().unwrap();
        let executor = Executor::new(test_config(root.path()));

        let result = executor
            .execute(&request(
                Language::Javascript,
                "console.log(readline());",
                "echo me\n",
            ))
            .await;

        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.output, "echo me");
    }

    #[tokio::test]
    async fn test_execute_java_end_to_end() {
        if !binary_available("javac").await || !binary_available("java").await {
            eprintln!("skipping: JDK not installed");
            return;
        }

        let root = tempfile::tempdir().unwrap();
        let executor = Executor::new(test_config(root.path()));

        let code = r#"
import java.util.Scanner;
public class Main {
    public static void main(String[] args) {
        Scanner sc = new Scanner(System.in);
        System.out.println(sc.nextLine());
    }
}
"#;
        let result = executor
            .execute(&request(Language::Java, code, "echo me\n"))
            .await;

        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.output, "echo me");
    }

    #[tokio::test]
    async fn test_execute_python_infinite_loop_times_out() {
        if !binary_available("python3").await {
            eprintln!("skipping: python3 not installed");
            return;
        }

        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path()).with_execution_timeout_ms(500);
        let executor = Executor::new(config);

        let result = executor
            .execute(&request(Language::Python, "while True:\n    pass\n", ""))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Execution timed out"));
        assert_eq!(result.elapsed_ms, 500);
    }
}
