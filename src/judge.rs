//! Judging - one submission against an ordered list of test cases
//!
//! Test cases run sequentially, each in its own workspace. A wrong answer is
//! a verdict, so judging continues to the next case; a failed execution
//! (compile error, crash, timeout) would fail the same way for every
//! remaining case, so judging stops there. Cases that never ran still count
//! against the submission in the summary.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::executor::{ExecutionRequest, ExecutionResult, Executor};
use crate::language::Language;

/// One test case: input fed to the program and the output expected back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    /// Hidden cases are judged normally but their data is withheld from
    /// outbound reports
    #[serde(default)]
    pub is_hidden: bool,
}

/// Verdict for one executed test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub passed: bool,
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub elapsed_ms: u64,
}

/// Aggregate counts over a test run.
///
/// `total` counts requested cases, not executed ones, so a fail-fast stop
/// leaves the skipped cases in `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub all_passed: bool,
}

/// Per-case verdicts plus the aggregate summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub results: Vec<TestResult>,
    pub summary: TestRunSummary,
}

/// Judges submissions by running them case by case
pub struct Judge {
    executor: Executor,
}

impl Judge {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// Run `code` against every test case in order.
    ///
    /// Results come back in case order. The result list is shorter than the
    /// case list only when an execution failure cut the run short.
    pub async fn run_test_cases(
        &self,
        code: &str,
        language: Language,
        test_cases: &[TestCase],
    ) -> TestRun {
        let mut results = Vec::with_capacity(test_cases.len());

        for (index, case) in test_cases.iter().enumerate() {
            let request = ExecutionRequest {
                code: code.to_string(),
                language,
                stdin: case.input.clone(),
            };

            let execution = self.executor.execute(&request).await;
            let failed_to_run = !execution.success;
            results.push(to_test_result(case, execution));

            if failed_to_run {
                info!(
                    "Execution failed on test case {} of {}; skipping remaining cases",
                    index + 1,
                    test_cases.len()
                );
                break;
            }
        }

        let summary = summarize(&results, test_cases.len());
        TestRun { results, summary }
    }
}

/// Compare trimmed outputs; leading and trailing whitespace never decides
/// a verdict, interior whitespace always does.
fn to_test_result(case: &TestCase, execution: ExecutionResult) -> TestResult {
    let passed = execution.success && execution.output.trim() == case.expected_output.trim();

    TestResult {
        input: case.input.clone(),
        expected_output: case.expected_output.clone(),
        actual_output: execution.output,
        passed,
        is_hidden: case.is_hidden,
        error_message: execution.error_message,
        elapsed_ms: execution.elapsed_ms,
    }
}

fn summarize(results: &[TestResult], total: usize) -> TestRunSummary {
    let passed = results.iter().filter(|r| r.passed).count();
    TestRunSummary {
        total,
        passed,
        failed: total - passed,
        all_passed: passed == total,
    }
}
