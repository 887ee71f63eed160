//! Worker jobs - queue wire formats and job-level processing
//!
//! Jobs arrive as JSON tagged with `job_type`. The language travels as a raw
//! string here so an unsupported value turns into an error result for the
//! client instead of a deserialization failure that silently drops the job.
//! Hidden-case redaction also lives here, at the reporting boundary; the
//! judge itself always sees full case data.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::executor::{ExecutionRequest, Executor};
use crate::judge::{Judge, TestCase, TestResult, TestRunSummary};
use crate::language::Language;

/// Worker job enum - the types of jobs the worker can process
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum WorkerJob {
    /// Run code once against provided stdin
    #[serde(rename = "execute")]
    Execute(ExecuteJob),
    /// Judge a submission against its test cases
    #[serde(rename = "judge")]
    Judge(JudgeJob),
}

/// Ad-hoc execution request from an interactive session
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteJob {
    pub session_id: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub stdin: String,
}

/// Submission judge request
#[derive(Debug, Serialize, Deserialize)]
pub struct JudgeJob {
    pub submission_id: i64,
    pub code: String,
    pub language: String,
    pub test_cases: Vec<TestCase>,
}

/// Result published for an execute job
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResultMessage {
    pub session_id: String,
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub elapsed_ms: u64,
}

/// Result published for a judge job
#[derive(Debug, Serialize, Deserialize)]
pub struct JudgeResultMessage {
    pub submission_id: i64,
    pub results: Vec<CaseReport>,
    pub summary: TestRunSummary,
    /// Set when the job never reached judging (e.g. unsupported language)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Outbound view of one test result.
///
/// For hidden cases the input, expected output, and actual output are
/// withheld; the verdict and timing are still reported.
#[derive(Debug, Serialize, Deserialize)]
pub struct CaseReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<String>,
    pub passed: bool,
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub elapsed_ms: u64,
}

impl CaseReport {
    fn from_result(result: &TestResult) -> Self {
        let (input, expected_output, actual_output) = if result.is_hidden {
            (None, None, None)
        } else {
            (
                Some(result.input.clone()),
                Some(result.expected_output.clone()),
                Some(result.actual_output.clone()),
            )
        };

        Self {
            input,
            expected_output,
            actual_output,
            passed: result.passed,
            is_hidden: result.is_hidden,
            error_message: result.error_message.clone(),
            elapsed_ms: result.elapsed_ms,
        }
    }
}

/// Process an execute job. Always yields a result message; failures are
/// carried inside it.
pub async fn process_execute_job(job: &ExecuteJob, executor: &Executor) -> ExecuteResultMessage {
    let language: Language = match job.language.parse() {
        Ok(language) => language,
        Err(e) => {
            return ExecuteResultMessage {
                session_id: job.session_id.clone(),
                success: false,
                output: String::new(),
                error_message: Some(e.to_string()),
                elapsed_ms: 0,
            }
        }
    };

    let request = ExecutionRequest {
        code: job.code.clone(),
        language,
        stdin: job.stdin.clone(),
    };
    let result = executor.execute(&request).await;

    ExecuteResultMessage {
        session_id: job.session_id.clone(),
        success: result.success,
        output: result.output,
        error_message: result.error_message,
        elapsed_ms: result.elapsed_ms,
    }
}

/// Process a judge job. Always yields a result message; an unsupported
/// language produces an empty run with every case counted as failed.
pub async fn process_judge_job(job: &JudgeJob, judge: &Judge) -> JudgeResultMessage {
    let language: Language = match job.language.parse() {
        Ok(language) => language,
        Err(e) => {
            return JudgeResultMessage {
                submission_id: job.submission_id,
                results: vec![],
                summary: rejected_summary(job.test_cases.len()),
                error_message: Some(e.to_string()),
            }
        }
    };

    let run = judge
        .run_test_cases(&job.code, language, &job.test_cases)
        .await;

    info!(
        "Judged submission {}: {}/{} passed",
        job.submission_id, run.summary.passed, run.summary.total
    );

    JudgeResultMessage {
        submission_id: job.submission_id,
        results: run.results.iter().map(CaseReport::from_result).collect(),
        summary: run.summary,
        error_message: None,
    }
}

/// Summary for a job that never reached judging: every requested case
/// counts as failed, and `all_passed` is false even for an empty case list
/// so an error-carrying message cannot read as accepted.
fn rejected_summary(total: usize) -> TestRunSummary {
    TestRunSummary {
        total,
        passed: 0,
        failed: total,
        all_passed: false,
    }
}
