mod config;
mod error;
mod executor;
mod jobs;
mod judge;
mod language;
mod process;
mod queue;
mod workspace;

use anyhow::Result;
use tracing::{error, info};

use crate::config::JudgeConfig;
use crate::executor::Executor;
use crate::jobs::{process_execute_job, process_judge_job, WorkerJob};
use crate::judge::Judge;
use crate::queue::QueueClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("gavel=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    info!("Starting Judge Worker...");

    let config = JudgeConfig::from_env();
    info!(
        "Limits: execution={}ms, compile={}ms, output={}B, workspace_root={}",
        config.execution_timeout_ms,
        config.compile_timeout_ms,
        config.max_output_bytes,
        config.workspace_root.display()
    );

    let executor = Executor::new(config.clone());
    let judge = Judge::new(Executor::new(config));

    let mut queue = QueueClient::from_env().await?;

    info!("Waiting for jobs...");

    loop {
        let job = queue.pop_job().await?;

        match job {
            WorkerJob::Execute(job) => {
                info!(
                    "Received execute job: session_id={}, language={}",
                    job.session_id, job.language
                );

                let result = process_execute_job(&job, &executor).await;
                if let Err(e) = queue.store_execute_result(&result).await {
                    error!(
                        "Failed to store execute result for session {}: {}",
                        result.session_id, e
                    );
                }
                info!(
                    "Execute job completed: session_id={}, success={}",
                    result.session_id, result.success
                );
            }
            WorkerJob::Judge(job) => {
                info!(
                    "Received judge job: submission_id={}, language={}, test_cases={}",
                    job.submission_id,
                    job.language,
                    job.test_cases.len()
                );

                let result = process_judge_job(&job, &judge).await;
                if let Err(e) = queue.store_judge_result(&result).await {
                    error!(
                        "Failed to store judge result for submission {}: {}",
                        result.submission_id, e
                    );
                }
                info!(
                    "Judge job completed: submission_id={}, passed={}/{}",
                    result.submission_id, result.summary.passed, result.summary.total
                );
            }
        }
    }
}
