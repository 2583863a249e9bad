//! `POST /api/execute` — runs a submission once against a single optional input and
//! returns the raw run result, with no expected-output comparison. Grounded in the
//! teacher's `routes/jobs/post.rs` (validate → enqueue → await/return), generalized
//! from the teacher's DB-backed job record to an admission-queue task that calls
//! straight into [`crate::executor::BatchExecutor`].

use actix_web::{Responder, post, web};
use serde::{Deserialize, Serialize};

use crate::http::envelope;
use crate::http::state::AppState;
use crate::queue::QueueError;
use crate::submission::Submission;
use crate::verdict::RunResult;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub input: Option<String>,
    pub time_limit: Option<u32>,
    pub memory_limit: Option<u32>,
}

#[derive(Serialize)]
pub struct ExecuteResponse {
    pub verdict: crate::verdict::Verdict,
    pub stdout: String,
    pub stderr: String,
    pub execution_time_ms: u64,
    pub peak_memory_kb: Option<u64>,
    pub exit_code: Option<i32>,
}

#[post("/api/execute")]
pub async fn execute_handler(
    state: web::Data<AppState>,
    body: web::Json<ExecuteRequest>,
) -> impl Responder {
    let body = body.into_inner();
    let input = body.input.unwrap_or_default().into_bytes();

    let submission = match Submission::new(
        body.language,
        body.code,
        body.time_limit.unwrap_or(state.default_time_limit_s),
        body.memory_limit.unwrap_or(state.default_memory_limit_mb),
        vec![input],
        &state.limits,
    ) {
        Ok(submission) => submission,
        Err(errors) => {
            log::info!("rejected /api/execute: {errors:?}");
            return envelope::bad_request(
                "ERR_VALIDATION",
                errors
                    .into_iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            );
        }
    };

    let executor = state.executor.clone();
    let task: crate::queue::Job = Box::new(move || {
        let run_results = executor
            .execute(&submission)
            .unwrap_or_else(|e| vec![RunResult::internal_error(e.to_string())]);
        crate::verdict::aggregate(
            &run_results.iter().map(|r| r.verdict).collect::<Vec<_>>(),
            &run_results,
        )
    });

    match state.queue.submit(task) {
        Ok(receiver) => match receiver.await {
            Ok(result) => {
                log::info!("execute finished: {:?}", result.overall_verdict);
                let case = result.per_case.into_iter().next();
                let run_result = ExecuteResponse {
                    verdict: result.overall_verdict,
                    stdout: case.as_ref().map(|c| c.stdout.clone()).unwrap_or_default(),
                    exit_code: case.as_ref().and_then(|c| c.exit_code),
                    stderr: case.map(|c| c.stderr).unwrap_or_default(),
                    execution_time_ms: result.total_time_ms,
                    peak_memory_kb: Some(result.max_memory_kb),
                };
                envelope::ok(run_result)
            }
            Err(_) => envelope::internal_error("worker shut down before finishing"),
        },
        Err(QueueError::Full) => envelope::too_many_requests("admission queue is full, retry later"),
        Err(QueueError::WorkerDropped) => envelope::internal_error("worker unavailable"),
    }
}
