//! `POST /api/judge` — runs a submission against 1–50 test cases and judges each
//! one's output against its expected output, returning the submission-level
//! aggregate. Grounded in the teacher's `routes/jobs/post.rs` orchestration, wired to
//! [`crate::executor::BatchExecutor::execute_and_judge`] instead of a DB-backed job.

use actix_web::{Responder, post, web};
use serde::Deserialize;

use crate::http::envelope;
use crate::http::state::AppState;
use crate::queue::QueueError;
use crate::submission::Submission;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeRequest {
    pub language: String,
    pub code: String,
    pub test_cases: Vec<TestCase>,
    pub time_limit: Option<u32>,
    pub memory_limit: Option<u32>,
}

#[post("/api/judge")]
pub async fn judge_handler(
    state: web::Data<AppState>,
    body: web::Json<JudgeRequest>,
) -> impl Responder {
    let body = body.into_inner();

    if body.test_cases.is_empty() || body.test_cases.len() > state.limits.max_tests {
        return envelope::bad_request(
            "ERR_VALIDATION",
            format!(
                "testCases: must provide between 1 and {} cases",
                state.limits.max_tests
            ),
        );
    }

    let (inputs, expected): (Vec<Vec<u8>>, Vec<Vec<u8>>) = body
        .test_cases
        .into_iter()
        .map(|c| (c.input.into_bytes(), c.expected_output.into_bytes()))
        .unzip();

    if expected.iter().any(|e| e.len() > state.limits.max_code_size) {
        return envelope::bad_request(
            "ERR_VALIDATION",
            "expectedOutput exceeds the configured size limit",
        );
    }

    let submission = match Submission::new(
        body.language,
        body.code,
        body.time_limit.unwrap_or(state.default_time_limit_s),
        body.memory_limit.unwrap_or(state.default_memory_limit_mb),
        inputs,
        &state.limits,
    ) {
        Ok(submission) => submission,
        Err(errors) => {
            log::info!("rejected /api/judge: {errors:?}");
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
    let case_count = submission.case_count();
    let task: crate::queue::Job = Box::new(move || {
        executor
            .execute_and_judge(&submission, &expected)
            .unwrap_or_else(|e| crate::verdict::internal_error_result(case_count, e.to_string()))
    });

    match state.queue.submit(task) {
        Ok(receiver) => match receiver.await {
            Ok(result) => {
                log::info!("judge finished: {:?}", result.overall_verdict);
                envelope::ok(result)
            }
            Err(_) => envelope::internal_error("worker shut down before finishing"),
        },
        Err(QueueError::Full) => envelope::too_many_requests("admission queue is full, retry later"),
        Err(QueueError::WorkerDropped) => envelope::internal_error("worker unavailable"),
    }
}
