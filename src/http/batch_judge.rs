//! `POST /api/batch-judge` — up to 10 independent judge submissions, run
//! sequentially (spec.md §6). Each sub-submission goes through the same validation
//! and admission-queue path as `/api/judge`; this handler just fans the request body
//! out and collects results in order, mirroring the teacher's sequential
//! `for case in problem.cases` loop in `sandbox/simple_runner.rs`'s `run_test_cases`,
//! generalized from test cases to whole submissions.

use actix_web::{Responder, post, web};
use serde::{Deserialize, Serialize};

use crate::http::envelope;
use crate::http::judge::JudgeRequest;
use crate::http::state::AppState;
use crate::queue::QueueError;
use crate::submission::Submission;
use crate::verdict::SubmissionResult;

const MAX_BATCH_SIZE: usize = 10;

#[derive(Deserialize)]
pub struct BatchJudgeRequest {
    pub submissions: Vec<JudgeRequest>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum BatchEntry {
    Result(SubmissionResult),
    Error { error: String },
}

#[post("/api/batch-judge")]
pub async fn batch_judge_handler(
    state: web::Data<AppState>,
    body: web::Json<BatchJudgeRequest>,
) -> impl Responder {
    let body = body.into_inner();

    if body.submissions.is_empty() || body.submissions.len() > MAX_BATCH_SIZE {
        return envelope::bad_request(
            "ERR_VALIDATION",
            format!("submissions: must provide between 1 and {MAX_BATCH_SIZE} entries"),
        );
    }

    let mut entries = Vec::with_capacity(body.submissions.len());

    for request in body.submissions {
        entries.push(run_one(&state, request).await);
    }

    envelope::ok(entries)
}

async fn run_one(state: &web::Data<AppState>, request: JudgeRequest) -> BatchEntry {
    if request.test_cases.is_empty() || request.test_cases.len() > state.limits.max_tests {
        return BatchEntry::Error {
            error: format!(
                "testCases: must provide between 1 and {} cases",
                state.limits.max_tests
            ),
        };
    }

    let (inputs, expected): (Vec<Vec<u8>>, Vec<Vec<u8>>) = request
        .test_cases
        .into_iter()
        .map(|c| (c.input.into_bytes(), c.expected_output.into_bytes()))
        .unzip();

    let submission = match Submission::new(
        request.language,
        request.code,
        request.time_limit.unwrap_or(state.default_time_limit_s),
        request.memory_limit.unwrap_or(state.default_memory_limit_mb),
        inputs,
        &state.limits,
    ) {
        Ok(submission) => submission,
        Err(errors) => {
            return BatchEntry::Error {
                error: errors
                    .into_iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            };
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
            Ok(result) => BatchEntry::Result(result),
            Err(_) => BatchEntry::Error {
                error: "worker shut down before finishing".to_string(),
            },
        },
        Err(QueueError::Full) => BatchEntry::Error {
            error: "admission queue is full, retry later".to_string(),
        },
        Err(QueueError::WorkerDropped) => BatchEntry::Error {
            error: "worker unavailable".to_string(),
        },
    }
}
