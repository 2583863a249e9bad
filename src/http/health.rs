//! `GET /api/health` — liveness plus the admission queue snapshot spec.md §4.3/§6
//! asks for (`in_flight`, `waiting`, `max_concurrent`, `total_processed`,
//! `total_failed`). No teacher equivalent exists (the teacher exposes no health
//! route); shaped after its queue/worker internals (`AdmissionQueue::status`)
//! rather than copied from anywhere else in the pack.

use actix_web::{Responder, get, web};
use serde::Serialize;

use crate::http::envelope;
use crate::http::state::AppState;
use crate::queue::QueueStatus;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    queue: QueueStatusBody,
}

#[derive(Serialize)]
struct QueueStatusBody {
    in_flight: usize,
    waiting: usize,
    max_concurrent: usize,
    total_processed: u64,
    total_failed: u64,
}

impl From<QueueStatus> for QueueStatusBody {
    fn from(status: QueueStatus) -> Self {
        QueueStatusBody {
            in_flight: status.in_flight,
            waiting: status.waiting,
            max_concurrent: status.max_concurrent,
            total_processed: status.total_processed,
            total_failed: status.total_failed,
        }
    }
}

#[get("/api/health")]
pub async fn health_handler(state: web::Data<AppState>) -> impl Responder {
    envelope::ok(HealthBody {
        status: "ok",
        queue: state.queue.status().into(),
    })
}
