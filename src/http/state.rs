//! Shared application state injected into every handler via `web::Data`, the way the
//! teacher's `web_server::build_server` wires `db_pool`/`problems`/`languages`/
//! `queue_tx` — generalized to this engine's config/queue/limits trio (no database,
//! no per-problem config: this engine judges submissions it is handed directly).

use std::sync::Arc;

use crate::config::{Config, Limits};
use crate::executor::BatchExecutor;
use crate::queue::AdmissionQueue;

pub struct AppState {
    pub executor: Arc<BatchExecutor>,
    pub queue: Arc<AdmissionQueue>,
    pub limits: Limits,
    pub default_time_limit_s: u32,
    pub default_memory_limit_mb: u32,
}

impl AppState {
    pub fn new(config: &Config, executor: Arc<BatchExecutor>, queue: Arc<AdmissionQueue>) -> Self {
        AppState {
            executor,
            queue,
            limits: config.limits.clone(),
            default_time_limit_s: config.default_time_limit_s,
            default_memory_limit_mb: config.default_memory_limit_mb,
        }
    }
}
