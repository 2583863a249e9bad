//! The thin HTTP edge: actix-web (the teacher's framework), wiring together config,
//! the admission queue, and the batch executor behind the five routes of spec.md §6.
//! Mirrors the shape of the teacher's `web_server::build_server`, minus the database
//! pool this engine has no use for.

pub mod batch_judge;
pub mod envelope;
pub mod execute;
pub mod health;
pub mod judge;
pub mod languages;
pub mod rate_limit;
pub mod state;

use std::sync::Arc;

use actix_web::error::JsonPayloadError;
use actix_web::{App, HttpRequest, HttpServer, dev::Server, middleware, web};

use crate::config::Config;
use crate::executor::BatchExecutor;
use crate::queue::AdmissionQueue;
use crate::sandbox::SandboxRunner;
use state::AppState;

/// Matches the teacher's `json_error_handler` (`routes.rs`), adapted to this
/// crate's envelope shape instead of its bespoke `ErrorResponse`.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = match &err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            envelope::payload_too_large("request body exceeds the configured size limit")
        }
        _ => envelope::bad_request("ERR_VALIDATION", err.to_string()),
    };
    actix_web::error::InternalError::from_response(err, response).into()
}

/// Builds and binds the HTTP server. Does not block; await the returned `Server` to
/// run it (the teacher's `build_server` signature exactly).
pub fn build_server(
    config: Config,
    runner: Arc<dyn SandboxRunner>,
    queue: Arc<AdmissionQueue>,
) -> std::io::Result<Server> {
    let executor = Arc::new(BatchExecutor::new(runner, &config));
    let app_state = web::Data::new(AppState::new(&config, executor, queue));
    let max_body_bytes = config.limits.max_code_size * 4;
    let rate_limiter = rate_limit::RateLimit::new(config.rate_limit_max, config.rate_limit_window_ms);
    let port = config.port;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(max_body_bytes)
                    .error_handler(json_error_handler),
            )
            .wrap(middleware::Logger::default())
            .wrap(rate_limiter.clone())
            .service(health::health_handler)
            .service(languages::languages_handler)
            .service(execute::execute_handler)
            .service(judge::judge_handler)
            .service(batch_judge::batch_judge_handler)
    })
    .bind(("0.0.0.0", port))?
    .run();

    Ok(server)
}
