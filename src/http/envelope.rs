//! The `{success, data|error}` response envelope every route returns, replacing the
//! teacher's bare `ErrorResponse`/`ErrorResponseWithMessage` structs (`routes.rs`)
//! with a single generic wrapper so success and failure share one shape.

use actix_web::{HttpResponse, http::StatusCode};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody {
    pub reason: &'static str,
    pub message: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Payload<T: Serialize> {
    Ok { success: bool, data: T },
    Err { success: bool, error: ErrorBody },
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Payload::Ok {
        success: true,
        data,
    })
}

pub fn error(status: StatusCode, reason: &'static str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(Payload::<()>::Err {
        success: false,
        error: ErrorBody {
            reason,
            message: message.into(),
        },
    })
}

pub fn bad_request(reason: &'static str, message: impl Into<String>) -> HttpResponse {
    error(StatusCode::BAD_REQUEST, reason, message)
}

pub fn not_found(reason: &'static str, message: impl Into<String>) -> HttpResponse {
    error(StatusCode::NOT_FOUND, reason, message)
}

pub fn too_many_requests(message: impl Into<String>) -> HttpResponse {
    error(StatusCode::TOO_MANY_REQUESTS, "ERR_RATE_LIMITED", message)
}

pub fn payload_too_large(message: impl Into<String>) -> HttpResponse {
    error(StatusCode::PAYLOAD_TOO_LARGE, "ERR_PAYLOAD_TOO_LARGE", message)
}

pub fn internal_error(message: impl Into<String>) -> HttpResponse {
    error(StatusCode::INTERNAL_SERVER_ERROR, "ERR_INTERNAL", message)
}
