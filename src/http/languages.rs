//! `GET /api/languages` — the catalogue, configured limits, and verdict dictionary
//! spec.md §6 asks for, so a client can render a submit form without hardcoding any
//! of it. Grounded in the teacher's pattern of handing `Arc<LanguageConfig>` to
//! handlers via `web::Data` (`web_server.rs`), generalized to the static
//! `language::catalogue()` this engine uses instead of a per-deployment JSON file.

use actix_web::{Responder, get, web};
use serde::Serialize;

use crate::http::envelope;
use crate::http::state::AppState;
use crate::language;

#[derive(Serialize)]
struct LanguageEntry {
    tag: &'static str,
    display_name: &'static str,
}

#[derive(Serialize)]
struct LimitsBody {
    max_code_size: usize,
    max_time_limit_s: u32,
    max_memory_limit_mb: u32,
    max_tests: usize,
    default_time_limit_s: u32,
    default_memory_limit_mb: u32,
}

#[derive(Serialize)]
struct LanguagesBody {
    languages: Vec<LanguageEntry>,
    limits: LimitsBody,
    verdicts: &'static [&'static str],
}

const VERDICTS: &[&str] = &["OK", "CE", "TLE", "MLE", "RE", "IE", "AC", "WA"];

#[get("/api/languages")]
pub async fn languages_handler(state: web::Data<AppState>) -> impl Responder {
    let mut languages: Vec<LanguageEntry> = language::catalogue()
        .values()
        .map(|descriptor| LanguageEntry {
            tag: descriptor.tag,
            display_name: descriptor.display_name,
        })
        .collect();
    languages.sort_by_key(|l| l.tag);

    envelope::ok(LanguagesBody {
        languages,
        limits: LimitsBody {
            max_code_size: state.limits.max_code_size,
            max_time_limit_s: state.limits.max_time_limit_s,
            max_memory_limit_mb: state.limits.max_memory_limit_mb,
            max_tests: state.limits.max_tests,
            default_time_limit_s: state.default_time_limit_s,
            default_memory_limit_mb: state.default_memory_limit_mb,
        },
        verdicts: VERDICTS,
    })
}
