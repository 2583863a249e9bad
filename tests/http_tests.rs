//! HTTP-surface integration tests, exercising the actix-web routes against an
//! in-process `App` the way the teacher's `tests/server_tests.rs` does
//! (`actix_web::test::call_service` against a hand-assembled `App`, not a real TCP
//! listener). In place of the teacher's `mock_judger` task standing in for the real
//! judge, these tests inject a stub `SandboxRunner` so no compiler or `isolate`
//! binary needs to be present to exercise the HTTP layer.

use std::sync::Arc;

use actix_web::{App, test, web};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use judge_core::config::Config;
use judge_core::executor::BatchExecutor;
use judge_core::http::state::AppState;
use judge_core::http::{batch_judge, execute, health, judge, languages};
use judge_core::queue::{AdmissionQueue, spawn_workers};
use judge_core::sandbox::{CompileOutcome, RunContext, SandboxRunner};
use judge_core::verdict::{RunResult, Verdict};

/// A `SandboxRunner` whose compile/run outcomes are fixed in advance, so HTTP tests
/// don't need a real compiler toolchain or `isolate` installation.
struct StubRunner {
    compile_success: bool,
    compile_output: String,
    case_results: Vec<RunResult>,
}

impl StubRunner {
    fn always_ok(stdout_per_case: Vec<&str>) -> Self {
        StubRunner {
            compile_success: true,
            compile_output: String::new(),
            case_results: stdout_per_case
                .into_iter()
                .map(|stdout| RunResult {
                    verdict: Verdict::Ok,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    execution_time_ms: 5,
                    peak_memory_kb: Some(1024),
                    exit_code: Some(0),
                    wall_time_ms: 5,
                })
                .collect(),
        }
    }

    fn single(run_result: RunResult) -> Self {
        StubRunner {
            compile_success: true,
            compile_output: String::new(),
            case_results: vec![run_result],
        }
    }

    fn compile_failure(message: &str) -> Self {
        StubRunner {
            compile_success: false,
            compile_output: message.to_string(),
            case_results: vec![],
        }
    }
}

impl SandboxRunner for StubRunner {
    fn compile(&self, _ctx: &RunContext) -> anyhow::Result<CompileOutcome> {
        Ok(CompileOutcome {
            success: self.compile_success,
            output: self.compile_output.clone(),
        })
    }

    fn run_case(&self, _ctx: &RunContext, case_index: usize) -> anyhow::Result<RunResult> {
        Ok(self.case_results[case_index - 1].clone())
    }
}

fn test_config(temp_dir: &std::path::Path) -> Config {
    let mut config = Config::from_env();
    config.temp_dir = temp_dir.to_path_buf();
    config.rate_limit_max = 1000;
    config
}

/// Wires a fresh `AppState` around `runner`, with its own scratch `temp_dir` and a
/// 2-worker admission queue. Returns the state plus the shutdown token so the test
/// can stop the worker pool once it's done.
fn build_state(runner: StubRunner, temp: &tempfile::TempDir) -> (web::Data<AppState>, CancellationToken) {
    let config = test_config(temp.path());
    let runner: Arc<dyn SandboxRunner> = Arc::new(runner);
    let executor = Arc::new(BatchExecutor::new(runner, &config));
    let queue = AdmissionQueue::new(64);
    let token = CancellationToken::new();
    spawn_workers(queue.clone(), 2, token.clone());

    (web::Data::new(AppState::new(&config, executor, queue)), token)
}

#[actix_web::test]
async fn health_reports_queue_status() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = build_state(StubRunner::always_ok(vec!["x"]), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .service(health::health_handler),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["queue"]["max_concurrent"], 2);

    token.cancel();
}

#[actix_web::test]
async fn languages_lists_the_catalogue_and_limits() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = build_state(StubRunner::always_ok(vec!["x"]), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .service(languages::languages_handler),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/languages").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let tags: Vec<String> = body["data"]["languages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["tag"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tags, vec!["c", "cpp", "python"]);
    assert_eq!(body["data"]["limits"]["max_tests"], 50);

    token.cancel();
}

#[actix_web::test]
async fn execute_returns_ok_for_a_program_that_prints_hello_world() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = build_state(StubRunner::always_ok(vec!["Hello, World!\n"]), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(execute::execute_handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/execute")
        .set_json(&json!({"language": "cpp", "code": "int main(){}", "input": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["verdict"], "OK");
    assert_eq!(body["data"]["stdout"].as_str().unwrap().trim(), "Hello, World!");

    token.cancel();
}

#[actix_web::test]
async fn execute_reports_tle_from_the_sandbox_verdict() {
    let temp = tempfile::tempdir().unwrap();
    let timed_out = RunResult {
        verdict: Verdict::Tle,
        stdout: String::new(),
        stderr: String::new(),
        execution_time_ms: 2000,
        peak_memory_kb: Some(2048),
        exit_code: Some(124),
        wall_time_ms: 2000,
    };
    let (state, token) = build_state(StubRunner::single(timed_out), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(execute::execute_handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/execute")
        .set_json(&json!({
            "language": "cpp",
            "code": "int main(){while(true);}",
            "timeLimit": 2
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["verdict"], "TLE");

    token.cancel();
}

#[actix_web::test]
async fn execute_reports_re_with_segfault_message() {
    let temp = tempfile::tempdir().unwrap();
    let crashed = RunResult {
        verdict: Verdict::Re,
        stdout: String::new(),
        stderr: "Segmentation fault".to_string(),
        execution_time_ms: 1,
        peak_memory_kb: Some(512),
        exit_code: Some(139),
        wall_time_ms: 1,
    };
    let (state, token) = build_state(StubRunner::single(crashed), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(execute::execute_handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/execute")
        .set_json(&json!({"language": "cpp", "code": "int main(){int*p=0;*p=42;}"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["verdict"], "RE");
    assert!(body["data"]["stderr"].as_str().unwrap().contains("Segmentation fault"));
    assert_eq!(body["data"]["exit_code"], 139);

    token.cancel();
}

#[actix_web::test]
async fn judge_reports_ac_when_every_case_matches() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = build_state(
        StubRunner::always_ok(vec!["3\n", "30\n", "0\n", "0\n"]),
        &temp,
    );

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(judge::judge_handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/judge")
        .set_json(&json!({
            "language": "cpp",
            "code": "int main(){}",
            "testCases": [
                {"input": "1 2\n", "expectedOutput": "3"},
                {"input": "10 20\n", "expectedOutput": "30"},
                {"input": "0 0\n", "expectedOutput": "0"},
                {"input": "-5 5\n", "expectedOutput": "0"}
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["overall_verdict"], "AC");
    assert_eq!(body["data"]["passed"], 4);
    let per_case = body["data"]["per_case"].as_array().unwrap();
    assert_eq!(per_case.len(), 4);
    assert_eq!(per_case[0]["exit_code"], 0);
    assert_eq!(per_case[0]["wall_time_ms"], 5);

    token.cancel();
}

#[actix_web::test]
async fn judge_reports_wa_and_the_first_failed_index() {
    let temp = tempfile::tempdir().unwrap();
    // Cases expect a+b; the stubbed program always answers as if it computed a-b.
    let (state, token) = build_state(StubRunner::always_ok(vec!["2\n", "0\n"]), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(judge::judge_handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/judge")
        .set_json(&json!({
            "language": "cpp",
            "code": "int main(){}",
            "testCases": [
                {"input": "5 3\n", "expectedOutput": "8"},
                {"input": "0 0\n", "expectedOutput": "0"}
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["overall_verdict"], "WA");
    assert_eq!(body["data"]["first_failed_index"], 0);

    token.cancel();
}

#[actix_web::test]
async fn judge_reports_ce_for_every_case_on_compile_failure() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = build_state(StubRunner::compile_failure("main.cpp:1:1: error"), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(judge::judge_handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/judge")
        .set_json(&json!({
            "language": "cpp",
            "code": "int main() {",
            "testCases": [
                {"input": "1\n", "expectedOutput": "1"},
                {"input": "2\n", "expectedOutput": "2"}
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["overall_verdict"], "CE");
    assert_eq!(body["data"]["passed"], 0);
    let per_case = body["data"]["per_case"].as_array().unwrap();
    assert_eq!(per_case.len(), 2);
    assert!(per_case.iter().all(|c| c["verdict"] == "CE"));

    token.cancel();
}

#[actix_web::test]
async fn judge_rejects_an_empty_test_case_list() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = build_state(StubRunner::always_ok(vec!["x"]), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(judge::judge_handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/judge")
        .set_json(&json!({"language": "cpp", "code": "int main(){}", "testCases": []}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    token.cancel();
}

#[actix_web::test]
async fn judge_rejects_an_unsupported_language() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = build_state(StubRunner::always_ok(vec!["x"]), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(judge::judge_handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/judge")
        .set_json(&json!({
            "language": "cobol",
            "code": "hello",
            "testCases": [{"input": "1", "expectedOutput": "1"}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    token.cancel();
}

#[actix_web::test]
async fn batch_judge_runs_each_submission_and_reports_independent_verdicts() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = build_state(StubRunner::always_ok(vec!["1\n"]), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(batch_judge::batch_judge_handler),
    )
    .await;

    let submission = json!({
        "language": "cpp",
        "code": "int main(){}",
        "testCases": [{"input": "1\n", "expectedOutput": "1"}]
    });
    let req = test::TestRequest::post()
        .uri("/api/batch-judge")
        .set_json(&json!({"submissions": [submission.clone(), submission]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert_eq!(entry["overall_verdict"], "AC");
    }

    token.cancel();
}

#[actix_web::test]
async fn batch_judge_rejects_more_than_ten_submissions() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = build_state(StubRunner::always_ok(vec!["1\n"]), &temp);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default())
            .service(batch_judge::batch_judge_handler),
    )
    .await;

    let submission = json!({
        "language": "cpp",
        "code": "int main(){}",
        "testCases": [{"input": "1\n", "expectedOutput": "1"}]
    });
    let submissions: Vec<serde_json::Value> = (0..11).map(|_| submission.clone()).collect();
    let req = test::TestRequest::post()
        .uri("/api/batch-judge")
        .set_json(&json!({"submissions": submissions}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    token.cancel();
}

#[actix_web::test]
async fn rate_limiter_returns_429_once_the_window_is_exhausted() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = test_config(temp.path());
    config.rate_limit_max = 1;
    config.rate_limit_window_ms = 60_000;

    let runner: Arc<dyn SandboxRunner> = Arc::new(StubRunner::always_ok(vec!["x"]));
    let executor = Arc::new(BatchExecutor::new(runner, &config));
    let queue = AdmissionQueue::new(64);
    let token = CancellationToken::new();
    spawn_workers(queue.clone(), 1, token.clone());
    let state = web::Data::new(AppState::new(&config, executor, queue));

    let rate_limiter =
        judge_core::http::rate_limit::RateLimit::new(config.rate_limit_max, config.rate_limit_window_ms);

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap(rate_limiter)
            .service(health::health_handler),
    )
    .await;

    let first = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(first.status(), 200);

    let second = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(second.status(), 429);

    token.cancel();
}
