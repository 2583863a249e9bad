use clap::Parser;
use tokio_util::sync::CancellationToken;

use judge_core::config::CliArgs;
use judge_core::queue::{AdmissionQueue, spawn_workers};
use judge_core::sandbox::build_runner;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();
    let config = cli.load_config();
    log::info!(
        "judge-core starting: port={} execution_mode={:?} max_concurrent={}",
        config.port,
        config.execution_mode,
        config.max_concurrent
    );

    std::fs::create_dir_all(&config.temp_dir).expect("failed to create TEMP_DIR");

    let runner = build_runner(&config).expect("failed to initialize sandbox runner");
    let runner: std::sync::Arc<dyn judge_core::sandbox::SandboxRunner> = std::sync::Arc::from(runner);

    let queue = AdmissionQueue::new(config.max_concurrent * 16);
    let shutdown = CancellationToken::new();
    let worker_handles = spawn_workers(queue.clone(), config.max_concurrent, shutdown.clone());

    let server = judge_core::http::build_server(config, runner, queue)
        .expect("failed to start HTTP server");

    server.await?;

    shutdown.cancel();
    for handle in worker_handles {
        let _ = handle.await;
    }

    Ok(())
}
