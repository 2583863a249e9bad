//! The unsandboxed backend: runs compile/execute commands as plain subprocesses with
//! only a wall-clock timeout, no memory/file system/process isolation. Grounded in
//! the teacher's `sandbox/simple_runner.rs`, generalized from its `JobRecord`/problem
//! config coupling to the shared [`SandboxRunner`] contract every backend implements.
//!
//! Intended for local development only; [`ProcessRunner::new`] logs a warning on
//! every construction the way the teacher's `SimpleRunner::build` does.

use std::fs;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use super::meta::classify_exit_code;
use super::{CompileOutcome, RunContext, SandboxRunner};
use crate::verdict::{RunResult, Verdict};

pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        log::warn!(
            "ProcessRunner provides NO sandbox isolation — memory limits are not enforced; \
             use only in trusted development environments"
        );
        ProcessRunner
    }

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Handle::current().block_on(fut)
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxRunner for ProcessRunner {
    fn compile(&self, ctx: &RunContext) -> Result<CompileOutcome> {
        let source_path = ctx.work_dir.code_path(ctx.language.source_file);
        fs::write(&source_path, ctx.source_text).context("writing source file")?;

        let Some(template) = ctx.language.compile_command else {
            return Ok(CompileOutcome {
                success: true,
                output: String::new(),
            });
        };

        let command = substitute_paths(template, ctx);
        let code_dir = source_path.parent().unwrap().to_path_buf();
        let compile_output_path = ctx.work_dir.root().join("compile_stdout.txt");

        let start = Instant::now();
        let result = Self::block_on(timeout(
            Duration::from_secs(30),
            run_command(&command, &compile_output_path, &code_dir),
        ));
        let _elapsed = start.elapsed();

        let output = fs::read_to_string(&compile_output_path).unwrap_or_default();

        let success = match result {
            Ok(Ok(status)) => status.success(),
            Ok(Err(_)) | Err(_) => false,
        };

        Ok(CompileOutcome { success, output })
    }

    fn run_case(&self, ctx: &RunContext, case_index: usize) -> Result<RunResult> {
        let input_path = ctx.work_dir.input_path(case_index);
        let input_content = fs::read_to_string(&input_path).unwrap_or_default();
        let output_path = ctx.work_dir.stdout_path(case_index);
        let stderr_path = ctx.work_dir.stderr_path(case_index);

        let command = substitute_paths(ctx.language.execute_command, ctx);
        let code_dir = ctx
            .work_dir
            .code_path(ctx.language.source_file)
            .parent()
            .unwrap()
            .to_path_buf();
        let wall_limit = Duration::from_secs(ctx.per_case_time_limit_s as u64);

        let start = Instant::now();
        let execution = Self::block_on(timeout(
            wall_limit,
            run_piped_command(&command, &input_content, &output_path, &stderr_path, &code_dir),
        ));
        let elapsed = start.elapsed();

        let stdout = fs::read_to_string(&output_path).unwrap_or_default();
        let mut stderr = fs::read_to_string(&stderr_path).unwrap_or_default();

        let (verdict, exit_code) = match execution {
            Ok(Ok(status)) => {
                let code = status.code().unwrap_or(-1);
                let (v, message) = classify_exit_code(code);
                if let Some(message) = message {
                    if !stderr.is_empty() && !stderr.ends_with('\n') {
                        stderr.push('\n');
                    }
                    stderr.push_str(message);
                }
                (v, Some(code))
            }
            Ok(Err(e)) => {
                stderr = format!("process spawn failed: {e}");
                (Verdict::Ie, None)
            }
            Err(_) => (Verdict::Tle, None),
        };

        Ok(RunResult {
            verdict,
            stdout,
            stderr,
            execution_time_ms: elapsed.as_millis() as u64,
            // The process backend enforces no memory limit, so peak usage is genuinely
            // unknown rather than zero.
            peak_memory_kb: None,
            exit_code,
            wall_time_ms: elapsed.as_millis() as u64,
        })
    }
}

fn substitute_paths(template: &[&'static str], ctx: &RunContext) -> Vec<String> {
    template
        .iter()
        .map(|part| match *part {
            "./main" => ctx
                .work_dir
                .code_path("main")
                .to_string_lossy()
                .into_owned(),
            other => other.to_string(),
        })
        .collect()
}

async fn run_command(
    command: &[String],
    output_path: &std::path::Path,
    work_dir: &std::path::Path,
) -> Result<std::process::ExitStatus> {
    if command.is_empty() {
        bail!("empty command");
    }

    let output_file = fs::File::create(output_path)?;

    let mut cmd = tokio::process::Command::new(&command[0]);
    cmd.args(&command[1..])
        .stdout(Stdio::from(output_file.try_clone()?))
        .stderr(Stdio::from(output_file))
        .current_dir(work_dir);

    let mut child = cmd.spawn()?;
    Ok(child.wait().await?)
}

async fn run_piped_command(
    command: &[String],
    stdin_content: &str,
    output_path: &std::path::Path,
    stderr_path: &std::path::Path,
    work_dir: &std::path::Path,
) -> Result<std::process::ExitStatus> {
    if command.is_empty() {
        bail!("empty command");
    }

    let output_file = fs::File::create(output_path)?;
    let stderr_file = fs::File::create(stderr_path)?;

    let mut cmd = tokio::process::Command::new(&command[0]);
    cmd.args(&command[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::from(output_file))
        .stderr(Stdio::from(stderr_file))
        .current_dir(work_dir);

    let mut child = cmd.spawn()?;

    if let Some(stdin) = child.stdin.take() {
        let mut stdin = tokio::io::BufWriter::new(stdin);
        stdin.write_all(stdin_content.as_bytes()).await?;
        stdin.flush().await?;
    }

    Ok(child.wait().await?)
}
