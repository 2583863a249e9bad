//! The isolated-container backend: shells out to `isolate` for both compilation and
//! execution, applying the resource caps of spec.md §4.2 step 4. Grounded in the
//! teacher's `sandbox/isolate_runner.rs`, generalized from a DB-backed `JobRecord`
//! to an arbitrary submission and from problem-set-specific limits to the caps this
//! specification names explicitly.

use std::fs;
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};

use super::meta::{parse_meta, verdict_from_meta};
use super::{CompileOutcome, RunContext, SandboxRunner};
use crate::config::Config;
use crate::verdict::RunResult;

// Compile-phase caps: generous, since compilation is not adversarial in the same
// way user-submitted execution is (teacher's constants, unchanged — spec.md is
// silent on compile-phase limits).
const COMPILE_TIME_LIMIT_S: f64 = 30.0;
const COMPILE_MEMORY_LIMIT_KB: u64 = 262_144;
const COMPILE_PROCESSES: u32 = 10;
const COMPILE_OPEN_FILES: u32 = 512;
const COMPILE_FILE_SIZE_KB: u32 = 65_536;

// Runtime-phase caps: the exact figures of spec.md §4.2 step 4.
const RUNTIME_PROCESSES: u32 = 64;
const RUNTIME_OPEN_FILES: u32 = 64;
const RUNTIME_FILE_SIZE_KB: u32 = 10 * 1024;
const RUNTIME_WALL_TIME_GRACE_S: f64 = 0.5;

pub struct ContainerRunner {
    id: u8,
    box_dir: std::path::PathBuf,
}

impl ContainerRunner {
    pub fn new(config: &Config) -> Result<Self> {
        // A single sandbox slot is sufficient: the admission queue already bounds
        // concurrent sandbox launches to `max_concurrent`, and each call picks a
        // fresh isolate box id so overlapping invocations don't collide.
        let id = (std::process::id() % 224) as u8;
        let box_dir = Self::initialize(id)?;
        log::info!(
            "ContainerRunner initialized (box {id}, image {})",
            config.sandbox_image
        );
        Ok(ContainerRunner { id, box_dir })
    }

    fn initialize(id: u8) -> Result<std::path::PathBuf> {
        let output = Command::new("isolate")
            .args(["-b", &id.to_string(), "--cg", "--init"])
            .output()
            .map_err(|e| anyhow!("failed to spawn isolate --init: {e}"))?;

        if !output.status.success() {
            bail!(
                "isolate --init exited with non-zero status: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            bail!("isolate --init produced empty stdout");
        }

        Ok(std::path::PathBuf::from(root).join("box"))
    }

    fn reinit(&self) -> Result<()> {
        let output = Command::new("isolate")
            .args(["-b", &self.id.to_string(), "--cg", "--init"])
            .output()
            .map_err(|e| anyhow!("failed to spawn isolate --init: {e}"))?;

        if !output.status.success() {
            bail!("isolate --init exited with non-zero status");
        }
        Ok(())
    }
}

impl SandboxRunner for ContainerRunner {
    fn compile(&self, ctx: &RunContext) -> Result<CompileOutcome> {
        self.reinit()?;

        let Some(compile_command) = ctx.language.compile_command else {
            // Interpreted languages with no compile/syntax-check step: nothing to do.
            fs::write(
                self.box_dir.join(ctx.language.source_file),
                ctx.source_text,
            )?;
            return Ok(CompileOutcome {
                success: true,
                output: String::new(),
            });
        };

        fs::write(
            self.box_dir.join(ctx.language.source_file),
            ctx.source_text,
        )
        .context("writing source into sandbox box dir")?;

        let meta_path = self.box_dir.join("compile.meta");
        let stdout_path = self.box_dir.join("compile_stdout.txt");
        let shell_command = compile_command.join(" ");

        let _ = Command::new("isolate")
            .args([
                "-b",
                &self.id.to_string(),
                "--cg",
                "--run",
                &format!("--processes={COMPILE_PROCESSES}"),
                &format!("--open-files={COMPILE_OPEN_FILES}"),
                &format!("--fsize={COMPILE_FILE_SIZE_KB}"),
                &format!("--wall-time={COMPILE_TIME_LIMIT_S}"),
                &format!("--cg-mem={COMPILE_MEMORY_LIMIT_KB}"),
                "-M",
                &meta_path.to_string_lossy(),
                "--silent",
                "--stderr-to-stdout",
                "-o",
                "compile_stdout.txt",
                "--",
                "/bin/sh",
                "-c",
                &shell_command,
            ])
            .output()
            .context("spawning isolate for compilation")?;

        let output = fs::read_to_string(&stdout_path).unwrap_or_default();
        let meta_content = fs::read_to_string(&meta_path).unwrap_or_default();
        let meta_fields = parse_meta(&meta_content);
        let success = meta_fields.exit_code == Some(0) && !meta_fields.killed;

        Ok(CompileOutcome { success, output })
    }

    fn run_case(&self, ctx: &RunContext, case_index: usize) -> Result<RunResult> {
        let stdin_path = ctx.work_dir.input_path(case_index);
        let box_stdin = self.box_dir.join(format!("{case_index}.in"));
        if stdin_path.exists() {
            fs::copy(&stdin_path, &box_stdin)?;
        } else {
            fs::write(&box_stdin, b"")?;
        }

        let box_stdout = format!("{case_index}.out");
        let meta_path = self.box_dir.join(format!("{case_index}.meta"));

        let wall_time = ctx.per_case_time_limit_s as f64 + RUNTIME_WALL_TIME_GRACE_S;
        let memory_kb = ctx.memory_limit_mb as u64 * 1024;
        let stack_kb = memory_kb / 2;

        let mut args: Vec<String> = vec![
            "-b".into(),
            self.id.to_string(),
            "--cg".into(),
            "--run".into(),
            "-w".into(),
            format!("{wall_time:.4}"),
            format!("--cg-mem={memory_kb}"),
            format!("--stack={stack_kb}"),
            format!("--processes={RUNTIME_PROCESSES}"),
            format!("--open-files={RUNTIME_OPEN_FILES}"),
            format!("--fsize={RUNTIME_FILE_SIZE_KB}"),
            "-M".into(),
            meta_path.to_string_lossy().into_owned(),
            "-i".into(),
            format!("{case_index}.in"),
            "-o".into(),
            box_stdout.clone(),
            "--stderr-to-stdout".into(),
            "--silent".into(),
            "--".into(),
        ];
        args.extend(ctx.language.execute_command.iter().map(|s| s.to_string()));

        let start = std::time::Instant::now();
        let _ = Command::new("isolate")
            .args(&args)
            .output()
            .context("spawning isolate for test case execution")?;
        let wall_elapsed = start.elapsed();

        let stdout = fs::read_to_string(self.box_dir.join(&box_stdout)).unwrap_or_default();

        let meta_fields = match fs::read_to_string(&meta_path) {
            Ok(content) => parse_meta(&content),
            Err(_) => {
                let mut result = RunResult::internal_error("failed to read isolate meta file");
                result.wall_time_ms = wall_elapsed.as_millis() as u64;
                return Ok(result);
            }
        };

        let (verdict, message) = verdict_from_meta(&meta_fields);
        let stderr = message
            .map(str::to_string)
            .or_else(|| meta_fields.message.clone())
            .unwrap_or_default();

        Ok(RunResult {
            verdict,
            stdout,
            stderr,
            execution_time_ms: meta_fields.time_wall_ms.unwrap_or(wall_elapsed.as_millis() as u64),
            peak_memory_kb: meta_fields.peak_memory_kb,
            exit_code: meta_fields.exit_code,
            wall_time_ms: wall_elapsed.as_millis() as u64,
        })
    }
}

impl Drop for ContainerRunner {
    fn drop(&mut self) {
        let out = Command::new("isolate")
            .args(["-b", &self.id.to_string(), "--cg", "--cleanup"])
            .output();

        if out.is_ok_and(|o| o.status.success()) {
            log::info!("ContainerRunner {} cleaned up", self.id);
        } else {
            log::error!("ContainerRunner {} failed to clean up", self.id);
        }
    }
}
