//! The sandbox runner contract (SR of spec.md §4.1) and its two implementations,
//! selected once at boot from configuration (spec.md §4.2's dual-backend design).

mod container_runner;
mod meta;
mod process_runner;

pub use container_runner::ContainerRunner;
pub use process_runner::ProcessRunner;

use anyhow::Result;

use crate::config::{Config, ExecutionMode};
use crate::language::LanguageDescriptor;
use crate::verdict::RunResult;
use crate::workdir::WorkDir;

/// Everything a runner needs to compile once and execute `N` cases.
pub struct RunContext<'a> {
    pub work_dir: &'a WorkDir,
    pub language: &'a LanguageDescriptor,
    pub source_text: &'a str,
    pub per_case_time_limit_s: u32,
    pub memory_limit_mb: u32,
    pub case_count: usize,
}

/// Outcome of the one-time compile/syntax-check step.
pub struct CompileOutcome {
    pub success: bool,
    /// Compiler output, captured regardless of success (stdout+stderr combined, the
    /// way the teacher's `compile_stdout.txt` does).
    pub output: String,
}

/// Abstracts the actual mechanism by which user code is compiled and executed —
/// from full isolation with `isolate` to a bare subprocess with only a wall-clock
/// timeout. Both implementations share the compile-once/run-N control flow in
/// [`run_batch`]; they differ only in `compile` and `run_case`.
pub trait SandboxRunner: Send + Sync {
    /// Compiles (or syntax-checks) the submitted source exactly once.
    fn compile(&self, ctx: &RunContext) -> Result<CompileOutcome>;

    /// Runs the compiled program against test case `case_index` (1-based).
    fn run_case(&self, ctx: &RunContext, case_index: usize) -> Result<RunResult>;
}

/// The SR contract: compile once, then run every case in index order, returning
/// exactly `N` results. Never fails past its boundary — I/O errors during a single
/// case become an `Ie` result for that case rather than aborting the whole batch.
pub fn run_batch(runner: &dyn SandboxRunner, ctx: &RunContext) -> Vec<RunResult> {
    let compile_outcome = match runner.compile(ctx) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("compile step failed: {e:#}");
            return (0..ctx.case_count)
                .map(|_| RunResult::internal_error(format!("compile step failed: {e}")))
                .collect();
        }
    };

    if !compile_outcome.success {
        return (0..ctx.case_count)
            .map(|_| {
                let mut result = RunResult::internal_error(compile_outcome.output.clone());
                result.verdict = crate::verdict::Verdict::Ce;
                result
            })
            .collect();
    }

    (1..=ctx.case_count)
        .map(|case_index| match runner.run_case(ctx, case_index) {
            Ok(result) => result,
            Err(e) => {
                log::error!("case {case_index} failed: {e:#}");
                RunResult::internal_error(format!("case {case_index} failed: {e}"))
            }
        })
        .collect()
}

/// Builds the configured `SandboxRunner` backend. Selection is static at startup and
/// cannot change per request.
pub fn build_runner(config: &Config) -> Result<Box<dyn SandboxRunner>> {
    match config.execution_mode {
        ExecutionMode::Container => Ok(Box::new(ContainerRunner::new(config)?)),
        ExecutionMode::Process => Ok(Box::new(ProcessRunner::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Verdict;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingCompileRunner;
    impl SandboxRunner for FailingCompileRunner {
        fn compile(&self, _ctx: &RunContext) -> Result<CompileOutcome> {
            Ok(CompileOutcome {
                success: false,
                output: "syntax error".into(),
            })
        }
        fn run_case(&self, _ctx: &RunContext, _case_index: usize) -> Result<RunResult> {
            unreachable!("run_case must not be called after a failed compile")
        }
    }

    struct CountingRunner {
        calls: AtomicUsize,
    }
    impl SandboxRunner for CountingRunner {
        fn compile(&self, _ctx: &RunContext) -> Result<CompileOutcome> {
            Ok(CompileOutcome {
                success: true,
                output: String::new(),
            })
        }
        fn run_case(&self, _ctx: &RunContext, case_index: usize) -> Result<RunResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut result = RunResult::internal_error("");
            result.verdict = Verdict::Ok;
            result.stdout = case_index.to_string();
            Ok(result)
        }
    }

    fn ctx<'a>(work_dir: &'a WorkDir, language: &'a LanguageDescriptor, n: usize) -> RunContext<'a> {
        RunContext {
            work_dir,
            language,
            source_text: "int main(){}",
            per_case_time_limit_s: 1,
            memory_limit_mb: 16,
            case_count: n,
        }
    }

    #[test]
    fn compile_failure_produces_n_ce_results_without_running_cases() {
        let temp = tempfile::tempdir().unwrap();
        let work_dir = WorkDir::create(temp.path()).unwrap();
        let language = crate::language::lookup("c").unwrap();
        let context = ctx(&work_dir, language, 3);

        let results = run_batch(&FailingCompileRunner, &context);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.verdict == Verdict::Ce));
        assert!(results.iter().all(|r| r.stderr == "syntax error"));
    }

    #[test]
    fn successful_compile_runs_every_case_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let work_dir = WorkDir::create(temp.path()).unwrap();
        let language = crate::language::lookup("c").unwrap();
        let context = ctx(&work_dir, language, 4);

        let runner = CountingRunner {
            calls: AtomicUsize::new(0),
        };
        let results = run_batch(&runner, &context);
        assert_eq!(results.len(), 4);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 4);
        let stdouts: Vec<&str> = results.iter().map(|r| r.stdout.as_str()).collect();
        assert_eq!(stdouts, vec!["1", "2", "3", "4"]);
    }
}
