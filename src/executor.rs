//! The batch executor (BE of spec.md §4.2): owns a submission's [`WorkDir`] for its
//! lifetime, drives the sandbox runner across every case, truncates oversized
//! output, and hands the raw [`RunResult`]s to the verdict engine for judging.
//!
//! Grounded in the teacher's `Sandbox::run`/`SimpleRunner::run` (compile once, then
//! iterate test cases) and `routes/jobs/post.rs` (the HTTP-facing orchestration that
//! glues submission + sandbox + result together), generalized away from the
//! teacher's on-disk problem-set case files toward case payloads carried on the
//! [`crate::submission::Submission`] itself.

use std::sync::Arc;

use crate::config::Config;
use crate::language::LanguageDescriptor;
use crate::sandbox::{RunContext, SandboxRunner, run_batch};
use crate::submission::Submission;
use crate::verdict::{self, RunResult, SubmissionResult, Verdict};
use crate::workdir::WorkDir;

/// Output is truncated past these byte counts, with a trailing marker, so a runaway
/// program can't blow up memory or the wire response.
const MAX_STDOUT_BYTES: usize = 10_000;
const MAX_STDERR_BYTES: usize = 5_000;
const TRUNCATION_MARKER: &str = "...[truncated]";

/// Extra wall-clock headroom given to a whole submission on top of
/// `per_case_time_limit_s * case_count`, covering compilation and per-process
/// isolate overhead (spec.md §4.2).
const SUBMISSION_OVERHEAD_S: u32 = 20;

pub struct BatchExecutor {
    runner: Arc<dyn SandboxRunner>,
    temp_root: std::path::PathBuf,
}

impl BatchExecutor {
    pub fn new(runner: Arc<dyn SandboxRunner>, config: &Config) -> Self {
        BatchExecutor {
            runner,
            temp_root: config.temp_dir.clone(),
        }
    }

    /// The wall-clock budget the caller should use to bound this submission as a
    /// whole, independent of the sandbox's own per-case enforcement.
    pub fn submission_deadline_s(submission: &Submission) -> u32 {
        submission.per_case_time_limit_s * submission.case_count() as u32 + SUBMISSION_OVERHEAD_S
    }

    /// Runs every case of `submission` and returns the raw per-case results,
    /// without comparing against expected output (that's [`execute_and_judge`]'s
    /// job — this entry point is also used by the bare "run my code" endpoint,
    /// which has no expected output to compare against).
    pub fn execute(&self, submission: &Submission) -> anyhow::Result<Vec<RunResult>> {
        let language = self.resolve_language(submission)?;
        let work_dir = WorkDir::create(&self.temp_root)?;

        for (index, input) in submission.inputs.iter().enumerate() {
            let path = work_dir.input_path(index + 1);
            std::fs::write(&path, input)?;
        }

        let context = RunContext {
            work_dir: &work_dir,
            language,
            source_text: &submission.source_text,
            per_case_time_limit_s: submission.per_case_time_limit_s,
            memory_limit_mb: submission.memory_limit_mb,
            case_count: submission.case_count(),
        };

        let mut results = run_batch(self.runner.as_ref(), &context);
        for result in &mut results {
            truncate_in_place(&mut result.stdout, MAX_STDOUT_BYTES);
            truncate_in_place(&mut result.stderr, MAX_STDERR_BYTES);
        }

        Ok(results)
    }

    /// Runs `submission` and judges each case's output against `expected_outputs`,
    /// which must have the same length as `submission.inputs`.
    pub fn execute_and_judge(
        &self,
        submission: &Submission,
        expected_outputs: &[Vec<u8>],
    ) -> anyhow::Result<SubmissionResult> {
        assert_eq!(submission.inputs.len(), expected_outputs.len());

        let run_results = self.execute(submission)?;

        let case_verdicts: Vec<Verdict> = run_results
            .iter()
            .zip(expected_outputs.iter())
            .map(|(run_result, expected)| {
                let expected_text = String::from_utf8_lossy(expected);
                verdict::judge_case(run_result, &expected_text)
            })
            .collect();

        Ok(verdict::aggregate(&case_verdicts, &run_results))
    }

    fn resolve_language(&self, submission: &Submission) -> anyhow::Result<&'static LanguageDescriptor> {
        crate::language::lookup(&submission.language_tag)
            .ok_or_else(|| anyhow::anyhow!("unsupported language tag: {}", submission.language_tag))
    }
}

fn truncate_in_place(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }

    let mut cut = max_bytes;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    s.push_str(TRUNCATION_MARKER);
}
