//! The verdict engine: comparing sandbox output against expected output and
//! aggregating per-case verdicts into a submission-level result.

use serde::{Deserialize, Serialize};

/// Closed set of verdict tags. `Ok` is only ever produced by the sandbox runner
/// itself (program exited 0 in time); the verdict engine turns it into `Ac`/`Wa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "CE")]
    Ce,
    #[serde(rename = "TLE")]
    Tle,
    #[serde(rename = "MLE")]
    Mle,
    #[serde(rename = "RE")]
    Re,
    #[serde(rename = "IE")]
    Ie,
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "WA")]
    Wa,
}

impl Verdict {
    pub fn is_ac(self) -> bool {
        matches!(self, Verdict::Ac)
    }
}

/// Result of running one test case through the sandbox, before the verdict engine
/// has compared it against the expected output.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub verdict: Verdict,
    pub stdout: String,
    pub stderr: String,
    pub execution_time_ms: u64,
    pub peak_memory_kb: Option<u64>,
    pub exit_code: Option<i32>,
    pub wall_time_ms: u64,
}

impl RunResult {
    /// Builds an `Ie` result with no captured output, for synthesising entries when
    /// the sandbox itself could not be trusted to report anything.
    pub fn internal_error(message: impl Into<String>) -> Self {
        RunResult {
            verdict: Verdict::Ie,
            stdout: String::new(),
            stderr: message.into(),
            execution_time_ms: 0,
            peak_memory_kb: None,
            exit_code: None,
            wall_time_ms: 0,
        }
    }
}

/// Per-case result after the verdict engine has judged it against the expected output.
#[derive(Debug, Clone, Serialize)]
pub struct CaseVerdict {
    pub index: usize,
    pub verdict: Verdict,
    pub execution_time_ms: u64,
    pub peak_memory_kb: Option<u64>,
    pub exit_code: Option<i32>,
    pub wall_time_ms: u64,
    pub stdout: String,
    pub stderr: String,
}

/// Submission-level aggregate, as defined by the data model.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub overall_verdict: Verdict,
    pub total_time_ms: u64,
    pub max_memory_kb: u64,
    pub total_cases: usize,
    pub passed: usize,
    pub failed: usize,
    /// Always 0 today: this engine runs every case to completion and never
    /// early-terminates a submission (see DESIGN.md, "skipped is reserved").
    pub skipped: usize,
    pub first_failed_index: Option<usize>,
    pub per_case: Vec<CaseVerdict>,
}

/// Normalises program output for comparison: convert CRLF to LF, right-strip each
/// line, then right-strip the whole string. Idempotent by construction.
pub fn normalize(s: &str) -> String {
    let unified = s.replace("\r\n", "\n");
    let lines: Vec<&str> = unified.lines().map(|line| line.trim_end()).collect();
    lines.join("\n").trim_end().to_string()
}

/// Judges a single case: if the run didn't produce `Ok`, propagate that verdict
/// unchanged. Otherwise normalise and compare actual vs. expected output.
pub fn judge_case(run_result: &RunResult, expected_output: &str) -> Verdict {
    if run_result.verdict != Verdict::Ok {
        return run_result.verdict;
    }

    if normalize(&run_result.stdout) == normalize(expected_output) {
        Verdict::Ac
    } else {
        Verdict::Wa
    }
}

/// Builds the submission-level result for a batch that never reached the sandbox at
/// all (directory setup failed, the executor panicked, ...): every one of the `n`
/// cases is synthesised as `Ie` with the same message, per spec.md §3's invariant
/// that `per_case.length == N` even on internal failure.
pub fn internal_error_result(n: usize, message: impl Into<String>) -> SubmissionResult {
    let message = message.into();
    let runs: Vec<RunResult> = (0..n).map(|_| RunResult::internal_error(message.clone())).collect();
    let verdicts: Vec<Verdict> = runs.iter().map(|r| r.verdict).collect();
    aggregate(&verdicts, &runs)
}

/// Aggregates per-case verdicts and run results into a submission-level result.
///
/// `case_verdicts` and `run_results` must have the same length, equal to `N`.
pub fn aggregate(case_verdicts: &[Verdict], run_results: &[RunResult]) -> SubmissionResult {
    assert_eq!(case_verdicts.len(), run_results.len());

    let total_cases = case_verdicts.len();
    let passed = case_verdicts.iter().filter(|v| v.is_ac()).count();
    let failed = total_cases - passed;
    let first_failed_index = case_verdicts.iter().position(|v| !v.is_ac());

    let overall_verdict = if failed == 0 {
        Verdict::Ac
    } else {
        case_verdicts[first_failed_index.unwrap()]
    };

    let total_time_ms = run_results.iter().map(|r| r.execution_time_ms).sum();
    let max_memory_kb = run_results
        .iter()
        .filter_map(|r| r.peak_memory_kb)
        .max()
        .unwrap_or(0);

    let per_case = case_verdicts
        .iter()
        .zip(run_results.iter())
        .enumerate()
        .map(|(index, (verdict, run))| CaseVerdict {
            index,
            verdict: *verdict,
            execution_time_ms: run.execution_time_ms,
            peak_memory_kb: run.peak_memory_kb,
            exit_code: run.exit_code,
            wall_time_ms: run.wall_time_ms,
            stdout: run.stdout.clone(),
            stderr: run.stderr.clone(),
        })
        .collect();

    SubmissionResult {
        overall_verdict,
        total_time_ms,
        max_memory_kb,
        total_cases,
        passed,
        failed,
        skipped: 0,
        first_failed_index,
        per_case,
    }
}
