//! The exit-code-to-verdict decision table of spec.md §4.1, encoded as data rather
//! than a chain of `if`s (per the teacher's own design note in `sandbox/runner.rs`'s
//! style of separating "what" from "how").

use crate::verdict::Verdict;

/// `(exit_or_signal_code, verdict, extra_stderr_message)`.
const SIGNAL_TABLE: &[(i32, Verdict, Option<&str>)] = &[
    (124, Verdict::Tle, None),
    (137, Verdict::Mle, None),
    (139, Verdict::Re, Some("Segmentation fault")),
    (136, Verdict::Re, Some("Floating point exception")),
    (134, Verdict::Re, Some("Aborted")),
];

/// Classifies a child's exit/signal code into a verdict and an optional message to
/// append to stderr, per spec.md §4.1's table. Any nonzero code not in the table
/// maps to a bare `Re`; zero maps to `Ok`.
pub fn classify_exit_code(code: i32) -> (Verdict, Option<&'static str>) {
    if code == 0 {
        return (Verdict::Ok, None);
    }

    for (candidate, verdict, message) in SIGNAL_TABLE {
        if *candidate == code {
            return (*verdict, *message);
        }
    }

    (Verdict::Re, None)
}

/// Classifies the signal number that killed a child (isolate's `exitsig`, not
/// `exitcode` — isolate never populates the latter for a signal death) by routing it
/// through the same exit-code table as a normal exit, via the `code = 128 + signal`
/// convention `classify_exit_code`'s entries already use (137 = 128+9 SIGKILL,
/// 139 = 128+11 SIGSEGV, 136 = 128+8 SIGFPE, 134 = 128+6 SIGABRT).
pub fn classify_signal(signal: i32) -> (Verdict, Option<&'static str>) {
    classify_exit_code(128 + signal)
}

/// Key/value fields parsed out of an `isolate`-style meta file.
#[derive(Debug, Default)]
pub struct MetaFields {
    pub killed: bool,
    pub cg_oom_killed: bool,
    pub exit_code: Option<i32>,
    pub exit_signal: Option<i32>,
    pub peak_memory_kb: Option<u64>,
    pub message: Option<String>,
    pub time_wall_ms: Option<u64>,
}

/// Parses `key:value` lines out of an isolate meta file's contents.
pub fn parse_meta(content: &str) -> MetaFields {
    let mut fields = MetaFields::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        match key {
            "killed" => fields.killed = true,
            "cg-oom-killed" => fields.cg_oom_killed = true,
            "exitcode" => fields.exit_code = value.parse().ok(),
            "exitsig" => fields.exit_signal = value.parse().ok(),
            "cg-mem" => fields.peak_memory_kb = value.parse().ok(),
            "max-rss" if fields.peak_memory_kb.is_none() => {
                fields.peak_memory_kb = value.parse().ok()
            }
            "message" => fields.message = Some(value.to_string()),
            "time-wall" => {
                fields.time_wall_ms = value
                    .parse::<f64>()
                    .ok()
                    .map(|secs| (secs * 1000.0) as u64)
            }
            _ => {}
        }
    }

    fields
}

/// Resolves a final verdict from parsed meta fields, falling back to the exit-code
/// table of spec.md §4.1 when isolate didn't flag `killed`/`cg-oom-killed` directly.
/// isolate reports a signal death via `exitsig`, not `exitcode` (`exitcode` is only
/// ever set for a normal exit), so `exitsig` must be checked before giving up and
/// reporting `Ie`.
pub fn verdict_from_meta(fields: &MetaFields) -> (Verdict, Option<&'static str>) {
    if fields.killed {
        return (Verdict::Tle, None);
    }
    if fields.cg_oom_killed {
        return (Verdict::Mle, None);
    }
    if let Some(code) = fields.exit_code {
        return classify_exit_code(code);
    }
    if let Some(signal) = fields.exit_signal {
        return classify_signal(signal);
    }
    (Verdict::Ie, None)
}
