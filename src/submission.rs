//! The transient submission value and the validation enforced before admission.

use crate::config::Limits;
use crate::language;

/// A submission ready for the batch executor: one source file, one set of limits,
/// and `N >= 1` stdin payloads (the judge form has `N` payloads; `execute_one` wraps
/// a single payload into a one-element submission).
#[derive(Debug, Clone)]
pub struct Submission {
    pub language_tag: String,
    pub source_text: String,
    pub per_case_time_limit_s: u32,
    pub memory_limit_mb: u32,
    pub inputs: Vec<Vec<u8>>,
}

/// One offending field from validation, suitable for a 400 response's field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl Submission {
    /// Validates and constructs a submission. Mirrors spec.md §3's constraints
    /// exactly; called before the submission ever reaches the admission queue.
    pub fn new(
        language_tag: String,
        source_text: String,
        per_case_time_limit_s: u32,
        memory_limit_mb: u32,
        inputs: Vec<Vec<u8>>,
        limits: &Limits,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        if language::lookup(&language_tag).is_none() {
            errors.push(ValidationError {
                field: "language",
                message: format!("unsupported language tag: {language_tag}"),
            });
        }

        if source_text.is_empty() || source_text.len() > limits.max_code_size {
            errors.push(ValidationError {
                field: "code",
                message: format!(
                    "source must be between 1 and {} bytes",
                    limits.max_code_size
                ),
            });
        }

        if per_case_time_limit_s < 1 || per_case_time_limit_s > limits.max_time_limit_s {
            errors.push(ValidationError {
                field: "timeLimit",
                message: format!("must be between 1 and {} seconds", limits.max_time_limit_s),
            });
        }

        if memory_limit_mb < 16 || memory_limit_mb > limits.max_memory_limit_mb {
            errors.push(ValidationError {
                field: "memoryLimit",
                message: format!(
                    "must be between 16 and {} MB",
                    limits.max_memory_limit_mb
                ),
            });
        }

        if inputs.is_empty() || inputs.len() > limits.max_tests {
            errors.push(ValidationError {
                field: "testCases",
                message: format!("must provide between 1 and {} cases", limits.max_tests),
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Submission {
            language_tag,
            source_text,
            per_case_time_limit_s,
            memory_limit_mb,
            inputs,
        })
    }

    pub fn case_count(&self) -> usize {
        self.inputs.len()
    }
}
