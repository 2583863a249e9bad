//! The static language catalogue: one entry per supported language tag, fixing the
//! source file name, compile/syntax-check command template, and execute command
//! template. Initialised once at process start and never mutated afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

/// One entry in the language catalogue.
#[derive(Debug, Clone)]
pub struct LanguageDescriptor {
    pub tag: &'static str,
    pub display_name: &'static str,
    pub source_file: &'static str,
    /// `None` for interpreted languages that only need a syntax check (or nothing)
    /// before execution.
    pub compile_command: Option<&'static [&'static str]>,
    pub execute_command: &'static [&'static str],
}

fn build_catalogue() -> HashMap<&'static str, LanguageDescriptor> {
    let mut catalogue = HashMap::new();

    catalogue.insert(
        "c",
        LanguageDescriptor {
            tag: "c",
            display_name: "C",
            source_file: "main.c",
            compile_command: Some(&["gcc", "-O2", "-o", "main", "main.c"]),
            execute_command: &["./main"],
        },
    );

    catalogue.insert(
        "cpp",
        LanguageDescriptor {
            tag: "cpp",
            display_name: "C++",
            source_file: "main.cpp",
            compile_command: Some(&["g++", "-O2", "-std=c++17", "-o", "main", "main.cpp"]),
            execute_command: &["./main"],
        },
    );

    catalogue.insert(
        "python",
        LanguageDescriptor {
            tag: "python",
            display_name: "Python 3",
            source_file: "main.py",
            compile_command: Some(&["python3", "-m", "py_compile", "main.py"]),
            execute_command: &["python3", "main.py"],
        },
    );

    catalogue
}

static CATALOGUE: OnceLock<HashMap<&'static str, LanguageDescriptor>> = OnceLock::new();

/// Returns the process-wide language catalogue, building it on first access.
pub fn catalogue() -> &'static HashMap<&'static str, LanguageDescriptor> {
    CATALOGUE.get_or_init(build_catalogue)
}

/// Looks up a language by tag.
pub fn lookup(tag: &str) -> Option<&'static LanguageDescriptor> {
    catalogue().get(tag)
}
