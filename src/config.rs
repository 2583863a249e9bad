//! Process configuration: CLI overrides (`clap`) layered over environment variables
//! (`dotenvy`), with the defaults of spec.md §6.

use clap::Parser;
use std::env;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "judge-core", version, about, long_about = None)]
pub struct CliArgs {
    /// Path to a `.env` file to load before reading environment variables.
    #[arg(long = "env-file", short = 'e')]
    pub env_file: Option<PathBuf>,

    /// Overrides MAX_CONCURRENT.
    #[arg(long, short)]
    pub threads: Option<u8>,

    /// Verbose logging (overrides RUST_LOG to "debug").
    #[arg(long, short)]
    pub verbose: bool,
}

impl CliArgs {
    /// Loads configuration: `.env` (if given) then environment, then CLI overrides.
    pub fn load_config(&self) -> Config {
        if let Some(path) = &self.env_file {
            let _ = dotenvy::from_path(path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let mut config = Config::from_env();
        if let Some(threads) = self.threads {
            config.max_concurrent = threads as usize;
        }
        config
    }
}

/// Resource bounds enforced before a submission is admitted.
#[derive(Debug, Clone)]
pub struct Limits {
    pub max_code_size: usize,
    pub max_time_limit_s: u32,
    pub max_memory_limit_mb: u32,
    pub max_tests: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_code_size: 65_536,
            max_time_limit_s: 10,
            max_memory_limit_mb: 512,
            max_tests: 50,
        }
    }
}

/// Which `SandboxRunner` backend to use; static for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Container,
    Process,
}

impl ExecutionMode {
    fn from_env_value(value: &str) -> Self {
        match value {
            "process" => ExecutionMode::Process,
            _ => ExecutionMode::Container,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub execution_mode: ExecutionMode,
    pub max_concurrent: usize,
    pub default_time_limit_s: u32,
    pub limits: Limits,
    pub default_memory_limit_mb: u32,
    pub sandbox_image: String,
    pub temp_dir: PathBuf,
    pub rate_limit_window_ms: u64,
    pub rate_limit_max: u32,
    pub dev_errors: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Reads configuration from environment variables, falling back to the defaults
    /// tabulated in spec.md §6.
    pub fn from_env() -> Self {
        let default_limits = Limits::default();

        Config {
            port: env_or("PORT", 3000),
            execution_mode: env::var("EXECUTION_MODE")
                .map(|v| ExecutionMode::from_env_value(&v))
                .unwrap_or(ExecutionMode::Container),
            max_concurrent: env_or("MAX_CONCURRENT", 2usize),
            default_time_limit_s: env_or("DEFAULT_TIME_LIMIT", 5u32),
            limits: Limits {
                max_time_limit_s: env_or("MAX_TIME_LIMIT", default_limits.max_time_limit_s),
                max_memory_limit_mb: env_or(
                    "MAX_MEMORY_LIMIT",
                    default_limits.max_memory_limit_mb,
                ),
                max_code_size: env_or("MAX_CODE_SIZE", default_limits.max_code_size),
                max_tests: default_limits.max_tests,
            },
            default_memory_limit_mb: env_or("DEFAULT_MEMORY_LIMIT", 256u32),
            sandbox_image: env::var("SANDBOX_IMAGE").unwrap_or_else(|_| "judge-sandbox".into()),
            temp_dir: env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/judge")),
            rate_limit_window_ms: env_or("RATE_LIMIT_WINDOW", 60_000u64),
            rate_limit_max: env_or("RATE_LIMIT_MAX", 30u32),
            dev_errors: env::var("DEV_ERRORS").is_ok(),
        }
    }
}
