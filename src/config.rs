// src/config.rs

use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use dotenvy::dotenv;

use crate::engine::ExecutionLimits;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the shared, read-only practice database.
    pub practice_db_path: String,
    pub bind_addr: SocketAddr,
    pub rust_log: String,

    /// Per-stage execution deadline for evaluations and practice queries.
    pub stage_timeout_ms: u64,
    pub max_concurrency: usize,
    pub max_rows: usize,

    /// Seconds to replenish one request per client on the routes that run
    /// caller-supplied SQL; 0 disables limiting.
    pub rate_limit_replenish_secs: u64,
    pub rate_limit_burst: u32,

    pub cors_origins: Vec<String>,

    /// Variables that were set but could not be parsed, as `KEY="value"`.
    /// Reported once logging is up.
    pub malformed_vars: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let practice_db_path = lookup("PRACTICE_DB_PATH")
            .expect("PRACTICE_DB_PATH must be set");

        let rust_log = lookup("RUST_LOG")
            .unwrap_or_else(|| "info".to_string());

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let defaults = ExecutionLimits::default();
        let mut vars = Vars {
            lookup,
            malformed: Vec::new(),
        };

        Self {
            practice_db_path,
            bind_addr: vars.parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000))),
            rust_log,
            stage_timeout_ms: vars.parse_or("EVAL_STAGE_TIMEOUT_MS", 2000),
            max_concurrency: vars.parse_or("EVAL_MAX_CONCURRENCY", defaults.max_concurrent),
            max_rows: vars.parse_or("EVAL_MAX_ROWS", defaults.max_rows),
            rate_limit_replenish_secs: vars.parse_or("RATE_LIMIT_REPLENISH_SECS", 1),
            rate_limit_burst: vars.parse_or("RATE_LIMIT_BURST", 10),
            cors_origins,
            malformed_vars: vars.malformed,
        }
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    pub fn execution_limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            stage_timeout: self.stage_timeout(),
            max_concurrent: self.max_concurrency,
            max_rows: self.max_rows,
        }
    }
}

struct Vars<F> {
    lookup: F,
    malformed: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Reads and parses an optional variable, falling back when unset or malformed.
    fn parse_or<T: FromStr>(&mut self, key: &str, default: T) -> T {
        match (self.lookup)(key) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                self.malformed.push(format!("{}={:?}", key, raw));
                default
            }),
            None => default,
        }
    }
}
