//! Opt-in file tracing.
//!
//! Nothing is installed unless `MKTS_TRACE` is set to something other than
//! `0`. Environment variables take precedence over [`LoggingConfig`]:
//!
//! - `MKTS_TRACE_FILE`: log path, default `mkts_trace.log`
//! - `MKTS_TRACE_JSON`: `0` for compact text, anything else for JSON
//! - `MKTS_TRACE_LEVEL`: `EnvFilter` directive, e.g. `marketstore_client=debug`

use crate::config::LoggingConfig;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

const DEFAULT_TRACE_FILE: &str = "mkts_trace.log";

static TRACE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Resolved tracing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSettings {
    pub path: PathBuf,
    pub json: bool,
    pub level: String,
}

impl TraceSettings {
    /// Resolve settings from `lookup` (normally the process environment),
    /// falling back to `config`. `None` when tracing is disabled.
    pub fn resolve<F>(config: &LoggingConfig, lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !lookup("MKTS_TRACE").is_some_and(|v| v != "0") {
            return None;
        }

        let path = lookup("MKTS_TRACE_FILE").unwrap_or_else(|| DEFAULT_TRACE_FILE.to_string());
        let json = lookup("MKTS_TRACE_JSON").map_or_else(|| config.format == "json", |v| v != "0");
        let level = lookup("MKTS_TRACE_LEVEL").unwrap_or_else(|| config.level.clone());

        Some(Self {
            path: PathBuf::from(path),
            json,
            level,
        })
    }
}

/// Install the global tracing subscriber if `MKTS_TRACE` asks for one.
///
/// Returns `true` when a subscriber was installed by this call. Safe to call
/// more than once; later calls leave the first subscriber in place.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let Some(settings) = TraceSettings::resolve(config, |key| env::var(key).ok()) else {
        return false;
    };

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.path)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!(
                "ERROR: Unable to open MKTS_TRACE_FILE '{}': {e}",
                settings.path.display()
            );
            return false;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = tracing_subscriber::EnvFilter::try_new(&settings.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trace"));

    let base = || {
        tracing_subscriber::fmt()
            .with_env_filter(filter.clone())
            .with_ansi(false)
            .with_thread_names(true)
            .with_writer(non_blocking.clone())
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
    };

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if settings.json {
        Box::new(base().json().finish())
    } else {
        Box::new(base().compact().finish())
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    let _ = TRACE_GUARD.set(guard);
    true
}
