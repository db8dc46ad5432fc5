use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Where component lifecycle and registry logs go.
///
/// Without `dir` the subscriber writes to stdout. With `dir` set, output
/// goes to a rolling file under that directory; the guard returned by
/// [`init`] must then stay alive for the lifetime of the program.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
    pub prefix: String,
    pub rotation: String,
    pub keep_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            dir: None,
            prefix: "flowrt".into(),
            rotation: "daily".into(),
            keep_files: 3,
        }
    }
}

impl LogConfig {
    /// Defaults overridden from the environment: FLOWRT_LOG,
    /// FLOWRT_LOG_DIR, FLOWRT_LOG_PREFIX, FLOWRT_LOG_ROTATION.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("FLOWRT_LOG") {
            config.level = level;
        }
        if let Ok(dir) = std::env::var("FLOWRT_LOG_DIR") {
            config.dir = Some(PathBuf::from(dir));
        }
        if let Ok(prefix) = std::env::var("FLOWRT_LOG_PREFIX") {
            config.prefix = prefix;
        }
        if let Ok(rotation) = std::env::var("FLOWRT_LOG_ROTATION") {
            config.rotation = rotation;
        }
        config
    }

    fn rotation(&self) -> Rotation {
        match self.rotation.as_str() {
            "minutely" => Rotation::MINUTELY,
            "hourly" => Rotation::HOURLY,
            "never" => Rotation::NEVER,
            _ => Rotation::DAILY,
        }
    }
}

/// Install the global tracing subscriber described by `config`.
pub fn init(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let level = Level::from_str(&config.level).unwrap_or(Level::INFO);

    let Some(dir) = config.dir.as_ref() else {
        let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
        return Ok(None);
    };

    let appender: RollingFileAppender = RollingFileAppender::builder()
        .rotation(config.rotation())
        .max_log_files(config.keep_files)
        .filename_prefix(config.prefix.as_str())
        .build(dir)
        .with_context(|| format!("cannot open log directory {}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .try_init();

    tracing::info!(
        "logging to {} (rotation: {})",
        dir.display(),
        config.rotation
    );
    Ok(Some(guard))
}
