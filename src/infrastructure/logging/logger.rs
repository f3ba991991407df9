use super::config::{LogConfig, LogFormat, RotationPolicy};
use anyhow::Result;
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const LOG_FILE_NAME: &str = "levelup.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logger implementation using tracing
///
/// Console output goes to stderr so command output on stdout stays clean.
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Initialize the global subscriber.
    ///
    /// # Errors
    /// Returns an error if the level is invalid or a subscriber is already set.
    pub fn init(config: &LogConfig) -> Result<Self> {
        let (layers, guard) = build_layers(config)?;
        tracing_subscriber::registry().with(layers).try_init()?;

        tracing::debug!(
            level = %config.level,
            format = ?config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

fn console_layer(format: LogFormat, level: Level) -> BoxedLayer {
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_current_span(true)
            .with_target(true)
            .with_filter(env_filter(level))
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(env_filter(level))
            .boxed(),
    }
}

fn build_layers(config: &LogConfig) -> Result<(Vec<BoxedLayer>, Option<WorkerGuard>)> {
    let level = parse_log_level(&config.level)?;
    let mut layers = Vec::new();

    let guard = if let Some(ref log_dir) = config.log_dir {
        let file_appender = match config.rotation {
            RotationPolicy::Daily => rolling::daily(log_dir, LOG_FILE_NAME),
            RotationPolicy::Hourly => rolling::hourly(log_dir, LOG_FILE_NAME),
            RotationPolicy::Never => rolling::never(log_dir, LOG_FILE_NAME),
        };
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

        // Files are always JSON
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter(level))
                .boxed(),
        );
        if config.enable_stdout {
            layers.push(console_layer(config.format, level));
        }
        Some(guard)
    } else {
        layers.push(console_layer(config.format, level));
        None
    };

    Ok((layers, guard))
}

/// Parse log level string to Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("trace"), Ok(Level::TRACE)));
        assert!(matches!(parse_log_level("WARN"), Ok(Level::WARN)));
        assert!(parse_log_level("invalid").is_err());
    }

    #[test]
    fn test_file_output_keeps_guard() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_dir: Some(dir.path().to_path_buf()),
            enable_stdout: false,
            rotation: RotationPolicy::Never,
            ..LogConfig::default()
        };

        let (layers, guard) = build_layers(&config).unwrap();
        assert_eq!(layers.len(), 1);
        assert!(guard.is_some());
    }

    #[test]
    fn test_console_only() {
        let (layers, guard) = build_layers(&LogConfig::default()).unwrap();
        assert_eq!(layers.len(), 1);
        assert!(guard.is_none());
    }
}
