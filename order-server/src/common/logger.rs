//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and
//! production environments. Features:
//! - Daily rotating application logs (deleted after 14 days)
//! - Permanent audit logs (never deleted)
//! - Permanent security logs (never deleted)

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Clean up old application log files (older than 14 days)
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    let cutoff = chrono::Utc::now() - chrono::Duration::days(14);

    let app_log_dir = log_dir.join("app");
    if app_log_dir.exists() {
        for entry in fs::read_dir(app_log_dir)? {
            let entry = entry?;
            let path = entry.path();

            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && name.starts_with("app-")
                && name.ends_with(".log")
                && let Some(date_part) = name
                    .strip_prefix("app-")
                    .and_then(|d| d.strip_suffix(".log"))
                && let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                && date < cutoff.date_naive()
            {
                fs::remove_file(&path)?;
                tracing::info!(file = %name, "Deleted old log file");
            }
        }
    }

    Ok(())
}

/// Initialize the logging system with daily rotating logs
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug", "warn")
/// * `json_format` - JSON output (production) or pretty output (development)
/// * `log_dir` - Optional directory for file logging
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // The json/pretty console variants and the filtered file layers all
    // have distinct concrete types; boxing lets one stack carry them
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![env_filter.boxed()];

    if json_format {
        layers.push(fmt::layer().json().with_target(true).boxed());
    } else {
        layers.push(fmt::layer().with_target(true).with_line_number(true).boxed());
    }

    if let Some(dir) = log_dir {
        let log_dir = Path::new(dir);
        let app_log_dir = log_dir.join("app");
        let audit_log_dir = log_dir.join("audit");
        let security_log_dir = log_dir.join("security");
        fs::create_dir_all(&app_log_dir)?;
        fs::create_dir_all(&audit_log_dir)?;
        fs::create_dir_all(&security_log_dir)?;

        // Application logs rotate daily and are subject to the 14-day
        // cleanup; audit and security logs are kept forever
        let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
        let audit_log = RollingFileAppender::new(Rotation::DAILY, audit_log_dir, "audit");
        let security_log = RollingFileAppender::new(Rotation::DAILY, security_log_dir, "security");

        layers.push(
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() != "audit" && meta.target() != "security"
                }))
                .boxed(),
        );

        layers.push(
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(audit_log))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() == "audit"
                }))
                .boxed(),
        );

        layers.push(
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(security_log))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() == "security"
                }))
                .boxed(),
        );

        tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));
    }

    tracing_subscriber::registry().with(layers).init();

    Ok(())
}

/// Periodic cleanup task - runs every hour to clean old logs
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        sleep(Duration::from_secs(3600)).await;

        if let Err(e) = cleanup_old_logs(&log_dir) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
    }
}

/// Initialize the logging system (console only)
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single init test: the global subscriber can only be set once per
    // process, so the console-only path is covered through main
    #[tokio::test]
    async fn test_file_logger_initializes_with_all_layers() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().to_str().unwrap();

        init_logger_with_file("info", true, Some(log_dir)).unwrap();

        assert!(dir.path().join("app").is_dir());
        assert!(dir.path().join("audit").is_dir());
        assert!(dir.path().join("security").is_dir());

        tracing::info!(target: "audit", event = "test_event", "audit line");
        tracing::info!("app line");
    }
}
