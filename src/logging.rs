//! tracing 初始化：按天滚动的日志文件，RUST_LOG 可覆盖默认级别

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::services::config::ensure_log_dir;

pub const LOG_FILE_PREFIX: &str = "coledit.log";

pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_dir: PathBuf,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

fn fallback_log_dir() -> std::io::Result<PathBuf> {
    let dir = std::env::temp_dir().join("coledit").join("logs");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// log_dir 为 None 时使用配置目录下的 logs，失败再退回临时目录。
/// 已有全局 subscriber 时返回 None。
pub fn init(log_dir: Option<PathBuf>) -> Option<LoggingGuard> {
    let log_dir = match log_dir {
        Some(dir) => std::fs::create_dir_all(&dir).map(|_| dir),
        None => ensure_log_dir().or_else(|_| fallback_log_dir()),
    }
    .ok()?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coledit=info"));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    std::panic::set_hook(Box::new(|panic_info| {
        tracing::error!(panic = %panic_info, "panic");
    }));

    tracing::info!(log_dir = %log_dir.display(), "tracing initialized");

    Some(LoggingGuard {
        _guard: guard,
        log_dir,
    })
}
