//! 日志
//!
//! 进程入口通过 [`init_logger`] 安装一次 `env_logger`，
//! 运行时级别由 `LoggerService` 通过 `log::set_max_level` 调整。

use crate::constants::LOG_DATE_FORMAT;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 日志级别
///
/// 顺序由低到高为 `Silent < Error < Warn < Info < Debug`，
/// 级别越高输出越多。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 关闭输出
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Silent => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }

    /// 对应的 `log::Level`；`Silent` 没有对应级别
    pub fn as_log_level(self) -> Option<log::Level> {
        self.to_level_filter().to_level()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Silent => "silent",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 安装全局日志输出
///
/// 本 crate 的日志全部放行，由运行时级别控制；第三方 crate 只输出警告以上。
/// `RUST_LOG` 可以进一步覆盖过滤规则。重复调用是安全的。
pub fn init_logger() {
    use std::io::Write;

    let result = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module(env!("CARGO_CRATE_NAME"), log::LevelFilter::Trace)
        .parse_default_env()
        .format(|buf, record| {
            let level_style = match record.level() {
                log::Level::Error => "\x1b[41;97m", // 红底
                log::Level::Warn => "\x1b[43;30m",  // 黄底
                log::Level::Info => "\x1b[42;30m",  // 绿底
                log::Level::Debug => "\x1b[46;30m", // 青底
                log::Level::Trace => "\x1b[100;97m", // 灰底
            };

            writeln!(
                buf,
                "\x1b[90m[{}]\x1b[0m {} {:<5} \x1b[0m {}",
                chrono::Local::now().format(LOG_DATE_FORMAT),
                level_style,
                record.level(),
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        log::set_max_level(LogLevel::default().to_level_filter());
    }
}

/// 操作计时器
pub struct OperationTimer {
    start: Instant,
    operation: String,
    metadata: HashMap<String, String>,
    finished: bool,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
            finished: false,
        }
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// 完成计时并记录日志，返回耗时
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let duration = self.start.elapsed();
        log::debug!(
            "{} completed in {}ms {:?}",
            self.operation,
            duration.as_millis(),
            self.metadata
        );
        duration
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.finished {
            log::debug!(
                "{} abandoned after {}ms {:?}",
                self.operation,
                self.start.elapsed().as_millis(),
                self.metadata
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn test_log_level_order() {
        assert!(LogLevel::Silent < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::Silent.to_level_filter(), log::LevelFilter::Off);
        assert_eq!(LogLevel::Silent.as_log_level(), None);
        assert_eq!(LogLevel::Warn.as_log_level(), Some(log::Level::Warn));
        assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("silent", true), Ok(LogLevel::Silent));
        assert_eq!(LogLevel::from_str("WARN", true), Ok(LogLevel::Warn));
        assert!(LogLevel::from_str("verbose", true).is_err());

        let level: LogLevel = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert_eq!(level.to_string(), "debug");
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("upload").with_metadata("file", "game.zip");

        assert_eq!(timer.operation, "upload");
        assert_eq!(timer.metadata.get("file"), Some(&"game.zip".to_string()));

        std::thread::sleep(Duration::from_millis(1));
        assert!(timer.finish() >= Duration::from_millis(1));
    }
}
