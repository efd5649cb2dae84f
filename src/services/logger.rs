//! 日志服务
//!
//! 持有运行时日志级别，所有输出经由 `log` 门面。

use crate::infrastructure::{Service, ServiceContext, ServiceHandle};
use crate::logging::LogLevel;
use parking_lot::RwLock;
use std::fmt::Display;

const TARGET: &str = "fast";

#[derive(Debug, Default)]
pub struct LoggerService {
    level: RwLock<LogLevel>,
}

impl LoggerService {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: RwLock::new(level),
        }
    }

    pub fn construct(_ctx: &ServiceContext) -> anyhow::Result<ServiceHandle> {
        Ok(ServiceHandle::new(Self::default()))
    }

    /// 设置日志级别，同时调整全局最大级别
    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
        log::set_max_level(level.to_level_filter());
    }

    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    /// 指定级别的消息是否会被输出
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && level <= self.level()
    }

    fn emit(&self, level: LogLevel, message: impl Display) {
        if !self.enabled(level) {
            return;
        }
        if let Some(level) = level.as_log_level() {
            log::log!(target: TARGET, level, "{}", message);
        }
    }

    pub fn debug(&self, message: impl Display) {
        self.emit(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.emit(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.emit(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Display) {
        self.emit(LogLevel::Error, message);
    }
}

impl Service for LoggerService {
    fn on_register(&self, _ctx: &ServiceContext) -> anyhow::Result<()> {
        log::set_max_level(self.level().to_level_filter());
        Ok(())
    }
}
