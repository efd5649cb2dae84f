//! 命令抽象
//!
//! 每个命令在 `on_enable` 中声明自己的子解析器，执行时通过
//! [`CommandContext`] 按名称取得共享服务。

use super::container::ServiceManager;
use crate::errors::{AppError, AppResult};
use crate::logging::LogLevel;
use crate::services::{self, LoggerService};
use async_trait::async_trait;
use clap::{ArgMatches, FromArgMatches};
use std::sync::Arc;

/// 命令接口
#[async_trait]
pub trait CommandBase: Send + Sync {
    /// 声明子命令的名称、参数与选项
    fn on_enable(&self) -> clap::Command;

    /// 执行命令，`matches` 为该子命令自身的匹配结果
    async fn action(&self, matches: &ArgMatches) -> AppResult<()>;
}

/// 命令构造函数
pub type CommandConstructor = fn(CommandContext) -> Box<dyn CommandBase>;

/// 命令执行上下文，绑定到内核的服务容器
#[derive(Clone)]
pub struct CommandContext {
    services: ServiceManager,
}

impl CommandContext {
    pub fn new(services: ServiceManager) -> Self {
        Self { services }
    }

    pub fn get_service<T: Send + Sync + 'static>(&self, name: &str) -> AppResult<Option<Arc<T>>> {
        Ok(self.services.get_service(name)?)
    }

    pub fn require_service<T: Send + Sync + 'static>(&self, name: &str) -> AppResult<Arc<T>> {
        Ok(self.services.require_service(name)?)
    }

    pub fn logger(&self) -> AppResult<Arc<LoggerService>> {
        self.require_service(services::LOGGER)
    }

    /// 应用命令行上的 `--log-level`
    pub fn apply_log_level(&self, level: LogLevel) -> AppResult<()> {
        self.logger()?.set_level(level);
        Ok(())
    }
}

/// 将子命令的匹配结果解析为 derive 参数结构
pub fn parse_args<A: FromArgMatches>(matches: &ArgMatches) -> AppResult<A> {
    A::from_arg_matches(matches).map_err(|e| AppError::cli(e.to_string()))
}
