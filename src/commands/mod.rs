//! 命令
//!
//! [`command_definitions`] 给出 `main` 注册到内核的命令表。

pub mod clean;
pub mod config;
pub mod result;
pub mod upload;

use crate::infrastructure::CommandConstructor;
use crate::logging::LogLevel;
use clap::Args;

/// 公共的 `--log-level` 选项
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LogLevelArgs {
    /// 日志级别
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

/// 内置命令表
pub fn command_definitions() -> Vec<CommandConstructor> {
    vec![
        clean::CleanCommand::create,
        result::ResultCommand::create,
        upload::UploadCommand::create,
        config::ConfigCommand::create,
    ]
}
