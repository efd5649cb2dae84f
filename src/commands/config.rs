//! `config` 查看与修改用户配置

use crate::errors::AppResult;
use crate::infrastructure::command::parse_args;
use crate::infrastructure::{CommandBase, CommandContext};
use crate::services::{ConfigService, CONFIG};
use async_trait::async_trait;
use clap::{ArgMatches, Args, Subcommand};
use serde_json::Value;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// 显示配置文件位置
    Path,
    /// 读取配置，省略路径时输出全部
    Get {
        /// 点分路径，例如 cloud.oss.bucket
        path: Option<String>,
    },
    /// 写入配置，值按 JSON 解析，失败时视为字符串
    Set { path: String, value: String },
    /// 删除配置
    Unset { path: String },
}

/// 命令行上的值：合法 JSON 按 JSON 处理，否则作为字符串
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub struct ConfigCommand {
    ctx: CommandContext,
}

impl ConfigCommand {
    pub fn create(ctx: CommandContext) -> Box<dyn CommandBase> {
        Box::new(Self { ctx })
    }
}

#[async_trait]
impl CommandBase for ConfigCommand {
    fn on_enable(&self) -> clap::Command {
        ConfigArgs::augment_args(
            clap::Command::new("config")
                .about("查看或修改用户配置")
                .arg_required_else_help(true),
        )
    }

    async fn action(&self, matches: &ArgMatches) -> AppResult<()> {
        let args: ConfigArgs = parse_args(matches)?;
        let config = self.ctx.require_service::<ConfigService>(CONFIG)?;
        let logger = self.ctx.logger()?;

        match args.action {
            ConfigAction::Path => println!("{}", config.path().display()),
            ConfigAction::Get { path } => {
                let value = match path.as_deref() {
                    Some(path) => config.get_path(path)?,
                    None => Some(config.snapshot()),
                };
                match value {
                    Some(value) => println!("{}", pretty(&value)),
                    None => logger.warn(format!("{} is not set", path.unwrap_or_default())),
                }
            }
            ConfigAction::Set { path, value } => {
                config.set_path(&path, parse_value(&value))?;
                config.flush()?;
                logger.info(format!("Set {}", path));
            }
            ConfigAction::Unset { path } => {
                if config.delete_path(&path)?.is_none() {
                    logger.warn(format!("{} is not set", path));
                }
                config.flush()?;
            }
        }
        Ok(())
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
