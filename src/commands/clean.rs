//! `clean <configId>`
//!
//! 对比平台模板目录，删除平台构建目录中模板里不存在的顶层条目。

use super::LogLevelArgs;
use crate::errors::{AppError, AppResult, ProjectError};
use crate::infrastructure::command::parse_args;
use crate::infrastructure::{CommandBase, CommandContext};
use crate::project::{find_project_root, parse_config_id, resolve_template_dir, Platform};
use crate::services::LoggerService;
use crate::utils::fs::{list_entry_names, remove_entry};
use crate::utils::paths;
use async_trait::async_trait;
use clap::{ArgMatches, Args};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    /// 平台配置ID
    #[arg(value_name = "configId")]
    pub config_id: String,

    #[command(flatten)]
    pub log: LogLevelArgs,
}

pub struct CleanCommand {
    ctx: CommandContext,
}

impl CleanCommand {
    pub fn create(ctx: CommandContext) -> Box<dyn CommandBase> {
        Box::new(Self { ctx })
    }
}

#[async_trait]
impl CommandBase for CleanCommand {
    fn on_enable(&self) -> clap::Command {
        CleanArgs::augment_args(clap::Command::new("clean").about("清理指定平台的项目目录"))
    }

    async fn action(&self, matches: &ArgMatches) -> AppResult<()> {
        let args: CleanArgs = parse_args(matches)?;
        self.ctx.apply_log_level(args.log.log_level)?;
        let logger = self.ctx.logger()?;

        let cwd = std::env::current_dir()
            .map_err(|e| AppError::IO("reading the current directory".to_string(), e))?;
        let project_root = find_project_root(&cwd)?;
        let template_dir = resolve_template_dir(&paths::template_data_file())?;
        logger.debug(format!("template path: {}", template_dir.display()));

        let removed =
            Cleanup::new(logger.clone()).clean(&project_root, &template_dir, &args.config_id)?;
        if removed.is_empty() {
            logger.info("Nothing to remove.");
        }
        Ok(())
    }
}

/// 平台目录清理
pub struct Cleanup {
    logger: Arc<LoggerService>,
}

impl Cleanup {
    pub fn new(logger: Arc<LoggerService>) -> Self {
        Self { logger }
    }

    /// 模板目录与目标目录，`hippoo` 平台的内容位于 `game` 子目录
    pub fn resolve_dirs(
        project_root: &Path,
        template_dir: &Path,
        config_id: &str,
    ) -> (PathBuf, PathBuf) {
        let info = parse_config_id(config_id);
        let mut platform_template = template_dir.join("common").join(&info.platform);
        let mut target = project_root.join("platform").join(config_id);

        if info.platform_kind() == Some(Platform::Hippoo) {
            platform_template.push("game");
            target.push("game");
        }

        (platform_template, target)
    }

    /// 删除目标目录中模板不包含的条目，返回被删除的路径
    pub fn clean(
        &self,
        project_root: &Path,
        template_dir: &Path,
        config_id: &str,
    ) -> Result<Vec<PathBuf>, ProjectError> {
        self.logger
            .info(format!("Project cleanup started for config ID: {}", config_id));

        let (platform_template, target) = Self::resolve_dirs(project_root, template_dir, config_id);
        let keep: HashSet<String> = list_entry_names(&platform_template)
            .map_err(|e| ProjectError::DirRead(platform_template.display().to_string(), e))?
            .into_iter()
            .collect();
        let entries = list_entry_names(&target)
            .map_err(|e| ProjectError::DirRead(target.display().to_string(), e))?;

        let mut removed = Vec::new();
        for name in entries.into_iter().filter(|name| !keep.contains(name)) {
            let path = target.join(&name);
            self.logger.info(format!("Remove File: {}", path.display()));
            remove_entry(&path).map_err(|e| ProjectError::Remove(path.display().to_string(), e))?;
            removed.push(path);
        }

        self.logger.info("Project cleanup completed.");
        Ok(removed)
    }
}
