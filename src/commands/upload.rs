//! `upload <file>`

use super::LogLevelArgs;
use crate::errors::AppResult;
use crate::infrastructure::command::parse_args;
use crate::infrastructure::{CommandBase, CommandContext};
use crate::services::{UploadService, UPLOAD};
use async_trait::async_trait;
use clap::{ArgMatches, Args};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// 待上传的文件
    pub file: PathBuf,

    /// 远程对象名，默认使用文件名
    #[arg(short, long)]
    pub dest: Option<String>,

    #[command(flatten)]
    pub log: LogLevelArgs,
}

pub struct UploadCommand {
    ctx: CommandContext,
}

impl UploadCommand {
    pub fn create(ctx: CommandContext) -> Box<dyn CommandBase> {
        Box::new(Self { ctx })
    }
}

#[async_trait]
impl CommandBase for UploadCommand {
    fn on_enable(&self) -> clap::Command {
        UploadArgs::augment_args(clap::Command::new("upload").about("上传文件到云存储"))
    }

    async fn action(&self, matches: &ArgMatches) -> AppResult<()> {
        let args: UploadArgs = parse_args(matches)?;
        self.ctx.apply_log_level(args.log.log_level)?;

        let uploader = self.ctx.require_service::<UploadService>(UPLOAD)?;
        let url = uploader
            .upload_file(&args.file, args.dest.as_deref())
            .await?;

        println!("{}", url);
        Ok(())
    }
}
