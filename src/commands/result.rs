//! `result <configId>`
//!
//! 生成平台构建的发布公告，输出并复制到剪贴板。

use super::LogLevelArgs;
use crate::constants::DEFAULT_PUBLISHER;
use crate::errors::{AppError, AppResult, ProjectError};
use crate::infrastructure::command::parse_args;
use crate::infrastructure::{CommandBase, CommandContext};
use crate::project::{find_project_root, parse_config_id, PlatformConfig, XyxConfig};
use crate::utils::system::{copy_to_clipboard, open_editor_and_read};
use crate::utils::text::{normalize_name, render_template};
use async_trait::async_trait;
use clap::{ArgMatches, Args};
use reqwest::Url;

/// 发布公告模板
pub const RESULT_TEMPLATE: &str = "【{{project_name}}】{{platform}} v{{version}} 已发布

游戏地址: {{game_url}}
正式广告链接: {{official_advertising_link}}
测试广告链接: {{test_advertising_link}}
包下载地址: {{package_download_address}}

{{changelog}}";

const CHANGELOG_TITLE: &str = "更新日志";

#[derive(Args, Debug, Clone)]
pub struct ResultArgs {
    /// 平台配置ID
    #[arg(value_name = "configId")]
    pub config_id: String,

    /// 更新日志，不带内容时打开编辑器输入
    #[arg(short, long, num_args = 0..=1, value_name = "message")]
    pub message: Option<Option<String>>,

    #[command(flatten)]
    pub log: LogLevelArgs,
}

/// 由线上地址推导出的链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLinks {
    pub official_advertising_link: String,
    pub test_advertising_link: String,
    /// 包名前缀，完整包名还需拼接版本号
    pub package_prefix: String,
    pub game_url: String,
    pub project_dir: String,
}

impl ReleaseLinks {
    pub fn package_name(&self, version: &str) -> String {
        format!("{}{}.zip", self.package_prefix, version)
    }
}

/// 根据配置 ID 与线上地址构建链接
///
/// 发行商域名为 `twww.<publisher>game.com`，未指定发行商时使用默认发行商。
pub fn build_links(config_id: &str, online_url: &str) -> Result<ReleaseLinks, ProjectError> {
    let info = parse_config_id(config_id);
    let publisher = if info.publisher.is_empty() {
        DEFAULT_PUBLISHER
    } else {
        info.publisher.as_str()
    };
    let hostname = format!("{}game", publisher);
    let host = format!("http://twww.{}.com/h5games/{}", hostname, hostname);

    let url = Url::parse(online_url)
        .map_err(|e| ProjectError::InvalidUrl(online_url.to_string(), e.to_string()))?;
    let project_dir = posix_dirname(url.path())
        .trim_start_matches('/')
        .to_string();

    let index = join_url(&[&host, &project_dir, "index.html"]);

    Ok(ReleaseLinks {
        official_advertising_link: format!("{}?env=pre", index),
        test_advertising_link: format!("{}?env=pre&ad_env=preview", index),
        package_prefix: format!(
            "{}-{}-",
            normalize_name(config_id),
            project_dir.to_lowercase()
        ),
        game_url: url.to_string(),
        project_dir,
    })
}

/// POSIX 语义的 dirname
fn posix_dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.starts_with('/') { "/" } else { "." };
    }
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(index) => trimmed[..index].trim_end_matches('/'),
        None => ".",
    }
}

/// 用 `/` 连接非空片段，不重复分隔符
fn join_url(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// 为更新日志补上标题；空内容保持为空
pub fn normalize_changelog(content: &str) -> String {
    let content = content.trim();
    if content.is_empty() || content.contains(CHANGELOG_TITLE) {
        content.to_string()
    } else {
        format!("{}:\n{}", CHANGELOG_TITLE, content)
    }
}

/// 渲染发布公告
pub fn render_result(
    config_id: &str,
    platform: &PlatformConfig,
    links: &ReleaseLinks,
    changelog: &str,
) -> String {
    let platform_label = format!("[{}]", config_id);
    let package = links.package_name(&platform.version_name);
    render_template(
        RESULT_TEMPLATE,
        &[
            ("project_name", platform.project_name.as_str()),
            ("platform", platform_label.as_str()),
            ("version", platform.version_name.as_str()),
            ("game_url", links.game_url.as_str()),
            (
                "official_advertising_link",
                links.official_advertising_link.as_str(),
            ),
            ("test_advertising_link", links.test_advertising_link.as_str()),
            ("package_download_address", package.as_str()),
            ("changelog", changelog),
        ],
    )
    .trim_end()
    .to_string()
}

pub struct ResultCommand {
    ctx: CommandContext,
}

impl ResultCommand {
    pub fn create(ctx: CommandContext) -> Box<dyn CommandBase> {
        Box::new(Self { ctx })
    }

    async fn changelog(&self, message: &Option<Option<String>>) -> AppResult<String> {
        let content = match message {
            None => return Ok(String::new()),
            Some(Some(text)) => text.clone(),
            Some(None) => open_editor_and_read(
                "请输入更新日志，以 # 开头的行会被忽略",
                "fast-changelog-",
            )
            .await
            .map_err(|e| AppError::IO("collecting the changelog".to_string(), e))?,
        };
        Ok(normalize_changelog(&content))
    }
}

#[async_trait]
impl CommandBase for ResultCommand {
    fn on_enable(&self) -> clap::Command {
        ResultArgs::augment_args(
            clap::Command::new("result").about("显示<configId>平台构建后发布结果"),
        )
    }

    async fn action(&self, matches: &ArgMatches) -> AppResult<()> {
        let args: ResultArgs = parse_args(matches)?;
        self.ctx.apply_log_level(args.log.log_level)?;
        let logger = self.ctx.logger()?;

        let cwd = std::env::current_dir()
            .map_err(|e| AppError::IO("reading the current directory".to_string(), e))?;
        let project_root = find_project_root(&cwd)?;
        logger.debug(format!("projectBase: {}", project_root.display()));

        let config = XyxConfig::load(&project_root)?;
        let platform = config.require_platform(&args.config_id)?;
        let online_url = platform
            .online_url
            .as_deref()
            .ok_or_else(|| ProjectError::MissingOnlineUrl(args.config_id.clone()))?;

        let links = build_links(&args.config_id, online_url)?;
        logger.debug(format!("links: {:?}", links));

        let changelog = self.changelog(&args.message).await?;
        let text = render_result(&args.config_id, platform, &links, &changelog);

        println!("{}", text);
        logger.info(&text);

        match copy_to_clipboard(&text).await {
            Ok(()) => logger.info("已复制到剪贴板"),
            Err(e) => logger.warn(format!("Failed to copy to clipboard: {}", e)),
        }
        Ok(())
    }
}
