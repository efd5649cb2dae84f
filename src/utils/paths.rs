//! 路径解析
//!
//! 统一用户数据目录与模板缓存目录，支持环境变量覆盖：
//! - `FAST_HOME`：用户数据目录（默认 `~/.fast`）
//! - `XYX_CLI_HOME`：模板缓存根目录（默认 `~/.xyx-cli`）

use crate::constants::{
    APP_HOME_DIR, APP_HOME_ENV, CONFIG_FILE_NAME, TEMPLATE_DATA_FILE, TEMPLATE_DIR, XYX_HOME_DIR,
    XYX_HOME_ENV,
};
use std::env;
use std::path::PathBuf;

/// 展开用户目录 `~` 与环境变量
///
/// 展开失败（例如引用了未定义的变量）时原样返回。
pub fn expand_user(input: &str) -> PathBuf {
    match shellexpand::full(input) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(input).as_ref()),
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// 按「环境变量覆盖 → 家目录下默认子目录」解析目录
fn resolve_dir(override_value: Option<String>, default_name: &str) -> PathBuf {
    match override_value {
        Some(path) if !path.trim().is_empty() => expand_user(path.trim()),
        _ => home_dir().join(default_name),
    }
}

/// 用户数据目录
pub fn app_dir() -> PathBuf {
    resolve_dir(env::var(APP_HOME_ENV).ok(), APP_HOME_DIR)
}

/// 用户配置文件路径
pub fn config_file() -> PathBuf {
    app_dir().join(CONFIG_FILE_NAME)
}

/// 模板缓存根目录
pub fn xyx_home() -> PathBuf {
    resolve_dir(env::var(XYX_HOME_ENV).ok(), XYX_HOME_DIR)
}

/// 模板缓存元数据文件
pub fn template_data_file() -> PathBuf {
    xyx_home().join(TEMPLATE_DIR).join(TEMPLATE_DATA_FILE)
}
