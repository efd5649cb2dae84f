//! 模板缓存
//!
//! `~/.xyx-cli/template/data.json` 记录当前缓存的模板版本，
//! 模板本身位于同目录的 `xyx-template-<cachedVersion>`。

use super::read_json;
use crate::constants::TEMPLATE_DIR_PREFIX;
use crate::errors::ProjectError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateData {
    pub cached_version: String,
    pub last_update: i64,
    pub latest_version: String,
    pub latest_version_check: i64,
}

impl TemplateData {
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        read_json(path)
    }
}

/// 根据元数据文件解析当前模板目录
pub fn resolve_template_dir(data_file: &Path) -> Result<PathBuf, ProjectError> {
    if !data_file.is_file() {
        return Err(ProjectError::TemplateDataMissing(
            data_file.display().to_string(),
        ));
    }

    let data = TemplateData::load(data_file)?;
    let base = data_file.parent().unwrap_or_else(|| Path::new("."));
    Ok(base.join(format!("{}{}", TEMPLATE_DIR_PREFIX, data.cached_version)))
}
