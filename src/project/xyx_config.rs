//! 项目配置 `xyx.config.json`

use super::read_json;
use crate::constants::PROJECT_CONFIG_FILE;
use crate::errors::ProjectError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// 单个平台的构建配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub project_id: String,
    pub project_name: String,
    pub version_name: String,
    /// 字符串或数字
    pub version_code: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_platform_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 项目配置：`common` 节点加上以配置 ID 为键的平台节点
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XyxConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<Value>,
    #[serde(flatten)]
    pub platforms: BTreeMap<String, PlatformConfig>,
}

impl XyxConfig {
    /// 读取项目根目录下的 `xyx.config.json`
    pub fn load(project_root: &Path) -> Result<Self, ProjectError> {
        read_json(&project_root.join(PROJECT_CONFIG_FILE))
    }

    pub fn platform(&self, config_id: &str) -> Option<&PlatformConfig> {
        self.platforms.get(config_id)
    }

    /// 查找平台配置，不存在时报错
    pub fn require_platform(&self, config_id: &str) -> Result<&PlatformConfig, ProjectError> {
        self.platform(config_id)
            .ok_or_else(|| ProjectError::PlatformNotFound(config_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "common": { "project_name": "Tower", "framework": "laya" },
        "tt@xlb#xiaomi": {
            "project_id": "tower-tt",
            "project_name": "塔防",
            "version_name": "1.0.2",
            "version_code": 102,
            "online_url": "https://cdn.example.com/games/Tower_TT/index.html",
            "resource_map": [["src/res", "res"]]
        },
        "web": {
            "project_id": "tower-web",
            "project_name": "Tower",
            "version_name": "2.0.0",
            "version_code": "200"
        }
    }"#;

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), SAMPLE).unwrap();

        let config = XyxConfig::load(dir.path()).unwrap();

        assert_eq!(
            config.platforms.keys().collect::<Vec<_>>(),
            vec!["tt@xlb#xiaomi", "web"]
        );
        assert!(config.common.is_some());

        let tt = config.require_platform("tt@xlb#xiaomi").unwrap();
        assert_eq!(tt.version_code, Value::from(102));
        assert_eq!(tt.extra.get("resource_map").map(Value::is_array), Some(true));

        let web = config.platform("web").unwrap();
        assert_eq!(web.version_code, Value::from("200"));
        assert_eq!(web.online_url, None);
    }

    #[test]
    fn test_missing_platform() {
        let config = XyxConfig::default();
        let err = config.require_platform("vivo").unwrap_err();
        assert_eq!(err.to_string(), "configId vivo not found");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            XyxConfig::load(dir.path()),
            Err(ProjectError::JsonRead(_, _))
        ));
    }
}
