//! 项目模型
//!
//! 项目根目录（包含 `xyx.config.json` 的目录）的定位、项目配置与模板缓存。

pub mod config_id;
pub mod template;
pub mod xyx_config;

pub use config_id::{parse_config_id, ConfigInfo, Platform};
pub use template::{resolve_template_dir, TemplateData};
pub use xyx_config::{PlatformConfig, XyxConfig};

use crate::constants::PROJECT_CONFIG_FILE;
use crate::errors::ProjectError;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// 从 `base` 开始向上查找第一个满足条件的目录
pub fn find_parent<F>(base: &Path, predicate: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    base.ancestors().find(|dir| predicate(*dir)).map(Path::to_path_buf)
}

/// 查找包含 `xyx.config.json` 的项目根目录
pub fn find_project_root(base: &Path) -> Result<PathBuf, ProjectError> {
    find_parent(base, |dir| dir.join(PROJECT_CONFIG_FILE).is_file()).ok_or_else(|| {
        ProjectError::ConfigNotFound {
            file: PROJECT_CONFIG_FILE.to_string(),
            base: base.display().to_string(),
        }
    })
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ProjectError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ProjectError::JsonRead(path.display().to_string(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| ProjectError::JsonParse(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_project_root_from_nested_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tower");
        let nested = root.join("platform").join("vivo").join("res");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(PROJECT_CONFIG_FILE), "{}").unwrap();

        assert_eq!(find_project_root(&nested).unwrap(), root);
        assert_eq!(find_project_root(&root).unwrap(), root);
    }

    #[test]
    fn test_find_project_root_missing() {
        let dir = TempDir::new().unwrap();
        let err = find_project_root(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("Could not find xyx.config.json in "));
    }

    #[test]
    fn test_find_parent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_parent(&nested, |path| path.ends_with("a"));
        assert_eq!(found, Some(dir.path().join("a")));
        assert_eq!(find_parent(&nested, |_| false), None);
    }
}
