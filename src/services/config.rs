//! 配置服务
//!
//! 用户级 JSON 配置（默认 `~/.fast/config.json`）。修改后在防抖窗口结束时写盘，
//! 窗口内的多次修改只产生一次写入；`flush` 立即写盘。

use super::logger::LoggerService;
use super::LOGGER;
use crate::constants::{CONFIG_BACKUP_SUFFIX, CONFIG_DEBOUNCE_DELAY_MS};
use crate::errors::ConfigError;
use crate::infrastructure::{Service, ServiceContext, ServiceHandle};
use crate::utils::{fs as fs_utils, paths};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// 云服务配置（`cloud` 节点）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oss: Option<OssCloudConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 阿里云 OSS 配置（`cloud.oss` 节点）
///
/// 字段按宽松规则读取：凭据接受字符串或数字，`uploadRetries` 只接受数字，
/// 类型不符的字段视为未设置。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OssCloudConfig {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key_secret: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub bucket: Option<String>,
    /// 自定义域名（CNAME）
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub domain: Option<String>,
    #[serde(
        default,
        deserialize_with = "number_only",
        skip_serializing_if = "Option::is_none"
    )]
    pub upload_retries: Option<f64>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => Some(value),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}

fn number_only<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(value)) => value.as_f64(),
        _ => None,
    })
}

fn default_document() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("cloud".to_string(), Value::Object(Map::new()));
    map
}

#[derive(Debug, Default)]
struct ConfigState {
    data: Map<String, Value>,
    dirty: bool,
    writes: usize,
}

pub struct ConfigService {
    path: PathBuf,
    logger: Arc<LoggerService>,
    state: Arc<Mutex<ConfigState>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    debounce: Duration,
}

impl ConfigService {
    pub fn construct(ctx: &ServiceContext) -> anyhow::Result<ServiceHandle> {
        let logger = ctx.require_service::<LoggerService>(LOGGER)?;
        let service = Self::open(paths::config_file(), logger)?;
        Ok(ServiceHandle::new(service))
    }

    /// 打开配置文件，使用默认防抖窗口
    pub fn open(path: impl Into<PathBuf>, logger: Arc<LoggerService>) -> Result<Self, ConfigError> {
        Self::with_debounce(path, logger, Duration::from_millis(CONFIG_DEBOUNCE_DELAY_MS))
    }

    pub fn with_debounce(
        path: impl Into<PathBuf>,
        logger: Arc<LoggerService>,
        debounce: Duration,
    ) -> Result<Self, ConfigError> {
        let service = Self {
            path: path.into(),
            logger,
            state: Arc::new(Mutex::new(ConfigState::default())),
            pending: Mutex::new(None),
            debounce,
        };
        service.load()?;
        Ok(service)
    }

    /// 从磁盘加载配置
    ///
    /// 文件缺失时使用默认配置；文件损坏时备份为 `config.json.bak` 后使用默认配置。
    /// 两种情况都会安排一次写盘。
    pub fn load(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs_utils::ensure_dir(parent)
                .map_err(|e| ConfigError::FileWrite(parent.display().to_string(), e))?;
        }

        let (mut data, mut needs_save) = match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => (map, false),
                _ => {
                    self.logger.error("Config file corrupted, creating backup...");
                    self.backup_corrupt_file();
                    (default_document(), true)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => (default_document(), true),
            Err(e) => return Err(ConfigError::FileRead(self.path.display().to_string(), e)),
        };

        if !data.contains_key("cloud") {
            data.insert("cloud".to_string(), Value::Object(Map::new()));
            needs_save = true;
        }

        self.state.lock().data = data;
        if needs_save {
            self.request_save();
        }
        Ok(())
    }

    fn backup_corrupt_file(&self) {
        let backup = backup_path(&self.path);
        match fs::copy(&self.path, &backup) {
            Ok(_) => self
                .logger
                .warn(format!("Corrupted config backed up to {}", backup.display())),
            Err(e) => self
                .logger
                .warn(format!("Failed to back up corrupted config: {}", e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 整个配置文档
    pub fn snapshot(&self) -> Value {
        Value::Object(self.state.lock().data.clone())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().data.get(key).cloned()
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| ConfigError::InvalidValue(key.to_string(), e))
            })
            .transpose()
    }

    pub fn has(&self, key: &str) -> bool {
        self.state.lock().data.contains_key(key)
    }

    pub fn set(&self, key: &str, value: Value) {
        self.mutate(|data| {
            data.insert(key.to_string(), value);
        });
    }

    pub fn delete(&self, key: &str) -> Option<Value> {
        let mut removed = None;
        self.mutate(|data| removed = data.remove(key));
        removed
    }

    /// 按点分路径读取，例如 `cloud.oss.bucket`
    pub fn get_path(&self, path: &str) -> Result<Option<Value>, ConfigError> {
        let segments = split_path(path)?;
        let state = self.state.lock();
        let mut current = state.data.get(segments[0]);
        for segment in &segments[1..] {
            current = current.and_then(|value| value.get(*segment));
        }
        Ok(current.cloned())
    }

    /// 按点分路径写入，自动创建中间对象
    pub fn set_path(&self, path: &str, value: Value) -> Result<(), ConfigError> {
        let segments = split_path(path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| ConfigError::InvalidPath(path.to_string()))?;

        let mut result = Ok(());
        self.mutate(|data| {
            let mut current = data;
            for segment in parents {
                let entry = current
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                match entry {
                    Value::Object(map) => current = map,
                    _ => {
                        result = Err(ConfigError::InvalidPath(path.to_string()));
                        return;
                    }
                }
            }
            current.insert(last.to_string(), value);
        });
        result
    }

    /// 按点分路径删除，返回被删除的值
    pub fn delete_path(&self, path: &str) -> Result<Option<Value>, ConfigError> {
        let segments = split_path(path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| ConfigError::InvalidPath(path.to_string()))?;

        let mut removed = None;
        {
            let mut state = self.state.lock();
            let mut current = Some(&mut state.data);
            for segment in parents {
                current = current
                    .and_then(|map| map.get_mut(*segment))
                    .and_then(Value::as_object_mut);
            }
            if let Some(map) = current {
                removed = map.remove(*last);
            }
        }

        if removed.is_some() {
            self.state.lock().dirty = true;
            self.request_save();
        }
        Ok(removed)
    }

    /// `cloud` 节点的类型化视图
    pub fn cloud(&self) -> Result<CloudConfig, ConfigError> {
        Ok(self.get_as::<CloudConfig>("cloud")?.unwrap_or_default())
    }

    fn mutate(&self, f: impl FnOnce(&mut Map<String, Value>)) {
        {
            let mut state = self.state.lock();
            f(&mut state.data);
            state.dirty = true;
        }
        self.request_save();
    }

    /// 安排一次防抖写盘；不在异步运行时中时立即写盘
    fn request_save(&self) {
        let mut pending = self.pending.lock();
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let state = self.state.clone();
                let path = self.path.clone();
                let debounce = self.debounce;
                *pending = Some(runtime.spawn(async move {
                    tokio::time::sleep(debounce).await;
                    if let Err(e) = persist(&path, &state) {
                        log::error!("{}", e);
                    }
                }));
            }
            Err(_) => {
                if let Err(e) = persist(&self.path, &self.state) {
                    self.logger.error(e);
                }
            }
        }
    }

    /// 取消等待中的写盘并立即写入
    pub fn flush(&self) -> Result<(), ConfigError> {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
        self.save()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        persist(&self.path, &self.state)
    }

    /// 已执行的写盘次数
    pub fn save_count(&self) -> usize {
        self.state.lock().writes
    }
}

fn split_path(path: &str) -> Result<Vec<&str>, ConfigError> {
    let segments: Vec<&str> = path.split('.').collect();
    if path.is_empty() || segments.iter().any(|segment| segment.is_empty()) {
        return Err(ConfigError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(CONFIG_BACKUP_SUFFIX);
    path.with_file_name(name)
}

fn persist(path: &Path, state: &Mutex<ConfigState>) -> Result<(), ConfigError> {
    let mut state = state.lock();
    fs_utils::write_json(path, &state.data)
        .map_err(|e| ConfigError::FileWrite(path.display().to_string(), e))?;
    state.dirty = false;
    state.writes += 1;
    log::trace!("配置已写入 {}", path.display());
    Ok(())
}

#[async_trait]
impl Service for ConfigService {
    async fn on_destroy(&self) -> anyhow::Result<()> {
        self.flush()?;
        Ok(())
    }
}

impl Drop for ConfigService {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
        if self.state.lock().dirty {
            if let Err(e) = self.save() {
                log::error!("{}", e);
            }
        }
    }
}
