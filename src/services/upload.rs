//! 上传服务
//!
//! 读取 `cloud.oss` 配置构建对象存储客户端，带指数退避重试地上传文件。
//! 配置缺失不会阻止服务启动，只在真正上传时报错。

use super::config::ConfigService;
use super::logger::LoggerService;
use super::{CONFIG, LOGGER};
use crate::clients::oss::strip_endpoint;
use crate::clients::{ObjectStorage, OssClient, OssOptions, PutObjectResult};
use crate::constants::{DEFAULT_UPLOAD_ATTEMPTS, UPLOAD_BACKOFF_BASE_MS};
use crate::errors::{StorageError, UploadError};
use crate::infrastructure::{Service, ServiceContext, ServiceHandle};
use crate::logging::OperationTimer;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 公网访问地址的推导依据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub secure: bool,
}

impl From<&OssOptions> for StorageTarget {
    fn from(options: &OssOptions) -> Self {
        Self {
            bucket: options.bucket.clone(),
            region: options.region.clone(),
            endpoint: options.endpoint.clone(),
            secure: options.secure,
        }
    }
}

struct UploadBackend {
    client: Arc<dyn ObjectStorage>,
    target: StorageTarget,
    max_attempts: u32,
    base_delay: Duration,
}

pub struct UploadService {
    logger: Arc<LoggerService>,
    backend: Result<UploadBackend, String>,
}

impl UploadService {
    pub fn construct(ctx: &ServiceContext) -> anyhow::Result<ServiceHandle> {
        let logger = ctx.require_service::<LoggerService>(LOGGER)?;
        let config = ctx.require_service::<ConfigService>(CONFIG)?;
        Ok(ServiceHandle::new(Self::from_config(logger, &config)))
    }

    /// 根据配置服务中的 `cloud.oss` 构建
    pub fn from_config(logger: Arc<LoggerService>, config: &ConfigService) -> Self {
        let backend = match Self::build_backend(config) {
            Ok(backend) => Ok(backend),
            Err(reason) => {
                logger.debug(format!("Uploads unavailable: {}", reason));
                Err(reason)
            }
        };
        Self { logger, backend }
    }

    fn build_backend(config: &ConfigService) -> Result<UploadBackend, String> {
        let cloud = config.cloud().map_err(|e| e.to_string())?;
        let oss = cloud
            .oss
            .ok_or_else(|| "cloud.oss is not set".to_string())?;

        let options = OssOptions::from_config(&oss).map_err(|e| e.to_string())?;
        let target = StorageTarget::from(&options);
        let client = OssClient::new(options).map_err(|e| e.to_string())?;

        Ok(UploadBackend {
            client: Arc::new(client),
            target,
            max_attempts: max_attempts(oss.upload_retries),
            base_delay: Duration::from_millis(UPLOAD_BACKOFF_BASE_MS),
        })
    }

    /// 使用任意对象存储实现构建
    pub fn with_client(
        logger: Arc<LoggerService>,
        client: Arc<dyn ObjectStorage>,
        target: StorageTarget,
        upload_retries: Option<f64>,
    ) -> Self {
        Self {
            logger,
            backend: Ok(UploadBackend {
                client,
                target,
                max_attempts: max_attempts(upload_retries),
                base_delay: Duration::from_millis(UPLOAD_BACKOFF_BASE_MS),
            }),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_ok()
    }

    /// 上传文件，返回公网访问地址
    ///
    /// 对象名为 `dest`，未指定时使用文件名。
    pub async fn upload_file(
        &self,
        file: &Path,
        dest: Option<&str>,
    ) -> Result<String, UploadError> {
        let backend = self
            .backend
            .as_ref()
            .map_err(|reason| UploadError::NotConfigured(reason.clone()))?;

        let display = file.display().to_string();
        let metadata = tokio::fs::metadata(file)
            .await
            .map_err(|e| UploadError::FileNotFound(display.clone(), e))?;
        if !metadata.is_file() {
            return Err(UploadError::NotAFile(display));
        }

        let object_name = object_name(file, dest)
            .ok_or_else(|| UploadError::NotAFile(display.clone()))?;

        let timer = OperationTimer::new("upload")
            .with_metadata("file", &display)
            .with_metadata("object", &object_name);

        let mut last_error: Option<StorageError> = None;
        for attempt in 1..=backend.max_attempts {
            self.logger.debug(format!(
                "Uploading \"{}\" as \"{}\" (attempt {}/{})",
                display, object_name, attempt, backend.max_attempts
            ));

            match backend.client.put(&object_name, file).await {
                Ok(result) => {
                    timer.finish();
                    let url = derive_public_url(&backend.target, &result, &object_name);
                    self.logger.info(format!("Upload succeeded: {}", url));
                    return Ok(url);
                }
                Err(e) => {
                    self.logger
                        .debug(format!("Upload attempt {} failed: {}", attempt, e));
                    last_error = Some(e);

                    if attempt < backend.max_attempts {
                        let delay = backoff_delay(backend.base_delay, attempt);
                        self.logger
                            .debug(format!("Retrying in {}ms...", delay.as_millis()));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(UploadError::Exhausted {
            file: display,
            attempts: backend.max_attempts,
            source: last_error
                .unwrap_or_else(|| StorageError::Other("no upload attempt was made".to_string())),
        })
    }
}

impl Service for UploadService {}

/// 对象名：去掉 `dest` 开头的 `/`，为空时使用文件名
fn object_name(file: &Path, dest: Option<&str>) -> Option<String> {
    match dest.map(|dest| dest.trim_start_matches('/')) {
        Some(dest) if !dest.is_empty() => Some(dest.to_string()),
        _ => file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
    }
}

/// 尝试次数：`max(1, floor(retries))`，未配置时为默认值
fn max_attempts(upload_retries: Option<f64>) -> u32 {
    match upload_retries {
        Some(retries) if retries.is_finite() => {
            retries.floor().max(1.0).min(u32::MAX as f64) as u32
        }
        _ => DEFAULT_UPLOAD_ATTEMPTS,
    }
}

/// 第 `attempt` 次失败后的等待时长：`base * 2^(attempt-1)`
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// 推导公网访问地址
///
/// 优先使用存储返回的地址；否则使用自定义域名；最后退回到 bucket 默认域名。
pub fn derive_public_url(
    target: &StorageTarget,
    result: &PutObjectResult,
    object_name: &str,
) -> String {
    if let Some(url) = result.url.as_deref().filter(|url| !url.is_empty()) {
        return url.to_string();
    }

    let proto = if target.secure { "https" } else { "http" };
    match target.endpoint.as_deref().map(strip_endpoint) {
        Some(host) if !host.is_empty() => format!("{}://{}/{}", proto, host, object_name),
        _ => format!(
            "{}://{}.{}.aliyuncs.com/{}",
            proto, target.bucket, target.region, object_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;
    use tokio::time::Instant;

    /// 总是失败并记录调用时刻
    #[derive(Default)]
    struct FailingStorage {
        calls: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl ObjectStorage for FailingStorage {
        async fn put(
            &self,
            _object_name: &str,
            _file: &Path,
        ) -> Result<PutObjectResult, StorageError> {
            self.calls.lock().push(Instant::now());
            Err(StorageError::Status {
                status: 503,
                message: "Service Unavailable".to_string(),
            })
        }
    }

    /// 前 `failures` 次失败，之后成功且不返回地址
    struct FlakyStorage {
        failures: usize,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStorage for FlakyStorage {
        async fn put(
            &self,
            object_name: &str,
            _file: &Path,
        ) -> Result<PutObjectResult, StorageError> {
            let mut calls = self.calls.lock();
            calls.push(object_name.to_string());
            if calls.len() <= self.failures {
                return Err(StorageError::Other("connection reset".to_string()));
            }
            Ok(PutObjectResult {
                name: object_name.to_string(),
                url: None,
            })
        }
    }

    fn target(endpoint: Option<&str>) -> StorageTarget {
        StorageTarget {
            bucket: "games".to_string(),
            region: "oss-cn-hangzhou".to_string(),
            endpoint: endpoint.map(str::to_string),
            secure: endpoint.is_some(),
        }
    }

    fn archive(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("game.zip");
        std::fs::write(&path, b"PK").unwrap();
        path
    }

    fn logger() -> Arc<LoggerService> {
        Arc::new(LoggerService::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_with_exponential_backoff() {
        let dir = TempDir::new().unwrap();
        let file = archive(&dir);
        let storage = Arc::new(FailingStorage::default());
        let service = UploadService::with_client(logger(), storage.clone(), target(None), None);

        let err = service.upload_file(&file, None).await.unwrap_err();

        let calls = storage.calls.lock().clone();
        assert_eq!(calls.len(), 3);
        let first_gap = calls[1] - calls[0];
        let second_gap = calls[2] - calls[1];
        assert!(first_gap >= Duration::from_millis(500) && first_gap < Duration::from_millis(510));
        assert!(
            second_gap >= Duration::from_millis(1000) && second_gap < Duration::from_millis(1010)
        );

        let message = err.to_string();
        assert!(matches!(err, UploadError::Exhausted { attempts: 3, .. }));
        assert!(message.contains("game.zip"));
        assert!(message.contains("after 3 attempts"));
        assert!(message.contains("Service Unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let dir = TempDir::new().unwrap();
        let file = archive(&dir);
        let storage = Arc::new(FlakyStorage {
            failures: 1,
            calls: Mutex::new(Vec::new()),
        });
        let service = UploadService::with_client(
            logger(),
            storage.clone(),
            target(Some("cdn.example.com")),
            None,
        );

        let url = service.upload_file(&file, Some("release/foo.zip")).await.unwrap();

        assert_eq!(url, "https://cdn.example.com/release/foo.zip");
        assert_eq!(storage.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_when_retries_below_one() {
        let dir = TempDir::new().unwrap();
        let file = archive(&dir);
        let storage = Arc::new(FailingStorage::default());
        let service =
            UploadService::with_client(logger(), storage.clone(), target(None), Some(0.0));

        let err = service.upload_file(&file, None).await.unwrap_err();
        assert!(matches!(err, UploadError::Exhausted { attempts: 1, .. }));
        assert_eq!(storage.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_missing_and_non_regular_files() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(FailingStorage::default());
        let service = UploadService::with_client(logger(), storage.clone(), target(None), None);

        let missing = service
            .upload_file(&dir.path().join("missing.zip"), None)
            .await
            .unwrap_err();
        assert!(matches!(missing, UploadError::FileNotFound(_, _)));

        let not_file = service.upload_file(dir.path(), None).await.unwrap_err();
        assert!(matches!(not_file, UploadError::NotAFile(_)));

        assert!(storage.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_service_reports_reason() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "cloud": {} }"#).unwrap();
        let config = ConfigService::open(&path, logger()).unwrap();

        let service = UploadService::from_config(logger(), &config);
        assert!(!service.is_available());

        let err = service.upload_file(&archive(&dir), None).await.unwrap_err();
        assert!(matches!(err, UploadError::NotConfigured(_)));
    }

    #[test]
    fn test_public_url_from_endpoint() {
        let result = PutObjectResult {
            name: "foo.zip".to_string(),
            url: None,
        };
        assert_eq!(
            derive_public_url(&target(Some("cdn.example.com")), &result, "foo.zip"),
            "https://cdn.example.com/foo.zip"
        );
        assert_eq!(
            derive_public_url(&target(Some("https://cdn.example.com/")), &result, "foo.zip"),
            "https://cdn.example.com/foo.zip"
        );
        assert_eq!(
            derive_public_url(&target(None), &result, "foo.zip"),
            "http://games.oss-cn-hangzhou.aliyuncs.com/foo.zip"
        );
    }

    #[test]
    fn test_public_url_prefers_reported_url() {
        let result = PutObjectResult {
            name: "foo.zip".to_string(),
            url: Some("https://games.oss-cn-hangzhou.aliyuncs.com/foo.zip".to_string()),
        };
        assert_eq!(
            derive_public_url(&target(Some("cdn.example.com")), &result, "foo.zip"),
            "https://games.oss-cn-hangzhou.aliyuncs.com/foo.zip"
        );
    }

    #[tokio::test]
    async fn test_leading_slash_in_dest_is_stripped() {
        let dir = TempDir::new().unwrap();
        let file = archive(&dir);
        let storage = Arc::new(FlakyStorage {
            failures: 0,
            calls: Mutex::new(Vec::new()),
        });
        let service = UploadService::with_client(
            logger(),
            storage.clone(),
            target(Some("cdn.example.com")),
            None,
        );

        let url = service.upload_file(&file, Some("/release/foo.zip")).await.unwrap();
        assert_eq!(url, "https://cdn.example.com/release/foo.zip");

        service.upload_file(&file, Some("///")).await.unwrap();
        assert_eq!(
            storage.calls.lock().clone(),
            vec!["release/foo.zip", "game.zip"]
        );
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(max_attempts(None), 3);
        assert_eq!(max_attempts(Some(5.7)), 5);
        assert_eq!(max_attempts(Some(-2.0)), 1);
        assert_eq!(backoff_delay(Duration::from_millis(500), 3), Duration::from_millis(2000));
    }
}
