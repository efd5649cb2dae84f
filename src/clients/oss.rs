//! 阿里云 OSS 客户端
//!
//! 只实现上传所需的单次签名 PUT 请求。

use crate::constants::UPLOAD_REQUEST_TIMEOUT_SECS;
use crate::errors::{ConfigError, StorageError};
use crate::services::config::OssCloudConfig;
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{header, Client, Url};
use sha1::Sha1;
use std::path::Path;
use std::time::Duration;

type HmacSha1 = Hmac<Sha1>;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// 上传结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectResult {
    /// 对象名称
    pub name: String,
    /// 服务端返回的访问地址
    pub url: Option<String>,
}

/// 对象存储接口
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, object_name: &str, file: &Path) -> Result<PutObjectResult, StorageError>;
}

/// OSS 连接参数
#[derive(Debug, Clone, PartialEq)]
pub struct OssOptions {
    pub region: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket: String,
    /// 自定义访问域名
    pub endpoint: Option<String>,
    pub cname: bool,
    pub secure: bool,
    pub timeout: Duration,
}

impl OssOptions {
    /// 从 `cloud.oss` 配置构建，缺少必填字段时报错
    pub fn from_config(config: &OssCloudConfig) -> Result<Self, ConfigError> {
        fn required(value: &Option<String>, field: &str) -> Result<String, ConfigError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ConfigError::FieldMissing(format!("cloud.oss.{}", field)))
        }

        let mut options = Self {
            region: required(&config.region, "region")?,
            access_key_id: required(&config.api_key, "apiKey")?,
            access_key_secret: required(&config.api_key_secret, "apiKeySecret")?,
            bucket: required(&config.bucket, "bucket")?,
            endpoint: None,
            cname: false,
            secure: false,
            timeout: Duration::from_secs(UPLOAD_REQUEST_TIMEOUT_SECS),
        };

        if let Some(domain) = config.domain.as_deref().filter(|d| !d.trim().is_empty()) {
            options.endpoint = Some(domain.trim().to_string());
            options.cname = true;
            options.secure = true;
        }

        Ok(options)
    }

    /// 请求使用的主机名
    pub fn host(&self) -> String {
        match (&self.endpoint, self.cname) {
            (Some(endpoint), true) => strip_endpoint(endpoint).to_string(),
            _ => format!("{}.{}.aliyuncs.com", self.bucket, self.region),
        }
    }
}

/// 去掉协议前缀与末尾的 `/`
pub fn strip_endpoint(endpoint: &str) -> &str {
    endpoint
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
}

#[derive(Debug)]
pub struct OssClient {
    options: OssOptions,
    client: Client,
}

impl OssClient {
    pub fn new(options: OssOptions) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self { options, client })
    }

    pub fn options(&self) -> &OssOptions {
        &self.options
    }

    /// 对象的请求地址，对象名按路径段编码
    pub fn object_url(&self, object_name: &str) -> Result<Url, StorageError> {
        let object_name = object_key(object_name);
        let mut url = Url::parse(&format!("https://{}/", self.options.host()))
            .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                StorageError::InvalidRequest(format!("cannot build URL for {}", object_name))
            })?
            .clear()
            .extend(object_name.split('/'));
        Ok(url)
    }

    fn authorization(
        &self,
        content_type: &str,
        date: &str,
        object_name: &str,
    ) -> Result<String, StorageError> {
        let resource = format!("/{}/{}", self.options.bucket, object_key(object_name));
        let signature = sign(
            &self.options.access_key_secret,
            "PUT",
            content_type,
            date,
            &resource,
        )?;
        Ok(format!("OSS {}:{}", self.options.access_key_id, signature))
    }
}

#[async_trait]
impl ObjectStorage for OssClient {
    async fn put(&self, object_name: &str, file: &Path) -> Result<PutObjectResult, StorageError> {
        let body = tokio::fs::read(file)
            .await
            .map_err(|e| StorageError::Read(file.display().to_string(), e))?;

        let url = self.object_url(object_name)?;
        let content_type = guess_content_type(object_name);
        let date = http_date(Utc::now());
        let authorization = self.authorization(content_type, &date, object_name)?;

        let response = self
            .client
            .put(url.clone())
            .header(header::DATE, &date)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::AUTHORIZATION, authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                message: summarize_error_body(&body),
            });
        }

        Ok(PutObjectResult {
            name: object_key(object_name).to_string(),
            url: Some(url.to_string()),
        })
    }
}

/// 请求路径与签名资源共用的对象名，不带开头的 `/`
fn object_key(object_name: &str) -> &str {
    object_name.trim_start_matches('/')
}

/// OSS 头部签名：`base64(hmac-sha1(secret, verb \n md5 \n type \n date \n resource))`
pub fn sign(
    secret: &str,
    verb: &str,
    content_type: &str,
    date: &str,
    resource: &str,
) -> Result<String, StorageError> {
    let string_to_sign = format!("{}\n\n{}\n{}\n{}", verb, content_type, date, resource);
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

pub fn http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// 根据扩展名推断 Content-Type
pub fn guess_content_type(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "zip" => "application/zip",
        "json" => "application/json",
        "js" => "application/javascript",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

fn xml_tag<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].trim())
}

/// 提取 OSS 错误响应中的 Code 与 Message
fn summarize_error_body(body: &str) -> String {
    match (xml_tag(body, "Code"), xml_tag(body, "Message")) {
        (Some(code), Some(message)) => format!("{} ({})", message, code),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) if body.trim().is_empty() => "empty response body".to_string(),
        (None, None) => body.trim().chars().take(200).collect(),
    }
}
