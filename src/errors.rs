use crate::infrastructure::container::ContainerError;
use thiserror::Error;

/// 应用统一结果类型
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
    #[error("Service container error: {0}")]
    Container(#[from] ContainerError),
    #[error("Command line error: {0}")]
    Cli(String),
    #[error("I/O error while {0}: {1}")]
    IO(String, #[source] std::io::Error), // For generic I/O errors not covered by specific types
    #[error("Application error: {0}")]
    Generic(String), // For simple string-based errors
}

impl AppError {
    pub fn cli(msg: impl Into<String>) -> Self {
        AppError::Cli(msg.into())
    }

    pub fn generic(msg: impl Into<String>) -> Self {
        AppError::Generic(msg.into())
    }

    /// 进程退出码；所有显式失败路径统一为 1
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to write to path '{0}': {1}")]
    FileWrite(String, #[source] std::io::Error),
    #[error("Failed to parse JSON from file '{0}': {1}")]
    JsonParse(String, #[source] serde_json::Error),
    #[error("Required configuration field '{0}' is missing or invalid")]
    FieldMissing(String),
    #[error("Invalid configuration path '{0}'")]
    InvalidPath(String),
    #[error("Configuration value at '{0}' has an unexpected shape: {1}")]
    InvalidValue(String, #[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Could not find {file} in {base} or any parent directory")]
    ConfigNotFound { file: String, base: String },
    #[error("Failed to read JSON file '{0}': {1}")]
    JsonRead(String, #[source] std::io::Error),
    #[error("Failed to parse JSON file '{0}': {1}")]
    JsonParse(String, #[source] serde_json::Error),
    #[error("configId {0} not found")]
    PlatformNotFound(String),
    #[error("Template data file not found: {0}")]
    TemplateDataMissing(String),
    #[error("Failed to read directory '{0}': {1}")]
    DirRead(String, #[source] std::io::Error),
    #[error("Failed to remove '{0}': {1}")]
    Remove(String, #[source] std::io::Error),
    #[error("configId {0} has no online_url")]
    MissingOnlineUrl(String),
    #[error("Invalid online_url '{0}': {1}")]
    InvalidUrl(String, String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No cloud.oss configuration found ({0})")]
    NotConfigured(String),
    #[error("File not found or inaccessible: {0}")]
    FileNotFound(String, #[source] std::io::Error),
    #[error("File is not a regular file: {0}")]
    NotAFile(String),
    #[error("Failed to upload \"{file}\" after {attempts} attempts: {source}")]
    Exhausted {
        file: String,
        attempts: u32,
        #[source]
        source: StorageError,
    },
}

/// 对象存储客户端错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to read upload source '{0}': {1}")]
    Read(String, #[source] std::io::Error),
    #[error("Object storage responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid storage request: {0}")]
    InvalidRequest(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<std::io::Error> for AppError {
    /// Converts a `std::io::Error` into an `AppError::IO` with a default context message.
    fn from(err: std::io::Error) -> Self {
        AppError::IO("I/O operation failed".to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error_display() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err_file_read = ConfigError::FileRead("config.json".to_string(), io_err);
        assert_eq!(
            format!("{}", err_file_read),
            "Failed to read file 'config.json': file not found"
        );

        let err_field_missing = ConfigError::FieldMissing("cloud.oss.bucket".to_string());
        assert_eq!(
            format!("{}", err_field_missing),
            "Required configuration field 'cloud.oss.bucket' is missing or invalid"
        );

        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err_parse = ConfigError::JsonParse("config.json".to_string(), json_err);
        assert!(format!("{}", err_parse)
            .starts_with("Failed to parse JSON from file 'config.json': "));
    }

    #[test]
    fn test_upload_error_display() {
        let err = UploadError::Exhausted {
            file: "dist/game.zip".to_string(),
            attempts: 3,
            source: StorageError::Status {
                status: 503,
                message: "SlowDown".to_string(),
            },
        };
        assert_eq!(
            format!("{}", err),
            "Failed to upload \"dist/game.zip\" after 3 attempts: Object storage responded with 503: SlowDown"
        );

        let err_not_file = UploadError::NotAFile("dist".to_string());
        assert_eq!(format!("{}", err_not_file), "File is not a regular file: dist");
    }

    #[test]
    fn test_app_error_display() {
        let app_config_err = AppError::from(ConfigError::FieldMissing("cloud.oss".to_string()));
        assert_eq!(
            format!("{}", app_config_err),
            "Configuration error: Required configuration field 'cloud.oss' is missing or invalid"
        );

        let app_project_err = AppError::from(ProjectError::PlatformNotFound("vivo".to_string()));
        assert_eq!(format!("{}", app_project_err), "Project error: configId vivo not found");

        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe broke");
        let app_io_err: AppError = io_err.into();
        assert_eq!(
            format!("{}", app_io_err),
            "I/O error while I/O operation failed: pipe broke"
        );

        let app_generic_err = AppError::generic("Something went wrong");
        assert_eq!(
            format!("{}", app_generic_err),
            "Application error: Something went wrong"
        );
        assert_eq!(app_generic_err.exit_code(), 1);
    }
}
