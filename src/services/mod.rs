//! 内置服务
//!
//! [`service_definitions`] 给出内核启动时定义的服务表。表中顺序即定义顺序，
//! 销毁时按逆序进行。

pub mod config;
pub mod logger;
pub mod upload;

pub use config::{CloudConfig, ConfigService, OssCloudConfig};
pub use logger::LoggerService;
pub use upload::UploadService;

use crate::infrastructure::{constructor, ServiceDefinition};

pub const LOGGER: &str = "logger";
pub const CONFIG: &str = "config";
pub const UPLOAD: &str = "upload";

/// 内置服务表
pub fn service_definitions() -> Vec<ServiceDefinition> {
    vec![
        ServiceDefinition::new(LOGGER, constructor(LoggerService::construct)),
        ServiceDefinition::new(CONFIG, constructor(ConfigService::construct)),
        ServiceDefinition::new(UPLOAD, constructor(UploadService::construct)),
    ]
}
