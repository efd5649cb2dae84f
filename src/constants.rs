//! 全局常量

/// 命令名称
pub const APP_NAME: &str = "fast";

/// 覆盖用户数据目录（默认 `~/.fast`）
pub const APP_HOME_ENV: &str = "FAST_HOME";
pub const APP_HOME_DIR: &str = ".fast";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const CONFIG_BACKUP_SUFFIX: &str = ".bak";

/// 配置写盘的防抖窗口
pub const CONFIG_DEBOUNCE_DELAY_MS: u64 = 100;

pub const LOG_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// 项目相关
pub const PROJECT_CONFIG_FILE: &str = "xyx.config.json";
pub const XYX_HOME_DIR: &str = ".xyx-cli";
pub const XYX_HOME_ENV: &str = "XYX_CLI_HOME";
pub const TEMPLATE_DIR: &str = "template";
pub const TEMPLATE_DATA_FILE: &str = "data.json";
pub const TEMPLATE_DIR_PREFIX: &str = "xyx-template-";
pub const DEFAULT_PUBLISHER: &str = "hnyige";

// 上传
pub const DEFAULT_UPLOAD_ATTEMPTS: u32 = 3;
pub const UPLOAD_BACKOFF_BASE_MS: u64 = 500;
pub const UPLOAD_REQUEST_TIMEOUT_SECS: u64 = 300;
