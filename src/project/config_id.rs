//! 平台配置 ID
//!
//! 形如 `platform[@channel[#publisher]]`，例如 `tt@xlb#xiaomi`。

use std::fmt;
use std::str::FromStr;

/// 已知平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Vivo,
    Oppo,
    Tt,
    Mz,
    Qq,
    Hw,
    Honor,
    Cordova,
    Xlb,
    Web,
    Game2345,
    Ks,
    Kwai,
    Mi,
    Wx,
    Jd,
    Gpt,
    Afg,
    Hippoo,
    Botim,
    Harmony,
}

impl Platform {
    pub const ALL: [Platform; 21] = [
        Platform::Vivo,
        Platform::Oppo,
        Platform::Tt,
        Platform::Mz,
        Platform::Qq,
        Platform::Hw,
        Platform::Honor,
        Platform::Cordova,
        Platform::Xlb,
        Platform::Web,
        Platform::Game2345,
        Platform::Ks,
        Platform::Kwai,
        Platform::Mi,
        Platform::Wx,
        Platform::Jd,
        Platform::Gpt,
        Platform::Afg,
        Platform::Hippoo,
        Platform::Botim,
        Platform::Harmony,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Vivo => "vivo",
            Platform::Oppo => "oppo",
            Platform::Tt => "tt",
            Platform::Mz => "mz",
            Platform::Qq => "qq",
            Platform::Hw => "hw",
            Platform::Honor => "honor",
            Platform::Cordova => "cordova",
            Platform::Xlb => "xlb",
            Platform::Web => "web",
            Platform::Game2345 => "2345",
            Platform::Ks => "ks",
            Platform::Kwai => "kwai",
            Platform::Mi => "mi",
            Platform::Wx => "wx",
            Platform::Jd => "jd",
            Platform::Gpt => "gpt",
            Platform::Afg => "afg",
            Platform::Hippoo => "hippoo",
            Platform::Botim => "botim",
            Platform::Harmony => "harmony",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .iter()
            .copied()
            .find(|platform| platform.as_str() == s)
            .ok_or_else(|| format!("unknown platform '{}'", s))
    }
}

/// 配置 ID 的组成部分；缺省部分为空字符串
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInfo {
    pub platform: String,
    pub channel: String,
    pub publisher: String,
}

impl ConfigInfo {
    /// 平台名对应的已知平台
    pub fn platform_kind(&self) -> Option<Platform> {
        self.platform.parse().ok()
    }
}

/// 解析配置 ID
///
/// 只有存在渠道时才解析发行商，`web#foo` 整体视为平台名。
pub fn parse_config_id(config_id: &str) -> ConfigInfo {
    let mut parts = config_id.split('@');
    let platform = parts.next().unwrap_or_default().to_string();
    let channel_part = parts.next().unwrap_or_default();

    let (channel, publisher) = if channel_part.is_empty() {
        (String::new(), String::new())
    } else {
        let mut split = channel_part.split('#');
        (
            split.next().unwrap_or_default().to_string(),
            split.next().unwrap_or_default().to_string(),
        )
    };

    ConfigInfo {
        platform,
        channel,
        publisher,
    }
}
