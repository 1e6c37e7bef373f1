// ==========================================
// 金属加工报价生产系统 - 配置管理器
// ==========================================
// 职责: 配置加载 (JSON 文件 / 环境变量指定路径 / 默认表)、校验、快照
// ==========================================

use crate::config::engine_config::EngineConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// 配置键 (环境变量)
pub mod config_keys {
    /// 配置文件路径
    pub const CONFIG_PATH_ENV: &str = "FAB_QUOTE_CONFIG";
    /// 用户配置目录下的子目录与文件名
    pub const CONFIG_DIR_NAME: &str = "fab-quote-engine";
    pub const CONFIG_FILE_NAME: &str = "config.json";
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 (path={path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置校验失败: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// 配置来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    DefaultTable,
    File(PathBuf),
    Inline,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: EngineConfig,
    source: ConfigSource,
}

impl ConfigManager {
    /// 加载配置
    ///
    /// 规则:
    /// 1) 设置了 FAB_QUOTE_CONFIG 时读取该 JSON 文件
    /// 2) 否则读取用户配置目录下的 fab-quote-engine/config.json (存在时)
    /// 3) 否则使用默认配置表
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(config_keys::CONFIG_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Self::from_file(trimmed);
            }
        }

        if let Some(path) = default_config_path().filter(|p| p.exists()) {
            return Self::from_file(path);
        }

        info!("未指定配置文件, 使用默认配置表");
        Ok(Self::default_table())
    }

    pub fn default_table() -> Self {
        Self {
            config: EngineConfig::default_table(),
            source: ConfigSource::DefaultTable,
        }
    }

    /// 从 JSON 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse_and_validate(&raw)?;
        info!(path = %path.display(), "配置文件加载成功");
        Ok(Self {
            config,
            source: ConfigSource::File(path.to_path_buf()),
        })
    }

    /// 从 JSON 字符串加载
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            config: Self::parse_and_validate(raw)?,
            source: ConfigSource::Inline,
        })
    }

    fn parse_and_validate(raw: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        let problems = config.validate();
        if !problems.is_empty() {
            warn!(problems = ?problems, "配置校验失败");
            return Err(ConfigError::Invalid(problems));
        }
        Ok(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// 获取配置快照 (JSON)
    ///
    /// # 用途
    /// - 随计算快照记录所用配置, 便于审计与回溯
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(&self.config)?)
    }
}

/// 用户配置目录下的默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join(config_keys::CONFIG_DIR_NAME)
            .join(config_keys::CONFIG_FILE_NAME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_snapshot_round_trips() {
        let manager = ConfigManager::default_table();
        let snapshot = manager.get_config_snapshot().unwrap();
        let restored = ConfigManager::from_json_str(&snapshot).unwrap();
        assert_eq!(restored.config(), manager.config());
        assert_eq!(restored.source(), &ConfigSource::Inline);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let raw = serde_json::to_string(&EngineConfig::default_table()).unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let manager = ConfigManager::from_file(file.path()).unwrap();
        assert!(matches!(manager.source(), ConfigSource::File(_)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default_table();
        config.cost.loss_pct = rust_decimal_macros::dec!(-1);
        let raw = serde_json::to_string(&config).unwrap();

        let err = ConfigManager::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref p) if p.len() == 1));
    }

    #[test]
    fn test_default_config_path_layout() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("fab-quote-engine/config.json"));
        }
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigManager::from_file("/nonexistent/fab-quote.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_nesting_section_is_optional() {
        let mut value = serde_json::to_value(EngineConfig::default_table()).unwrap();
        value.as_object_mut().unwrap().remove("nesting");
        let manager = ConfigManager::from_json_str(&value.to_string()).unwrap();
        assert_eq!(manager.config().nesting.kerf_mm, 2);
    }
}
