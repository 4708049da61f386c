//! # Config 模块
//!
//! 宿主配置，集中管理帧率、日志和图片来源。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (JSON)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use marker_runtime::{ConfigError, MarkerConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 回放帧率（每秒帧数）
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// 日志过滤规则（`MARKER_LOG` 环境变量优先）
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// 图片配置
    #[serde(default)]
    pub images: ImageConfig,

    /// 标记系统配置
    #[serde(default)]
    pub markers: MarkerConfig,
}

/// 图片配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// 场景中相对图片路径的根目录，缺省为场景文件所在目录
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// 不读取文件，所有图片使用占位位图
    #[serde(default)]
    pub placeholder: bool,
}

fn default_frame_rate() -> u32 {
    60
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            log_filter: default_log_filter(),
            images: ImageConfig::default(),
            markers: MarkerConfig::default(),
        }
    }
}

impl HostConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                info!(path = ?path, "配置文件加载成功");
                config
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "配置文件加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 读取并校验配置文件
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, json).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.frame_rate) {
            return Err(ConfigError::Validation(format!(
                "frame_rate 必须在 1 - 1000 之间，实际 {}",
                self.frame_rate
            )));
        }

        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Validation("log_filter 不能为空".to_string()));
        }

        self.markers.validate()
    }

    /// 单帧时间步长（秒）
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.log_filter, "info");
        assert!(!config.images.placeholder);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_defaults() {
        let config: HostConfig =
            serde_json::from_str(r#"{ "frame_rate": 4, "markers": { "max_markers": 3 } }"#)
                .unwrap();
        assert_eq!(config.frame_rate, 4);
        assert_eq!(config.frame_dt(), 0.25);
        assert_eq!(config.markers.max_markers, 3);
        assert_eq!(config.markers.max_frame_delta, None);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_config_validation() {
        let mut config = HostConfig {
            frame_rate: 0,
            ..HostConfig::default()
        };
        assert!(config.validate().is_err());

        config.frame_rate = 30;
        config.markers.max_markers = 0;
        assert!(config.validate().is_err());

        config.markers.max_markers = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.json");

        let mut config = HostConfig::default();
        config.frame_rate = 24;
        config.images.placeholder = true;
        config.save(&path).unwrap();

        assert_eq!(HostConfig::read(&path).unwrap(), config);
        assert_eq!(HostConfig::load(dir.path().join("missing.json")), HostConfig::default());
    }
}
