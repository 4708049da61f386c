//! # Config 模块
//!
//! 标记系统的运行配置。
//!
//! ## 配置优先级
//!
//! 1. 宿主显式传入（最高）
//! 2. 配置文件 (JSON)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::easing::EasingFunction;

/// 标记配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// 同时存在的标记数量上限
    ///
    /// 超出后 `add` 视为资源耗尽，返回无效句柄。
    #[serde(default = "default_max_markers")]
    pub max_markers: usize,

    /// 单帧最大时间步长（秒）
    ///
    /// 为 `None` 时不截断，过渡在累计帧时间达到时长后准时结束。
    #[serde(default)]
    pub max_frame_delta: Option<f32>,

    /// 缓动类型缺省值（宿主场景未指定时使用）
    #[serde(default)]
    pub default_easing: EasingFunction,
}

fn default_max_markers() -> usize {
    65_535
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            max_markers: default_max_markers(),
            max_frame_delta: None,
            default_easing: EasingFunction::default(),
        }
    }
}

impl MarkerConfig {
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
        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文本解析
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
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
        if self.max_markers == 0 {
            return Err(ConfigError::Validation(
                "max_markers 必须大于 0".to_string(),
            ));
        }

        if let Some(delta) = self.max_frame_delta
            && (!delta.is_finite() || delta <= 0.0)
        {
            return Err(ConfigError::Validation(format!(
                "max_frame_delta 必须为正数，实际 {delta}"
            )));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO 错误
    #[error("配置 IO 错误: {path:?} - {message}")]
    Io { path: PathBuf, message: String },

    /// 解析 / 序列化失败
    #[error("配置解析失败: {0}")]
    Parse(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    Validation(String),
}
