//! # Easing 模块
//!
//! 缓动函数表，用于标记位置过渡的时间插值。
//!
//! 缓动类型是一个封闭枚举。宿主层以名称或数值编码传入时，
//! 未知的类型在调用入口处被拒绝，不会静默降级为线性。

use std::f32::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 未知缓动类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EasingParseError {
    /// 未知名称
    #[error("未知缓动函数名称 '{0}'")]
    UnknownName(String),

    /// 未知编码
    #[error("未知缓动函数编码 {0}")]
    UnknownCode(u32),
}

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EasingFunction {
    /// 线性（匀速）
    #[default]
    Linear,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    #[serde(alias = "quad")]
    EaseInOutQuad,
    /// 三次缓入
    EaseInCubic,
    /// 三次缓出
    EaseOutCubic,
    /// 三次缓入缓出
    #[serde(alias = "cubic")]
    EaseInOutCubic,
    /// 五次缓入
    EaseInQuint,
    /// 五次缓出
    EaseOutQuint,
    /// 五次缓入缓出
    #[serde(alias = "quint")]
    EaseInOutQuint,
    /// 正弦缓入
    EaseInSine,
    /// 正弦缓出
    EaseOutSine,
    /// 正弦缓入缓出
    #[serde(alias = "sine")]
    EaseInOutSine,
    /// 弹性缓出
    #[serde(alias = "elastic")]
    EaseOutElastic,
    /// 弹跳缓出
    #[serde(alias = "bounce")]
    EaseOutBounce,
}

impl EasingFunction {
    /// 全部缓动类型，按编码顺序排列
    pub const ALL: [EasingFunction; 15] = [
        EasingFunction::Linear,
        EasingFunction::EaseInOutCubic,
        EasingFunction::EaseInOutQuint,
        EasingFunction::EaseInOutSine,
        EasingFunction::EaseInQuad,
        EasingFunction::EaseOutQuad,
        EasingFunction::EaseInOutQuad,
        EasingFunction::EaseInCubic,
        EasingFunction::EaseOutCubic,
        EasingFunction::EaseInQuint,
        EasingFunction::EaseOutQuint,
        EasingFunction::EaseInSine,
        EasingFunction::EaseOutSine,
        EasingFunction::EaseOutElastic,
        EasingFunction::EaseOutBounce,
    ];

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值（弹性曲线中段可能略超出 1.0）
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::EaseInCubic => t * t * t,
            EasingFunction::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EasingFunction::EaseInQuint => t.powi(5),
            EasingFunction::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
            EasingFunction::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            EasingFunction::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            EasingFunction::EaseOutSine => (t * PI / 2.0).sin(),
            EasingFunction::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            EasingFunction::EaseOutElastic => ease_out_elastic(t),
            EasingFunction::EaseOutBounce => ease_out_bounce(t),
        }
    }

    /// 数值编码（绑定层使用）
    ///
    /// 前四个编码 `0 linear, 1 cubic, 2 quint, 3 sine` 与地图 SDK 的缓动枚举一致。
    pub fn code(&self) -> u32 {
        Self::ALL
            .iter()
            .position(|e| e == self)
            .map(|i| i as u32)
            .unwrap_or_default()
    }

    /// 从数值编码解析
    pub fn from_code(code: u32) -> Result<Self, EasingParseError> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(EasingParseError::UnknownCode(code))
    }

    /// 规范名称
    pub fn name(&self) -> &'static str {
        match self {
            EasingFunction::Linear => "linear",
            EasingFunction::EaseInQuad => "ease-in-quad",
            EasingFunction::EaseOutQuad => "ease-out-quad",
            EasingFunction::EaseInOutQuad => "ease-in-out-quad",
            EasingFunction::EaseInCubic => "ease-in-cubic",
            EasingFunction::EaseOutCubic => "ease-out-cubic",
            EasingFunction::EaseInOutCubic => "ease-in-out-cubic",
            EasingFunction::EaseInQuint => "ease-in-quint",
            EasingFunction::EaseOutQuint => "ease-out-quint",
            EasingFunction::EaseInOutQuint => "ease-in-out-quint",
            EasingFunction::EaseInSine => "ease-in-sine",
            EasingFunction::EaseOutSine => "ease-out-sine",
            EasingFunction::EaseInOutSine => "ease-in-out-sine",
            EasingFunction::EaseOutElastic => "ease-out-elastic",
            EasingFunction::EaseOutBounce => "ease-out-bounce",
        }
    }
}

impl FromStr for EasingFunction {
    type Err = EasingParseError;

    /// 解析名称，接受规范名称和短别名（`cubic`、`quint`、`sine`、`bounce` 等），不区分大小写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let alias = match lower.as_str() {
            "quad" => Some(EasingFunction::EaseInOutQuad),
            "cubic" => Some(EasingFunction::EaseInOutCubic),
            "quint" => Some(EasingFunction::EaseInOutQuint),
            "sine" => Some(EasingFunction::EaseInOutSine),
            "elastic" => Some(EasingFunction::EaseOutElastic),
            "bounce" => Some(EasingFunction::EaseOutBounce),
            _ => None,
        };
        if let Some(easing) = alias {
            return Ok(easing);
        }

        Self::ALL
            .iter()
            .copied()
            .find(|e| e.name() == lower)
            .ok_or(EasingParseError::UnknownName(s.to_string()))
    }
}

impl std::fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 弹性缓出
fn ease_out_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

/// 弹跳缓出
fn ease_out_bounce(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}
