//! # Error 模块
//!
//! 定义标记系统的错误类型。
//!
//! 错误只在 `MarkerRegistry` 的 `Result` 接口中出现；
//! 面向宿主的 [`MarkerApi`](crate::MarkerApi) 把它们转换成 `bool` / 无效句柄并记录日志。

use thiserror::Error;

use crate::easing::EasingParseError;
use crate::geometry::{GeometryError, GeometryKind};
use crate::marker::MarkerId;
use crate::style::StyleError;

/// 标记操作错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkerError {
    /// 句柄无效（为 0、未分配或已删除）
    #[error("无效的标记句柄 {id}")]
    InvalidHandle { id: MarkerId },

    /// 几何数据不满足最少点数 / 环数
    #[error("无效的几何数据: {0}")]
    InvalidGeometry(#[from] GeometryError),

    /// 样式编译失败，旧样式保持不变
    #[error("样式编译失败: {0}")]
    StyleCompile(#[from] StyleError),

    /// 图片只能挂在点样式的标记上
    #[error("标记 {id} 不是点样式，无法设置图片")]
    IncompatibleStyleForImage { id: MarkerId },

    /// 缓动过渡只适用于点几何
    #[error("标记 {id} 当前几何为 {kind}，无法设置缓动点位置")]
    IncompatibleGeometry { id: MarkerId, kind: GeometryKind },

    /// 未知缓动类型
    #[error("无效的缓动类型: {0}")]
    InvalidEaseKind(#[from] EasingParseError),

    /// 句柄空间或容量耗尽
    #[error("标记数量已达上限 {capacity}")]
    Exhausted { capacity: usize },
}

/// Result 类型别名
pub type MarkerResult<T> = Result<T, MarkerError>;
