//! # Marker Runtime
//!
//! 地图标记子系统的核心运行时库。
//!
//! ## 架构概述
//!
//! `marker-runtime` 只管理标记状态，不依赖任何渲染引擎。
//! 绑定层通过句柄修改标记，渲染循环每帧推进过渡并读取绘制项：
//!
//! ```text
//! 绑定层                         Runtime                        渲染循环
//!   │                              │                               │
//!   │── add / set_* / remove ────►│                               │
//!   │◄─── MarkerId / bool ────────│                               │
//!   │                              │◄──────── update(dt) ─────────│
//!   │                              │──── Vec<MarkerEvent> ───────►│
//!   │                              │◄──────── drawables() ────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`MarkerRegistry`]：标记注册表，返回 [`MarkerResult`] 的底层接口
//! - [`MarkerApi`]：绑定层接口，失败时返回 `false` / [`MarkerId::INVALID`]
//! - [`SharedMarkers`]：跨线程共享的 [`MarkerApi`]
//! - [`FrameSnapshot`]：可序列化的整帧快照
//!
//! ## 使用示例
//!
//! ```ignore
//! use marker_runtime::{EasingFunction, LngLat, MarkerApi};
//!
//! let mut markers = MarkerApi::new();
//! let id = markers.add();
//! markers.set_styling(id, "{ style: points, color: white, size: 24px }");
//! markers.set_point(id, LngLat::new(-122.41, 37.77));
//! markers.set_point_eased(id, LngLat::new(-122.39, 37.79), 1.5, EasingFunction::EaseInOutCubic);
//!
//! // 渲染循环
//! while markers.needs_redraw() {
//!     markers.update(frame_dt);
//!     for item in markers.registry().drawables() {
//!         draw(item);
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`geometry`]：坐标与几何
//! - [`style`]：样式编译
//! - [`easing`]：缓动函数
//! - [`animation`]：位置过渡与事件
//! - [`driver`]：逐帧推进
//! - [`registry`]：标记注册表
//! - [`api`] / [`shared`]：面向绑定层的接口
//! - [`render`]：渲染端视图

pub mod animation;
pub mod api;
pub mod bitmap;
pub mod config;
pub mod driver;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod marker;
pub mod registry;
pub mod render;
pub mod shared;
pub mod style;

// 重导出核心类型
pub use animation::{MarkerEvent, PointTransition};
pub use api::MarkerApi;
pub use bitmap::ImageRef;
pub use config::{ConfigError, MarkerConfig};
pub use driver::AnimationDriver;
pub use easing::{EasingFunction, EasingParseError};
pub use error::{MarkerError, MarkerResult};
pub use geometry::{Geometry, GeometryError, GeometryKind, LngLat};
pub use marker::{Marker, MarkerId};
pub use registry::MarkerRegistry;
pub use render::{DrawItem, FrameSnapshot, MarkerSnapshot};
pub use shared::SharedMarkers;
pub use style::{FlowStyleCompiler, StyleCompiler, StyleDescriptor, StyleError, StyleKind};
