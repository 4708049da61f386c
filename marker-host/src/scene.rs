//! # Scene 模块
//!
//! 场景脚本：一串按顺序执行的标记操作，用 JSON 描述。
//!
//! ```json
//! {
//!   "name": "demo",
//!   "ops": [
//!     { "op": "add", "alias": "bus" },
//!     { "op": "styling", "marker": "bus", "styling": "{ style: points, size: 24px }" },
//!     { "op": "point", "marker": "bus", "coord": [-122.41, 37.77] },
//!     { "op": "point_eased", "marker": "bus", "coord": [-122.39, 37.79], "seconds": 1.0, "ease": "cubic" },
//!     { "op": "advance", "seconds": 1.0 }
//!   ]
//! }
//! ```
//!
//! 标记通过别名引用。未知别名解析为无效句柄，对应操作按失败处理，
//! 被删除的别名继续指向旧句柄，用于验证悬空句柄的行为。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use marker_runtime::{
    EasingFunction, FrameSnapshot, LngLat, MarkerApi, MarkerEvent, MarkerId, MarkerRegistry,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::images::ImageLoader;

/// 单个 `advance` 操作允许推进的最长时间（秒）
pub const MAX_ADVANCE_SECONDS: f32 = 3600.0;

/// 场景错误
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("无法读取场景 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("场景解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 场景操作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SceneOp {
    Add {
        alias: String,
    },
    Styling {
        marker: String,
        styling: String,
    },
    Point {
        marker: String,
        coord: LngLat,
    },
    PointEased {
        marker: String,
        coord: LngLat,
        seconds: f32,
        /// 缓动名称，缺省使用配置中的 `default_easing`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ease: Option<String>,
    },
    Polyline {
        marker: String,
        coords: Vec<LngLat>,
    },
    Polygon {
        marker: String,
        rings: Vec<Vec<LngLat>>,
    },
    Visible {
        marker: String,
        visible: bool,
    },
    Image {
        marker: String,
        path: String,
    },
    Remove {
        marker: String,
    },
    RemoveAll,
    /// 以固定帧长推进时间
    Advance {
        seconds: f32,
    },
}

impl SceneOp {
    /// 操作名（与 JSON 中的 `op` 一致）
    pub fn name(&self) -> &'static str {
        match self {
            SceneOp::Add { .. } => "add",
            SceneOp::Styling { .. } => "styling",
            SceneOp::Point { .. } => "point",
            SceneOp::PointEased { .. } => "point_eased",
            SceneOp::Polyline { .. } => "polyline",
            SceneOp::Polygon { .. } => "polygon",
            SceneOp::Visible { .. } => "visible",
            SceneOp::Image { .. } => "image",
            SceneOp::Remove { .. } => "remove",
            SceneOp::RemoveAll => "remove_all",
            SceneOp::Advance { .. } => "advance",
        }
    }
}

/// 场景
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub name: Option<String>,

    /// 预期失败的操作数量（用于校验故意包含错误调用的场景）
    #[serde(default)]
    pub expect_failures: usize,

    pub ops: Vec<SceneOp>,
}

impl Scene {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }
}

/// 失败的操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpFailure {
    /// 操作在场景中的序号
    pub index: usize,
    pub op: &'static str,
}

/// 回放结果
#[derive(Debug, Clone, Default)]
pub struct ReplayReport {
    /// 执行的操作数量
    pub ops: usize,
    /// 失败的操作
    pub failures: Vec<OpFailure>,
    /// 推进的帧数
    pub frames: u64,
    /// 回放过程中产生的全部事件
    pub events: Vec<MarkerEvent>,
}

impl ReplayReport {
    /// 失败数量是否与场景声明的一致
    pub fn matches(&self, scene: &Scene) -> bool {
        self.failures.len() == scene.expect_failures
    }
}

/// 场景回放器
#[derive(Debug)]
pub struct Replayer {
    api: MarkerApi,
    images: ImageLoader,
    aliases: HashMap<String, MarkerId>,
    frame_dt: f32,
    default_easing: EasingFunction,
}

impl Replayer {
    pub fn new(config: &HostConfig, images: ImageLoader) -> Self {
        Self {
            api: MarkerApi::with_config(&config.markers),
            images,
            aliases: HashMap::new(),
            frame_dt: config.frame_dt(),
            default_easing: config.markers.default_easing,
        }
    }

    /// 回放整个场景
    ///
    /// 每推进一帧调用一次 `on_frame`。
    pub fn run(&mut self, scene: &Scene, mut on_frame: impl FnMut(&FrameSnapshot)) -> ReplayReport {
        let mut report = ReplayReport::default();
        info!(
            scene = scene.name.as_deref().unwrap_or("<unnamed>"),
            ops = scene.ops.len(),
            "开始回放场景"
        );

        for (index, op) in scene.ops.iter().enumerate() {
            report.ops += 1;
            let ok = match op {
                SceneOp::Advance { seconds } => match self.ticks_for(*seconds) {
                    Some(ticks) => {
                        for _ in 0..ticks {
                            report.events.extend(self.api.update(self.frame_dt));
                            report.frames += 1;
                            on_frame(&FrameSnapshot::capture(self.api.registry()));
                        }
                        true
                    }
                    None => {
                        warn!(seconds = *seconds, max = MAX_ADVANCE_SECONDS, "推进时间超出上限");
                        false
                    }
                },
                other => self.apply(other),
            };
            if !ok {
                debug!(index, op = op.name(), "场景操作失败");
                report.failures.push(OpFailure {
                    index,
                    op: op.name(),
                });
            }
        }

        info!(
            frames = report.frames,
            failures = report.failures.len(),
            "场景回放完成"
        );
        report
    }

    /// `seconds` 对应的帧数（四舍五入，非正数为 0）
    ///
    /// 非有限值或超过 [`MAX_ADVANCE_SECONDS`] 时返回 `None`。
    pub fn ticks_for(&self, seconds: f32) -> Option<u64> {
        if !seconds.is_finite() || seconds > MAX_ADVANCE_SECONDS {
            return None;
        }
        if seconds <= 0.0 {
            return Some(0);
        }
        Some((seconds / self.frame_dt).round() as u64)
    }

    /// 执行单个非推进操作
    pub fn apply(&mut self, op: &SceneOp) -> bool {
        match op {
            SceneOp::Add { alias } => {
                let id = self.api.add();
                self.aliases.insert(alias.clone(), id);
                id.is_valid()
            }
            SceneOp::Styling { marker, styling } => {
                let id = self.resolve(marker);
                self.api.set_styling(id, styling)
            }
            SceneOp::Point { marker, coord } => {
                let id = self.resolve(marker);
                self.api.set_point(id, *coord)
            }
            SceneOp::PointEased {
                marker,
                coord,
                seconds,
                ease,
            } => {
                let id = self.resolve(marker);
                match ease {
                    Some(name) => self.api.set_point_eased_named(id, *coord, *seconds, name),
                    None => self
                        .api
                        .set_point_eased(id, *coord, *seconds, self.default_easing),
                }
            }
            SceneOp::Polyline { marker, coords } => {
                let id = self.resolve(marker);
                self.api.set_polyline(id, coords)
            }
            SceneOp::Polygon { marker, rings } => {
                let id = self.resolve(marker);
                self.api.set_polygon(id, rings)
            }
            SceneOp::Visible { marker, visible } => {
                let id = self.resolve(marker);
                self.api.set_visible(id, *visible)
            }
            SceneOp::Image { marker, path } => {
                let id = self.resolve(marker);
                match self.images.load(path) {
                    Ok(image) => self.api.set_image(id, image),
                    Err(e) => {
                        warn!(path = %path, error = %e, "图片加载失败");
                        false
                    }
                }
            }
            SceneOp::Remove { marker } => {
                let id = self.resolve(marker);
                self.api.remove(id)
            }
            SceneOp::RemoveAll => self.api.remove_all(),
            SceneOp::Advance { .. } => true,
        }
    }

    /// 别名对应的句柄，未知别名为无效句柄
    pub fn resolve(&self, alias: &str) -> MarkerId {
        self.aliases.get(alias).copied().unwrap_or(MarkerId::INVALID)
    }

    pub fn registry(&self) -> &MarkerRegistry {
        self.api.registry()
    }

    /// 当前帧快照
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(self.api.registry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replayer(frame_rate: u32) -> Replayer {
        let config = HostConfig {
            frame_rate,
            ..HostConfig::default()
        };
        Replayer::new(&config, ImageLoader::placeholder())
    }

    #[test]
    fn test_parse_ops() {
        let scene = Scene::from_json(
            r#"{
                "ops": [
                    { "op": "add", "alias": "a" },
                    { "op": "point_eased", "marker": "a", "coord": [1, 2], "seconds": 0.5 },
                    { "op": "remove_all" },
                    { "op": "advance", "seconds": 1 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scene.expect_failures, 0);
        assert_eq!(
            scene.ops[1],
            SceneOp::PointEased {
                marker: "a".to_string(),
                coord: LngLat::new(1.0, 2.0),
                seconds: 0.5,
                ease: None,
            }
        );
        assert_eq!(scene.ops[2], SceneOp::RemoveAll);
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(matches!(
            Scene::from_json(r#"{ "ops": [ { "op": "explode" } ] }"#),
            Err(SceneError::Parse(_))
        ));
    }

    #[test]
    fn test_ticks_for() {
        let replayer = replayer(4);
        assert_eq!(replayer.ticks_for(1.0), Some(4));
        assert_eq!(replayer.ticks_for(0.3), Some(1));
        assert_eq!(replayer.ticks_for(-1.0), Some(0));
        assert_eq!(replayer.ticks_for(MAX_ADVANCE_SECONDS), Some(14_400));
        assert_eq!(replayer.ticks_for(f32::NAN), None);
        assert_eq!(replayer.ticks_for(f32::INFINITY), None);
        assert_eq!(replayer.ticks_for(1e30), None);
    }

    #[test]
    fn test_oversized_advance_fails() {
        let scene = Scene::from_json(
            r#"{
                "expect_failures": 1,
                "ops": [
                    { "op": "add", "alias": "a" },
                    { "op": "advance", "seconds": 1e30 },
                    { "op": "advance", "seconds": 0.5 }
                ]
            }"#,
        )
        .unwrap();

        let mut replayer = replayer(4);
        let report = replayer.run(&scene, |_| {});
        assert_eq!(report.failures, vec![OpFailure { index: 1, op: "advance" }]);
        assert_eq!(report.frames, 2);
        assert!(report.matches(&scene));
    }

    #[test]
    fn test_unknown_alias_fails() {
        let mut replayer = replayer(60);
        assert!(!replayer.apply(&SceneOp::Visible {
            marker: "ghost".to_string(),
            visible: false,
        }));
        assert_eq!(replayer.resolve("ghost"), MarkerId::INVALID);
    }

    #[test]
    fn test_image_op() {
        let mut replayer = replayer(60);
        assert!(replayer.apply(&SceneOp::Add {
            alias: "pin".to_string()
        }));
        let image = SceneOp::Image {
            marker: "pin".to_string(),
            path: "pin.png".to_string(),
        };
        // 没有点样式
        assert!(!replayer.apply(&image));

        assert!(replayer.apply(&SceneOp::Styling {
            marker: "pin".to_string(),
            styling: "{ style: points }".to_string(),
        }));
        assert!(replayer.apply(&image));

        let snapshot = replayer.snapshot();
        assert_eq!(snapshot.markers[0].image, Some([16, 16]));
    }
}
