//! # Render 模块
//!
//! 渲染端读取标记状态的只读视图。
//!
//! - [`DrawItem`]：每帧绘制用的借用视图，不拷贝几何
//! - [`FrameSnapshot`]：可序列化的整帧快照，用于调试输出和场景回放校验

use serde::{Deserialize, Serialize};

use crate::bitmap::ImageRef;
use crate::geometry::Geometry;
use crate::marker::{Marker, MarkerId};
use crate::registry::MarkerRegistry;
use crate::style::StyleDescriptor;

/// 单个可绘制标记
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub id: MarkerId,
    pub geometry: &'a Geometry,
    pub style: &'a StyleDescriptor,
    pub image: Option<&'a ImageRef>,
}

impl<'a> DrawItem<'a> {
    /// 标记可见且几何、样式齐全时返回绘制项
    pub fn from_marker(marker: &'a Marker) -> Option<Self> {
        if !marker.is_visible() {
            return None;
        }
        Some(Self {
            id: marker.id(),
            geometry: marker.geometry()?,
            style: marker.style()?,
            image: marker.image(),
        })
    }
}

/// 单个标记的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSnapshot {
    pub id: MarkerId,
    pub visible: bool,
    /// 本帧是否会被绘制
    pub drawable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// 样式类型名（`points` / `lines` / ...）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// 图片尺寸 `[width, height]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<[u32; 2]>,
    /// 是否有进行中的过渡
    pub animating: bool,
}

impl MarkerSnapshot {
    pub fn from_marker(marker: &Marker) -> Self {
        Self {
            id: marker.id(),
            visible: marker.is_visible(),
            drawable: marker.is_drawable(),
            geometry: marker.geometry().cloned(),
            style: marker.style().map(|s| s.kind().name().to_string()),
            image: marker.image().map(|img| [img.width(), img.height()]),
            animating: marker.transition().is_some(),
        }
    }
}

/// 整帧快照
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// 帧序号
    pub frame: u64,
    /// 累计帧时间（秒）
    pub clock: f64,
    /// 进行中的过渡数量
    pub animating: usize,
    /// 全部存活标记（按创建顺序）
    pub markers: Vec<MarkerSnapshot>,
}

impl FrameSnapshot {
    /// 从注册表采集
    pub fn capture(registry: &MarkerRegistry) -> Self {
        Self {
            frame: registry.frame(),
            clock: registry.clock(),
            animating: registry.active_transition_count(),
            markers: registry.iter().map(MarkerSnapshot::from_marker).collect(),
        }
    }

    /// 本帧会被绘制的标记数量
    pub fn drawable_count(&self) -> usize {
        self.markers.iter().filter(|m| m.drawable).count()
    }

    /// 按句柄查找
    pub fn marker(&self, id: MarkerId) -> Option<&MarkerSnapshot> {
        self.markers.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingFunction;
    use crate::geometry::LngLat;

    #[test]
    fn test_capture() {
        let mut registry = MarkerRegistry::new();
        let a = registry.add().unwrap();
        let b = registry.add().unwrap();
        registry.set_styling(a, "{ style: points, size: 12px }").unwrap();
        registry.set_point(a, LngLat::new(0.0, 0.0)).unwrap();
        registry
            .set_point_eased(a, LngLat::new(2.0, 2.0), 1.0, EasingFunction::Linear)
            .unwrap();
        registry.update(0.5);

        let snapshot = FrameSnapshot::capture(&registry);
        assert_eq!(snapshot.frame, 1);
        assert_eq!(snapshot.animating, 1);
        assert_eq!(snapshot.drawable_count(), 1);

        let first = snapshot.marker(a).unwrap();
        assert_eq!(first.style.as_deref(), Some("points"));
        assert_eq!(first.geometry, Some(Geometry::Point(LngLat::new(1.0, 1.0))));
        assert!(first.animating);

        let second = snapshot.marker(b).unwrap();
        assert!(!second.drawable);
        assert!(second.geometry.is_none());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut registry = MarkerRegistry::new();
        let id = registry.add().unwrap();
        registry.set_point(id, LngLat::new(1.5, -2.0)).unwrap();

        let json = serde_json::to_value(FrameSnapshot::capture(&registry)).unwrap();
        assert_eq!(json["markers"][0]["id"], 1);
        assert_eq!(json["markers"][0]["geometry"]["type"], "Point");
        assert_eq!(
            json["markers"][0]["geometry"]["coordinates"],
            serde_json::json!([1.5, -2.0])
        );
        assert!(json["markers"][0].get("style").is_none());
    }
}
