//! # Marker 模块
//!
//! 标记实体及其句柄。

use serde::{Deserialize, Serialize};

use crate::animation::PointTransition;
use crate::bitmap::ImageRef;
use crate::geometry::{Geometry, GeometryKind, LngLat};
use crate::style::StyleDescriptor;

/// 标记句柄
///
/// 由 [`MarkerRegistry`](crate::MarkerRegistry) 分配，非零且在注册表生命周期内不会复用。
/// `0` 保留为无效句柄。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MarkerId(pub(crate) u32);

impl MarkerId {
    /// 无效句柄（创建失败时返回）
    pub const INVALID: MarkerId = MarkerId(0);

    /// 从绑定层传入的原始值构造
    ///
    /// 不做存在性检查，未知句柄在注册表操作时被拒绝。
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// 获取内部值
    pub fn value(&self) -> u32 {
        self.0
    }

    /// 是否为非零句柄
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MarkerId({})", self.0)
    }
}

/// 标记实体
///
/// 新建时没有几何、没有样式、可见。没有几何或没有样式的标记不会被绘制。
#[derive(Debug, Clone)]
pub struct Marker {
    id: MarkerId,
    geometry: Option<Geometry>,
    style: Option<StyleDescriptor>,
    visible: bool,
    image: Option<ImageRef>,
    transition: Option<PointTransition>,
}

impl Marker {
    pub(crate) fn new(id: MarkerId) -> Self {
        Self {
            id,
            geometry: None,
            style: None,
            visible: true,
            image: None,
            transition: None,
        }
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        self.geometry.as_ref().map(Geometry::kind)
    }

    pub fn style(&self) -> Option<&StyleDescriptor> {
        self.style.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    /// 进行中的位置过渡
    pub fn transition(&self) -> Option<&PointTransition> {
        self.transition.as_ref()
    }

    /// 当前点位置（仅点几何）
    pub fn position(&self) -> Option<LngLat> {
        self.geometry.as_ref().and_then(Geometry::as_point)
    }

    /// 是否可被渲染端绘制
    pub fn is_drawable(&self) -> bool {
        self.visible && self.geometry.is_some() && self.style.is_some()
    }

    /// 替换几何，返回被取消的过渡
    pub(crate) fn replace_geometry(&mut self, geometry: Geometry) -> Option<PointTransition> {
        self.geometry = Some(geometry);
        self.transition.take()
    }

    /// 开始过渡，当前位置保持在起点
    ///
    /// 返回被替换的旧过渡。
    pub(crate) fn start_transition(
        &mut self,
        transition: PointTransition,
    ) -> Option<PointTransition> {
        self.geometry = Some(Geometry::Point(transition.position()));
        self.transition.replace(transition)
    }

    pub(crate) fn set_style(&mut self, style: StyleDescriptor) {
        self.style = Some(style);
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn set_image(&mut self, image: ImageRef) {
        self.image = Some(image);
    }

    /// 推进过渡并写回位置
    ///
    /// # 返回
    /// - `None`: 没有进行中的过渡
    /// - `Some(true)`: 仍在进行中
    /// - `Some(false)`: 本帧结束，过渡已移除，位置固定在终点
    pub(crate) fn advance_transition(&mut self, dt: f32) -> Option<bool> {
        let transition = self.transition.as_mut()?;
        let running = transition.advance(dt);
        self.geometry = Some(Geometry::Point(transition.position()));
        if !running {
            self.transition = None;
        }
        Some(running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingFunction;

    #[test]
    fn test_marker_id() {
        assert!(!MarkerId::INVALID.is_valid());
        assert!(MarkerId::from_raw(3).is_valid());
        assert_eq!(MarkerId::from_raw(3).value(), 3);
        assert_eq!(MarkerId::from_raw(3).to_string(), "MarkerId(3)");
        assert_eq!(MarkerId::default(), MarkerId::INVALID);
    }

    #[test]
    fn test_new_marker_defaults() {
        let marker = Marker::new(MarkerId::from_raw(1));
        assert!(marker.is_visible());
        assert!(marker.geometry().is_none());
        assert!(marker.style().is_none());
        assert!(marker.image().is_none());
        assert!(marker.transition().is_none());
        assert!(!marker.is_drawable());
    }

    #[test]
    fn test_replace_geometry_cancels_transition() {
        let mut marker = Marker::new(MarkerId::from_raw(1));
        let t = PointTransition::new(
            LngLat::new(0.0, 0.0),
            LngLat::new(1.0, 1.0),
            1.0,
            EasingFunction::Linear,
        )
        .unwrap();
        assert!(marker.start_transition(t).is_none());
        assert_eq!(marker.position(), Some(LngLat::new(0.0, 0.0)));

        let cancelled = marker.replace_geometry(Geometry::point((5.0, 5.0)));
        assert!(cancelled.is_some());
        assert!(marker.transition().is_none());
        assert_eq!(marker.position(), Some(LngLat::new(5.0, 5.0)));
    }

    #[test]
    fn test_advance_transition_pins_end() {
        let mut marker = Marker::new(MarkerId::from_raw(1));
        let end = LngLat::new(0.3, 0.7);
        let t = PointTransition::new(LngLat::new(0.1, 0.1), end, 0.3, EasingFunction::EaseOutBounce)
            .unwrap();
        marker.start_transition(t);

        assert_eq!(marker.advance_transition(0.1), Some(true));
        assert_eq!(marker.advance_transition(0.1), Some(true));
        assert_eq!(marker.advance_transition(0.2), Some(false));
        assert_eq!(marker.position(), Some(end));
        assert_eq!(marker.advance_transition(0.1), None);
    }
}
