//! # Api 模块
//!
//! 面向绑定层的标记接口。
//!
//! 与 [`MarkerRegistry`] 一一对应，但失败不向上传播：
//! - `add` 失败返回 [`MarkerId::INVALID`]
//! - 其他操作返回 `bool`
//!
//! 每次失败都以 `warn` 级别记录具体原因，调用方只需要判断成败。

use tracing::warn;

use crate::animation::MarkerEvent;
use crate::bitmap::ImageRef;
use crate::config::MarkerConfig;
use crate::easing::EasingFunction;
use crate::error::{MarkerError, MarkerResult};
use crate::geometry::LngLat;
use crate::marker::MarkerId;
use crate::registry::MarkerRegistry;

fn report(op: &'static str, id: MarkerId, result: MarkerResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(op, id = %id, error = %e, "标记操作失败");
            false
        }
    }
}

/// 标记接口
#[derive(Debug, Default)]
pub struct MarkerApi {
    registry: MarkerRegistry,
    /// 本帧之后是否还需要重绘
    needs_redraw: bool,
}

impl MarkerApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &MarkerConfig) -> Self {
        Self::from_registry(MarkerRegistry::with_config(config))
    }

    /// 包装已有注册表（例如替换过样式编译器的）
    pub fn from_registry(registry: MarkerRegistry) -> Self {
        Self {
            registry,
            needs_redraw: false,
        }
    }

    /// 创建标记，失败返回无效句柄
    pub fn add(&mut self) -> MarkerId {
        match self.registry.add() {
            Ok(id) => id,
            Err(e) => {
                warn!(op = "add", error = %e, "标记操作失败");
                MarkerId::INVALID
            }
        }
    }

    pub fn remove(&mut self, id: MarkerId) -> bool {
        let ok = report("remove", id, self.registry.remove(id));
        self.needs_redraw |= ok;
        ok
    }

    /// 删除全部标记，总是成功
    pub fn remove_all(&mut self) -> bool {
        if self.registry.remove_all() > 0 {
            self.needs_redraw = true;
        }
        true
    }

    pub fn set_styling(&mut self, id: MarkerId, styling: &str) -> bool {
        let ok = report("set_styling", id, self.registry.set_styling(id, styling));
        self.needs_redraw |= ok;
        ok
    }

    pub fn set_point(&mut self, id: MarkerId, coord: LngLat) -> bool {
        let ok = report("set_point", id, self.registry.set_point(id, coord));
        self.needs_redraw |= ok;
        ok
    }

    pub fn set_point_eased(
        &mut self,
        id: MarkerId,
        coord: LngLat,
        seconds: f32,
        ease: EasingFunction,
    ) -> bool {
        let result = self.registry.set_point_eased(id, coord, seconds, ease);
        let ok = report("set_point_eased", id, result);
        self.needs_redraw |= ok;
        ok
    }

    /// 以缓动名称设置缓动点位置，未知名称视为失败
    pub fn set_point_eased_named(
        &mut self,
        id: MarkerId,
        coord: LngLat,
        seconds: f32,
        ease: &str,
    ) -> bool {
        match ease.parse::<EasingFunction>() {
            Ok(ease) => self.set_point_eased(id, coord, seconds, ease),
            Err(e) => report("set_point_eased", id, Err(MarkerError::from(e))),
        }
    }

    /// 以缓动编码设置缓动点位置，未知编码视为失败
    pub fn set_point_eased_code(
        &mut self,
        id: MarkerId,
        coord: LngLat,
        seconds: f32,
        ease: u32,
    ) -> bool {
        match EasingFunction::from_code(ease) {
            Ok(ease) => self.set_point_eased(id, coord, seconds, ease),
            Err(e) => report("set_point_eased", id, Err(MarkerError::from(e))),
        }
    }

    pub fn set_polyline(&mut self, id: MarkerId, coords: &[LngLat]) -> bool {
        let ok = report(
            "set_polyline",
            id,
            self.registry.set_polyline(id, coords.to_vec()),
        );
        self.needs_redraw |= ok;
        ok
    }

    /// 设置多边形
    ///
    /// `rings` 中第一个环是外边界，其余是洞。
    pub fn set_polygon(&mut self, id: MarkerId, rings: &[Vec<LngLat>]) -> bool {
        let ok = report(
            "set_polygon",
            id,
            self.registry.set_polygon(id, rings.to_vec()),
        );
        self.needs_redraw |= ok;
        ok
    }

    pub fn set_visible(&mut self, id: MarkerId, visible: bool) -> bool {
        let ok = report("set_visible", id, self.registry.set_visible(id, visible));
        self.needs_redraw |= ok;
        ok
    }

    pub fn set_image(&mut self, id: MarkerId, image: ImageRef) -> bool {
        let ok = report("set_image", id, self.registry.set_image(id, image));
        self.needs_redraw |= ok;
        ok
    }

    /// 推进一帧
    ///
    /// 返回本帧的事件。调用后 [`needs_redraw`](Self::needs_redraw)
    /// 反映是否还有过渡在进行。
    pub fn update(&mut self, dt: f32) -> Vec<MarkerEvent> {
        let events = self.registry.update(dt);
        self.needs_redraw = self.registry.has_active_transitions();
        events
    }

    /// 是否需要继续请求重绘
    ///
    /// 有进行中的过渡，或上一帧之后有成功的修改时为 `true`。
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw || self.registry.has_active_transitions()
    }

    /// 只读访问注册表
    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    /// 可变访问注册表（需要 `Result` 形式的错误时使用）
    pub fn registry_mut(&mut self) -> &mut MarkerRegistry {
        &mut self.registry
    }
}
