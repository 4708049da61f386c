//! # Shared 模块
//!
//! 跨线程共享的标记接口。
//!
//! 绑定层可能从任意线程调用修改接口，而渲染循环在自己的线程上推进帧。
//! [`SharedMarkers`] 用一把互斥锁串行化两者，渲染端在锁内读取绘制项，
//! 因此每一帧看到的都是完整的修改结果，不会读到一半的几何。

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::error;

use crate::animation::MarkerEvent;
use crate::api::MarkerApi;
use crate::bitmap::ImageRef;
use crate::config::MarkerConfig;
use crate::easing::EasingFunction;
use crate::geometry::LngLat;
use crate::marker::MarkerId;
use crate::render::FrameSnapshot;

/// 可克隆的共享标记句柄
#[derive(Debug, Clone, Default)]
pub struct SharedMarkers {
    inner: Arc<Mutex<MarkerApi>>,
}

impl SharedMarkers {
    pub fn new(api: MarkerApi) -> Self {
        Self {
            inner: Arc::new(Mutex::new(api)),
        }
    }

    pub fn with_config(config: &MarkerConfig) -> Self {
        Self::new(MarkerApi::with_config(config))
    }

    /// 在锁内执行操作
    ///
    /// 锁已中毒（持锁线程 panic）时返回 `None`。
    pub fn with<R>(&self, f: impl FnOnce(&mut MarkerApi) -> R) -> Option<R> {
        self.lock().map(|mut guard| f(&mut *guard))
    }

    fn lock(&self) -> Option<MutexGuard<'_, MarkerApi>> {
        match self.inner.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                error!("标记状态锁已中毒");
                None
            }
        }
    }

    fn apply(&self, f: impl FnOnce(&mut MarkerApi) -> bool) -> bool {
        self.with(f).unwrap_or(false)
    }

    pub fn add(&self) -> MarkerId {
        self.with(MarkerApi::add).unwrap_or(MarkerId::INVALID)
    }

    pub fn remove(&self, id: MarkerId) -> bool {
        self.apply(|api| api.remove(id))
    }

    pub fn remove_all(&self) -> bool {
        self.apply(MarkerApi::remove_all)
    }

    pub fn set_styling(&self, id: MarkerId, styling: &str) -> bool {
        self.apply(|api| api.set_styling(id, styling))
    }

    pub fn set_point(&self, id: MarkerId, coord: LngLat) -> bool {
        self.apply(|api| api.set_point(id, coord))
    }

    pub fn set_point_eased(
        &self,
        id: MarkerId,
        coord: LngLat,
        seconds: f32,
        ease: EasingFunction,
    ) -> bool {
        self.apply(|api| api.set_point_eased(id, coord, seconds, ease))
    }

    /// 以缓动名称设置缓动点位置
    pub fn set_point_eased_named(
        &self,
        id: MarkerId,
        coord: LngLat,
        seconds: f32,
        ease: &str,
    ) -> bool {
        self.apply(|api| api.set_point_eased_named(id, coord, seconds, ease))
    }

    /// 以缓动编码设置缓动点位置
    pub fn set_point_eased_code(
        &self,
        id: MarkerId,
        coord: LngLat,
        seconds: f32,
        ease: u32,
    ) -> bool {
        self.apply(|api| api.set_point_eased_code(id, coord, seconds, ease))
    }

    pub fn set_polyline(&self, id: MarkerId, coords: &[LngLat]) -> bool {
        self.apply(|api| api.set_polyline(id, coords))
    }

    pub fn set_polygon(&self, id: MarkerId, rings: &[Vec<LngLat>]) -> bool {
        self.apply(|api| api.set_polygon(id, rings))
    }

    pub fn set_visible(&self, id: MarkerId, visible: bool) -> bool {
        self.apply(|api| api.set_visible(id, visible))
    }

    pub fn set_image(&self, id: MarkerId, image: ImageRef) -> bool {
        self.apply(|api| api.set_image(id, image))
    }

    /// 推进一帧（渲染线程调用）
    pub fn update(&self, dt: f32) -> Vec<MarkerEvent> {
        self.with(|api| api.update(dt)).unwrap_or_default()
    }

    pub fn needs_redraw(&self) -> bool {
        self.with(|api| api.needs_redraw()).unwrap_or(false)
    }

    /// 采集当前帧快照
    pub fn snapshot(&self) -> FrameSnapshot {
        self.with(|api| FrameSnapshot::capture(api.registry()))
            .unwrap_or_default()
    }
}
