//! # Registry 模块
//!
//! 标记注册表：持有全部标记，分配句柄，是唯一的修改入口。
//!
//! ## 约定
//!
//! - 句柄单调递增，删除后不再复用（`remove_all` 之后也不复用）
//! - 对未知句柄的任何操作都返回 [`MarkerError::InvalidHandle`] 且不做修改
//! - 失败的调用不留下部分修改：先校验、再一次性写入
//! - 任何几何替换都会取消进行中的过渡，只有缓动点更新会接续当前位置

use std::collections::BTreeMap;

use tracing::debug;

use crate::animation::{MarkerEvent, PointTransition};
use crate::bitmap::ImageRef;
use crate::config::MarkerConfig;
use crate::driver::AnimationDriver;
use crate::easing::EasingFunction;
use crate::error::{MarkerError, MarkerResult};
use crate::geometry::{Geometry, LngLat};
use crate::marker::{Marker, MarkerId};
use crate::render::DrawItem;
use crate::style::{FlowStyleCompiler, StyleCompiler};

/// 标记注册表
pub struct MarkerRegistry {
    /// 存活的标记（按句柄排序，即按创建顺序）
    markers: BTreeMap<MarkerId, Marker>,
    /// 下一个句柄值，0 表示句柄空间已耗尽
    next_id: u32,
    /// 同时存在的标记数量上限
    capacity: usize,
    /// 样式编译器
    compiler: Box<dyn StyleCompiler>,
    /// 过渡驱动器
    driver: AnimationDriver,
    /// 待取出的事件
    events: Vec<MarkerEvent>,
}

impl Default for MarkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MarkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerRegistry")
            .field("markers", &self.markers.len())
            .field("next_id", &self.next_id)
            .field("capacity", &self.capacity)
            .field("frame", &self.driver.frame())
            .finish()
    }
}

fn lookup(markers: &mut BTreeMap<MarkerId, Marker>, id: MarkerId) -> MarkerResult<&mut Marker> {
    markers
        .get_mut(&id)
        .ok_or(MarkerError::InvalidHandle { id })
}

impl MarkerRegistry {
    /// 使用默认配置和内置样式编译器创建注册表
    pub fn new() -> Self {
        Self::with_config(&MarkerConfig::default())
    }

    /// 按配置创建注册表
    pub fn with_config(config: &MarkerConfig) -> Self {
        Self {
            markers: BTreeMap::new(),
            next_id: 1,
            capacity: config.max_markers,
            compiler: Box::new(FlowStyleCompiler),
            driver: AnimationDriver::new(config.max_frame_delta),
            events: Vec::new(),
        }
    }

    /// 替换样式编译器
    pub fn with_compiler(mut self, compiler: impl StyleCompiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    // ========== 生命周期 ==========

    /// 创建标记
    ///
    /// 新标记没有几何和样式，默认可见。
    pub fn add(&mut self) -> MarkerResult<MarkerId> {
        if self.markers.len() >= self.capacity {
            return Err(MarkerError::Exhausted {
                capacity: self.capacity,
            });
        }
        if self.next_id == 0 {
            return Err(MarkerError::Exhausted {
                capacity: u32::MAX as usize,
            });
        }

        let id = MarkerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.markers.insert(id, Marker::new(id));
        debug!(id = %id, "创建标记");
        Ok(id)
    }

    /// 删除标记
    pub fn remove(&mut self, id: MarkerId) -> MarkerResult<()> {
        let marker = self
            .markers
            .remove(&id)
            .ok_or(MarkerError::InvalidHandle { id })?;
        if marker.transition().is_some() {
            self.events.push(MarkerEvent::TransitionCancelled(id));
        }
        debug!(id = %id, "删除标记");
        Ok(())
    }

    /// 删除全部标记，返回删除数量
    pub fn remove_all(&mut self) -> usize {
        let count = self.markers.len();
        self.events.extend(
            self.markers
                .values()
                .filter(|m| m.transition().is_some())
                .map(|m| MarkerEvent::TransitionCancelled(m.id())),
        );
        self.markers.clear();
        debug!(count = count, "删除全部标记");
        count
    }

    // ========== 样式 / 可见性 / 图片 ==========

    /// 设置样式
    ///
    /// 编译失败时保留旧样式。
    pub fn set_styling(&mut self, id: MarkerId, source: &str) -> MarkerResult<()> {
        let marker = lookup(&mut self.markers, id)?;
        let style = self.compiler.compile(source)?;
        marker.set_style(style);
        Ok(())
    }

    /// 设置可见性
    pub fn set_visible(&mut self, id: MarkerId, visible: bool) -> MarkerResult<()> {
        lookup(&mut self.markers, id)?.set_visible(visible);
        Ok(())
    }

    /// 设置图片
    ///
    /// 只允许点样式的标记，是否为点样式由样式编译器决定。
    pub fn set_image(&mut self, id: MarkerId, image: ImageRef) -> MarkerResult<()> {
        let marker = lookup(&mut self.markers, id)?;
        if !marker.style().is_some_and(|s| s.is_point_style()) {
            return Err(MarkerError::IncompatibleStyleForImage { id });
        }
        marker.set_image(image);
        Ok(())
    }

    // ========== 几何 ==========

    /// 设置点几何，取消进行中的过渡
    pub fn set_point(&mut self, id: MarkerId, coord: LngLat) -> MarkerResult<()> {
        self.replace_geometry(id, Geometry::Point(coord))
    }

    /// 设置缓动点位置
    ///
    /// - 还没有点几何时等同于 [`set_point`](Self::set_point)
    /// - `duration <= 0` 时立即设置
    /// - 已有过渡时从当前插值位置重新出发
    /// - 当前为折线 / 多边形时失败
    pub fn set_point_eased(
        &mut self,
        id: MarkerId,
        coord: LngLat,
        duration: f32,
        easing: EasingFunction,
    ) -> MarkerResult<()> {
        let marker = lookup(&mut self.markers, id)?;
        let current = match marker.geometry() {
            None => {
                marker.replace_geometry(Geometry::Point(coord));
                return Ok(());
            }
            Some(Geometry::Point(current)) => *current,
            Some(other) => {
                return Err(MarkerError::IncompatibleGeometry {
                    id,
                    kind: other.kind(),
                });
            }
        };

        match PointTransition::new(current, coord, duration, easing) {
            Some(transition) => {
                marker.start_transition(transition);
                self.events.push(MarkerEvent::TransitionStarted(id));
                debug!(id = %id, duration = duration, easing = %easing, "开始标记过渡");
            }
            None => {
                if marker.replace_geometry(Geometry::Point(coord)).is_some() {
                    self.events.push(MarkerEvent::TransitionCancelled(id));
                }
            }
        }
        Ok(())
    }

    /// 设置折线几何（至少 2 个点）
    pub fn set_polyline(&mut self, id: MarkerId, coords: Vec<LngLat>) -> MarkerResult<()> {
        // 先确认句柄，避免无效句柄报告成几何错误
        lookup(&mut self.markers, id)?;
        let geometry = Geometry::polyline(coords)?;
        self.replace_geometry(id, geometry)
    }

    /// 设置多边形几何（至少 1 个环，每个环至少 3 个点）
    pub fn set_polygon(&mut self, id: MarkerId, rings: Vec<Vec<LngLat>>) -> MarkerResult<()> {
        lookup(&mut self.markers, id)?;
        let geometry = Geometry::polygon(rings)?;
        self.replace_geometry(id, geometry)
    }

    fn replace_geometry(&mut self, id: MarkerId, geometry: Geometry) -> MarkerResult<()> {
        let marker = lookup(&mut self.markers, id)?;
        if marker.replace_geometry(geometry).is_some() {
            self.events.push(MarkerEvent::TransitionCancelled(id));
            debug!(id = %id, "几何被替换，取消标记过渡");
        }
        Ok(())
    }

    // ========== 帧推进 ==========

    /// 推进一帧
    ///
    /// # 返回
    /// 自上次调用以来产生的事件（包括本帧完成的过渡）
    pub fn update(&mut self, dt: f32) -> Vec<MarkerEvent> {
        let completed = self.driver.step(self.markers.values_mut(), dt);
        self.events
            .extend(completed.into_iter().map(MarkerEvent::TransitionCompleted));
        std::mem::take(&mut self.events)
    }

    // ========== 查询 ==========

    /// 获取标记
    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    /// 句柄是否有效
    pub fn contains(&self, id: MarkerId) -> bool {
        self.markers.contains_key(&id)
    }

    /// 存活标记数量
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// 数量上限
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 全部存活句柄（按创建顺序）
    pub fn ids(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.markers.keys().copied()
    }

    /// 全部存活标记（按创建顺序）
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    /// 渲染端每帧读取的绘制项
    ///
    /// 只包含可见且同时具有几何和样式的标记。
    pub fn drawables(&self) -> impl Iterator<Item = DrawItem<'_>> {
        self.markers.values().filter_map(DrawItem::from_marker)
    }

    /// 是否有进行中的过渡（渲染循环据此决定是否继续请求重绘）
    pub fn has_active_transitions(&self) -> bool {
        self.markers.values().any(|m| m.transition().is_some())
    }

    /// 进行中的过渡数量
    pub fn active_transition_count(&self) -> usize {
        self.markers
            .values()
            .filter(|m| m.transition().is_some())
            .count()
    }

    /// 已推进的帧数
    pub fn frame(&self) -> u64 {
        self.driver.frame()
    }

    /// 累计帧时间（秒）
    pub fn clock(&self) -> f64 {
        self.driver.clock()
    }

    #[cfg(test)]
    pub(crate) fn set_next_id(&mut self, next: u32) {
        self.next_id = next;
    }
}
