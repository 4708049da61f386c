//! # Driver 模块
//!
//! 每帧推进一次所有进行中的位置过渡。
//!
//! 驱动器与渲染循环在同一线程上调用，只做同步的 O(n) 遍历：
//! 1. `elapsed = min(elapsed + dt, duration)`
//! 2. 按缓动后的进度在起点和终点之间线性插值
//! 3. 到达时长的过渡被移除，位置固定为终点

use tracing::debug;

use crate::marker::{Marker, MarkerId};

/// 动画驱动器
#[derive(Debug, Clone, Default)]
pub struct AnimationDriver {
    /// 单帧最大时间步长
    max_frame_delta: Option<f32>,
    /// 已推进的帧数
    frame: u64,
    /// 累计帧时间（秒）
    clock: f64,
}

impl AnimationDriver {
    /// 创建驱动器
    pub fn new(max_frame_delta: Option<f32>) -> Self {
        Self {
            max_frame_delta,
            ..Self::default()
        }
    }

    /// 规整帧时间步长
    ///
    /// 负数和 NaN 视为 0，配置了上限时截断，结果不小于 0。
    pub fn sanitize(&self, dt: f32) -> f32 {
        let dt = if dt.is_nan() { 0.0 } else { dt };
        let dt = match self.max_frame_delta {
            Some(max) => dt.min(max),
            None => dt,
        };
        dt.max(0.0)
    }

    /// 推进一帧
    ///
    /// # 返回
    /// 本帧完成过渡的标记
    pub fn step<'a>(
        &mut self,
        markers: impl IntoIterator<Item = &'a mut Marker>,
        dt: f32,
    ) -> Vec<MarkerId> {
        let dt = self.sanitize(dt);
        self.frame += 1;
        self.clock += f64::from(dt);

        let mut completed = Vec::new();
        for marker in markers {
            if marker.advance_transition(dt) == Some(false) {
                debug!(id = %marker.id(), frame = self.frame, "标记过渡完成");
                completed.push(marker.id());
            }
        }
        completed
    }

    /// 已推进的帧数
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// 累计帧时间（秒）
    pub fn clock(&self) -> f64 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::PointTransition;
    use crate::easing::EasingFunction;
    use crate::geometry::LngLat;

    fn animated_marker(id: u32, duration: f32) -> Marker {
        let mut marker = Marker::new(MarkerId::from_raw(id));
        let t = PointTransition::new(
            LngLat::new(0.0, 0.0),
            LngLat::new(1.0, 2.0),
            duration,
            EasingFunction::Linear,
        )
        .unwrap();
        marker.start_transition(t);
        marker
    }

    #[test]
    fn test_sanitize() {
        let driver = AnimationDriver::new(None);
        assert_eq!(driver.sanitize(-1.0), 0.0);
        assert_eq!(driver.sanitize(f32::NAN), 0.0);
        assert_eq!(driver.sanitize(3.0), 3.0);

        let clamped = AnimationDriver::new(Some(0.1));
        assert_eq!(clamped.sanitize(3.0), 0.1);

        // 上限本身非法时时间也不会倒退
        let negative = AnimationDriver::new(Some(-1.0));
        assert_eq!(negative.sanitize(0.5), 0.0);
    }

    #[test]
    fn test_negative_cap_keeps_clock_monotonic() {
        let mut driver = AnimationDriver::new(Some(-1.0));
        let mut markers = vec![animated_marker(1, 1.0)];

        assert!(driver.step(markers.iter_mut(), 0.5).is_empty());
        assert_eq!(driver.clock(), 0.0);
        assert_eq!(markers[0].transition().map(|t| t.elapsed()), Some(0.0));
    }

    #[test]
    fn test_step_completes_in_order() {
        let mut driver = AnimationDriver::new(None);
        let mut markers = vec![
            animated_marker(1, 0.5),
            animated_marker(2, 1.0),
            Marker::new(MarkerId::from_raw(3)),
        ];

        let done = driver.step(markers.iter_mut(), 0.5);
        assert_eq!(done, vec![MarkerId::from_raw(1)]);
        assert_eq!(markers[0].position(), Some(LngLat::new(1.0, 2.0)));
        assert_eq!(markers[1].position(), Some(LngLat::new(0.5, 1.0)));
        assert!(markers[2].position().is_none());

        let done = driver.step(markers.iter_mut(), 0.5);
        assert_eq!(done, vec![MarkerId::from_raw(2)]);
        assert_eq!(driver.frame(), 2);
        assert_eq!(driver.clock(), 1.0);
    }

    #[test]
    fn test_clamped_frame_delta() {
        let mut driver = AnimationDriver::new(Some(0.25));
        let mut markers = vec![animated_marker(1, 1.0)];

        // 一次长卡顿只推进 0.25 秒
        assert!(driver.step(markers.iter_mut(), 5.0).is_empty());
        assert_eq!(markers[0].transition().map(|t| t.elapsed()), Some(0.25));
    }
}
