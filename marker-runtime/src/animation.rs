//! # Animation 模块
//!
//! 点位置过渡的状态记录。
//!
//! 过渡是纯数据，由 [`AnimationDriver`](crate::driver::AnimationDriver) 每帧轮询推进，
//! 不持有回调，标记被删除时直接随之丢弃。

use crate::easing::EasingFunction;
use crate::geometry::LngLat;
use crate::marker::MarkerId;

/// 过渡事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerEvent {
    /// 过渡开始（包括对进行中的过渡重新设定目标）
    TransitionStarted(MarkerId),
    /// 过渡完成，位置已固定在终点
    TransitionCompleted(MarkerId),
    /// 过渡被几何覆盖或标记删除取消
    TransitionCancelled(MarkerId),
}

impl MarkerEvent {
    /// 事件所属的标记
    pub fn marker(&self) -> MarkerId {
        match self {
            MarkerEvent::TransitionStarted(id)
            | MarkerEvent::TransitionCompleted(id)
            | MarkerEvent::TransitionCancelled(id) => *id,
        }
    }
}

/// 点位置过渡
///
/// 在 `duration` 秒内从 `start` 移动到 `end`。
/// `elapsed` 只增不减且不超过 `duration`。
#[derive(Debug, Clone, PartialEq)]
pub struct PointTransition {
    start: LngLat,
    end: LngLat,
    duration: f32,
    elapsed: f32,
    easing: EasingFunction,
}

impl PointTransition {
    /// 创建过渡
    ///
    /// 时长非正或非有限值时返回 `None`，调用方应直接设置终点。
    pub fn new(start: LngLat, end: LngLat, duration: f32, easing: EasingFunction) -> Option<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return None;
        }
        Some(Self {
            start,
            end,
            duration,
            elapsed: 0.0,
            easing,
        })
    }

    /// 推进过渡
    ///
    /// 负数或 NaN 的 `dt` 视为 0。
    ///
    /// # 返回
    /// - `true`: 过渡仍在进行中
    /// - `false`: 过渡已结束
    pub fn advance(&mut self, dt: f32) -> bool {
        let dt = if dt.is_nan() { 0.0 } else { dt.max(0.0) };
        self.elapsed = (self.elapsed + dt).min(self.duration);
        !self.is_finished()
    }

    /// 当前位置
    ///
    /// 结束时严格等于终点，不受浮点误差影响。
    pub fn position(&self) -> LngLat {
        if self.is_finished() {
            return self.end;
        }
        self.start.lerp(self.end, self.progress() as f64)
    }

    /// 缓动后的进度
    pub fn progress(&self) -> f32 {
        self.easing.apply(self.elapsed / self.duration)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn start(&self) -> LngLat {
        self.start
    }

    pub fn end(&self) -> LngLat {
        self.end
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn easing(&self) -> EasingFunction {
        self.easing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_transition() -> PointTransition {
        PointTransition::new(
            LngLat::new(0.0, 0.0),
            LngLat::new(10.0, -20.0),
            1.0,
            EasingFunction::Linear,
        )
        .unwrap()
    }

    #[test]
    fn test_transition_creation() {
        let t = create_test_transition();
        assert_eq!(t.elapsed(), 0.0);
        assert_eq!(t.progress(), 0.0);
        assert_eq!(t.position(), LngLat::new(0.0, 0.0));
        assert!(!t.is_finished());
    }

    #[test]
    fn test_transition_advance() {
        let mut t = create_test_transition();

        assert!(t.advance(0.5));
        assert_eq!(t.position(), LngLat::new(5.0, -10.0));

        // 超出时长被截断
        assert!(!t.advance(0.75));
        assert_eq!(t.elapsed(), 1.0);
        assert_eq!(t.position(), LngLat::new(10.0, -20.0));
    }

    #[test]
    fn test_negative_and_nan_dt() {
        let mut t = create_test_transition();
        t.advance(0.25);
        t.advance(-1.0);
        t.advance(f32::NAN);
        assert_eq!(t.elapsed(), 0.25);
    }

    #[test]
    fn test_zero_duration() {
        let a = LngLat::new(1.0, 1.0);
        assert!(PointTransition::new(a, a, 0.0, EasingFunction::Linear).is_none());
        assert!(PointTransition::new(a, a, -1.0, EasingFunction::Linear).is_none());
        assert!(PointTransition::new(a, a, f32::INFINITY, EasingFunction::Linear).is_none());
    }

    #[test]
    fn test_event_marker() {
        let id = MarkerId::from_raw(7);
        assert_eq!(MarkerEvent::TransitionCancelled(id).marker(), id);
    }
}
