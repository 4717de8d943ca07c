#[derive(Debug)]
pub struct Timer {
    start_time: std::time::Instant,
    last_tick: std::time::Instant,

    delta_time: std::time::Duration,
    total_time: std::time::Duration,
}

impl Default for Timer {
    fn default() -> Self {
        let now = std::time::Instant::now();
        Self {
            start_time: now,
            last_tick: now,
            delta_time: std::time::Duration::ZERO,
            total_time: std::time::Duration::ZERO,
        }
    }
}

impl Timer {
    /// 每帧开始的时候调用
    pub fn tick(&mut self) {
        self.tick_at(std::time::Instant::now());
    }

    fn tick_at(&mut self, now: std::time::Instant) {
        self.delta_time = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.total_time = now.duration_since(self.start_time);
    }

    /// 距离上一次 tick 经过的时间，用于限制帧率
    pub fn elapsed_since_tick(&self) -> std::time::Duration {
        self.last_tick.elapsed()
    }

    #[inline]
    pub fn delta_time(&self) -> std::time::Duration {
        self.delta_time
    }

    /// 上一帧的时间（秒）
    #[inline]
    pub fn delta_time_s(&self) -> f32 {
        self.delta_time.as_secs_f32()
    }

    /// 当前帧率
    #[inline]
    pub fn fps(&self) -> f32 {
        if self.delta_time.is_zero() { 0.0 } else { 1.0 / self.delta_time.as_secs_f32() }
    }

    /// 总运行时间
    #[inline]
    pub fn total_time_s(&self) -> f32 {
        self.total_time.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tick_accumulates() {
        let mut timer = Timer::default();
        let start = timer.start_time;
        timer.tick_at(start + Duration::from_millis(20));
        timer.tick_at(start + Duration::from_millis(50));

        assert!((timer.delta_time_s() - 0.03).abs() < 1e-6);
        assert!((timer.total_time_s() - 0.05).abs() < 1e-6);
        assert!((timer.fps() - 33.333).abs() < 0.01);
    }

    #[test]
    fn fps_before_first_tick() {
        assert_eq!(Timer::default().fps(), 0.0);
    }
}
