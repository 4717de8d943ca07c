use crate::pipeline_settings::FrameLabel;

pub struct FrameCounter {
    /// 当前的帧序号，一直累加
    frame_id: u64,
    frame_limit: f32,
}
// new & init
impl FrameCounter {
    pub fn new(init_frame_id: u64, frame_limit: f32) -> Self {
        Self {
            frame_id: init_frame_id,
            frame_limit,
        }
    }
}
// update
impl FrameCounter {
    #[inline]
    pub fn next_frame(&mut self) {
        self.frame_id = self.frame_id.wrapping_add(1);
    }
}
// getters
impl FrameCounter {
    const FIF_COUNT: usize = 3;

    #[inline]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// 每秒最多渲染的帧数
    #[inline]
    pub fn frame_limit(&self) -> f32 {
        self.frame_limit
    }

    #[inline]
    pub const fn fif_count() -> usize {
        Self::FIF_COUNT
    }

    #[inline]
    pub const fn frame_labels() -> [FrameLabel; Self::FIF_COUNT] {
        [FrameLabel::A, FrameLabel::B, FrameLabel::C]
    }

    #[inline]
    pub fn frame_label(&self) -> FrameLabel {
        FrameLabel::from_usize(self.frame_id as usize % Self::fif_count())
    }

    /// 形如 `[F42A]`，用于 debug label
    #[inline]
    pub fn frame_name(&self) -> String {
        format!("[F{}{}]", self.frame_id, self.frame_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cycle_through_fif() {
        let mut counter = FrameCounter::new(1, 60.0);
        let labels: Vec<usize> = (0..6)
            .map(|_| {
                let label = *counter.frame_label();
                counter.next_frame();
                label
            })
            .collect();
        assert_eq!(labels, vec![1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn frame_name_format() {
        let counter = FrameCounter::new(42, 60.0);
        assert_eq!(counter.frame_name(), "[F42A]");
    }

    #[test]
    fn frame_id_wraps() {
        let mut counter = FrameCounter::new(u64::MAX, 60.0);
        counter.next_frame();
        assert_eq!(counter.frame_id(), 0);
    }
}
