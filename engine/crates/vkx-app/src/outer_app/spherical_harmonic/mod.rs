//! 球谐光照
//!
//! compute shader 把天空 cube map 投影到 SH 系数上，然后用系数重建环境光照亮一个球体。
//! 旁边的物体直接采样 cube map 做反射，两者对比可以看出 SH 的低频近似。

use rand::{Rng, SeedableRng, rngs::StdRng};

pub mod sh_project_pass;
pub mod sh_scene_pass;
pub mod spherical_harmonic_app;

/// UBO 中最多能放下的采样对数量，每个 vec4 存放两个 (r1, r2)
pub const MAX_SAMPLE_VEC4: usize = 4048;
pub const MAX_SAMPLES: u32 = (MAX_SAMPLE_VEC4 * 2) as u32;

/// compute shader 的 local size
pub const SH_GROUP_SIZE: u32 = 16;

/// 最高 band，对应 64 个系数
pub const MAX_SH_BAND: u32 = 8;

/// (band, sample count, 0, 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShControl(pub glam::Vec4);

impl ShControl {
    pub fn new(band: u32, sample_count: u32) -> Self {
        Self(glam::vec4(band as f32, sample_count as f32, 0.0, 0.0))
    }

    #[inline]
    pub fn band(&self) -> u32 {
        self.0.x as u32
    }

    /// SH 系数个数，即 band^2
    #[inline]
    pub fn coefficient_count(&self) -> u32 {
        self.band() * self.band()
    }

    /// 每个 invocation 计算一个系数
    #[inline]
    pub fn dispatch_groups(&self) -> u32 {
        self.coefficient_count().div_ceil(SH_GROUP_SIZE)
    }
}

/// 分层抖动采样：单位正方形划分为 sqrt(N) x sqrt(N) 个格子，每个格子内随机取一个点
#[derive(Debug, Clone, PartialEq)]
pub struct ShSampleTable {
    /// xy 为第 2i 个采样，zw 为第 2i+1 个
    pub samples: Vec<glam::Vec4>,
    /// 实际生成的采样数，为 floor(sqrt(N))^2
    pub sample_count: u32,
}

impl ShSampleTable {
    pub fn generate(sample_count: u32, seed: u64) -> Self {
        let sample_count = sample_count.min(MAX_SAMPLES);
        let sqrt_n = (sample_count as f64).sqrt().floor() as u32;
        let one_over_n = 1.0 / sqrt_n.max(1) as f32;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut samples = vec![glam::Vec4::ZERO; MAX_SAMPLE_VEC4];
        for a in 0..sqrt_n {
            for b in 0..sqrt_n {
                let index = (a * sqrt_n + b) as usize;
                let r1 = (a as f32 + rng.r#gen::<f32>()) * one_over_n;
                let r2 = (b as f32 + rng.r#gen::<f32>()) * one_over_n;
                let slot = &mut samples[index / 2];
                if index % 2 == 0 {
                    slot.x = r1;
                    slot.y = r2;
                } else {
                    slot.z = r1;
                    slot.w = r2;
                }
            }
        }

        Self {
            samples,
            sample_count: sqrt_n * sqrt_n,
        }
    }

    /// UBO 的内容：第 0 个元素是 [`ShControl`]，后面是采样
    pub fn uniform_data(&self, band: u32) -> Vec<glam::Vec4> {
        std::iter::once(ShControl::new(band, self.sample_count).0).chain(self.samples.iter().copied()).collect()
    }

    #[inline]
    pub fn sample(&self, i: usize) -> glam::Vec2 {
        let slot = self.samples[i / 2];
        if i % 2 == 0 { glam::vec2(slot.x, slot.y) } else { glam::vec2(slot.z, slot.w) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_counts() {
        let control = ShControl::new(4, 8096);
        assert_eq!(control.coefficient_count(), 16);
        assert_eq!(control.dispatch_groups(), 1);
        assert_eq!(ShControl::new(5, 100).dispatch_groups(), 2);
    }

    #[test]
    fn samples_are_stratified() {
        let table = ShSampleTable::generate(8096, 42);
        // floor(sqrt(8096)) = 89
        assert_eq!(table.sample_count, 89 * 89);
        let n = 89;
        for a in 0..n {
            for b in 0..n {
                let s = table.sample((a * n + b) as usize);
                let cell = glam::vec2(a as f32, b as f32) / n as f32;
                assert!(s.x >= cell.x && s.x <= cell.x + 1.0 / n as f32 + 1e-6);
                assert!(s.y >= cell.y && s.y <= cell.y + 1.0 / n as f32 + 1e-6);
            }
        }
        // 用不到的部分保持为 0
        assert_eq!(table.samples[MAX_SAMPLE_VEC4 - 1], glam::Vec4::ZERO);
    }

    #[test]
    fn seed_is_deterministic() {
        assert_eq!(ShSampleTable::generate(256, 1), ShSampleTable::generate(256, 1));
        assert_ne!(ShSampleTable::generate(256, 1), ShSampleTable::generate(256, 2));
    }

    #[test]
    fn uniform_starts_with_control_and_is_clamped() {
        let table = ShSampleTable::generate(100_000, 3);
        assert!(table.sample_count <= MAX_SAMPLES);
        let data = table.uniform_data(3);
        assert_eq!(data.len(), MAX_SAMPLE_VEC4 + 1);
        assert_eq!(data[0], glam::vec4(3.0, table.sample_count as f32, 0.0, 0.0));
        // 整个 UBO 不超过 64KB
        assert!(data.len() * 16 <= 65536);
    }
}
