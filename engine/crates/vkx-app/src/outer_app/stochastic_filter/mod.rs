//! 放大一张小纹理，对比两种重建滤波：
//!
//! - Catmull-Rom：每个像素 4x4 次 texel fetch
//! - FIS (filter importance sampling)：每个轴按 |w| 随机选一个 texel，每个像素只 fetch 一次，
//!   噪声随帧号变化，多帧平均后收敛到 Catmull-Rom 的结果

pub mod stochastic_filter_app;
pub mod stochastic_pass;

/// 一个 texel 在屏幕上占据的像素数
pub const MAGNIFICATION: f32 = 8.0;

/// 与 shader 中的 `uniform Params { vec4 random_params; }` 一致
///
/// x: 帧号，y: 时间，z: 放大倍数
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RandomParams(pub glam::Vec4);

impl RandomParams {
    #[inline]
    pub fn frame_number(&self) -> u32 {
        self.0.x as u32
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.0.y
    }
}

/// 每帧推进一次的随机参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    frame_number: u32,
    time: f32,
    time_step: f32,
}
impl FrameClock {
    pub fn new(time_step: f32) -> Self {
        Self {
            frame_number: 0,
            time: 0.0,
            time_step,
        }
    }

    /// 帧号加一，时间前进一个固定步长，返回新的参数
    pub fn advance(&mut self) -> RandomParams {
        self.frame_number += 1;
        self.time += self.time_step;
        self.params()
    }

    pub fn params(&self) -> RandomParams {
        RandomParams(glam::vec4(self.frame_number as f32, self.time, MAGNIFICATION, 0.0))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    Fis,
    CatmullRom,
}
impl FilterMode {
    pub fn from_use_fis(use_fis: bool) -> Self {
        if use_fis { Self::Fis } else { Self::CatmullRom }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fis => "stochastic-fis",
            Self::CatmullRom => "stochastic-catmull-rom",
        }
    }

    pub fn fragment_shader(self) -> &'static str {
        match self {
            Self::Fis => "stochastic/fis.frag",
            Self::CatmullRom => "stochastic/catmull_rom.frag",
        }
    }
}

/// texel 中心之间的小数位置 `t` 处，4 个相邻 texel 的 Catmull-Rom 权重，总和为 1
pub fn catmull_rom_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

/// 按 |w| 的分布选出一个 tap，`u` 在 [0, 1) 内
///
/// 返回 tap 的下标以及需要乘上的系数 `sign(w) * sum(|w|)`，期望等于按权重求和
pub fn fis_select(weights: [f32; 4], u: f32) -> (usize, f32) {
    let total: f32 = weights.iter().map(|w| w.abs()).sum();
    let target = u * total;
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w.abs();
        if target < acc {
            return (i, w.signum() * total);
        }
    }
    (3, weights[3].signum() * total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catmull_rom_is_interpolating() {
        for t in [0.0, 0.25, 0.5, 0.9] {
            let sum: f32 = catmull_rom_weights(t).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
        // t = 0 时完全落在第二个 texel 上
        assert_eq!(catmull_rom_weights(0.0), [0.0, 1.0, 0.0, 0.0]);
        let w = catmull_rom_weights(0.5);
        assert!(w[0] < 0.0 && w[3] < 0.0);
        assert!((w[1] - w[2]).abs() < 1e-6);
    }

    #[test]
    fn fis_is_unbiased() {
        let weights = catmull_rom_weights(0.3);
        let texels = [0.2, 0.8, 0.4, 1.0];
        let expected: f32 = weights.iter().zip(texels).map(|(w, v)| w * v).sum();

        let n = 4096;
        let estimate: f32 = (0..n)
            .map(|i| {
                let (idx, scale) = fis_select(weights, (i as f32 + 0.5) / n as f32);
                scale * texels[idx]
            })
            .sum::<f32>()
            / n as f32;
        assert!((estimate - expected).abs() < 5e-3);
    }

    #[test]
    fn fis_never_selects_zero_weight() {
        let weights = catmull_rom_weights(0.0);
        for i in 0..16 {
            let (idx, scale) = fis_select(weights, i as f32 / 16.0);
            assert_eq!(idx, 1);
            assert_eq!(scale, 1.0);
        }
    }

    #[test]
    fn clock_advances_per_frame() {
        let mut clock = FrameClock::new(0.016);
        assert_eq!(clock.params().frame_number(), 0);
        clock.advance();
        let params = clock.advance();
        assert_eq!(params.frame_number(), 2);
        assert!((params.time() - 0.032).abs() < 1e-6);
        assert_eq!(params.0.z, MAGNIFICATION);
        assert_eq!(size_of::<RandomParams>(), 16);
    }

    #[test]
    fn filter_mode_follows_flag() {
        assert_eq!(FilterMode::from_use_fis(true), FilterMode::Fis);
        assert_eq!(FilterMode::from_use_fis(false), FilterMode::CatmullRom);
        assert_ne!(FilterMode::Fis.fragment_shader(), FilterMode::CatmullRom.fragment_shader());
    }
}
