//! 可分离的屏幕空间次表面散射 (Separable SSS) 的卷积核

use crate::outer_app::subsurface::GBUFFER_DIM;
use crate::platform::camera::Camera;

/// kernel 的采样数，与 shader 中的 `SSSS_SAMPLES` 一致
pub const SSSS_SAMPLES: usize = 25;

/// 五个高斯之和拟合的皮肤扩散剖面
fn profile(r: f32, falloff: glam::Vec3) -> glam::Vec3 {
    let gaussian = |variance: f32| {
        let g = |falloff: f32| {
            let rr = r / (0.001 + falloff);
            (-(rr * rr) / (2.0 * variance)).exp() / (2.0 * 3.14 * variance)
        };
        glam::Vec3::new(g(falloff.x), g(falloff.y), g(falloff.z))
    };
    0.100 * gaussian(0.0484)
        + 0.118 * gaussian(0.187)
        + 0.113 * gaussian(0.567)
        + 0.358 * gaussian(1.99)
        + 0.078 * gaussian(7.41)
}

/// rgb 为各通道的权重，a 为采样偏移（单位：mm 量级，由 shader 换算到屏幕空间）
///
/// 第 0 个元素是中心点
#[derive(Debug, Clone, PartialEq)]
pub struct SsssKernel {
    pub samples: [glam::Vec4; SSSS_SAMPLES],
}

impl SsssKernel {
    pub fn compute(color: glam::Vec3, falloff: glam::Vec3) -> Self {
        let n = SSSS_SAMPLES;
        let range = if n > 20 { 3.0 } else { 2.0 };
        let exponent = 2.0;
        let step = 2.0 * range / (n - 1) as f32;

        // 偏移在中心附近更密
        let offsets: Vec<f32> = (0..n)
            .map(|i| {
                let o = -range + i as f32 * step;
                range * o.signum() * o.abs().powf(exponent) / range.powf(exponent)
            })
            .collect();

        let mut samples = [glam::Vec4::ZERO; SSSS_SAMPLES];
        for (i, sample) in samples.iter_mut().enumerate() {
            let w0 = if i > 0 { (offsets[i] - offsets[i - 1]).abs() } else { 0.0 };
            let w1 = if i < n - 1 { (offsets[i] - offsets[i + 1]).abs() } else { 0.0 };
            let area = (w0 + w1) * 0.5;
            *sample = (area * profile(offsets[i], falloff)).extend(offsets[i]);
        }

        // 中心点放到最前面
        samples[..=n / 2].rotate_right(1);

        let sum = samples.iter().fold(glam::Vec3::ZERO, |acc, s| acc + s.truncate());
        for s in &mut samples {
            *s = (s.truncate() / sum).extend(s.w);
        }

        // 中心点保留 (1 - color) 的原始光照
        let center = samples[0];
        samples[0] = ((glam::Vec3::ONE - color) + color * center.truncate()).extend(center.w);
        for s in &mut samples[1..] {
            *s = (s.truncate() * color).extend(s.w);
        }

        Self { samples }
    }
}

/// blur pass 的 uniform buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SsssParams {
    /// (strength, 1 / tan(fov / 2), 300 / tan(fov / 2), aspect)
    pub props: glam::Vec4,
    pub depth_texel_size: glam::Vec4,
    /// (near, far - near, 0, 0)
    pub z_near_far: glam::Vec4,
    pub kernel: [glam::Vec4; SSSS_SAMPLES],
}

impl SsssParams {
    pub fn new(kernel: &SsssKernel, strength: f32, camera: &Camera) -> Self {
        let distance_to_projection_window = 1.0 / (0.5 * camera.fov_deg_vertical.to_radians()).tan();
        let dim = GBUFFER_DIM as f32;
        Self {
            props: glam::vec4(
                strength,
                distance_to_projection_window,
                300.0 * distance_to_projection_window,
                camera.asp,
            ),
            depth_texel_size: glam::vec4(1.0 / dim, 1.0 / dim, dim, dim),
            z_near_far: glam::vec4(camera.near, camera.far - camera.near, 0.0, 0.0),
            kernel: kernel.samples,
        }
    }
}

/// 可分离模糊的方向，通过 push constant 传入
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SsssDirection {
    pub dir: glam::Vec2,
}
impl SsssDirection {
    pub const X: Self = Self { dir: glam::Vec2::X };
    pub const Y: Self = Self { dir: glam::Vec2::Y };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_kernel() -> SsssKernel {
        SsssKernel::compute(glam::vec3(0.8396226, 0.1069331, 0.1069331), glam::vec3(0.754717, 0.3402277, 0.05))
    }

    #[test]
    fn center_first_and_offsets_symmetric() {
        let kernel = default_kernel();
        assert_eq!(kernel.samples[0].w, 0.0);
        // 去掉中心后剩下的偏移仍然是单调的
        let offsets: Vec<f32> = kernel.samples[1..].iter().map(|s| s.w).collect();
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        assert!((offsets[0] + 3.0).abs() < 1e-5);
        assert!((offsets[SSSS_SAMPLES - 2] - 3.0).abs() < 1e-5);
        for i in 0..12 {
            assert!((offsets[i] + offsets[SSSS_SAMPLES - 2 - i]).abs() < 1e-5);
        }
    }

    #[test]
    fn weights_sum_to_one_after_tint() {
        // 归一化之后再乘 color，中心补上 1 - color，因此每个通道之和仍为 1
        let kernel = default_kernel();
        let sum = kernel.samples.iter().fold(glam::Vec3::ZERO, |acc, s| acc + s.truncate());
        assert!((sum - glam::Vec3::ONE).abs().max_element() < 1e-4);
    }

    #[test]
    fn zero_color_is_identity() {
        let kernel = SsssKernel::compute(glam::Vec3::ZERO, glam::Vec3::ONE);
        assert!((kernel.samples[0].truncate() - glam::Vec3::ONE).abs().max_element() < 1e-6);
        assert!(kernel.samples[1..].iter().all(|s| s.truncate() == glam::Vec3::ZERO));
    }

    #[test]
    fn red_channel_spreads_wider() {
        // falloff 越大，远处的权重越高
        let kernel = SsssKernel::compute(glam::Vec3::ONE, glam::vec3(0.754717, 0.3402277, 0.05));
        let edge = kernel.samples[1];
        assert!(edge.x > edge.y);
        assert!(edge.y > edge.z);
    }

    #[test]
    fn params_layout() {
        assert_eq!(size_of::<SsssParams>(), 16 * (3 + SSSS_SAMPLES));
        let camera = Camera {
            fov_deg_vertical: 90.0,
            asp: 1.5,
            near: 0.1,
            far: 256.0,
            ..Default::default()
        };
        let params = SsssParams::new(&default_kernel(), 0.5, &camera);
        assert!((params.props - glam::vec4(0.5, 1.0, 300.0, 1.5)).abs().max_element() < 1e-4);
        assert!((params.z_near_far.y - 255.9).abs() < 1e-4);
        assert_eq!(params.depth_texel_size.z, 2048.0);
    }
}
