//! Burley 归一化扩散剖面的重要性采样表
//!
//! R(r) = s (e^{-sr} + e^{-sr/3}) / (8 pi r)，CDF(r) = 1 - e^{-sr} / 4 - 3 e^{-sr/3} / 4

use std::f32::consts::PI;

use crate::outer_app::subsurface::GBUFFER_DIM;
use crate::platform::camera::Camera;

/// 采样数为 `BURLEY_VEC4_COUNT * 4`
pub const BURLEY_VEC4_COUNT: usize = 8;
pub const BURLEY_SAMPLES: usize = BURLEY_VEC4_COUNT * 4;

/// 覆盖 99.7% 能量的半径作为滤波半径
const MAX_CDF: f32 = 0.997;

/// 默认的 shape 参数 S
pub const DEFAULT_SHAPE: glam::Vec3 = glam::Vec3::new(0.026, 0.011, 0.006);

const GOLDEN_RATIO: f32 = 1.618033988749895;

/// CDF 的反函数：给定累积概率 `u`，返回 `r * s`，再乘以 `rcp_s` 得到半径
fn sample_radius(u: f32, rcp_s: f32) -> f32 {
    sample_profile(u, rcp_s).0
}

/// return: (r, 1 / pdf)
fn sample_profile(u: f32, rcp_s: f32) -> (f32, f32) {
    // CDF 转为 CCDF
    let u = 1.0 - u;
    let g = 1.0 + (4.0 * u) * (2.0 * u + (1.0 + (4.0 * u) * u).sqrt());
    let n = g.powf(-1.0 / 3.0);
    let p = g * n * n;
    let c = 1.0 + p + n;
    let x = 3.0 * (c / (4.0 * u)).ln();

    // 1 / (e^{-x} + e^{-x/3})
    let rcp_exp = (c * c * c) / ((4.0 * u) * (c * c + (4.0 * u) * (4.0 * u)));
    (x * rcp_s, 8.0 * PI * rcp_s * rcp_exp)
}

/// 黄金角序列，返回 [0, 2 pi) 内的角度
#[inline]
fn golden_angle(i: usize) -> f32 {
    2.0 * PI * (i as f32 / GOLDEN_RATIO).fract()
}

/// 以 vec4 打包的采样表，第 i 个采样位于 `[i / 4][i % 4]`
#[derive(Debug, Clone, PartialEq)]
pub struct BurleyTable {
    pub radius: [glam::Vec4; BURLEY_VEC4_COUNT],
    pub rcp_pdf: [glam::Vec4; BURLEY_VEC4_COUNT],
    pub sin_phi: [glam::Vec4; BURLEY_VEC4_COUNT],
    pub cos_phi: [glam::Vec4; BURLEY_VEC4_COUNT],
    pub max_filter_radius: f32,
    /// (1 / S, max(S))
    pub shape_params: glam::Vec4,
}

impl BurleyTable {
    pub fn compute(shape: glam::Vec3) -> Self {
        let rcp_s = (glam::Vec3::ONE / shape).min(glam::Vec3::splat(16777216.0));
        // 对散射距离最大的通道做重要性采样
        let max_dist = shape.max_element();
        let max_filter_radius = sample_radius(MAX_CDF, max_dist);

        let mut table = Self {
            radius: [glam::Vec4::ZERO; BURLEY_VEC4_COUNT],
            rcp_pdf: [glam::Vec4::ZERO; BURLEY_VEC4_COUNT],
            sin_phi: [glam::Vec4::ZERO; BURLEY_VEC4_COUNT],
            cos_phi: [glam::Vec4::ZERO; BURLEY_VEC4_COUNT],
            max_filter_radius,
            shape_params: rcp_s.extend(max_dist),
        };

        let scale = 1.0 / BURLEY_SAMPLES as f32;
        for i in 0..BURLEY_SAMPLES {
            let (r, rcp_pdf) = sample_profile(i as f32 * scale + 0.5 * scale, max_dist);
            let (sin_phi, cos_phi) = golden_angle(i).sin_cos();
            let (v, c) = (i / 4, i % 4);
            table.radius[v][c] = r;
            table.rcp_pdf[v][c] = rcp_pdf;
            table.sin_phi[v][c] = sin_phi;
            table.cos_phi[v][c] = cos_phi;
        }
        table
    }

    #[inline]
    pub fn sample(&self, i: usize) -> (f32, f32, f32, f32) {
        let (v, c) = (i / 4, i % 4);
        (self.radius[v][c], self.rcp_pdf[v][c], self.sin_phi[v][c], self.cos_phi[v][c])
    }
}

/// Burley blur pass 的 uniform buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BurleyParams {
    pub inv_proj: glam::Mat4,
    pub depth_texel_size: glam::Vec4,
    /// (max filter radius, world scale, 0, 0)
    pub burley_params: glam::Vec4,
    pub shape_params: glam::Vec4,
    /// (near, far - near, 1 - far / near, far / near)
    pub z_params: glam::Vec4,
    pub sample_r: [glam::Vec4; BURLEY_VEC4_COUNT],
    pub sample_rcp_pdf: [glam::Vec4; BURLEY_VEC4_COUNT],
    pub sample_sin_phi: [glam::Vec4; BURLEY_VEC4_COUNT],
    pub sample_cos_phi: [glam::Vec4; BURLEY_VEC4_COUNT],
}

impl BurleyParams {
    pub fn new(table: &BurleyTable, world_scale: f32, camera: &Camera) -> Self {
        let (near, far) = (camera.near, camera.far);
        let dim = GBUFFER_DIM as f32;
        Self {
            inv_proj: camera.get_projection_matrix().inverse(),
            depth_texel_size: glam::vec4(1.0 / dim, 1.0 / dim, dim, dim),
            burley_params: glam::vec4(table.max_filter_radius, world_scale, 0.0, 0.0),
            shape_params: table.shape_params,
            z_params: glam::vec4(near, far - near, 1.0 - far / near, far / near),
            sample_r: table.radius,
            sample_rcp_pdf: table.rcp_pdf,
            sample_sin_phi: table.sin_phi,
            sample_cos_phi: table.cos_phi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdf(r: f32, s: f32) -> f32 {
        1.0 - 0.25 * (-s * r).exp() - 0.75 * (-s * r / 3.0).exp()
    }

    #[test]
    fn sample_inverts_cdf() {
        // rcp_s = 1 时得到的是 s * r
        for u in [0.1f32, 0.5, 0.9, 0.997] {
            let x = sample_radius(u, 1.0);
            assert!((cdf(x, 1.0) - u).abs() < 1e-4, "u = {}, cdf = {}", u, cdf(x, 1.0));
        }
    }

    #[test]
    fn radius_grows_with_u() {
        let table = BurleyTable::compute(DEFAULT_SHAPE);
        let radii: Vec<f32> = (0..BURLEY_SAMPLES).map(|i| table.sample(i).0).collect();
        assert!(radii.windows(2).all(|w| w[0] < w[1]));
        assert!(radii[BURLEY_SAMPLES - 1] < table.max_filter_radius);
        assert!(radii.iter().all(|r| *r > 0.0));
    }

    #[test]
    fn phases_are_on_unit_circle() {
        let table = BurleyTable::compute(DEFAULT_SHAPE);
        for i in 0..BURLEY_SAMPLES {
            let (_, rcp_pdf, s, c) = table.sample(i);
            assert!((s * s + c * c - 1.0).abs() < 1e-5);
            assert!(rcp_pdf > 0.0);
        }
        // 第 0 个采样的角度为 0
        assert_eq!(table.sample(0).3, 1.0);
    }

    #[test]
    fn shape_params() {
        let table = BurleyTable::compute(DEFAULT_SHAPE);
        assert_eq!(table.shape_params.w, 0.026);
        assert!((table.shape_params.x - 1.0 / 0.026).abs() < 1e-3);

        // 过小的 shape 会被截断
        let table = BurleyTable::compute(glam::vec3(1e-9, 1.0, 1.0));
        assert_eq!(table.shape_params.x, 16777216.0);
    }

    #[test]
    fn params_layout_and_z() {
        assert_eq!(size_of::<BurleyParams>(), 64 + 16 * 4 + 16 * 4 * BURLEY_VEC4_COUNT);
        let camera = Camera {
            near: 0.1,
            far: 256.0,
            ..Default::default()
        };
        let params = BurleyParams::new(&BurleyTable::compute(DEFAULT_SHAPE), 2.0, &camera);
        assert_eq!(params.burley_params.y, 2.0);
        assert!((params.z_params.w - 2560.0).abs() < 1e-2);
        assert!((params.z_params.z + 2559.0).abs() < 1e-2);
    }
}
