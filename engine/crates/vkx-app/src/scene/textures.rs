//! 程序化生成的 RGBA8 像素数据，可以直接交给 `GfxTexture2D::from_rgba8` 上传

use rand::{Rng, SeedableRng, rngs::StdRng};

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// 黑白棋盘格，每个格子边长 `cell` 像素
pub fn checker_rgba8(size: u32, cell: u32, dark: [u8; 4], light: [u8; 4]) -> Vec<u8> {
    assert!(cell > 0);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let odd = ((x / cell) + (y / cell)) % 2 == 1;
            pixels.extend_from_slice(if odd { &light } else { &dark });
        }
    }
    pixels
}

/// 可平铺的 value noise，`octaves` 层叠加，结果归一化到 [0, 1]
///
/// 每个通道使用不同的 lattice，alpha 固定为 255
pub fn value_noise_rgba8(size: u32, octaves: u32, seed: u64) -> Vec<u8> {
    assert!(size.is_power_of_two() && octaves > 0);

    let mut rng = StdRng::seed_from_u64(seed);
    // 每个 octave 的晶格分辨率翻倍，最粗一层 4x4
    let lattices: Vec<Vec<[f32; 3]>> = (0..octaves)
        .map(|o| {
            let res = 4u32 << o;
            (0..res * res).map(|_| [rng.r#gen(), rng.r#gen(), rng.r#gen()]).collect()
        })
        .collect();

    let smooth = |t: f32| t * t * (3.0 - 2.0 * t);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let mut acc = [0.0f32; 3];
            let mut amp_sum = 0.0;
            for (o, lattice) in lattices.iter().enumerate() {
                let res = 4u32 << o;
                let amp = 0.5f32.powi(o as i32);
                let fx = x as f32 / size as f32 * res as f32;
                let fy = y as f32 / size as f32 * res as f32;
                let (x0, y0) = (fx.floor() as u32 % res, fy.floor() as u32 % res);
                // 取模保证首尾相接
                let (x1, y1) = ((x0 + 1) % res, (y0 + 1) % res);
                let (tx, ty) = (smooth(fx.fract()), smooth(fy.fract()));
                for c in 0..3 {
                    let v00 = lattice[(y0 * res + x0) as usize][c];
                    let v10 = lattice[(y0 * res + x1) as usize][c];
                    let v01 = lattice[(y1 * res + x0) as usize][c];
                    let v11 = lattice[(y1 * res + x1) as usize][c];
                    let top = v00 + (v10 - v00) * tx;
                    let bottom = v01 + (v11 - v01) * tx;
                    acc[c] += amp * (top + (bottom - top) * ty);
                }
                amp_sum += amp;
            }
            pixels.extend_from_slice(&[
                to_u8(acc[0] / amp_sum),
                to_u8(acc[1] / amp_sum),
                to_u8(acc[2] / amp_sum),
                255,
            ]);
        }
    }
    pixels
}

/// 每个像素独立的随机值，偏蓝色调
pub fn random_rgba8(size: u32, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..size * size)
        .flat_map(|_| {
            let v: f32 = rng.r#gen();
            [to_u8(v * 0.4), to_u8(v * 0.6), to_u8(0.3 + v * 0.7), 255]
        })
        .collect()
}

/// cube map 第 `face` 个面上纹理坐标 `(s, t)`（范围 [-1, 1]）对应的方向
///
/// 面的顺序和朝向遵循 Vulkan 的 cube map 约定：+X, -X, +Y, -Y, +Z, -Z
pub fn cube_face_direction(face: usize, s: f32, t: f32) -> glam::Vec3 {
    let dir = match face {
        0 => glam::vec3(1.0, -t, -s),
        1 => glam::vec3(-1.0, -t, s),
        2 => glam::vec3(s, 1.0, t),
        3 => glam::vec3(s, -1.0, -t),
        4 => glam::vec3(s, -t, 1.0),
        5 => glam::vec3(-s, -t, -1.0),
        _ => panic!("cube face index out of range: {}", face),
    };
    dir.normalize()
}

/// 天空渐变：地平线偏白，天顶偏蓝，地面偏棕，+X 方向有一个太阳
pub fn sky_color(dir: glam::Vec3) -> glam::Vec3 {
    const ZENITH: glam::Vec3 = glam::Vec3::new(0.15, 0.35, 0.8);
    const HORIZON: glam::Vec3 = glam::Vec3::new(0.85, 0.85, 0.9);
    const GROUND: glam::Vec3 = glam::Vec3::new(0.3, 0.22, 0.15);

    let base = if dir.y >= 0.0 {
        HORIZON.lerp(ZENITH, dir.y.powf(0.5))
    } else {
        HORIZON.lerp(GROUND, (-dir.y).powf(0.3))
    };
    let sun_dir = glam::vec3(1.0, 0.4, 0.2).normalize();
    let sun = dir.dot(sun_dir).max(0.0).powf(64.0);
    base + glam::vec3(1.0, 0.9, 0.6) * sun
}

/// 6 个面依次排列的天空 cube map
pub fn sky_cubemap_rgba8(face_size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((face_size * face_size * 4 * 6) as usize);
    for face in 0..6 {
        for y in 0..face_size {
            for x in 0..face_size {
                let s = (x as f32 + 0.5) / face_size as f32 * 2.0 - 1.0;
                let t = (y as f32 + 0.5) / face_size as f32 * 2.0 - 1.0;
                let color = sky_color(cube_face_direction(face, s, t));
                pixels.extend_from_slice(&[to_u8(color.x), to_u8(color.y), to_u8(color.z), 255]);
            }
        }
    }
    pixels
}

/// 草叶纹理数组，每一层的颜色和叶片分布不同
///
/// 叶片以外的像素 alpha 为 0，用于 alpha test
pub fn plant_texture_array_rgba8(size: u32, layers: u32, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pixels = vec![0u8; (size * size * 4 * layers) as usize];

    for layer in 0..layers {
        let hue = layer as f32 / layers.max(1) as f32;
        let base = glam::vec3(0.2 + 0.4 * hue, 0.5 + 0.3 * (1.0 - hue), 0.15);
        let layer_pixels = &mut pixels[(layer * size * size * 4) as usize..((layer + 1) * size * size * 4) as usize];

        let blade_cnt = 5 + layer % 4;
        for _ in 0..blade_cnt {
            let root = rng.gen_range(0.2..0.8f32);
            let lean = rng.gen_range(-0.25..0.25f32);
            let height = rng.gen_range(0.6..1.0f32);
            let width = rng.gen_range(0.02..0.05f32);

            for y in 0..size {
                // 图像的第 0 行是叶尖
                let v = 1.0 - (y as f32 + 0.5) / size as f32;
                if v > height {
                    continue;
                }
                let k = v / height;
                let center = root + lean * k * k;
                let half_width = width * (1.0 - k);
                for x in 0..size {
                    let u = (x as f32 + 0.5) / size as f32;
                    if (u - center).abs() <= half_width {
                        let color = base * (0.6 + 0.4 * k);
                        let i = ((y * size + x) * 4) as usize;
                        layer_pixels[i..i + 4].copy_from_slice(&[to_u8(color.x), to_u8(color.y), to_u8(color.z), 255]);
                    }
                }
            }
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(data: &[u8], size: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * size + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    #[test]
    fn checker_alternates_cells() {
        let data = checker_rgba8(8, 2, [0, 0, 0, 255], [255; 4]);
        assert_eq!(data.len(), 8 * 8 * 4);
        assert_eq!(pixel(&data, 8, 0, 0), [0, 0, 0, 255]);
        assert_eq!(pixel(&data, 8, 1, 1), [0, 0, 0, 255]);
        assert_eq!(pixel(&data, 8, 2, 0), [255; 4]);
        assert_eq!(pixel(&data, 8, 2, 2), [0, 0, 0, 255]);
    }

    #[test]
    fn value_noise_is_seeded_and_tileable() {
        let a = value_noise_rgba8(64, 3, 7);
        let b = value_noise_rgba8(64, 3, 7);
        let c = value_noise_rgba8(64, 3, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.chunks_exact(4).all(|p| p[3] == 255));

        // 左右边缘的差异不应该比相邻像素大太多
        for y in 0..64 {
            let left = pixel(&a, 64, 0, y);
            let right = pixel(&a, 64, 63, y);
            for ch in 0..3 {
                assert!((left[ch] as i32 - right[ch] as i32).abs() < 40);
            }
        }
    }

    #[test]
    fn cube_face_centers_point_along_axes() {
        let expected = [
            glam::Vec3::X,
            glam::Vec3::NEG_X,
            glam::Vec3::Y,
            glam::Vec3::NEG_Y,
            glam::Vec3::Z,
            glam::Vec3::NEG_Z,
        ];
        for (face, axis) in expected.into_iter().enumerate() {
            assert!((cube_face_direction(face, 0.0, 0.0) - axis).length() < 1e-6);
        }
        // +Z 面的图像顶部（t = -1）朝向 +Y
        assert!(cube_face_direction(4, 0.0, -1.0).y > 0.0);
        // +Y 面的图像底部（t = 1）朝向 +Z
        assert!(cube_face_direction(2, 0.0, 1.0).z > 0.0);
    }

    #[test]
    fn sky_is_brighter_above_than_below() {
        let up = sky_color(glam::Vec3::Y);
        let down = sky_color(glam::Vec3::NEG_Y);
        assert!(up.z > down.z);
        let data = sky_cubemap_rgba8(16);
        assert_eq!(data.len(), 16 * 16 * 4 * 6);
    }

    #[test]
    fn plant_layers_have_transparent_background() {
        let size = 32;
        let data = plant_texture_array_rgba8(size, 4, 3);
        assert_eq!(data.len(), (size * size * 4 * 4) as usize);
        for layer in data.chunks_exact((size * size * 4) as usize) {
            let opaque = layer.chunks_exact(4).filter(|p| p[3] == 255).count();
            assert!(opaque > 0);
            assert!(opaque < (size * size / 2) as usize);
            // 左上角在叶片之外
            assert_eq!(pixel(layer, size, 0, 0)[3], 0);
        }
    }

    #[test]
    fn random_texture_is_blue_tinted() {
        let data = random_rgba8(16, 1);
        assert!(data.chunks_exact(4).all(|p| p[2] >= p[0]));
    }
}
