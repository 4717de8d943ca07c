use std::f32::consts::PI;

/// 与 shader 中的 `PointLight` 对应，std140 下 32 字节
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLight {
    pub position: glam::Vec4,
    pub color: glam::Vec3,
    pub radius: f32,
}

impl PointLight {
    const fn new(position: glam::Vec3, color: glam::Vec3, radius: f32) -> Self {
        Self {
            position: glam::Vec4::new(position.x, position.y, position.z, 0.0),
            color,
            radius,
        }
    }
}

pub const LIGHT_COUNT: usize = 6;

/// 初始状态，y 坐标在动画过程中保持不变
pub const INITIAL_LIGHTS: [PointLight; LIGHT_COUNT] = [
    PointLight::new(glam::Vec3::new(0.0, 0.0, 1.0), glam::Vec3::splat(1.5), 3.75),
    PointLight::new(glam::Vec3::new(-2.0, 0.0, 0.0), glam::Vec3::new(1.0, 0.0, 0.0), 15.0),
    PointLight::new(glam::Vec3::new(2.0, -1.0, 0.0), glam::Vec3::new(0.0, 0.0, 2.5), 5.0),
    PointLight::new(glam::Vec3::new(0.0, -0.9, 0.5), glam::Vec3::new(1.0, 1.0, 0.0), 2.0),
    PointLight::new(glam::Vec3::new(0.0, -0.5, 0.0), glam::Vec3::new(0.0, 1.0, 0.2), 5.0),
    PointLight::new(glam::Vec3::new(0.0, -1.0, 0.0), glam::Vec3::new(1.0, 0.7, 0.3), 25.0),
];

/// 动画一个周期所需的秒数
pub const LIGHT_CYCLE_SECONDS: f32 = 4.0;

/// 将运行时间转换为 [0, 1) 的周期进度
#[inline]
pub fn light_cycle(total_time_s: f32) -> f32 {
    (total_time_s / LIGHT_CYCLE_SECONDS).fract()
}

/// `t` 为周期进度，光源在 XZ 平面上绕圈
///
/// light 3 保持静止
pub fn animate_lights(t: f32) -> [PointLight; LIGHT_COUNT] {
    let a = 2.0 * PI * t;
    let deg = 360.0 * t;
    let xz = [
        Some((a.sin() * 5.0, a.cos() * 5.0)),
        // 相位偏移 45 按弧度计
        Some((-4.0 + (a + 45.0).sin() * 2.0, (a + 45.0).cos() * 2.0)),
        Some((4.0 + a.sin() * 2.0, a.cos() * 2.0)),
        None,
        Some(((deg + 90.0).to_radians().sin() * 5.0, -(deg + 45.0).to_radians().cos() * 5.0)),
        Some(((-deg + 135.0).to_radians().sin() * 10.0, -(-deg - 45.0).to_radians().cos() * 10.0)),
    ];

    let mut lights = INITIAL_LIGHTS;
    for (light, xz) in lights.iter_mut().zip(xz) {
        if let Some((x, z)) = xz {
            light.position.x = x;
            light.position.z = z;
        }
    }
    lights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_layout_is_32_bytes() {
        assert_eq!(size_of::<PointLight>(), 32);
        assert_eq!(std::mem::offset_of!(PointLight, color), 16);
        assert_eq!(std::mem::offset_of!(PointLight, radius), 28);
    }

    #[test]
    fn light0_circles_at_radius_5() {
        let l = animate_lights(0.0)[0];
        assert!((l.position - glam::vec4(0.0, 0.0, 5.0, 0.0)).length() < 1e-5);
        let l = animate_lights(0.25)[0];
        assert!((l.position - glam::vec4(5.0, 0.0, 0.0, 0.0)).length() < 1e-4);
        assert_eq!(l.radius, 3.75);
        assert_eq!(l.color, glam::Vec3::splat(1.5));
    }

    #[test]
    fn heights_and_static_light_are_kept() {
        for t in [0.0, 0.3, 0.77] {
            let lights = animate_lights(t);
            for (l, init) in lights.iter().zip(INITIAL_LIGHTS.iter()) {
                assert_eq!(l.position.y, init.position.y);
                assert_eq!(l.color, init.color);
            }
            assert_eq!(lights[3], INITIAL_LIGHTS[3]);
        }
    }

    #[test]
    fn orbit_centers() {
        // 在一个周期上取平均，得到圆心
        let n = 360;
        let mut sum = [glam::Vec2::ZERO; LIGHT_COUNT];
        for i in 0..n {
            for (s, l) in sum.iter_mut().zip(animate_lights(i as f32 / n as f32)) {
                *s += glam::vec2(l.position.x, l.position.z);
            }
        }
        let center = |i: usize| sum[i] / n as f32;
        assert!(center(0).length() < 1e-3);
        assert!((center(1) - glam::vec2(-4.0, 0.0)).length() < 1e-3);
        assert!((center(2) - glam::vec2(4.0, 0.0)).length() < 1e-3);
        assert!(center(5).length() < 1e-2);
    }

    #[test]
    fn cycle_wraps() {
        assert_eq!(light_cycle(0.0), 0.0);
        assert!((light_cycle(LIGHT_CYCLE_SECONDS * 2.5) - 0.5).abs() < 1e-5);
    }
}
