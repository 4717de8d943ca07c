//! 延迟渲染 + 次表面散射
//!
//! 一帧分为四个阶段，每个阶段一个 command buffer，通过 semaphore 串联：
//! G-buffer -> lighting -> blur -> composite
//!
//! blur 有两种实现：屏幕空间的可分离高斯模糊 (SSSS) 和 Burley 扩散剖面。
//! Preintegrate 模式不走延迟管线，而是用 compute shader 生成预积分 LUT 后直接展示。

use serde::Deserialize;

pub mod blur_pass;
pub mod burley;
pub mod composite_pass;
pub mod gbuffer_pass;
pub mod lighting_pass;
pub mod preintegrate;
pub mod ssss_kernel;
pub mod subsurface_app;

/// G-buffer 和 blur target 使用固定大小，与窗口无关
pub const GBUFFER_DIM: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SssMode {
    #[default]
    Burley,
    Ssss,
    Preintegrate,
}
impl SssMode {
    pub const ALL: [Self; 3] = [Self::Burley, Self::Ssss, Self::Preintegrate];

    pub fn label(self) -> &'static str {
        match self {
            Self::Burley => "Burley",
            Self::Ssss => "SSSS",
            Self::Preintegrate => "Preintegrate",
        }
    }
}

/// composite 阶段输出的内容，数值与 shader 中的 `debugDisplayTarget` 一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum DebugTarget {
    #[default]
    Final = 0,
    Position = 1,
    Normals = 2,
    Albedo = 3,
    Specular = 4,
}
impl DebugTarget {
    pub const ALL: [Self; 5] = [Self::Final, Self::Position, Self::Normals, Self::Albedo, Self::Specular];

    pub fn label(self) -> &'static str {
        match self {
            Self::Final => "Final composition",
            Self::Position => "Position",
            Self::Normals => "Normals",
            Self::Albedo => "Albedo",
            Self::Specular => "Specular",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_target_matches_shader_values() {
        for (i, target) in DebugTarget::ALL.iter().enumerate() {
            assert_eq!(*target as i32, i as i32);
        }
        assert_eq!(DebugTarget::default().label(), "Final composition");
    }

    #[test]
    fn mode_labels_are_distinct() {
        let labels = SssMode::ALL.map(SssMode::label);
        assert_eq!(labels, ["Burley", "SSSS", "Preintegrate"]);
    }
}
