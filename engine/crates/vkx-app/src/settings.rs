use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use vkx_crate_tools::resource::VkxPath;

use crate::outer_app::{
    indirect_draw::MAX_INSTANCES_PER_MESH,
    spherical_harmonic::{MAX_SAMPLES, MAX_SH_BAND},
    subsurface::SssMode,
};

/// `resources/demos.toml` 的内容
///
/// 每个 section 都可以缺省，缺省时使用 `Default`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub subsurface: SubsurfaceConfig,
    pub spherical_harmonic: SphericalHarmonicConfig,
    pub indirect: IndirectConfig,
    pub stochastic: StochasticConfig,
    pub postprocess: PostprocessConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// 追加在 demo 名字后面的标题
    pub title_suffix: String,
    pub width: u32,
    pub height: u32,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title_suffix: String::new(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubsurfaceConfig {
    pub mode: SssMode,
    pub sss_strength: f32,
    pub world_scale: f32,
    pub ssss_color: [f32; 3],
    pub ssss_falloff: [f32; 3],
    pub scatter_color: [f32; 3],
    pub scatter_distance: [f32; 3],
}
impl Default for SubsurfaceConfig {
    fn default() -> Self {
        Self {
            mode: SssMode::Burley,
            sss_strength: 1.0,
            world_scale: 1.0,
            ssss_color: [0.8396226, 0.1069331, 0.1069331],
            ssss_falloff: [0.754717, 0.3402277, 0.05],
            scatter_color: [0.3, 0.2, 1.0],
            scatter_distance: [5.0, 5.0, 10.0],
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SphericalHarmonicConfig {
    pub band: u32,
    pub sample_count: u32,
    pub lod_bias: f32,
}
impl Default for SphericalHarmonicConfig {
    fn default() -> Self {
        Self {
            band: 4,
            sample_count: 8096,
            lod_bias: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndirectConfig {
    pub instances_per_mesh: u32,
    pub plant_radius: f32,
}
impl Default for IndirectConfig {
    fn default() -> Self {
        Self {
            instances_per_mesh: 2048,
            plant_radius: 25.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StochasticConfig {
    pub use_fis: bool,
    /// 每帧 UBO 中 time 的增量
    pub time_step: f32,
}
impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            use_fis: true,
            time_step: 0.016,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostprocessConfig {
    pub tint: [f32; 3],
}
impl Default for PostprocessConfig {
    fn default() -> Self {
        Self { tint: [1.0, 1.0, 1.0] }
    }
}

impl DemoConfig {
    pub const FILE_NAME: &'static str = "demos.toml";

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("failed to parse demo config")?;
        Ok(config.clamped())
    }

    /// 把会导致空 buffer 或整数溢出的取值限制到可用范围内
    fn clamped(mut self) -> Self {
        let sh = &mut self.spherical_harmonic;
        sh.band = clamp_with_warn("spherical_harmonic.band", sh.band, 1, MAX_SH_BAND);
        sh.sample_count = clamp_with_warn("spherical_harmonic.sample_count", sh.sample_count, 1, MAX_SAMPLES);

        let indirect = &mut self.indirect;
        indirect.instances_per_mesh =
            clamp_with_warn("indirect.instances_per_mesh", indirect.instances_per_mesh, 1, MAX_INSTANCES_PER_MESH);

        self
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read demo config: {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("invalid demo config: {}", path.display()))
    }

    /// 读取 `resources/demos.toml`，失败时退回默认值
    pub fn load() -> Self {
        let path = VkxPath::resources_path(Self::FILE_NAME);
        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("demo config loaded from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("use default demo config: {:#}", e);
                Self::default()
            }
        }
    }
}

fn clamp_with_warn(key: &str, value: u32, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("{} = {} is out of range [{}, {}], use {}", key, value, min, max, clamped);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        outer_app::{indirect_draw::IndirectCommands, spherical_harmonic::ShControl},
        scene::mesh::MeshRange,
    };

    #[test]
    fn missing_sections_use_default() {
        let config = DemoConfig::from_toml_str(
            r#"
            [window]
            width = 800

            [indirect]
            plant_radius = 10.0
            "#,
        )
        .unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.indirect.plant_radius, 10.0);
        assert_eq!(config.indirect.instances_per_mesh, 2048);
        assert_eq!(config.subsurface, SubsurfaceConfig::default());
        assert_eq!(config.spherical_harmonic.band, 4);
    }

    #[test]
    fn subsurface_mode_is_lowercase() {
        let config = DemoConfig::from_toml_str(
            r#"
            [subsurface]
            mode = "preintegrate"
            scatter_color = [0.5, 0.25, 1.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.subsurface.mode, SssMode::Preintegrate);
        assert_eq!(config.subsurface.scatter_color, [0.5, 0.25, 1.0]);
        assert_eq!(config.subsurface.scatter_distance, [5.0, 5.0, 10.0]);
    }

    #[test]
    fn bad_value_is_error() {
        assert!(DemoConfig::from_toml_str("[stochastic]\nuse_fis = 3").is_err());
        assert!(DemoConfig::from_toml_str("[subsurface]\nmode = \"gauss\"").is_err());
    }

    #[test]
    fn zero_band_is_raised_to_one() {
        let config = DemoConfig::from_toml_str("[spherical_harmonic]\nband = 0\nsample_count = 0").unwrap();
        assert_eq!(config.spherical_harmonic.band, 1);
        assert_eq!(config.spherical_harmonic.sample_count, 1);

        let control = ShControl::new(config.spherical_harmonic.band, config.spherical_harmonic.sample_count);
        assert_eq!(control.coefficient_count(), 1);
        assert_eq!(control.dispatch_groups(), 1);
    }

    #[test]
    fn oversized_sh_values_are_clamped() {
        let config =
            DemoConfig::from_toml_str("[spherical_harmonic]\nband = 1000\nsample_count = 4000000000").unwrap();
        assert_eq!(config.spherical_harmonic.band, MAX_SH_BAND);
        assert_eq!(config.spherical_harmonic.sample_count, MAX_SAMPLES);
    }

    #[test]
    fn instances_per_mesh_is_bounded() {
        let config = DemoConfig::from_toml_str("[indirect]\ninstances_per_mesh = 0").unwrap();
        assert_eq!(config.indirect.instances_per_mesh, 1);

        let config = DemoConfig::from_toml_str("[indirect]\ninstances_per_mesh = 4294967295").unwrap();
        assert_eq!(config.indirect.instances_per_mesh, MAX_INSTANCES_PER_MESH);

        // 三种植物时实例总数与随机数个数都不溢出
        let range = MeshRange {
            first_index: 0,
            index_count: 6,
            vertex_offset: 0,
        };
        let ranges = vec![range; 3];
        let commands = IndirectCommands::build(&ranges, config.indirect.instances_per_mesh);
        assert_eq!(commands.object_count, 3 * MAX_INSTANCES_PER_MESH);
        assert_eq!(commands.commands[2].first_instance, 2 * MAX_INSTANCES_PER_MESH);
        assert!(commands.object_count.checked_mul(4).is_some());
    }

    #[test]
    fn in_range_values_are_kept() {
        let config = DemoConfig::from_toml_str("[spherical_harmonic]\nband = 3\n[indirect]\ninstances_per_mesh = 64")
            .unwrap();
        assert_eq!(config.spherical_harmonic.band, 3);
        assert_eq!(config.indirect.instances_per_mesh, 64);
    }

    #[test]
    fn missing_file_is_error() {
        let err = DemoConfig::from_file(Path::new("/definitely/not/here/demos.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read demo config"));
    }

    #[test]
    fn workspace_config_parses() {
        let path = VkxPath::resources_path(DemoConfig::FILE_NAME);
        let config = DemoConfig::from_file(&path).unwrap();
        assert_eq!(config.stochastic.time_step, 0.016);
    }
}
