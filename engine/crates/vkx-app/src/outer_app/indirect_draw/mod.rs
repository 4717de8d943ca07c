//! indirect draw
//!
//! 每种植物一个 indirect command，所有实例的位置、旋转、缩放由 compute shader 根据随机数生成，
//! 之后作为 per-instance 顶点数据被 graphics 读取。

use std::f32::consts::PI;

use ash::vk;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::scene::mesh::MeshRange;

pub mod indirect_draw_app;
pub mod instance_pass;
pub mod plant_scene_pass;

/// instance compute shader 的 local size
pub const INSTANCE_GROUP_SIZE: u32 = 256;

/// 每种植物的实例数上限，保证实例总数与随机数个数都不会溢出 u32
pub const MAX_INSTANCES_PER_MESH: u32 = 1 << 16;

/// 与 `VkDrawIndexedIndirectCommand` 的内存布局一致
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawIndexedIndirect {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub first_instance: u32,
}
const _: () = assert!(size_of::<DrawIndexedIndirect>() == size_of::<vk::DrawIndexedIndirectCommand>());

#[derive(Debug, Clone, PartialEq)]
pub struct IndirectCommands {
    pub commands: Vec<DrawIndexedIndirect>,
    /// 所有 command 的实例数之和
    pub object_count: u32,
}

impl IndirectCommands {
    /// 第 m 个 mesh 的实例为 `[m * instances_per_mesh, (m + 1) * instances_per_mesh)`
    pub fn build(mesh_ranges: &[MeshRange], instances_per_mesh: u32) -> Self {
        let commands: Vec<_> = mesh_ranges
            .iter()
            .enumerate()
            .map(|(m, range)| DrawIndexedIndirect {
                index_count: range.index_count,
                instance_count: instances_per_mesh,
                first_index: range.first_index,
                vertex_offset: range.vertex_offset,
                first_instance: m as u32 * instances_per_mesh,
            })
            .collect();
        let object_count = commands.iter().map(|c| c.instance_count).sum();
        Self { commands, object_count }
    }

    #[inline]
    pub fn draw_count(&self) -> u32 {
        self.commands.len() as u32
    }

    /// 每个 invocation 生成一个实例
    #[inline]
    pub fn dispatch_groups(&self) -> u32 {
        self.object_count.div_ceil(INSTANCE_GROUP_SIZE)
    }
}

/// compute shader 的参数
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceParam {
    pub plant_radius: f32,
    pub object_instance_count: u32,
    _padding: [u32; 2],
}

impl InstanceParam {
    pub fn new(plant_radius: f32, object_instance_count: u32) -> Self {
        Self {
            plant_radius,
            object_instance_count,
            _padding: [0; 2],
        }
    }
}

/// 单个实例，既是 compute 的输出 SSBO，也是 graphics 的 per-instance 顶点数据
///
/// 与 std430 下 `{ vec3 pos; float scale; vec3 rot; uint tex_index; }` 一致
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData {
    pub pos: glam::Vec3,
    pub scale: f32,
    pub rot: glam::Vec3,
    pub tex_index: u32,
}

impl InstanceData {
    /// 顶点属性 location 4..=7，binding 1
    pub fn vertex_attributes(binding: u32) -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                location: 4,
                binding,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(InstanceData, pos) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 5,
                binding,
                format: vk::Format::R32_SFLOAT,
                offset: std::mem::offset_of!(InstanceData, scale) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 6,
                binding,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(InstanceData, rot) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 7,
                binding,
                format: vk::Format::R32_SINT,
                offset: std::mem::offset_of!(InstanceData, tex_index) as u32,
            },
        ]
    }

    pub fn vertex_binding(binding: u32) -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding,
            stride: size_of::<InstanceData>() as u32,
            input_rate: vk::VertexInputRate::INSTANCE,
        }
    }
}

/// 与 compute shader 相同的计算，`u` 为该实例的 4 个随机数
pub fn instance_from_random(i: u32, u: glam::Vec4, plant_radius: f32, instances_per_mesh: u32) -> InstanceData {
    let theta = 2.0 * PI * u.x;
    let phi = (1.0 - 2.0 * u.y).acos();
    InstanceData {
        pos: glam::vec3(phi.sin() * theta.cos(), 0.0, phi.cos()) * plant_radius,
        scale: 1.0 + 2.0 * u.w,
        rot: glam::vec3(0.0, PI * u.z, 0.0),
        tex_index: i / instances_per_mesh.max(1),
    }
}

/// compute shader 的输入：每个实例 4 个 [0, 1) 的随机数
pub fn random_floats(object_count: u32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..object_count * 4).map(|_| rng.r#gen::<f32>()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges() -> Vec<MeshRange> {
        vec![
            MeshRange {
                first_index: 0,
                index_count: 18,
                vertex_offset: 0,
            },
            MeshRange {
                first_index: 18,
                index_count: 36,
                vertex_offset: 12,
            },
        ]
    }

    #[test]
    fn commands_partition_instances() {
        let commands = IndirectCommands::build(&ranges(), 2048);
        assert_eq!(commands.draw_count(), 2);
        assert_eq!(commands.object_count, 4096);
        assert_eq!(commands.commands[0].first_instance, 0);
        assert_eq!(commands.commands[1].first_instance, 2048);
        assert_eq!(commands.commands[1].first_index, 18);
        assert_eq!(commands.commands[1].vertex_offset, 12);
        assert!(commands.commands.iter().all(|c| c.instance_count == 2048));
        assert_eq!(commands.dispatch_groups(), 16);
    }

    #[test]
    fn dispatch_covers_every_instance() {
        let commands = IndirectCommands::build(&ranges()[..1], 300);
        assert!(commands.dispatch_groups() * INSTANCE_GROUP_SIZE >= commands.object_count);
        assert_eq!(commands.dispatch_groups(), 2);
    }

    #[test]
    fn instance_layout_matches_std430() {
        assert_eq!(size_of::<InstanceData>(), 32);
        assert_eq!(std::mem::offset_of!(InstanceData, scale), 12);
        assert_eq!(std::mem::offset_of!(InstanceData, rot), 16);
        assert_eq!(std::mem::offset_of!(InstanceData, tex_index), 28);
        let locations: Vec<_> = InstanceData::vertex_attributes(1).iter().map(|a| a.location).collect();
        assert_eq!(locations, vec![4, 5, 6, 7]);
        assert_eq!(size_of::<InstanceParam>(), 16);
    }

    #[test]
    fn instance_from_random_values() {
        let instance = instance_from_random(2049, glam::vec4(0.0, 0.5, 0.5, 1.0), 25.0, 2048);
        // theta = 0, phi = pi / 2
        assert!((instance.pos - glam::vec3(25.0, 0.0, 0.0)).length() < 1e-4);
        assert!((instance.rot.y - PI * 0.5).abs() < 1e-6);
        assert_eq!(instance.scale, 3.0);
        assert_eq!(instance.tex_index, 1);

        let edge = instance_from_random(0, glam::vec4(0.25, 0.0, 0.0, 0.0), 10.0, 2048);
        // phi = 0
        assert!((edge.pos - glam::vec3(0.0, 0.0, 10.0)).length() < 1e-4);
        assert_eq!(edge.scale, 1.0);
        assert_eq!(edge.tex_index, 0);
    }

    #[test]
    fn random_floats_are_unit_interval() {
        let values = random_floats(64, 9);
        assert_eq!(values.len(), 256);
        assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
        assert_eq!(values, random_floats(64, 9));
        for i in 0..64 {
            let u = glam::Vec4::from_slice(&values[i * 4..i * 4 + 4]);
            let instance = instance_from_random(i as u32, u, 25.0, 2048);
            assert!(instance.pos.length() <= 25.0 + 1e-3);
            assert!((1.0..=3.0).contains(&instance.scale));
        }
    }
}
