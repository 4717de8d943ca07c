use std::rc::Rc;

use ash::vk;
use itertools::Itertools;
use vkx_descriptor_layout_macro::DescriptorLayout;
use vkx_descriptor_layout_trait::DescriptorBindingLayout;
use vkx_gfx::{
    basic::color::LabelColor,
    commands::command_buffer::GfxCommandBuffer,
    descriptors::{
        descriptor::{GfxDescriptorSet, GfxDescriptorSetLayout},
        descriptor_cursor::GfxDescriptorCursor,
        descriptor_pool::{GfxDescriptorPool, GfxDescriptorPoolCreateInfo},
        sampler::{GfxSampler, GfxSamplerCreateInfo},
    },
    gfx::Gfx,
    pipelines::{graphics_pipeline::GfxPipelineLayout, rendering_info::GfxRenderingInfo},
    resources::special_buffers::structured_buffer::GfxStructuredBuffer,
};
use vkx_render_interface::{frame_counter::FrameCounter, pipeline_settings::FrameLabel};

use crate::{
    outer_app::subsurface::{DebugTarget, gbuffer_pass::GBuffer},
    renderer::{fullscreen::FullscreenPipeline, render_target::RenderTarget},
    scene::lights::{LIGHT_COUNT, PointLight},
};

const LIGHTING_FORMAT: vk::Format = vk::Format::R16G16B16A16_SFLOAT;

#[derive(DescriptorLayout)]
struct LightingDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "FRAGMENT"]
    _lights: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _position: (),

    #[binding = 2]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _normal: (),

    #[binding = 3]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _albedo: (),
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub lights: [PointLight; LIGHT_COUNT],
    pub view_pos: glam::Vec4,
    pub debug_target: i32,
    pub _padding: [i32; 3],
}

impl LightingUniform {
    pub fn new(lights: [PointLight; LIGHT_COUNT], camera_pos: glam::Vec3, debug_target: DebugTarget) -> Self {
        Self {
            lights,
            view_pos: camera_pos.extend(0.0),
            debug_target: debug_target as i32,
            _padding: [0; 3],
        }
    }
}

struct LightingFrame {
    ubo: GfxStructuredBuffer<LightingUniform>,
    set: GfxDescriptorSet<LightingDescriptorLayout>,
}

/// 延迟光照，把 diffuse 和 specular 分别写入两张 attachment
///
/// 只有 diffuse 会被次表面模糊，specular 在合成时直接相加
pub struct LightingPass {
    diffuse: RenderTarget,
    specular: RenderTarget,

    pipeline: FullscreenPipeline,
    frames: Vec<LightingFrame>,
    _sampler: GfxSampler,
    _set_layout: GfxDescriptorSetLayout<LightingDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl LightingPass {
    pub fn new(gbuffer: &GBuffer) -> Self {
        let extent = GBuffer::extent();
        let diffuse = RenderTarget::new_color(extent, LIGHTING_FORMAT, "sss-diffuse");
        let specular = RenderTarget::new_color(extent, LIGHTING_FORMAT, "sss-specular");

        let fif = FrameCounter::fif_count() as u32;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                fif,
                LightingDescriptorLayout::pool_sizes(fif),
            ),
            "sss-lighting",
        );
        let set_layout = GfxDescriptorSetLayout::<LightingDescriptorLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "sss-lighting",
        );
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "sss-lighting"));
        let pipeline = FullscreenPipeline::new(
            "sss/lighting.frag",
            pipeline_layout,
            vec![LIGHTING_FORMAT, LIGHTING_FORMAT],
            "sss-lighting",
        );

        let sampler = GfxSampler::new(&GfxSamplerCreateInfo::new().clamp_to_edge().nearest(), "sss-gbuffer");
        let sampled = |target: &RenderTarget| target.descriptor_image_info(sampler.handle(), target.sampled_layout());
        let frames = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                let ubo = GfxStructuredBuffer::<LightingUniform>::new_ubo(1, format!("sss-lighting-{}", label));
                let set = GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("sss-lighting-{}", label));
                Gfx::get().gfx_device().write_descriptor_sets(&[
                    LightingDescriptorLayout::lights().write_buffer(set.handle(), 0, vec![ubo.descriptor_info()]),
                    LightingDescriptorLayout::position().write_image(set.handle(), 0, vec![sampled(&gbuffer.position)]),
                    LightingDescriptorLayout::normal().write_image(set.handle(), 0, vec![sampled(&gbuffer.normal)]),
                    LightingDescriptorLayout::albedo().write_image(set.handle(), 0, vec![sampled(&gbuffer.albedo)]),
                ]);
                LightingFrame { ubo, set }
            })
            .collect_vec();

        Self {
            diffuse,
            specular,
            pipeline,
            frames,
            _sampler: sampler,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        }
    }
}
// getters
impl LightingPass {
    #[inline]
    pub fn diffuse(&self) -> &RenderTarget {
        &self.diffuse
    }

    #[inline]
    pub fn specular(&self) -> &RenderTarget {
        &self.specular
    }
}
// draw
impl LightingPass {
    pub fn update(&mut self, frame_label: FrameLabel, uniform: &LightingUniform) {
        self.frames[*frame_label].ubo.write(uniform);
    }

    pub fn record(&self, cmd: &GfxCommandBuffer, frame_label: FrameLabel) {
        let extent = GBuffer::extent();
        let targets = [&self.diffuse, &self.specular];

        let to_attachment = targets.iter().map(|t| t.barrier_to_attachment()).collect_vec();
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &to_attachment);

        cmd.scope_label("sss-lighting", LabelColor::COLOR_PASS, |cmd| {
            cmd.cmd_begin_rendering2(&GfxRenderingInfo::new_full(
                vec![self.diffuse.view(), self.specular.view()],
                None,
                extent,
            ));
            cmd.cmd_set_viewport_scissor(extent);
            self.pipeline.draw(cmd, &[self.frames[*frame_label].set.handle()]);
            cmd.end_rendering();
        });

        let to_sampled = targets.iter().map(|t| t.barrier_to_sampled()).collect_vec();
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &to_sampled);
    }
}
// destroy
impl LightingPass {
    pub fn destroy(self) {
        self.diffuse.destroy();
        self.specular.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{platform::camera::Camera, scene::lights::INITIAL_LIGHTS};

    #[test]
    fn uniform_layout_matches_std140() {
        assert_eq!(size_of::<LightingUniform>(), 32 * LIGHT_COUNT + 16 + 16);
        assert_eq!(std::mem::offset_of!(LightingUniform, view_pos), 32 * LIGHT_COUNT);
    }

    #[test]
    fn uniform_carries_debug_target() {
        let uniform = LightingUniform::new(INITIAL_LIGHTS, glam::vec3(1.0, 2.0, 3.0), DebugTarget::Normals);
        assert_eq!(uniform.debug_target, 2);
        assert_eq!(uniform.view_pos, glam::vec4(1.0, 2.0, 3.0, 0.0));
    }

    /// 高光的半程向量用 `view_pos - world_pos`，所以 view_pos 必须是世界空间下的相机位置，不做翻转
    #[test]
    fn view_pos_is_world_space_eye() {
        let mut camera = Camera::default();
        camera.position = glam::vec3(-2.0, 1.5, 6.0);
        camera.euler_yaw_deg = 30.0;
        camera.euler_pitch_deg = -10.0;

        let uniform = LightingUniform::new(INITIAL_LIGHTS, camera.position, DebugTarget::Final);
        let eye = camera.get_view_matrix().inverse().w_axis.truncate();
        assert!((uniform.view_pos.truncate() - eye).length() < 1e-4);
        assert_ne!(uniform.view_pos.truncate(), camera.position * glam::vec3(-1.0, 1.0, -1.0));
    }
}
