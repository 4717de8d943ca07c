use std::{convert::identity, ffi::CStr, rc::Rc};

use ash::vk;
use itertools::Itertools;

use crate::{
    foundation::debug_messenger::DebugType,
    gfx::Gfx,
    pipelines::shader::{GfxShaderModuleCache, GfxShaderStageInfo},
    resources::layout::GfxVertexLayout,
};

pub struct GfxPipelineLayout {
    handle: vk::PipelineLayout,
}
impl GfxPipelineLayout {
    pub fn new(
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
        debug_name: impl AsRef<str>,
    ) -> Self {
        let pipeline_layout_create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(descriptor_set_layouts)
            .push_constant_ranges(push_constant_ranges);
        let gfx_device = Gfx::get().gfx_device();
        let handle = unsafe { gfx_device.create_pipeline_layout(&pipeline_layout_create_info, None).unwrap() };
        let layout = Self { handle };
        gfx_device.set_debug_name(&layout, debug_name);
        layout
    }

    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.handle
    }
}
impl Drop for GfxPipelineLayout {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_pipeline_layout(self.handle, None);
        }
    }
}
impl DebugType for GfxPipelineLayout {
    fn debug_type_name() -> &'static str {
        "GfxPipelineLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

pub struct GfxGraphicsPipeline {
    pipeline: vk::Pipeline,

    /// 多个 pipeline 可以共享同一个 pipeline layout
    pipeline_layout: Rc<GfxPipelineLayout>,
}
impl GfxGraphicsPipeline {
    pub fn new(
        create_info: &GfxGraphicsPipelineCreateInfo,
        pipeline_layout: Rc<GfxPipelineLayout>,
        debug_name: &str,
    ) -> Self {
        let _span = tracy_client::span!("GfxGraphicsPipeline::new");

        // dynamic rendering 需要的 framebuffer 信息
        let mut attach_info = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&create_info.color_attach_formats)
            .depth_attachment_format(create_info.depth_attach_format)
            .stencil_attachment_format(create_info.stencil_attach_format);

        let mut shader_modules_cache = GfxShaderModuleCache::new();
        let modules = create_info
            .shader_stages
            .iter()
            .map(|stage| shader_modules_cache.get_or_load(stage.path()).handle())
            .collect_vec();
        let shader_stages_info = create_info
            .shader_stages
            .iter()
            .zip(modules)
            .map(|(stage, module)| {
                vk::PipelineShaderStageCreateInfo::default().stage(stage.stage).module(module).name(stage.entry_point)
            })
            .collect_vec();

        let vertex_input_state_info = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&create_info.vertex_binding_desc)
            .vertex_attribute_descriptions(&create_info.vertex_attribute_desc);

        let input_assembly_info = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(create_info.primitive_topology)
            .primitive_restart_enable(false);

        // viewport 和 scissor 具体值由 dynamic state 决定，但是数量由该 create info 决定
        let viewport_info = vk::PipelineViewportStateCreateInfo {
            viewport_count: 1,
            scissor_count: 1,
            ..Default::default()
        };

        let msaa_info =
            vk::PipelineMultisampleStateCreateInfo::default().rasterization_samples(vk::SampleCountFlags::TYPE_1);

        // 需要为每个 color attachment 分别指定
        let color_blend_info = create_info.blend_info.attachments(&create_info.color_attach_blend_states);

        let dynamic_state_info =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&create_info.dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages_info)
            .vertex_input_state(&vertex_input_state_info)
            .input_assembly_state(&input_assembly_info)
            .viewport_state(&viewport_info)
            .rasterization_state(&create_info.rasterize_state_info)
            .multisample_state(&msaa_info)
            .color_blend_state(&color_blend_info)
            .depth_stencil_state(&create_info.depth_stencil_info)
            .layout(pipeline_layout.handle)
            .dynamic_state(&dynamic_state_info)
            .push_next(&mut attach_info);

        let gfx_device = Gfx::get().gfx_device();
        let pipeline = unsafe {
            gfx_device
                .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&pipeline_info), None)
                .unwrap()[0]
        };
        let pipeline = Self {
            pipeline,
            pipeline_layout,
        };
        gfx_device.set_debug_name(&pipeline, debug_name);

        shader_modules_cache.destroy();

        pipeline
    }

    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout.handle
    }
}
impl Drop for GfxGraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_pipeline(self.pipeline, None);
        }
    }
}
impl DebugType for GfxGraphicsPipeline {
    fn debug_type_name() -> &'static str {
        "GfxGraphicsPipeline"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.pipeline
    }
}

#[derive(Clone)]
pub struct GfxGraphicsPipelineCreateInfo {
    color_attach_formats: Vec<vk::Format>,
    depth_attach_format: vk::Format,
    stencil_attach_format: vk::Format,

    shader_stages: Vec<GfxShaderStageInfo>,

    vertex_binding_desc: Vec<vk::VertexInputBindingDescription>,
    vertex_attribute_desc: Vec<vk::VertexInputAttributeDescription>,

    primitive_topology: vk::PrimitiveTopology,

    rasterize_state_info: vk::PipelineRasterizationStateCreateInfo<'static>,

    color_attach_blend_states: Vec<vk::PipelineColorBlendAttachmentState>,
    blend_info: vk::PipelineColorBlendStateCreateInfo<'static>,

    depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo<'static>,

    dynamic_states: Vec<vk::DynamicState>,
}
impl Default for GfxGraphicsPipelineCreateInfo {
    fn default() -> Self {
        Self {
            color_attach_formats: vec![],

            // format = undefined 表示不使用这个 attachment
            depth_attach_format: vk::Format::UNDEFINED,
            stencil_attach_format: vk::Format::UNDEFINED,

            shader_stages: vec![],

            vertex_binding_desc: vec![],
            vertex_attribute_desc: vec![],

            primitive_topology: vk::PrimitiveTopology::TRIANGLE_LIST,

            rasterize_state_info: vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::BACK)
                // 按照 OpenGL 的传统，将 CCW 视为 front face
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false),

            color_attach_blend_states: vec![],
            blend_info: vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .blend_constants([0.0, 0.0, 0.0, 0.0]),

            depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(true)
                .depth_write_enable(true)
                .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false),
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
        }
    }
}
// builder
impl GfxGraphicsPipelineCreateInfo {
    /// 同时为每个 color attachment 设置不混合的 blend state
    #[inline]
    pub fn attach_info(
        &mut self,
        color_attach_formats: Vec<vk::Format>,
        depth_format: Option<vk::Format>,
        stencil_format: Option<vk::Format>,
    ) -> &mut Self {
        self.color_attach_blend_states = color_attach_formats.iter().map(|_| Self::opaque_blend_state()).collect();
        self.color_attach_formats = color_attach_formats;
        self.depth_attach_format = depth_format.unwrap_or(vk::Format::UNDEFINED);
        self.stencil_attach_format = stencil_format.unwrap_or(vk::Format::UNDEFINED);
        if depth_format.is_none() {
            self.depth_test(None, false, false);
        }

        self
    }

    #[inline]
    pub fn vertex_shader_stage(&mut self, path: String, entry_point: &'static CStr) -> &mut Self {
        self.shader_stages.push(GfxShaderStageInfo {
            stage: vk::ShaderStageFlags::VERTEX,
            entry_point,
            path,
        });
        self
    }

    #[inline]
    pub fn fragment_shader_stage(&mut self, path: String, entry_point: &'static CStr) -> &mut Self {
        self.shader_stages.push(GfxShaderStageInfo {
            stage: vk::ShaderStageFlags::FRAGMENT,
            entry_point,
            path,
        });
        self
    }

    #[inline]
    pub fn shader_stages(&mut self, stages: Vec<GfxShaderStageInfo>) -> &mut Self {
        self.shader_stages = stages;
        self
    }

    #[inline]
    pub fn vertex_binding(&mut self, bindings: Vec<vk::VertexInputBindingDescription>) -> &mut Self {
        self.vertex_binding_desc = bindings;
        self
    }

    #[inline]
    pub fn vertex_attribute(&mut self, attributes: Vec<vk::VertexInputAttributeDescription>) -> &mut Self {
        self.vertex_attribute_desc = attributes;
        self
    }

    /// 使用顶点布局 L 作为 binding 0
    #[inline]
    pub fn vertex_layout<L: GfxVertexLayout>(&mut self) -> &mut Self {
        self.vertex_binding_desc = L::vertex_input_bindings();
        self.vertex_attribute_desc = L::vertex_input_attributes();
        self
    }

    /// 追加 per-instance 的 binding 以及 attribute
    #[inline]
    pub fn instance_input(
        &mut self,
        binding: vk::VertexInputBindingDescription,
        attributes: Vec<vk::VertexInputAttributeDescription>,
    ) -> &mut Self {
        debug_assert_eq!(binding.input_rate, vk::VertexInputRate::INSTANCE);
        self.vertex_binding_desc.push(binding);
        self.vertex_attribute_desc.extend(attributes);
        self
    }

    #[inline]
    pub fn primitive_topology(&mut self, topology: vk::PrimitiveTopology) -> &mut Self {
        self.primitive_topology = topology;
        self
    }

    /// 为每个 color attachment 指定 blend 操作
    #[inline]
    pub fn color_blend(
        &mut self,
        states: Vec<vk::PipelineColorBlendAttachmentState>,
        blend_constants: [f32; 4],
    ) -> &mut Self {
        self.color_attach_blend_states = states;
        self.blend_info.blend_constants = blend_constants;
        self.blend_info.logic_op_enable = vk::FALSE;
        self
    }

    #[inline]
    pub fn cull_mode(&mut self, mode: vk::CullModeFlags, front_face: vk::FrontFace) -> &mut Self {
        self.rasterize_state_info.cull_mode = mode;
        self.rasterize_state_info.front_face = front_face;
        self
    }

    #[inline]
    pub fn depth_test(
        &mut self,
        depth_test_op: Option<vk::CompareOp>,
        depth_write: bool,
        depth_bounds_test: bool,
    ) -> &mut Self {
        self.depth_stencil_info.depth_test_enable = depth_test_op.map_or(vk::FALSE, |_| vk::TRUE);
        self.depth_stencil_info.depth_compare_op = depth_test_op.map_or(vk::CompareOp::NEVER, identity);
        self.depth_stencil_info.depth_write_enable = if depth_write { vk::TRUE } else { vk::FALSE };
        self.depth_stencil_info.depth_bounds_test_enable = if depth_bounds_test { vk::TRUE } else { vk::FALSE };
        self
    }
}
// blend state presets
impl GfxGraphicsPipelineCreateInfo {
    #[inline]
    pub fn opaque_blend_state() -> vk::PipelineColorBlendAttachmentState {
        vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::RGBA)
    }

    /// 预乘之前的 alpha 混合：src * a + dst * (1 - a)
    #[inline]
    pub fn alpha_blend_state() -> vk::PipelineColorBlendAttachmentState {
        vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(true)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .alpha_blend_op(vk::BlendOp::ADD)
            .color_write_mask(vk::ColorComponentFlags::RGBA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::vertex_layout::pos_normal_uv::VertexLayoutPosNormalUv;

    #[test]
    fn attach_info_sets_blend_per_attachment() {
        let mut ci = GfxGraphicsPipelineCreateInfo::default();
        ci.attach_info(
            vec![vk::Format::R16G16B16A16_SFLOAT, vk::Format::B8G8R8A8_UNORM],
            Some(vk::Format::D32_SFLOAT),
            None,
        );
        assert_eq!(ci.color_attach_blend_states.len(), 2);
        assert_eq!(ci.depth_attach_format, vk::Format::D32_SFLOAT);
        assert_eq!(ci.depth_stencil_info.depth_test_enable, vk::TRUE);
    }

    #[test]
    fn no_depth_attachment_disables_depth_test() {
        let mut ci = GfxGraphicsPipelineCreateInfo::default();
        ci.attach_info(vec![vk::Format::R8G8B8A8_UNORM], None, None);
        assert_eq!(ci.depth_stencil_info.depth_test_enable, vk::FALSE);
        assert_eq!(ci.depth_stencil_info.depth_write_enable, vk::FALSE);
    }

    #[test]
    fn instance_input_appends() {
        let mut ci = GfxGraphicsPipelineCreateInfo::default();
        ci.vertex_layout::<VertexLayoutPosNormalUv>().instance_input(
            vk::VertexInputBindingDescription {
                binding: 1,
                stride: 32,
                input_rate: vk::VertexInputRate::INSTANCE,
            },
            vec![vk::VertexInputAttributeDescription {
                binding: 1,
                location: 4,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            }],
        );
        assert_eq!(ci.vertex_binding_desc.len(), 2);
        assert_eq!(ci.vertex_attribute_desc.len(), 5);
        assert_eq!(ci.vertex_attribute_desc.last().map(|a| a.location), Some(4));
    }
}
