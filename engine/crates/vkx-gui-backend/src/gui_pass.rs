use crate::gui_mesh::GuiMesh;
use crate::gui_vertex_layout::ImGuiVertexLayoutAoS;
use ash::vk;
use itertools::Itertools;
use std::rc::Rc;
use vkx_crate_tools::enumed_map;
use vkx_crate_tools::resource::VkxPath;
use vkx_descriptor_layout_macro::DescriptorLayout;
use vkx_gfx::descriptors::descriptor::GfxDescriptorSetLayout;
use vkx_gfx::pipelines::rendering_info::GfxRenderingInfo;
use vkx_gfx::resources::layout::GfxVertexLayout;
use vkx_gfx::{
    commands::command_buffer::GfxCommandBuffer,
    pipelines::{
        graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo, GfxPipelineLayout},
        shader::GfxShaderStageInfo,
    },
};

enumed_map!(ShaderStage<GfxShaderStageInfo>: {
    Vertex: GfxShaderStageInfo {
        stage: vk::ShaderStageFlags::VERTEX,
        entry_point: c"main",
        path: VkxPath::shader_build_path_str("imgui/imgui.vert"),
    },
    Fragment: GfxShaderStageInfo {
        stage: vk::ShaderStageFlags::FRAGMENT,
        entry_point: c"main",
        path: VkxPath::shader_build_path_str("imgui/imgui.frag"),
    },
});

/// set 0：字体纹理
#[derive(DescriptorLayout)]
pub struct GuiDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _font: (),
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GuiPushConstant {
    ortho: glam::Mat4,
}

pub struct GuiPass {
    pipeline: GfxGraphicsPipeline,
    pipeline_layout: Rc<GfxPipelineLayout>,
    descriptor_set_layout: GfxDescriptorSetLayout<GuiDescriptorLayout>,
}
// new & init
impl GuiPass {
    pub fn new(color_format: vk::Format) -> Self {
        let descriptor_set_layout =
            GfxDescriptorSetLayout::<GuiDescriptorLayout>::new(vk::DescriptorSetLayoutCreateFlags::empty(), "uipass");
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(
            &[descriptor_set_layout.handle()],
            &[vk::PushConstantRange {
                stage_flags: vk::ShaderStageFlags::VERTEX,
                offset: 0,
                size: size_of::<GuiPushConstant>() as u32,
            }],
            "uipass",
        ));

        let mut create_info = GfxGraphicsPipelineCreateInfo::default();
        create_info
            .shader_stages(ShaderStage::iter().map(|stage| stage.value().clone()).collect_vec())
            .vertex_attribute(ImGuiVertexLayoutAoS::vertex_input_attributes())
            .vertex_binding(ImGuiVertexLayoutAoS::vertex_input_bindings())
            .cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::CLOCKWISE)
            .attach_info(vec![color_format], None, None)
            .color_blend(vec![GfxGraphicsPipelineCreateInfo::alpha_blend_state()], [0.0; 4]);

        let pipeline = GfxGraphicsPipeline::new(&create_info, pipeline_layout.clone(), "uipass");

        Self {
            pipeline,
            pipeline_layout,
            descriptor_set_layout,
        }
    }

    #[inline]
    pub fn descriptor_set_layout(&self) -> &GfxDescriptorSetLayout<GuiDescriptorLayout> {
        &self.descriptor_set_layout
    }
}
// draw
impl GuiPass {
    /// imgui 裁剪矩形转换为 framebuffer 中的 scissor
    ///
    /// 完全在屏幕外的矩形返回 None
    fn clip_rect_to_scissor(clip_rect: [f32; 4], clip_offset: [f32; 2], clip_scale: [f32; 2]) -> Option<vk::Rect2D> {
        let min_x = ((clip_rect[0] - clip_offset[0]) * clip_scale[0]).max(0.0);
        let min_y = ((clip_rect[1] - clip_offset[1]) * clip_scale[1]).max(0.0);
        let max_x = (clip_rect[2] - clip_offset[0]) * clip_scale[0];
        let max_y = (clip_rect[3] - clip_offset[1]) * clip_scale[1];
        if max_x <= min_x || max_y <= min_y {
            return None;
        }

        Some(vk::Rect2D {
            offset: vk::Offset2D {
                x: min_x as i32,
                y: min_y as i32,
            },
            extent: vk::Extent2D {
                width: (max_x - min_x) as u32,
                height: (max_y - min_y) as u32,
            },
        })
    }

    /// 在 canvas 上叠加绘制 UI，canvas 需要处于 COLOR_ATTACHMENT_OPTIMAL
    pub fn draw(
        &self,
        canvas_color_view: vk::ImageView,
        canvas_extent: vk::Extent2D,
        cmd: &GfxCommandBuffer,
        gui_mesh: &GuiMesh,
        font_set: vk::DescriptorSet,
        draw_data: &imgui::DrawData,
    ) {
        // 使用 LOAD 保留 demo 绘制的内容
        let rendering_info = GfxRenderingInfo::new_full(vec![canvas_color_view], None, canvas_extent).load_color();

        let viewport = vk::Viewport {
            width: draw_data.framebuffer_scale[0] * draw_data.display_size[0],
            height: draw_data.framebuffer_scale[1] * draw_data.display_size[1],
            min_depth: 0.0,
            max_depth: 1.0,
            ..Default::default()
        };

        cmd.cmd_begin_rendering2(&rendering_info);
        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
        cmd.cmd_set_viewport(0, std::slice::from_ref(&viewport));

        let push_constant = GuiPushConstant {
            ortho: glam::Mat4::orthographic_rh(
                draw_data.display_pos[0],
                draw_data.display_pos[0] + draw_data.display_size[0],
                draw_data.display_pos[1],
                draw_data.display_pos[1] + draw_data.display_size[1],
                -1.0,
                1.0,
            ),
        };
        cmd.cmd_push_constants(
            self.pipeline_layout.handle(),
            vk::ShaderStageFlags::VERTEX,
            0,
            bytemuck::bytes_of(&push_constant),
        );
        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.pipeline_layout.handle(),
            0,
            &[font_set],
            None,
        );

        cmd.cmd_bind_index_buffer(&gui_mesh.index_buffer, 0);
        cmd.cmd_bind_vertex_buffers(0, &[gui_mesh.vertex_buffer.vk_buffer()], &[0]);

        let mut index_offset = 0;
        let mut vertex_offset = 0;
        let clip_offset = draw_data.display_pos;
        let clip_scale = draw_data.framebuffer_scale;

        // 对于每个 command，设置正确的 vertex, index, scissor 即可
        for draw_list in draw_data.draw_lists() {
            for command in draw_list.commands() {
                match command {
                    imgui::DrawCmd::Elements {
                        count,
                        cmd_params:
                            imgui::DrawCmdParams {
                                clip_rect,
                                texture_id,
                                vtx_offset,
                                idx_offset,
                            },
                    } => {
                        let Some(scissor) = Self::clip_rect_to_scissor(clip_rect, clip_offset, clip_scale) else {
                            continue;
                        };
                        cmd.cmd_set_scissor(0, &[scissor]);

                        // 只有字体一张纹理
                        debug_assert_eq!(texture_id.id(), 0, "unknown imgui texture id");

                        cmd.draw_indexed(
                            count as u32,
                            index_offset + idx_offset as u32,
                            1,
                            0,
                            vertex_offset + vtx_offset as i32,
                        );
                    }
                    imgui::DrawCmd::ResetRenderState => {
                        log::warn!("imgui reset render state");
                    }
                    imgui::DrawCmd::RawCallback { .. } => {
                        log::warn!("imgui raw callback");
                    }
                }
            }

            index_offset += draw_list.idx_buffer().len() as u32;
            vertex_offset += draw_list.vtx_buffer().len() as i32;
        }
        cmd.end_rendering();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkx_descriptor_layout_trait::DescriptorBindingLayout;

    #[test]
    fn scissor_is_scaled_and_clamped() {
        let scissor = GuiPass::clip_rect_to_scissor([-10.0, 5.0, 100.0, 50.0], [0.0, 0.0], [2.0, 2.0]).unwrap();
        assert_eq!(scissor.offset.x, 0);
        assert_eq!(scissor.offset.y, 10);
        assert_eq!(scissor.extent.width, 200);
        assert_eq!(scissor.extent.height, 90);
    }

    #[test]
    fn empty_clip_rect_is_skipped() {
        assert!(GuiPass::clip_rect_to_scissor([50.0, 50.0, 40.0, 60.0], [0.0, 0.0], [1.0, 1.0]).is_none());
    }

    #[test]
    fn font_binding() {
        let bindings = GuiDescriptorLayout::get_shader_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(GuiDescriptorLayout::font().descriptor_type, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
    }
}
