use std::rc::Rc;

use ash::vk;
use vkx_crate_tools::resource::VkxPath;
use vkx_gfx::{
    commands::command_buffer::GfxCommandBuffer,
    pipelines::{
        graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo, GfxPipelineLayout},
        shader::GfxShaderStageInfo,
    },
};

/// 不需要 vertex buffer 的全屏三角形
///
/// 顶点着色器为 `common/fullscreen.vert`，输出 location 0 的 uv，(0, 0) 位于左上角
pub struct FullscreenPipeline {
    pipeline: GfxGraphicsPipeline,
    pipeline_layout: Rc<GfxPipelineLayout>,
}
// new & init
impl FullscreenPipeline {
    pub const VERTEX_SHADER: &'static str = "common/fullscreen.vert";

    /// `fragment` 是 shader 源文件相对于 `shader/src` 的路径，入口为 `main`
    pub fn new(fragment: &str, pipeline_layout: Rc<GfxPipelineLayout>, color_formats: Vec<vk::Format>, name: &str) -> Self {
        let mut create_info = GfxGraphicsPipelineCreateInfo::default();
        create_info
            .shader_stages(vec![
                GfxShaderStageInfo {
                    stage: vk::ShaderStageFlags::VERTEX,
                    entry_point: c"main",
                    path: VkxPath::shader_build_path_str(Self::VERTEX_SHADER),
                },
                GfxShaderStageInfo {
                    stage: vk::ShaderStageFlags::FRAGMENT,
                    entry_point: c"main",
                    path: VkxPath::shader_build_path_str(fragment),
                },
            ])
            // 没有 depth attachment，depth test 随之关闭
            .attach_info(color_formats, None, None)
            .cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::COUNTER_CLOCKWISE);

        let pipeline = GfxGraphicsPipeline::new(&create_info, pipeline_layout.clone(), name);
        log::info!("fullscreen pipeline {} created: {}", name, fragment);

        Self {
            pipeline,
            pipeline_layout,
        }
    }
}
// getters
impl FullscreenPipeline {
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline.handle()
    }

    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout.handle()
    }
}
// draw
impl FullscreenPipeline {
    /// 需要在 `cmd_begin_rendering2` 之后调用，viewport 由调用者设置
    pub fn draw(&self, cmd: &GfxCommandBuffer, descriptor_sets: &[vk::DescriptorSet]) {
        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
        if !descriptor_sets.is_empty() {
            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout.handle(),
                0,
                descriptor_sets,
                None,
            );
        }
        cmd.cmd_draw(3, 1, 0, 0);
    }
}
