//! 参考 imgui-rs-vulkan-renderer

use crate::gui_mesh::GuiMesh;
use crate::gui_pass::{GuiDescriptorLayout, GuiPass};
use ash::vk;
use imgui::{DrawData, FontAtlasTexture, TextureId};
use vkx_descriptor_layout_trait::DescriptorBindingLayout;
use vkx_gfx::commands::command_buffer::GfxCommandBuffer;
use vkx_gfx::descriptors::descriptor::GfxDescriptorSet;
use vkx_gfx::descriptors::descriptor_cursor::GfxDescriptorCursor;
use vkx_gfx::descriptors::descriptor_pool::{GfxDescriptorPool, GfxDescriptorPoolCreateInfo};
use vkx_gfx::descriptors::sampler::GfxSamplerCreateInfo;
use vkx_gfx::gfx::Gfx;
use vkx_gfx::resources::texture::GfxTexture2D;
use vkx_render_interface::frame_counter::FrameCounter;
use vkx_render_interface::pipeline_settings::FrameLabel;

pub struct GuiBackend {
    /// 存放多帧 imgui 的 mesh 数据
    gui_meshes: [GuiMesh; FrameCounter::fif_count()],
    gui_pass: GuiPass,

    font_texture: Option<GfxTexture2D>,
    font_tex_id: TextureId,

    _descriptor_pool: GfxDescriptorPool,
    font_set: GfxDescriptorSet<GuiDescriptorLayout>,
}

// new & init
impl GuiBackend {
    pub fn new(color_format: vk::Format) -> Self {
        let gui_meshes = FrameCounter::frame_labels().map(GuiMesh::new);
        let gui_pass = GuiPass::new(color_format);

        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                1,
                GuiDescriptorLayout::pool_sizes(1),
            ),
            "uipass",
        );
        let font_set = GfxDescriptorSet::new(&descriptor_pool, gui_pass.descriptor_set_layout(), "imgui-fonts");

        Self {
            gui_meshes,
            gui_pass,
            font_texture: None,
            font_tex_id: TextureId::new(0),
            _descriptor_pool: descriptor_pool,
            font_set,
        }
    }

    /// 上传字体纹理并写入 descriptor set
    pub fn register_font(&mut self, font_atlas: FontAtlasTexture, font_tex_id: TextureId) {
        let font_texture = GfxTexture2D::from_rgba8(
            font_atlas.width,
            font_atlas.height,
            1,
            font_atlas.data,
            &GfxSamplerCreateInfo::new().clamp_to_edge(),
            "imgui-fonts",
        );

        Gfx::get().gfx_device().write_descriptor_sets(&[GuiDescriptorLayout::font().write_image(
            self.font_set.handle(),
            0,
            vec![font_texture.descriptor_image_info()],
        )]);

        if let Some(old) = self.font_texture.replace(font_texture) {
            old.destroy();
        }
        self.font_tex_id = font_tex_id;
        log::info!("imgui font registered: {}x{}", font_atlas.width, font_atlas.height);
    }
}
// render
impl GuiBackend {
    /// # Phase: Render
    ///
    /// 将 draw data 上传到当前帧的 mesh 中
    pub fn prepare_render_data(&mut self, cmd: &GfxCommandBuffer, draw_data: &DrawData, frame_label: FrameLabel) {
        let mesh = &mut self.gui_meshes[*frame_label];
        mesh.grow_if_needed(draw_data);
        mesh.upload(cmd, draw_data);
    }

    /// # Phase: Render
    ///
    /// 在 canvas 上叠加绘制 UI，需要先调用 [`Self::prepare_render_data`]
    pub fn draw(
        &self,
        cmd: &GfxCommandBuffer,
        canvas_color_view: vk::ImageView,
        canvas_extent: vk::Extent2D,
        frame_label: FrameLabel,
        draw_data: &DrawData,
    ) {
        assert!(self.font_texture.is_some(), "imgui font is not registered");
        self.gui_pass.draw(
            canvas_color_view,
            canvas_extent,
            cmd,
            &self.gui_meshes[*frame_label],
            self.font_set.handle(),
            draw_data,
        );
    }

    #[inline]
    pub fn font_tex_id(&self) -> TextureId {
        self.font_tex_id
    }

    pub fn destroy(mut self) {
        if let Some(font_texture) = self.font_texture.take() {
            font_texture.destroy();
        }
    }
}
