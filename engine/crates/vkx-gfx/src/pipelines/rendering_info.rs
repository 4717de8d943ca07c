use ash::vk;
use itertools::Itertools;

/// dynamic rendering 的 attachment 配置
///
/// 默认 load op 为 CLEAR，store op 为 STORE，color 清除为黑色，depth 清除为 1
pub struct GfxRenderingInfo {
    color_attach_infos: Vec<vk::RenderingAttachmentInfo<'static>>,
    depth_attach_info: Option<vk::RenderingAttachmentInfo<'static>>,
    render_area: vk::Rect2D,
}
impl GfxRenderingInfo {
    pub fn new(color_views: Vec<vk::ImageView>, depth_view: Option<vk::ImageView>, render_area: vk::Rect2D) -> Self {
        let color_attach_infos = color_views
            .into_iter()
            .map(|view| {
                vk::RenderingAttachmentInfo::default()
                    .image_view(view)
                    .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .clear_value(vk::ClearValue {
                        color: vk::ClearColorValue {
                            float32: [0.0, 0.0, 0.0, 1.0],
                        },
                    })
            })
            .collect_vec();
        let depth_attach_info = depth_view.map(|view| {
            vk::RenderingAttachmentInfo::default()
                .image_view(view)
                .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .clear_value(vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
                })
        });

        Self {
            color_attach_infos,
            depth_attach_info,
            render_area,
        }
    }

    /// 以整个 extent 作为 render area
    #[inline]
    pub fn new_full(color_views: Vec<vk::ImageView>, depth_view: Option<vk::ImageView>, extent: vk::Extent2D) -> Self {
        Self::new(
            color_views,
            depth_view,
            vk::Rect2D {
                offset: vk::Offset2D::default(),
                extent,
            },
        )
    }

    /// 所有 color attachment 使用同一个清除色
    #[inline]
    pub fn clear_color(mut self, color: [f32; 4]) -> Self {
        for info in &mut self.color_attach_infos {
            info.clear_value = vk::ClearValue {
                color: vk::ClearColorValue { float32: color },
            };
        }
        self
    }

    /// 保留 color attachment 原有内容，用于在已有画面上叠加绘制
    #[inline]
    pub fn load_color(mut self) -> Self {
        for info in &mut self.color_attach_infos {
            info.load_op = vk::AttachmentLoadOp::LOAD;
        }
        self
    }

    #[inline]
    pub fn rendering_info(&self) -> vk::RenderingInfo<'_> {
        let info = vk::RenderingInfo::default()
            .layer_count(1)
            .render_area(self.render_area)
            .color_attachments(&self.color_attach_infos);
        match &self.depth_attach_info {
            Some(depth) => info.depth_attachment(depth),
            None => info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn attachments_and_load_ops() {
        let info = GfxRenderingInfo::new_full(
            vec![vk::ImageView::null(), vk::ImageView::null()],
            Some(vk::ImageView::null()),
            vk::Extent2D { width: 64, height: 32 },
        )
        .load_color();

        let vk_info = info.rendering_info();
        assert_eq!(vk_info.color_attachment_count, 2);
        assert!(!vk_info.p_depth_attachment.is_null());
        assert_eq!(vk_info.render_area.extent.width, 64);
        assert!(info.color_attach_infos.iter().all(|c| c.load_op == vk::AttachmentLoadOp::LOAD));
    }

    #[test]
    fn no_depth() {
        let info = GfxRenderingInfo::new_full(vec![vk::ImageView::null()], None, vk::Extent2D::default());
        assert!(info.rendering_info().p_depth_attachment.is_null());
    }
}
