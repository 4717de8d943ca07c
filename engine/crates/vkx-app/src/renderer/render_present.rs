use ash::vk;
use imgui::DrawData;
use itertools::Itertools;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use vkx_gfx::{
    basic::color::LabelColor,
    commands::{
        barrier::GfxImageBarrier, command_buffer::GfxCommandBuffer, fence::GfxFence, semaphore::GfxSemaphore,
        submit_info::GfxSubmitInfo,
    },
    gfx::Gfx,
    swapchain::render_swapchain::GfxRenderSwapchain,
};
use vkx_gui_backend::gui_backend::GuiBackend;
use vkx_render_interface::{
    cmd_allocator::CmdAllocator,
    frame_counter::FrameCounter,
    pipeline_settings::{DefaultRendererSettings, FrameLabel},
};

use crate::renderer::render_target::RenderTarget;

/// 把 demo 的输出 blit 到 swapchain，再叠加 GUI 并 present
pub struct RenderPresent {
    swapchain: Option<GfxRenderSwapchain>,
    pub gui_backend: GuiBackend,

    raw_display_handle: RawDisplayHandle,
    raw_window_handle: RawWindowHandle,

    /// 数量和 fif num 相同
    present_complete_semaphores: [GfxSemaphore; FrameCounter::fif_count()],

    /// 数量和 swapchain image num 相同
    render_complete_semaphores: Vec<GfxSemaphore>,
}
// new & init
impl RenderPresent {
    pub fn new(
        raw_display_handle: RawDisplayHandle,
        raw_window_handle: RawWindowHandle,
        window_extent: vk::Extent2D,
    ) -> Self {
        let swapchain = Self::create_swapchain(raw_display_handle, raw_window_handle, window_extent);
        let gui_backend = GuiBackend::new(swapchain.format());

        let present_complete_semaphores = FrameCounter::frame_labels()
            .map(|frame_label| GfxSemaphore::new(&format!("window-present-complete-{}", frame_label)));
        let render_complete_semaphores = Self::create_render_complete_semaphores(swapchain.image_cnt());

        Self {
            swapchain: Some(swapchain),
            gui_backend,
            raw_display_handle,
            raw_window_handle,
            present_complete_semaphores,
            render_complete_semaphores,
        }
    }

    fn create_swapchain(
        raw_display_handle: RawDisplayHandle,
        raw_window_handle: RawWindowHandle,
        window_extent: vk::Extent2D,
    ) -> GfxRenderSwapchain {
        GfxRenderSwapchain::new(
            raw_display_handle,
            raw_window_handle,
            DefaultRendererSettings::DEFAULT_PRESENT_MODE,
            DefaultRendererSettings::DEFAULT_SURFACE_FORMAT,
            window_extent,
        )
    }

    fn create_render_complete_semaphores(image_cnt: usize) -> Vec<GfxSemaphore> {
        (0..image_cnt).map(|i| GfxSemaphore::new(&format!("window-render-complete-{}", i))).collect_vec()
    }
}
// getters
impl RenderPresent {
    #[inline]
    pub fn swapchain(&self) -> &GfxRenderSwapchain {
        self.swapchain.as_ref().unwrap()
    }
}
// update
impl RenderPresent {
    /// 窗口大小变化之后重建 swapchain
    pub fn rebuild_after_resized(&mut self, window_extent: vk::Extent2D) {
        Gfx::get().wait_idel();

        if let Some(swapchain) = self.swapchain.take() {
            swapchain.destroy();
        }
        let swapchain = Self::create_swapchain(self.raw_display_handle, self.raw_window_handle, window_extent);

        // image 数量可能发生变化
        if swapchain.image_cnt() != self.render_complete_semaphores.len() {
            std::mem::take(&mut self.render_complete_semaphores).into_iter().for_each(GfxSemaphore::destroy);
            self.render_complete_semaphores = Self::create_render_complete_semaphores(swapchain.image_cnt());
        }
        self.swapchain = Some(swapchain);
    }

    /// return: `None` 表示 swapchain 已经过期，需要重建后跳过本帧
    pub fn acquire_image(&mut self, frame_label: FrameLabel) -> Option<bool> {
        let swapchain = self.swapchain.as_mut().unwrap();
        swapchain.acquire_next_image(Some(&self.present_complete_semaphores[*frame_label]), None, u64::MAX)
    }

    /// 录制并提交 present 相关的命令，然后 present
    ///
    /// render target 需要处于 COLOR_ATTACHMENT_OPTIMAL，并且由 COLOR_ATTACHMENT_OUTPUT 阶段写入
    ///
    /// return: 是否需要重建 swapchain
    pub fn present(
        &mut self,
        cmd_allocator: &mut CmdAllocator,
        frame_label: FrameLabel,
        render_target: &RenderTarget,
        ui_draw_data: Option<&DrawData>,
        frame_fence: &GfxFence,
    ) -> bool {
        let _span = tracy_client::span!("RenderPresent::present");

        let cmd = cmd_allocator.alloc_command_buffer(frame_label, "window-present");
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "window-present");
        {
            self.blit_to_swapchain(&cmd, render_target);
            self.draw_gui(&cmd, frame_label, ui_draw_data);
        }
        cmd.end();

        let swapchain = self.swapchain.as_ref().unwrap();
        let image_idx = swapchain.current_image_index();

        // 等待 swapchain 的 image 准备好；通知 swapchain 的 image 已经绘制完成
        let submit_info = GfxSubmitInfo::new(std::slice::from_ref(&cmd))
            .wait(
                &self.present_complete_semaphores[*frame_label],
                vk::PipelineStageFlags2::TRANSFER | vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            )
            .signal(
                &self.render_complete_semaphores[image_idx],
                vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            );
        Gfx::get().gfx_queue().submit(vec![submit_info], Some(frame_fence));

        swapchain.present_image(Gfx::get().gfx_queue(), &[&self.render_complete_semaphores[image_idx]])
    }

    fn blit_to_swapchain(&self, cmd: &GfxCommandBuffer, render_target: &RenderTarget) {
        let swapchain = self.swapchain.as_ref().unwrap();

        cmd.begin_label("blit-to-swapchain", LabelColor::COLOR_STAGE);
        cmd.image_memory_barrier(
            vk::DependencyFlags::empty(),
            &[
                GfxImageBarrier::new()
                    .image(render_target.handle())
                    .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                    .layout_transfer(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL, vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
                    .src_mask(
                        vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                        vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                    )
                    .dst_mask(vk::PipelineStageFlags2::BLIT, vk::AccessFlags2::TRANSFER_READ),
                // 上一次 present 之后的内容不需要保留
                GfxImageBarrier::new()
                    .image(swapchain.current_image())
                    .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                    .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::empty())
                    .dst_mask(vk::PipelineStageFlags2::BLIT, vk::AccessFlags2::TRANSFER_WRITE),
            ],
        );

        cmd.cmd_blit_image_full(
            render_target.handle(),
            render_target.extent(),
            swapchain.current_image(),
            swapchain.extent(),
            vk::Filter::LINEAR,
        );

        cmd.image_memory_barrier(
            vk::DependencyFlags::empty(),
            &[
                GfxImageBarrier::new()
                    .image(swapchain.current_image())
                    .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                    .layout_transfer(vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .src_mask(vk::PipelineStageFlags2::BLIT, vk::AccessFlags2::TRANSFER_WRITE)
                    .dst_mask(
                        vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                        vk::AccessFlags2::COLOR_ATTACHMENT_READ | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                    ),
            ],
        );
        cmd.end_label();
    }

    fn draw_gui(&mut self, cmd: &GfxCommandBuffer, frame_label: FrameLabel, ui_draw_data: Option<&DrawData>) {
        let swapchain = self.swapchain.as_ref().unwrap();

        if let Some(draw_data) = ui_draw_data {
            cmd.begin_label("gui", LabelColor::COLOR_PASS);
            self.gui_backend.prepare_render_data(cmd, draw_data, frame_label);
            self.gui_backend.draw(
                cmd,
                swapchain.current_image_view().handle(),
                swapchain.extent(),
                frame_label,
                draw_data,
            );
            cmd.end_label();
        }

        // dst_stage 需要与 submit 时 signal semaphore 的 stage 匹配
        cmd.image_memory_barrier(
            vk::DependencyFlags::empty(),
            &[GfxImageBarrier::new()
                .image(swapchain.current_image())
                .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                .layout_transfer(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL, vk::ImageLayout::PRESENT_SRC_KHR)
                .src_mask(
                    vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                    vk::AccessFlags2::COLOR_ATTACHMENT_WRITE | vk::AccessFlags2::COLOR_ATTACHMENT_READ,
                )
                .dst_mask(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT, vk::AccessFlags2::empty())],
        );
    }
}
// destroy
impl RenderPresent {
    pub fn destroy(self) {
        for semaphore in self.present_complete_semaphores {
            semaphore.destroy();
        }
        for semaphore in self.render_complete_semaphores {
            semaphore.destroy();
        }
        if let Some(swapchain) = self.swapchain {
            swapchain.destroy();
        }
        self.gui_backend.destroy();
    }
}
