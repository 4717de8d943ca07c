use std::ffi::CStr;

use ash::vk;
use imgui::DrawData;
use itertools::Itertools;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use vkx_gfx::{
    commands::{barrier::GfxImageBarrier, fence::GfxFence},
    gfx::Gfx,
};
use vkx_render_interface::{
    cmd_allocator::CmdAllocator,
    frame_counter::FrameCounter,
    pipeline_settings::{DefaultRendererSettings, FrameLabel, FrameSettings},
};

use crate::{
    platform::{camera::Camera, timer::Timer},
    renderer::{render_present::RenderPresent, render_target::RenderTarget},
    settings::DemoConfig,
};

/// demo 输出的 render target 格式，present 时 blit 到 swapchain
pub const RENDER_TARGET_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

/// 当前帧交给 [`crate::outer_app::OuterApp::draw`] 的信息
///
/// demo 需要在 `target_image` 上绘制，绘制完成后保持 COLOR_ATTACHMENT_OPTIMAL
#[derive(Copy, Clone, Debug)]
pub struct RenderFrame {
    pub frame_label: FrameLabel,
    pub frame_id: u64,
    pub target_image: vk::Image,
    pub target_view: vk::ImageView,
    pub extent: vk::Extent2D,
}

impl RenderFrame {
    /// 本帧开始绘制前的 render target 转换
    ///
    /// 上一次使用是 present 时的 blit，旧内容不需要保留
    pub fn target_barrier(&self) -> GfxImageBarrier {
        GfxImageBarrier::new()
            .image(self.target_image)
            .image_aspect_flag(vk::ImageAspectFlags::COLOR)
            .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .src_mask(vk::PipelineStageFlags2::BLIT, vk::AccessFlags2::empty())
            .dst_mask(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT, vk::AccessFlags2::COLOR_ATTACHMENT_WRITE)
    }
}

/// 帧调度：frames in flight、命令分配、fence、present
pub struct Renderer {
    pub frame_settings: FrameSettings,
    pub frame_counter: FrameCounter,
    pub timer: Timer,
    pub cmd_allocator: CmdAllocator,
    pub config: DemoConfig,

    /// 每个 frame in flight 一个，由 present 的 submit signal
    fif_fences: [GfxFence; FrameCounter::fif_count()],

    /// 每个 frame in flight 一个，窗口创建之后才存在
    render_targets: Vec<RenderTarget>,

    pub render_present: Option<RenderPresent>,

    /// 本帧开始前的相机快照
    camera: Camera,
}
// new & init
impl Renderer {
    pub fn new(app_name: String, extra_instance_ext: Vec<&'static CStr>) -> Self {
        Gfx::init(app_name, extra_instance_ext);

        let config = DemoConfig::load();
        let depth_format = Gfx::get()
            .find_supported_format(
                DefaultRendererSettings::DEPTH_FORMAT_CANDIDATES,
                vk::ImageTiling::OPTIMAL,
                vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            )
            .first()
            .copied()
            .unwrap_or(vk::Format::UNDEFINED);
        assert_ne!(depth_format, vk::Format::UNDEFINED, "no supported depth format");

        let limits = Gfx::get().physical_device().limits();
        log::info!(
            "device limits: max image 2d {}, max compute work group count {:?}, min ubo align {}",
            limits.max_image_dimension2_d,
            limits.max_compute_work_group_count,
            limits.min_uniform_buffer_offset_alignment
        );

        let fif_fences = FrameCounter::frame_labels().map(|label| GfxFence::new(true, &format!("fif-fence-{}", label)));

        Self {
            frame_settings: FrameSettings {
                color_format: RENDER_TARGET_FORMAT,
                depth_format,
                frame_extent: vk::Extent2D::default(),
            },
            frame_counter: FrameCounter::new(0, 120.0),
            timer: Timer::default(),
            cmd_allocator: CmdAllocator::new(FrameCounter::fif_count()),
            config,
            fif_fences,
            render_targets: Vec::new(),
            render_present: None,
            camera: Camera::default(),
        }
    }

    pub fn init_after_window(
        &mut self,
        raw_display_handle: RawDisplayHandle,
        raw_window_handle: RawWindowHandle,
        window_extent: vk::Extent2D,
    ) {
        let render_present = RenderPresent::new(raw_display_handle, raw_window_handle, window_extent);
        self.frame_settings.frame_extent = render_present.swapchain().extent();
        self.render_present = Some(render_present);
        self.rebuild_render_targets();
    }

    fn rebuild_render_targets(&mut self) {
        std::mem::take(&mut self.render_targets).into_iter().for_each(RenderTarget::destroy);
        let extent = self.frame_settings.frame_extent;
        self.render_targets = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                RenderTarget::new(
                    extent,
                    RENDER_TARGET_FORMAT,
                    vk::ImageUsageFlags::COLOR_ATTACHMENT
                        | vk::ImageUsageFlags::TRANSFER_SRC
                        | vk::ImageUsageFlags::SAMPLED,
                    &format!("render-target-{}", label),
                )
            })
            .collect_vec();
        log::info!("render targets: {}x{}", extent.width, extent.height);
    }
}
// getters
impl Renderer {
    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn frame_extent(&self) -> vk::Extent2D {
        self.frame_settings.frame_extent
    }

    /// 当前帧的输出信息，需要在 [`Self::begin_frame`] 之后调用
    pub fn current_frame(&self) -> RenderFrame {
        let frame_label = self.frame_counter.frame_label();
        let target = &self.render_targets[*frame_label];
        RenderFrame {
            frame_label,
            frame_id: self.frame_counter.frame_id(),
            target_image: target.handle(),
            target_view: target.view(),
            extent: target.extent(),
        }
    }
}
// phase call
impl Renderer {
    /// 距离上一帧的时间是否超过了帧率限制
    pub fn time_to_render(&self) -> bool {
        let limit_elapsed_us = 1000.0 * 1000.0 / self.frame_counter.frame_limit();
        limit_elapsed_us < self.timer.elapsed_since_tick().as_micros() as f32
    }

    /// # Phase: Begin Frame
    ///
    /// 等待当前 frame label 上一轮的命令执行完成，然后获取 swapchain image
    ///
    /// return: false 表示 swapchain 过期，本帧应当跳过
    pub fn begin_frame(&mut self) -> bool {
        let _span = tracy_client::span!("Renderer::begin_frame");
        let frame_label = self.frame_counter.frame_label();

        {
            let _span = tracy_client::span!("wait fif fence");
            self.fif_fences[*frame_label].wait();
        }

        let acquired = self.render_present.as_mut().unwrap().acquire_image(frame_label);
        if acquired.is_none() {
            // fence 没有 reset，下一次 begin_frame 不会阻塞
            return false;
        }

        self.fif_fences[*frame_label].reset();
        self.cmd_allocator.free_frame_commands(frame_label);
        self.timer.tick();
        true
    }

    /// # Phase: Before Render
    pub fn before_render(&mut self, camera: &Camera) {
        self.camera.clone_from(camera);
    }

    /// # Phase: Present
    ///
    /// return: 是否需要重建 swapchain
    pub fn present(&mut self, ui_draw_data: Option<&DrawData>) -> bool {
        let frame_label = self.frame_counter.frame_label();
        self.render_present.as_mut().unwrap().present(
            &mut self.cmd_allocator,
            frame_label,
            &self.render_targets[*frame_label],
            ui_draw_data,
            &self.fif_fences[*frame_label],
        )
    }

    /// # Phase: End Frame
    pub fn end_frame(&mut self) {
        self.frame_counter.next_frame();
    }

    /// 重建 swapchain 以及 render target
    pub fn resize_frame_buffer(&mut self, window_extent: vk::Extent2D) {
        let render_present = self.render_present.as_mut().unwrap();
        render_present.rebuild_after_resized(window_extent);
        self.frame_settings.frame_extent = render_present.swapchain().extent();
        self.rebuild_render_targets();
    }
}
// destroy
impl Renderer {
    pub fn destroy(mut self) {
        Gfx::get().wait_idel();

        std::mem::take(&mut self.render_targets).into_iter().for_each(RenderTarget::destroy);
        if let Some(render_present) = self.render_present.take() {
            render_present.destroy();
        }
        for fence in self.fif_fences {
            fence.destroy();
        }
        self.cmd_allocator.destroy();
    }
}
