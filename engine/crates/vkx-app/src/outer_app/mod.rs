use crate::{
    platform::camera::Camera,
    renderer::renderer::{RenderFrame, Renderer},
};

pub mod indirect_draw;
pub mod postprocess;
pub mod spherical_harmonic;
pub mod stochastic_filter;
pub mod subsurface;

/// 外部应用接口 trait
///
/// 每个 demo 实现这个 trait，由 [`crate::render_app::RenderApp`] 驱动生命周期。
///
/// # 开发模式
/// ```ignore
/// struct MyApp { pass: Option<MyPass> }
///
/// impl OuterApp for MyApp {
///     fn init(&mut self, renderer: &mut Renderer, camera: &mut Camera) {
///         self.pass = Some(MyPass::new(&renderer.frame_settings));
///     }
///
///     fn draw(&mut self, renderer: &mut Renderer, frame: &RenderFrame) {
///         self.pass.as_ref().unwrap().draw(renderer, frame);
///     }
/// }
/// ```
pub trait OuterApp {
    /// demo 的名字，用于窗口标题
    fn name(&self) -> &'static str;

    /// 窗口创建之后调用，此时 swapchain 已经存在
    fn init(&mut self, renderer: &mut Renderer, camera: &mut Camera);

    /// 绘制 GUI（可选）
    fn draw_ui(&mut self, _ui: &imgui::Ui) {}

    /// 每帧更新逻辑（可选）
    fn update(&mut self, _renderer: &mut Renderer) {}

    /// 录制并提交本帧的命令（发生于 acquire image 之后，present 之前）
    fn draw(&mut self, renderer: &mut Renderer, frame: &RenderFrame);

    /// 窗口大小改变后重建资源（可选）
    fn on_window_resized(&mut self, _renderer: &mut Renderer) {}

    /// 释放 GPU 资源，发生在 `Gfx::destroy` 之前
    fn destroy(&mut self);
}
