//! vkx 的应用层
//!
//! - [`render_app::RenderApp`]：串联窗口事件、GUI、相机以及 [`outer_app::OuterApp`]
//! - [`renderer::renderer::Renderer`]：frames in flight、命令分配、present
//! - [`outer_app`]：各个 demo 的实现
//! - [`scene`]：程序化生成的网格、纹理和灯光

pub mod gui_host;
pub mod outer_app;
pub mod platform;
pub mod render_app;
pub mod renderer;
pub mod scene;
pub mod settings;
