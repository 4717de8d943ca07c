//! imgui 的 Vulkan 后端
//!
//! - [`gui_mesh::GuiMesh`]：每个 frame in flight 一份 vertex/index buffer
//! - [`gui_pass::GuiPass`]：在 swapchain image 上叠加绘制 UI
//! - [`gui_backend::GuiBackend`]：持有字体纹理，串联上面两者

pub mod gui_backend;
pub mod gui_mesh;
pub mod gui_pass;
pub mod gui_vertex_layout;
