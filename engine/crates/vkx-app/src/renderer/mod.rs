pub mod fullscreen;
pub mod queue_transfer;
pub mod render_present;
pub mod render_target;
#[allow(clippy::module_inception)]
pub mod renderer;
