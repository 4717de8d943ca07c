use vkx_app::outer_app::subsurface::subsurface_app::SubsurfaceApp;
use vkx_winit_app::app::WinitApp;

fn main() {
    let outer_app = Box::new(SubsurfaceApp::default());
    WinitApp::run(outer_app);
}
