use vkx_app::outer_app::postprocess::postprocess_app::PostprocessApp;
use vkx_winit_app::app::WinitApp;

fn main() {
    let outer_app = Box::new(PostprocessApp::default());
    WinitApp::run(outer_app);
}
