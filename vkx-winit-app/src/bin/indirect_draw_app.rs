use vkx_app::outer_app::indirect_draw::indirect_draw_app::IndirectDrawApp;
use vkx_winit_app::app::WinitApp;

fn main() {
    let outer_app = Box::new(IndirectDrawApp::default());
    WinitApp::run(outer_app);
}
