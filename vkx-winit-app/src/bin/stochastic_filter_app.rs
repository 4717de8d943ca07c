use vkx_app::outer_app::stochastic_filter::stochastic_filter_app::StochasticFilterApp;
use vkx_winit_app::app::WinitApp;

fn main() {
    let outer_app = Box::new(StochasticFilterApp::default());
    WinitApp::run(outer_app);
}
