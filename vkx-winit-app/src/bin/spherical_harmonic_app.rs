use vkx_app::outer_app::spherical_harmonic::spherical_harmonic_app::SphericalHarmonicApp;
use vkx_winit_app::app::WinitApp;

fn main() {
    let outer_app = Box::new(SphericalHarmonicApp::default());
    WinitApp::run(outer_app);
}
