use ash::vk;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

#[derive(Clone, Copy)]
pub struct GfxSamplerCreateInfo {
    inner: vk::SamplerCreateInfo<'static>,
}

impl Default for GfxSamplerCreateInfo {
    fn default() -> Self {
        let sampler_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::NEVER)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(1.0);

        Self { inner: sampler_info }
    }
}

impl GfxSamplerCreateInfo {
    /// 默认配置：linear，repeat
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn clamp_to_edge(mut self) -> Self {
        self.inner.address_mode_u = vk::SamplerAddressMode::CLAMP_TO_EDGE;
        self.inner.address_mode_v = vk::SamplerAddressMode::CLAMP_TO_EDGE;
        self.inner.address_mode_w = vk::SamplerAddressMode::CLAMP_TO_EDGE;
        self
    }

    #[inline]
    pub fn nearest(mut self) -> Self {
        self.inner.mag_filter = vk::Filter::NEAREST;
        self.inner.min_filter = vk::Filter::NEAREST;
        self.inner.mipmap_mode = vk::SamplerMipmapMode::NEAREST;
        self
    }

    /// 只有 device 开启了 samplerAnisotropy 时才会生效
    #[inline]
    pub fn anisotropy(mut self, max_anisotropy: f32) -> Self {
        self.inner.anisotropy_enable = vk::TRUE;
        self.inner.max_anisotropy = max_anisotropy;
        self
    }
}

pub struct GfxSampler {
    handle: vk::Sampler,
}
impl DebugType for GfxSampler {
    fn debug_type_name() -> &'static str {
        "GfxSampler"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
impl Drop for GfxSampler {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_sampler(self.handle, None);
        }
    }
}

impl GfxSampler {
    #[inline]
    pub fn new(info: &GfxSamplerCreateInfo, debug_name: &str) -> Self {
        let gfx_device = Gfx::get().gfx_device();
        let mut ci = info.inner;
        if ci.anisotropy_enable == vk::TRUE && !gfx_device.enabled_features().sampler_anisotropy {
            ci.anisotropy_enable = vk::FALSE;
            ci.max_anisotropy = 1.0;
        }
        let handle = unsafe { gfx_device.create_sampler(&ci, None).unwrap() };
        let sampler = Self { handle };
        gfx_device.set_debug_name(&sampler, debug_name);
        sampler
    }

    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_flags() {
        let ci = GfxSamplerCreateInfo::new().clamp_to_edge().anisotropy(8.0);
        assert_eq!(ci.inner.address_mode_u, vk::SamplerAddressMode::CLAMP_TO_EDGE);
        assert_eq!(ci.inner.anisotropy_enable, vk::TRUE);
        assert_eq!(ci.inner.max_anisotropy, 8.0);

        let ci = GfxSamplerCreateInfo::new().nearest();
        assert_eq!(ci.inner.mag_filter, vk::Filter::NEAREST);
    }
}
