use std::rc::Rc;

use ash::vk;
use itertools::Itertools;
use vkx_crate_tools::resource::VkxPath;
use vkx_descriptor_layout_macro::DescriptorLayout;
use vkx_descriptor_layout_trait::DescriptorBindingLayout;
use vkx_gfx::{
    basic::color::LabelColor,
    commands::command_buffer::GfxCommandBuffer,
    descriptors::{
        descriptor::{GfxDescriptorSet, GfxDescriptorSetLayout},
        descriptor_cursor::GfxDescriptorCursor,
        descriptor_pool::{GfxDescriptorPool, GfxDescriptorPoolCreateInfo},
    },
    gfx::Gfx,
    pipelines::{
        graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo, GfxPipelineLayout},
        rendering_info::GfxRenderingInfo,
    },
    resources::{
        special_buffers::structured_buffer::GfxStructuredBuffer, texture::GfxTextureCube,
        vertex_layout::pos_normal_uv::VertexLayoutPosNormalUv,
    },
};
use vkx_render_interface::{frame_counter::FrameCounter, pipeline_settings::FrameLabel};

use crate::{
    outer_app::spherical_harmonic::ShControl,
    platform::camera::Camera,
    renderer::{
        render_target::RenderTarget,
        renderer::{RENDER_TARGET_FORMAT, RenderFrame},
    },
    scene::{
        mesh::{GpuMesh, MeshData},
        shapes::{Cube, Head, Rock, UvSphere},
    },
};

/// SH 重建光照的球体所在位置
pub const SH_SPHERE_TRANSLATION: glam::Vec3 = glam::Vec3::new(2.0, 0.0, 0.0);

/// 直接采样 cube map 做反射的物体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReflectObject {
    #[default]
    Sphere,
    Cube,
    Rock,
    Head,
}

impl ReflectObject {
    pub const ALL: [ReflectObject; 4] = [Self::Sphere, Self::Cube, Self::Rock, Self::Head];

    pub fn label(self) -> &'static str {
        match self {
            Self::Sphere => "Sphere",
            Self::Cube => "Cube",
            Self::Rock => "Rock",
            Self::Head => "Head",
        }
    }

    /// 大小都调整到与单位球接近
    fn mesh(self) -> MeshData {
        match self {
            Self::Sphere => UvSphere::mesh(64, 32),
            Self::Cube => Cube::mesh().transformed(glam::Mat4::from_scale(glam::Vec3::splat(1.4))),
            Self::Rock => Rock::mesh().transformed(glam::Mat4::from_scale(glam::Vec3::splat(1.6))),
            Self::Head => Head::mesh(),
        }
    }
}

#[derive(DescriptorLayout)]
struct ShSceneDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "VERTEX | FRAGMENT"]
    _ubo: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _environment: (),

    #[binding = 2]
    #[descriptor_type = "STORAGE_BUFFER"]
    #[stage = "FRAGMENT"]
    _coefficients: (),
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShUniform {
    pub projection: glam::Mat4,
    pub model_view: glam::Mat4,
    /// 把 view 空间的方向转回世界空间，用于采样 cube map
    pub inverse_view: glam::Mat4,
    /// skybox 与反射物体：x 为 lod bias；SH 球体：[`ShControl`]
    pub params: glam::Vec4,
}

impl ShUniform {
    /// 去掉 view 的平移，天空盒始终包围相机
    pub fn skybox(camera: &Camera) -> Self {
        let view = camera.get_view_matrix();
        Self {
            projection: camera.get_projection_matrix(),
            model_view: glam::Mat4::from_mat3(glam::Mat3::from_mat4(view)),
            inverse_view: view.inverse(),
            params: glam::Vec4::ZERO,
        }
    }

    pub fn reflect(camera: &Camera, model: glam::Mat4, lod_bias: f32) -> Self {
        let view = camera.get_view_matrix();
        Self {
            projection: camera.get_projection_matrix(),
            model_view: view * model,
            inverse_view: view.inverse(),
            params: glam::vec4(lod_bias, 0.0, 0.0, 0.0),
        }
    }

    pub fn sh_sphere(camera: &Camera, control: ShControl) -> Self {
        let view = camera.get_view_matrix();
        Self {
            projection: camera.get_projection_matrix(),
            model_view: view * glam::Mat4::from_translation(SH_SPHERE_TRANSLATION),
            inverse_view: view.inverse(),
            params: control.0,
        }
    }
}

struct SceneFrame {
    skybox_ubo: GfxStructuredBuffer<ShUniform>,
    reflect_ubo: GfxStructuredBuffer<ShUniform>,
    sh_ubo: GfxStructuredBuffer<ShUniform>,
    skybox_set: GfxDescriptorSet<ShSceneDescriptorLayout>,
    reflect_set: GfxDescriptorSet<ShSceneDescriptorLayout>,
    sh_set: GfxDescriptorSet<ShSceneDescriptorLayout>,
}

/// 绘制设置，每帧由 UI 决定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShSceneSettings {
    pub object: ReflectObject,
    pub show_skybox: bool,
    pub lod_bias: f32,
}

pub struct ShScenePass {
    skybox_pipeline: GfxGraphicsPipeline,
    reflect_pipeline: GfxGraphicsPipeline,
    sh_pipeline: GfxGraphicsPipeline,
    pipeline_layout: Rc<GfxPipelineLayout>,
    frames: Vec<SceneFrame>,

    skybox_mesh: GpuMesh,
    object_meshes: Vec<GpuMesh>,
    sh_sphere_mesh: GpuMesh,

    depth: RenderTarget,
    depth_format: vk::Format,

    _set_layout: GfxDescriptorSetLayout<ShSceneDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl ShScenePass {
    pub fn new(
        environment: &GfxTextureCube,
        coefficients: &[&GfxStructuredBuffer<glam::Vec4>],
        depth_format: vk::Format,
        extent: vk::Extent2D,
    ) -> Self {
        let fif = FrameCounter::fif_count() as u32;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                fif * 3,
                ShSceneDescriptorLayout::pool_sizes(fif * 3),
            ),
            "sh-scene",
        );
        let set_layout =
            GfxDescriptorSetLayout::<ShSceneDescriptorLayout>::new(vk::DescriptorSetLayoutCreateFlags::empty(), "sh-scene");
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "sh-scene"));

        let pipeline = |shader: &str, cull: vk::CullModeFlags, depth_test: bool| {
            let mut create_info = GfxGraphicsPipelineCreateInfo::default();
            create_info
                .vertex_shader_stage(VkxPath::shader_build_path_str(&format!("sh/{}.vert", shader)), c"main")
                .fragment_shader_stage(VkxPath::shader_build_path_str(&format!("sh/{}.frag", shader)), c"main")
                .vertex_layout::<VertexLayoutPosNormalUv>()
                .attach_info(vec![RENDER_TARGET_FORMAT], Some(depth_format), None)
                .cull_mode(cull, vk::FrontFace::COUNTER_CLOCKWISE);
            if depth_test {
                create_info.depth_test(Some(vk::CompareOp::LESS_OR_EQUAL), true, false);
            } else {
                create_info.depth_test(None, false, false);
            }
            GfxGraphicsPipeline::new(&create_info, pipeline_layout.clone(), &format!("sh-{}", shader))
        };
        let skybox_pipeline = pipeline("skybox", vk::CullModeFlags::FRONT, false);
        let reflect_pipeline = pipeline("reflect", vk::CullModeFlags::BACK, true);
        let sh_pipeline = pipeline("sh_sphere", vk::CullModeFlags::BACK, true);

        let frames = FrameCounter::frame_labels()
            .iter()
            .zip(coefficients)
            .map(|(label, coefficient_buffer)| {
                let new_ubo = |name: &str| GfxStructuredBuffer::<ShUniform>::new_ubo(1, format!("sh-{}-{}", name, label));
                let new_set =
                    |name: &str| GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("sh-{}-{}", name, label));
                let frame = SceneFrame {
                    skybox_ubo: new_ubo("skybox"),
                    reflect_ubo: new_ubo("reflect"),
                    sh_ubo: new_ubo("sh-sphere"),
                    skybox_set: new_set("skybox"),
                    reflect_set: new_set("reflect"),
                    sh_set: new_set("sh-sphere"),
                };
                let writes = [
                    (&frame.skybox_set, &frame.skybox_ubo),
                    (&frame.reflect_set, &frame.reflect_ubo),
                    (&frame.sh_set, &frame.sh_ubo),
                ]
                .iter()
                .flat_map(|(set, ubo)| {
                    [
                        ShSceneDescriptorLayout::ubo().write_buffer(set.handle(), 0, vec![ubo.descriptor_info()]),
                        ShSceneDescriptorLayout::environment().write_image(
                            set.handle(),
                            0,
                            vec![environment.descriptor_image_info()],
                        ),
                        ShSceneDescriptorLayout::coefficients().write_buffer(
                            set.handle(),
                            0,
                            vec![coefficient_buffer.descriptor_info()],
                        ),
                    ]
                })
                .collect_vec();
                Gfx::get().gfx_device().write_descriptor_sets(&writes);
                frame
            })
            .collect_vec();

        let object_meshes = ReflectObject::ALL
            .iter()
            .map(|object| object.mesh().upload(&format!("sh-{}", object.label().to_lowercase())))
            .collect_vec();

        Self {
            skybox_pipeline,
            reflect_pipeline,
            sh_pipeline,
            pipeline_layout,
            frames,
            skybox_mesh: Cube::mesh().upload("sh-skybox"),
            object_meshes,
            sh_sphere_mesh: UvSphere::mesh(64, 32).upload("sh-sphere"),
            depth: RenderTarget::new_depth(extent, depth_format, "sh-depth"),
            depth_format,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        }
    }

    /// 深度缓冲与窗口大小一致
    pub fn rebuild_depth(&mut self, extent: vk::Extent2D) {
        let depth = std::mem::replace(&mut self.depth, RenderTarget::new_depth(extent, self.depth_format, "sh-depth"));
        depth.destroy();
    }
}
// update
impl ShScenePass {
    pub fn update(&mut self, frame_label: FrameLabel, camera: &Camera, control: ShControl, settings: &ShSceneSettings) {
        let frame = &mut self.frames[*frame_label];
        frame.skybox_ubo.write(&ShUniform::skybox(camera));
        frame.reflect_ubo.write(&ShUniform::reflect(camera, glam::Mat4::IDENTITY, settings.lod_bias));
        frame.sh_ubo.write(&ShUniform::sh_sphere(camera, control));
    }
}
// draw
impl ShScenePass {
    fn draw_mesh(&self, cmd: &GfxCommandBuffer, pipeline: &GfxGraphicsPipeline, set: vk::DescriptorSet, mesh: &GpuMesh) {
        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, pipeline.handle());
        cmd.bind_descriptor_sets(vk::PipelineBindPoint::GRAPHICS, self.pipeline_layout.handle(), 0, &[set], None);
        mesh.draw(cmd, 1, 0);
    }

    pub fn record(&self, cmd: &GfxCommandBuffer, frame: &RenderFrame, settings: &ShSceneSettings) {
        let scene = &self.frames[*frame.frame_label];
        cmd.image_memory_barrier(
            vk::DependencyFlags::empty(),
            &[frame.target_barrier(), self.depth.barrier_to_attachment()],
        );

        cmd.begin_label("sh-scene", LabelColor::COLOR_PASS);
        cmd.cmd_begin_rendering2(
            &GfxRenderingInfo::new_full(vec![frame.target_view], Some(self.depth.view()), frame.extent)
                .clear_color([0.1, 0.1, 0.1, 1.0]),
        );
        cmd.cmd_set_viewport_scissor(frame.extent);

        if settings.show_skybox {
            self.draw_mesh(cmd, &self.skybox_pipeline, scene.skybox_set.handle(), &self.skybox_mesh);
        }
        let object_idx = ReflectObject::ALL.iter().position(|o| *o == settings.object).unwrap_or_default();
        self.draw_mesh(cmd, &self.reflect_pipeline, scene.reflect_set.handle(), &self.object_meshes[object_idx]);
        self.draw_mesh(cmd, &self.sh_pipeline, scene.sh_set.handle(), &self.sh_sphere_mesh);

        cmd.end_rendering();
        cmd.end_label();
    }
}
// destroy
impl ShScenePass {
    pub fn destroy(self) {
        self.depth.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skybox_ignores_camera_translation() {
        let mut camera = Camera::default();
        camera.position = glam::vec3(3.0, -2.0, 7.0);
        let uniform = ShUniform::skybox(&camera);
        let origin = uniform.model_view * glam::Vec4::W;
        assert!(origin.truncate().length() < 1e-5);
        assert_eq!(size_of::<ShUniform>(), 3 * 64 + 16);
    }

    #[test]
    fn sh_sphere_is_offset_from_reflect_object() {
        let camera = Camera::default();
        let view = camera.get_view_matrix();
        let sh = ShUniform::sh_sphere(&camera, ShControl::new(4, 7921));
        let center = sh.model_view * glam::Vec4::W;
        let expected = view * SH_SPHERE_TRANSLATION.extend(1.0);
        assert!((center - expected).abs().max_element() < 1e-5);
        assert_eq!(ShControl(sh.params).band(), 4);

        let reflect = ShUniform::reflect(&camera, glam::Mat4::IDENTITY, 1.5);
        assert_eq!(reflect.params.x, 1.5);
    }

    #[test]
    fn inverse_view_restores_world_direction() {
        let mut camera = Camera::default();
        camera.euler_yaw_deg = 30.0;
        camera.euler_pitch_deg = -10.0;
        let uniform = ShUniform::reflect(&camera, glam::Mat4::IDENTITY, 0.0);
        let world = glam::Vec3::X;
        let view_dir = camera.get_view_matrix().transform_vector3(world);
        let restored = uniform.inverse_view.transform_vector3(view_dir);
        assert!((restored - world).length() < 1e-5);
    }
}
