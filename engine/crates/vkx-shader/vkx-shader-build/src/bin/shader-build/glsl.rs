//! GLSL 着色器编译器
//!
//! 使用 glslc (来自 Vulkan SDK) 将 GLSL 着色器编译为 SPIR-V

use anyhow::Context;
use vkx_crate_tools::resource::VkxPath;

use crate::common::{ShaderCompileTask, ShaderCompiler};

/// GLSL 编译器
///
/// 使用 glslc 编译 `.vert`, `.frag`, `.comp` 等 GLSL 文件
#[derive(Debug, Default)]
pub struct GlslCompiler;

impl GlslCompiler {
    pub const fn new() -> Self {
        Self
    }
}

impl ShaderCompiler for GlslCompiler {
    fn compile(&self, task: &ShaderCompileTask) -> anyhow::Result<()> {
        let output = std::process::Command::new("glslc")
            .arg(format!("-I{}", VkxPath::shader_src_path().display()))
            .arg("-g") // 生成调试信息
            .arg("--target-env=vulkan1.3")
            .arg(format!("-fshader-stage={}", task.shader_stage.glslc_name()))
            .arg("-o")
            .arg(task.output_path.as_os_str())
            .arg(task.shader_path.as_os_str())
            .output()
            .context("Failed to execute glslc")?;

        self.process_cmd_output("glslc", output)
    }
}
