//! 着色器编译的共享类型和工具

use std::path::{Path, PathBuf};

use anyhow::Context;

/// Shader 的执行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    TessellationControl,
    TessellationEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// glslc `-fshader-stage` 的取值
    pub fn glslc_name(self) -> &'static str {
        match self {
            Self::Vertex => "vert",
            Self::TessellationControl => "tesc",
            Self::TessellationEvaluation => "tese",
            Self::Geometry => "geom",
            Self::Fragment => "frag",
            Self::Compute => "comp",
        }
    }
}

/// 着色器编译器 Trait
pub trait ShaderCompiler: Send + Sync {
    /// 编译着色器，编译器返回非零状态码时报错（附带 stderr）
    fn compile(&self, task: &ShaderCompileTask) -> anyhow::Result<()>;

    /// 根据 cmd 执行的结果，处理输出信息
    fn process_cmd_output(&self, tool: &str, output: std::process::Output) -> anyhow::Result<()> {
        if !output.stdout.is_empty() {
            log::info!("{} stdout: {}", tool, String::from_utf8_lossy(&output.stdout));
        }
        if !output.status.success() {
            anyhow::bail!("{} exited with {}: {}", tool, output.status, String::from_utf8_lossy(&output.stderr));
        }
        if !output.stderr.is_empty() {
            log::warn!("{} stderr: {}", tool, String::from_utf8_lossy(&output.stderr));
        }
        Ok(())
    }
}

/// 一个具体的编译任务
#[derive(Debug)]
pub struct ShaderCompileTask {
    pub shader_path: PathBuf,
    pub output_path: PathBuf,
    pub shader_stage: ShaderStage,
}

impl ShaderCompileTask {
    /// 从 shader 文件路径创建编译任务
    ///
    /// 输出路径为 `<build_root>/<相对路径>.spv`，例如
    /// `src/sss/gbuffer.vert` -> `.build/sss/gbuffer.vert.spv`。
    ///
    /// 文件不在 `src_root` 下，或扩展名不被支持时，返回 None
    pub fn new(shader_path: &Path, src_root: &Path, build_root: &Path) -> Option<Self> {
        let relative_path = shader_path.strip_prefix(src_root).ok()?;
        let shader_name = shader_path.file_name()?.to_str()?;

        let shader_stage = Self::parse_shader_stage(shader_name)?;

        let mut output_path = build_root.join(relative_path).into_os_string();
        output_path.push(".spv");

        Some(Self {
            shader_path: shader_path.to_path_buf(),
            output_path: PathBuf::from(output_path),
            shader_stage,
        })
    }

    /// 确保输出目录存在
    pub fn ensure_output_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create output dir {:?}", parent))?;
        }
        Ok(())
    }

    /// 根据扩展名解析 shader stage，`.glsl` 等 include 文件返回 None
    pub fn parse_shader_stage(shader_name: &str) -> Option<ShaderStage> {
        let ext = Path::new(shader_name).extension()?.to_str()?;
        let stage = match ext {
            "vert" => ShaderStage::Vertex,
            "frag" => ShaderStage::Fragment,
            "comp" => ShaderStage::Compute,
            "tesc" => ShaderStage::TessellationControl,
            "tese" => ShaderStage::TessellationEvaluation,
            "geom" => ShaderStage::Geometry,
            _ => return None,
        };

        Some(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glsl_stage_from_extension() {
        assert_eq!(ShaderCompileTask::parse_shader_stage("gbuffer.vert"), Some(ShaderStage::Vertex));
        assert_eq!(ShaderCompileTask::parse_shader_stage("gbuffer.frag"), Some(ShaderStage::Fragment));
        assert_eq!(ShaderCompileTask::parse_shader_stage("sh.comp"), Some(ShaderStage::Compute));
        assert_eq!(ShaderCompileTask::parse_shader_stage("x.geom"), Some(ShaderStage::Geometry));
        assert_eq!(ShaderStage::Compute.glslc_name(), "comp");
    }

    #[test]
    fn headers_are_skipped() {
        assert_eq!(ShaderCompileTask::parse_shader_stage("common.glsl"), None);
        assert_eq!(ShaderCompileTask::parse_shader_stage("README.md"), None);
        assert_eq!(ShaderCompileTask::parse_shader_stage("Makefile"), None);
    }

    #[test]
    fn output_keeps_relative_path() {
        let task = ShaderCompileTask::new(
            Path::new("/ws/shader/src/sss/gbuffer.vert"),
            Path::new("/ws/shader/src"),
            Path::new("/ws/shader/.build"),
        )
        .unwrap();
        assert_eq!(task.output_path, PathBuf::from("/ws/shader/.build/sss/gbuffer.vert.spv"));
        assert_eq!(task.shader_stage, ShaderStage::Vertex);
    }

    #[test]
    fn outside_src_root_is_ignored() {
        let task = ShaderCompileTask::new(
            Path::new("/elsewhere/a.frag"),
            Path::new("/ws/shader/src"),
            Path::new("/ws/shader/.build"),
        );
        assert!(task.is_none());
    }
}
