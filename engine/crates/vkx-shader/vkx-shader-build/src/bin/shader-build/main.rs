//! Shader 编译工具
//!
//! 将 `shader/src` 下的所有 shader 文件编译为 SPIR-V，输出到 `shader/.build`。
//! 任意一个文件编译失败时，进程以非零状态码退出。

mod common;
mod glsl;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::{ShaderCompileTask, ShaderCompiler};
use glsl::GlslCompiler;
use rayon::prelude::*;
use vkx_crate_tools::init_log::init_log;
use vkx_crate_tools::resource::VkxPath;

fn main() {
    init_log();

    let src_root = VkxPath::shader_src_path();
    let build_root = VkxPath::shader_build_path();
    log::info!("Shader source path: {:?}", src_root);
    log::info!("Shader output path: {:?}", build_root);

    let compiler = GlslCompiler::new();
    let failed = AtomicUsize::new(0);
    let total = AtomicUsize::new(0);

    walkdir::WalkDir::new(&src_root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| ShaderCompileTask::new(entry.path(), &src_root, &build_root))
        .par_bridge()
        .for_each(|task| {
            total.fetch_add(1, Ordering::Relaxed);
            log::info!("Compiling shader: {:?}", task.shader_path);

            let result = task.ensure_output_dir().and_then(|_| compiler.compile(&task));
            if let Err(e) = result {
                failed.fetch_add(1, Ordering::Relaxed);
                log::error!("{:?}: {:#}", task.shader_path, e);
            }
        });

    let failed = failed.into_inner();
    let total = total.into_inner();
    if failed > 0 {
        log::error!("Shader compilation failed: {}/{} shaders.", failed, total);
        std::process::exit(1);
    }
    log::info!("Shader compilation completed: {} shaders.", total);
}
