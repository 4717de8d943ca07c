use std::path::{Path, PathBuf};

/// 统一资源路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导）。
///
/// # 使用示例
/// ```ignore
/// let cfg = VkxPath::resources_path("demos.toml");                 // resources/demos.toml
/// let shader = VkxPath::shader_build_path_str("sss/gbuffer.vert"); // shader/.build/sss/gbuffer.vert.spv
/// ```
pub struct VkxPath {}
impl VkxPath {
    /// 获取 `resources/` 目录下的文件路径
    pub fn resources_path(filename: &str) -> PathBuf {
        Self::workspace_path().join("resources").join(filename)
    }

    /// 获取 `shader/.build/` 目录下的着色器路径（编译后的 SPIR-V）
    pub fn shader_build_path_str(filename: &str) -> String {
        let mut shader_build_path = Self::shader_build_path().join(filename).to_str().unwrap().to_string();
        shader_build_path.push_str(".spv");
        shader_build_path
    }

    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent() // engine/crates
            .unwrap()
            .parent() // engine
            .unwrap()
            .parent() // workspace root
            .unwrap()
            .to_path_buf()
    }

    pub fn shader_root_path() -> PathBuf {
        Self::workspace_path().join("shader")
    }

    /// 着色器源码目录
    pub fn shader_src_path() -> PathBuf {
        Self::shader_root_path().join("src")
    }

    /// 着色器编译产物目录
    pub fn shader_build_path() -> PathBuf {
        Self::shader_root_path().join(".build")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_contains_root_manifest() {
        assert!(VkxPath::workspace_path().join("Cargo.toml").exists());
    }

    #[test]
    fn shader_build_path_appends_spv() {
        let p = VkxPath::shader_build_path_str("sss/gbuffer.vert");
        assert!(p.ends_with(".vert.spv"));
        assert!(Path::new(&p).starts_with(VkxPath::shader_build_path()));
    }

    #[test]
    fn resources_under_workspace() {
        let p = VkxPath::resources_path("demos.toml");
        assert!(p.starts_with(VkxPath::workspace_path()));
        assert_eq!(p.file_name().unwrap(), "demos.toml");
    }
}
