//! Vulkan 抽象层
//!
//! 对 Vulkan API 做一层薄封装：设备管理、命令缓冲、描述符、管线、交换链等。
//! 所有 Vulkan 资源通过 [`gfx::Gfx`] 单例访问设备和分配器，简化生命周期和借用关系。
//!
//! Vulkan 调用的失败被视为致命错误，直接 panic。

pub mod basic;
pub mod commands;
pub mod descriptors;
pub mod foundation;
pub mod gfx;
pub mod gfx_core;
pub mod pipelines;
pub mod resources;
pub mod swapchain;
