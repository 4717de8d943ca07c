use std::ffi::CStr;

use ash::vk;

/// 将 validation layer 的消息转发到 `log`
pub struct GfxDebugMsger {
    vk_debug_utils_instance: ash::ext::debug_utils::Instance,
    vk_debug_utils_messenger: vk::DebugUtilsMessengerEXT,
}

impl GfxDebugMsger {
    pub fn new(vk_pf: &ash::Entry, instance: &ash::Instance) -> Self {
        let loader = ash::ext::debug_utils::Instance::new(vk_pf, instance);

        let create_info = Self::debug_utils_messenger_ci();
        let debug_messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None).unwrap() };

        Self {
            vk_debug_utils_instance: loader,
            vk_debug_utils_messenger: debug_messenger,
        }
    }

    pub fn destroy(self) {
        // 触发 drop 进行销毁
    }
}

impl Drop for GfxDebugMsger {
    fn drop(&mut self) {
        unsafe {
            log::info!("destroying debug messenger");
            self.vk_debug_utils_instance.destroy_debug_utils_messenger(self.vk_debug_utils_messenger, None);
        }
    }
}

/// 将 validation 消息拆分为 (附加信息, 主消息)
///
/// 新版本的 validation layer 会输出 json，其中 MainMessage 字段带换行，需要单独输出；
/// 非 json 的消息原样返回
fn split_validation_message(msg: &str) -> (String, String) {
    let mut json_value = serde_json::from_str::<serde_json::Value>(msg);
    let json_obj = json_value.as_mut().ok().and_then(|v| v.as_object_mut());
    match json_obj {
        Some(obj) => {
            let main_msg = obj.remove("MainMessage").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
            let rest = serde_json::to_string_pretty(&obj).unwrap_or_default();
            (rest, main_msg)
        }
        None => (String::new(), msg.to_string()),
    }
}

/// debug messenger 的回调函数
/// # Safety
/// 由 Vulkan loader 调用，`p_callback_data` 保证有效
unsafe extern "system" fn vk_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let callback_data = unsafe { *p_callback_data };

    let msg = if callback_data.p_message.is_null() {
        std::borrow::Cow::from("")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() }
    };

    let (extra, main_msg) = split_validation_message(msg.as_ref());
    let format_msg = format!("[{:?}]\n{}\n{}\n", message_type, extra, main_msg);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => log::error!("{}", format_msg),
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::warn!("{}", format_msg),
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => log::info!("{}", format_msg),
        _ => log::trace!("{}", format_msg),
    };

    // 只有 layer developer 才需要返回 True
    vk::FALSE
}

// 构造过程辅助函数
impl GfxDebugMsger {
    pub fn debug_msg_type() -> vk::DebugUtilsMessageTypeFlagsEXT {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
    }

    pub fn debug_msg_severity() -> vk::DebugUtilsMessageSeverityFlagsEXT {
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
    }

    /// 用于创建 debug messenger 的结构体，也会挂在 instance create info 上
    pub fn debug_utils_messenger_ci() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
        vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(Self::debug_msg_severity())
            .message_type(Self::debug_msg_type())
            .pfn_user_callback(Some(vk_debug_callback))
    }
}

/// 可以设置 debug name 的 Vulkan 对象
pub trait DebugType {
    fn debug_type_name() -> &'static str;
    fn vk_handle(&self) -> impl vk::Handle;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_is_kept() {
        let (extra, main) = split_validation_message("vkCreateImage: bad usage");
        assert!(extra.is_empty());
        assert_eq!(main, "vkCreateImage: bad usage");
    }

    #[test]
    fn json_message_splits_main_message() {
        let (extra, main) = split_validation_message(r#"{"MainMessage":"line1\nline2","MessageID":42}"#);
        assert_eq!(main, "line1\nline2");
        assert!(extra.contains("MessageID"));
        assert!(!extra.contains("MainMessage"));
    }
}
