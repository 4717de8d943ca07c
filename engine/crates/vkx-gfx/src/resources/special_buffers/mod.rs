pub mod index_buffer;
pub mod structured_buffer;
pub mod vertex_buffer;

/// 为包装了 GfxBuffer 的类型实现 Deref 以及 DebugType
#[macro_export]
macro_rules! impl_derive_buffer {
    ($name:ident<$($generic:ident $(: $bound:path)?),*>, $target:ty, $inner:ident) => {
        impl<$($generic $(: $bound)?),*> std::ops::Deref for $name<$($generic),*> {
            type Target = $target;

            fn deref(&self) -> &Self::Target {
                &self.$inner
            }
        }

        impl<$($generic $(: $bound)?),*> $crate::foundation::debug_messenger::DebugType for $name<$($generic),*> {
            fn debug_type_name() -> &'static str {
                stringify!($name)
            }

            fn vk_handle(&self) -> impl ash::vk::Handle {
                self.$inner.vk_buffer()
            }
        }
    };
}
