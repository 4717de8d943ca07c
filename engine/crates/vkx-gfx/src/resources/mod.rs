pub mod buffer;
pub mod image;
pub mod image_view;
pub mod layout;
pub mod special_buffers;
pub mod texture;
pub mod vertex_layout;
