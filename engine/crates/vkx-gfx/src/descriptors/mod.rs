pub mod descriptor;
pub mod descriptor_cursor;
pub mod descriptor_pool;
pub mod sampler;
