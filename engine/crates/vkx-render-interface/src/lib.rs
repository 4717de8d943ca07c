pub mod cmd_allocator;
pub mod frame_counter;
pub mod pipeline_settings;
