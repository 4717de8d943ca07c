pub mod pos_normal_uv;
