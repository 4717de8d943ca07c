//! 各个 demo 共用的程序化资源：网格、纹理、光源

pub mod lights;
pub mod mesh;
pub mod shapes;
pub mod textures;
