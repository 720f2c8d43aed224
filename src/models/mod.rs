pub mod image;
pub mod storage;
pub mod wire;

pub use image::*;
pub use storage::*;
pub use wire::*;
