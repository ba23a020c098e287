pub mod cache;
pub mod image;
pub mod loader;

pub use cache::*;
pub use image::*;
pub use loader::*;
