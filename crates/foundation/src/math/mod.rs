pub mod precision;
pub mod quat;
pub mod spherical;
pub mod vec;

pub use precision::*;
pub use quat::*;
pub use spherical::*;
pub use vec::*;
