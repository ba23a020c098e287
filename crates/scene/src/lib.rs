pub mod camera;
pub mod hover;
pub mod mask;
pub mod picking;
pub mod projector;
pub mod slot;

pub use camera::*;
pub use hover::*;
pub use picking::*;
pub use projector::*;
pub use slot::*;
