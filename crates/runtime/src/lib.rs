pub mod event_bus;
pub mod fade;
pub mod frame;

pub use event_bus::*;
pub use fade::*;
pub use frame::*;
