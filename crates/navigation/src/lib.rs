pub mod config;
pub mod engine;
pub mod history;
pub mod input;
pub mod staging;
pub mod transition;

pub use config::*;
pub use engine::*;
pub use history::*;
pub use input::*;
pub use transition::*;
