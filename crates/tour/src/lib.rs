pub mod definition;
pub mod error;
pub mod graph;
pub mod model;
pub mod tour;

pub use definition::*;
pub use error::*;
pub use graph::*;
pub use model::*;
pub use tour::*;
