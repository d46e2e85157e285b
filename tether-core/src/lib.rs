pub mod codec;
pub mod model;
pub mod utils;

pub use model::*;
