mod apply;
mod candidate_buffer;

pub use apply::*;
pub use candidate_buffer::*;
