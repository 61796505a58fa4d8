pub mod message;
pub mod mock;
pub mod model;
pub mod prompts;

pub use message::*;
pub use model::*;
