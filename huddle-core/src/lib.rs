pub mod model;
pub mod protocol;

pub use model::*;
pub use protocol::{ClientEvent, ServerEvent};
