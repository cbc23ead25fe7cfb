mod link_state;
mod peer_link;
mod signal_filter;

pub use link_state::*;
pub use peer_link::*;
pub use signal_filter::*;
