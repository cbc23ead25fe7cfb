mod link_event;
mod peer_connection;
mod webrtc_connection;

pub use link_event::*;
pub use peer_connection::*;
pub use webrtc_connection::*;
