mod chat_log;
mod peer_session;
mod session_command;

pub use chat_log::*;
pub use peer_session::*;
pub use session_command::*;
