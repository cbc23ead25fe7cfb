mod room;
mod room_command;
mod room_manager;
mod session;

pub use room::*;
pub use room_command::*;
pub use room_manager::*;
pub use session::*;
