mod connections;
mod dispatcher;
mod event_output;
mod relay_service;
mod ws_handler;

pub use connections::*;
pub use dispatcher::*;
pub use event_output::*;
pub use relay_service::*;
pub use ws_handler::*;
