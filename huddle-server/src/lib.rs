mod app;
mod config;
mod error;
mod relay;
mod room;

pub use app::{router, serve};
pub use config::RelayConfig;
pub use error::DirectoryError;
pub use relay::*;
pub use room::*;
