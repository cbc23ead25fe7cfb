mod connection;
mod error;
mod link;
mod media;
mod relay_client;
mod session;

pub use connection::*;
pub use error::{ClientError, DeviceError, NegotiationError};
pub use link::*;
pub use media::*;
pub use relay_client::{RelayConnection, RelayParts};
pub use session::*;
