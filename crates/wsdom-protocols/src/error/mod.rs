//! Error types for the wsdom protocol layer.

mod protocol;
mod transport;
mod sandbox;

pub use protocol::*;
pub use transport::*;
pub use sandbox::*;
