//! HTTP download transport for the image view.
//!
//! Downloads run on Tokio tasks. Their callbacks travel back over an
//! unbounded channel, and the owner of the controller drains that channel
//! on its own context, so controller state is only ever touched there.

pub mod client;
pub mod error;
pub mod pump;
pub mod transport;

pub use client::build_client;
pub use error::FetchError;
pub use pump::{drive, pump_pending};
pub use transport::{EventReceiver, EventSender, HttpTransport};
