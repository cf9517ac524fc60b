pub mod config;
pub mod controller;
pub mod decode;
pub mod error;
pub mod geometry;
pub mod request;
pub mod style;
pub mod surface;
pub mod transport;

pub use controller::{Delivery, ImageLoadController, LoadState};
pub use decode::Image;
pub use error::LoadError;
pub use request::{LoadRequest, RequestId};
