//! bazaar-core — shared types: clock, HTTP message, wire codec,
//! session data, and configuration. All other bazaar crates depend
//! on this one.

pub mod clock;
pub mod config;
pub mod message;
pub mod session;
pub mod wire;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use message::{Headers, Method, Request, Response, Status};
pub use session::Session;
