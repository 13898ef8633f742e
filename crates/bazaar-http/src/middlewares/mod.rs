//! Stock middlewares: access logging, the failure boundary, and
//! response header stamping.

mod access_log;
mod failsafe;
mod headers;

pub use access_log::{format_entry, AccessLogger};
pub use failsafe::Failsafe;
pub use headers::{DateHeader, ServerHeader};
