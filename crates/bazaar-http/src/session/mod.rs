//! Session lifecycle: the concurrent pool, the cookie tracker that binds
//! sessions to requests, and the periodic housekeeping sweep.

mod housekeeping;
mod pool;
mod tracker;

pub use housekeeping::{HouseKeeping, Sweeper};
pub use pool::SessionPool;
pub use tracker::SessionTracker;
