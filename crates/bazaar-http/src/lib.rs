//! bazaar-http — the serving substrate: middleware chain, session pool
//! with background expiry, cookie tracking, and the accept loop.

pub mod app;
pub mod middlewares;
pub mod server;
pub mod session;

pub use app::{App, Handler, Middleware, Next};
pub use server::Server;
pub use session::{HouseKeeping, SessionPool, SessionTracker, Sweeper};
