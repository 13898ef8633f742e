//! Middleware chain composition.
//!
//! A request flows outermost → innermost through the configured chain and
//! ends at the terminal [`Handler`]; responses unwind back out in reverse.
//! Each middleware receives a [`Next`] continuation it can run at most
//! once — `Next::run` consumes it, so exactly-once delegation and
//! short-circuiting are both enforced by move semantics.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use bazaar_core::{Request, Response};

/// The innermost unit of the chain — the application itself.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, req: &mut Request) -> Result<Response>;
}

/// A unit of the chain. Either delegates to `next` exactly once (with any
/// pre/post processing around the await) or short-circuits by producing a
/// response without running it.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response>;
}

/// The rest of the chain, including the terminal handler.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn Handler,
}

impl Next<'_> {
    pub async fn run(self, req: &mut Request) -> Result<Response> {
        match self.rest.split_first() {
            Some((head, rest)) => {
                head.handle(
                    req,
                    Next {
                        rest,
                        terminal: self.terminal,
                    },
                )
                .await
            }
            None => self.terminal.handle(req).await,
        }
    }
}

/// The composed application: an ordered chain around a terminal handler.
/// Order is fixed at configuration time; `App` is immutable once shared.
pub struct App {
    chain: Vec<Arc<dyn Middleware>>,
    terminal: Arc<dyn Handler>,
}

impl App {
    pub fn new(terminal: Arc<dyn Handler>) -> Self {
        Self {
            chain: Vec::new(),
            terminal,
        }
    }

    /// Append a middleware. The first one wrapped is the outermost.
    pub fn wrap(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.chain.push(middleware);
        self
    }

    /// Run one request through the whole chain.
    pub async fn call(&self, req: &mut Request) -> Result<Response> {
        Next {
            rest: &self.chain,
            terminal: self.terminal.as_ref(),
        }
        .run(req)
        .await
    }
}
