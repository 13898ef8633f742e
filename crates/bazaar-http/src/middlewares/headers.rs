//! Response header stamping: `Server` and `Date`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bazaar_core::{Request, Response, SharedClock};

use crate::app::{Middleware, Next};

/// Stamps a `Server` header after delegation unless a handler already set one.
pub struct ServerHeader {
    name: String,
}

impl ServerHeader {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Middleware for ServerHeader {
    async fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response> {
        let mut response = next.run(req).await?;
        if !response.headers().contains("Server") {
            response.set_header("Server", self.name.clone());
        }
        Ok(response)
    }
}

/// Stamps an RFC 7231 `Date` header after delegation.
pub struct DateHeader {
    clock: SharedClock,
}

impl DateHeader {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Middleware for DateHeader {
    async fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response> {
        let mut response = next.run(req).await?;
        let date = DateTime::<Utc>::from(self.clock.now())
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        response.set_header("Date", date);
        Ok(response)
    }
}
