//! Common-format access logging.
//!
//! One line per request, emitted after the rest of the chain has produced
//! the response. The layout is the Apache common log format and is parsed
//! by external tooling — field order and the `-` placeholders are fixed.

use std::time::SystemTime;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bazaar_core::{Request, Response, SharedClock};

use crate::app::{Middleware, Next};

pub struct AccessLogger {
    clock: SharedClock,
}

impl AccessLogger {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Middleware for AccessLogger {
    async fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response> {
        let client = req.remote_addr().ip().to_string();
        let method = req.method().to_string();
        let target = req.target().to_owned();
        let protocol = req.protocol().to_owned();

        let response = next.run(req).await?;

        let line = format_entry(
            &client,
            self.clock.now(),
            &method,
            &target,
            &protocol,
            response.status().code,
            response.content_length(),
        );
        tracing::info!(target: "access", "{line}");
        Ok(response)
    }
}

/// `client - - [timestamp] "METHOD target PROTOCOL" status length-or-"-"`
pub fn format_entry(
    client: &str,
    at: SystemTime,
    method: &str,
    target: &str,
    protocol: &str,
    status: u16,
    length: u64,
) -> String {
    let timestamp = DateTime::<Utc>::from(at).format("%d/%b/%Y:%H:%M:%S %z");
    let length = if length > 0 {
        length.to_string()
    } else {
        "-".to_string()
    };
    format!("{client} - - [{timestamp}] \"{method} {target} {protocol}\" {status} {length}")
}
