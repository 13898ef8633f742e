//! The failure boundary: converts a fault anywhere further down the chain
//! into a well-formed 500 response so the connection never hangs and the
//! outer middlewares (tracker, logger) still see a response.

use anyhow::Result;
use async_trait::async_trait;

use bazaar_core::{Request, Response, Status};

use crate::app::{Middleware, Next};

pub struct Failsafe;

#[async_trait]
impl Middleware for Failsafe {
    async fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response> {
        match next.run(req).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    method = %req.method(),
                    target = req.target(),
                    "request handling failed"
                );
                let mut response = Response::with_status(Status::INTERNAL_SERVER_ERROR);
                response.set_header("Content-Type", "text/plain; charset=utf-8");
                response.set_body("Internal Server Error");
                Ok(response)
            }
        }
    }
}
