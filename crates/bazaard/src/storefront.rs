//! The storefront application — the innermost handler of the chain.
//!
//! The substrate treats this as an external collaborator; only enough
//! lives here to exercise the session machinery end to end.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use bazaar_core::{Method, Request, Response, Status};
use bazaar_http::Handler;

pub struct Storefront {
    charset: String,
}

impl Storefront {
    pub fn new(charset: impl Into<String>) -> Self {
        Self {
            charset: charset.into(),
        }
    }

    fn welcome(&self, req: &Request) -> Response {
        let visits = bump_visits(req);
        Response::text(
            Status::OK,
            format!("Welcome to the bazaar. Visit #{visits}.\n"),
            &self.charset,
        )
    }

    fn session_info(&self, req: &Request) -> Response {
        let body = match req.session() {
            Some(session) => json!({
                "session": session.id(),
                "visits": session.attribute("visits").unwrap_or(json!(0)),
            }),
            None => json!({ "session": null }),
        };
        let mut response = Response::with_status(Status::OK);
        response.set_header("Content-Type", "application/json");
        response.set_body(body.to_string());
        response
    }
}

/// Session-scoped visit counter. Two tabs racing on this is
/// last-write-wins, which is fine for a counter on a welcome page.
fn bump_visits(req: &Request) -> u64 {
    match req.session() {
        Some(session) => {
            let visits = session
                .attribute("visits")
                .and_then(|v| v.as_u64())
                .unwrap_or(0)
                + 1;
            session.set_attribute("visits", json!(visits));
            visits
        }
        None => 0,
    }
}

#[async_trait]
impl Handler for Storefront {
    async fn handle(&self, req: &mut Request) -> Result<Response> {
        match (req.method(), req.path()) {
            (Method::Get, "/") => Ok(self.welcome(req)),
            (Method::Get, "/session") => Ok(self.session_info(req)),
            _ => Ok(Response::text(Status::NOT_FOUND, "Not Found", &self.charset)),
        }
    }
}
