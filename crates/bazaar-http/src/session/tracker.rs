//! Cookie-based session tracking middleware.
//!
//! Resolves a session before delegating (lookup by cookie, create on
//! miss), binds it to the request, and writes the identifier cookie on
//! the way out — but only when this request minted a new identifier.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use bazaar_core::{Request, Response};

use crate::app::{Middleware, Next};

use super::SessionPool;

pub struct SessionTracker {
    pool: Arc<SessionPool>,
    cookie_name: String,
}

impl SessionTracker {
    pub fn new(pool: Arc<SessionPool>, cookie_name: impl Into<String>) -> Self {
        Self {
            pool,
            cookie_name: cookie_name.into(),
        }
    }

    fn set_cookie_value(&self, id: &str) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            self.cookie_name,
            id,
            self.pool.timeout().as_secs()
        )
    }
}

#[async_trait]
impl Middleware for SessionTracker {
    async fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response> {
        let presented = req.cookie(&self.cookie_name).map(str::to_owned);
        let (session, fresh) = match presented.as_deref().and_then(|id| self.pool.get(id)) {
            Some(session) => (session, false),
            // Unknown or expired identifier — same as none at all.
            None => (self.pool.create(), true),
        };
        let id = session.id().to_owned();
        req.bind_session(session);

        let mut response = next.run(req).await?;
        if fresh {
            response.add_header("Set-Cookie", self.set_cookie_value(&id));
        }
        Ok(response)
    }
}
