//! Bazaar integration test harness.
//!
//! Each test boots a real server on an ephemeral 127.0.0.1 port inside the
//! test's tokio runtime and drives it over actual HTTP. Tests own their
//! server and stop it by dropping the shutdown sender.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;

use bazaar_core::{Method, Request, Response, SharedClock, Status, SystemClock};
use bazaar_http::middlewares::{AccessLogger, DateHeader, Failsafe, ServerHeader};
use bazaar_http::{App, Handler, HouseKeeping, Server, SessionPool, SessionTracker};

mod pipeline;
mod sessions;

pub const COOKIE: &str = "bazaar.session";

// ── Harness ───────────────────────────────────────────────────────────────────

/// Minimal shop: `/` bumps a session visit counter, `/cart` echoes the
/// body length, `/boom` faults.
pub struct TestShop;

#[async_trait]
impl Handler for TestShop {
    async fn handle(&self, req: &mut Request) -> Result<Response> {
        match (req.method(), req.path()) {
            (_, "/boom") => anyhow::bail!("shop backend fell over"),
            (Method::Post, "/cart") => Ok(Response::text(
                Status::OK,
                format!("received={}", req.body().len()),
                "utf-8",
            )),
            _ => {
                let visits = match req.session() {
                    Some(session) => {
                        let n = session
                            .attribute("visits")
                            .and_then(|v| v.as_u64())
                            .unwrap_or(0)
                            + 1;
                        session.set_attribute("visits", serde_json::json!(n));
                        n
                    }
                    None => 0,
                };
                Ok(Response::text(Status::OK, format!("visits={visits}"), "utf-8"))
            }
        }
    }
}

pub struct TestServer {
    pub base_url: String,
    pub pool: Arc<SessionPool>,
    shutdown: watch::Sender<bool>,
    housekeeping: HouseKeeping,
}

impl TestServer {
    pub fn stop(&self) {
        self.housekeeping.stop();
        let _ = self.shutdown.send(true);
    }
}

/// Boot the full stack — logger, headers, tracker, failsafe, shop — with
/// the given session timeout and sweep period.
pub async fn start_server(timeout: Duration, period: Duration) -> TestServer {
    let clock: SharedClock = Arc::new(SystemClock);
    let pool = Arc::new(SessionPool::new(timeout, clock.clone()));
    let housekeeping = HouseKeeping::new(pool.clone(), period, clock.clone());
    housekeeping.start();

    let app = Arc::new(
        App::new(Arc::new(TestShop))
            .wrap(Arc::new(AccessLogger::new(clock.clone())))
            .wrap(Arc::new(DateHeader::new(clock.clone())))
            .wrap(Arc::new(ServerHeader::new("bazaar")))
            .wrap(Arc::new(SessionTracker::new(pool.clone(), COOKIE)))
            .wrap(Arc::new(Failsafe)),
    );

    let server = Server::bind("127.0.0.1:0").await.expect("bind");
    let addr = server.local_addr().expect("local addr");
    let (shutdown, shutdown_rx) = watch::channel(false);
    tokio::spawn(server.run(app, shutdown_rx));

    TestServer {
        base_url: format!("http://{addr}"),
        pool,
        shutdown,
        housekeeping,
    }
}

/// First `Set-Cookie` session id in a response, if any.
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| {
            let (name, rest) = v.split_once('=')?;
            (name == COOKIE).then(|| rest.split(';').next().unwrap_or(rest).to_string())
        })
}

pub fn cookie_header(id: &str) -> String {
    format!("{COOKIE}={id}")
}
