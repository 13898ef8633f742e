//! Accept loop — one task per connection, one request per connection.
//!
//! The loop is the outermost error boundary: a malformed request gets a
//! 400, a fault that escaped the chain gets a 500, and neither ever
//! terminates the listener.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::watch;

use bazaar_core::wire::{self, MAX_HEAD_BYTES};
use bazaar_core::{Request, Response, Status};

use crate::app::App;

pub struct Server {
    listener: TcpListener,
}

impl Server {
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .context("failed to bind listener")?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("no local address")
    }

    /// Accept until shutdown is signalled. Each connection runs on its own
    /// task, concurrently with every other in-flight request and with the
    /// housekeeping sweep.
    pub async fn run(self, app: Arc<App>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("server shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, remote)) => {
                            let app = Arc::clone(&app);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, remote, app).await {
                                    tracing::debug!(error = %e, %remote, "connection error");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                        }
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    remote: SocketAddr,
    app: Arc<App>,
) -> Result<()> {
    let response = match read_request(&mut stream, remote).await {
        Ok(mut request) => match app.call(&mut request).await {
            Ok(response) => response,
            // A fault that escaped the chain's own failsafe. Still answer.
            Err(e) => {
                tracing::error!(error = ?e, %remote, "unhandled request fault");
                plain(Status::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, %remote, "rejected malformed request");
            plain(Status::BAD_REQUEST, "Bad Request")
        }
    };

    stream.write_all(&wire::encode_response(&response)).await?;
    stream.flush().await?;
    stream.shutdown().await.ok();
    Ok(())
}

fn plain(status: Status, body: &str) -> Response {
    Response::text(status, body, "utf-8")
}

/// Read one request off the socket: head up to the blank line (bounded),
/// then exactly the declared body.
async fn read_request(stream: &mut TcpStream, remote: SocketAddr) -> Result<Request> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = wire::find_head_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEAD_BYTES {
            bail!("request head exceeds {MAX_HEAD_BYTES} bytes");
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            bail!("connection closed before request head completed");
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let (mut request, body_len) = wire::parse_request(&buf[..head_end], remote)?;

    let mut body = buf.split_off(head_end + 4);
    while body.len() < body_len {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            bail!("connection closed mid-body");
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(body_len);
    request.set_body(Bytes::from(body));

    Ok(request)
}
