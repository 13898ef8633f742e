//! HTTP request/response types consumed by the middleware chain.
//!
//! Middlewares see a fixed capability set: read method/target/headers,
//! read/write per-request attributes, write status/body/headers. The types
//! here are deliberately small — the wire codec in [`crate::wire`] is the
//! only place that knows how they look as bytes.

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::session::Session;

// ── Method ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
    Other(String),
}

impl Method {
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(token) => token,
        };
        f.write_str(token)
    }
}

// ── Status ────────────────────────────────────────────────────────────────────

/// Response status line: numeric code plus reason phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code: u16,
    pub reason: &'static str,
}

impl Status {
    pub const OK: Status = Status::new(200, "OK");
    pub const NO_CONTENT: Status = Status::new(204, "No Content");
    pub const SEE_OTHER: Status = Status::new(303, "See Other");
    pub const BAD_REQUEST: Status = Status::new(400, "Bad Request");
    pub const NOT_FOUND: Status = Status::new(404, "Not Found");
    pub const INTERNAL_SERVER_ERROR: Status = Status::new(500, "Internal Server Error");

    pub const fn new(code: u16, reason: &'static str) -> Self {
        Self { code, reason }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}

// ── Headers ───────────────────────────────────────────────────────────────────

/// Ordered header list. Names compare case-insensitively; `get` returns the
/// first match, `add` may introduce repeats (Set-Cookie), `set` replaces.
#[derive(Debug, Clone, Default)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.0.push((name.to_string(), value.into()));
    }

    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        self.0.push((name.to_string(), value.into()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn all(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// One inbound request, as handed to the middleware chain.
#[derive(Debug)]
pub struct Request {
    method: Method,
    target: String,
    protocol: String,
    headers: Headers,
    body: Bytes,
    remote_addr: SocketAddr,
    /// Per-request scratch shared along the chain. Never outlives the request.
    attributes: HashMap<String, Value>,
    /// Session bound by the tracker for the duration of handling.
    session: Option<Arc<Session>>,
}

impl Request {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            protocol: "HTTP/1.1".to_string(),
            headers: Headers::new(),
            body: Bytes::new(),
            remote_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            attributes: HashMap::new(),
            session: None,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = addr;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request target, path plus query.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Target up to the query string.
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or(&self.target)
    }

    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, q)| q)
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Value of a named cookie from the `Cookie` header, if any.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        let header = self.headers.get("Cookie")?;
        header.split(';').map(str::trim).find_map(|pair| {
            let (n, v) = pair.split_once('=')?;
            (n.trim() == name).then(|| v.trim())
        })
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    pub fn bind_session(&mut self, session: Arc<Session>) {
        self.session = Some(session);
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// One outbound response, built up as the chain unwinds.
#[derive(Debug)]
pub struct Response {
    status: Status,
    headers: Headers,
    body: Bytes,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: Status::OK,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_status(status: Status) -> Self {
        let mut response = Self::new();
        response.status = status;
        response
    }

    /// Plain-text response, body encoded in the given charset.
    pub fn text(status: Status, body: impl Into<String>, charset: &str) -> Self {
        let body: String = body.into();
        let mut response = Self::with_status(status);
        response.set_header("Content-Type", format!("text/plain; charset={charset}"));
        response.set_body(encode_text(&body, charset));
        response
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.add(name, value);
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }
}

/// Encode `body` in the charset the Content-Type header declares.
/// Characters outside the target repertoire become `?`.
fn encode_text(body: &str, charset: &str) -> Bytes {
    match charset {
        "iso-8859-1" => body
            .chars()
            .map(|c| u8::try_from(c as u32).unwrap_or(b'?'))
            .collect::<Vec<u8>>()
            .into(),
        "us-ascii" => body
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .collect::<Vec<u8>>()
            .into(),
        _ => Bytes::from(body.to_owned()),
    }
}

impl From<String> for Response {
    fn from(body: String) -> Self {
        let mut response = Response::new();
        response.set_body(body);
        response
    }
}
