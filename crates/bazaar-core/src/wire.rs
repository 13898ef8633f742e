//! HTTP/1.x wire codec.
//!
//! One request per connection, `Connection: close` on every response.
//! The server loop owns the socket; this module only turns bytes into a
//! [`Request`] head and a [`Response`] into bytes.

use std::net::SocketAddr;

use thiserror::Error;

use crate::message::{Method, Request, Response};

/// Upper bound on the request head (request line + headers).
pub const MAX_HEAD_BYTES: usize = 16 * 1024;
/// Upper bound on a request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed request line: {0:?}")]
    BadRequestLine(String),
    #[error("malformed header line: {0:?}")]
    BadHeader(String),
    #[error("unsupported protocol: {0:?}")]
    UnsupportedProtocol(String),
    #[error("invalid content-length: {0:?}")]
    BadContentLength(String),
    #[error("request body of {0} bytes exceeds limit")]
    BodyTooLarge(usize),
    #[error("request head is not valid UTF-8")]
    NotUtf8,
}

/// Parse a request head (everything before the blank line, excluding the
/// terminator itself). Returns the request plus the declared body length
/// the caller still has to read off the socket.
pub fn parse_request(head: &[u8], remote: SocketAddr) -> Result<(Request, usize), WireError> {
    let head = std::str::from_utf8(head).map_err(|_| WireError::NotUtf8)?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split(' ');
    let (method, target, protocol) = match (parts.next(), parts.next(), parts.next(), parts.next())
    {
        (Some(m), Some(t), Some(p), None) if !m.is_empty() && t.starts_with('/') => (m, t, p),
        _ => return Err(WireError::BadRequestLine(request_line.to_string())),
    };
    if !protocol.starts_with("HTTP/1.") {
        return Err(WireError::UnsupportedProtocol(protocol.to_string()));
    }

    let mut request = Request::new(Method::parse(method), target)
        .with_protocol(protocol)
        .with_remote_addr(remote);

    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| WireError::BadHeader(line.to_string()))?;
        if name.is_empty() || name.contains(' ') {
            return Err(WireError::BadHeader(line.to_string()));
        }
        request = request.with_header(name, value.trim().to_string());
    }

    let body_len = match request.header("Content-Length") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| WireError::BadContentLength(raw.to_string()))?,
        None => 0,
    };
    if body_len > MAX_BODY_BYTES {
        return Err(WireError::BodyTooLarge(body_len));
    }

    Ok((request, body_len))
}

/// Serialize a response. Content-Length and Connection are stamped here so
/// every response is well-formed regardless of what the chain produced.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut out = Vec::with_capacity(128 + response.body().len());
    out.extend_from_slice(format!("HTTP/1.1 {}\r\n", response.status()).as_bytes());
    for (name, value) in response.headers().iter() {
        if name.eq_ignore_ascii_case("Content-Length") || name.eq_ignore_ascii_case("Connection") {
            continue;
        }
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out.extend_from_slice(format!("Content-Length: {}\r\n", response.body().len()).as_bytes());
    out.extend_from_slice(b"Connection: close\r\n\r\n");
    out.extend_from_slice(response.body());
    out
}

/// Byte offset of the `\r\n\r\n` head terminator, if present.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
