use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::*;

/// A handler fault turns into a well-formed 500 and the listener keeps
/// serving afterwards.
#[tokio::test]
async fn handler_fault_yields_500_and_server_survives() {
    let server = start_server(Duration::from_secs(60), Duration::from_secs(60)).await;
    let client = reqwest::Client::new();

    let boom = client
        .get(format!("{}/boom", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(boom.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    // the failsafe sits inside the tracker, so even the failed request
    // still carries its session cookie out
    assert!(session_cookie(&boom).is_some());
    assert_eq!(boom.text().await.unwrap(), "Internal Server Error");

    let after = client.get(&server.base_url).send().await.unwrap();
    assert_eq!(after.status(), reqwest::StatusCode::OK);

    server.stop();
}

/// Garbage on the wire gets a 400, not a hung connection, and the accept
/// loop is unaffected.
#[tokio::test]
async fn malformed_request_yields_400_and_server_survives() {
    let server = start_server(Duration::from_secs(60), Duration::from_secs(60)).await;
    let addr = server.base_url.trim_start_matches("http://").to_string();

    let mut stream = tokio::net::TcpStream::connect(&addr).await.unwrap();
    stream
        .write_all(b"NOT AN HTTP REQUEST AT ALL\r\n\r\n")
        .await
        .unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    assert!(reply.starts_with("HTTP/1.1 400 Bad Request"), "{reply}");

    let ok = reqwest::get(&server.base_url).await.unwrap();
    assert_eq!(ok.status(), reqwest::StatusCode::OK);

    server.stop();
}

/// The stamping middlewares decorate every response.
#[tokio::test]
async fn responses_carry_server_and_date_headers() {
    let server = start_server(Duration::from_secs(60), Duration::from_secs(60)).await;

    let response = reqwest::get(&server.base_url).await.unwrap();
    assert_eq!(
        response.headers().get("server").and_then(|v| v.to_str().ok()),
        Some("bazaar")
    );
    let date = response
        .headers()
        .get("date")
        .and_then(|v| v.to_str().ok())
        .expect("date header present");
    assert!(date.ends_with("GMT"), "{date}");

    server.stop();
}

/// POST bodies are read to the declared length before the chain runs.
#[tokio::test]
async fn request_bodies_are_consumed() {
    let server = start_server(Duration::from_secs(60), Duration::from_secs(60)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/cart", server.base_url))
        .body("quantity=3&sku=leash-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "received=22");

    server.stop();
}
