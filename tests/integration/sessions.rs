use std::time::Duration;

use crate::*;

/// A cookieless request mints exactly one session and one cookie; replaying
/// the cookie reuses the session without minting another.
#[tokio::test]
async fn cookie_round_trip_reuses_the_session() {
    let server = start_server(Duration::from_secs(60), Duration::from_secs(60)).await;
    let client = reqwest::Client::new();

    let first = client.get(&server.base_url).send().await.unwrap();
    let id = session_cookie(&first).expect("first response sets a cookie");
    assert_eq!(first.text().await.unwrap(), "visits=1");
    assert_eq!(server.pool.len(), 1);

    let second = client
        .get(&server.base_url)
        .header(reqwest::header::COOKIE, cookie_header(&id))
        .send()
        .await
        .unwrap();
    assert!(
        session_cookie(&second).is_none(),
        "no new cookie on a tracked request"
    );
    assert_eq!(second.text().await.unwrap(), "visits=2");
    assert_eq!(server.pool.len(), 1, "zero additional creates");

    server.stop();
}

/// Requests without the cookie each get their own session.
#[tokio::test]
async fn untracked_requests_get_distinct_sessions() {
    let server = start_server(Duration::from_secs(60), Duration::from_secs(60)).await;
    let client = reqwest::Client::new();

    let a = client.get(&server.base_url).send().await.unwrap();
    let b = client.get(&server.base_url).send().await.unwrap();

    let id_a = session_cookie(&a).unwrap();
    let id_b = session_cookie(&b).unwrap();
    assert_ne!(id_a, id_b);
    assert_eq!(server.pool.len(), 2);

    server.stop();
}

/// An idle session is reaped by housekeeping; presenting its cookie
/// afterwards yields a fresh session and a fresh cookie.
#[tokio::test]
async fn idle_session_expires_and_is_recreated() {
    let server = start_server(Duration::from_millis(300), Duration::from_millis(100)).await;
    let client = reqwest::Client::new();

    let first = client.get(&server.base_url).send().await.unwrap();
    let old_id = session_cookie(&first).unwrap();

    // Idle well past the timeout; several sweeps run meanwhile.
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(server.pool.len(), 0, "housekeeping reaped the idle session");

    let replay = client
        .get(&server.base_url)
        .header(reqwest::header::COOKIE, cookie_header(&old_id))
        .send()
        .await
        .unwrap();
    let new_id = session_cookie(&replay).expect("stale cookie gets a replacement");
    assert_ne!(new_id, old_id);
    assert_eq!(replay.text().await.unwrap(), "visits=1");

    server.stop();
}

/// Steady traffic keeps a session alive through many sweep cycles.
#[tokio::test]
async fn traffic_keeps_the_session_alive() {
    let server = start_server(Duration::from_millis(400), Duration::from_millis(50)).await;
    let client = reqwest::Client::new();

    let first = client.get(&server.base_url).send().await.unwrap();
    let id = session_cookie(&first).unwrap();

    for i in 2..=6u64 {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let response = client
            .get(&server.base_url)
            .header(reqwest::header::COOKIE, cookie_header(&id))
            .send()
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), format!("visits={i}"));
    }
    assert_eq!(server.pool.len(), 1);

    server.stop();
}
