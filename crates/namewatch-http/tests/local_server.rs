//! HttpLookupClient against a canned local HTTP server

use namewatch_core::config::{EndpointConfig, LookupConfig, PollerConfig};
use namewatch_core::traits::{AvailabilityLookup, HistoryLookup, LookupClient, LookupTimeouts};
use namewatch_http::HttpLookupClient;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const TIMEOUTS: LookupTimeouts = LookupTimeouts {
    connect: Duration::from_secs(2),
    read: Duration::from_secs(2),
};

/// Serve one canned response; the handle yields the raw request head
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/api/", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&request).into_owned()
    });

    (base, handle)
}

fn client_for(base: &str) -> HttpLookupClient {
    let endpoints = EndpointConfig {
        history_url: base.to_string(),
        availability_url: base.to_string(),
        bedrock_url: base.to_string(),
    };
    HttpLookupClient::new(endpoints, &LookupConfig::default()).unwrap()
}

#[tokio::test]
async fn taken_name_reports_owner_and_sends_headers() {
    let (base, server) = serve_once("200 OK", r#"{"uuid": "abc", "username": "Notch"}"#).await;

    let outcome = client_for(&base).availability("Notch", TIMEOUTS).await.unwrap();
    assert_eq!(
        outcome,
        AvailabilityLookup::Taken {
            current_owner: Some("Notch".to_string())
        }
    );

    let request = server.await.unwrap().to_lowercase();
    assert!(request.starts_with("get /api/notch http/1.1"));
    assert!(request.contains(&format!("user-agent: namewatch/{}", env!("CARGO_PKG_VERSION"))));
    assert!(request.contains("accept: application/json"));
}

#[tokio::test]
async fn not_found_means_available() {
    let (base, _server) = serve_once("404 Not Found", "").await;

    let outcome = client_for(&base).availability("free_name", TIMEOUTS).await.unwrap();
    assert_eq!(outcome, AvailabilityLookup::Available);
}

#[tokio::test]
async fn poller_connect_timeout_is_applied() {
    let (base, _server) = serve_once("404 Not Found", "").await;
    let poller = PollerConfig {
        connect_timeout_secs: 3,
        ..PollerConfig::default()
    };

    let client = client_for(&base);
    assert!(!client.connect_timeouts().await.contains(&Duration::from_secs(3)));

    let outcome = client.availability("free_name", poller.timeouts()).await.unwrap();
    assert_eq!(outcome, AvailabilityLookup::Available);
    assert!(client.connect_timeouts().await.contains(&Duration::from_secs(3)));
}

#[tokio::test]
async fn server_error_is_unexpected_status() {
    let (base, _server) = serve_once("503 Service Unavailable", "").await;

    let err = client_for(&base).availability("steve", TIMEOUTS).await.unwrap_err();
    assert!(matches!(
        err,
        namewatch_core::Error::UnexpectedStatus { status: 503, .. }
    ));
}

#[tokio::test]
async fn history_document_is_returned() {
    let (base, _server) = serve_once(
        "200 OK",
        r#"{"success": true, "data": {"username": "Steve", "usernames": []}}"#,
    )
    .await;

    let outcome = client_for(&base).name_history("Steve", TIMEOUTS).await.unwrap();
    assert_eq!(
        outcome,
        HistoryLookup::Found(serde_json::json!({"username": "Steve", "usernames": []}))
    );
}

#[tokio::test]
async fn gamertag_is_percent_encoded() {
    let (base, server) = serve_once("200 OK", "\"2535428650656940\"").await;

    let xuid = client_for(&base).resolve_xuid("Some Gamer", TIMEOUTS).await.unwrap();
    assert_eq!(xuid.as_deref(), Some("2535428650656940"));

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/Some%20Gamer HTTP/1.1"));
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let err = client_for(&base).availability("steve", TIMEOUTS).await.unwrap_err();
    assert!(err.is_transport());
}
