//! Tests for `ReqwestClient`.
//!
//! Real deliveries are exercised against a one-shot local TCP listener so
//! no external network access is needed.

use std::time::Duration;

use ::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;

/// Client that never routes through an environment proxy.
fn direct_client() -> ReqwestClient {
    ReqwestClient::from_client(reqwest::Client::builder().no_proxy().build().unwrap())
}

/// Serves exactly one request with a canned raw HTTP response and returns
/// the raw request it received.
async fn serve_once(response: &'static str) -> (url::Url, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let mut received = Vec::new();
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            received.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&received);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if received.len() >= header_end + 4 + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&received).into_owned()
    });

    let url = url::Url::parse(&format!("http://{addr}/hook/secret")).unwrap();
    (url, handle)
}

mod reqwest_client {
    use super::*;

    #[test]
    fn constructors_produce_debuggable_clients() {
        let default = ReqwestClient::default();
        let with_timeout = ReqwestClient::with_timeout(Duration::from_secs(5)).unwrap();
        let custom = ReqwestClient::from_client(reqwest::Client::new());

        for client in [default, with_timeout, custom] {
            assert!(format!("{client:?}").contains("ReqwestClient"));
        }
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestClient>();
    }

    #[tokio::test]
    async fn posts_json_and_reads_response() {
        let (url, server) = serve_once(
            "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{\"ok\":true}",
        )
        .await;

        let client = direct_client();
        let req = HttpRequest::post_json(url, &serde_json::json!({"ping": 1}));
        let resp = client.request(req).await.unwrap();

        assert_eq!(resp.status, StatusCode::CREATED);
        assert_eq!(resp.body_json(), Some(serde_json::json!({"ok": true})));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /hook/secret"));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.ends_with("{\"ping\":1}"));
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_errored() {
        let (url, _server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\nbusy",
        )
        .await;

        let resp = direct_client()
            .request(HttpRequest::post(url))
            .await
            .unwrap();

        assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.body_text(), Some("busy"));
    }

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        // Bind then drop to obtain a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = url::Url::parse(&format!("http://{addr}/")).unwrap();
        let result = direct_client().request(HttpRequest::post(url)).await;

        assert!(
            matches!(result, Err(HttpError::Connection(_))),
            "Expected connection error, got {result:?}"
        );
    }
}
