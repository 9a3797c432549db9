//! The transport must honor its deadline against a silent endpoint:
//! bounded failure, never a hang.

use std::time::{Duration, Instant};

use serde_json::json;
use sberqr::{GatewayRequest, HttpTransport, SberQrError, Transport};

#[tokio::test]
async fn transport_times_out_against_silent_endpoint() {
    // Accepts connections, never writes a byte back.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let _socket = socket;
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });

    let transport =
        HttpTransport::new(Duration::from_millis(500), Duration::from_millis(100)).unwrap();
    let request = GatewayRequest::json(format!("http://{addr}/status"), vec![], json!({}));

    let started = Instant::now();
    let err = transport.send(request).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, SberQrError::Transport(_)), "got {err:?}");
    assert!(
        elapsed < Duration::from_secs(2),
        "timed out too slowly: {elapsed:?}"
    );
}
