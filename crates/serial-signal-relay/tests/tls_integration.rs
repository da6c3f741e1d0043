//! The default deployment: HTTPS and `wss://` on one TLS listener.
//!
//! A self-signed certificate for `localhost` is generated per test and written
//! to a temporary directory as `cert.pem` / `key.pem`.  Clients trust exactly
//! that certificate, so the handshake is fully verified.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName};
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{client_async, WebSocketStream};

use serial_signal_relay::application::HubHandle;
use serial_signal_relay::domain::{RelayConfig, SerialConfig, TlsConfig};
use serial_signal_relay::infrastructure::RelayServer;

const TIMEOUT: Duration = Duration::from_secs(5);

struct TlsRelay {
    addr: SocketAddr,
    hub: HubHandle,
    handle: Handle,
    connector: TlsConnector,
}

impl TlsRelay {
    async fn start(dir: &Path) -> Self {
        // Several tests in this binary race to install it; the first wins.
        let _ = tokio_rustls::rustls::crypto::aws_lc_rs::default_provider().install_default();

        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .expect("self-signed certificate");
        let cert_path = dir.join("cert.pem");
        let key_path = dir.join("key.pem");
        std::fs::write(&cert_path, certified.cert.pem()).unwrap();
        std::fs::write(&key_path, certified.key_pair.serialize_pem()).unwrap();

        let config = RelayConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            tls: Some(TlsConfig {
                cert_path,
                key_path,
            }),
            static_dir: dir.to_path_buf(),
            serial: SerialConfig {
                path: "/dev/serial-signal-relay-test-missing".to_string(),
                baud_rate: 115_200,
            },
        };
        let server = RelayServer::new(config);
        let hub = server.hub();
        let handle = Handle::new();
        tokio::spawn(server.run(handle.clone()));
        let addr = tokio::time::timeout(TIMEOUT, handle.listening())
            .await
            .expect("timed out waiting for the TLS listener")
            .expect("TLS listener must start");

        let cert_der: CertificateDer<'static> = certified.cert.der().clone();
        Self {
            addr,
            hub,
            handle,
            connector: connector_trusting(cert_der),
        }
    }

    async fn tls_connect(&self) -> TlsStream<TcpStream> {
        let tcp = TcpStream::connect(self.addr).await.unwrap();
        let name = ServerName::try_from("localhost").unwrap();
        self.connector
            .connect(name, tcp)
            .await
            .expect("TLS handshake")
    }

    async fn wss_connect(&self) -> WebSocketStream<TlsStream<TcpStream>> {
        let stream = self.tls_connect().await;
        let (ws, _) = client_async("wss://localhost/ws", stream)
            .await
            .expect("WebSocket handshake over TLS");
        ws
    }

    async fn wait_for_clients(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while self.hub.client_count().await.unwrap() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "hub never reached {expected} clients"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for TlsRelay {
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}

fn connector_trusting(cert: CertificateDer<'static>) -> TlsConnector {
    let mut roots = RootCertStore::empty();
    roots.add(cert).unwrap();
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Reads until `needle` shows up.  The server may drop the connection
/// without a TLS close_notify, so a read error after data is not fatal.
async fn read_until<S: AsyncRead + Unpin>(stream: &mut S, needle: &str) -> String {
    let mut response = Vec::new();
    let mut buf = [0u8; 4096];
    tokio::time::timeout(TIMEOUT, async {
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    response.extend_from_slice(&buf[..n]);
                    if String::from_utf8_lossy(&response).contains(needle) {
                        break;
                    }
                }
            }
        }
    })
    .await
    .expect("timed out reading the response");
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_static_index_is_served_over_https() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("index.html"),
        "<!doctype html><title>tls-ok</title>",
    )
    .unwrap();
    let relay = TlsRelay::start(dir.path()).await;

    // Act
    let mut stream = relay.tls_connect().await;
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let response = read_until(&mut stream, "</title>").await;

    // Assert
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("<title>tls-ok</title>"));
}

#[tokio::test]
async fn test_signaling_is_relayed_over_wss() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let relay = TlsRelay::start(dir.path()).await;
    let mut a = relay.wss_connect().await;
    let mut b = relay.wss_connect().await;
    relay.wait_for_clients(2).await;

    // Act
    let offer = r#"{"type":"offer","payload":{"type":"offer","sdp":"v=0\r\n"}}"#;
    a.send(Message::Text(offer.to_string())).await.unwrap();

    // Assert
    let received = tokio::time::timeout(TIMEOUT, async {
        loop {
            match b.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("connection ended early: {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for the relayed offer");
    assert_eq!(received, offer);
}

#[tokio::test]
async fn test_plain_tcp_client_is_not_served_without_tls() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "secret").unwrap();
    let relay = TlsRelay::start(dir.path()).await;

    let mut stream = TcpStream::connect(relay.addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let response = read_until(&mut stream, "secret").await;

    assert!(!response.contains("secret"));
}
