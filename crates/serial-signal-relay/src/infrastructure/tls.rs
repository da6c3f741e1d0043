//! Certificate and key loading for the HTTPS listener.
//!
//! Browsers only expose camera/microphone and WebRTC to secure origins, so
//! the relay serves over TLS by default.  Both PEM files are read once at
//! startup; if either is missing or unparsable the process exits before it
//! starts listening.

use anyhow::Context;
use axum_server::tls_rustls::RustlsConfig;

use crate::domain::TlsConfig;

/// Reads `cert_path` and `key_path` into a rustls server configuration.
///
/// # Errors
///
/// Returns an error naming both paths if either file cannot be read or does
/// not contain a usable PEM certificate chain / private key.
pub async fn load_tls(config: &TlsConfig) -> anyhow::Result<RustlsConfig> {
    RustlsConfig::from_pem_file(&config.cert_path, &config.key_path)
        .await
        .with_context(|| {
            format!(
                "failed to load TLS certificate '{}' / key '{}'",
                config.cert_path.display(),
                config.key_path.display()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_files_are_an_error() {
        let config = TlsConfig {
            cert_path: PathBuf::from("/nonexistent/cert.pem"),
            key_path: PathBuf::from("/nonexistent/key.pem"),
        };

        let err = load_tls(&config).await.unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("/nonexistent/cert.pem"), "got: {message}");
        assert!(message.contains("/nonexistent/key.pem"), "got: {message}");
    }

    #[tokio::test]
    async fn test_non_pem_contents_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        std::fs::write(&cert_path, "not a certificate").unwrap();
        std::fs::write(&key_path, "not a key").unwrap();

        let result = load_tls(&TlsConfig {
            cert_path,
            key_path,
        })
        .await;

        assert!(result.is_err());
    }
}
