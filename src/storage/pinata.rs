//! Pinata pinning service client
//!
//! Files go through `pinFileToIPFS` as multipart uploads, JSON documents
//! through `pinJSONToIPFS`. Transient failures (connect/timeout, 429, 5xx)
//! are retried with backoff; anything else fails the upload.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::PinataConfig;
use crate::domain::{AttachedFile, StoredFile, IPFS_SCHEME};
use crate::infra::{ContentStore, Retry, RetryConfig, StorageError};

/// Content type sent when a file's own type is blank or unparseable
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pin_size: u64,
}

/// Content store backed by Pinata
pub struct PinataStore {
    client: Client,
    config: PinataConfig,
    retry: Retry,
}

impl PinataStore {
    pub fn new(config: PinataConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            retry: Retry::new(RetryConfig::storage()),
        }
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = Retry::new(config);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/pinning/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Public gateway URL for `cid`
    pub fn gateway_url(&self, cid: &str) -> String {
        format!(
            "{}/ipfs/{}",
            self.config.gateway_url.trim_end_matches('/'),
            cid
        )
    }

    async fn parse(response: Response) -> Result<PinResponse, StorageError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let pinned: PinResponse = response.json().await?;
        if pinned.ipfs_hash.trim().is_empty() {
            return Err(StorageError::InvalidResponse(
                "pin response has an empty IpfsHash".to_string(),
            ));
        }
        Ok(pinned)
    }

    /// Multipart body for `file`; a blank or unparseable type is sent as
    /// [`FALLBACK_MIME_TYPE`]
    fn file_part(file: &AttachedFile) -> Result<Part, StorageError> {
        let build = |mime: &str| {
            Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(mime)
        };

        let declared = file.mime_type.trim();
        if !declared.is_empty() {
            if let Ok(part) = build(declared) {
                return Ok(part);
            }
            debug!(name = %file.name, mime_type = declared, "Unparseable content type");
        }
        Ok(build(FALLBACK_MIME_TYPE)?)
    }

    async fn pin_file_once(&self, file: &AttachedFile) -> Result<PinResponse, StorageError> {
        let part = Self::file_part(file)?;
        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", json!({ "name": file.name }).to_string());

        let response = self
            .client
            .post(self.endpoint("pinFileToIPFS"))
            .bearer_auth(&self.config.jwt)
            .multipart(form)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn pin_json_once(
        &self,
        name: &str,
        document: &serde_json::Value,
    ) -> Result<PinResponse, StorageError> {
        let body = json!({
            "pinataContent": document,
            "pinataMetadata": { "name": name },
        });

        let response = self
            .client
            .post(self.endpoint("pinJSONToIPFS"))
            .bearer_auth(&self.config.jwt)
            .json(&body)
            .send()
            .await?;
        Self::parse(response).await
    }
}

#[async_trait]
impl ContentStore for PinataStore {
    async fn upload_file(&self, file: &AttachedFile) -> Result<StoredFile, StorageError> {
        debug!(name = %file.name, size = file.size(), "Pinning file");
        let pinned = self
            .retry
            .storage("pinata.pin_file", || self.pin_file_once(file))
            .await?;

        info!(name = %file.name, cid = %pinned.ipfs_hash, pin_size = pinned.pin_size, "File pinned");
        Ok(StoredFile {
            url: self.gateway_url(&pinned.ipfs_hash),
            cid: pinned.ipfs_hash,
        })
    }

    async fn upload_json(
        &self,
        name: &str,
        document: &serde_json::Value,
    ) -> Result<String, StorageError> {
        let pinned = self
            .retry
            .storage("pinata.pin_json", || self.pin_json_once(name, document))
            .await?;

        info!(name, cid = %pinned.ipfs_hash, "JSON pinned");
        Ok(format!("{IPFS_SCHEME}{}", pinned.ipfs_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_and_gateway() {
        let mut config = PinataConfig::new("jwt");
        config.api_url = "https://api.example/".to_string();
        config.gateway_url = "https://gw.example/".to_string();
        let store = PinataStore::new(config);

        assert_eq!(
            store.endpoint("pinJSONToIPFS"),
            "https://api.example/pinning/pinJSONToIPFS"
        );
        assert_eq!(store.gateway_url("QmX"), "https://gw.example/ipfs/QmX");
    }

    #[test]
    fn test_pin_response_parsing() {
        let parsed: PinResponse = serde_json::from_str(
            r#"{"IpfsHash":"QmYwAPJzv5CZsnA","PinSize":1234,"Timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.ipfs_hash, "QmYwAPJzv5CZsnA");
        assert_eq!(parsed.pin_size, 1234);
    }

    /// Answers every request with a successful pin of `cid`
    async fn pin_stub(cid: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 4096];
                    loop {
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        if n == 0 {
                            return;
                        }
                        request.extend_from_slice(&buf[..n]);
                        if request_complete(&request) {
                            break;
                        }
                    }
                    let body = format!(r#"{{"IpfsHash":"{cid}","PinSize":1}}"#);
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        format!("http://{addr}")
    }

    fn request_complete(request: &[u8]) -> bool {
        let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
        let body = &request[end + 4..];
        match head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            Some(len) => body.len() >= len,
            None => body.ends_with(b"0\r\n\r\n"),
        }
    }

    #[test]
    fn test_file_part_accepts_any_declared_type() {
        for mime in ["text/plain", "", "   ", "not a type", "image/png; charset"] {
            let file = AttachedFile::new("notes", mime, b"hello".to_vec());
            assert!(PinataStore::file_part(&file).is_ok(), "{mime:?}");
        }
    }

    #[tokio::test]
    async fn test_untyped_file_is_pinned() {
        let mut config = PinataConfig::new("jwt");
        config.api_url = pin_stub("QmOk").await;
        let store = PinataStore::new(config).with_retry(RetryConfig::none());

        let typed = AttachedFile::new("a.txt", "text/plain", b"hello".to_vec());
        let untyped = AttachedFile::new("notes", "", b"hello".to_vec());

        assert_eq!(store.upload_file(&typed).await.unwrap().cid, "QmOk");
        let stored = store.upload_file(&untyped).await.unwrap();
        assert_eq!(stored.cid, "QmOk");
        assert!(stored.url.ends_with("/ipfs/QmOk"));
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_upload() {
        let mut config = PinataConfig::new("jwt");
        // Port 9 (discard) on localhost is not an HTTP server
        config.api_url = "http://127.0.0.1:9".to_string();
        let store = PinataStore::new(config).with_retry(RetryConfig::none());

        let file = AttachedFile::new("a.txt", "text/plain", b"hello".to_vec());
        assert!(store.upload_file(&file).await.is_err());
    }
}
