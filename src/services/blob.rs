use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;

/// Key/bytes object storage. Returns the public URL of the stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, body: Vec<u8>) -> anyhow::Result<String>;
}

/// Picks the hosted blob API when a token is configured, a local directory otherwise.
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn BlobStore>> {
    match &config.blob_token {
        Some(token) => {
            tracing::info!(api = %config.blob_api_url, "Archiving to hosted blob storage");
            Ok(Arc::new(VercelBlobStore::new(
                &config.blob_api_url,
                token,
            )?))
        }
        None => {
            tracing::warn!(
                dir = %config.archive_dir,
                "BLOB_READ_WRITE_TOKEN missing, archiving to local directory"
            );
            Ok(Arc::new(LocalBlobStore::new(&config.archive_dir)))
        }
    }
}

// ── Hosted blob API ──────────────────────────────────────────────────────────

const BLOB_API_VERSION: &str = "7";

pub struct VercelBlobStore {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct PutBlobResponse {
    url: String,
}

impl VercelBlobStore {
    pub fn new(api_url: &str, token: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl BlobStore for VercelBlobStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> anyhow::Result<String> {
        let response = self
            .client
            .put(format!("{}/", self.api_url))
            .query(&[("pathname", key)])
            .bearer_auth(&self.token)
            .header("x-api-version", BLOB_API_VERSION)
            .header("x-content-type", "application/json")
            .header("x-add-random-suffix", "0")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Blob API error {}: {}", status, body);
        }

        let blob: PutBlobResponse = response.json().await?;
        Ok(blob.url)
    }
}

// ── Local directory ──────────────────────────────────────────────────────────

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> anyhow::Result<String> {
        if key.split('/').any(|part| part == ".." || part.is_empty()) {
            anyhow::bail!("Refusing blob key {key:?}");
        }

        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        let absolute = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        Ok(format!("file://{}", absolute.display()))
    }
}


#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_local_store_writes_nested_key() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let url = store
            .put("deer/2025-03-01/formdata-1.json", b"[]".to_vec())
            .await
            .unwrap();

        assert!(url.starts_with("file://"));
        let written = tokio::fs::read(dir.path().join("deer/2025-03-01/formdata-1.json"))
            .await
            .unwrap();
        assert_eq!(written, b"[]");
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path().join("archive"));
        assert!(store.put("../escape.json", vec![]).await.is_err());
        assert!(store.put("deer//x.json", vec![]).await.is_err());
        assert!(!dir.path().join("escape.json").exists());
    }

    #[test]
    fn test_vercel_store_trims_trailing_slash() {
        let store = VercelBlobStore::new("https://blob.example.com/", "tok").unwrap();
        assert_eq!(store.api_url, "https://blob.example.com");
    }

    #[tokio::test]
    async fn test_memory_store_failing_mode() {
        let store = testing::MemoryBlobStore::failing();
        assert!(store.put("k", vec![1]).await.is_err());
        store.set_failing(false);
        assert_eq!(store.put("k", vec![1]).await.unwrap(), "memory://k");
        assert_eq!(store.writes().len(), 1);
    }
}
