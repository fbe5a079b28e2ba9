//! Supabase Storage client implementation.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the Supabase Storage client.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`
    pub project_url: String,
    /// Service-role API key
    pub service_key: String,
    /// Bucket name
    pub bucket: String,
}

impl SupabaseConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            project_url: std::env::var("SUPABASE_URL")
                .map_err(|_| StorageError::config_error("SUPABASE_URL not set"))?,
            service_key: std::env::var("SUPABASE_SERVICE_KEY")
                .map_err(|_| StorageError::config_error("SUPABASE_SERVICE_KEY not set"))?,
            bucket: std::env::var("SUPABASE_BUCKET").unwrap_or_else(|_| "videos".to_string()),
        })
    }
}

/// Response body of the object-sign endpoint.
#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Supabase Storage client.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    storage_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseClient {
    /// Create a new client from configuration.
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            storage_url: format!("{}/storage/v1", config.project_url.trim_end_matches('/')),
            service_key: config.service_key,
            bucket: config.bucket,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(SupabaseConfig::from_env()?))
    }

    /// Percent-encode an object key, preserving `/` separators.
    fn encode_key(key: &str) -> String {
        key.split('/')
            .map(|seg| urlencoding::encode(seg).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Generate a short-lived signed URL granting read access to a private
    /// object.
    pub async fn create_signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let url = format!(
            "{}/object/sign/{}/{}",
            self.storage_url,
            self.bucket,
            Self::encode_key(key)
        );

        debug!(key = %key, "Requesting signed URL");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(&json!({ "expiresIn": expires_in.as_secs() }))
            .send()
            .await
            .map_err(|e| StorageError::signed_url(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::not_found(key));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::signed_url(format!(
                "Sign endpoint returned {}: {}",
                status, body
            )));
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::signed_url(e.to_string()))?;

        // The endpoint returns a path relative to the storage API root.
        let full = format!(
            "{}/{}",
            self.storage_url,
            signed.signed_url.trim_start_matches('/')
        );

        info!(key = %key, "Generated signed URL");
        Ok(full)
    }

    /// Download an object to a local file, streaming the body.
    pub async fn download_file(&self, key: &str, path: impl AsRef<Path>) -> StorageResult<()> {
        let path = path.as_ref();
        let url = format!(
            "{}/object/authenticated/{}/{}",
            self.storage_url,
            self.bucket,
            Self::encode_key(key)
        );

        debug!(key = %key, dest = %path.display(), "Downloading object");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::not_found(key));
        }
        if !status.is_success() {
            return Err(StorageError::DownloadFailed(format!(
                "Object endpoint returned {}",
                status
            )));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!(key = %key, dest = %path.display(), "Downloaded object");
        Ok(())
    }

    /// Upload bytes to the bucket.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let url = format!(
            "{}/object/{}/{}",
            self.storage_url,
            self.bucket,
            Self::encode_key(key)
        );

        debug!(key = %key, bytes = data.len(), "Uploading object");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::upload_failed(format!(
                "Upload endpoint returned {}: {}",
                status, body
            )));
        }

        info!(key = %key, "Uploaded object");
        Ok(())
    }

    /// Check whether an object exists.
    pub async fn object_exists(&self, key: &str) -> StorageResult<bool> {
        let url = format!(
            "{}/object/info/authenticated/{}/{}",
            self.storage_url,
            self.bucket,
            Self::encode_key(key)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(StorageError::DownloadFailed(format!(
                "Info endpoint returned {}",
                status
            ))),
        }
    }
}
