//! Blob storage seam and its Supabase Storage implementation.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// Object storage for animal photo files.
///
/// Paths follow the `{animal_id}/{epoch_millis}-{index}.{ext}` convention;
/// `upload` returns the public URL clients are handed. A successful `remove`
/// is the saga's point of no return: removed blobs are never restored.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    async fn remove(&self, paths: &[String]) -> Result<()>;

    /// File names directly under `prefix` (no recursion).
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    fn public_url(&self, path: &str) -> String;

    /// Inverse of [`BlobStore::public_url`]: recovers the bucket-relative
    /// path from a public URL, or None for a URL this store did not issue.
    fn blob_path(&self, url: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
}

#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl SupabaseStorage {
    #[must_use]
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bucket: bucket.into(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait::async_trait]
impl BlobStore for SupabaseStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let response = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.api_key)
            .header("x-upsert", "false")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("upload request for {path} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("upload of {path} rejected ({status}): {body}"));
        }

        Ok(self.public_url(path))
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .context("remove request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("remove rejected ({status}): {body}"));
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .post(format!(
                "{}/storage/v1/object/list/{}",
                self.base_url, self.bucket
            ))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "prefix": prefix, "limit": 1000 }))
            .send()
            .await
            .context("list request failed")?
            .error_for_status()?;

        let objects: Vec<ListedObject> = response.json().await?;
        Ok(objects.into_iter().map(|o| o.name).collect())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }

    fn blob_path(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let segments: Vec<&str> = parsed.path_segments()?.collect();
        let bucket_index = segments
            .iter()
            .position(|s| *s == self.bucket.as_str())
            .filter(|i| segments.get(i.wrapping_sub(1)) == Some(&"public"))?;
        let rest = &segments[bucket_index + 1..];
        if rest.is_empty() {
            return None;
        }
        Some(rest.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SupabaseStorage {
        SupabaseStorage::new(
            Client::new(),
            "https://project.supabase.co",
            "key",
            "animals",
        )
    }

    #[test]
    fn public_url_and_blob_path_are_inverses() {
        let s = storage();
        let path = "9f1c/1714000000000-0.jpg";
        let url = s.public_url(path);
        assert_eq!(
            url,
            "https://project.supabase.co/storage/v1/object/public/animals/9f1c/1714000000000-0.jpg"
        );
        assert_eq!(s.blob_path(&url).as_deref(), Some(path));
    }

    #[test]
    fn blob_path_rejects_foreign_urls() {
        let s = storage();
        assert_eq!(s.blob_path("https://elsewhere.example/cat.jpg"), None);
        assert_eq!(s.blob_path("not a url"), None);
        // Bucket name appearing outside the public object path must not match.
        assert_eq!(
            s.blob_path("https://project.supabase.co/animals/cat.jpg"),
            None
        );
    }
}
