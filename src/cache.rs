//! Key/value cache seam.
//!
//! Values are JSON strings; schema validation happens in the services that
//! read them, and a payload failing validation is evicted and treated as a
//! miss rather than surfacing an error.

use anyhow::Result;

#[async_trait::async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    async fn del(&self, key: &str) -> Result<()>;
}
