//! In-process [`ObjectStore`] for tests and local development.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use dashmap::{DashMap, DashSet};

use super::ObjectStore;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
    pub cache_control: String,
}

pub struct MemoryObjectStore {
    base_url: String,
    buckets: DashSet<String>,
    objects: DashMap<(String, String), StoredObject>,
    puts: AtomicUsize,
    failing: AtomicBool,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_base_url("http://localhost/storage")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            buckets: DashSet::new(),
            objects: DashMap::new(),
            puts: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of put attempts, successful or not.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects.get(&(bucket.to_string(), key.to_string())).map(|o| o.clone())
    }

    /// Known bucket names, sorted.
    pub fn buckets(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.iter().map(|b| b.clone()).collect();
        names.sort();
        names
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("object store unavailable");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn ensure_bucket(&self, bucket: &str) -> anyhow::Result<()> {
        self.check()?;
        self.buckets.insert(bucket.to_string());
        Ok(())
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes, content_type: &str, cache_control: &str) -> anyhow::Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                cache_control: cache_control.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> anyhow::Result<()> {
        self.check()?;
        self.objects.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, key)
    }
}
