//! S3-compatible [`ObjectStore`].

use anyhow::Context as _;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;
use tracing::{debug, info, instrument};
use url::Url;

use super::ObjectStore;
use crate::config::StorageBackendConfig;

pub struct S3ObjectStore {
    client: Client,
    public_base_url: Url,
}

impl S3ObjectStore {
    pub fn new(client: Client, public_base_url: Url) -> Self {
        Self { client, public_base_url }
    }

    pub async fn from_config(config: &StorageBackendConfig) -> anyhow::Result<Self> {
        let StorageBackendConfig::S3 {
            endpoint,
            region,
            access_key_id,
            secret_access_key,
            public_base_url,
            force_path_style,
        } = config
        else {
            anyhow::bail!("object storage is not configured as s3");
        };

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.clone()));
        if let (Some(key_id), Some(secret)) = (access_key_id, secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(key_id, secret, None, None, "folio-config"));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(*force_path_style);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint.as_str().trim_end_matches('/'));
        }

        info!(region, endpoint = ?endpoint.as_ref().map(Url::as_str), "S3 object storage configured");
        Ok(Self::new(Client::from_conf(builder.build()), public_base_url.clone()))
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn ensure_bucket(&self, bucket: &str) -> anyhow::Result<()> {
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            debug!("Bucket exists");
            return Ok(());
        }

        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(e)))
            .with_context(|| format!("create bucket {bucket}"))?;
        info!("Bucket created");
        Ok(())
    }

    #[instrument(skip(self, body), fields(size = body.len()))]
    async fn put(&self, bucket: &str, key: &str, body: Bytes, content_type: &str, cache_control: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .cache_control(cache_control)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(e)))
            .with_context(|| format!("put {bucket}/{key}"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, bucket: &str, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(e)))
            .with_context(|| format!("delete {bucket}/{key}"))?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url.as_str().trim_end_matches('/'), bucket, key)
    }
}
