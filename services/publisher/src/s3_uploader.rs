use crate::config::StorageConfig;
use crate::ports::{ShotsStorage, StorageError};
use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::{debug, info, instrument};

/// Uploads shots files to an S3-compatible endpoint (Supabase Storage's S3
/// gateway in production)
pub struct S3ShotsStorage {
    client: S3Client,
    cache_control: String,
}

impl S3ShotsStorage {
    /// Create a new S3 storage adapter
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            let credentials = Credentials::new(key_id, secret, None, None, "publisher-config");
            s3_config_builder = s3_config_builder.credentials_provider(credentials);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            region = %config.region,
            endpoint = config.endpoint_url.as_deref().unwrap_or("aws"),
            "S3 storage initialized"
        );

        Ok(Self {
            client,
            cache_control: config.cache_control.clone(),
        })
    }
}

#[async_trait]
impl ShotsStorage for S3ShotsStorage {
    #[instrument(skip(self, content), fields(size_bytes = content.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        metrics::counter!("shots.storage.upload_attempts").increment(1);

        // PutObject replaces any existing object at the same key.
        self.client
            .put_object()
            .bucket(bucket)
            .key(path)
            .body(ByteStream::from(content.to_vec()))
            .content_type(content_type)
            .cache_control(&self.cache_control)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        debug!(bucket, path, "Shots file uploaded");
        Ok(())
    }
}

/// Map SDK failures onto the transient/permanent split the publisher retries on
fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + HasStatus,
{
    let transient = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(context) => is_transient_status(context.raw().status_code()),
        _ => false,
    };
    let message = DisplayErrorContext(&err).to_string();

    if transient {
        StorageError::Transient(message)
    } else {
        StorageError::Permanent(message)
    }
}

/// Status access on raw responses, so classification can be tested without
/// building SDK responses
trait HasStatus {
    fn status_code(&self) -> u16;
}

impl HasStatus for aws_sdk_s3::config::http::HttpResponse {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

/// 5xx and throttling are worth retrying
fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
