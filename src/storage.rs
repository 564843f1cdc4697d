use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};

/// Upload URLs are valid for ten minutes.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// Extensions accepted for article images.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// StorageService
///
/// Object storage for article images. Handlers only see this trait, so tests
/// run against `MockStorageService` without any network.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if missing. Only called in `Env::Local`.
    async fn ensure_bucket_exists(&self);

    /// Generates a signed URL the browser uses to PUT an article image straight
    /// into the bucket, without the upload passing through this service.
    ///
    /// The URL expires after [`UPLOAD_URL_TTL`] and only accepts a request
    /// carrying the same `Content-Type`.
    ///
    /// # Arguments
    /// * `key`: The object key inside the bucket, usually from [`image_key_for`].
    /// * `content_type`: The MIME type the upload must declare (e.g., "image/png").
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String>;
}

/// S3StorageClient
///
/// `StorageService` over the AWS SDK. Works against any S3-compatible
/// endpoint:
/// - **Local:** the MinIO container from docker-compose.
/// - **Production:** the configured S3 endpoint.
///
/// Path-style addressing (`http://endpoint/bucket/key`) is forced because
/// MinIO does not resolve virtual-host bucket names.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    /// new
    ///
    /// Builds the client from static credentials. No request is sent, so this
    /// succeeds even when the endpoint is down.
    ///
    /// # Arguments
    /// * `endpoint`: Base URL of the S3 API (e.g., "http://localhost:9000").
    /// * `region`: Signing region; MinIO accepts any value.
    /// * `access_key` / `secret_key`: Static credentials for the bucket.
    /// * `bucket`: Bucket that receives article images.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// ensure_bucket_exists
    ///
    /// Issues CreateBucket and ignores the outcome: an existing bucket is the
    /// expected case after the first start.
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            // Also fails when the bucket already exists.
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket returned an error");
        }
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| e.to_string())?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(sanitize_key(key))
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }
}

/// Drops empty, `.` and `..` segments from an object key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// image_key_for
///
/// Validates an upload request for an article image and allocates its object
/// key, `articles/<uuid>.<ext>`. The client's filename only contributes the
/// extension.
pub fn image_key_for(filename: &str, content_type: &str) -> Result<String, ApiError> {
    let mut errors = FieldErrors::new();

    let content_type = content_type.trim().to_ascii_lowercase();
    if !content_type.starts_with("image/") {
        errors.add("content_type", "only image uploads are accepted");
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()));
    if extension.is_none() {
        errors.add(
            "filename",
            format!("extension must be one of {}", IMAGE_EXTENSIONS.join(", ")),
        );
    }

    errors.finish()?;
    let extension = extension.unwrap_or_default();
    Ok(format!("articles/{}.{}", Uuid::new_v4(), extension))
}

/// MockStorageService
///
/// Deterministic, offline `StorageService` for tests.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}

pub type StorageState = Arc<dyn StorageService>;
