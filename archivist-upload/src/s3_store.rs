use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::RequestChecksumCalculation;
use aws_sdk_s3::primitives::{ByteStream as AwsByteStream, Length};
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as AwsCompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::env;

use crate::{
    CompletedPart, ObjectBackend, ObjectBody, PutResult, TransferResult, UploadConfig,
    UploadError, UploadId,
};

/// Static credentials taken from `ARCHIVIST_ACCESS_KEY_ID` / `ARCHIVIST_SECRET_ACCESS_KEY`
#[derive(Debug)]
struct StaticCredentials {
    access_key_id: String,
    secret_access_key: String,
}

impl StaticCredentials {
    /// Both variables must be set, otherwise the default AWS provider chain is used
    fn from_env() -> Option<Self> {
        let access_key_id = env::var("ARCHIVIST_ACCESS_KEY_ID").ok()?;
        let secret_access_key = env::var("ARCHIVIST_SECRET_ACCESS_KEY").ok()?;
        Some(Self {
            access_key_id,
            secret_access_key,
        })
    }
}

/// S3 (or S3-compatible) backend using the AWS SDK
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

/// S3 client settings on top of the loaded SDK config
pub(crate) fn client_config(sdk_config: &SdkConfig, config: &UploadConfig) -> aws_sdk_s3::Config {
    aws_sdk_s3::config::Builder::from(sdk_config)
        // Only the completion tags vouch for the bytes
        .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
        // Custom endpoints (MinIO, RustFS) generally need path-style addressing
        .force_path_style(config.endpoint_url.is_some())
        .build()
}

impl S3Store {
    /// Build a client for `config.container` in `config.region`
    pub async fn from_config(config: &UploadConfig) -> TransferResult<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(credentials) = StaticCredentials::from_env() {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id,
                credentials.secret_access_key,
                None,
                None,
                "archivist",
            ));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Ok(Self::new(
            Client::from_conf(client_config(&sdk_config, config)),
            config.container.clone(),
        ))
    }

    /// Wrap an existing client
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn map_aws_error(err: impl std::error::Error + Send + Sync + 'static) -> UploadError {
        UploadError::backend(err)
    }
}

#[async_trait]
impl ObjectBackend for S3Store {
    async fn put_object(&self, key: &str, body: ObjectBody) -> TransferResult<PutResult> {
        let size_bytes = body.size_bytes();
        let content_length = i64::try_from(size_bytes)
            .map_err(|_| UploadError::invalid(format!("object of {} bytes is too large", size_bytes)))?;

        // Read from disk as the request is sent; the path lets the SDK resend on retry
        let stream = AwsByteStream::read_from()
            .path(body.path())
            .length(Length::Exact(size_bytes))
            .build()
            .await
            .map_err(Self::map_aws_error)?;

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(content_length)
            .body(stream)
            .send()
            .await
            .map_err(Self::map_aws_error)?;

        Ok(PutResult {
            etag: result.e_tag,
            size_bytes: Some(size_bytes),
        })
    }

    async fn initiate_session(&self, key: &str) -> TransferResult<UploadId> {
        let result = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(Self::map_aws_error)?;

        result
            .upload_id
            .map(UploadId::from_string)
            .ok_or_else(|| UploadError::invalid("backend returned no upload id"))
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &UploadId,
        part_number: u32,
        body: Bytes,
    ) -> TransferResult<String> {
        let part_number = i32::try_from(part_number)
            .map_err(|_| UploadError::invalid(format!("part number {} out of range", part_number)))?;
        let content_length = body.len() as i64;

        let result = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id.as_str())
            .part_number(part_number)
            .content_length(content_length)
            .body(AwsByteStream::from(body))
            .send()
            .await
            .map_err(Self::map_aws_error)?;

        result
            .e_tag
            .ok_or_else(|| UploadError::invalid(format!("backend returned no etag for part {}", part_number)))
    }

    async fn complete_session(
        &self,
        key: &str,
        upload_id: &UploadId,
        parts: &[CompletedPart],
    ) -> TransferResult<PutResult> {
        let parts = parts
            .iter()
            .map(|part| {
                AwsCompletedPart::builder()
                    .part_number(part.part_number as i32)
                    .e_tag(&part.etag)
                    .build()
            })
            .collect::<Vec<_>>();

        let result = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id.as_str())
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(Self::map_aws_error)?;

        Ok(PutResult {
            etag: result.e_tag,
            size_bytes: None,
        })
    }

    async fn abort_session(&self, key: &str, upload_id: &UploadId) -> TransferResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id.as_str())
            .send()
            .await
            .map_err(Self::map_aws_error)?;
        Ok(())
    }
}
