use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use garde::Validate;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::sync::Arc;
use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::oss::{
    trim_etag, CreateBucketOptions, ObjectInfo, ObjectMeta, ObjectStore, ObjectStoreError,
    PartInfo, PutStreamOptions, MIN_PART_SIZE,
};

const PROVIDER: &str = "S3";

/// S3 ObjectStore 配置
///
/// 凭证获取顺序（优先级从高到低）：
/// 1. `access_key_id` + `secret_access_key` - 直接配置的静态访问密钥
/// 2. 默认凭证链（环境变量、`~/.aws/credentials`、容器或实例元数据）
#[derive(Debug, Deserialize, Serialize, SmartDefault, Clone, Validate)]
#[serde(default)]
pub struct AwsS3ObjectStoreConfig {
    /// 服务端点，`host:port` 形式；为空时访问 AWS 官方端点
    #[garde(skip)]
    #[default(Some("127.0.0.1:9000".to_string()))]
    pub endpoint: Option<String>,

    /// 是否使用 HTTPS 访问 `endpoint`
    #[garde(skip)]
    #[default = false]
    pub use_ssl: bool,

    /// 区域，MinIO 等兼容存储可以使用任意值
    #[garde(length(min = 1))]
    #[default = "us-east-1"]
    pub region: String,

    /// 是否使用 path-style URL，兼容存储通常需要
    #[garde(skip)]
    #[default = true]
    pub force_path_style: bool,

    #[garde(skip)]
    #[default(Some("minioadmin".to_string()))]
    pub access_key_id: Option<String>,

    #[garde(skip)]
    #[default(Some("minioadmin".to_string()))]
    pub secret_access_key: Option<String>,
}

impl AwsS3ObjectStoreConfig {
    /// 根据 `use_ssl` 拼出完整的端点 URL，已经带 scheme 的端点原样返回
    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint.as_ref().map(|endpoint| {
            if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                endpoint.clone()
            } else if self.use_ssl {
                format!("https://{}", endpoint)
            } else {
                format!("http://{}", endpoint)
            }
        })
    }
}

/// S3 ObjectStore 实现
pub struct AwsS3ObjectStore {
    client: Arc<Client>,
    config: AwsS3ObjectStoreConfig,
}

impl AwsS3ObjectStore {
    pub async fn new(config: AwsS3ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        if let Err(errors) = config.validate() {
            return Err(ObjectStoreError::Configuration(format!("{}", errors)));
        }

        let client = Self::create_client(&config).await?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    pub fn config(&self) -> &AwsS3ObjectStoreConfig {
        &self.config
    }

    async fn create_client(config: &AwsS3ObjectStoreConfig) -> Result<Client, ObjectStoreError> {
        let mut builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        match (&config.access_key_id, &config.secret_access_key) {
            (Some(ak), Some(sk)) => {
                let credentials = Credentials::new(ak, sk, None, None, "static");
                builder = builder.credentials_provider(credentials);
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(ObjectStoreError::Configuration(
                    "access_key_id 和 secret_access_key 必须同时配置".to_string(),
                ));
            }
            (None, None) => {}
        }

        let sdk_config = builder.load().await;

        match config.endpoint_url() {
            Some(endpoint) => {
                let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                    .endpoint_url(endpoint)
                    .force_path_style(config.force_path_style)
                    .build();
                Ok(Client::from_conf(s3_config))
            }
            None => Ok(Client::new(&sdk_config)),
        }
    }

    /// 流式分片上传的内部实现
    async fn put_stream_multipart(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        reader: &mut Box<dyn AsyncRead + Send + Unpin>,
        part_size: usize,
    ) -> Result<ObjectInfo, ObjectStoreError> {
        let mut parts: Vec<PartInfo> = Vec::new();
        let mut part_number: u32 = 1;

        loop {
            let mut buffer = vec![0u8; part_size];
            let mut buffer_len = 0;

            while buffer_len < part_size {
                let n = reader.read(&mut buffer[buffer_len..]).await?;
                if n == 0 {
                    break;
                }
                buffer_len += n;
            }

            if buffer_len == 0 {
                break;
            }

            buffer.truncate(buffer_len);

            let part_info = self
                .upload_part(bucket, key, upload_id, part_number, Bytes::from(buffer))
                .await?;
            tracing::debug!(bucket, key, part_number, size = part_info.size, "uploaded part");

            parts.push(part_info);
            part_number += 1;
        }

        if parts.is_empty() {
            return Err(ObjectStoreError::MultipartUpload {
                message: "没有读取到任何数据".to_string(),
            });
        }

        let size = parts.iter().map(|p| p.size).sum();
        let etag = self
            .complete_multipart_upload(bucket, key, upload_id, parts)
            .await?;

        Ok(ObjectInfo { size, etag })
    }

    // === 分片上传接口 ===
    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        options: &PutStreamOptions,
    ) -> Result<String, ObjectStoreError> {
        let mut request = self.client.create_multipart_upload().bucket(bucket).key(key);

        if let Some(ct) = &options.content_type {
            request = request.content_type(ct);
        }

        if let Some(metadata) = &options.metadata {
            for (k, v) in metadata {
                request = request.metadata(k, v);
            }
        }

        let output = request
            .send()
            .await
            .map_err(|e| ObjectStoreError::from_provider(e, PROVIDER, "create_multipart_upload"))?;

        output.upload_id.ok_or_else(|| ObjectStoreError::MultipartUpload {
            message: "No upload_id returned".to_string(),
        })
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        data: Bytes,
    ) -> Result<PartInfo, ObjectStoreError> {
        let size = data.len() as u64;

        let output = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number as i32)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| ObjectStoreError::from_provider(e, PROVIDER, "upload_part"))?;

        let etag = output.e_tag.ok_or_else(|| ObjectStoreError::MultipartUpload {
            message: "No ETag returned for part".to_string(),
        })?;

        Ok(PartInfo {
            part_number,
            etag,
            size,
        })
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<PartInfo>,
    ) -> Result<String, ObjectStoreError> {
        let completed_parts: Vec<CompletedPart> = parts
            .into_iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number as i32)
                    .e_tag(p.etag)
                    .build()
            })
            .collect();

        let completed_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        let output = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_upload)
            .send()
            .await
            .map_err(|e| {
                ObjectStoreError::from_provider(e, PROVIDER, "complete_multipart_upload")
            })?;

        Ok(output.e_tag().map(trim_etag).unwrap_or_default())
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), ObjectStoreError> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| ObjectStoreError::from_provider(e, PROVIDER, "abort_multipart_upload"))?;

        Ok(())
    }

    async fn put_single(
        &self,
        bucket: &str,
        key: &str,
        mut reader: Box<dyn AsyncRead + Send + Unpin>,
        size: u64,
        options: PutStreamOptions,
    ) -> Result<ObjectInfo, ObjectStoreError> {
        let mut buffer = Vec::with_capacity(size as usize);
        io::copy(&mut reader, &mut buffer).await?;
        let size = buffer.len() as u64;

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(buffer));

        if let Some(ct) = &options.content_type {
            request = request.content_type(ct);
        }

        if let Some(metadata) = &options.metadata {
            for (k, v) in metadata {
                request = request.metadata(k, v);
            }
        }

        let output = request
            .send()
            .await
            .map_err(|e| ObjectStoreError::from_provider(e, PROVIDER, "put_object"))?;

        Ok(ObjectInfo {
            size,
            etag: output.e_tag().map(trim_etag).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ObjectStore for AwsS3ObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(se))
                if se.err().is_not_found() || se.raw().status().as_u16() == 404 =>
            {
                Ok(false)
            }
            Err(e) => Err(ObjectStoreError::from_provider(e, PROVIDER, "head_bucket")),
        }
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        options: CreateBucketOptions,
    ) -> Result<(), ObjectStoreError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 不允许携带 LocationConstraint
        let region = options.region.unwrap_or_else(|| self.config.region.clone());
        if region != "us-east-1" {
            let configuration = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region.as_str()))
                .build();
            request = request.create_bucket_configuration(configuration);
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(e) => match e.as_service_error() {
                Some(se) if se.is_bucket_already_owned_by_you() => {
                    Err(ObjectStoreError::BucketAlreadyOwnedByYou(bucket.to_string()))
                }
                Some(se) if se.is_bucket_already_exists() => {
                    Err(ObjectStoreError::BucketAlreadyExists(bucket.to_string()))
                }
                _ => Err(ObjectStoreError::from_provider(e, PROVIDER, "create_bucket")),
            },
        }
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| ObjectStoreError::from_provider(e, PROVIDER, "delete_bucket"))?;

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ObjectStoreError::from_provider(e, PROVIDER, "delete_object"))?;

        Ok(())
    }

    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMeta>, ObjectStoreError> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(output) => {
                let last_modified = output
                    .last_modified()
                    .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
                    .unwrap_or_else(chrono::Utc::now);

                Ok(Some(ObjectMeta {
                    key: key.to_string(),
                    size: output.content_length().unwrap_or(0) as u64,
                    last_modified,
                    etag: output.e_tag().map(trim_etag),
                    content_type: output.content_type().map(|s| s.to_string()),
                }))
            }
            Err(SdkError::ServiceError(se)) if se.err().is_not_found() => Ok(None),
            Err(e) => Err(ObjectStoreError::from_provider(e, PROVIDER, "head_object")),
        }
    }

    // === 流式接口 ===

    async fn put_stream(
        &self,
        bucket: &str,
        key: &str,
        mut reader: Box<dyn AsyncRead + Send + Unpin>,
        size: u64,
        options: PutStreamOptions,
    ) -> Result<ObjectInfo, ObjectStoreError> {
        if size < options.multipart_threshold {
            return self.put_single(bucket, key, reader, size, options).await;
        }

        if options.part_size < MIN_PART_SIZE {
            return Err(ObjectStoreError::InvalidInput(format!(
                "分片大小 {} 小于 S3 最小值 {}",
                options.part_size, MIN_PART_SIZE
            )));
        }

        let upload_id = self.create_multipart_upload(bucket, key, &options).await?;

        let result = self
            .put_stream_multipart(bucket, key, &upload_id, &mut reader, options.part_size)
            .await;

        if result.is_err() {
            // 出错时取消分片上传（忽略取消错误）
            if let Err(e) = self.abort_multipart_upload(bucket, key, &upload_id).await {
                tracing::warn!(bucket, key, upload_id, error = %e, "abort multipart upload failed");
            }
        }

        result
    }

    async fn get_stream(
        &self,
        bucket: &str,
        key: &str,
        mut writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> Result<u64, ObjectStoreError> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) => {
                return match e.as_service_error() {
                    Some(se) if se.is_no_such_key() => Err(ObjectStoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }),
                    _ => Err(ObjectStoreError::from_provider(e, PROVIDER, "get_object")),
                };
            }
        };

        let mut reader = output.body.into_async_read();
        let total_written = io::copy(&mut reader, &mut writer)
            .await
            .map_err(|e| ObjectStoreError::Network(e.to_string()))?;
        writer.flush().await?;

        Ok(total_written)
    }
}
