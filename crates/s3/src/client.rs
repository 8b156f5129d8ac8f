//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from sm-core. One
//! client serves one store; everything store-specific comes from its
//! `AdapterConfig`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::put_object::builders::PutObjectFluentBuilder;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption, StorageClass};
use aws_smithy_types::byte_stream::ByteStream;
use aws_smithy_types::DateTime;

use sm_core::adapter::DEFAULT_HOST;
use sm_core::{
    AdapterConfig, CallingFormat, Error, ListOptions, ListResult, ObjectInfo, ObjectStore, Result,
};

/// Region used when neither the environment nor a profile names one
const DEFAULT_REGION: &str = "us-east-1";

/// Where a configured header ends up on a PUT request
#[derive(Debug, Clone, PartialEq, Eq)]
enum HeaderTarget {
    CacheControl,
    ContentDisposition,
    ContentEncoding,
    ContentLanguage,
    ContentType,
    Metadata(String),
    Unsupported,
}

fn classify_header(name: &str) -> HeaderTarget {
    let lower = name.to_ascii_lowercase();
    if let Some(meta) = lower.strip_prefix("x-amz-meta-") {
        return HeaderTarget::Metadata(meta.to_string());
    }
    match lower.as_str() {
        "cache-control" => HeaderTarget::CacheControl,
        "content-disposition" => HeaderTarget::ContentDisposition,
        "content-encoding" => HeaderTarget::ContentEncoding,
        "content-language" => HeaderTarget::ContentLanguage,
        "content-type" => HeaderTarget::ContentType,
        _ => HeaderTarget::Unsupported,
    }
}

/// Endpoint override for the SDK, if the store points anywhere but AWS
fn custom_endpoint(config: &AdapterConfig) -> Option<String> {
    if config.host == DEFAULT_HOST && config.port.is_none() && config.use_ssl {
        None
    } else {
        Some(config.endpoint_url())
    }
}

/// Map an SDK failure that is not a typed not-found error
fn sdk_error<E, R>(err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch") => {
            Error::Auth(err.message().unwrap_or("Access denied").to_string())
        }
        _ => Error::Network(DisplayErrorContext(&err).to_string()),
    }
}

/// Rewrite a signed URL to plain `http` when secure URLs are off
///
/// The scheme is not part of a SigV4 query signature, so the URL stays valid.
fn with_url_scheme(uri: &str, secure: bool) -> String {
    match uri.strip_prefix("https://") {
        Some(rest) if !secure => format!("http://{rest}"),
        _ => uri.to_string(),
    }
}

fn to_timestamp(dt: &DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(dt.secs(), dt.subsec_nanos() as i32).ok()
}

fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

/// S3 client for one configured store
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    store: String,
    bucket: String,
    config: AdapterConfig,
}

impl S3Client {
    /// Create a new S3 client from a store's configuration
    pub async fn new(store: impl Into<String>, config: &AdapterConfig) -> Result<Self> {
        let store = store.into();
        let bucket = config.require_bucket()?.to_string();

        let region = aws_config::meta::region::RegionProviderChain::default_provider()
            .or_else(DEFAULT_REGION);
        let mut loader =
            aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

        match config.credentials() {
            Some(creds) => {
                loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                    creds.access_key,
                    creds.secret_key,
                    None, // session token
                    None, // expiry
                    "sm-static-credentials",
                ));
            }
            None => {
                tracing::debug!(store = %store, "No configured credentials, using the default provider chain");
            }
        }

        if let Some(endpoint) = custom_endpoint(config) {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.calling_format == CallingFormat::Path)
            .build();

        tracing::debug!(
            store = %store,
            bucket = %bucket,
            calling_format = %config.calling_format,
            "S3 client created"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            store,
            bucket,
            config: config.clone(),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    /// Name of the store this client serves
    pub fn store(&self) -> &str {
        &self.store
    }

    /// Configuration this client was built from
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn apply_headers(
        &self,
        mut request: PutObjectFluentBuilder,
        headers: &BTreeMap<String, String>,
    ) -> PutObjectFluentBuilder {
        for (name, value) in headers {
            request = match classify_header(name) {
                HeaderTarget::CacheControl => request.cache_control(value),
                HeaderTarget::ContentDisposition => request.content_disposition(value),
                HeaderTarget::ContentEncoding => request.content_encoding(value),
                HeaderTarget::ContentLanguage => request.content_language(value),
                HeaderTarget::ContentType => request.content_type(value),
                HeaderTarget::Metadata(key) => request.metadata(key, value),
                HeaderTarget::Unsupported => {
                    tracing::warn!(store = %self.store, header = %name, "Ignoring unsupported header");
                    request
                }
            };
        }
        request
    }

    async fn presigned_url(&self, key: &str) -> Result<String> {
        let presigning = PresigningConfig::expires_in(self.config.querystring_expiry())
            .map_err(|e| Error::Config(e.to_string()))?;

        let request = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| Error::General(e.to_string()))?;

        Ok(with_url_scheme(request.uri(), self.config.secure_urls))
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_objects(&self, prefix: &str, options: ListOptions) -> Result<ListResult> {
        let key_prefix = self.config.prefix_key(prefix)?;
        let mut request = self.inner.list_objects_v2().bucket(&self.bucket);

        // A bare location lists its contents, not the location itself
        let key_prefix = if !key_prefix.is_empty() && prefix.is_empty() {
            format!("{key_prefix}/")
        } else {
            key_prefix
        };
        if !key_prefix.is_empty() {
            request = request.prefix(key_prefix);
        }

        // Set delimiter (for non-recursive listing)
        if !options.recursive {
            request = request.delimiter("/");
        }

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(sdk_error)?;

        let mut items = Vec::new();

        // Add common prefixes (directories)
        for common in response.common_prefixes() {
            if let Some(p) = common.prefix() {
                items.push(ObjectInfo::dir(self.config.object_name(p)));
            }
        }

        for object in response.contents() {
            let key = object.key().unwrap_or_default();
            let mut info = ObjectInfo::file(self.config.object_name(key), object.size().unwrap_or(0));
            info.last_modified = object.last_modified().and_then(to_timestamp);
            info.etag = object.e_tag().map(trim_etag);
            info.storage_class = object.storage_class().map(|sc| sc.as_str().to_string());
            items.push(info);
        }

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn head_object(&self, name: &str) -> Result<ObjectInfo> {
        let key = self.config.object_key(name)?;
        let response = self
            .inner
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    Error::NotFound(format!("{}/{name}", self.store))
                } else {
                    sdk_error(e)
                }
            })?;

        let mut info = ObjectInfo::file(name, response.content_length().unwrap_or(0));
        info.last_modified = response.last_modified().and_then(to_timestamp);
        info.etag = response.e_tag().map(trim_etag);
        info.content_type = response.content_type().map(|ct| ct.to_string());
        info.storage_class = response.storage_class().map(|sc| sc.as_str().to_string());

        Ok(info)
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        match self.head_object(name).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn get_object(&self, name: &str) -> Result<Vec<u8>> {
        let key = self.config.object_key(name)?;
        let response = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    Error::NotFound(format!("{}/{name}", self.store))
                } else {
                    sdk_error(e)
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        name: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ObjectInfo> {
        if !self.config.file_overwrite && self.exists(name).await? {
            return Err(Error::Conflict(format!(
                "{}/{name} already exists and store does not allow overwrites",
                self.store
            )));
        }

        let key = self.config.object_key(name)?;
        let size = data.len() as i64;

        let mut request = self
            .inner
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .acl(ObjectCannedAcl::from(self.config.default_acl.as_str()));

        request = self.apply_headers(request, &self.config.headers);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }
        if self.config.encryption {
            request = request.server_side_encryption(ServerSideEncryption::Aes256);
        }
        if self.config.reduced_redundancy {
            request = request.storage_class(StorageClass::ReducedRedundancy);
        }

        let response = request
            .send()
            .await
            .map_err(sdk_error)?;

        tracing::debug!(store = %self.store, key = %key, size, "Object stored");

        let mut info = ObjectInfo::file(name, size);
        info.etag = response.e_tag().map(trim_etag);
        info.content_type = content_type.map(str::to_string);
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn delete_object(&self, name: &str) -> Result<()> {
        let key = self.config.object_key(name)?;
        self.inner
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(())
    }

    /// Signed URLs are addressed the way the SDK signs them: a `vhost` store
    /// gets `bucket.host` rather than the bare bucket host, since the
    /// signature covers the host. `secure_urls = false` switches them to http.
    async fn url(&self, name: &str) -> Result<String> {
        if self.config.querystring_auth && self.config.custom_domain.is_none() {
            let key = self.config.object_key(name)?;
            self.presigned_url(&key).await
        } else {
            self.config.public_url(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_url_scheme() {
        let signed = "https://assets.s3.amazonaws.com/a.txt?X-Amz-Signature=abc";
        assert_eq!(with_url_scheme(signed, true), signed);
        assert_eq!(
            with_url_scheme(signed, false),
            "http://assets.s3.amazonaws.com/a.txt?X-Amz-Signature=abc"
        );
        assert_eq!(
            with_url_scheme("http://localhost:9000/a.txt", true),
            "http://localhost:9000/a.txt"
        );
    }

    #[test]
    fn test_classify_header() {
        assert_eq!(classify_header("Cache-Control"), HeaderTarget::CacheControl);
        assert_eq!(classify_header("content-disposition"), HeaderTarget::ContentDisposition);
        assert_eq!(classify_header("Content-Encoding"), HeaderTarget::ContentEncoding);
        assert_eq!(classify_header("Content-Language"), HeaderTarget::ContentLanguage);
        assert_eq!(classify_header("Content-Type"), HeaderTarget::ContentType);
        assert_eq!(
            classify_header("X-Amz-Meta-Owner"),
            HeaderTarget::Metadata("owner".to_string())
        );
        assert_eq!(classify_header("Expires"), HeaderTarget::Unsupported);
    }

    #[test]
    fn test_custom_endpoint() {
        assert_eq!(custom_endpoint(&AdapterConfig::default()), None);

        let minio = AdapterConfig {
            host: "localhost".into(),
            port: Some(9000),
            use_ssl: false,
            ..AdapterConfig::default()
        };
        assert_eq!(custom_endpoint(&minio).as_deref(), Some("http://localhost:9000"));

        let plain_http = AdapterConfig {
            use_ssl: false,
            ..AdapterConfig::default()
        };
        assert_eq!(
            custom_endpoint(&plain_http).as_deref(),
            Some("http://s3.amazonaws.com")
        );
    }

    #[test]
    fn test_to_timestamp() {
        let dt = DateTime::from_secs(1_700_000_000);
        let ts = to_timestamp(&dt).unwrap();
        assert_eq!(ts.as_second(), 1_700_000_000);
    }

    #[test]
    fn test_trim_etag() {
        assert_eq!(trim_etag("\"abc123\""), "abc123");
        assert_eq!(trim_etag("abc123"), "abc123");
    }

    #[tokio::test]
    async fn test_new_requires_bucket() {
        let result = S3Client::new("media", &AdapterConfig::default()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
