//! Adapter configuration
//!
//! An [`AdapterConfig`] is the resolved, immutable settings bundle for one
//! store. It is built from any [`SettingsSource`] and carries everything a
//! storage client needs: credentials, bucket, write policy and URL policy.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::path;
use crate::settings::{names, Resolver, SettingsSource};

pub const DEFAULT_ACL: &str = "public-read";
pub const DEFAULT_QUERYSTRING_EXPIRE: u64 = 3600;
pub const DEFAULT_HOST: &str = "s3.amazonaws.com";
pub const DEFAULT_URL_PROTOCOL: &str = "http:";
pub const DEFAULT_FILE_NAME_CHARSET: &str = "utf-8";
pub const DEFAULT_GZIP_CONTENT_TYPES: &[&str] = &[
    "text/css",
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
];

/// Environment variables consulted, in order, when a store has no access key
pub const ACCESS_KEY_NAMES: &[&str] = &[names::S3_ACCESS_KEY_ID, names::ACCESS_KEY_ID];

/// Environment variables consulted, in order, when a store has no secret key
pub const SECRET_KEY_NAMES: &[&str] = &[names::S3_SECRET_ACCESS_KEY, names::SECRET_ACCESS_KEY];

const SECRET_MASK: &str = "********";

/// Bucket addressing style used when building object URLs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallingFormat {
    /// `bucket.host/key`
    #[default]
    Subdomain,
    /// `host/bucket/key`
    Path,
    /// `bucket/key`, the bucket name is itself a host name
    Vhost,
}

impl CallingFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            CallingFormat::Subdomain => "subdomain",
            CallingFormat::Path => "path",
            CallingFormat::Vhost => "vhost",
        }
    }
}

impl FromStr for CallingFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subdomain" => Ok(CallingFormat::Subdomain),
            "path" | "ordinary" => Ok(CallingFormat::Path),
            "vhost" => Ok(CallingFormat::Vhost),
            other => Err(format!("unknown calling format '{other}'")),
        }
    }
}

impl fmt::Display for CallingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access key pair handed to the storage client
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &SECRET_MASK)
            .finish()
    }
}

/// Resolved settings for one store
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AdapterConfig {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub file_overwrite: bool,
    pub headers: BTreeMap<String, String>,
    pub bucket_name: Option<String>,
    pub auto_create_bucket: bool,
    pub default_acl: String,
    pub bucket_acl: String,
    pub querystring_auth: bool,
    /// Signed URL lifetime in seconds
    pub querystring_expire: u64,
    pub reduced_redundancy: bool,
    /// Key prefix every object name is stored under
    pub location: String,
    pub encryption: bool,
    pub custom_domain: Option<String>,
    pub calling_format: CallingFormat,
    pub secure_urls: bool,
    pub file_name_charset: String,
    pub gzip: bool,
    pub gzip_content_types: Vec<String>,
    pub url_protocol: String,
    pub host: String,
    pub use_ssl: bool,
    pub port: Option<u16>,
    pub preload_metadata: bool,
    /// Bytes a downloaded file may hold in memory; 0 never rolls over
    pub max_memory_size: u64,
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| SECRET_MASK))
            .field("file_overwrite", &self.file_overwrite)
            .field("headers", &self.headers)
            .field("bucket_name", &self.bucket_name)
            .field("auto_create_bucket", &self.auto_create_bucket)
            .field("default_acl", &self.default_acl)
            .field("bucket_acl", &self.bucket_acl)
            .field("querystring_auth", &self.querystring_auth)
            .field("querystring_expire", &self.querystring_expire)
            .field("reduced_redundancy", &self.reduced_redundancy)
            .field("location", &self.location)
            .field("encryption", &self.encryption)
            .field("custom_domain", &self.custom_domain)
            .field("calling_format", &self.calling_format)
            .field("secure_urls", &self.secure_urls)
            .field("file_name_charset", &self.file_name_charset)
            .field("gzip", &self.gzip)
            .field("gzip_content_types", &self.gzip_content_types)
            .field("url_protocol", &self.url_protocol)
            .field("host", &self.host)
            .field("use_ssl", &self.use_ssl)
            .field("port", &self.port)
            .field("preload_metadata", &self.preload_metadata)
            .field("max_memory_size", &self.max_memory_size)
            .finish()
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            file_overwrite: true,
            headers: BTreeMap::new(),
            bucket_name: None,
            auto_create_bucket: false,
            default_acl: DEFAULT_ACL.to_string(),
            bucket_acl: DEFAULT_ACL.to_string(),
            querystring_auth: true,
            querystring_expire: DEFAULT_QUERYSTRING_EXPIRE,
            reduced_redundancy: false,
            location: String::new(),
            encryption: false,
            custom_domain: None,
            calling_format: CallingFormat::default(),
            secure_urls: true,
            file_name_charset: DEFAULT_FILE_NAME_CHARSET.to_string(),
            gzip: false,
            gzip_content_types: DEFAULT_GZIP_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            url_protocol: DEFAULT_URL_PROTOCOL.to_string(),
            host: DEFAULT_HOST.to_string(),
            use_ssl: true,
            port: None,
            preload_metadata: false,
            max_memory_size: 0,
        }
    }
}

impl AdapterConfig {
    /// Resolve every recognized option of one store's settings block
    ///
    /// Credentials resolve the generic `AWS_*` name first and use it as the
    /// default for the specific `AWS_S3_*` name. The bucket ACL defaults to the
    /// already-resolved default ACL.
    pub fn build<S: SettingsSource + ?Sized>(store: &str, source: &S) -> Result<Self> {
        let r = Resolver::new(store, source);

        let generic_access_key = r.opt_string(names::ACCESS_KEY_ID, None)?;
        let access_key = r.opt_string(names::S3_ACCESS_KEY_ID, generic_access_key)?;
        let generic_secret_key = r.opt_string(names::SECRET_ACCESS_KEY, None)?;
        let secret_key = r.opt_string(names::S3_SECRET_ACCESS_KEY, generic_secret_key)?;

        let default_acl = r.string(names::DEFAULT_ACL, DEFAULT_ACL)?;
        let bucket_acl = r.string(names::BUCKET_ACL, &default_acl)?;

        let calling_format = match r.opt_string(names::CALLING_FORMAT, None)? {
            Some(value) => value.parse().map_err(|_| {
                Error::invalid_setting(store, names::CALLING_FORMAT, "subdomain, path or vhost")
            })?,
            None => CallingFormat::default(),
        };

        Ok(Self {
            access_key,
            secret_key,
            file_overwrite: r.bool(names::FILE_OVERWRITE, true)?,
            headers: r.string_map(names::HEADERS)?,
            bucket_name: r.opt_string(names::STORAGE_BUCKET_NAME, None)?,
            auto_create_bucket: r.bool(names::AUTO_CREATE_BUCKET, false)?,
            default_acl,
            bucket_acl,
            querystring_auth: r.bool(names::QUERYSTRING_AUTH, true)?,
            querystring_expire: r.u64(names::QUERYSTRING_EXPIRE, DEFAULT_QUERYSTRING_EXPIRE)?,
            reduced_redundancy: r.bool(names::REDUCED_REDUNDANCY, false)?,
            location: r.string(names::LOCATION, "")?,
            encryption: r.bool(names::ENCRYPTION, false)?,
            custom_domain: r.opt_string(names::CUSTOM_DOMAIN, None)?,
            calling_format,
            secure_urls: r.bool(names::SECURE_URLS, true)?,
            file_name_charset: r.string(names::FILE_NAME_CHARSET, DEFAULT_FILE_NAME_CHARSET)?,
            gzip: r.bool(names::IS_GZIPPED, false)?,
            gzip_content_types: r
                .string_list(names::GZIP_CONTENT_TYPES, DEFAULT_GZIP_CONTENT_TYPES)?,
            url_protocol: r.string(names::URL_PROTOCOL, DEFAULT_URL_PROTOCOL)?,
            host: r.string(names::HOST, DEFAULT_HOST)?,
            use_ssl: r.bool(names::USE_SSL, true)?,
            port: r.opt_u16(names::PORT)?,
            preload_metadata: r.bool(names::PRELOAD_METADATA, false)?,
            max_memory_size: r.u64(names::MAX_MEMORY_SIZE, 0)?,
        })
    }

    /// Signed URL lifetime
    pub fn querystring_expiry(&self) -> Duration {
        Duration::from_secs(self.querystring_expire)
    }

    /// `host` or `host:port`
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Service endpoint the storage client connects to
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}", self.authority())
    }

    /// Bucket name, required by anything that talks to the backend
    pub fn require_bucket(&self) -> Result<&str> {
        self.bucket_name
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{} is not set", names::STORAGE_BUCKET_NAME)))
    }

    /// Storage key for an object name, placed under `location`
    ///
    /// Fails with `InvalidPath` when `name` does not address an object.
    pub fn object_key(&self, name: &str) -> Result<String> {
        path::join_object(&self.location, name)
    }

    /// Storage key prefix for listing, `location` itself when `prefix` is empty
    pub fn prefix_key(&self, prefix: &str) -> Result<String> {
        path::join_location(&self.location, prefix)
    }

    /// Object name for a storage key, with `location` removed
    pub fn object_name<'a>(&self, key: &'a str) -> &'a str {
        path::strip_location(&self.location, key)
    }

    /// Unsigned URL for an object
    ///
    /// Uses the custom domain when one is set, otherwise addresses the bucket
    /// according to the calling format.
    pub fn public_url(&self, name: &str) -> Result<String> {
        let key = self.object_key(name)?;

        let base = match &self.custom_domain {
            Some(domain) => format!("{}//{}/", self.url_protocol, domain),
            None => {
                let scheme = if self.secure_urls { "https" } else { "http" };
                let bucket = self.require_bucket()?;
                match self.calling_format {
                    CallingFormat::Subdomain => {
                        format!("{scheme}://{bucket}.{}/", self.authority())
                    }
                    CallingFormat::Path => format!("{scheme}://{}/{bucket}/", self.authority()),
                    CallingFormat::Vhost => format!("{scheme}://{bucket}/"),
                }
            }
        };

        let mut url = Url::parse(&base)?;
        url.path_segments_mut()
            .map_err(|_| Error::General(format!("Cannot append object key to {base}")))?
            .pop_if_empty()
            .extend(key.split('/'));

        Ok(url.to_string())
    }

    /// Credentials for the storage client
    ///
    /// Configured keys win; a missing key is looked up through `lookup` under
    /// [`ACCESS_KEY_NAMES`] / [`SECRET_KEY_NAMES`]. Returns `None` unless both
    /// halves are found.
    pub fn credentials_with<F>(&self, lookup: F) -> Option<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |candidates: &[&str]| candidates.iter().find_map(|name| lookup(*name));

        let access_key = self
            .access_key
            .clone()
            .or_else(|| first(ACCESS_KEY_NAMES))?;
        let secret_key = self
            .secret_key
            .clone()
            .or_else(|| first(SECRET_KEY_NAMES))?;

        Some(Credentials {
            access_key,
            secret_key,
        })
    }

    /// Credentials from configuration, falling back to the process environment
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Copy safe to display: the secret key is masked
    pub fn redacted(&self) -> Self {
        Self {
            secret_key: self.secret_key.as_ref().map(|_| SECRET_MASK.to_string()),
            ..self.clone()
        }
    }
}
