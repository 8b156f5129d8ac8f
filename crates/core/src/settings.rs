//! Settings sources and option resolution
//!
//! A store's options come from a settings block that is either map-backed
//! (`toml::Table`, `HashMap`, `BTreeMap`), struct-backed ([`StoreSettings`]),
//! or a snapshot of environment variables ([`EnvSettings`]). Every lookup has a
//! caller-supplied default: an absent option is never an error.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use toml::Value;

use crate::error::{Error, Result};

/// Recognized option names
pub mod names {
    pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    pub const S3_ACCESS_KEY_ID: &str = "AWS_S3_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    pub const S3_SECRET_ACCESS_KEY: &str = "AWS_S3_SECRET_ACCESS_KEY";
    pub const FILE_OVERWRITE: &str = "AWS_S3_FILE_OVERWRITE";
    pub const HEADERS: &str = "AWS_HEADERS";
    pub const STORAGE_BUCKET_NAME: &str = "AWS_STORAGE_BUCKET_NAME";
    pub const AUTO_CREATE_BUCKET: &str = "AWS_AUTO_CREATE_BUCKET";
    pub const DEFAULT_ACL: &str = "AWS_DEFAULT_ACL";
    pub const BUCKET_ACL: &str = "AWS_BUCKET_ACL";
    pub const QUERYSTRING_AUTH: &str = "AWS_QUERYSTRING_AUTH";
    pub const QUERYSTRING_EXPIRE: &str = "AWS_QUERYSTRING_EXPIRE";
    pub const REDUCED_REDUNDANCY: &str = "AWS_REDUCED_REDUNDANCY";
    pub const LOCATION: &str = "AWS_LOCATION";
    pub const ENCRYPTION: &str = "AWS_S3_ENCRYPTION";
    pub const CUSTOM_DOMAIN: &str = "AWS_S3_CUSTOM_DOMAIN";
    pub const CALLING_FORMAT: &str = "AWS_S3_CALLING_FORMAT";
    pub const SECURE_URLS: &str = "AWS_S3_SECURE_URLS";
    pub const FILE_NAME_CHARSET: &str = "AWS_S3_FILE_NAME_CHARSET";
    pub const IS_GZIPPED: &str = "AWS_IS_GZIPPED";
    pub const PRELOAD_METADATA: &str = "AWS_PRELOAD_METADATA";
    pub const GZIP_CONTENT_TYPES: &str = "GZIP_CONTENT_TYPES";
    pub const URL_PROTOCOL: &str = "AWS_S3_URL_PROTOCOL";
    pub const HOST: &str = "AWS_S3_HOST";
    pub const USE_SSL: &str = "AWS_S3_USE_SSL";
    pub const PORT: &str = "AWS_S3_PORT";
    pub const MAX_MEMORY_SIZE: &str = "AWS_S3_MAX_MEMORY_SIZE";

    /// Every option the adapter factory reads
    pub const ALL: &[&str] = &[
        ACCESS_KEY_ID,
        S3_ACCESS_KEY_ID,
        SECRET_ACCESS_KEY,
        S3_SECRET_ACCESS_KEY,
        FILE_OVERWRITE,
        HEADERS,
        STORAGE_BUCKET_NAME,
        AUTO_CREATE_BUCKET,
        DEFAULT_ACL,
        BUCKET_ACL,
        QUERYSTRING_AUTH,
        QUERYSTRING_EXPIRE,
        REDUCED_REDUNDANCY,
        LOCATION,
        ENCRYPTION,
        CUSTOM_DOMAIN,
        CALLING_FORMAT,
        SECURE_URLS,
        FILE_NAME_CHARSET,
        IS_GZIPPED,
        PRELOAD_METADATA,
        GZIP_CONTENT_TYPES,
        URL_PROTOCOL,
        HOST,
        USE_SSL,
        PORT,
        MAX_MEMORY_SIZE,
    ];

    /// Check whether an option name is one the adapter factory reads
    pub fn is_recognized(name: &str) -> bool {
        ALL.contains(&name)
    }
}

/// A read-only source of store options
pub trait SettingsSource {
    /// Look up a single option by name
    fn setting(&self, name: &str) -> Option<Value>;
}

impl<T: SettingsSource + ?Sized> SettingsSource for &T {
    fn setting(&self, name: &str) -> Option<Value> {
        (**self).setting(name)
    }
}

impl SettingsSource for toml::Table {
    fn setting(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl SettingsSource for BTreeMap<String, Value> {
    fn setting(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl SettingsSource for HashMap<String, Value> {
    fn setting(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Return the option `name` from `source`, or `default` when it is absent
pub fn get_setting<S: SettingsSource + ?Sized>(source: &S, name: &str, default: Value) -> Value {
    source.setting(name).unwrap_or(default)
}

/// Two sources stacked: `overrides` is consulted first, then `base`
#[derive(Debug, Clone)]
pub struct Layered<A, B> {
    pub overrides: A,
    pub base: B,
}

impl<A, B> Layered<A, B> {
    pub fn new(overrides: A, base: B) -> Self {
        Self { overrides, base }
    }
}

impl<A: SettingsSource, B: SettingsSource> SettingsSource for Layered<A, B> {
    fn setting(&self, name: &str) -> Option<Value> {
        self.overrides
            .setting(name)
            .or_else(|| self.base.setting(name))
    }
}

/// Environment variable prefix for a store's overrides: `SM_<STORE>_`
pub fn env_prefix(store: &str) -> String {
    format!("SM_{}_", store.to_ascii_uppercase().replace('-', "_"))
}

/// Snapshot of the environment variables that override one store's options
///
/// `SM_MEDIA_AWS_STORAGE_BUCKET_NAME=assets` sets `AWS_STORAGE_BUCKET_NAME`
/// for the `media` store. Values are always strings; the resolver coerces them.
#[derive(Debug, Clone, Default)]
pub struct EnvSettings {
    vars: HashMap<String, String>,
}

impl EnvSettings {
    /// Capture overrides for `store` from the given variables
    pub fn for_store<I>(store: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = env_prefix(store);
        let vars = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|option| (option.to_string(), value))
            })
            .collect();
        Self { vars }
    }

    /// Capture overrides for `store` from the process environment
    pub fn from_env(store: &str) -> Self {
        Self::for_store(store, std::env::vars())
    }

    /// Number of captured overrides
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl SettingsSource for EnvSettings {
    fn setting(&self, name: &str) -> Option<Value> {
        self.vars.get(name).map(|v| Value::String(v.clone()))
    }
}

/// Struct-backed settings block: one optional field per recognized option
///
/// Deserializes from the same option names used in map-backed blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct StoreSettings {
    pub aws_access_key_id: Option<String>,
    pub aws_s3_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_s3_secret_access_key: Option<String>,
    pub aws_s3_file_overwrite: Option<bool>,
    pub aws_headers: Option<BTreeMap<String, String>>,
    pub aws_storage_bucket_name: Option<String>,
    pub aws_auto_create_bucket: Option<bool>,
    pub aws_default_acl: Option<String>,
    pub aws_bucket_acl: Option<String>,
    pub aws_querystring_auth: Option<bool>,
    pub aws_querystring_expire: Option<u64>,
    pub aws_reduced_redundancy: Option<bool>,
    pub aws_location: Option<String>,
    pub aws_s3_encryption: Option<bool>,
    pub aws_s3_custom_domain: Option<String>,
    pub aws_s3_calling_format: Option<String>,
    pub aws_s3_secure_urls: Option<bool>,
    pub aws_s3_file_name_charset: Option<String>,
    pub aws_is_gzipped: Option<bool>,
    pub aws_preload_metadata: Option<bool>,
    pub gzip_content_types: Option<Vec<String>>,
    pub aws_s3_url_protocol: Option<String>,
    pub aws_s3_host: Option<String>,
    pub aws_s3_use_ssl: Option<bool>,
    pub aws_s3_port: Option<u16>,
    pub aws_s3_max_memory_size: Option<u64>,
}

fn string_value(v: &Option<String>) -> Option<Value> {
    v.clone().map(Value::String)
}

fn bool_value(v: Option<bool>) -> Option<Value> {
    v.map(Value::Boolean)
}

fn int_value(v: Option<u64>) -> Option<Value> {
    v.map(|n| Value::Integer(i64::try_from(n).unwrap_or(i64::MAX)))
}

impl SettingsSource for StoreSettings {
    fn setting(&self, name: &str) -> Option<Value> {
        match name {
            names::ACCESS_KEY_ID => string_value(&self.aws_access_key_id),
            names::S3_ACCESS_KEY_ID => string_value(&self.aws_s3_access_key_id),
            names::SECRET_ACCESS_KEY => string_value(&self.aws_secret_access_key),
            names::S3_SECRET_ACCESS_KEY => string_value(&self.aws_s3_secret_access_key),
            names::FILE_OVERWRITE => bool_value(self.aws_s3_file_overwrite),
            names::HEADERS => self.aws_headers.as_ref().map(|headers| {
                Value::Table(
                    headers
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect(),
                )
            }),
            names::STORAGE_BUCKET_NAME => string_value(&self.aws_storage_bucket_name),
            names::AUTO_CREATE_BUCKET => bool_value(self.aws_auto_create_bucket),
            names::DEFAULT_ACL => string_value(&self.aws_default_acl),
            names::BUCKET_ACL => string_value(&self.aws_bucket_acl),
            names::QUERYSTRING_AUTH => bool_value(self.aws_querystring_auth),
            names::QUERYSTRING_EXPIRE => int_value(self.aws_querystring_expire),
            names::REDUCED_REDUNDANCY => bool_value(self.aws_reduced_redundancy),
            names::LOCATION => string_value(&self.aws_location),
            names::ENCRYPTION => bool_value(self.aws_s3_encryption),
            names::CUSTOM_DOMAIN => string_value(&self.aws_s3_custom_domain),
            names::CALLING_FORMAT => string_value(&self.aws_s3_calling_format),
            names::SECURE_URLS => bool_value(self.aws_s3_secure_urls),
            names::FILE_NAME_CHARSET => string_value(&self.aws_s3_file_name_charset),
            names::IS_GZIPPED => bool_value(self.aws_is_gzipped),
            names::PRELOAD_METADATA => bool_value(self.aws_preload_metadata),
            names::GZIP_CONTENT_TYPES => self
                .gzip_content_types
                .as_ref()
                .map(|types| Value::Array(types.iter().cloned().map(Value::String).collect())),
            names::URL_PROTOCOL => string_value(&self.aws_s3_url_protocol),
            names::HOST => string_value(&self.aws_s3_host),
            names::USE_SSL => bool_value(self.aws_s3_use_ssl),
            names::PORT => int_value(self.aws_s3_port.map(u64::from)),
            names::MAX_MEMORY_SIZE => int_value(self.aws_s3_max_memory_size),
            _ => None,
        }
    }
}

/// Typed option lookups over a settings source for one store
///
/// Each lookup returns its default when the option is absent. A present value
/// of the wrong shape is an [`Error::InvalidSetting`]. String values are
/// coerced for booleans, integers and lists so that environment-backed
/// sources resolve the same way as typed ones.
pub struct Resolver<'a, S: ?Sized> {
    store: &'a str,
    source: &'a S,
}

impl<'a, S: SettingsSource + ?Sized> Resolver<'a, S> {
    pub fn new(store: &'a str, source: &'a S) -> Self {
        Self { store, source }
    }

    /// Name of the store being resolved
    pub fn store(&self) -> &str {
        self.store
    }

    fn invalid(&self, name: &str, expected: &'static str) -> Error {
        Error::invalid_setting(self.store, name, expected)
    }

    pub fn string(&self, name: &str, default: &str) -> Result<String> {
        Ok(self
            .opt_string(name, None)?
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn opt_string(&self, name: &str, default: Option<String>) -> Result<Option<String>> {
        match self.source.setting(name) {
            None => Ok(default),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(self.invalid(name, "a string")),
        }
    }

    pub fn bool(&self, name: &str, default: bool) -> Result<bool> {
        match self.source.setting(name) {
            None => Ok(default),
            Some(Value::Boolean(b)) => Ok(b),
            Some(Value::String(s)) => parse_bool(&s).ok_or_else(|| self.invalid(name, "a boolean")),
            Some(_) => Err(self.invalid(name, "a boolean")),
        }
    }

    pub fn u64(&self, name: &str, default: u64) -> Result<u64> {
        const EXPECTED: &str = "a non-negative integer";
        match self.source.setting(name) {
            None => Ok(default),
            Some(Value::Integer(i)) => u64::try_from(i).map_err(|_| self.invalid(name, EXPECTED)),
            Some(Value::String(s)) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| self.invalid(name, EXPECTED)),
            Some(_) => Err(self.invalid(name, EXPECTED)),
        }
    }

    pub fn opt_u16(&self, name: &str) -> Result<Option<u16>> {
        const EXPECTED: &str = "a port number";
        match self.source.setting(name) {
            None => Ok(None),
            Some(Value::Integer(i)) => u16::try_from(i)
                .map(Some)
                .map_err(|_| self.invalid(name, EXPECTED)),
            Some(Value::String(s)) => s
                .trim()
                .parse::<u16>()
                .map(Some)
                .map_err(|_| self.invalid(name, EXPECTED)),
            Some(_) => Err(self.invalid(name, EXPECTED)),
        }
    }

    pub fn string_list(&self, name: &str, default: &[&str]) -> Result<Vec<String>> {
        const EXPECTED: &str = "a list of strings";
        match self.source.setting(name) {
            None => Ok(default.iter().map(|s| s.to_string()).collect()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    _ => Err(self.invalid(name, EXPECTED)),
                })
                .collect(),
            Some(Value::String(s)) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()),
            Some(_) => Err(self.invalid(name, EXPECTED)),
        }
    }

    /// Table of strings; a string value is parsed as a JSON object
    pub fn string_map(&self, name: &str) -> Result<BTreeMap<String, String>> {
        const EXPECTED: &str = "a table of strings";
        match self.source.setting(name) {
            None => Ok(BTreeMap::new()),
            Some(Value::Table(table)) => table
                .into_iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k, s)),
                    _ => Err(self.invalid(name, EXPECTED)),
                })
                .collect(),
            Some(Value::String(s)) => {
                serde_json::from_str(&s).map_err(|_| self.invalid(name, EXPECTED))
            }
            Some(_) => Err(self.invalid(name, EXPECTED)),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(content: &str) -> toml::Table {
        toml::from_str(content).unwrap()
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_get_setting_present_and_absent() {
        let block = table(r#"AWS_LOCATION = "static""#);
        let fallback = Value::String("fallback".into());

        assert_eq!(
            get_setting(&block, names::LOCATION, fallback.clone()),
            Value::String("static".into())
        );
        assert_eq!(get_setting(&block, names::HOST, fallback.clone()), fallback);
    }

    #[test]
    fn test_get_setting_struct_source() {
        let settings = StoreSettings {
            aws_s3_port: Some(9000),
            ..Default::default()
        };
        assert_eq!(
            get_setting(&settings, names::PORT, Value::Integer(0)),
            Value::Integer(9000)
        );
        assert_eq!(
            get_setting(&settings, names::LOCATION, Value::String(String::new())),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_unknown_name_on_struct_source() {
        let settings = StoreSettings::default();
        assert!(settings.setting("NOT_AN_OPTION").is_none());
    }

    #[test]
    fn test_map_sources_agree() {
        let mut btree = BTreeMap::new();
        btree.insert(names::LOCATION.to_string(), Value::String("a".into()));
        let mut hash = HashMap::new();
        hash.insert(names::LOCATION.to_string(), Value::String("a".into()));

        assert_eq!(btree.setting(names::LOCATION), hash.setting(names::LOCATION));
        assert!(btree.setting(names::HOST).is_none());
    }

    #[test]
    fn test_env_settings_prefix() {
        let env = EnvSettings::for_store(
            "user-uploads",
            vars(&[
                ("SM_USER_UPLOADS_AWS_STORAGE_BUCKET_NAME", "uploads"),
                ("SM_MEDIA_AWS_STORAGE_BUCKET_NAME", "media"),
                ("HOME", "/root"),
            ]),
        );

        assert_eq!(env.len(), 1);
        assert_eq!(
            env.setting(names::STORAGE_BUCKET_NAME),
            Some(Value::String("uploads".into()))
        );
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(env_prefix("media"), "SM_MEDIA_");
        assert_eq!(env_prefix("user-uploads"), "SM_USER_UPLOADS_");
    }

    #[test]
    fn test_layered_prefers_overrides() {
        let base = table(
            r#"
            AWS_STORAGE_BUCKET_NAME = "from-file"
            AWS_LOCATION = "static"
            "#,
        );
        let env = EnvSettings::for_store(
            "media",
            vars(&[("SM_MEDIA_AWS_STORAGE_BUCKET_NAME", "from-env")]),
        );
        let layered = Layered::new(env, &base);

        assert_eq!(
            layered.setting(names::STORAGE_BUCKET_NAME),
            Some(Value::String("from-env".into()))
        );
        assert_eq!(
            layered.setting(names::LOCATION),
            Some(Value::String("static".into()))
        );
        assert!(layered.setting(names::HOST).is_none());
    }

    #[test]
    fn test_resolver_defaults_when_absent() {
        let block = toml::Table::new();
        let r = Resolver::new("media", &block);

        assert_eq!(r.string(names::HOST, "s3.amazonaws.com").unwrap(), "s3.amazonaws.com");
        assert_eq!(r.opt_string(names::CUSTOM_DOMAIN, None).unwrap(), None);
        assert!(r.bool(names::USE_SSL, true).unwrap());
        assert_eq!(r.u64(names::QUERYSTRING_EXPIRE, 3600).unwrap(), 3600);
        assert_eq!(r.opt_u16(names::PORT).unwrap(), None);
        assert_eq!(r.string_list(names::GZIP_CONTENT_TYPES, &["text/css"]).unwrap(), vec!["text/css"]);
        assert!(r.string_map(names::HEADERS).unwrap().is_empty());
    }

    #[test]
    fn test_resolver_coerces_strings() {
        let env = EnvSettings::for_store(
            "media",
            vars(&[
                ("SM_MEDIA_AWS_S3_USE_SSL", "off"),
                ("SM_MEDIA_AWS_QUERYSTRING_AUTH", "TRUE"),
                ("SM_MEDIA_AWS_QUERYSTRING_EXPIRE", " 600 "),
                ("SM_MEDIA_AWS_S3_PORT", "9000"),
                ("SM_MEDIA_GZIP_CONTENT_TYPES", "text/css, text/html,"),
                ("SM_MEDIA_AWS_HEADERS", r#"{"Cache-Control": "max-age=60"}"#),
            ]),
        );
        let r = Resolver::new("media", &env);

        assert!(!r.bool(names::USE_SSL, true).unwrap());
        assert!(r.bool(names::QUERYSTRING_AUTH, false).unwrap());
        assert_eq!(r.u64(names::QUERYSTRING_EXPIRE, 3600).unwrap(), 600);
        assert_eq!(r.opt_u16(names::PORT).unwrap(), Some(9000));
        assert_eq!(
            r.string_list(names::GZIP_CONTENT_TYPES, &[]).unwrap(),
            vec!["text/css", "text/html"]
        );
        assert_eq!(
            r.string_map(names::HEADERS).unwrap().get("Cache-Control").map(String::as_str),
            Some("max-age=60")
        );
    }

    #[test]
    fn test_resolver_rejects_wrong_shape() {
        let block = table(
            r#"
            AWS_S3_USE_SSL = "sometimes"
            AWS_S3_PORT = 70000
            AWS_QUERYSTRING_EXPIRE = -1
            AWS_LOCATION = 5
            GZIP_CONTENT_TYPES = ["text/css", 1]
            AWS_HEADERS = { Cache-Control = 60 }
            "#,
        );
        let r = Resolver::new("media", &block);

        assert!(matches!(
            r.bool(names::USE_SSL, true),
            Err(Error::InvalidSetting { .. })
        ));
        assert!(r.opt_u16(names::PORT).is_err());
        assert!(r.u64(names::QUERYSTRING_EXPIRE, 3600).is_err());
        assert!(r.string(names::LOCATION, "").is_err());
        assert!(r.string_list(names::GZIP_CONTENT_TYPES, &[]).is_err());
        assert!(r.string_map(names::HEADERS).is_err());
    }

    #[test]
    fn test_invalid_setting_names_store_and_option() {
        let block = table(r#"AWS_S3_PORT = "http""#);
        let err = Resolver::new("media", &block)
            .opt_u16(names::PORT)
            .unwrap_err();

        match err {
            Error::InvalidSetting { store, name, .. } => {
                assert_eq!(store, "media");
                assert_eq!(name, names::PORT);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_store_settings_deserialize_option_names() {
        let settings: StoreSettings = toml::from_str(
            r#"
            AWS_STORAGE_BUCKET_NAME = "assets"
            AWS_S3_ACCESS_KEY_ID = "specific"
            GZIP_CONTENT_TYPES = ["text/css"]
            AWS_HEADERS = { Cache-Control = "max-age=60" }
            "#,
        )
        .unwrap();

        assert_eq!(settings.aws_storage_bucket_name.as_deref(), Some("assets"));
        assert_eq!(settings.aws_s3_access_key_id.as_deref(), Some("specific"));
        assert_eq!(
            settings.setting(names::GZIP_CONTENT_TYPES),
            Some(Value::Array(vec![Value::String("text/css".into())]))
        );
        assert!(settings.setting(names::HEADERS).is_some());
    }

    #[test]
    fn test_every_struct_field_is_recognized() {
        let value = serde_json::to_value(StoreSettings::default()).unwrap();
        let fields = value.as_object().unwrap();

        assert_eq!(fields.len(), names::ALL.len());
        for field in fields.keys() {
            assert!(names::is_recognized(field), "{field} is not a recognized option");
        }
    }
}
