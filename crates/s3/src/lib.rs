//! sm-s3: S3 storage client for s3multi stores
//!
//! This crate provides the implementation of the ObjectStore trait
//! using the aws-sdk-s3 crate, parameterized by one store's
//! `AdapterConfig`. It is the only crate that directly depends on the
//! AWS SDK.

pub mod client;

pub use client::S3Client;
