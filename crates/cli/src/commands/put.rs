//! put command - Upload a local file to a store
//!
//! The store's write policy applies: ACL, headers, encryption, storage class
//! and whether an existing object may be replaced.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use sm_core::{ObjectInfo, ObjectStore as _};

use super::{parse_object_path, AppContext};
use crate::exit_code::ExitCode;

/// Upload a local file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub file: PathBuf,

    /// Destination path (store/name)
    pub path: String,

    /// Content type of the object
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    source: String,
    target: String,
    #[serde(flatten)]
    info: ObjectInfo,
}

/// Execute the put command
pub async fn execute(args: PutArgs, ctx: &AppContext) -> ExitCode {
    let formatter = &ctx.formatter;

    let info = match put(&args, ctx).await {
        Ok(info) => info,
        Err(e) => return ctx.fail(&e),
    };

    if formatter.is_json() {
        formatter.json(&PutOutput {
            status: "success",
            source: args.file.display().to_string(),
            target: args.path,
            info,
        });
    } else {
        let size = info.size_human.as_deref().unwrap_or("0 B");
        formatter.success(&format!(
            "{} -> {} ({size})",
            args.file.display(),
            args.path
        ));
    }

    ExitCode::Success
}

async fn put(args: &PutArgs, ctx: &AppContext) -> anyhow::Result<ObjectInfo> {
    let path = parse_object_path(&args.path)?;
    let data = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let client = ctx.open_store(&path.store).await?;
    let info = client
        .put_object(&path.name, data, args.content_type.as_deref())
        .await?;

    tracing::debug!(store = %path.store, name = %path.name, "Uploaded object");
    Ok(info)
}
