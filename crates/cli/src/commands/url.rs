//! url command - Print the URL an object is served from
//!
//! Signed when the store uses query string authentication, plain otherwise.
//! Plain URLs are derived from the configuration alone, without a client.

use clap::Args;
use sm_core::ObjectStore as _;

use super::{parse_object_path, AppContext};
use crate::exit_code::ExitCode;

/// Print an object URL
#[derive(Args, Debug)]
pub struct UrlArgs {
    /// Object path (store/name)
    pub path: String,
}

/// Execute the url command
pub async fn execute(args: UrlArgs, ctx: &AppContext) -> ExitCode {
    let formatter = &ctx.formatter;

    let result = async {
        let path = parse_object_path(&args.path)?;
        let adapter = ctx.registry.get(&path.store)?;
        if !adapter.querystring_auth || adapter.custom_domain.is_some() {
            return anyhow::Ok(adapter.public_url(&path.name)?);
        }
        let client = ctx.open_store(&path.store).await?;
        let url = client.url(&path.name).await?;
        anyhow::Ok(url)
    }
    .await;

    match result {
        Ok(url) => {
            if formatter.is_json() {
                formatter.json(&serde_json::json!({ "path": args.path, "url": url }));
            } else {
                formatter.println(&url);
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}
