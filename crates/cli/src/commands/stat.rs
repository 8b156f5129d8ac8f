//! stat command - Show object metadata
//!
//! Displays detailed metadata information about an object.

use clap::Args;
use serde::Serialize;
use sm_core::{ObjectInfo, ObjectStore as _};

use super::{parse_object_path, AppContext};
use crate::exit_code::ExitCode;

/// Show object metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Object path (store/name)
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    store: String,
    #[serde(flatten)]
    info: ObjectInfo,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, ctx: &AppContext) -> ExitCode {
    let formatter = &ctx.formatter;

    let result = async {
        let path = parse_object_path(&args.path)?;
        let client = ctx.open_store(&path.store).await?;
        let info = client.head_object(&path.name).await?;
        anyhow::Ok((path.store, info))
    }
    .await;

    let (store, info) = match result {
        Ok(found) => found,
        Err(e) => return ctx.fail(&e),
    };

    if formatter.is_json() {
        formatter.json(&StatOutput { store, info });
    } else {
        for line in render_info(&store, &info) {
            formatter.println(&line);
        }
    }

    ExitCode::Success
}

fn render_info(store: &str, info: &ObjectInfo) -> Vec<String> {
    let mut lines = vec![format!("Name      : {store}/{}", info.key)];
    if let Some(modified) = info.last_modified {
        lines.push(format!(
            "Date      : {}",
            modified.strftime("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let (Some(size), Some(human)) = (info.size_bytes, &info.size_human) {
        lines.push(format!("Size      : {human} ({size} bytes)"));
    }
    if let Some(etag) = &info.etag {
        lines.push(format!("ETag      : {etag}"));
    }
    if let Some(ct) = &info.content_type {
        lines.push(format!("Type      : {ct}"));
    }
    if let Some(sc) = &info.storage_class {
        lines.push(format!("Class     : {sc}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_info() {
        let mut info = ObjectInfo::file("images/logo.png", 2048);
        info.last_modified = Some("2024-01-15T10:30:00Z".parse().unwrap());
        info.etag = Some("9b2cf535f27731c974343645a3985328".to_string());
        info.content_type = Some("image/png".to_string());

        assert_eq!(
            render_info("media", &info),
            vec![
                "Name      : media/images/logo.png",
                "Date      : 2024-01-15 10:30:00 UTC",
                "Size      : 2 KiB (2048 bytes)",
                "ETag      : 9b2cf535f27731c974343645a3985328",
                "Type      : image/png",
            ]
        );
    }
}
