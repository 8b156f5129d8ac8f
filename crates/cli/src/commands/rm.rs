//! rm command - Remove objects
//!
//! Removes one or more objects. Paths may span several stores; one client is
//! opened per store and the deletions run concurrently.

use std::collections::BTreeMap;

use clap::Args;
use futures::future::join_all;
use serde::Serialize;
use sm_core::{Error, ObjectStore as _};
use sm_s3::S3Client;

use super::{parse_object_path, AppContext};
use crate::exit_code::ExitCode;

/// Remove objects
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object path(s) to remove (store/name)
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Ignore objects that do not exist
    #[arg(short, long)]
    pub force: bool,

    /// Only show what would be deleted (dry run)
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
    total: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, ctx: &AppContext) -> ExitCode {
    let formatter = &ctx.formatter;

    let paths = match args
        .paths
        .iter()
        .map(|p| parse_object_path(p))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(paths) => paths,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    if args.dry_run {
        for path in &paths {
            formatter.println(&format!("Would remove: {path}"));
        }
        return ExitCode::Success;
    }

    let mut clients: BTreeMap<&str, S3Client> = BTreeMap::new();
    for path in &paths {
        if clients.contains_key(path.store.as_str()) {
            continue;
        }
        match ctx.open_store(&path.store).await {
            Ok(client) => {
                clients.insert(&path.store, client);
            }
            Err(e) => return ctx.fail(&e),
        }
    }

    let results = join_all(paths.iter().map(|path| {
        let client = &clients[path.store.as_str()];
        async move { (path, remove_existing(client, &path.name).await) }
    }))
    .await;

    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    let mut exit_code = ExitCode::Success;

    for (path, result) in results {
        match result {
            Ok(()) => {
                if !formatter.is_json() {
                    formatter.println(&format!("Removed: {path}"));
                }
                deleted.push(path.to_string());
            }
            Err(Error::NotFound(_)) if args.force => {}
            Err(e) => {
                formatter.error(&format!("Failed to remove {path}: {e}"));
                exit_code = merge_exit_code(exit_code, ExitCode::from(&e));
                failed.push(path.to_string());
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&RmOutput {
            status: rm_status(&deleted, &failed),
            total: deleted.len(),
            deleted,
            failed,
        });
    } else if !failed.is_empty() && !deleted.is_empty() {
        tracing::warn!(deleted = deleted.len(), failed = failed.len(), "Partial removal");
        formatter.warning(&format!(
            "Removed {} object(s), {} failed",
            deleted.len(),
            failed.len()
        ));
    }

    exit_code
}

/// Delete an object, reporting `NotFound` for a missing one
///
/// S3 deletes succeed for missing keys, so existence is checked first.
async fn remove_existing(client: &S3Client, name: &str) -> sm_core::Result<()> {
    if !client.exists(name).await? {
        return Err(Error::NotFound(format!("{}/{name}", client.store())));
    }
    client.delete_object(name).await
}

fn rm_status(deleted: &[String], failed: &[String]) -> &'static str {
    match (deleted.is_empty(), failed.is_empty()) {
        (_, true) => "success",
        (false, false) => "partial",
        (true, false) => "failed",
    }
}

/// The first failure decides the exit code
fn merge_exit_code(current: ExitCode, next: ExitCode) -> ExitCode {
    if current == ExitCode::Success {
        next
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rm_status() {
        let some = vec!["media/a.txt".to_string()];
        assert_eq!(rm_status(&some, &[]), "success");
        assert_eq!(rm_status(&some, &some), "partial");
        assert_eq!(rm_status(&[], &some), "failed");
        assert_eq!(rm_status(&[], &[]), "success");
    }

    #[test]
    fn test_merge_exit_code_keeps_first_failure() {
        let code = merge_exit_code(ExitCode::Success, ExitCode::NotFound);
        assert_eq!(code, ExitCode::NotFound);
        assert_eq!(merge_exit_code(code, ExitCode::AuthError), ExitCode::NotFound);
    }

    #[test]
    fn test_rm_args_require_a_path() {
        use clap::Parser;
        assert!(crate::commands::Cli::try_parse_from(["sm", "rm"]).is_err());
    }
}
