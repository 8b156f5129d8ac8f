//! ls command - List objects of a store
//!
//! Lists the objects under a store's location, optionally narrowed to a prefix.

use clap::Args;
use serde::Serialize;
use sm_core::{ListOptions, ObjectInfo, ObjectStore as _, RemotePath};

use super::AppContext;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// List objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote path (store[/prefix])
    pub path: String,

    /// List recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    store: String,
    items: Vec<ObjectInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: usize,
    total_size_bytes: i64,
    total_size_human: String,
}

impl Summary {
    fn of(items: &[ObjectInfo]) -> Self {
        let total_size_bytes: i64 = items.iter().filter_map(|i| i.size_bytes).sum();
        Self {
            total_objects: items.iter().filter(|i| !i.is_dir).count(),
            total_size_bytes,
            total_size_human: humansize::format_size(
                total_size_bytes.max(0) as u64,
                humansize::BINARY,
            ),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, ctx: &AppContext) -> ExitCode {
    match list(&args, ctx).await {
        Ok(items) => {
            print_items(&args, items, &ctx.formatter);
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}

async fn list(args: &LsArgs, ctx: &AppContext) -> anyhow::Result<Vec<ObjectInfo>> {
    let path = RemotePath::parse(&args.path)?;
    let client = ctx.open_store(&path.store).await?;
    let prefix = list_prefix(&path.name);

    let mut items = Vec::new();
    let mut continuation_token: Option<String> = None;

    // Paginate through all results
    loop {
        let options = ListOptions {
            max_keys: Some(1000),
            continuation_token: continuation_token.take(),
            recursive: args.recursive,
        };

        let result = client.list_objects(&prefix, options).await?;
        items.extend(result.items);

        if !result.truncated || result.continuation_token.is_none() {
            break;
        }
        continuation_token = result.continuation_token;
    }

    tracing::debug!(store = %path.store, prefix = %prefix, count = items.len(), "Listed objects");
    Ok(items)
}

/// Prefix to list for a path name: a non-empty name is treated as a directory
fn list_prefix(name: &str) -> String {
    if name.is_empty() || name.ends_with('/') {
        name.to_string()
    } else {
        format!("{name}/")
    }
}

fn print_items(args: &LsArgs, items: Vec<ObjectInfo>, formatter: &Formatter) {
    let summary = Summary::of(&items);

    if formatter.is_json() {
        let store = args
            .path
            .split_once('/')
            .map_or(args.path.as_str(), |(store, _)| store)
            .to_string();
        formatter.json(&LsOutput {
            store,
            items,
            summary: args.summarize.then_some(summary),
        });
        return;
    }

    if !args.summarize {
        for item in &items {
            formatter.println(&format_line(item));
        }
    }

    if args.summarize || items.is_empty() {
        formatter.println(&format!(
            "Total: {} objects, {}",
            summary.total_objects, summary.total_size_human
        ));
    }
}

fn format_line(item: &ObjectInfo) -> String {
    let date = item
        .last_modified
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| " ".repeat(19));

    if item.is_dir {
        format!("[{date}] {:>10} {}", "PRE", item.key)
    } else {
        let size = item.size_human.as_deref().unwrap_or("0 B");
        format!("[{date}] {size:>10} {}", item.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_prefix() {
        assert_eq!(list_prefix(""), "");
        assert_eq!(list_prefix("images"), "images/");
        assert_eq!(list_prefix("images/"), "images/");
    }

    #[test]
    fn test_summary() {
        let items = vec![
            ObjectInfo::file("a.txt", 1024),
            ObjectInfo::file("b.txt", 1024),
            ObjectInfo::dir("images/"),
        ];
        let summary = Summary::of(&items);
        assert_eq!(summary.total_objects, 2);
        assert_eq!(summary.total_size_bytes, 2048);
        assert_eq!(summary.total_size_human, "2 KiB");
    }

    #[test]
    fn test_format_line() {
        let mut file = ObjectInfo::file("a.txt", 1024);
        file.last_modified = Some("2024-01-15T10:30:00Z".parse().unwrap());
        assert_eq!(format_line(&file), "[2024-01-15 10:30:00]      1 KiB a.txt");

        let dir = ObjectInfo::dir("images/");
        assert_eq!(
            format_line(&dir),
            "[                   ]        PRE images/"
        );
    }
}
