//! stores command - Inspect configured stores
//!
//! Lists the stores of the registry and shows one store's resolved settings.
//! Secret keys are always masked.

use clap::Subcommand;
use serde::Serialize;
use sm_core::AdapterConfig;

use super::AppContext;
use crate::exit_code::ExitCode;

/// Store subcommands
#[derive(Subcommand, Debug)]
pub enum StoresCommands {
    /// List configured stores
    List(ListArgs),

    /// Show the resolved settings of a store
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show bucket, location and endpoint of each store
    #[arg(short, long)]
    pub long: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Store name
    pub store: String,
}

/// Store summary for list output
#[derive(Debug, Serialize)]
struct StoreSummary<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<&'a str>,
    location: &'a str,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct StoreDetails<'a> {
    name: &'a str,
    #[serde(flatten)]
    config: AdapterConfig,
}

/// Execute a stores subcommand
pub fn execute(cmd: StoresCommands, ctx: &AppContext) -> ExitCode {
    match cmd {
        StoresCommands::List(args) => execute_list(args, ctx),
        StoresCommands::Show(args) => execute_show(args, ctx),
    }
}

fn execute_list(args: ListArgs, ctx: &AppContext) -> ExitCode {
    let formatter = &ctx.formatter;

    if formatter.is_json() {
        let stores: Vec<StoreSummary> = ctx
            .registry
            .iter()
            .map(|(name, config)| StoreSummary {
                name,
                bucket: config.bucket_name.as_deref(),
                location: &config.location,
                endpoint: config.endpoint_url(),
            })
            .collect();
        formatter.json(&serde_json::json!({ "stores": stores }));
        return ExitCode::Success;
    }

    if ctx.registry.is_empty() {
        formatter.println(&format!(
            "No stores configured in {}",
            ctx.config_path.display()
        ));
        return ExitCode::Success;
    }

    if !args.long {
        for name in ctx.registry.names() {
            formatter.println(name);
        }
        return ExitCode::Success;
    }

    let mut table = formatter.table(["Store", "Bucket", "Location", "Endpoint", "ACL"]);
    for (name, config) in ctx.registry.iter() {
        table.add_row([
            name.to_string(),
            config.bucket_name.clone().unwrap_or_else(|| "-".to_string()),
            if config.location.is_empty() {
                "/".to_string()
            } else {
                config.location.clone()
            },
            config.endpoint_url(),
            config.default_acl.clone(),
        ]);
    }
    formatter.print_table(&table);

    ExitCode::Success
}

fn execute_show(args: ShowArgs, ctx: &AppContext) -> ExitCode {
    let formatter = &ctx.formatter;

    let config = match ctx.registry.get(&args.store) {
        Ok(config) => config.redacted(),
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&StoreDetails {
            name: &args.store,
            config,
        });
    } else {
        formatter.println(&render_details(&args.store, &config));
    }

    ExitCode::Success
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Human-readable settings of one store
fn render_details(name: &str, config: &AdapterConfig) -> String {
    let headers = if config.headers.is_empty() {
        "-".to_string()
    } else {
        config
            .headers
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let rows = [
        ("Store", name.to_string()),
        ("Bucket", or_dash(config.bucket_name.as_deref())),
        ("Location", or_dash(Some(config.location.as_str()).filter(|l| !l.is_empty()))),
        ("Endpoint", config.endpoint_url()),
        ("Calling format", config.calling_format.to_string()),
        ("Custom domain", or_dash(config.custom_domain.as_deref())),
        ("Default ACL", config.default_acl.clone()),
        ("Bucket ACL", config.bucket_acl.clone()),
        ("Querystring auth", config.querystring_auth.to_string()),
        ("Querystring expire", format!("{}s", config.querystring_expire)),
        ("File overwrite", config.file_overwrite.to_string()),
        ("Encryption", config.encryption.to_string()),
        ("Reduced redundancy", config.reduced_redundancy.to_string()),
        ("Access key", or_dash(config.access_key.as_deref())),
        ("Secret key", or_dash(config.secret_key.as_deref())),
        ("Headers", headers),
    ];

    rows.iter()
        .map(|(label, value)| format!("{label:<19} {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
