//! check command - Validate the configuration file
//!
//! The registry has already been built when this runs, so an invalid file
//! never gets here. What remains are stores that parse but cannot reach a
//! backend.

use serde::Serialize;
use sm_core::Registry;
use sm_core::path::is_valid_store_name;

use super::AppContext;
use crate::exit_code::ExitCode;

#[derive(Debug, Serialize)]
struct CheckOutput {
    config: String,
    valid: bool,
    stores: usize,
    warnings: Vec<String>,
}

/// Execute the check command
pub fn execute(ctx: &AppContext) -> ExitCode {
    let formatter = &ctx.formatter;
    let warnings = store_warnings(&ctx.registry);

    if formatter.is_json() {
        formatter.json(&CheckOutput {
            config: ctx.config_path.display().to_string(),
            valid: true,
            stores: ctx.registry.len(),
            warnings,
        });
        return ExitCode::Success;
    }

    for warning in &warnings {
        formatter.warning(warning);
    }
    formatter.success(&format!(
        "{}: {} store(s) configured",
        ctx.config_path.display(),
        ctx.registry.len()
    ));

    ExitCode::Success
}

fn store_warnings(registry: &Registry) -> Vec<String> {
    let mut warnings = Vec::new();
    for (name, config) in registry.iter() {
        if !is_valid_store_name(name) {
            warnings.push(format!(
                "Store '{name}' cannot be used in store/name paths; use letters, digits, '-' or '_'"
            ));
        }
        if config.bucket_name.is_none() {
            warnings.push(format!("Store '{name}' has no AWS_STORAGE_BUCKET_NAME"));
        }
        if config.access_key.is_some() != config.secret_key.is_some() {
            warnings.push(format!(
                "Store '{name}' sets only one half of its access key pair"
            ));
        }
    }
    warnings
}
