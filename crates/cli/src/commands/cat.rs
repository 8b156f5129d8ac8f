//! cat command - Display object contents
//!
//! Outputs the entire content of an object to stdout.

use std::io::{self, Write};

use anyhow::Context as _;
use clap::Args;
use sm_core::ObjectStore as _;

use super::{parse_object_path, AppContext};
use crate::exit_code::ExitCode;

/// Display object contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Object path (store/name)
    pub path: String,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, ctx: &AppContext) -> ExitCode {
    match cat(&args, ctx).await {
        Ok(()) => ExitCode::Success,
        Err(e) => ctx.fail(&e),
    }
}

async fn cat(args: &CatArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let path = parse_object_path(&args.path)?;
    let client = ctx.open_store(&path.store).await?;
    let data = client.get_object(&path.name).await?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&data)
        .and_then(|()| stdout.flush())
        .context("Failed to write to stdout")?;
    Ok(())
}
