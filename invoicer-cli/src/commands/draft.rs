//! Draft command.

use std::path::PathBuf;

use anyhow::Result;
use invoicer_core::Attachments;
use invoicer_store::MailSettings;

use super::Context;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Creates the invoice mail draft with `paths` attached.
pub async fn run(ctx: &Context, cli: &Cli, paths: &[PathBuf]) -> Result<()> {
    let mail = MailSettings::from_env()?;
    let client = ctx.gmail().await?;
    client.lifecycle().ensure_valid_token().await?;
    let draft_id = client
        .create_draft(&mail, Attachments::from(paths.to_vec()))
        .await?;

    match cli.format {
        OutputFormat::Text => println!("Draft created: {draft_id}"),
        OutputFormat::Json => println!(
            "{}",
            JsonFormatter::new(cli.pretty).format(&serde_json::json!({ "draft_id": draft_id }))?
        ),
    }
    Ok(())
}
