//! Workflow commands: `run`, `publish`, `contact-id`.

use anyhow::Result;
use invoicer_providers::{GmailDrafts, InvoiceWorkflow, MisocaInvoices};
use invoicer_store::{InvoiceSettings, MailSettings};
use serde_json::json;
use tracing::info;

use super::Context;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Full monthly run. Prints the draft id.
pub async fn run(ctx: &Context, cli: &Cli) -> Result<()> {
    let invoice = InvoiceSettings::from_env()?;
    let mail = MailSettings::from_env()?;

    let mut workflow = InvoiceWorkflow::new(MisocaInvoices::new(ctx.misoca()?, invoice))
        .with_drafts(GmailDrafts::new(ctx.gmail().await?, mail));
    let draft_id = workflow.run_default().await?;
    info!(draft_id = %draft_id, "Monthly run finished");

    match cli.format {
        OutputFormat::Text => println!("Draft created: {draft_id}"),
        OutputFormat::Json => println!(
            "{}",
            JsonFormatter::new(cli.pretty).format(&json!({ "draft_id": draft_id }))?
        ),
    }
    Ok(())
}

/// Publishes the invoice and prints the downloaded PDF path.
pub async fn publish(ctx: &Context, cli: &Cli) -> Result<()> {
    let invoice = InvoiceSettings::from_env()?;
    let mut workflow = InvoiceWorkflow::new(MisocaInvoices::new(ctx.misoca()?, invoice));
    let path = workflow.publish_invoice().await?;

    match cli.format {
        OutputFormat::Text => println!("{}", TextFormatter::new(!cli.no_color).format_path(&path)),
        OutputFormat::Json => println!(
            "{}",
            JsonFormatter::new(cli.pretty).format(&json!({ "pdf": path }))?
        ),
    }
    Ok(())
}

/// Publishes the invoice and prints the newest invoice's contact id.
pub async fn contact_id(ctx: &Context, cli: &Cli) -> Result<()> {
    let invoice = InvoiceSettings::from_env()?;
    let mut workflow = InvoiceWorkflow::new(MisocaInvoices::new(ctx.misoca()?, invoice));
    let contact_id = workflow.confirm_contact_id().await?;
    info!(contact_id = ?contact_id, "Latest invoice contact");

    match cli.format {
        OutputFormat::Text => match contact_id {
            Some(id) => println!("{id}"),
            None => println!("(no contact id)"),
        },
        OutputFormat::Json => println!(
            "{}",
            JsonFormatter::new(cli.pretty).format(&json!({ "contact_id": contact_id }))?
        ),
    }
    Ok(())
}
