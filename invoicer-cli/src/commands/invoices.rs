//! Invoice commands: `invoices`, `download`.

use anyhow::Result;

use super::Context;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Lists invoices, newest first.
pub async fn list(ctx: &Context, cli: &Cli) -> Result<()> {
    let client = ctx.misoca()?;
    client.lifecycle().ensure_valid_token().await?;
    let invoices = client.list_invoices().await?;

    match cli.format {
        OutputFormat::Text => print!("{}", TextFormatter::new(!cli.no_color).format_invoices(&invoices)),
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format(&invoices)?),
    }
    Ok(())
}

/// Downloads one invoice's PDF.
pub async fn download(ctx: &Context, cli: &Cli, id: i64) -> Result<()> {
    let client = ctx.misoca()?;
    client.lifecycle().ensure_valid_token().await?;
    let path = client.download_invoice_pdf(id).await?;

    match cli.format {
        OutputFormat::Text => println!("{}", TextFormatter::new(!cli.no_color).format_path(&path)),
        OutputFormat::Json => println!(
            "{}",
            JsonFormatter::new(cli.pretty).format(&serde_json::json!({ "pdf": path }))?
        ),
    }
    Ok(())
}
