//! Token commands: `auth`, `refresh`.

use anyhow::Result;
use invoicer_core::{ProviderKind, TokenRecord};
use tracing::info;

use super::Context;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs a fresh authorization and overwrites the stored token.
pub async fn authenticate(ctx: &Context, cli: &Cli, provider: ProviderKind) -> Result<()> {
    info!(provider = %provider.cli_name(), "Forcing authorization");
    let record = match provider {
        ProviderKind::Misoca => ctx.misoca()?.lifecycle().authenticate().await?,
        ProviderKind::Gmail => ctx.gmail().await?.lifecycle().authenticate().await?,
    };
    report(cli, provider, &record)
}

/// Refreshes the stored token unconditionally.
pub async fn refresh(ctx: &Context, cli: &Cli, provider: ProviderKind) -> Result<()> {
    info!(provider = %provider.cli_name(), "Forcing refresh");
    let record = match provider {
        ProviderKind::Misoca => ctx.misoca()?.lifecycle().refresh().await?,
        ProviderKind::Gmail => ctx.gmail().await?.lifecycle().refresh().await?,
    };
    report(cli, provider, &record)
}

fn report(cli: &Cli, provider: ProviderKind, record: &TokenRecord) -> Result<()> {
    match cli.format {
        OutputFormat::Text => println!(
            "{}",
            TextFormatter::new(!cli.no_color).format_token(provider, record)
        ),
        OutputFormat::Json => println!(
            "{}",
            JsonFormatter::new(cli.pretty).format_token(provider, record)?
        ),
    }
    Ok(())
}
