// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Invoicer CLI - monthly invoice publishing and mail drafting.
//!
//! # Examples
//!
//! ```bash
//! # Full monthly run: publish, download the PDF, create the mail draft
//! invoicer
//!
//! # Publish and download only
//! invoicer publish
//!
//! # Newest invoices first, as JSON
//! invoicer invoices --format json --pretty
//!
//! # Draft a mail with explicit attachments
//! invoicer draft storage/invoices/202502.pdf
//!
//! # Force a fresh authorization
//! invoicer auth misoca
//! ```

mod commands;
mod logging;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use invoicer_core::ProviderKind;
use tracing::error;

use commands::{Context, auth, draft, invoices, workflow};

// ============================================================================
// CLI Definition
// ============================================================================

/// Invoicer CLI - monthly invoice publishing and mail drafting.
#[derive(Parser)]
#[command(name = "invoicer")]
#[command(about = "Publish the monthly invoice and draft the mail that sends it")]
#[command(long_about = r#"
Invoicer publishes this month's invoice on Misoca, downloads its PDF and
creates a Gmail draft with the PDF attached.

Tokens are stored per provider under CREDENTIALS_DIR and refreshed when
expired. When no usable token exists, the authorization URL is printed and
the code is read from AUTH_CODE_TEMP_FILE_PATH.

Examples:
  invoicer                       # Full run (same as `invoicer run`)
  invoicer publish               # Publish and download the PDF
  invoicer contact-id            # Publish and print the latest contact id
  invoicer auth gmail            # Force a fresh Gmail authorization
"#)]
#[command(version)]
#[command(author = "Invoicer Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'run' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Do not write the yearly JSON log file.
    #[arg(long, global = true)]
    pub no_log_file: bool,
}

/// CLI commands.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Publish, download and draft (default if no command specified).
    Run,

    /// Publish the invoice and download its PDF.
    Publish,

    /// Publish the invoice and print the latest invoice's contact id.
    ContactId,

    /// List invoices, newest first.
    #[command(visible_alias = "ls")]
    Invoices,

    /// Download one invoice's PDF.
    Download {
        /// Invoice id.
        id: i64,
    },

    /// Create the invoice mail draft.
    Draft {
        /// Files to attach.
        paths: Vec<PathBuf>,
    },

    /// Force a fresh authorization and store the new token.
    Auth {
        /// Provider to authorize.
        provider: ProviderArg,
    },

    /// Force a token refresh.
    Refresh {
        /// Provider to refresh.
        provider: ProviderArg,
    },
}

/// Provider selector for token commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// Misoca (invoices).
    Misoca,
    /// Gmail (mail drafts).
    Gmail,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Misoca => ProviderKind::Misoca,
            ProviderArg::Gmail => ProviderKind::Gmail,
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// Command failed.
    Error = 1,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // An unknown command is reported but does not fail the process.
        Err(e) if e.kind() == ErrorKind::InvalidSubcommand => {
            let _ = e.print();
            std::process::exit(ExitCode::Success as i32);
        }
        Err(e) => e.exit(),
    };

    invoicer_store::load_dotenv();
    logging::init(cli.verbose, !cli.no_log_file);

    if let Err(e) = dispatch(&cli).await {
        error!(error = %format!("{e:#}"), "Command failed");
        std::process::exit(ExitCode::Error as i32);
    }
}

async fn dispatch(cli: &Cli) -> Result<()> {
    let ctx = Context::from_env()?;

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Run => workflow::run(&ctx, cli).await,
        Commands::Publish => workflow::publish(&ctx, cli).await,
        Commands::ContactId => workflow::contact_id(&ctx, cli).await,
        Commands::Invoices => invoices::list(&ctx, cli).await,
        Commands::Download { id } => invoices::download(&ctx, cli, *id).await,
        Commands::Draft { paths } => draft::run(&ctx, cli, paths).await,
        Commands::Auth { provider } => auth::authenticate(&ctx, cli, (*provider).into()).await,
        Commands::Refresh { provider } => auth::refresh(&ctx, cli, (*provider).into()).await,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["invoicer"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.no_log_file);
    }

    #[test]
    fn test_draft_paths() {
        let cli = Cli::try_parse_from(["invoicer", "draft", "a.pdf", "b.pdf"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Draft {
                paths: vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]
            })
        );

        let cli = Cli::try_parse_from(["invoicer", "draft"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Draft { paths: vec![] }));
    }

    #[test]
    fn test_provider_argument() {
        let cli = Cli::try_parse_from(["invoicer", "auth", "gmail", "-v"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Auth {
                provider: ProviderArg::Gmail
            })
        );
        assert!(cli.verbose);
        assert_eq!(ProviderKind::from(ProviderArg::Misoca), ProviderKind::Misoca);

        assert!(Cli::try_parse_from(["invoicer", "refresh", "slack"]).is_err());
    }

    #[test]
    fn test_unknown_subcommand_kind() {
        let err = Cli::try_parse_from(["invoicer", "send-everything"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }
}
