//! Logging setup.
//!
//! Human-readable lines go to stderr; the same events are appended as JSON
//! to `<LOG_DIR>/<YYYY>.log`.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Datelike, Local};
use invoicer_store::Settings;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info,chromiumoxide=warn";
const VERBOSE_FILTER: &str = "debug,hyper=info,hyper_util=info,reqwest=info,chromiumoxide=info";

/// Installs the global subscriber. Call once, before any command runs.
pub fn init(verbose: bool, log_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    });

    let file_layer = if log_file {
        let dir = Settings::log_dir_from_env();
        match open_log_file(&dir, Local::now().year()) {
            Ok(file) => Some(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!("Cannot open log file in {}: {e}", dir.display());
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();
}

/// Path of the log file for `year`.
pub fn log_file_path(dir: &Path, year: i32) -> PathBuf {
    dir.join(format!("{year}.log"))
}

fn open_log_file(dir: &Path, year: i32) -> std::io::Result<File> {
    std::fs::create_dir_all(dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(dir, year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_file_per_year() {
        assert_eq!(
            log_file_path(Path::new("/app/logs"), 2025),
            PathBuf::from("/app/logs/2025.log")
        );
    }

    #[test]
    fn test_open_appends_and_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");

        writeln!(open_log_file(&dir, 2025).unwrap(), "first").unwrap();
        writeln!(open_log_file(&dir, 2025).unwrap(), "second").unwrap();

        let text = std::fs::read_to_string(dir.join("2025.log")).unwrap();
        assert_eq!(text, "first\nsecond\n");
    }
}
