//! Configuration management.
//!
//! All settings come from named environment variables, optionally seeded
//! from a `.env` file. Every loader also has a `from_lookup` form taking an
//! arbitrary key lookup so tests never touch the process environment.
//!
//! OAuth settings ([`Settings`]) are loaded for every command; business
//! settings ([`InvoiceSettings`], [`MailSettings`]) only by the commands
//! that publish invoices or draft mail.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::error::StoreError;

// ============================================================================
// Defaults
// ============================================================================

const DEFAULT_CREDENTIALS_DIR: &str = "/app/storage/credentials";
const DEFAULT_INVOICE_DIR: &str = "/app/storage/invoices";
const DEFAULT_LOG_DIR: &str = "/app/logs";
const DEFAULT_PDF_FILENAME: &str = "%Y%m";
const DEFAULT_GMAIL_SCOPES: &str = "https://www.googleapis.com/auth/gmail.compose";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_BROWSER_WAIT_SECS: u64 = 10;

/// Loads `.env` into the process environment, if present.
///
/// Variables already set in the environment win over the file.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env loaded"),
    }
}

// ============================================================================
// Variable Lookup
// ============================================================================

struct Vars<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> Vars<'a> {
    fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    /// Trimmed value; empty counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, StoreError> {
        self.optional(key)
            .ok_or_else(|| StoreError::MissingVar(key.to_string()))
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| StoreError::Config(format!("{key}={raw}: {e}")))
            })
            .transpose()
    }

    fn required_parsed<T>(&self, key: &str) -> Result<T, StoreError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.parsed(key)?
            .ok_or_else(|| StoreError::MissingVar(key.to_string()))
    }

    /// Like [`Vars::parsed`], but zero is rejected.
    fn positive(&self, key: &str) -> Result<Option<u64>, StoreError> {
        match self.parsed::<u64>(key)? {
            Some(0) => Err(StoreError::Config(format!("{key} must be greater than zero"))),
            value => Ok(value),
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.optional(key)
            .map(|raw| split_list(&raw))
            .unwrap_or_default()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

// ============================================================================
// Login Mode
// ============================================================================

/// How the invoicing provider's authorization code is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    /// Operator deposits the code into the signal file.
    #[default]
    Handshake,
    /// Headless browser fills in the login form.
    Browser,
}

impl FromStr for LoginMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "handshake" | "manual" => Ok(Self::Handshake),
            "browser" => Ok(Self::Browser),
            other => Err(format!("unknown login mode '{other}' (expected handshake or browser)")),
        }
    }
}

// ============================================================================
// OAuth Settings
// ============================================================================

/// Signal-file handshake settings.
#[derive(Debug, Clone)]
pub struct HandshakeSettings {
    /// File the operator writes the authorization code into.
    pub signal_path: PathBuf,
    /// How often the file is checked.
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Invoicing provider (Misoca) settings.
#[derive(Clone)]
pub struct MisocaSettings {
    /// API root, without trailing slash.
    pub base_url: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Registered redirect URI.
    pub redirect_uri: String,
    /// How the authorization code is obtained.
    pub login_mode: LoginMode,
    /// Login identifier for browser mode.
    pub email: Option<String>,
    /// Password for browser mode.
    pub password: Option<String>,
    /// Upper bound for each browser wait.
    pub browser_wait_timeout: Duration,
}

impl fmt::Debug for MisocaSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MisocaSettings")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .field("login_mode", &self.login_mode)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("browser_wait_timeout", &self.browser_wait_timeout)
            .finish()
    }
}

/// Mail provider (Gmail) settings.
#[derive(Debug, Clone)]
pub struct GmailSettings {
    /// Requested OAuth scopes.
    pub scopes: Vec<String>,
    /// Redirect URI override; otherwise taken from the client secrets file.
    pub redirect_uri: Option<String>,
    /// Installed-app client secrets downloaded from the Google console.
    pub client_secrets_path: PathBuf,
}

/// Settings every command needs.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the per-provider credential records.
    pub credentials_dir: PathBuf,
    /// Manual handshake settings.
    pub handshake: HandshakeSettings,
    /// Invoicing provider settings.
    pub misoca: MisocaSettings,
    /// Mail provider settings.
    pub gmail: GmailSettings,
    /// Where downloaded invoice PDFs go.
    pub invoice_dir: PathBuf,
    /// `strftime` pattern (applied to last month) for PDF file names.
    pub pdf_filename: String,
    /// Directory for the yearly log file.
    pub log_dir: PathBuf,
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(env_lookup)
    }

    /// Loads settings through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars::new(&lookup);

        let credentials_dir = PathBuf::from(
            vars.optional("CREDENTIALS_DIR")
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_DIR.to_string()),
        );

        let handshake = HandshakeSettings {
            signal_path: PathBuf::from(vars.required("AUTH_CODE_TEMP_FILE_PATH")?),
            poll_interval: Duration::from_millis(
                vars.positive("AUTH_CODE_POLL_INTERVAL_MS")?
                    .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            timeout: vars
                .parsed::<u64>("AUTH_CODE_TIMEOUT_SECS")?
                .map(Duration::from_secs),
        };

        let login_mode = vars.parsed("MISOCA_LOGIN_MODE")?.unwrap_or_default();
        let (email, password) = match login_mode {
            LoginMode::Browser => (
                Some(vars.required("MISOCA_EMAIL")?),
                Some(vars.required("MISOCA_PASSWORD")?),
            ),
            LoginMode::Handshake => (vars.optional("MISOCA_EMAIL"), vars.optional("MISOCA_PASSWORD")),
        };

        let misoca = MisocaSettings {
            base_url: vars
                .required("MISOCA_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            client_id: vars.required("MISOCA_CLIENT_ID")?,
            client_secret: vars.required("MISOCA_CLIENT_SECRET")?,
            redirect_uri: vars.required("MISOCA_REDIRECT_URI")?,
            login_mode,
            email,
            password,
            browser_wait_timeout: Duration::from_secs(
                vars.parsed("BROWSER_WAIT_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_BROWSER_WAIT_SECS),
            ),
        };

        let mut scopes = vars.list("GMAIL_API_SCOPES");
        if scopes.is_empty() {
            scopes = split_list(DEFAULT_GMAIL_SCOPES);
        }
        let gmail = GmailSettings {
            scopes,
            redirect_uri: vars.optional("GMAIL_REDIRECT_URI"),
            client_secrets_path: credentials_dir.join("client_secrets.json"),
        };

        let settings = Self {
            handshake,
            misoca,
            gmail,
            invoice_dir: PathBuf::from(
                vars.optional("INVOICE_DIR")
                    .unwrap_or_else(|| DEFAULT_INVOICE_DIR.to_string()),
            ),
            pdf_filename: vars
                .optional("INVOICE_PDF_FILENAME")
                .unwrap_or_else(|| DEFAULT_PDF_FILENAME.to_string()),
            log_dir: PathBuf::from(
                vars.optional("LOG_DIR")
                    .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
            ),
            credentials_dir,
        };

        debug!(
            credentials_dir = %settings.credentials_dir.display(),
            login_mode = ?settings.misoca.login_mode,
            "Loaded settings"
        );
        Ok(settings)
    }

    /// Log directory without requiring the rest of the settings.
    ///
    /// Logging is set up before settings are validated, so a configuration
    /// error can still reach the log file.
    pub fn log_dir_from_env() -> PathBuf {
        PathBuf::from(
            env_lookup("LOG_DIR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
        )
    }
}

// ============================================================================
// Business Settings
// ============================================================================

/// Fields of the monthly invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSettings {
    /// Subject, a `strftime` pattern applied to last month.
    pub subject: String,
    /// Recipient name.
    pub recipient_name: String,
    /// Recipient honorific.
    pub recipient_title: String,
    /// Recipient contact id on the invoicing service.
    pub contact_id: i64,
    /// Sender name.
    pub sender_name: String,
    /// Sender phone number.
    pub sender_tel: String,
    /// Sender mail address.
    pub sender_email: String,
    /// Free-form notes.
    pub notes: String,
    /// Bank account details.
    pub bank_account: String,
    /// Line item name.
    pub item_name: String,
    /// Hourly rate.
    pub hourly_wage: f64,
    /// Hours worked in the billed month.
    pub total_working_hours: f64,
}

impl InvoiceSettings {
    /// Loads invoice fields from the process environment.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(env_lookup)
    }

    /// Loads invoice fields through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars::new(&lookup);

        Ok(Self {
            subject: vars.required("INVOICE_SUBJECT")?,
            recipient_name: vars.required("INVOICE_RECIPIENT_NAME")?,
            recipient_title: vars.required("INVOICE_RECIPIENT_TITLE")?,
            contact_id: vars.required_parsed("INVOICE_CONTACT_ID")?,
            sender_name: vars.required("INVOICE_SENDER_NAME")?,
            sender_tel: vars.required("INVOICE_SENDER_TEL")?,
            sender_email: vars.required("INVOICE_SENDER_EMAIL")?,
            notes: vars.optional("INVOICE_NOTES").unwrap_or_default(),
            bank_account: vars.required("INVOICE_BANK_ACCOUNT")?,
            item_name: vars.required("INVOICE_ITEM_NAME")?,
            hourly_wage: vars.required_parsed("INVOICE_HOURLY_WAGE")?,
            total_working_hours: vars.required_parsed("INVOICE_TOTAL_WORKING_HOURS")?,
        })
    }
}

/// Invoice mail draft settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    /// Plain-text body template.
    pub template_path: PathBuf,
    /// `To` recipients.
    pub to: Vec<String>,
    /// `Cc` recipients.
    pub cc: Vec<String>,
    /// `From` address.
    pub from: String,
    /// Subject line.
    pub subject: String,
}

impl MailSettings {
    /// Loads mail settings from the process environment.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(env_lookup)
    }

    /// Loads mail settings through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars::new(&lookup);

        Ok(Self {
            template_path: PathBuf::from(vars.required("INVOICE_MAIL_TEMPLATE_PATH")?),
            to: split_list(&vars.required("INVOICE_MAIL_TO_ADDRESSES")?),
            cc: vars.list("INVOICE_MAIL_CC_ADDRESSES"),
            from: vars.required("INVOICE_MAIL_FROM_ADDRESS")?,
            subject: vars.required("INVOICE_MAIL_SUBJECT")?,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const OAUTH: &[(&str, &str)] = &[
        ("AUTH_CODE_TEMP_FILE_PATH", "/tmp/auth_code"),
        ("MISOCA_BASE_URL", "https://app.misoca.jp/"),
        ("MISOCA_CLIENT_ID", "cid"),
        ("MISOCA_CLIENT_SECRET", "secret"),
        ("MISOCA_REDIRECT_URI", "urn:ietf:wg:oauth:2.0:oob"),
    ];

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_lookup(lookup(OAUTH)).unwrap();

        assert_eq!(settings.credentials_dir, PathBuf::from(DEFAULT_CREDENTIALS_DIR));
        assert_eq!(settings.misoca.base_url, "https://app.misoca.jp");
        assert_eq!(settings.misoca.login_mode, LoginMode::Handshake);
        assert_eq!(settings.handshake.poll_interval, Duration::from_secs(1));
        assert_eq!(settings.handshake.timeout, None);
        assert_eq!(settings.misoca.browser_wait_timeout, Duration::from_secs(10));
        assert_eq!(settings.gmail.scopes, vec![DEFAULT_GMAIL_SCOPES.to_string()]);
        assert_eq!(
            settings.gmail.client_secrets_path,
            PathBuf::from("/app/storage/credentials/client_secrets.json")
        );
        assert_eq!(settings.pdf_filename, "%Y%m");
    }

    #[test]
    fn test_settings_missing_required() {
        let pairs: Vec<_> = OAUTH
            .iter()
            .copied()
            .filter(|(k, _)| *k != "MISOCA_CLIENT_SECRET")
            .collect();
        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, StoreError::MissingVar(ref v) if v == "MISOCA_CLIENT_SECRET"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut pairs = OAUTH.to_vec();
        pairs.retain(|(k, _)| *k != "AUTH_CODE_TEMP_FILE_PATH");
        pairs.push(("AUTH_CODE_TEMP_FILE_PATH", "   "));
        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, StoreError::MissingVar(_)));
    }

    #[test]
    fn test_browser_mode_requires_identity() {
        let mut pairs = OAUTH.to_vec();
        pairs.push(("MISOCA_LOGIN_MODE", "browser"));
        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, StoreError::MissingVar(ref v) if v == "MISOCA_EMAIL"));

        pairs.push(("MISOCA_EMAIL", "me@example.com"));
        pairs.push(("MISOCA_PASSWORD", "pw"));
        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(settings.misoca.login_mode, LoginMode::Browser);
        assert_eq!(settings.misoca.email.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_invalid_login_mode() {
        let mut pairs = OAUTH.to_vec();
        pairs.push(("MISOCA_LOGIN_MODE", "telepathy"));
        assert!(matches!(
            Settings::from_lookup(lookup(&pairs)),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_handshake_overrides() {
        let mut pairs = OAUTH.to_vec();
        pairs.push(("AUTH_CODE_POLL_INTERVAL_MS", "250"));
        pairs.push(("AUTH_CODE_TIMEOUT_SECS", "600"));
        pairs.push(("GMAIL_API_SCOPES", "a, b ,"));
        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(settings.handshake.poll_interval, Duration::from_millis(250));
        assert_eq!(settings.handshake.timeout, Some(Duration::from_secs(600)));
        assert_eq!(settings.gmail.scopes, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut pairs = OAUTH.to_vec();
        pairs.push(("AUTH_CODE_POLL_INTERVAL_MS", "0"));
        pairs.push(("AUTH_CODE_TIMEOUT_SECS", "1"));
        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();

        assert!(matches!(err, StoreError::Config(ref m) if m.contains("AUTH_CODE_POLL_INTERVAL_MS")));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_misoca_debug_redacts_secrets() {
        let settings = Settings::from_lookup(lookup(OAUTH)).unwrap();
        let debug = format!("{:?}", settings.misoca);
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_invoice_settings() {
        let settings = InvoiceSettings::from_lookup(lookup(&[
            ("INVOICE_SUBJECT", "%Y年%m月分"),
            ("INVOICE_RECIPIENT_NAME", "Example Inc."),
            ("INVOICE_RECIPIENT_TITLE", "御中"),
            ("INVOICE_CONTACT_ID", "123"),
            ("INVOICE_SENDER_NAME", "Taro"),
            ("INVOICE_SENDER_TEL", "000-0000"),
            ("INVOICE_SENDER_EMAIL", "taro@example.com"),
            ("INVOICE_BANK_ACCOUNT", "Bank 1234567"),
            ("INVOICE_ITEM_NAME", "Development"),
            ("INVOICE_HOURLY_WAGE", "5000"),
            ("INVOICE_TOTAL_WORKING_HOURS", "140.5"),
        ]))
        .unwrap();

        assert_eq!(settings.contact_id, 123);
        assert!((settings.total_working_hours - 140.5).abs() < f64::EPSILON);
        assert_eq!(settings.notes, "");
    }

    #[test]
    fn test_invoice_settings_bad_number() {
        let err = InvoiceSettings::from_lookup(lookup(&[
            ("INVOICE_SUBJECT", "s"),
            ("INVOICE_RECIPIENT_NAME", "n"),
            ("INVOICE_RECIPIENT_TITLE", "t"),
            ("INVOICE_CONTACT_ID", "not-a-number"),
        ]))
        .unwrap_err();
        assert!(matches!(err, StoreError::Config(ref m) if m.starts_with("INVOICE_CONTACT_ID")));
    }

    #[test]
    fn test_mail_settings_lists() {
        let settings = MailSettings::from_lookup(lookup(&[
            ("INVOICE_MAIL_TEMPLATE_PATH", "/app/template.txt"),
            ("INVOICE_MAIL_TO_ADDRESSES", "a@example.com, b@example.com"),
            ("INVOICE_MAIL_CC_ADDRESSES", ""),
            ("INVOICE_MAIL_FROM_ADDRESS", "me@example.com"),
            ("INVOICE_MAIL_SUBJECT", "Invoice"),
        ]))
        .unwrap();

        assert_eq!(settings.to, vec!["a@example.com", "b@example.com"]);
        assert!(settings.cc.is_empty());
    }
}
