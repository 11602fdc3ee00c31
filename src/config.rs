//! Environment-driven configuration.

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::StoreConfig;

const DEFAULT_PDF_BIN: &str = "wkhtmltopdf";
const DEFAULT_INVOICE_TEMPLATE: &str = "invoice.preview.html";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// When false the connection is plain text (local relays, mail catchers).
    pub tls: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    pub pdf_bin: String,
    pub views_dir: PathBuf,
    pub invoice_template: String,
    pub public_dir: PathBuf,
    pub smtp: SmtpConfig,
    pub sender_address: String,
    pub sender_name: String,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let views_dir = env::var("INVOICE_VIEWS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| resolve_path_from_executable(&["views"]));
        let public_dir = env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| resolve_path_from_executable(&["public"]));

        Ok(Self {
            host: env_or("APP_HOST", "0.0.0.0"),
            port: parse_env("APP_PORT", 8080, "port number")?,
            store: StoreConfig {
                url: env_or("RECORD_STORE_URL", "http://127.0.0.1:8090"),
                token: non_empty_env("RECORD_STORE_TOKEN"),
                auth_collection: env_or("RECORD_STORE_AUTH_COLLECTION", "users"),
            },
            pdf_bin: pdf_bin_from(non_empty_env("INVOICE_PDF_BIN")),
            views_dir,
            invoice_template: env_or("INVOICE_TEMPLATE", DEFAULT_INVOICE_TEMPLATE),
            public_dir,
            smtp: SmtpConfig {
                host: env_or("SMTP_HOST", "127.0.0.1"),
                port: parse_env("SMTP_PORT", 587, "port number")?,
                username: non_empty_env("SMTP_USERNAME"),
                password: non_empty_env("SMTP_PASSWORD"),
                tls: parse_env("SMTP_TLS", true, "boolean")?,
            },
            sender_address: env_or("MAIL_SENDER_ADDRESS", "no-reply@localhost"),
            sender_name: env_or("MAIL_SENDER_NAME", "Orders"),
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_else(|_| {
                    vec![
                        "http://localhost:5173".to_string(),
                        "http://127.0.0.1:8080".to_string(),
                    ]
                }),
        })
    }

    /// Full path of the invoice template inside the views directory.
    pub fn invoice_template_path(&self) -> PathBuf {
        self.views_dir.join(&self.invoice_template)
    }
}

/// Blank or missing `INVOICE_PDF_BIN` falls back to wkhtmltopdf.
pub fn pdf_bin_from(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_PDF_BIN.to_string())
}

/// Prefer a path next to the running binary, fall back to the working directory.
pub fn resolve_path_from_executable(parts: &[&str]) -> PathBuf {
    let join = |base: &Path| parts.iter().fold(base.to_path_buf(), |acc, p| acc.join(p));

    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            let candidate = join(dir);
            if candidate.exists() {
                return candidate;
            }
        }
    }
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    join(&cwd)
}

fn env_or(name: &str, default: &str) -> String {
    non_empty_env(name).unwrap_or_else(|| default.to_string())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match non_empty_env(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_bin_defaults_when_blank() {
        assert_eq!(pdf_bin_from(None), "wkhtmltopdf");
        assert_eq!(pdf_bin_from(Some("   ".to_string())), "wkhtmltopdf");
        assert_eq!(
            pdf_bin_from(Some(" /usr/local/bin/wkhtmltopdf ".to_string())),
            "/usr/local/bin/wkhtmltopdf"
        );
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list("http://a.test, ,http://b.test"),
            vec!["http://a.test", "http://b.test"]
        );
    }
}
