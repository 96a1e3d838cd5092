//! Configuration module
//!
//! Server, storage layout, anti-forgery and upload limit settings, read from the
//! environment (with `.env` support).

use std::env;
use std::path::PathBuf;

use crate::policy::FilePolicy;

// Common constants
const SERVER_PORT: u16 = 4000;
const CSRF_TOKEN_TTL_SECS: u64 = 3600;
const MAX_TEXT_FIELD_BYTES: usize = 4 * 1024 * 1024;
const MAX_HEADER_BYTES: usize = 16 * 1024;
const MIN_SECRET_LENGTH: usize = 32;
const DEV_CSRF_SECRET: &str = "default-csrf-secret-change-in-production";

/// Limits applied while reading a multipart body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadLimits {
    /// Largest accepted value of a single text field
    pub max_text_field_bytes: usize,
    /// Largest accepted header block of a single section
    pub max_header_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_text_field_bytes: MAX_TEXT_FIELD_BYTES,
            max_header_bytes: MAX_HEADER_BYTES,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    /// Root of the per-upload scratch directories
    pub scratch_root: PathBuf,
    /// Root of promoted, caller-visible files
    pub final_root: PathBuf,
    pub csrf_secret: String,
    pub csrf_token_ttl_secs: u64,
    pub primary_file_field: String,
    pub image_file_field: String,
    pub limits: UploadLimits,
    /// "compact" or "json"
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let csrf_secret = env::var("CSRF_SECRET")
            .or_else(|_| env::var("JWT_SECRET"))
            .unwrap_or_else(|_| DEV_CSRF_SECRET.to_string());

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            scratch_root: env::var("UPLOAD_SCRATCH_ROOT")
                .unwrap_or_else(|_| "./TempFiles".to_string())
                .into(),
            final_root: env::var("UPLOAD_FINAL_ROOT")
                .unwrap_or_else(|_| "./wwwroot".to_string())
                .into(),
            csrf_secret,
            csrf_token_ttl_secs: env::var("CSRF_TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(CSRF_TOKEN_TTL_SECS),
            primary_file_field: env::var("UPLOAD_PRIMARY_FIELD")
                .unwrap_or_else(|_| "File".to_string()),
            image_file_field: env::var("UPLOAD_IMAGE_FIELD")
                .unwrap_or_else(|_| "FileImage".to_string()),
            limits: UploadLimits {
                max_text_field_bytes: env::var("UPLOAD_MAX_TEXT_FIELD_BYTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(MAX_TEXT_FIELD_BYTES),
                max_header_bytes: env::var("UPLOAD_MAX_HEADER_BYTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(MAX_HEADER_BYTES),
            },
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.primary_file_field.trim().is_empty() || self.image_file_field.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "UPLOAD_PRIMARY_FIELD and UPLOAD_IMAGE_FIELD must not be empty"
            ));
        }

        if self.primary_file_field == self.image_file_field {
            return Err(anyhow::anyhow!(
                "UPLOAD_PRIMARY_FIELD and UPLOAD_IMAGE_FIELD must differ"
            ));
        }

        if self.scratch_root == self.final_root {
            return Err(anyhow::anyhow!(
                "UPLOAD_SCRATCH_ROOT and UPLOAD_FINAL_ROOT must be different directories"
            ));
        }

        if self.limits.max_header_bytes == 0 || self.limits.max_text_field_bytes == 0 {
            return Err(anyhow::anyhow!("Upload limits must be greater than zero"));
        }

        if self.is_production()
            && (self.csrf_secret == DEV_CSRF_SECRET || self.csrf_secret.len() < MIN_SECRET_LENGTH)
        {
            return Err(anyhow::anyhow!(
                "CSRF_SECRET must be set and at least {} characters long in production",
                MIN_SECRET_LENGTH
            ));
        }

        Ok(())
    }

    pub fn file_policy(&self) -> FilePolicy {
        FilePolicy::new(&self.primary_file_field, &self.image_file_field)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.csrf_secret == DEV_CSRF_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            scratch_root: "/tmp/upform/scratch".into(),
            final_root: "/tmp/upform/final".into(),
            csrf_secret: DEV_CSRF_SECRET.to_string(),
            csrf_token_ttl_secs: CSRF_TOKEN_TTL_SECS,
            primary_file_field: "File".to_string(),
            image_file_field: "FileImage".to_string(),
            limits: UploadLimits::default(),
            log_format: "compact".to_string(),
        }
    }

    #[test]
    fn development_accepts_default_secret() {
        assert!(config().validate().is_ok());
        assert!(config().uses_dev_secret());
    }

    #[test]
    fn production_requires_real_secret() {
        let mut cfg = config();
        cfg.environment = "Production".to_string();
        assert!(cfg.validate().is_err());

        cfg.csrf_secret = "x".repeat(MIN_SECRET_LENGTH);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_shared_roots_and_keys() {
        let mut cfg = config();
        cfg.final_root = cfg.scratch_root.clone();
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.image_file_field = "File".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn policy_follows_configured_fields() {
        let mut cfg = config();
        cfg.primary_file_field = "Upload".to_string();
        let policy = cfg.file_policy();
        assert!(policy.sink_for("Upload").is_some());
        assert!(policy.sink_for("File").is_none());
    }
}
