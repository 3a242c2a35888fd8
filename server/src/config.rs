//! Configuration management

use ams_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Root directory for uploaded CVs, demand letters, photos and gallery media
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Largest accepted request body, in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Website backup settings
    #[serde(default)]
    pub backup: BackupConfig,

    /// Mark the session cookie `Secure`; enable when served over HTTPS
    #[serde(default)]
    pub secure_cookies: bool,

    /// Account created at startup when no staff member has this user id
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory tree that gets archived
    #[serde(default = "default_backup_source")]
    pub source_dir: PathBuf,

    /// Where archives are written
    #[serde(default = "default_backup_dir")]
    pub output_dir: PathBuf,

    /// File or directory names skipped anywhere in the tree
    #[serde(default = "default_backup_exclude")]
    pub exclude: Vec<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            source_dir: default_backup_source(),
            output_dir: default_backup_dir(),
            exclude: default_backup_exclude(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub userid: String,
    pub password: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("userid", &self.userid)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn default_database_url() -> String {
    "sqlite:data/ams.db".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_mb() -> usize {
    16
}

fn default_backup_source() -> PathBuf {
    PathBuf::from(".")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_backup_exclude() -> Vec<String> {
    vec![".git".to_string(), "target".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            upload_dir: default_upload_dir(),
            max_upload_mb: default_max_upload_mb(),
            backup: BackupConfig::default(),
            secure_cookies: false,
            admin: None,
        }
    }
}

impl Config {
    /// Load configuration from file or environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            Self::load_from_file(p)
        } else {
            Self::load_from_env()
        }
    }

    /// Load from configuration file
    fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    fn load_from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(dir) = std::env::var("AMS_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("AMS_BACKUP_DIR") {
            config.backup.output_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("AMS_BACKUP_SOURCE") {
            config.backup.source_dir = PathBuf::from(dir);
        }
        if let Ok(secure) = std::env::var("AMS_SECURE_COOKIES") {
            config.secure_cookies = matches!(secure.as_str(), "1" | "true" | "yes");
        }
        if let Ok(mb) = std::env::var("AMS_MAX_UPLOAD_MB") {
            config.max_upload_mb = mb
                .parse()
                .map_err(|_| Error::ConfigError(format!("Invalid AMS_MAX_UPLOAD_MB: {}", mb)))?;
        }

        // Support file-based admin password (Docker/K8s secrets)
        if let (Ok(userid), Some(password)) =
            (std::env::var("AMS_ADMIN_USER"), get_secret("AMS_ADMIN_PASSWORD"))
        {
            config.admin = Some(AdminConfig { userid, password });
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_upload_mb == 0 {
            return Err(Error::ConfigError("max_upload_mb must be positive".to_string()));
        }
        if let Some(ref admin) = self.admin {
            if admin.userid.trim().is_empty() || admin.password.is_empty() {
                return Err(Error::ConfigError(
                    "admin.userid and admin.password must both be set".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Get secret from environment variable or file
///
/// Supports both direct environment variables and file-based secrets (Docker/Kubernetes pattern).
/// If `VAR_NAME` is not found, tries `VAR_NAME_FILE` which should point to a file containing the secret.
pub fn get_secret(var_name: &str) -> Option<String> {
    // Try environment variable first
    if let Ok(value) = std::env::var(var_name) {
        return Some(value);
    }

    // Try file-based secret (Docker secrets / Kubernetes)
    let file_var = format!("{}_FILE", var_name);
    if let Ok(path) = std::env::var(&file_var) {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            return Some(contents.trim().to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let config = Config::parse(
            r#"
            database_url = "sqlite:/var/lib/ams/ams.db"
            upload_dir = "/var/lib/ams/uploads"
            max_upload_mb = 32

            [backup]
            source_dir = "/srv/www"
            output_dir = "/srv/backups"
            exclude = ["node_modules"]

            [admin]
            userid = "admin"
            password = "changeme"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_upload_bytes(), 32 * 1024 * 1024);
        assert_eq!(config.backup.exclude, vec!["node_modules".to_string()]);
        assert_eq!(config.admin.as_ref().unwrap().userid, "admin");
    }

    #[test]
    fn test_parse_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.database_url, "sqlite:data/ams.db");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.backup.output_dir, PathBuf::from("backups"));
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(matches!(
            Config::parse("max_upload_mb = 0"),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            Config::parse("[admin]\nuserid = \"\"\npassword = \"x\""),
            Err(Error::ConfigError(_))
        ));
        assert!(Config::parse("upload_dir = [").is_err());
    }

    #[test]
    fn test_admin_password_is_redacted() {
        let admin = AdminConfig {
            userid: "admin".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", admin).contains("hunter2"));
    }
}
