use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub uploads: UploadsConfig,
    pub smtp: SmtpConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct UploadsConfig {
    /// Directory product images are written to and served from at `/uploads`.
    pub dir: PathBuf,
}

/// Outbound mail for the contact form. When disabled the server falls back
/// to a noop mailer that only logs.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Shop owner address; contact submissions are sent from and to it.
    pub owner_address: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub uploads_dir: Option<PathBuf>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://bloomery.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 3001 },
            uploads: UploadsConfig { dir: PathBuf::from("uploads") },
            smtp: SmtpConfig {
                enabled: false,
                host: "smtp.gmail.com".to_string(),
                port: 587,
                username: None,
                password: None,
                owner_address: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    uploads: Option<UploadsPatch>,
    smtp: Option<SmtpPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct UploadsPatch {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SmtpPatch {
    enabled: Option<bool>,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    owner_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("bloomery.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(uploads) = patch.uploads {
            if let Some(dir) = uploads.dir {
                self.uploads.dir = dir;
            }
        }

        if let Some(smtp) = patch.smtp {
            if let Some(enabled) = smtp.enabled {
                self.smtp.enabled = enabled;
            }
            if let Some(host) = smtp.host {
                self.smtp.host = host;
            }
            if let Some(port) = smtp.port {
                self.smtp.port = port;
            }
            if let Some(username) = smtp.username {
                self.smtp.username = Some(username);
            }
            if let Some(password) = smtp.password {
                self.smtp.password = Some(password.into());
            }
            if let Some(owner_address) = smtp.owner_address {
                self.smtp.owner_address = Some(owner_address);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BLOOMERY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("BLOOMERY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("BLOOMERY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("BLOOMERY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("BLOOMERY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BLOOMERY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BLOOMERY_SERVER_PORT") {
            self.server.port = parse_u16("BLOOMERY_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("BLOOMERY_UPLOADS_DIR") {
            self.uploads.dir = PathBuf::from(value);
        }

        if let Some(value) = read_env("BLOOMERY_SMTP_ENABLED") {
            self.smtp.enabled = parse_bool("BLOOMERY_SMTP_ENABLED", &value)?;
        }
        if let Some(value) = read_env("BLOOMERY_SMTP_HOST") {
            self.smtp.host = value;
        }
        if let Some(value) = read_env("BLOOMERY_SMTP_PORT") {
            self.smtp.port = parse_u16("BLOOMERY_SMTP_PORT", &value)?;
        }
        if let Some(value) = read_env("BLOOMERY_SMTP_USERNAME") {
            self.smtp.username = Some(value);
        }
        if let Some(value) = read_env("BLOOMERY_SMTP_PASSWORD") {
            self.smtp.password = Some(value.into());
        }
        if let Some(value) = read_env("BLOOMERY_SMTP_OWNER_ADDRESS") {
            self.smtp.owner_address = Some(value);
        }

        let log_level =
            read_env("BLOOMERY_LOGGING_LEVEL").or_else(|| read_env("BLOOMERY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BLOOMERY_LOGGING_FORMAT").or_else(|| read_env("BLOOMERY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(uploads_dir) = overrides.uploads_dir {
            self.uploads.dir = uploads_dir;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_uploads(&self.uploads)?;
        validate_smtp(&self.smtp)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("bloomery.toml"), PathBuf::from("config/bloomery.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    Ok(())
}

fn validate_uploads(uploads: &UploadsConfig) -> Result<(), ConfigError> {
    if uploads.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("uploads.dir must not be empty".to_string()));
    }
    Ok(())
}

fn validate_smtp(smtp: &SmtpConfig) -> Result<(), ConfigError> {
    if !smtp.enabled {
        return Ok(());
    }

    if smtp.host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "smtp.host is required when smtp.enabled is true".to_string(),
        ));
    }
    if smtp.port == 0 {
        return Err(ConfigError::Validation("smtp.port must be greater than zero".to_string()));
    }

    let owner_missing = smtp
        .owner_address
        .as_ref()
        .map(|address| address.trim().is_empty())
        .unwrap_or(true);
    if owner_missing {
        return Err(ConfigError::Validation(
            "smtp.owner_address is required when smtp.enabled is true".to_string(),
        ));
    }

    let password_missing = smtp
        .password
        .as_ref()
        .map(|password| password.expose_secret().trim().is_empty())
        .unwrap_or(true);
    if smtp.username.is_some() && password_missing {
        return Err(ConfigError::Validation(
            "smtp.password is required when smtp.username is set".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    fn options_with_file(contents: &str) -> (tempfile::NamedTempFile, LoadOptions) {
        let mut file = tempfile::NamedTempFile::new().expect("temp config file");
        file.write_all(contents.as_bytes()).expect("write config");
        let options = LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            ..LoadOptions::default()
        };
        (file, options)
    }

    #[test]
    fn defaults_pass_validation() {
        let config = AppConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(!config.smtp.enabled);
    }

    #[test]
    fn patch_file_overrides_defaults() {
        let (_file, options) = options_with_file(
            r#"
            [database]
            url = "sqlite://shop.db"
            max_connections = 2

            [server]
            port = 8088

            [uploads]
            dir = "var/images"

            [logging]
            level = "debug"
            format = "json"
            "#,
        );

        let config = AppConfig::load(options).expect("load config");
        assert_eq!(config.database.url, "sqlite://shop.db");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.uploads.dir, PathBuf::from("var/images"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/bloomery.toml")),
            require_file: true,
            ..LoadOptions::default()
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn programmatic_overrides_win_last() {
        let (_file, mut options) = options_with_file(
            r#"
            [database]
            url = "sqlite://from-file.db"
            "#,
        );
        options.overrides = ConfigOverrides {
            database_url: Some("sqlite::memory:".to_string()),
            log_level: Some("warn".to_string()),
            ..ConfigOverrides::default()
        };

        let config = AppConfig::load(options).expect("load config");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn non_sqlite_database_url_is_rejected() {
        let mut config = AppConfig::default();
        config.database.url = "postgres://localhost/shop".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn enabled_smtp_requires_host_and_owner() {
        let mut config = AppConfig::default();
        config.smtp.enabled = true;
        config.smtp.owner_address = None;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.smtp.owner_address = Some("owner@example.com".to_string());
        config.validate().expect("owner set, no credentials needed");

        config.smtp.username = Some("owner@example.com".to_string());
        // Username without password is a misconfiguration.
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.smtp.password = Some("app-password".to_string().into());
        config.validate().expect("full credentials validate");
    }

    #[test]
    fn unterminated_interpolation_is_reported() {
        let (_file, options) = options_with_file(
            r#"
            [database]
            url = "sqlite://${UNTERMINATED"
            "#,
        );
        let result = AppConfig::load(options);
        assert!(matches!(result, Err(ConfigError::UnterminatedInterpolation)));
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
