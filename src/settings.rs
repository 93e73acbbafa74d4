use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr};
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Where uploaded project media is kept.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    Remote,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Postgres URL; without one the service keeps projects in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    /// Bearer token required by admin routes.
    #[serde(default)]
    pub admin_token: Option<String>,

    #[serde(default)]
    pub storage_backend: StorageBackend,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default)]
    pub storage_url: Option<String>,

    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,

    #[serde(default)]
    pub storage_api_key: Option<String>,

    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Projects".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_upload_dir() -> String {
    "uploads".to_string()
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:8080/uploads/".to_string()
}
fn default_storage_bucket() -> String {
    "projects".to_string()
}
fn default_max_upload_mb() -> usize {
    20
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .ignore_empty(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;
        config.database_url = non_blank(config.database_url);
        config.admin_token = non_blank(config.admin_token);
        config.storage_url = non_blank(config.storage_url);
        config.storage_api_key = non_blank(config.storage_api_key);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.is_production() {
            match &self.admin_token {
                Some(token) if token.len() >= 32 => {}
                _ => errors.push("ADMIN_TOKEN must be set to at least 32 characters in production"),
            }
            if self.cors_origins().iter().any(|o| o == "*") {
                errors.push("Wildcard CORS (*) is not allowed in production");
            }
        }
        if self.storage_backend == StorageBackend::Remote {
            if self.storage_url.is_none() {
                errors.push("STORAGE_URL is required for the remote storage backend");
            }
            if self.storage_api_key.is_none() {
                errors.push("STORAGE_API_KEY is required for the remote storage backend");
            }
        }
        if url::Url::parse(&self.public_base_url).is_err() {
            errors.push("PUBLIC_BASE_URL must be an absolute URL");
        }
        if self.max_upload_mb == 0 {
            errors.push("MAX_UPLOAD_MB must be greater than zero");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn admin_token(&self) -> Option<Zeroizing<String>> {
        self.admin_token.clone().map(Zeroizing::new)
    }

    pub fn storage_api_key(&self) -> Zeroizing<String> {
        Zeroizing::new(self.storage_api_key.clone().unwrap_or_default())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self {
            None => "[MISSING]",
            Some(v) if v.is_empty() => "[MISSING]",
            Some(_) => "[REDACTED]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("admin_token", &self.admin_token.redact())
            .field("storage_backend", &self.storage_backend)
            .field("upload_dir", &self.upload_dir)
            .field("public_base_url", &self.public_base_url)
            .field("storage_url", &self.storage_url)
            .field("storage_bucket", &self.storage_bucket)
            .field("storage_api_key", &self.storage_api_key.redact())
            .field("max_upload_mb", &self.max_upload_mb)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            database_url: None,
            cors_allowed_origins: default_cors_origins(),
            admin_token: None,
            storage_backend: StorageBackend::default(),
            upload_dir: default_upload_dir(),
            public_base_url: default_public_base_url(),
            storage_url: None,
            storage_bucket: default_storage_bucket(),
            storage_api_key: None,
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_requires_admin_token() {
        let config = AppConfig {
            env: AppEnvironment::Production,
            cors_allowed_origins: vec!["https://portfolio.example.com".into()],
            ..AppConfig::default()
        };

        assert!(config.validate().is_err());

        let config = AppConfig {
            admin_token: Some("a".repeat(32)),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn remote_storage_requires_url_and_key() {
        let config = AppConfig {
            storage_backend: StorageBackend::Remote,
            ..AppConfig::default()
        };

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("STORAGE_URL"));
        assert!(err.contains("STORAGE_API_KEY"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            admin_token: Some("very-secret-admin-token".into()),
            database_url: Some("postgres://user:pw@localhost/db".into()),
            ..AppConfig::default()
        };

        let output = format!("{:?}", config);
        assert!(!output.contains("very-secret-admin-token"));
        assert!(!output.contains("pw@localhost"));
    }

    #[test]
    fn cors_origins_split_on_commas() {
        let config = AppConfig {
            cors_allowed_origins: vec!["https://a.example, https://b.example".into()],
            ..AppConfig::default()
        };

        assert_eq!(config.cors_origins(), vec!["https://a.example", "https://b.example"]);
    }
}
