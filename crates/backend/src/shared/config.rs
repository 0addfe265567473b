use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub storefront: StorefrontConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with the built storefront pages, served for unknown paths.
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            static_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/bassorilla.db".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub public_page_size: u64,
    pub admin_page_size: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            public_page_size: contracts::catalog::PUBLIC_PAGE_SIZE,
            admin_page_size: contracts::catalog::ADMIN_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// When absent a secret is generated once and kept in `sys_settings`.
    pub jwt_secret: Option<String>,
    pub default_admin_email: String,
    pub default_admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            default_admin_email: "admin@bassorilla.com".into(),
            default_admin_password: "admin12345".into(),
        }
    }
}

/// Cloudinary credentials. Uploads are disabled unless all three are set.
#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub root_folder: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            root_folder: "bassorilla".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorefrontConfig {
    pub base_url: String,
    pub whatsapp_number: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bassorilla.com".into(),
            whatsapp_number: "529531447499".into(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[database]
path = "data/bassorilla.db"

[catalog]
public_page_size = 15
admin_page_size = 12

[auth]
default_admin_email = "admin@bassorilla.com"
default_admin_password = "admin12345"

[media]
root_folder = "bassorilla"

[storefront]
base_url = "https://bassorilla.com"
whatsapp_number = "529531447499"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Makes `config` the process-wide configuration. Later calls are ignored.
pub fn install(config: Config) {
    if CONFIG.set(config).is_err() {
        tracing::warn!("Configuration already installed, ignoring reload");
    }
}

/// Process-wide configuration; built-in defaults until `install` runs.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    Ok(PathBuf::from(db_path_str))
}

impl MediaConfig {
    /// `(cloud_name, api_key, api_secret)` when every credential is present
    /// and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        fn pick(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        Some((
            pick(&self.cloud_name)?,
            pick(&self.api_key)?,
            pick(&self.api_secret)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.database.path, "data/bassorilla.db");
        assert_eq!(config.catalog.public_page_size, 15);
        assert_eq!(config.catalog.admin_page_size, 12);
        assert_eq!(config.storefront.whatsapp_number, "529531447499");
        assert!(config.media.credentials().is_none());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: Config = toml::from_str("[server]\nhost = \"127.0.0.1\"\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "data/bassorilla.db");
        let config: Config = toml::from_str("[database]\npath = \"x.db\"\n").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.media.root_folder, "bassorilla");
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn media_credentials_require_all_fields() {
        let mut media = MediaConfig {
            cloud_name: Some("demo".into()),
            api_key: Some("123".into()),
            api_secret: Some("  ".into()),
            ..MediaConfig::default()
        };
        assert!(media.credentials().is_none());
        media.api_secret = Some("s3cr3t".into());
        assert_eq!(media.credentials(), Some(("demo", "123", "s3cr3t")));
    }
}
