use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `SCHEMADIFF__TARGET__PASSWORD`.
pub const ENV_PREFIX: &str = "SCHEMADIFF";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub source: DbConfig,
    pub target: DbConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Database driver: "mysql" (default), "mariadb", "postgres" or "sqlite".
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default = "default_host")]
    pub host: String,
    /// Defaults to the driver's standard port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Database to select. For SQLite, the path of the database file.
    #[serde(alias = "dbname")]
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// PostgreSQL schema to capture. Defaults to "public"; ignored by other drivers.
    #[serde(default)]
    pub schema: Option<String>,
    /// Display name used in diff messages. Defaults to `name`.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_driver() -> String {
    "mysql".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

fn default_output_dir() -> String {
    "./schemadiff-reports".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl DbConfig {
    /// Build a sqlx-compatible connection URL from this config.
    ///
    /// User and password are percent-encoded, so any character in a credential
    /// (`/`, `#`, `?`, `@`, `%`, …) reaches the driver unchanged.
    pub fn url(&self) -> String {
        let scheme = match self.driver.as_str() {
            "sqlite" => return format!("sqlite://{}", self.name),
            "mysql" | "mariadb" => "mysql",
            _ => "postgres",
        };
        format!(
            "{}://{}:{}@{}:{}/{}",
            scheme,
            encode(&self.user),
            encode(&self.password),
            self.host,
            self.port(),
            self.name
        )
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(match self.driver.as_str() {
            "postgres" => 5432,
            _ => 3306,
        })
    }

    /// `driver://host/name`, without credentials. Safe to log.
    pub fn display_target(&self) -> String {
        match self.driver.as_str() {
            "sqlite" => format!("sqlite://{}", self.name),
            driver => format!("{}://{}/{}", driver, self.host, self.name),
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Namespace whose tables are captured: the PostgreSQL schema, or the
    /// database itself for MySQL/MariaDB.
    pub fn namespace(&self) -> &str {
        match self.driver.as_str() {
            "postgres" => self.schema.as_deref().unwrap_or("public"),
            _ => &self.name,
        }
    }
}

/// Everything except RFC 3986 unreserved characters.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(part: &str) -> String {
    utf8_percent_encode(part, USERINFO).to_string()
}

impl AppConfig {
    /// Load a TOML config file, then apply `SCHEMADIFF__…` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .with_context(|| format!("Config path is not valid UTF-8: {}", path.display()))?;

        let cfg = Config::builder()
            .add_source(File::new(path_str, FileFormat::Toml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        cfg.try_deserialize()
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// `./schemadiff.toml` if present, else `<config dir>/schemadiff/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from("schemadiff.toml");
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|d| d.join("schemadiff").join("config.toml"))
            .filter(|p| p.exists())
    }
}
