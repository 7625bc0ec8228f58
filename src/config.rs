use color_eyre::eyre::eyre;
use color_eyre::Result;
use datadash_cli::{Args, CompressionFormat, ServeArgs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub server: ServerConfig,
    pub data: DataConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataConfig {
    pub layoffs_path: Option<PathBuf>,
    pub power_plants_path: Option<PathBuf>,
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_lines: Option<usize>,
    pub skip_rows: Option<usize>,
    pub compression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of bars kept by ranking charts
    pub top_n: usize,
    pub layoffs_default_country: Option<String>,
    pub power_plants_default_country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence
    pub level: String,
    pub ansi: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            server: ServerConfig::default(),
            data: DataConfig::default(),
            dashboard: DashboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            layoffs_default_country: None,
            power_plants_default_country: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let mut config = AppConfig::default();

        let config_manager = ConfigManager::new(app_name)?;
        let config_path = config_manager.config_path("config.toml");
        if config_path.exists() {
            config.merge(Self::load_file(&config_path)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file (default → file). The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(Self::load_file(path)?);
        config.validate()?;
        Ok(config)
    }

    fn load_file(config_path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.server.merge(other.server);
        self.data.merge(other.data);
        self.dashboard.merge(other.dashboard);
        self.logging.merge(other.logging);
    }

    /// Apply command-line overrides (CLI takes precedence over every file layer)
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(path) = &args.layoffs {
            self.data.layoffs_path = Some(path.clone());
        }
        if let Some(path) = &args.power_plants {
            self.data.power_plants_path = Some(path.clone());
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Apply `serve` overrides for host and port
    pub fn apply_serve_args(&mut self, serve: &ServeArgs) {
        if let Some(host) = &serve.host {
            self.server.host = host.clone();
        }
        if let Some(port) = serve.port {
            self.server.port = port;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.server.port == 0 {
            return Err(eyre!("server.port must be greater than 0"));
        }

        if self.dashboard.top_n == 0 {
            return Err(eyre!("dashboard.top_n must be greater than 0"));
        }

        if let Some(name) = &self.data.compression {
            if CompressionFormat::from_name(name).is_none() {
                return Err(eyre!(
                    "Invalid compression: {}. Must be 'gzip', 'zstd', 'bzip2', or 'xz'",
                    name
                ));
            }
        }

        EnvFilter::try_new(&self.logging.level)
            .map_err(|e| eyre!("Invalid logging.level '{}': {}", self.logging.level, e))?;

        Ok(())
    }
}

// Merge implementations for each config section
impl ServerConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ServerConfig::default();
        if other.host != default.host {
            self.host = other.host;
        }
        if other.port != default.port {
            self.port = other.port;
        }
    }
}

impl DataConfig {
    pub fn merge(&mut self, other: Self) {
        if other.layoffs_path.is_some() {
            self.layoffs_path = other.layoffs_path;
        }
        if other.power_plants_path.is_some() {
            self.power_plants_path = other.power_plants_path;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.has_header.is_some() {
            self.has_header = other.has_header;
        }
        if other.skip_lines.is_some() {
            self.skip_lines = other.skip_lines;
        }
        if other.skip_rows.is_some() {
            self.skip_rows = other.skip_rows;
        }
        if other.compression.is_some() {
            self.compression = other.compression;
        }
    }
}

impl DashboardConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DashboardConfig::default();
        if other.top_n != default.top_n {
            self.top_n = other.top_n;
        }
        if other.layoffs_default_country.is_some() {
            self.layoffs_default_country = other.layoffs_default_country;
        }
        if other.power_plants_default_country.is_some() {
            self.power_plants_default_country = other.power_plants_default_country;
        }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        let default = LoggingConfig::default();
        if other.level != default.level {
            self.level = other.level;
        }
        if other.ansi != default.ansi {
            self.ansi = other.ansi;
        }
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses_to_defaults() {
        let parsed: AppConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        let default = AppConfig::default();
        assert_eq!(parsed.version, default.version);
        assert_eq!(parsed.server.port, default.server.port);
        assert_eq!(parsed.dashboard.top_n, default.dashboard.top_n);
        assert_eq!(parsed.logging.level, default.logging.level);
        parsed.validate().unwrap();
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "datadash=loud=".to_string();
        assert!(config.validate().is_err());
    }
}
