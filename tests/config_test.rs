use clap::Parser;
use datadash::config::{AppConfig, ConfigManager};
use datadash::Args;
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8050);
    assert!(config.data.layoffs_path.is_none());
    assert!(config.data.power_plants_path.is_none());
    assert_eq!(config.dashboard.top_n, 10);
    assert!(config.dashboard.layoffs_default_country.is_none());
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.ansi);
    assert!(config.validate().is_ok());
}

#[test]
fn test_generate_and_reload_template() {
    let (_temp_dir, manager) = setup_test_config_dir();
    let path = manager.write_default_config(false).unwrap();
    assert!(path.exists());

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded.server.port, 8050);
    assert_eq!(loaded.dashboard.top_n, 10);
}

#[test]
fn test_generate_refuses_overwrite_without_force() {
    let (_temp_dir, manager) = setup_test_config_dir();
    let path = manager.write_default_config(false).unwrap();
    fs::write(&path, "version = \"0.1\"\n").unwrap();

    assert!(manager.write_default_config(false).is_err());
    manager.write_default_config(true).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[dashboard]"));
}

#[test]
fn test_file_overrides_defaults() {
    let (temp_dir, _manager) = setup_test_config_dir();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
version = "0.1"

[server]
port = 9000

[data]
layoffs_path = "/data/layoffs.csv"
compression = "gzip"

[dashboard]
top_n = 5
power_plants_default_country = "Indonesia"

[logging]
level = "datadash=debug"
ansi = false
"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(
        config.data.layoffs_path.as_deref(),
        Some(std::path::Path::new("/data/layoffs.csv"))
    );
    assert_eq!(config.dashboard.top_n, 5);
    assert_eq!(
        config.dashboard.power_plants_default_country.as_deref(),
        Some("Indonesia")
    );
    assert_eq!(config.logging.level, "datadash=debug");
    assert!(!config.logging.ansi);
}

#[test]
fn test_cli_overrides_file() {
    let mut config = AppConfig::default();
    config.data.layoffs_path = Some("/from/config.csv".into());
    config.server.port = 9000;

    let args = Args::parse_from([
        "datadash",
        "--layoffs",
        "/from/cli.csv",
        "--log-level",
        "warn",
        "serve",
        "--port",
        "9100",
    ]);
    config.apply_args(&args);
    if let Some(datadash::Command::Serve(serve)) = &args.command {
        config.apply_serve_args(serve);
    }

    assert_eq!(
        config.data.layoffs_path.as_deref(),
        Some(std::path::Path::new("/from/cli.csv"))
    );
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.server.port, 9100);
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = AppConfig::default();
    config.version = "9.0".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.dashboard.top_n = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.server.port = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.data.compression = Some("rar".to_string());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("rar"));
}

#[test]
fn test_unparseable_file_is_an_error() {
    let (temp_dir, _manager) = setup_test_config_dir();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[server\nport = ").unwrap();
    let err = AppConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}
