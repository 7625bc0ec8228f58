//! Shared CLI definitions for datadash.
//!
//! Used by the main application and by the build script (manpage).

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Compression format for data files
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Gzip compression (.gz) - Most common, good balance of speed and compression
    Gzip,
    /// Zstandard compression (.zst) - Modern, fast compression with good ratios
    Zstd,
    /// Bzip2 compression (.bz2) - Good compression ratio, slower than gzip
    Bzip2,
    /// XZ compression (.xz) - Excellent compression ratio, slower than bzip2
    Xz,
}

impl CompressionFormat {
    /// Detect compression format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            match ext.to_lowercase().as_str() {
                "gz" => Some(Self::Gzip),
                "zst" | "zstd" => Some(Self::Zstd),
                "bz2" | "bz" => Some(Self::Bzip2),
                "xz" => Some(Self::Xz),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Parse the name used in the config file (`gzip`, `zstd`, `bzip2`, `xz`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "gzip" => Some(Self::Gzip),
            "zstd" => Some(Self::Zstd),
            "bzip2" => Some(Self::Bzip2),
            "xz" => Some(Self::Xz),
            _ => None,
        }
    }
}

/// The dashboards datadash knows how to build.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DashboardId {
    /// Tech-industry layoffs by company, industry and city
    Layoffs,
    /// Global power plants by fuel and capacity
    PowerPlants,
}

impl DashboardId {
    /// URL segment and registry key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Layoffs => "layoffs",
            Self::PowerPlants => "power-plants",
        }
    }
}

/// Command-line arguments for datadash
#[derive(Clone, Parser, Debug)]
#[command(
    name = "datadash",
    version,
    about = "Country dashboards over static CSV datasets"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Read configuration from this file instead of ~/.config/datadash/config.toml
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the tech layoffs CSV (overrides config [data] layoffs_path)
    #[arg(long = "layoffs", value_name = "PATH", global = true)]
    pub layoffs: Option<PathBuf>,

    /// Path to the power plant CSV (overrides config [data] power_plants_path)
    #[arg(long = "power-plants", value_name = "PATH", global = true)]
    pub power_plants: Option<PathBuf>,

    /// Log filter, e.g. "info" or "datadash=debug" (overrides config; RUST_LOG wins when set)
    #[arg(long = "log-level", value_name = "FILTER", global = true)]
    pub log_level: Option<String>,

    /// Specify that the data files have no header
    #[arg(long = "no-header", global = true)]
    pub no_header: Option<bool>,

    /// Specify the delimiter to use when reading the data files
    #[arg(long = "delimiter", global = true)]
    pub delimiter: Option<u8>,

    /// Specify the compression format explicitly (gzip, zstd, bzip2, xz)
    /// If not specified, compression is auto-detected from file extension.
    #[arg(long = "compression", value_enum, global = true)]
    pub compression: Option<CompressionFormat>,

    /// Generate default configuration file at ~/.config/datadash/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

#[derive(Clone, Subcommand, Debug)]
pub enum Command {
    /// Serve the dashboards over HTTP (default)
    Serve(ServeArgs),
    /// Render every chart of one dashboard to SVG files
    Export(ExportArgs),
}

#[derive(Clone, ClapArgs, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides config [server] host)
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Port to bind (overrides config [server] port)
    #[arg(long = "port")]
    pub port: Option<u16>,
}

#[derive(Clone, ClapArgs, Debug)]
pub struct ExportArgs {
    /// Dashboard to export
    #[arg(long = "dashboard", value_enum)]
    pub dashboard: DashboardId,

    /// Country to filter by (default: all countries)
    #[arg(long = "country")]
    pub country: Option<String>,

    /// Output directory for the SVG files and panels.json
    #[arg(long = "out", value_name = "DIR")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_compression_detection() {
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.gz")),
            Some(CompressionFormat::Gzip)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.zst")),
            Some(CompressionFormat::Zstd)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.bz2")),
            Some(CompressionFormat::Bzip2)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.xz")),
            Some(CompressionFormat::Xz)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv")),
            None
        );
        assert_eq!(CompressionFormat::from_extension(Path::new("file")), None);
    }

    #[test]
    fn test_compression_from_name() {
        assert_eq!(
            CompressionFormat::from_name("GZIP"),
            Some(CompressionFormat::Gzip)
        );
        assert_eq!(
            CompressionFormat::from_name("bzip2"),
            Some(CompressionFormat::Bzip2)
        );
        assert_eq!(CompressionFormat::from_name("rar"), None);
    }

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_serve_is_optional() {
        let args = Args::try_parse_from(["datadash", "--layoffs", "layoffs.csv"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.layoffs, Some(PathBuf::from("layoffs.csv")));
    }

    #[test]
    fn test_export_args() {
        let args = Args::try_parse_from([
            "datadash",
            "export",
            "--dashboard",
            "power-plants",
            "--country",
            "Indonesia",
            "--out",
            "charts",
        ])
        .unwrap();
        match args.command {
            Some(Command::Export(export)) => {
                assert_eq!(export.dashboard, DashboardId::PowerPlants);
                assert_eq!(export.country.as_deref(), Some("Indonesia"));
                assert_eq!(export.out, PathBuf::from("charts"));
            }
            other => panic!("expected export command, got {:?}", other),
        }
    }
}
