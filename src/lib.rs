pub mod aggregate;
pub mod chart;
pub mod chart_export;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error_display;
pub mod export;
pub mod logging;
pub mod page;
pub mod selection;
pub mod server;

pub use config::{AppConfig, ConfigManager};
pub use dashboard::{Dashboard, Registry};
pub use datadash_cli::{Args, Command, CompressionFormat, DashboardId};
pub use dataset::Dataset;
pub use selection::Selection;

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "datadash";

/// How the CSV files are read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_lines: Option<usize>,
    pub skip_rows: Option<usize>,
    pub compression: Option<CompressionFormat>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_lines(mut self, skip_lines: usize) -> Self {
        self.skip_lines = Some(skip_lines);
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_compression(mut self, compression: CompressionFormat) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Create LoadOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        let data = &config.data;
        Self {
            delimiter: args.delimiter.or(data.delimiter),
            // --no-header flips the header flag
            has_header: args.no_header.map(|no_header| !no_header).or(data.has_header),
            skip_lines: data.skip_lines,
            skip_rows: data.skip_rows,
            compression: args.compression.or_else(|| {
                data.compression
                    .as_deref()
                    .and_then(CompressionFormat::from_name)
            }),
        }
    }
}
