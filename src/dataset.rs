//! One-time CSV loading into an immutable in-memory table.
//!
//! A [`Dataset`] is read once at startup, runs its dashboard's preparation step
//! (derived columns), and is never mutated afterwards. Handlers get cheap lazy
//! views of it through [`Dataset::lazy`].

use crate::LoadOptions;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use datadash_cli::CompressionFormat;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Read a whole CSV file into a DataFrame.
///
/// Gzip and zstd inputs are decompressed by polars; bzip2 and xz are
/// decompressed into memory first. Compression is taken from `options` or
/// detected from the file extension.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<DataFrame> {
    let compression = options
        .compression
        .or_else(|| CompressionFormat::from_extension(path));
    let read_options = csv_read_options(options);

    let df = match compression {
        None | Some(CompressionFormat::Gzip) | Some(CompressionFormat::Zstd) => read_options
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        Some(CompressionFormat::Bzip2) => {
            let file = File::open(path)?;
            read_decompressed(
                bzip2::read::BzDecoder::new(BufReader::new(file)),
                read_options,
            )?
        }
        Some(CompressionFormat::Xz) => {
            let file = File::open(path)?;
            read_decompressed(xz2::read::XzDecoder::new(BufReader::new(file)), read_options)?
        }
    };

    debug!(path = %path.display(), ?compression, rows = df.height(), "read csv");
    Ok(df)
}

fn csv_read_options(options: &LoadOptions) -> CsvReadOptions {
    let mut read_options = CsvReadOptions::default()
        .with_has_header(options.has_header.unwrap_or(true))
        .with_infer_schema_length(None);
    if let Some(skip_lines) = options.skip_lines {
        read_options.skip_lines = skip_lines;
    }
    if let Some(skip_rows) = options.skip_rows {
        read_options.skip_rows = skip_rows;
    }
    let delimiter = options.delimiter;
    read_options.map_parse_options(|opts| {
        let opts = opts.with_try_parse_dates(true);
        match delimiter {
            Some(d) => opts.with_separator(d),
            None => opts,
        }
    })
}

fn read_decompressed(mut decoder: impl Read, read_options: CsvReadOptions) -> Result<DataFrame> {
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    let df = CsvReader::new(std::io::Cursor::new(decompressed))
        .with_options(read_options)
        .finish()?;
    Ok(df)
}

/// Fail unless every name in `required` is a column of `df`.
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| df.get_column_index(name).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(eyre!("Missing required column(s): {}", missing.join(", ")))
    }
}

/// An immutable, prepared table shared read-only by every handler.
#[derive(Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Load `path` and run `prepare` on the result. Any failure is returned
    /// as-is: callers treat it as fatal.
    pub fn load<F>(name: &str, path: &Path, options: &LoadOptions, prepare: F) -> Result<Self>
    where
        F: FnOnce(DataFrame) -> Result<DataFrame>,
    {
        let started = Instant::now();
        let raw = load_csv(path, options)?;
        let frame = prepare(raw)?;
        info!(
            dataset = name,
            path = %path.display(),
            rows = frame.height(),
            columns = frame.width(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset loaded"
        );
        Ok(Self { frame })
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// A fresh lazy view over the table. The underlying columns are shared.
    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "company,country,total_laid_off\nAcme,India,10\nGlobex,Chile,\n";

    #[test]
    fn load_plain_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.csv");
        std::fs::write(&path, CSV).unwrap();

        let df = load_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("total_laid_off").unwrap().null_count(), 1);
    }

    #[test]
    fn load_bzip2_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.csv.bz2");
        let file = File::create(&path).unwrap();
        let mut encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
        encoder.write_all(CSV.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let df = load_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn load_gzip_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.csv.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(CSV.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let df = load_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn load_zstd_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.csv.zst");
        std::fs::write(&path, zstd::encode_all(CSV.as_bytes(), 0).unwrap()).unwrap();

        let df = load_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn load_xz_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.csv.xz");
        let file = File::create(&path).unwrap();
        let mut encoder = xz2::write::XzEncoder::new(file, 6);
        encoder.write_all(CSV.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let df = load_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("company").unwrap().str().unwrap().get(0), Some("Acme"));
    }

    #[test]
    fn explicit_compression_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.dat");
        let file = File::create(&path).unwrap();
        let mut encoder = xz2::write::XzEncoder::new(file, 6);
        encoder.write_all(CSV.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let opts = LoadOptions::new().with_compression(CompressionFormat::Xz);
        let df = load_csv(&path, &opts).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn skip_lines_drops_leading_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commented.csv");
        std::fs::write(&path, format!("# exported 2023-01-06\n{}", CSV)).unwrap();

        let opts = LoadOptions::new().with_skip_lines(1);
        let df = load_csv(&path, &opts).unwrap();
        assert_eq!(df.height(), 2);
        assert!(df.column("company").is_ok());
    }

    #[test]
    fn skip_rows_before_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preamble.csv");
        std::fs::write(&path, format!("source,layoffs.fyi,2023\n{}", CSV)).unwrap();

        let opts = LoadOptions::new().with_skip_rows(1);
        let df = load_csv(&path, &opts).unwrap();
        assert_eq!(df.height(), 2);
        assert!(df.column("total_laid_off").is_ok());
    }

    #[test]
    fn headerless_file_reads_every_line_as_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headerless.csv");
        std::fs::write(&path, "Acme,India,10\nGlobex,Chile,5\n").unwrap();

        let opts = LoadOptions::new().with_has_header(false);
        let df = load_csv(&path, &opts).unwrap();
        assert_eq!(df.height(), 2);
        assert!(df.column("company").is_err());
    }

    #[test]
    fn load_with_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.psv");
        std::fs::write(&path, CSV.replace(',', "|")).unwrap();

        let opts = LoadOptions::new().with_delimiter(b'|');
        let df = load_csv(&path, &opts).unwrap();
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_csv(&dir.path().join("absent.csv"), &LoadOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn require_columns_names_missing() {
        let df = df!("company" => &["Acme"]).unwrap();
        assert!(require_columns(&df, &["company"]).is_ok());
        let err = require_columns(&df, &["company", "country", "stage"]).unwrap_err();
        assert!(err.to_string().contains("country, stage"));
    }

    #[test]
    fn prepare_failure_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.csv");
        std::fs::write(&path, CSV).unwrap();

        let result = Dataset::load("test", &path, &LoadOptions::default(), |df| {
            require_columns(&df, &["stage"])?;
            Ok(df)
        });
        assert!(result.is_err());
    }
}
