//! Dataset loader for JSON and delimited files.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use indexmap::IndexSet;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::record::{Dataset, Record, Value};
use super::source::SourceMetadata;
use crate::error::{RapportError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// On-disk dataset format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// A JSON array of flat objects.
    Json,
    /// Delimited text with a header row.
    Delimited,
}

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Format to use (None = detect from extension and content).
    pub format: Option<DatasetFormat>,
    /// Delimiter for delimited files (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum records to read (None = all).
    pub max_records: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            format: None,
            delimiter: None,
            max_records: None,
            quote: b'"',
        }
    }
}

/// Loads datasets from local files.
pub struct DatasetLoader {
    config: LoaderConfig,
}

impl DatasetLoader {
    /// Create a new loader with default configuration.
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
        }
    }

    /// Create a loader with custom configuration.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load a file and return the dataset and its metadata.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| RapportError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| RapportError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let size_bytes = contents.len() as u64;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let format = match self.config.format {
            Some(f) => f,
            None => detect_format(path, &contents),
        };

        let (dataset, format_name) = match format {
            DatasetFormat::Json => (self.parse_json(&contents)?, "json".to_string()),
            DatasetFormat::Delimited => {
                let delimiter = match self.config.delimiter {
                    Some(d) => d,
                    None => detect_delimiter(&contents)?,
                };
                let name = match delimiter {
                    b'\t' => "tsv",
                    b',' => "csv",
                    b';' => "csv-semicolon",
                    b'|' => "psv",
                    _ => "delimited",
                };
                (self.parse_delimited(&contents, delimiter)?, name.to_string())
            }
        };

        let field_count = dataset
            .iter()
            .flat_map(|r| r.keys())
            .collect::<IndexSet<_>>()
            .len();

        info!(
            path = %path.display(),
            format = %format_name,
            records = dataset.len(),
            "loaded dataset"
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format_name,
            dataset.len(),
            field_count,
        );

        Ok((dataset, metadata))
    }

    /// Parse a JSON array of flat objects.
    pub fn parse_json(&self, bytes: &[u8]) -> Result<Dataset> {
        let mut dataset: Dataset = serde_json::from_slice(bytes)?;
        if let Some(max) = self.config.max_records {
            dataset.truncate(max);
        }
        if dataset.is_empty() {
            return Err(RapportError::EmptyData("No records found".to_string()));
        }
        Ok(dataset)
    }

    /// Parse delimited text with a header row.
    pub fn parse_delimited(&self, bytes: &[u8], delimiter: u8) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(RapportError::EmptyData("No columns found".to_string()));
        }

        let mut dataset = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_records {
                if idx >= max {
                    break;
                }
            }

            let row = result?;
            // Short rows are padded with nulls; extra cells are dropped.
            let record: Record = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), type_cell(row.get(i).unwrap_or(""))))
                .collect();
            dataset.push(record);
        }

        if dataset.is_empty() {
            return Err(RapportError::EmptyData("No data rows found".to_string()));
        }

        debug!(delimiter = %(delimiter as char).escape_default(), "parsed delimited dataset");
        Ok(dataset)
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Type a raw delimited cell.
///
/// Values with a leading zero (`0123`) stay strings so that organisation
/// numbers and postal codes keep their digits.
pub fn type_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let leading_zero = digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.");
    let plain = digits
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().next().is_some_and(|c| c.is_ascii_digit());

    if plain && !leading_zero {
        if let Ok(n) = trimmed.parse::<f64>() {
            return Value::Number(n);
        }
    }

    Value::String(trimmed.to_string())
}

/// Pick JSON or delimited based on the extension, then on the first byte.
fn detect_format(path: &Path, bytes: &[u8]) -> DatasetFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("json") => DatasetFormat::Json,
        Some("csv") | Some("tsv") | Some("txt") => DatasetFormat::Delimited,
        _ => {
            let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
            if first == Some(&b'[') {
                DatasetFormat::Json
            } else {
                DatasetFormat::Delimited
            }
        }
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(RapportError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts.first().copied().unwrap_or(0);
        if first_count == 0 {
            continue;
        }

        // Consistent counts across lines beat raw frequency.
        let consistent = counts.iter().all(|&c| c == first_count);
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_semicolon() {
        let data = b"a;b;c\n1;2;3\n4;5;6";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_parse_delimited_types_cells() {
        let loader = DatasetLoader::new();
        let data = b"OrgNr,Amount,Active,Name\n0123,1500.5,true,Acme\n987,,false,Beta";
        let dataset = loader.parse_delimited(data, b',').unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset[0]["OrgNr"], Value::from("0123"));
        assert_eq!(dataset[0]["Amount"], Value::Number(1500.5));
        assert_eq!(dataset[0]["Active"], Value::Bool(true));
        assert_eq!(dataset[1]["OrgNr"], Value::Number(987.0));
        assert_eq!(dataset[1]["Amount"], Value::Null);
    }

    #[test]
    fn test_type_cell() {
        assert_eq!(type_cell("-42"), Value::Number(-42.0));
        assert_eq!(type_cell("0"), Value::Number(0.0));
        assert_eq!(type_cell("0.25"), Value::Number(0.25));
        assert_eq!(type_cell("2024-01-05"), Value::from("2024-01-05"));
        assert_eq!(type_cell("kr 200"), Value::from("kr 200"));
        assert_eq!(type_cell("  "), Value::Null);
    }

    #[test]
    fn test_parse_json_rejects_empty() {
        let loader = DatasetLoader::new();
        assert!(matches!(
            loader.parse_json(b"[]"),
            Err(RapportError::EmptyData(_))
        ));
    }
}
