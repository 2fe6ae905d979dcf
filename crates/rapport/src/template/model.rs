//! Persisted report templates.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RapportError, Result};
use crate::pipeline::Operation;

/// Inclusive reporting period a template was recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Create a range; `from` must not be after `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(RapportError::Config(format!(
                "Date range starts after it ends: {} > {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// A named, reusable operation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTemplate {
    pub name: String,

    /// Report kind the template was recorded for, e.g. "claims".
    #[serde(
        rename = "recordedReportKind",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub report_kind: Option<String>,

    #[serde(
        rename = "recordedDateRange",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_range: Option<DateRange>,

    pub operations: Vec<Operation>,

    pub created_at: DateTime<Utc>,
}

impl ReportTemplate {
    /// Create a template stamped with the current time.
    pub fn new(name: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            report_kind: None,
            date_range: None,
            operations,
            created_at: Utc::now(),
        }
    }

    pub fn with_report_kind(mut self, kind: impl Into<String>) -> Self {
        self.report_kind = Some(kind.into());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Whether any stage has a type this version does not understand.
    pub fn has_unknown_stages(&self) -> bool {
        self.operations
            .iter()
            .any(|op| matches!(op, Operation::Unknown))
    }

    /// Save the template to a JSON file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use rapport::template::ReportTemplate;
    /// # fn example(template: &ReportTemplate) -> rapport::Result<()> {
    /// template.save("claims.template.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    RapportError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            RapportError::Persistence(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| {
            RapportError::Persistence(format!("Failed to serialize template '{}': {}", self.name, e))
        })?;

        Ok(())
    }

    /// Load a template from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            RapportError::Persistence(format!("Failed to open file '{}': {}", path.display(), e))
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            RapportError::Persistence(format!(
                "Failed to parse template '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
