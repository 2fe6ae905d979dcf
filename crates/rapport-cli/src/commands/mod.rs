//! CLI command implementations.

pub mod analyze;
pub mod compare;
pub mod output;
pub mod run;
pub mod template;

use std::fs;
use std::path::Path;

use rapport::{Operation, ReportConfig};
use tracing::debug;

/// Read the report configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ReportConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading report config");
            Ok(ReportConfig::from_file(path)?)
        }
        None => Ok(ReportConfig::default()),
    }
}

/// Read a pipeline file: a JSON array of operations, or an object with an
/// `operations` array (such as a saved template).
pub fn read_pipeline(path: &Path) -> Result<Vec<Operation>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Pipeline file not found: {}", path.display()).into());
    }
    let contents = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;

    let operations: Vec<Operation> = match value {
        serde_json::Value::Object(mut map) => match map.remove("operations") {
            Some(ops) => serde_json::from_value(ops)?,
            None => {
                return Err(format!(
                    "Pipeline file {} has no 'operations' array",
                    path.display()
                )
                .into());
            }
        },
        other => serde_json::from_value(other)?,
    };

    debug!(path = %path.display(), stages = operations.len(), "Read pipeline");
    Ok(operations)
}
