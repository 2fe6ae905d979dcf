//! Dataset model and loading.

mod parser;
mod record;
mod source;

pub use parser::{DatasetFormat, DatasetLoader, LoaderConfig, type_cell};
pub use record::{Dataset, Record, Value, field_value, record};
pub use source::SourceMetadata;
