//! Schema types for representing inferred dataset structure.

mod field;
mod table;
mod types;

pub use field::FieldMetadata;
pub use table::Schema;
pub use types::{FieldCategory, InferredType};
