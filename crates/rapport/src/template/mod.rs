//! Named report templates and their on-disk store.

mod model;
mod store;

pub use model::{DateRange, ReportTemplate};
pub use store::{TEMPLATE_SUFFIX, TemplateStore, slugify};
