pub mod errors;
pub mod ops;

pub use errors::ExportError;
pub use ops::{export_table, inspect_structure, try_export_table};
