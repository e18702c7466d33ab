// Storage module - columnar table directories

pub mod codec;
pub mod column;
pub mod manifest;
pub mod table;
pub mod catalog;

pub use catalog::Catalog;
pub use column::{Column, ColumnReader, ColumnWriter};
pub use manifest::{MANIFEST_FILE, ManifestField, TableManifest};
pub use table::Table;
