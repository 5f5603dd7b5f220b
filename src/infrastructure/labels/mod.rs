mod table_lookup;

pub use table_lookup::{LabelError, TableLabelLookup};
