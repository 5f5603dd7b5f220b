pub mod archive_set;
pub mod codec;
pub mod entities;
pub mod errors;
pub mod layout;
pub mod value_objects;

pub use archive_set::ArchiveSet;
pub use layout::{Field, FieldKind, FieldSpec, RecordLayout};
