mod image_encoder;
mod label_lookup;
mod staging_store;

pub use image_encoder::{Dimensions, EncodeError, ImageEncoder};
pub use label_lookup::{LabelLookup, NoLabels};
pub use staging_store::{StagingEntry, StagingError, StagingIter, StagingStore};

#[cfg(test)]
pub use image_encoder::MockImageEncoder;
#[cfg(test)]
pub use label_lookup::MockLabelLookup;
