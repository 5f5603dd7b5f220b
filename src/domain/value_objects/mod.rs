mod content_hash;
mod format_tag;
mod image_name;

pub use content_hash::ContentHash;
pub use format_tag::FormatTag;
pub use image_name::ImageName;
