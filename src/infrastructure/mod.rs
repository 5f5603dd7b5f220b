pub mod imaging;
pub mod labels;
pub mod staging;
