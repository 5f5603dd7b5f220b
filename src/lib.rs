//! # glyph_dataset - ETL handwriting archive decoder
//!
//! Converts the fixed-layout binary archives of the ETL character database
//! into one PNG image per sample plus a consolidated JSON manifest.
//!
//! ## Architecture Layers
//!
//! - **Domain**: record layouts, the byte cursor and nibble unpacker,
//!   records and their metadata, value objects
//! - **Application**: decoder, image materializer, ports, the parallel
//!   pipeline and the build use case
//! - **Infrastructure**: PNG encoder, staging stores, label tables
//!
//! ## Pipeline
//!
//! - Archives are fanned out to a pool of blocking workers
//! - Each image is written as soon as its record is decoded, then the
//!   pixel buffer is released
//! - Per-archive metadata batches go to a single staging writer
//! - The manifest is streamed from the staging store in image-name order
//!
//! ## Example Usage
//!
//! ```no_run
//! use glyph_dataset::{application::builder::DatasetBuilder, Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env();
//! config.validate()?;
//! let summary = DatasetBuilder::new(config).build()?.run().await?;
//! println!("{}", summary.summary());
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::errors::{ErrorKind, PipelineError};
pub use application::{pipeline, ports, use_cases};
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
