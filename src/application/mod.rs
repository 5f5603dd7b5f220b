pub mod builder;
pub mod decoder;
pub mod errors;
pub mod materializer;
pub mod pipeline;
pub mod ports;
pub mod use_cases;
