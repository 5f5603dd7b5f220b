mod build_dataset;

pub use build_dataset::BuildDatasetUseCase;
