mod disk_store;
mod memory_store;

pub use disk_store::DiskStagingStore;
pub use memory_store::MemoryStagingStore;
