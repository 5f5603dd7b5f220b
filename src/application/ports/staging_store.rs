use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duplicate staging key: {0}")]
    DuplicateKey(String),

    #[error("Staging database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Staging writer stopped: {0}")]
    WriterStopped(String),
}

/// One staged record: image name -> serialized metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl StagingEntry {
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Entries produced in ascending key order
pub type StagingIter<'a> = Box<dyn Iterator<Item = Result<StagingEntry, StagingError>> + 'a>;

/// Port for the transient ordered store between decoding and emission.
///
/// Keys are write-once. Iteration order is key order, never arrival order.
pub trait StagingStore: Send {
    /// Commit every entry of one archive as a single unit
    fn put_batch(&mut self, batch: Vec<StagingEntry>) -> Result<(), StagingError>;

    /// Number of committed entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate all entries in ascending key order
    fn iter_ordered(&self) -> Result<StagingIter<'_>, StagingError>;

    /// Release the backing storage
    fn discard(self: Box<Self>) -> Result<(), StagingError>;
}
