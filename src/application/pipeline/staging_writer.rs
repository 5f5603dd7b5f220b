use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::application::ports::{StagingEntry, StagingError, StagingStore};

/// Single owner of the staging store.
///
/// Workers never touch the store; they send whole-archive batches over a
/// channel and this task applies them one at a time, so every batch lands
/// atomically and in arrival order.
pub struct StagingWriter;

impl StagingWriter {
    /// Spawn the writer on the blocking pool.
    ///
    /// The task finishes once every sender is dropped and returns the store
    /// for emission. The first failed commit stops the task, which closes
    /// the channel for all workers.
    pub fn spawn(
        mut store: Box<dyn StagingStore>,
        capacity: usize,
    ) -> (
        flume::Sender<Vec<StagingEntry>>,
        JoinHandle<Result<Box<dyn StagingStore>, StagingError>>,
    ) {
        let (tx, rx) = flume::bounded::<Vec<StagingEntry>>(capacity.max(1));

        let handle = tokio::task::spawn_blocking(move || {
            let mut batches = 0usize;
            for batch in rx.iter() {
                let size = batch.len();
                if let Err(e) = store.put_batch(batch) {
                    error!("Staging commit failed after {} batches: {}", batches, e);
                    return Err(e);
                }
                batches += 1;
                debug!("Committed batch of {} entries ({} total)", size, store.len());
            }
            debug!("Staging writer drained {} batches", batches);
            Ok(store)
        });

        (tx, handle)
    }
}
