//! Disk-backed staging store on an embedded redb database.

use redb::{Database, Durability, ReadOnlyTable, ReadableTable, TableDefinition};
use std::collections::VecDeque;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::application::ports::{StagingEntry, StagingError, StagingIter, StagingStore};

const DATABASE_FILE: &str = "staging.redb";
const STAGED: TableDefinition<&str, &[u8]> = TableDefinition::new("staged");

/// Entries fetched per read during ordered iteration
const PAGE_SIZE: usize = 1024;

/// Ordered, write-once staging store kept in a single redb file.
///
/// Each [`put_batch`](StagingStore::put_batch) is one write transaction:
/// either every entry of the archive lands or none does. A key that is
/// already staged, or repeated inside the batch, rejects the whole batch
/// with [`StagingError::DuplicateKey`].
///
/// Iteration walks the table in key order, which for image names is byte
/// order of the UTF-8 string. Entries are read in pages, so memory use at
/// emission time does not grow with the store.
///
/// # Examples
///
/// ```no_run
/// use glyph_dataset::infrastructure::staging::DiskStagingStore;
/// use glyph_dataset::ports::{StagingEntry, StagingStore};
///
/// let mut store = DiskStagingStore::create("output/.staging")?;
/// store.put_batch(vec![StagingEntry::new("b.png", b"{}".to_vec())])?;
/// store.put_batch(vec![StagingEntry::new("a.png", b"{}".to_vec())])?;
///
/// let keys: Vec<String> = store
///     .iter_ordered()?
///     .map(|entry| entry.map(|e| e.key))
///     .collect::<Result<_, _>>()?;
/// assert_eq!(keys, ["a.png", "b.png"]);
///
/// Box::new(store).discard()?;
/// # Ok::<(), glyph_dataset::ports::StagingError>(())
/// ```
///
/// # Thread Safety
///
/// The store is `Send` and is owned by exactly one staging writer; workers
/// reach it only through the commit channel.
pub struct DiskStagingStore {
    dir: PathBuf,
    db: Database,
    len: usize,
    durable_writes: bool,
}

impl DiskStagingStore {
    /// Create an empty store in `dir`.
    ///
    /// A directory left behind by an interrupted run is cleared first.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, StagingError> {
        let dir = dir.into();
        if dir.exists() {
            warn!("Removing stale staging directory {:?}", dir);
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;

        let db = Database::create(dir.join(DATABASE_FILE)).map_err(redb::Error::from)?;

        // Create the table up front so readers never see it missing
        let txn = db.begin_write().map_err(redb::Error::from)?;
        txn.open_table(STAGED).map_err(redb::Error::from)?;
        txn.commit().map_err(redb::Error::from)?;

        debug!("Staging database created in {:?}", dir);
        Ok(Self {
            dir,
            db,
            len: 0,
            durable_writes: false,
        })
    }

    /// Flush each committed batch to disk before acknowledging it
    pub fn with_durability(mut self, durable_writes: bool) -> Self {
        self.durable_writes = durable_writes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StagingStore for DiskStagingStore {
    fn put_batch(&mut self, batch: Vec<StagingEntry>) -> Result<(), StagingError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut txn = self.db.begin_write().map_err(redb::Error::from)?;
        if !self.durable_writes {
            txn.set_durability(Durability::None);
        }

        {
            let mut table = txn.open_table(STAGED).map_err(redb::Error::from)?;
            for entry in &batch {
                let previous = table
                    .insert(entry.key.as_str(), entry.value.as_slice())
                    .map_err(redb::Error::from)?;
                if previous.is_some() {
                    // Dropping the uncommitted transaction discards the batch
                    return Err(StagingError::DuplicateKey(entry.key.clone()));
                }
            }
        }

        txn.commit().map_err(redb::Error::from)?;
        self.len += batch.len();
        debug!("Committed {} staged entries", batch.len());
        Ok(())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn iter_ordered(&self) -> Result<StagingIter<'_>, StagingError> {
        let txn = self.db.begin_read().map_err(redb::Error::from)?;
        let table = txn.open_table(STAGED).map_err(redb::Error::from)?;
        Ok(Box::new(OrderedIter {
            table,
            page: VecDeque::with_capacity(PAGE_SIZE),
            last_key: None,
            exhausted: false,
        }))
    }

    fn discard(self: Box<Self>) -> Result<(), StagingError> {
        let Self { dir, db, .. } = *self;
        drop(db);
        std::fs::remove_dir_all(&dir)?;
        debug!("Staging directory {:?} removed", dir);
        Ok(())
    }
}

/// Key-ordered scan that refills from the table one page at a time
struct OrderedIter {
    table: ReadOnlyTable<&'static str, &'static [u8]>,
    page: VecDeque<StagingEntry>,
    last_key: Option<String>,
    exhausted: bool,
}

impl OrderedIter {
    fn fill_page(&mut self) -> Result<(), StagingError> {
        let lower = match self.last_key.as_deref() {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };

        let mut fetched = Vec::with_capacity(PAGE_SIZE);
        for item in self
            .table
            .range::<&str>((lower, Bound::Unbounded))
            .map_err(redb::Error::from)?
            .take(PAGE_SIZE)
        {
            let (key, value) = item.map_err(redb::Error::from)?;
            fetched.push(StagingEntry::new(key.value(), value.value().to_vec()));
        }

        if fetched.len() < PAGE_SIZE {
            self.exhausted = true;
        }
        if let Some(last) = fetched.last() {
            self.last_key = Some(last.key.clone());
        }
        self.page.extend(fetched);
        Ok(())
    }
}

impl Iterator for OrderedIter {
    type Item = Result<StagingEntry, StagingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.exhausted {
            if let Err(e) = self.fill_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.page.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(key: &str) -> StagingEntry {
        StagingEntry::new(key, format!("{{\"k\":\"{}\"}}", key).into_bytes())
    }

    fn keys(store: &DiskStagingStore) -> Vec<String> {
        store
            .iter_ordered()
            .unwrap()
            .map(|e| e.unwrap().key)
            .collect()
    }

    #[test]
    fn test_batches_iterate_in_key_order() {
        let dir = TempDir::new().unwrap();
        let mut store = DiskStagingStore::create(dir.path().join(".staging")).unwrap();
        store.put_batch(vec![entry("d"), entry("a")]).unwrap();
        store.put_batch(vec![entry("c"), entry("b"), entry("e")]).unwrap();
        store.put_batch(Vec::new()).unwrap();

        assert_eq!(store.len(), 5);
        assert_eq!(keys(&store), vec!["a", "b", "c", "d", "e"]);

        let first = store.iter_ordered().unwrap().next().unwrap().unwrap();
        assert_eq!(first.value, br#"{"k":"a"}"#.to_vec());
    }

    #[test]
    fn test_iteration_spans_several_pages() {
        let dir = TempDir::new().unwrap();
        let mut store = DiskStagingStore::create(dir.path().join(".staging")).unwrap();
        let total = PAGE_SIZE * 2 + 7;
        let batch: Vec<StagingEntry> = (0..total)
            .rev()
            .map(|i| entry(&format!("ETL9G_{:06}.png", i)))
            .collect();
        store.put_batch(batch).unwrap();

        let listed = keys(&store);
        assert_eq!(listed.len(), total);
        assert!(listed.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(listed[PAGE_SIZE], format!("ETL9G_{:06}.png", PAGE_SIZE));
    }

    #[test]
    fn test_existing_key_rejects_whole_batch() {
        let dir = TempDir::new().unwrap();
        let mut store = DiskStagingStore::create(dir.path().join(".staging")).unwrap();
        store.put_batch(vec![entry("a"), entry("b")]).unwrap();

        let err = store.put_batch(vec![entry("c"), entry("b")]).unwrap_err();
        assert!(matches!(err, StagingError::DuplicateKey(k) if k == "b"));
        assert_eq!(store.len(), 2);
        assert_eq!(keys(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_within_batch_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = DiskStagingStore::create(dir.path().join(".staging")).unwrap();
        let err = store.put_batch(vec![entry("a"), entry("a")]).unwrap_err();
        assert!(matches!(err, StagingError::DuplicateKey(_)));
        assert!(store.is_empty());
        assert!(keys(&store).is_empty());
    }

    #[test]
    fn test_durable_writes_commit() {
        let dir = TempDir::new().unwrap();
        let mut store = DiskStagingStore::create(dir.path().join(".staging"))
            .unwrap()
            .with_durability(true);
        store.put_batch(vec![entry("b"), entry("a")]).unwrap();
        assert_eq!(keys(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_discard_removes_directory() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join(".staging");
        let mut store = DiskStagingStore::create(&staging).unwrap();
        store.put_batch(vec![entry("a")]).unwrap();
        assert!(staging.join(DATABASE_FILE).exists());

        Box::new(store).discard().unwrap();
        assert!(!staging.exists());
    }

    #[test]
    fn test_create_clears_stale_directory() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join(".staging");
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(staging.join("leftover.tmp"), b"junk").unwrap();

        let store = DiskStagingStore::create(&staging).unwrap();
        assert!(store.is_empty());
        assert!(!staging.join("leftover.tmp").exists());
        assert!(keys(&store).is_empty());
    }
}
