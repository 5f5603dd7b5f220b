use std::collections::BTreeMap;

use crate::application::ports::{StagingEntry, StagingError, StagingIter, StagingStore};

/// In-memory staging store for small runs and tests
#[derive(Debug, Default)]
pub struct MemoryStagingStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStagingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StagingStore for MemoryStagingStore {
    fn put_batch(&mut self, batch: Vec<StagingEntry>) -> Result<(), StagingError> {
        // Validate the whole batch first so a rejected batch leaves no trace
        let mut seen = std::collections::HashSet::with_capacity(batch.len());
        for entry in &batch {
            if self.entries.contains_key(&entry.key) || !seen.insert(entry.key.as_str()) {
                return Err(StagingError::DuplicateKey(entry.key.clone()));
            }
        }

        for entry in batch {
            self.entries.insert(entry.key, entry.value);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter_ordered(&self) -> Result<StagingIter<'_>, StagingError> {
        Ok(Box::new(
            self.entries
                .iter()
                .map(|(k, v)| Ok(StagingEntry::new(k.clone(), v.clone()))),
        ))
    }

    fn discard(self: Box<Self>) -> Result<(), StagingError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> StagingEntry {
        StagingEntry::new(key, key.as_bytes().to_vec())
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let mut store = MemoryStagingStore::new();
        store.put_batch(vec![entry("c"), entry("a")]).unwrap();
        store.put_batch(vec![entry("b")]).unwrap();

        let keys: Vec<String> = store
            .iter_ordered()
            .unwrap()
            .map(|e| e.unwrap().key)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_duplicate_batch_is_rejected_whole() {
        let mut store = MemoryStagingStore::new();
        store.put_batch(vec![entry("a")]).unwrap();

        let err = store.put_batch(vec![entry("b"), entry("a")]).unwrap_err();
        assert!(matches!(err, StagingError::DuplicateKey(k) if k == "a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_within_batch() {
        let mut store = MemoryStagingStore::new();
        assert!(store.put_batch(vec![entry("x"), entry("x")]).is_err());
        assert!(store.is_empty());
    }
}
