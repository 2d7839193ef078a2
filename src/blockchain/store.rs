use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::BlockRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write block store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode block records: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed list of recent blocks, oldest first.
///
/// The file is the only copy of the data: every `load` reads it again and
/// every `save` replaces it whole. Only the chain poller writes to it; running
/// two processes against the same file is not supported.
#[derive(Debug, Clone)]
pub struct BlockStore {
    path: PathBuf,
}

impl BlockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted records. A missing, unreadable or malformed file is
    /// the same as an empty store.
    pub fn load(&self) -> Vec<BlockRecord> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!("STORE - no readable data at {:?}: {}", self.path, e);
                return Vec::new();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            debug!("STORE - ignoring malformed data in {:?}: {}", self.path, e);
            Vec::new()
        })
    }

    /// Replace the file content with `records`.
    pub fn save(&self, records: &[BlockRecord]) -> Result<(), StoreError> {
        let contents = serde_json::to_string(records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        // Write next to the target and rename so readers never see a torn file.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, contents).map_err(|source| self.io_error(source))?;
        fs::rename(&tmp, &self.path).map_err(|source| self.io_error(source))?;
        debug!("STORE - saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }

    /// Append `record`, keeping at most `window` records, and persist.
    ///
    /// Heights stay strictly ascending: any stored record at or above the new
    /// height is dropped first, so seeing the same block twice (or a re-org)
    /// replaces rather than duplicates.
    pub fn push_bounded(
        &self,
        record: BlockRecord,
        window: usize,
    ) -> Result<Vec<BlockRecord>, StoreError> {
        let mut records = self.load();
        records.retain(|r| r.height < record.height);
        records.push(record);
        let window = window.max(1);
        if records.len() > window {
            records.drain(..records.len() - window);
        }
        self.save(&records)?;
        Ok(records)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, BlockStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::new(dir.path().join("block_data.txt"));
        (dir, store)
    }

    fn rec(height: u64) -> BlockRecord {
        BlockRecord::new(height, format!("2024-04-19T23:{:02}:00Z", height % 60))
    }

    #[test]
    fn missing_file_loads_empty() {
        let (_dir, store) = store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let (_dir, store) = store();
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_empty());
        fs::write(store.path(), r#"[{"height": "abc"}]"#).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_preserves_content() {
        let (_dir, store) = store();
        let records = vec![rec(10), rec(11), rec(12)];
        store.save(&records).unwrap();
        assert_eq!(store.load(), records);

        // load -> save -> load is stable
        store.save(&store.load()).unwrap();
        assert_eq!(store.load(), records);
    }

    #[test]
    fn save_writes_plain_json_array() {
        let (_dir, store) = store();
        store
            .save(&[BlockRecord::new(7, "2024-01-01T00:00:00Z")])
            .unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"height": 7, "time": "2024-01-01T00:00:00Z"}])
        );
    }

    #[test]
    fn save_replaces_whole_file() {
        let (_dir, store) = store();
        store.save(&[rec(1), rec(2), rec(3)]).unwrap();
        store.save(&[rec(9)]).unwrap();
        assert_eq!(store.load(), vec![rec(9)]);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::new(dir.path().join("nested/deeper/data.json"));
        store.save(&[rec(1)]).unwrap();
        assert_eq!(store.load(), vec![rec(1)]);
    }

    #[test]
    fn push_bounded_trims_oldest() {
        let (_dir, store) = store();
        for h in 1..=8 {
            store.push_bounded(rec(h), 6).unwrap();
        }
        let heights: Vec<u64> = store.load().iter().map(|r| r.height).collect();
        assert_eq!(heights, vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn push_bounded_replaces_same_or_higher_heights() {
        let (_dir, store) = store();
        store.save(&[rec(10), rec(11), rec(12)]).unwrap();

        let same = BlockRecord::new(12, "2024-04-20T00:00:00Z");
        let out = store.push_bounded(same.clone(), 6).unwrap();
        assert_eq!(out, vec![rec(10), rec(11), same]);

        let reorg = rec(11);
        let out = store.push_bounded(reorg, 6).unwrap();
        assert_eq!(out, vec![rec(10), rec(11)]);
    }
}
