//! A persistent auxiliary index store backed by `redb`.
//!
//! Staged writes are kept in memory and flushed to a single `redb` table in
//! one write transaction at block commit, so a crash between blocks never
//! leaves a partially indexed height.

use forge_api::state::{IndexStore, KeyValueStore};
use forge_types::error::StateError;
use redb::{Database, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;

const INDEX_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("forge_index");

type Staged = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// A `redb`-backed index store.
pub struct RedbIndex {
    db: Database,
    staged: Staged,
    savepoint: Option<Staged>,
}

impl RedbIndex {
    /// Opens (or creates) the index database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StateError> {
        let db = Database::create(path).map_err(|e| StateError::Backend(e.to_string()))?;
        // Create the table eagerly so reads before the first commit succeed.
        let wtx = db
            .begin_write()
            .map_err(|e| StateError::Backend(e.to_string()))?;
        wtx.open_table(INDEX_TABLE)
            .map_err(|e| StateError::Backend(e.to_string()))?;
        wtx.commit().map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(RedbIndex {
            db,
            staged: Staged::new(),
            savepoint: None,
        })
    }

    fn read_committed(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        let rtx = self
            .db
            .begin_read()
            .map_err(|e| StateError::Backend(e.to_string()))?;
        let table = rtx
            .open_table(INDEX_TABLE)
            .map_err(|e| StateError::Backend(e.to_string()))?;
        let value = table
            .get(key)
            .map_err(|e| StateError::Backend(e.to_string()))?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn scan_committed(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError> {
        let rtx = self
            .db
            .begin_read()
            .map_err(|e| StateError::Backend(e.to_string()))?;
        let table = rtx
            .open_table(INDEX_TABLE)
            .map_err(|e| StateError::Backend(e.to_string()))?;

        let mut out = Vec::new();
        let upper = prefix_upper_bound(prefix);
        let iter = match &upper {
            Some(u) => table
                .range(prefix..u.as_slice())
                .map_err(|e| StateError::Backend(e.to_string()))?,
            None => table
                .range(prefix..)
                .map_err(|e| StateError::Backend(e.to_string()))?,
        };
        for item in iter {
            let (k, v) = item.map_err(|e| StateError::Backend(e.to_string()))?;
            out.push((k.value().to_vec(), v.value().to_vec()));
        }
        Ok(out)
    }
}

/// The smallest key greater than every key starting with `prefix`, or `None`
/// when the prefix is all `0xff`.
fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.last().copied() {
        if last < 0xff {
            *upper.last_mut()? = last + 1;
            return Some(upper);
        }
        upper.pop();
    }
    None
}

impl KeyValueStore for RedbIndex {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        match self.staged.get(key) {
            Some(Some(v)) => Ok(Some(v.clone())),
            Some(None) => Ok(None),
            None => self.read_committed(key),
        }
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.staged.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.staged.insert(key.to_vec(), None);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError> {
        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = self
            .scan_committed(prefix)?
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect();
        for (k, v) in self
            .staged
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            merged.insert(k.clone(), v.clone());
        }
        Ok(merged
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect())
    }

    fn tx_begin(&mut self) {
        self.savepoint = Some(self.staged.clone());
    }

    fn tx_commit(&mut self) {
        self.savepoint = None;
    }

    fn tx_rollback(&mut self) {
        if let Some(snap) = self.savepoint.take() {
            self.staged = snap;
        }
    }

    fn commit_block(&mut self, height: u64) -> Result<(), StateError> {
        let staged = std::mem::take(&mut self.staged);
        self.savepoint = None;
        if staged.is_empty() {
            return Ok(());
        }

        let wtx = self
            .db
            .begin_write()
            .map_err(|e| StateError::Backend(e.to_string()))?;
        {
            let mut table = wtx
                .open_table(INDEX_TABLE)
                .map_err(|e| StateError::Backend(e.to_string()))?;
            for (k, v) in &staged {
                match v {
                    Some(v) => {
                        table
                            .insert(k.as_slice(), v.as_slice())
                            .map_err(|e| StateError::Backend(e.to_string()))?;
                    }
                    None => {
                        table
                            .remove(k.as_slice())
                            .map_err(|e| StateError::Backend(e.to_string()))?;
                    }
                }
            }
        }
        wtx.commit().map_err(|e| StateError::Backend(e.to_string()))?;
        tracing::debug!(target: "storage", height, writes = staged.len(), "index block committed");
        Ok(())
    }
}

impl IndexStore for RedbIndex {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.redb");

        {
            let mut idx = RedbIndex::open(&path).unwrap();
            idx.insert(b"propEndAt/5/repo1/1", b"").unwrap();
            idx.commit_block(1).unwrap();
        }

        let idx = RedbIndex::open(&path).unwrap();
        assert_eq!(idx.get(b"propEndAt/5/repo1/1").unwrap(), Some(vec![]));
    }

    #[test]
    fn staged_writes_are_invisible_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = RedbIndex::open(dir.path().join("i.redb")).unwrap();

        idx.insert(b"k", b"v").unwrap();
        assert_eq!(idx.get(b"k").unwrap(), Some(b"v".to_vec()));

        idx.tx_begin();
        idx.delete(b"k").unwrap();
        idx.tx_rollback();
        assert_eq!(idx.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn prefix_scan_merges_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = RedbIndex::open(dir.path().join("i.redb")).unwrap();

        idx.insert(b"blkv/1", b"a").unwrap();
        idx.insert(b"blkv/2", b"b").unwrap();
        idx.commit_block(1).unwrap();

        idx.delete(b"blkv/1").unwrap();
        idx.insert(b"blkv/3", b"c").unwrap();

        let pairs = idx.prefix_scan(b"blkv/").unwrap();
        let keys: Vec<_> = pairs.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"blkv/2".to_vec(), b"blkv/3".to_vec()]);
    }

    #[test]
    fn upper_bound_handles_0xff_tails() {
        assert_eq!(prefix_upper_bound(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_upper_bound(&[0x61, 0xff]), Some(vec![0x62]));
        assert_eq!(prefix_upper_bound(&[0xff, 0xff]), None);
    }
}
