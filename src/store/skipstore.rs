use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use crossbeam_skiplist::SkipMap;
use log::error;

use crate::{
  errors::{Errors, Result},
  iterator::SortedIterator,
  store::{SortedStore, StoreFactory, StoreOptions},
};

/// Ordered in-process store over a lock-free skip list.
///
/// This is the bundled stand-in for a full LSM engine: it honors the
/// Open/Put/Get/Delete/NewIterator/Destroy contract and the per-store
/// directory lifecycle, which is all the router depends on.
pub struct SkipStore {
  map: SkipMap<Bytes, Bytes>,
  opts: StoreOptions,
  path: PathBuf,
}

impl SkipStore {
  pub fn open(opts: StoreOptions, path: &Path) -> Result<Self> {
    if let Err(e) = fs::create_dir_all(path) {
      error!("failed to create store directory {}: {}", path.display(), e);
      return Err(Errors::FailedToCreateDatabaseDir);
    }

    Ok(Self {
      map: SkipMap::new(),
      opts,
      path: path.to_path_buf(),
    })
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }
}

impl SortedStore for SkipStore {
  fn put(&self, key: Bytes, value: Bytes) -> Result<()> {
    if let Some((key_len, value_len)) = self.opts.fixed_lengths {
      if key.len() != key_len || value.len() != value_len {
        return Err(Errors::RecordLengthMismatch);
      }
    }
    self.map.insert(key, value);
    Ok(())
  }

  fn get(&self, key: &[u8]) -> Result<Bytes> {
    match self.map.get(key) {
      Some(entry) => Ok(entry.value().clone()),
      None => Err(Errors::KeyNotFound),
    }
  }

  fn delete(&self, key: &[u8]) -> Result<()> {
    match self.map.remove(key) {
      Some(_) => Ok(()),
      None => Err(Errors::KeyNotFound),
    }
  }

  fn iter(&self) -> Box<dyn SortedIterator> {
    // Snapshot the current contents; the skip list is already sorted.
    let snapshot: Vec<(Bytes, Bytes)> = self
      .map
      .iter()
      .map(|entry| (entry.key().clone(), entry.value().clone()))
      .collect();
    Box::new(SkipStoreIterator {
      cursor: snapshot.len(),
      data: snapshot,
    })
  }

  fn path(&self) -> &Path {
    &self.path
  }
}

/// Iterator over a point-in-time snapshot of a `SkipStore`.
pub struct SkipStoreIterator {
  data: Vec<(Bytes, Bytes)>,
  cursor: usize,
}

impl SortedIterator for SkipStoreIterator {
  fn valid(&self) -> bool {
    self.cursor < self.data.len()
  }

  fn seek_to_first(&mut self) {
    self.cursor = 0;
  }

  fn seek_to_last(&mut self) {
    self.cursor = if self.data.is_empty() { 0 } else { self.data.len() - 1 };
  }

  fn seek(&mut self, target: &[u8]) {
    self.cursor = self.data.partition_point(|(k, _)| k.as_ref() < target);
  }

  fn next(&mut self) {
    debug_assert!(self.valid());
    self.cursor += 1;
  }

  fn prev(&mut self) {
    debug_assert!(self.valid());
    if self.cursor == 0 {
      self.cursor = self.data.len();
    } else {
      self.cursor -= 1;
    }
  }

  fn key(&self) -> &[u8] {
    debug_assert!(self.valid());
    &self.data[self.cursor].0
  }

  fn value(&self) -> &[u8] {
    debug_assert!(self.valid());
    &self.data[self.cursor].1
  }

  fn status(&self) -> Result<()> {
    Ok(())
  }
}

/// Default factory used by `Engine::open_default` and the tests.
pub struct SkipStoreFactory;

impl StoreFactory for SkipStoreFactory {
  fn open(&self, opts: StoreOptions, path: &Path) -> Result<Arc<dyn SortedStore>> {
    Ok(Arc::new(SkipStore::open(opts, path)?))
  }

  fn destroy(&self, path: &Path) -> Result<()> {
    if !path.is_dir() {
      return Ok(());
    }
    if let Err(e) = fs::remove_dir_all(path) {
      error!("failed to remove store directory {}: {}", path.display(), e);
      return Err(Errors::FailedToRemoveDatabaseDir);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn test_put_get_delete() {
    let dir = tempdir().unwrap();
    let store = SkipStore::open(StoreOptions::default(), dir.path()).unwrap();

    store.put(Bytes::from_static(b"k1"), Bytes::from_static(b"v1")).unwrap();
    store.put(Bytes::from_static(b"k2"), Bytes::from_static(b"v2")).unwrap();
    assert_eq!(store.get(b"k1").unwrap(), Bytes::from_static(b"v1"));
    assert_eq!(store.get(b"missing"), Err(Errors::KeyNotFound));

    store.delete(b"k1").unwrap();
    assert_eq!(store.get(b"k1"), Err(Errors::KeyNotFound));
    assert_eq!(store.delete(b"k1"), Err(Errors::KeyNotFound));
  }

  #[test]
  fn test_fixed_widths_enforced() {
    let dir = tempdir().unwrap();
    let store = SkipStore::open(
      StoreOptions {
        fixed_lengths: Some((4, 8)),
      },
      dir.path(),
    )
    .unwrap();

    assert_eq!(
      store.put(Bytes::from_static(b"abc"), Bytes::from_static(b"12345678")),
      Err(Errors::RecordLengthMismatch)
    );
    assert_eq!(
      store.put(Bytes::from_static(b"abcd"), Bytes::from_static(b"1234")),
      Err(Errors::RecordLengthMismatch)
    );
    store.put(Bytes::from_static(b"abcd"), Bytes::from_static(b"12345678")).unwrap();
  }

  #[test]
  fn test_iterator_sorted_and_seek() {
    let dir = tempdir().unwrap();
    let store = SkipStore::open(StoreOptions::default(), dir.path()).unwrap();
    for k in ["delta", "alpha", "charlie", "bravo"] {
      store
        .put(Bytes::copy_from_slice(k.as_bytes()), Bytes::from_static(b"v"))
        .unwrap();
    }

    let mut iter = store.iter();
    iter.seek_to_first();
    let mut keys = Vec::new();
    while iter.valid() {
      keys.push(String::from_utf8(iter.key().to_vec()).unwrap());
      iter.next();
    }
    assert_eq!(keys, vec!["alpha", "bravo", "charlie", "delta"]);

    iter.seek(b"bzz");
    assert!(iter.valid());
    assert_eq!(iter.key(), b"charlie");

    iter.seek_to_last();
    assert_eq!(iter.key(), b"delta");
    iter.prev();
    assert_eq!(iter.key(), b"charlie");
  }

  #[test]
  fn test_destroy_removes_directory() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("store");
    let factory = SkipStoreFactory;
    let store = factory.open(StoreOptions::default(), &store_path).unwrap();
    assert!(store_path.is_dir());
    drop(store);

    factory.destroy(&store_path).unwrap();
    assert!(!store_path.exists());

    // Destroying a missing directory is not an error.
    factory.destroy(&store_path).unwrap();
  }
}
