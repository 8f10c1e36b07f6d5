use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use log::error;
use parking_lot::RwLock;

use crate::{
  errors::{Errors, Result},
  iterator::{MergeIterator, SortedIterator},
  option::Options,
  quantizer::{LengthQuantizer, SizeBucket},
  store::{skipstore::SkipStoreFactory, SortedStore, StoreFactory, StoreOptions},
};

/// Filler byte appended to keys and values to reach a bucket's fixed
/// width. Padding only appends past the original content, so it never
/// reorders keys that already differ within their unpadded length.
pub const PAD_BYTE: u8 = 0x20;

const FALLBACK_DIR_NAME: &str = "fallback";

/// The size-class router: quantizes each record's (key, value) lengths,
/// pads it to the matched bucket's fixed widths, and delegates to the
/// sub-store dedicated to that bucket. Records whose sizes fall outside
/// the configured ranges go to the variable-length fallback store.
///
/// Known semantic gap, kept on purpose: a key rewritten with a value of
/// a different length class lands in a different bucket, and the stale
/// copy in the old bucket is neither migrated nor deleted. Reads scan
/// candidate buckets in ascending value-length order and return the
/// first hit, which is not necessarily the most recent write. See the
/// shadow-write tests below, which pin this behavior.
pub struct Engine {
  options: Options,
  quantizer: LengthQuantizer,
  factory: Box<dyn StoreFactory>,
  fallback: Arc<dyn SortedStore>,

  /// Bucket identity -> open sub-store, ascending bucket order.
  stores: RwLock<BTreeMap<SizeBucket, Arc<dyn SortedStore>>>,
  /// Matched key length -> value-length classes seen for it, ascending.
  /// This index makes the get/delete scan order explicit instead of an
  /// accident of map iteration.
  classes: RwLock<BTreeMap<usize, Vec<usize>>>,

  closed: AtomicBool,
}

/// Snapshot of the engine's registry, in the spirit of an engine stat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
  pub num_bucket_stores: usize,
  pub num_key_length_classes: usize,
}

impl Engine {
  /// Opens a router with the given sub-store factory. Fails up front on
  /// malformed quantizer bounds; nothing is discovered per-operation.
  pub fn open(options: Options, factory: Box<dyn StoreFactory>) -> Result<Self> {
    let quantizer = LengthQuantizer::new(options.quantizer.clone())?;

    if let Err(e) = fs::create_dir_all(&options.dir_path) {
      error!("failed to create database directory {}: {}", options.dir_path.display(), e);
      return Err(Errors::FailedToCreateDatabaseDir);
    }

    let fallback_path = options.dir_path.join(FALLBACK_DIR_NAME);
    let fallback = factory.open(StoreOptions { fixed_lengths: None }, &fallback_path)?;

    Ok(Self {
      options,
      quantizer,
      factory,
      fallback,
      stores: RwLock::new(BTreeMap::new()),
      classes: RwLock::new(BTreeMap::new()),
      closed: AtomicBool::new(false),
    })
  }

  /// Opens a router backed by the bundled skip-list engine.
  pub fn open_default(options: Options) -> Result<Self> {
    Self::open(options, Box::new(SkipStoreFactory))
  }

  pub fn put(&self, key: Bytes, value: Bytes) -> Result<()> {
    self.check_open()?;
    if key.is_empty() {
      return Err(Errors::KeyIsEmpty);
    }

    match self.quantizer.match_sizes(key.len(), value.len()) {
      Some(bucket) => {
        let store = self.get_or_create(bucket)?;
        store.put(pad_to(key, bucket.key_len), pad_to(value, bucket.value_len))
      }
      // Unmatched is a routing signal, not an error.
      None => self.fallback.put(key, value),
    }
  }

  /// Looks a key up across every bucket of its key-length class, in
  /// ascending value-length order, then falls back to the variable
  /// store. Trailing pad bytes are trimmed from bucket-store values so a
  /// round trip returns exactly the bytes that were written.
  pub fn get(&self, key: &[u8]) -> Result<Bytes> {
    self.check_open()?;
    if key.is_empty() {
      return Err(Errors::KeyIsEmpty);
    }

    let Some(matched) = self.quantizer.match_key_size(key.len()) else {
      return self.fallback.get(key);
    };

    for bucket in self.candidates(matched) {
      let Some(store) = self.stores.read().get(&bucket).cloned() else {
        continue;
      };
      let probe = pad_to(Bytes::copy_from_slice(key), bucket.key_len);
      match store.get(&probe) {
        Ok(value) => return Ok(trim_padding(value)),
        Err(Errors::KeyNotFound) => continue,
        Err(e) => return Err(e),
      }
    }

    self.fallback.get(key)
  }

  /// Deletes a key from the first bucket of its key-length class that
  /// holds it, then stops. A key shadow-written into several buckets is
  /// not fully purged by one call.
  pub fn delete(&self, key: &[u8]) -> Result<()> {
    self.check_open()?;
    if key.is_empty() {
      return Err(Errors::KeyIsEmpty);
    }

    let Some(matched) = self.quantizer.match_key_size(key.len()) else {
      return self.fallback.delete(key);
    };

    for bucket in self.candidates(matched) {
      let Some(store) = self.stores.read().get(&bucket).cloned() else {
        continue;
      };
      let probe = pad_to(Bytes::copy_from_slice(key), bucket.key_len);
      match store.get(&probe) {
        Ok(_) => return store.delete(&probe),
        Err(Errors::KeyNotFound) => continue,
        Err(e) => return Err(e),
      }
    }

    self.fallback.delete(key)
  }

  /// Atomic multi-key batches are not supported by this layer and fail
  /// immediately rather than degrading silently.
  pub fn write_batch(&self, _entries: Vec<(Bytes, Bytes)>) -> Result<()> {
    Err(Errors::BatchNotSupported)
  }

  /// One iterator per open sub-store, composed into a merged view.
  /// Bucket stores register in ascending bucket order, the fallback
  /// last; duplicate keys across stores resolve by that order. After
  /// `close` the merged view is empty.
  pub fn iter(&self) -> MergeIterator {
    let mut children: Vec<Box<dyn SortedIterator>> = Vec::new();
    if self.closed.load(Ordering::SeqCst) {
      return MergeIterator::new(children);
    }
    for store in self.stores.read().values() {
      children.push(store.iter());
    }
    children.push(self.fallback.iter());
    MergeIterator::new(children)
  }

  pub fn stat(&self) -> Stat {
    Stat {
      num_bucket_stores: self.stores.read().len(),
      num_key_length_classes: self.classes.read().len(),
    }
  }

  /// Destroys every bucket store and the fallback store, then empties
  /// the registry. Closing is idempotent; subsequent put/get/delete
  /// calls fail with `Errors::EngineClosed`.
  pub fn close(&self) -> Result<()> {
    if self.closed.swap(true, Ordering::SeqCst) {
      return Ok(());
    }

    let mut first_err = None;
    let mut stores = self.stores.write();
    for store in stores.values() {
      if let Err(e) = self.factory.destroy(store.path()) {
        error!("failed to destroy bucket store {}: {}", store.path().display(), e);
        first_err.get_or_insert(e);
      }
    }
    stores.clear();
    self.classes.write().clear();

    if let Err(e) = self.factory.destroy(self.fallback.path()) {
      error!("failed to destroy fallback store: {}", e);
      first_err.get_or_insert(e);
    }

    match first_err {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }

  fn check_open(&self) -> Result<()> {
    if self.closed.load(Ordering::SeqCst) {
      return Err(Errors::EngineClosed);
    }
    Ok(())
  }

  /// Returns the open store for `bucket`, opening and registering it on
  /// first use. The check-then-create sequence is double-checked under
  /// the write lock, so concurrent first-writes open exactly one store.
  fn get_or_create(&self, bucket: SizeBucket) -> Result<Arc<dyn SortedStore>> {
    if let Some(store) = self.stores.read().get(&bucket) {
      return Ok(store.clone());
    }

    let mut stores = self.stores.write();
    if let Some(store) = stores.get(&bucket) {
      return Ok(store.clone());
    }

    let path = bucket_path(&self.options.dir_path, bucket);
    let store = self.factory.open(
      StoreOptions {
        fixed_lengths: Some((bucket.key_len, bucket.value_len)),
      },
      &path,
    )?;
    stores.insert(bucket, store.clone());

    let mut classes = self.classes.write();
    let value_lens = classes.entry(bucket.key_len).or_default();
    if let Err(pos) = value_lens.binary_search(&bucket.value_len) {
      value_lens.insert(pos, bucket.value_len);
    }

    Ok(store)
  }

  fn candidates(&self, matched_key_len: usize) -> Vec<SizeBucket> {
    let classes = self.classes.read();
    match classes.get(&matched_key_len) {
      Some(value_lens) => value_lens
        .iter()
        .map(|&value_len| SizeBucket {
          key_len: matched_key_len,
          value_len,
        })
        .collect(),
      None => Vec::new(),
    }
  }
}

impl Drop for Engine {
  fn drop(&mut self) {
    if !self.closed.load(Ordering::SeqCst) {
      if let Err(e) = self.close() {
        error!("failed to close engine on drop: {}", e);
      }
    }
  }
}

fn bucket_path(root: &Path, bucket: SizeBucket) -> PathBuf {
  root.join(format!("bucket_{}_{}", bucket.key_len, bucket.value_len))
}

fn pad_to(data: Bytes, width: usize) -> Bytes {
  if data.len() >= width {
    return data;
  }
  let mut padded = BytesMut::with_capacity(width);
  padded.put_slice(&data);
  padded.resize(width, PAD_BYTE);
  padded.freeze()
}

fn trim_padding(value: Bytes) -> Bytes {
  let mut end = value.len();
  while end > 0 && value[end - 1] == PAD_BYTE {
    end -= 1;
  }
  value.slice(..end)
}
