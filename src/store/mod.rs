pub mod skipstore;

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::{errors::Result, iterator::SortedIterator};

/// Per-store configuration passed at open time.
///
/// Bucket stores carry `Some((key_len, value_len))` and hold only records
/// of exactly that width; the fallback store carries `None` and accepts
/// records of any size.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
  pub fixed_lengths: Option<(usize, usize)>,
}

/// The embedded ordered key-value engine consumed by the router. The
/// router never looks inside: memtables, compaction, WAL and recovery
/// all belong to the engine behind this contract.
pub trait SortedStore: Send + Sync {
  fn put(&self, key: Bytes, value: Bytes) -> Result<()>;

  /// Returns `Errors::KeyNotFound` on a miss.
  fn get(&self, key: &[u8]) -> Result<Bytes>;

  /// Returns `Errors::KeyNotFound` when the key does not exist.
  fn delete(&self, key: &[u8]) -> Result<()>;

  /// A sorted iterator over the store's current contents.
  fn iter(&self) -> Box<dyn SortedIterator>;

  /// The storage directory this store was opened at.
  fn path(&self) -> &Path;
}

/// Opens and destroys store instances. The router goes through a factory
/// so tests can substitute counting or failing engines.
pub trait StoreFactory: Send + Sync {
  fn open(&self, opts: StoreOptions, path: &Path) -> Result<Arc<dyn SortedStore>>;

  /// Removes the store's on-disk directory.
  fn destroy(&self, path: &Path) -> Result<()>;
}
