use bytes::Bytes;

use crate::{
  block::{FixedBlock, FixedBlockBuilder, FixedBlockIterator},
  errors::{Errors, Result},
  iterator::{merge_sorted, SortedIterator},
};

/// Out-of-band schema for a fixed-record segment. The block bytes carry
/// no header, so the widths must travel here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMeta {
  pub key_len: usize,
  pub value_len: usize,
  pub num_entries: usize,
}

/// One immutable fixed-record table segment: the block bytes plus the
/// metadata needed to decode them.
pub struct FixedTable {
  pub meta: TableMeta,
  pub data: Bytes,
}

impl FixedTable {
  pub fn iter(&self) -> Result<FixedBlockIterator> {
    let block = FixedBlock::new(self.data.clone(), self.meta.key_len, self.meta.value_len)?;
    Ok(block.iter())
  }
}

/// Drains a sorted iterator into one fixed-record segment. The input
/// must already be in ascending unique-key order; the builder never
/// sorts.
pub fn build_table(
  iter: &mut dyn SortedIterator,
  key_len: usize,
  value_len: usize,
) -> Result<FixedTable> {
  let mut builder = FixedBlockBuilder::new(key_len, value_len);

  let mut last_key: Option<Vec<u8>> = None;
  iter.seek_to_first();
  while iter.valid() {
    if let Some(prev) = &last_key {
      if iter.key() <= prev.as_slice() {
        return Err(Errors::TableInputNotSorted);
      }
    }
    builder.add(iter.key(), iter.value())?;
    last_key = Some(iter.key().to_vec());
    iter.next();
  }
  iter.status()?;

  let meta = TableMeta {
    key_len,
    value_len,
    num_entries: builder.num_entries(),
  };
  Ok(FixedTable {
    meta,
    data: builder.finish(),
  })
}

/// Merges two segments of the same record width into one. A key present
/// in both segments resolves to the second segment's record; that is the
/// shadow rule compaction tooling depends on.
pub fn merge_tables(first: &FixedTable, second: &FixedTable) -> Result<FixedTable> {
  if first.meta.key_len != second.meta.key_len || first.meta.value_len != second.meta.value_len {
    return Err(Errors::TableWidthMismatch);
  }

  let mut a = first.iter()?;
  let mut b = second.iter()?;
  let mut builder = FixedBlockBuilder::new(first.meta.key_len, first.meta.value_len);
  merge_sorted(&mut a, &mut b, |key, value| builder.add(key, value))?;

  let meta = TableMeta {
    key_len: first.meta.key_len,
    value_len: first.meta.value_len,
    num_entries: builder.num_entries(),
  };
  Ok(FixedTable {
    meta,
    data: builder.finish(),
  })
}

/// In-memory sorted iterator over owned pairs. Callers must supply pairs
/// in ascending key order. Used by the table tooling tests and benches.
pub struct VecIter {
  data: Vec<(Bytes, Bytes)>,
  cursor: usize,
}

impl VecIter {
  pub fn new(data: Vec<(Bytes, Bytes)>) -> Self {
    debug_assert!(data.windows(2).all(|w| w[0].0 <= w[1].0));
    Self { data, cursor: 0 }
  }
}

impl SortedIterator for VecIter {
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
