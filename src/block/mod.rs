pub mod builder;

use bytes::Bytes;

use crate::{
  errors::{Errors, Result},
  iterator::SortedIterator,
};

pub use builder::FixedBlockBuilder;

/// An immutable block of uniform-width records, sorted ascending by key.
///
/// The widths are not embedded in the block bytes; the enclosing
/// segment's metadata must carry them. That is the trade this format
/// makes: no header, no restart-point index, and O(log n) seeks by plain
/// offset arithmetic.
pub struct FixedBlock {
  data: Bytes,
  key_len: usize,
  value_len: usize,
  num_entries: usize,
}

impl FixedBlock {
  pub fn new(data: Bytes, key_len: usize, value_len: usize) -> Result<Self> {
    if key_len == 0 || value_len == 0 {
      return Err(Errors::CorruptedBlock);
    }
    let width = key_len + value_len;
    if data.len() % width != 0 {
      return Err(Errors::CorruptedBlock);
    }

    let num_entries = data.len() / width;
    Ok(Self {
      data,
      key_len,
      value_len,
      num_entries,
    })
  }

  pub fn num_entries(&self) -> usize {
    self.num_entries
  }

  pub fn size(&self) -> usize {
    self.data.len()
  }

  pub fn iter(&self) -> FixedBlockIterator {
    FixedBlockIterator {
      data: self.data.clone(),
      key_len: self.key_len,
      value_len: self.value_len,
      num_entries: self.num_entries,
      cursor: 0,
    }
  }
}

/// Cursor over a `FixedBlock`. The cursor is a record index in
/// `[0, num_entries]`; `num_entries` marks exhaustion.
pub struct FixedBlockIterator {
  data: Bytes,
  key_len: usize,
  value_len: usize,
  num_entries: usize,
  cursor: usize,
}

impl FixedBlockIterator {
  fn width(&self) -> usize {
    self.key_len + self.value_len
  }

  fn key_at(&self, index: usize) -> &[u8] {
    let offset = index * self.width();
    &self.data[offset..offset + self.key_len]
  }
}

impl SortedIterator for FixedBlockIterator {
  fn valid(&self) -> bool {
    self.cursor < self.num_entries
  }

  fn seek_to_first(&mut self) {
    self.cursor = 0;
  }

  fn seek_to_last(&mut self) {
    self.cursor = if self.num_entries == 0 {
      0
    } else {
      self.num_entries - 1
    };
  }

  /// Binary search for the left-most record with key >= target. One
  /// fixed-width slice comparison per probe, no entry decoding.
  fn seek(&mut self, target: &[u8]) {
    let mut left = 0;
    let mut right = self.num_entries;
    while left < right {
      let mid = left + (right - left) / 2;
      if self.key_at(mid) < target {
        left = mid + 1;
      } else {
        right = mid;
      }
    }
    self.cursor = left;
  }

  fn next(&mut self) {
    debug_assert!(self.valid());
    self.cursor += 1;
  }

  fn prev(&mut self) {
    debug_assert!(self.valid());
    if self.cursor == 0 {
      self.cursor = self.num_entries;
    } else {
      self.cursor -= 1;
    }
  }

  fn key(&self) -> &[u8] {
    debug_assert!(self.valid());
    self.key_at(self.cursor)
  }

  fn value(&self) -> &[u8] {
    debug_assert!(self.valid());
    let offset = self.cursor * self.width() + self.key_len;
    &self.data[offset..offset + self.value_len]
  }

  fn status(&self) -> Result<()> {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::Rng;

  fn build_block(records: &[(&[u8], &[u8])], key_len: usize, value_len: usize) -> FixedBlock {
    let mut builder = FixedBlockBuilder::new(key_len, value_len);
    for (k, v) in records {
      builder.add(k, v).unwrap();
    }
    FixedBlock::new(builder.finish(), key_len, value_len).unwrap()
  }

  fn sample_records(n: usize, key_len: usize, value_len: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..n)
      .map(|i| {
        let key = format!("{i:0width$}", width = key_len).into_bytes();
        let value = vec![b'a' + (i % 26) as u8; value_len];
        (key, value)
      })
      .collect()
  }

  #[test]
  fn test_block_rejects_misaligned_data() {
    let res = FixedBlock::new(Bytes::from_static(b"abcde"), 2, 2);
    assert!(matches!(res, Err(Errors::CorruptedBlock)));

    let res = FixedBlock::new(Bytes::from_static(b"abcd"), 0, 4);
    assert!(matches!(res, Err(Errors::CorruptedBlock)));

    let block = FixedBlock::new(Bytes::from_static(b"abcdabcd"), 2, 2).unwrap();
    assert_eq!(block.num_entries(), 2);
  }

  #[test]
  fn test_forward_and_backward_scan() {
    let records = sample_records(100, 8, 16);
    let refs: Vec<(&[u8], &[u8])> = records.iter().map(|(k, v)| (k.as_slice(), v.as_slice())).collect();
    let block = build_block(&refs, 8, 16);
    assert_eq!(block.num_entries(), 100);

    let mut iter = block.iter();
    iter.seek_to_first();
    let mut forward = Vec::new();
    while iter.valid() {
      forward.push((iter.key().to_vec(), iter.value().to_vec()));
      iter.next();
    }
    assert_eq!(forward.len(), 100);
    for (i, (k, v)) in forward.iter().enumerate() {
      assert_eq!(k, &records[i].0);
      assert_eq!(v, &records[i].1);
    }

    iter.seek_to_last();
    let mut backward = Vec::new();
    while iter.valid() {
      backward.push(iter.key().to_vec());
      iter.prev();
    }
    assert_eq!(backward.len(), 100);
    for (i, k) in backward.iter().enumerate() {
      assert_eq!(k, &records[99 - i].0);
    }
  }

  #[test]
  fn test_seek_matches_linear_lower_bound() {
    let records = sample_records(500, 8, 4);
    let refs: Vec<(&[u8], &[u8])> = records.iter().map(|(k, v)| (k.as_slice(), v.as_slice())).collect();
    let block = build_block(&refs, 8, 4);
    let mut iter = block.iter();

    let mut rng = rand::rng();
    for _ in 0..1000 {
      let probe = format!("{:08}", rng.random_range(0..1000usize)).into_bytes();

      let expected = records.iter().position(|(k, _)| k.as_slice() >= probe.as_slice());
      iter.seek(&probe);
      match expected {
        Some(pos) => {
          assert!(iter.valid());
          assert_eq!(iter.key(), records[pos].0.as_slice());
        }
        None => assert!(!iter.valid()),
      }
    }
  }

  #[test]
  fn test_seek_boundaries() {
    let records = sample_records(10, 8, 4);
    let refs: Vec<(&[u8], &[u8])> = records.iter().map(|(k, v)| (k.as_slice(), v.as_slice())).collect();
    let block = build_block(&refs, 8, 4);
    let mut iter = block.iter();

    // Below the first key lands on index 0.
    iter.seek(b"00000000");
    assert!(iter.valid());
    assert_eq!(iter.key(), records[0].0.as_slice());

    // Past the last key invalidates the cursor.
    iter.seek(b"99999999");
    assert!(!iter.valid());
    assert!(iter.status().is_ok());
  }

  #[test]
  fn test_empty_block() {
    let block = FixedBlock::new(Bytes::new(), 4, 4).unwrap();
    assert_eq!(block.num_entries(), 0);
    let mut iter = block.iter();
    iter.seek_to_first();
    assert!(!iter.valid());
    iter.seek_to_last();
    assert!(!iter.valid());
    iter.seek(b"zzzz");
    assert!(!iter.valid());
  }
}
