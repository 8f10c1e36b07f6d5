use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{Errors, Result};

/// Builds one block of uniform-width records.
///
/// Records are the bare concatenation of key bytes and value bytes: no
/// per-record length header, no shared-prefix metadata, no delimiters.
/// The builder does not sort; callers must add records in sorted,
/// unique-key order.
pub struct FixedBlockBuilder {
  buffer: BytesMut,
  key_len: usize,
  value_len: usize,
  num_entries: usize,
  finished: bool,
}

impl FixedBlockBuilder {
  pub fn new(key_len: usize, value_len: usize) -> Self {
    Self {
      buffer: BytesMut::new(),
      key_len,
      value_len,
      num_entries: 0,
      finished: false,
    }
  }

  /// Appends one record. Both slices must match the configured widths
  /// exactly; padding is the router's job, not the builder's.
  pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
    if self.finished {
      return Err(Errors::BlockAlreadyFinished);
    }
    if key.len() != self.key_len || value.len() != self.value_len {
      return Err(Errors::RecordLengthMismatch);
    }

    self.buffer.put_slice(key);
    self.buffer.put_slice(value);
    self.num_entries += 1;
    Ok(())
  }

  /// Freezes the buffer and returns the block bytes. No further `add` is
  /// permitted until `reset`.
  pub fn finish(&mut self) -> Bytes {
    self.finished = true;
    self.buffer.split().freeze()
  }

  pub fn reset(&mut self) {
    self.buffer.clear();
    self.num_entries = 0;
    self.finished = false;
  }

  pub fn is_empty(&self) -> bool {
    self.num_entries == 0
  }

  pub fn num_entries(&self) -> usize {
    self.num_entries
  }

  pub fn size_estimate(&self) -> usize {
    self.buffer.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builder_appends_raw_records() {
    let mut builder = FixedBlockBuilder::new(4, 2);
    builder.add(b"aaaa", b"11").unwrap();
    builder.add(b"bbbb", b"22").unwrap();
    assert_eq!(builder.num_entries(), 2);
    assert_eq!(builder.size_estimate(), 12);

    let data = builder.finish();
    assert_eq!(&data[..], b"aaaa11bbbb22");
  }

  #[test]
  fn test_builder_rejects_wrong_widths() {
    let mut builder = FixedBlockBuilder::new(4, 2);
    assert_eq!(builder.add(b"aaa", b"11"), Err(Errors::RecordLengthMismatch));
    assert_eq!(builder.add(b"aaaa", b"123"), Err(Errors::RecordLengthMismatch));
    assert!(builder.is_empty());
  }

  #[test]
  fn test_builder_rejects_add_after_finish() {
    let mut builder = FixedBlockBuilder::new(4, 2);
    builder.add(b"aaaa", b"11").unwrap();
    let _ = builder.finish();
    assert_eq!(builder.add(b"bbbb", b"22"), Err(Errors::BlockAlreadyFinished));

    builder.reset();
    builder.add(b"cccc", b"33").unwrap();
    assert_eq!(&builder.finish()[..], b"cccc33");
  }
}
