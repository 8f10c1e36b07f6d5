use std::cmp::Ordering;

use crate::errors::Result;

/// The ordered-iterator contract shared by every sorted data source:
/// fixed-record blocks, sub-store snapshots, and the merged view.
pub trait SortedIterator: Send {
  /// Returns true when the cursor is positioned at an entry.
  fn valid(&self) -> bool;

  fn seek_to_first(&mut self);

  fn seek_to_last(&mut self);

  /// Positions the cursor at the first entry with key >= target.
  fn seek(&mut self, target: &[u8]);

  fn next(&mut self);

  fn prev(&mut self);

  /// Current key. Only valid when valid() is true.
  fn key(&self) -> &[u8];

  /// Current value. Only valid when valid() is true.
  fn value(&self) -> &[u8];

  /// First error seen by the underlying source, if any. Exhaustion is
  /// not an error: a fully consumed iterator still reports Ok.
  fn status(&self) -> Result<()>;
}

/// Presents many sorted children as one logical sequence.
///
/// Positioning operations move every child, then select the first valid
/// child in registration order. Ties between children holding equal keys
/// are therefore broken by registration order, never by recency; the
/// router registers bucket stores in ascending bucket order and the
/// fallback last, which makes the shadow-scan order explicit.
pub struct MergeIterator {
  children: Vec<Box<dyn SortedIterator>>,
  current: usize,
}

impl MergeIterator {
  pub fn new(children: Vec<Box<dyn SortedIterator>>) -> Self {
    let mut iter = Self { children, current: 0 };
    iter.seek_to_first();
    iter
  }

  fn skip_forward(&mut self) {
    while self.current + 1 < self.children.len() && !self.children[self.current].valid() {
      self.current += 1;
    }
  }

  fn skip_backward(&mut self) {
    while self.current > 0 && !self.children[self.current].valid() {
      self.current -= 1;
    }
  }
}

impl SortedIterator for MergeIterator {
  fn valid(&self) -> bool {
    self.current < self.children.len() && self.children[self.current].valid()
  }

  fn seek_to_first(&mut self) {
    for child in self.children.iter_mut() {
      child.seek_to_first();
    }
    self.current = 0;
    self.skip_forward();
  }

  fn seek_to_last(&mut self) {
    for child in self.children.iter_mut() {
      child.seek_to_last();
    }
    self.current = self.children.len().saturating_sub(1);
    self.skip_backward();
  }

  fn seek(&mut self, target: &[u8]) {
    for child in self.children.iter_mut() {
      child.seek(target);
    }
    self.current = 0;
    self.skip_forward();
  }

  fn next(&mut self) {
    if self.valid() {
      self.children[self.current].next();
      self.skip_forward();
    }
  }

  fn prev(&mut self) {
    if self.valid() {
      self.children[self.current].prev();
      self.skip_backward();
    }
  }

  fn key(&self) -> &[u8] {
    debug_assert!(self.valid());
    self.children[self.current].key()
  }

  fn value(&self) -> &[u8] {
    debug_assert!(self.valid());
    self.children[self.current].value()
  }

  fn status(&self) -> Result<()> {
    for child in self.children.iter() {
      child.status()?;
    }
    Ok(())
  }
}

/// Merges two sorted runs into one sorted output stream.
///
/// On a key tie the second source's record is emitted and both sources
/// advance: when two table segments contain the same key, the second
/// segment shadows the first. Table-merge tooling relies on this rule
/// for its overwrite semantics, so it must not change.
pub fn merge_sorted<F>(
  first: &mut dyn SortedIterator,
  second: &mut dyn SortedIterator,
  mut emit: F,
) -> Result<()>
where
  F: FnMut(&[u8], &[u8]) -> Result<()>,
{
  first.seek_to_first();
  second.seek_to_first();

  while first.valid() && second.valid() {
    match first.key().cmp(second.key()) {
      Ordering::Less => {
        emit(first.key(), first.value())?;
        first.next();
      }
      Ordering::Greater => {
        emit(second.key(), second.value())?;
        second.next();
      }
      Ordering::Equal => {
        emit(second.key(), second.value())?;
        first.next();
        second.next();
      }
    }
  }

  while first.valid() {
    emit(first.key(), first.value())?;
    first.next();
  }

  while second.valid() {
    emit(second.key(), second.value())?;
    second.next();
  }

  first.status()?;
  second.status()?;

  Ok(())
}
