use crate::{
  errors::{Errors, Result},
  option::QuantizerOptions,
};

/// Identity of one fixed-width sub-store: both lengths are already
/// quantized to bucket boundaries. Ordering is (key_len, value_len)
/// ascending, which fixes the registry iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SizeBucket {
  pub key_len: usize,
  pub value_len: usize,
}

/// Rounds raw key/value sizes up to the bucket boundaries configured by
/// `QuantizerOptions`. A record matches only if both dimensions are in
/// range; anything else is routed to the fallback store by the caller.
#[derive(Debug, Clone)]
pub struct LengthQuantizer {
  min_key_size: usize,
  max_key_size: usize,
  key_interval_size: usize,
  key_boundary_cap: usize,
  min_value_size: usize,
  max_value_size: usize,
  value_interval_size: usize,
  value_boundary_cap: usize,
}

impl LengthQuantizer {
  pub fn new(opts: QuantizerOptions) -> Result<Self> {
    validate_dimension("key", opts.min_key_size, opts.max_key_size, opts.key_interval_size)?;
    validate_dimension(
      "value",
      opts.min_value_size,
      opts.max_value_size,
      opts.value_interval_size,
    )?;

    // The configured max stays the acceptance bound. It is additionally
    // rounded up to the nearest boundary reachable from min, so every
    // accepted size maps to a bucket that exists; the rounded cap never
    // widens acceptance.
    Ok(Self {
      min_key_size: opts.min_key_size,
      max_key_size: opts.max_key_size,
      key_interval_size: opts.key_interval_size,
      key_boundary_cap: round_up(opts.max_key_size, opts.min_key_size, opts.key_interval_size),
      min_value_size: opts.min_value_size,
      max_value_size: opts.max_value_size,
      value_interval_size: opts.value_interval_size,
      value_boundary_cap: round_up(opts.max_value_size, opts.min_value_size, opts.value_interval_size),
    })
  }

  /// Quantizes a raw key size, or `None` if it is outside the
  /// configured `[min, max]` acceptance range.
  pub fn match_key_size(&self, size: usize) -> Option<usize> {
    match_size(
      size,
      self.min_key_size,
      self.max_key_size,
      self.key_interval_size,
      self.key_boundary_cap,
    )
  }

  /// Quantizes a raw value size, or `None` if it is outside the
  /// configured `[min, max]` acceptance range.
  pub fn match_value_size(&self, size: usize) -> Option<usize> {
    match_size(
      size,
      self.min_value_size,
      self.max_value_size,
      self.value_interval_size,
      self.value_boundary_cap,
    )
  }

  /// Quantizes both dimensions at once. Placement of a key and its value
  /// is atomic: if either size is out of range the whole record is
  /// unmatched.
  pub fn match_sizes(&self, key_size: usize, value_size: usize) -> Option<SizeBucket> {
    let key_len = self.match_key_size(key_size)?;
    let value_len = self.match_value_size(value_size)?;
    Some(SizeBucket { key_len, value_len })
  }

  pub fn max_key_size(&self) -> usize {
    self.max_key_size
  }

  pub fn max_value_size(&self) -> usize {
    self.max_value_size
  }
}

fn validate_dimension(dim: &str, min: usize, max: usize, interval: usize) -> Result<()> {
  if min == 0 || max == 0 || interval == 0 {
    return Err(Errors::InvalidQuantizerConfig(format!(
      "{dim} sizes must be positive (min={min}, max={max}, interval={interval})"
    )));
  }
  if min > max {
    return Err(Errors::InvalidQuantizerConfig(format!(
      "{dim} min size {min} exceeds max size {max}"
    )));
  }
  Ok(())
}

fn round_up(size: usize, min: usize, interval: usize) -> usize {
  min + (size - min).div_ceil(interval) * interval
}

fn match_size(size: usize, min: usize, max: usize, interval: usize, cap: usize) -> Option<usize> {
  if size < min || size > max {
    return None;
  }
  let matched = round_up(size, min, interval);
  debug_assert!(matched <= cap);
  Some(matched)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn opts(min_k: usize, max_k: usize, int_k: usize, min_v: usize, max_v: usize, int_v: usize) -> QuantizerOptions {
    QuantizerOptions {
      min_key_size: min_k,
      max_key_size: max_k,
      key_interval_size: int_k,
      min_value_size: min_v,
      max_value_size: max_v,
      value_interval_size: int_v,
    }
  }

  #[test]
  fn test_match_formula() {
    let q = LengthQuantizer::new(opts(16, 512, 16, 16, 512, 16)).unwrap();

    for size in 16..=512 {
      let expect = 16 + (size - 16usize).div_ceil(16) * 16;
      assert_eq!(q.match_key_size(size), Some(expect));
      assert!(expect <= q.max_key_size());
    }

    assert_eq!(q.match_key_size(16), Some(16));
    assert_eq!(q.match_key_size(17), Some(32));
    assert_eq!(q.match_key_size(32), Some(32));
    assert_eq!(q.match_value_size(511), Some(512));
  }

  #[test]
  fn test_out_of_range_is_unmatched() {
    let q = LengthQuantizer::new(opts(16, 512, 16, 16, 512, 16)).unwrap();

    assert_eq!(q.match_key_size(15), None);
    assert_eq!(q.match_key_size(513), None);
    assert_eq!(q.match_value_size(1), None);
    assert_eq!(q.match_value_size(1000), None);

    // One out-of-range dimension unmatches the whole record.
    assert_eq!(q.match_sizes(64, 600), None);
    assert_eq!(q.match_sizes(600, 64), None);
    assert!(q.match_sizes(64, 64).is_some());
  }

  #[test]
  fn test_monotonic_rounding() {
    let q = LengthQuantizer::new(opts(99, 512, 30, 99, 512, 30)).unwrap();

    let mut last = 0;
    for size in 99..=512 {
      let matched = q.match_key_size(size).unwrap();
      assert!(matched >= last);
      assert!(matched >= size);
      last = matched;
    }
  }

  #[test]
  fn test_max_rounded_to_boundary() {
    // 512 is not reachable from 99 by multiples of 30, so the top
    // bucket boundary rounds up to 519 and in-range sizes near the max
    // still have a bucket to land in.
    let q = LengthQuantizer::new(opts(99, 512, 30, 99, 512, 30)).unwrap();
    assert_eq!(q.max_key_size(), 512);
    assert_eq!(q.match_key_size(512), Some(519));
    assert_eq!(q.match_value_size(512), Some(519));

    // Sizes above the configured max stay unmatched even though the
    // rounded boundary would cover them.
    for size in 513..=519 {
      assert_eq!(q.match_key_size(size), None);
      assert_eq!(q.match_value_size(size), None);
    }
    assert_eq!(q.match_key_size(520), None);
  }

  #[test]
  fn test_invalid_config_rejected() {
    let res = LengthQuantizer::new(opts(0, 512, 16, 16, 512, 16));
    assert!(matches!(res, Err(Errors::InvalidQuantizerConfig(_))));

    let res = LengthQuantizer::new(opts(16, 512, 0, 16, 512, 16));
    assert!(matches!(res, Err(Errors::InvalidQuantizerConfig(_))));

    let res = LengthQuantizer::new(opts(16, 512, 16, 128, 64, 16));
    assert!(matches!(res, Err(Errors::InvalidQuantizerConfig(_))));
  }

  #[test]
  fn test_bucket_ordering() {
    let a = SizeBucket { key_len: 16, value_len: 32 };
    let b = SizeBucket { key_len: 16, value_len: 48 };
    let c = SizeBucket { key_len: 32, value_len: 16 };
    assert!(a < b);
    assert!(b < c);
  }
}
