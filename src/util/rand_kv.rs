use bytes::Bytes;
use rand::Rng;

/// Deterministic test key of a stable, in-range size.
pub fn get_test_key(i: usize) -> Bytes {
  Bytes::from(format!("fixkv-key-{:09}", i))
}

/// Deterministic test value of a stable, in-range size.
pub fn get_test_value(i: usize) -> Bytes {
  Bytes::from(format!("fixkv-value-{:09}", i))
}

/// Random printable bytes of an exact length. Never ends with the pad
/// byte, so padded round trips stay comparable.
pub fn rand_bytes_of_len(len: usize) -> Bytes {
  let mut rng = rand::rng();
  let data: Vec<u8> = (0..len).map(|_| rng.random_range(b'!'..=b'~')).collect();
  Bytes::from(data)
}

/// Random bytes with a length drawn uniformly from `[min_len, max_len]`.
pub fn rand_bytes_in_range(min_len: usize, max_len: usize) -> Bytes {
  let mut rng = rand::rng();
  let len = rng.random_range(min_len..=max_len);
  rand_bytes_of_len(len)
}
