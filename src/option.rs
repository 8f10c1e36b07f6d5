use lazy_static::lazy_static;
use std::path::PathBuf;

lazy_static! {
  pub static ref DEFAULT_DIR_PATH: PathBuf = std::env::temp_dir().join("fixkv");
}

#[derive(Debug, Clone)]
pub struct Options {
  pub dir_path: PathBuf,

  pub quantizer: QuantizerOptions,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      dir_path: DEFAULT_DIR_PATH.clone(),
      quantizer: QuantizerOptions::default(),
    }
  }
}

/// Operator-facing size-class bounds. All six sizes must be positive and
/// `min <= max` per dimension; `Engine::open` rejects anything else.
#[derive(Debug, Clone)]
pub struct QuantizerOptions {
  pub min_key_size: usize,

  pub max_key_size: usize,

  pub key_interval_size: usize,

  pub min_value_size: usize,

  pub max_value_size: usize,

  pub value_interval_size: usize,
}

impl Default for QuantizerOptions {
  fn default() -> Self {
    Self {
      min_key_size: 16,
      max_key_size: 512,
      key_interval_size: 16,
      min_value_size: 16,
      max_value_size: 512,
      value_interval_size: 16,
    }
  }
}
