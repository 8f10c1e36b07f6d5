use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Errors {
  #[error("the key is empty")]
  KeyIsEmpty,

  #[error("key not found in database")]
  KeyNotFound,

  #[error("invalid quantizer config: {0}")]
  InvalidQuantizerConfig(String),

  #[error("record length does not match the store's fixed width")]
  RecordLengthMismatch,

  #[error("cannot add to a finished block builder")]
  BlockAlreadyFinished,

  #[error("block size is not a multiple of the record width")]
  CorruptedBlock,

  #[error("table input iterator is not in sorted unique-key order")]
  TableInputNotSorted,

  #[error("cannot merge tables with different record widths")]
  TableWidthMismatch,

  #[error("batch writes are not supported")]
  BatchNotSupported,

  #[error("the engine is closed")]
  EngineClosed,

  #[error("failed to create the database directory")]
  FailedToCreateDatabaseDir,

  #[error("failed to remove the database directory")]
  FailedToRemoveDatabaseDir,
}

pub type Result<T> = std::result::Result<T, Errors>;
