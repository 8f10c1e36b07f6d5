//! FixKV: a size-class sharding storage layer over embedded ordered
//! key-value stores.
//!
//! When most records in a workload cluster into a few (key-length,
//! value-length) pairs, routing each record into a sub-store whose
//! records all share one fixed width unlocks a specialized block format:
//! no per-record length headers, no prefix-compression metadata, no
//! delimiters. Lookups become offset arithmetic instead of varint
//! decoding.
//!
//! # Components
//!
//! * A length quantizer that rounds raw key/value sizes up to configured
//!   bucket boundaries, or reports them unmatched.
//! * A router that lazily opens one sub-store per bucket, pads records
//!   to the bucket widths, and reconciles reads and deletes across
//!   candidate buckets, with a variable-length fallback store for
//!   everything unmatched.
//! * The fixed-record block format (builder plus binary-search cursor)
//!   used by fixed-bucket table building and offline merge tooling.
//! * A merge iterator that presents all sub-stores as one logical
//!   ordered key space.
//!
//! # Basic Usage
//!
//! ```
//! use bytes::Bytes;
//! use fixkv::{db::Engine, option::Options};
//!
//! let mut opts = Options::default();
//! opts.dir_path = std::env::temp_dir().join("fixkv-doc");
//! let engine = Engine::open_default(opts).expect("failed to open fixkv engine");
//!
//! let key = Bytes::from(b"doc-example-key!".to_vec());
//! let value = Bytes::from(b"doc-example-value".to_vec());
//! engine.put(key.clone(), value.clone()).expect("failed to put");
//!
//! let retrieved = engine.get(&key).expect("failed to get");
//! assert_eq!(retrieved, value);
//!
//! engine.delete(&key).expect("failed to delete");
//! engine.close().expect("failed to close");
//! ```

pub mod block;
pub mod db;
pub mod errors;
pub mod iterator;
pub mod option;
pub mod quantizer;
pub mod store;
pub mod table;
pub mod util;

pub use db::Engine;
pub use errors::{Errors, Result};
