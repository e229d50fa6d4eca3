//! # lrustore
//!
//! Fixed-capacity, in-memory key-value store with least-recently-used
//! eviction.
//!
//! ## Architecture
//! - **HashMap**: AHash key index mapping each key to an arena slot (O(1))
//! - **LRU List**: Doubly-linked list of arena slots for recency (O(1))
//! - **Mutex**: One `parking_lot` lock guarding both, so they never diverge
//!
//! ```
//! use lrustore::LruStore;
//!
//! let store = LruStore::new(2)?;
//! store.put("a", 1);
//! store.put("b", 2);
//! store.get(&"a");
//! store.put("c", 3); // evicts "b"
//!
//! assert_eq!(store.get(&"b"), None);
//! assert_eq!(store.get(&"a"), Some(1));
//! # Ok::<(), lrustore::Error>(())
//! ```

#![warn(missing_docs)]

mod error;
mod lru;
mod stats;
mod store;

pub use error::{Error, Result};
pub use lru::LruCache;
pub use stats::CacheStats;
pub use store::LruStore;
