//! Topic-keyed store with MQTT wildcard matching in both directions
//!
//! Values are stored in a trie under `/`-delimited keys. Keys go into the trie literally, so a key
//! may itself be an MQTT topic filter using `+` (one level) or `#` (all remaining levels). Two
//! searches interpret those wildcards:
//!
//! - [`MqttStore::find_matching`]: the query is a pattern, the stored keys are concrete topics.
//!   This is the retained-message lookup of a broker.
//! - [`MqttStore::find_patterns`]: the query is a concrete topic, the stored keys are patterns.
//!   This is the subscription lookup of a broker.
//!
//! ```text
//!   Root
//!   ├── iot
//!   │   ├── +
//!   │   │   └── temp (value=1)     "iot/+/temp"
//!   │   └── b
//!   │       └── temp (value=2)     "iot/b/temp"
//!   └── #        (value=3)         "#"
//! ```
//!
//! ## Usage
//! ```
//! use mqtt_store::MqttStore;
//!
//! let mut store = MqttStore::new();
//! store.put("iot/+/temp", 1).put("iot/b/temp", 2).put("#", 3);
//!
//! assert_eq!(store.get("iot/b/temp").map(|m| *m.value), Some(2));
//! assert_eq!(store.find_patterns("iot/b/temp").unwrap().len(), 3);
//! assert_eq!(store.find_matching("iot/+/temp").unwrap().len(), 2);
//! assert!(store.find_matching("#/temp").is_err());
//! ```
//!
//! [`MqttStore`] is a plain single-threaded value; [`SharedStore`] wraps it in a read-write lock
//! and adds optional size limits.

#![deny(unsafe_code)]

mod counter;
mod error;
mod matcher;
mod shared;
mod store;
pub mod topic;
pub mod tree;

pub use counter::Counter;
pub use error::StoreError;
pub use shared::{SharedStore, StoreOptions};
pub use store::{Matched, MqttStore};
pub use topic::{Level, Topic};
pub use tree::TopicTree;

pub type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;

pub type Result<T> = std::result::Result<T, StoreError>;
