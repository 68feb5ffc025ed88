//! A thread-safe consistent hashing ring for placing string keys on a dynamic set of weighted nodes.
//!
//! Each physical [`Node`] is placed on a `u64` ring many times ("virtual nodes"), `base_replica_factor`
//! times per unit of weight. A key is owned by the first virtual node at or after the key's hash,
//! wrapping around at the end of the ring. Adding or removing one node only moves the keys next to
//! that node's virtual nodes, every other key keeps its owner.
//!
//! The ring only answers *which* node(s) a key maps to right now. Storing values, moving data when
//! membership changes and sharing membership between processes is left to the caller.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use weighted_hashring::{Config, HashRing, Node};
//!
//! let ring = Arc::new(HashRing::new(Config::new(100)).unwrap());
//! ring.add_node(Node::new("cache-1", "10.0.0.1", 11211)).unwrap();
//! ring.add_node(Node::new("cache-2", "10.0.0.2", 11211)).unwrap();
//! ring.add_node(Node::new("cache-3", "10.0.0.3", 11211).with_weight(2)).unwrap();
//!
//! let primary = ring.get("session:1234").unwrap();
//! let replicas = ring.get_n("session:1234", 2).unwrap();
//! assert_eq!(primary, replicas[0]);
//!
//! let reader = {
//!     let ring = ring.clone();
//!     thread::spawn(move || ring.get("session:1234").unwrap())
//! };
//! assert_eq!(reader.join().unwrap(), primary);
//! ```
//!
//! Hash strategies:
//! * Fast: FNV-1a 64 bit, the default
//! * Secure: first 8 bytes of SHA-256, resists crafted keys at a higher cost per lookup
//! * Custom: any [`HashFunction`], for example any `BuildHasher` wrapped in [`BuildHasherFn`]

pub mod error;
pub mod hash;
pub mod hashring;
pub mod node;

pub use error::{Error, Result, RingViolation};
pub use hash::{
    BuildHasherFn, Fnv1a, FnvHasher, HashFunction, HashKind, HashStrategy, Sha256, SipHashBuilder,
};
pub use hashring::HashRing;
pub use hashring::diagnostics::RingInfo;
pub use hashring::iterator::HashRingIterator;
pub use node::Node;

pub const DEFAULT_REPLICAS: usize = 160;

/// Construction options of a [`HashRing`].
///
/// * `base_replica_factor` - virtual nodes per unit of node weight, must be positive
/// * `hash_strategy` - strategy used to place keys and virtual nodes, fast by default
#[derive(Clone, Debug)]
pub struct Config {
    pub base_replica_factor: usize,
    pub hash_strategy: HashStrategy,
}

impl Config {
    pub fn new(base_replica_factor: usize) -> Config {
        Config {
            base_replica_factor,
            hash_strategy: HashStrategy::default(),
        }
    }

    pub fn with_hash_strategy(mut self, hash_strategy: HashStrategy) -> Config {
        self.hash_strategy = hash_strategy;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_REPLICAS)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Config, DEFAULT_REPLICAS, HashKind, HashStrategy};

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.base_replica_factor, DEFAULT_REPLICAS);
        assert_eq!(config.hash_strategy.kind(), HashKind::Fast);
    }

    #[test]
    fn config_builder() {
        let config = Config::new(7).with_hash_strategy(HashStrategy::Secure);
        assert_eq!(config.base_replica_factor, 7);
        assert_eq!(config.hash_strategy.kind(), HashKind::Secure);
    }
}
