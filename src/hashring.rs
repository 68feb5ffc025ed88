use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::Config;
use crate::error::{Error, Result};
use crate::hash::{HashFunction, HashStrategy};
use crate::node::Node;

mod crud;
pub mod diagnostics;
pub mod iterator;

// VirtualNode is an internal struct placing one replica of a physical node on the ring.
// It refers to its node by id only; the membership map owns the node itself.
#[derive(Clone, Debug)]
struct VirtualNode {
    hash: u64,
    node: Arc<str>,
}

impl VirtualNode {
    fn new(hash: u64, node: Arc<str>) -> VirtualNode {
        VirtualNode { hash, node }
    }
}

// Implement `PartialEq`, `Eq`, `PartialOrd` and `Ord` so we can sort `VirtualNode`s by position
impl PartialEq for VirtualNode {
    fn eq(&self, other: &VirtualNode) -> bool {
        self.hash == other.hash
    }
}

impl Eq for VirtualNode {}

impl PartialOrd for VirtualNode {
    fn partial_cmp(&self, other: &VirtualNode) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VirtualNode {
    fn cmp(&self, other: &VirtualNode) -> Ordering {
        self.hash.cmp(&other.hash)
    }
}

/// Everything guarded by the ring lock. `ring` is always sorted ascending by hash
/// and only references ids present in `nodes`.
#[derive(Debug, Default)]
struct RingState {
    ring: Vec<VirtualNode>,
    nodes: BTreeMap<Arc<str>, Arc<Node>>,
}

impl RingState {
    // index of the first virtual node at or after `hash`, wrapping to 0 past the end
    fn position(&self, hash: u64) -> usize {
        let n = self.ring.partition_point(|vnode| vnode.hash < hash);
        if n == self.ring.len() { 0 } else { n }
    }
}

/// HashRing maps string keys onto a dynamic set of weighted physical nodes using
/// consistent hashing.
///
/// Each node is placed `base_replica_factor * max(weight, 1)` times on a `u64` ring.
/// A key belongs to the first virtual node at or after the key's hash, wrapping
/// around at the end. Adding or removing a node only moves the keys adjacent to
/// that node's virtual nodes.
///
/// All operations take `&self`. Membership changes hold an exclusive lock for
/// their full duration, lookups share a read lock, so a `HashRing` can be shared
/// between threads behind an `Arc`.
///
/// Two virtual nodes of different nodes may land on the same hash. Lookups then
/// resolve to whichever of them sorts first, which is deterministic for a given
/// sequence of membership changes but not otherwise specified.
#[derive(Debug)]
pub struct HashRing {
    hasher: HashStrategy,
    replicas: usize,
    state: RwLock<RingState>,
}

impl Default for HashRing {
    fn default() -> Self {
        let config = Config::default();
        HashRing {
            hasher: config.hash_strategy,
            replicas: config.base_replica_factor.max(1),
            state: RwLock::new(RingState::default()),
        }
    }
}

impl HashRing {
    /// Create a new `HashRing` from `config`.
    ///
    /// Fails with [`Error::InvalidVirtualReplicas`] if the base replica factor is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use weighted_hashring::{Config, HashRing, HashStrategy, Node};
    ///
    /// let ring = HashRing::new(Config::new(100).with_hash_strategy(HashStrategy::Secure)).unwrap();
    /// ring.add_node(Node::new("cache-1", "10.0.0.1", 11211)).unwrap();
    /// ring.add_node(Node::new("cache-2", "10.0.0.2", 11211).with_weight(2)).unwrap();
    ///
    /// assert_eq!(ring.vlen(), 300);
    /// let owner = ring.get("user:42").unwrap();
    /// assert!(owner.id().starts_with("cache-"));
    /// ```
    pub fn new(config: Config) -> Result<HashRing> {
        HashRing::with_hasher(config.base_replica_factor, config.hash_strategy)
    }

    /// Creates an empty `HashRing` using the fast strategy.
    ///
    /// # Arguments
    ///
    /// * `replicas` - virtual nodes per unit of weight (higher means more even distribution, but more memory and slower membership changes)
    pub fn with_replicas(replicas: usize) -> Result<HashRing> {
        HashRing::with_hasher(replicas, HashStrategy::Fast)
    }

    /// Creates an empty `HashRing` which will use the given hash strategy.
    ///
    /// # Arguments
    ///
    /// * `replicas` - virtual nodes per unit of weight
    /// * `hasher` - strategy used to place both virtual nodes and keys
    ///
    /// # Examples
    ///
    /// ```
    /// use weighted_hashring::{BuildHasherFn, HashKind, HashRing, HashStrategy, SipHashBuilder};
    ///
    /// let ring = HashRing::with_hasher(50, HashStrategy::custom(BuildHasherFn(SipHashBuilder))).unwrap();
    /// assert_eq!(ring.info().hash_function, HashKind::Custom);
    /// ```
    pub fn with_hasher(replicas: usize, hasher: HashStrategy) -> Result<HashRing> {
        if replicas == 0 {
            return Err(Error::InvalidVirtualReplicas);
        }

        Ok(HashRing {
            hasher,
            replicas,
            state: RwLock::new(RingState::default()),
        })
    }

    /// Get the number of physical nodes in the hash ring.
    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    /// Get the number of virtual nodes in the hash ring.
    pub fn vlen(&self) -> usize {
        self.read().ring.len()
    }

    /// Returns true if the ring has no nodes.
    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }

    /// The base replica factor the ring was built with.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    pub fn hash_strategy(&self) -> &HashStrategy {
        &self.hasher
    }

    /// Hash `input` with the ring's strategy.
    pub fn get_hash(&self, input: &str) -> u64 {
        self.hasher.hash(input)
    }

    // Every mutation leaves the state consistent before it can panic, so a poisoned
    // lock still guards a valid ring.
    fn read(&self) -> RwLockReadGuard<'_, RingState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RingState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn into_state(self) -> RingState {
        self.state.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::HashRing;
    use crate::{Config, Error, HashKind, HashStrategy};

    #[test]
    fn zero_replicas_is_rejected() {
        assert_eq!(
            HashRing::with_replicas(0).unwrap_err(),
            Error::InvalidVirtualReplicas
        );
        assert_eq!(
            HashRing::new(Config::new(0)).unwrap_err(),
            Error::InvalidVirtualReplicas
        );
    }

    #[test]
    fn new_ring_is_empty() {
        let ring = HashRing::with_replicas(3).unwrap();
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.vlen(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.replicas(), 3);
        assert_eq!(ring.hash_strategy().kind(), HashKind::Fast);
    }

    #[test]
    fn config_selects_strategy() {
        let ring = HashRing::new(Config::new(5).with_hash_strategy(HashStrategy::Secure)).unwrap();
        assert_eq!(ring.hash_strategy().kind(), HashKind::Secure);
        assert_eq!(ring.get_hash("abc"), 0xba7816bf8f01cfea);
    }

    #[test]
    fn default_ring_uses_default_config() {
        let ring = HashRing::default();
        let config = Config::default();
        assert_eq!(ring.replicas(), config.base_replica_factor);
        assert_eq!(ring.hash_strategy().kind(), HashKind::Fast);
    }
}
