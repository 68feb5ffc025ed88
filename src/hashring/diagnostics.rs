use std::collections::BTreeMap;

#[cfg(feature = "derive")]
use serde::{Deserialize, Serialize};

use super::HashRing;
use crate::error::{Error, Result, RingViolation};
use crate::hash::HashKind;

/// Snapshot of the ring's shape, taken under a single read lock.
///
/// * `physical_nodes` - number of member nodes
/// * `virtual_nodes` - number of virtual nodes on the ring
/// * `base_replica_factor` - virtual nodes per unit of weight
/// * `avg_virtual_per_physical` - `None` while the ring has no nodes
/// * `hash_function` - the active strategy
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
pub struct RingInfo {
    pub physical_nodes: usize,
    pub virtual_nodes: usize,
    pub base_replica_factor: usize,
    pub avg_virtual_per_physical: Option<f64>,
    pub hash_function: HashKind,
}

impl HashRing {
    /// Counts how many of `keys` land on each node, by node id.
    ///
    /// Empty keys are skipped. `None` is rejected with [`Error::MissingKeys`], an
    /// empty slice yields an empty map. Every key is resolved with its own call to
    /// [`HashRing::get`], so a membership change running concurrently may be seen
    /// by some keys of the batch and not by others.
    ///
    /// # Examples
    ///
    /// ```
    /// use weighted_hashring::{HashRing, Node};
    ///
    /// let ring = HashRing::with_replicas(50).unwrap();
    /// ring.add_node(Node::new("a", "10.0.0.1", 6379)).unwrap();
    /// ring.add_node(Node::new("b", "10.0.0.2", 6379)).unwrap();
    ///
    /// let keys = ["k1", "", "k2", "k3"];
    /// let distribution = ring.load_distribution(Some(&keys[..])).unwrap();
    /// assert_eq!(distribution.values().sum::<usize>(), 3);
    /// ```
    pub fn load_distribution<K>(&self, keys: Option<&[K]>) -> Result<BTreeMap<String, usize>>
    where
        K: AsRef<str>,
    {
        let keys = keys.ok_or(Error::MissingKeys)?;
        let mut distribution = BTreeMap::new();

        for key in keys {
            let key = key.as_ref();
            if key.is_empty() {
                continue;
            }
            let node = self.get(key)?;
            *distribution.entry(node.id().to_owned()).or_insert(0) += 1;
        }

        Ok(distribution)
    }

    pub fn info(&self) -> RingInfo {
        let state = self.read();
        let physical_nodes = state.nodes.len();
        let virtual_nodes = state.ring.len();

        RingInfo {
            physical_nodes,
            virtual_nodes,
            base_replica_factor: self.replicas,
            avg_virtual_per_physical: (physical_nodes > 0)
                .then(|| virtual_nodes as f64 / physical_nodes as f64),
            hash_function: self.hasher.kind(),
        }
    }

    /// Checks the ring invariants: virtual nodes sorted by hash, every virtual node
    /// pointing at a member, and `replicas * max(weight, 1)` virtual nodes per member.
    pub fn validate(&self) -> Result<()> {
        let state = self.read();

        if let Some(index) = state
            .ring
            .windows(2)
            .position(|pair| pair[0].hash > pair[1].hash)
        {
            return Err(RingViolation::Unsorted { index: index + 1 }.into());
        }

        if let Some(vnode) = state
            .ring
            .iter()
            .find(|vnode| !state.nodes.contains_key(&vnode.node))
        {
            return Err(RingViolation::DanglingNode(vnode.node.to_string()).into());
        }

        let expected: usize = state
            .nodes
            .values()
            .map(|node| self.replicas.saturating_mul(node.effective_weight()))
            .fold(0, usize::saturating_add);
        if expected != state.ring.len() {
            return Err(RingViolation::VirtualCountMismatch {
                expected,
                actual: state.ring.len(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::RingInfo;
    use crate::hashring::VirtualNode;
    use crate::hashring::crud::tests::numeric_ring;
    use crate::{Config, Error, HashKind, HashRing, HashStrategy, Node, RingViolation};

    fn node(id: &str) -> Node {
        Node::new(id, "127.0.0.1", 8080)
    }

    #[test]
    fn distribution_counts_non_empty_keys() {
        let ring = numeric_ring(1);
        ring.add_node(node("100")).unwrap();
        ring.add_node(node("200")).unwrap();

        let keys = ["50", "", "150", "250", "", "100"];
        let distribution = ring.load_distribution(Some(&keys[..])).unwrap();

        let expected: BTreeMap<String, usize> = [("100".to_owned(), 3), ("200".to_owned(), 1)]
            .into_iter()
            .collect();
        assert_eq!(distribution, expected);
    }

    #[test]
    fn distribution_of_empty_batches() {
        let ring = numeric_ring(1);
        ring.add_node(node("100")).unwrap();

        let none: [&str; 0] = [];
        assert!(ring.load_distribution(Some(&none[..])).unwrap().is_empty());
        assert!(ring.load_distribution(Some(&["", ""][..])).unwrap().is_empty());
        assert_eq!(
            ring.load_distribution::<&str>(None),
            Err(Error::MissingKeys)
        );
    }

    #[test]
    fn distribution_on_empty_ring() {
        let ring = HashRing::with_replicas(3).unwrap();
        assert_eq!(
            ring.load_distribution(Some(&["key".to_owned()][..])),
            Err(Error::EmptyRing)
        );
        assert!(ring.load_distribution(Some(&[""][..])).unwrap().is_empty());
    }

    #[test]
    fn info_of_empty_and_populated_ring() {
        let ring = HashRing::new(Config::new(10).with_hash_strategy(HashStrategy::Secure)).unwrap();
        assert_eq!(
            ring.info(),
            RingInfo {
                physical_nodes: 0,
                virtual_nodes: 0,
                base_replica_factor: 10,
                avg_virtual_per_physical: None,
                hash_function: HashKind::Secure,
            }
        );

        ring.add_node(node("a")).unwrap();
        ring.add_node(node("b").with_weight(2)).unwrap();
        assert_eq!(
            ring.info(),
            RingInfo {
                physical_nodes: 2,
                virtual_nodes: 30,
                base_replica_factor: 10,
                avg_virtual_per_physical: Some(15.0),
                hash_function: HashKind::Secure,
            }
        );
    }

    #[test]
    fn info_labels_custom_strategies() {
        assert_eq!(numeric_ring(1).info().hash_function, HashKind::Custom);
        assert_eq!(HashRing::with_replicas(1).unwrap().info().hash_function, HashKind::Fast);
    }

    #[test]
    fn validate_after_add_and_remove() {
        let ring = HashRing::with_replicas(3).unwrap();
        assert_eq!(ring.validate(), Ok(()));

        for id in ["n1", "n2", "n3"] {
            ring.add_node(node(id)).unwrap();
        }
        assert_eq!(ring.validate(), Ok(()));

        ring.remove_node("n1").unwrap();
        assert_eq!(ring.vlen(), 6);
        assert_eq!(ring.validate(), Ok(()));
    }

    #[test]
    fn validate_detects_unsorted_ring() {
        let ring = numeric_ring(2);
        ring.add_node(node("100")).unwrap();
        ring.add_node(node("200")).unwrap();
        ring.write().ring.swap(0, 3);

        assert_eq!(
            ring.validate(),
            Err(Error::Validation(RingViolation::Unsorted { index: 1 }))
        );
    }

    #[test]
    fn validate_detects_dangling_virtual_node() {
        let ring = numeric_ring(1);
        ring.add_node(node("100")).unwrap();
        ring.write().ring.push(VirtualNode::new(u64::MAX, Arc::from("ghost")));

        assert_eq!(
            ring.validate(),
            Err(Error::Validation(RingViolation::DanglingNode("ghost".into())))
        );
    }

    #[test]
    fn validate_detects_missing_virtual_nodes() {
        let ring = numeric_ring(2);
        ring.add_node(node("100")).unwrap();
        ring.write().ring.pop();

        assert_eq!(
            ring.validate(),
            Err(Error::Validation(RingViolation::VirtualCountMismatch {
                expected: 2,
                actual: 1
            }))
        );
    }
}
