use std::sync::Arc;

use super::HashRing;
use crate::node::Node;

/// Iterates over the member nodes of a ring in id order.
pub struct HashRingIterator {
    nodes: std::vec::IntoIter<Arc<Node>>,
}

impl Iterator for HashRingIterator {
    type Item = Arc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl ExactSizeIterator for HashRingIterator {}

impl IntoIterator for HashRing {
    type Item = Arc<Node>;

    type IntoIter = HashRingIterator;

    fn into_iter(self) -> Self::IntoIter {
        HashRingIterator {
            nodes: self.into_state().nodes.into_values().collect::<Vec<_>>().into_iter(),
        }
    }
}

/// Iterates over a snapshot of the membership taken when the iterator is created.
impl IntoIterator for &HashRing {
    type Item = Arc<Node>;

    type IntoIter = HashRingIterator;

    fn into_iter(self) -> Self::IntoIter {
        HashRingIterator {
            nodes: self.nodes().into_iter(),
        }
    }
}
