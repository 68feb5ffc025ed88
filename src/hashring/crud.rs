use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{HashRing, VirtualNode};
use crate::error::{Error, Result};
use crate::node::Node;

impl HashRing {
    /// Add `node` to the hash ring.
    ///
    /// The node is validated before anything is touched. Adding an id that is
    /// already a member succeeds without changing the ring, so retries are safe.
    pub fn add_node(&self, node: Node) -> Result<()> {
        node.validate()?;

        let count = self
            .replicas
            .checked_mul(node.effective_weight())
            .ok_or_else(|| Error::VirtualNodeOverflow(node.id().to_owned()))?;

        let id: Arc<str> = Arc::from(node.id());
        let mut vnodes = self.virtual_nodes(&id, count);
        vnodes.sort();

        let mut state = self.write();
        if state.nodes.contains_key(&id) {
            debug!(node = %id, "node already in ring, skipping");
            return Ok(());
        }

        let added = vnodes.len();
        // both runs are sorted, the stable sort merges them and keeps existing
        // virtual nodes ahead of new ones on equal hashes
        state.ring.extend(vnodes);
        state.ring.sort();
        state.nodes.insert(id.clone(), Arc::new(node));

        debug!(node = %id, vnodes = added, total = state.ring.len(), "added node");
        Ok(())
    }

    /// creates `count` virtual nodes for the node `id`
    fn virtual_nodes(&self, id: &Arc<str>, count: usize) -> Vec<VirtualNode> {
        (0..count)
            .map(|index| {
                let hash = self.get_hash(&self.virtual_key(id, index));
                VirtualNode::new(hash, id.clone())
            })
            .collect()
    }

    // salting with the replica factor keeps similar ids from clustering
    fn virtual_key(&self, id: &str, index: usize) -> String {
        format!("vnode:{id}:replica:{index}:seed:{}", self.replicas)
    }

    /// Remove the node `id` and all of its virtual nodes from the hash ring.
    pub fn remove_node(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(Error::InvalidNodeId);
        }

        let mut state = self.write();
        if state.nodes.remove(id).is_none() {
            return Err(Error::NodeNotFound(id.to_owned()));
        }
        state.ring.retain(|vnode| &*vnode.node != id);

        debug!(node = id, total = state.ring.len(), "removed node");
        Ok(())
    }

    pub fn has_node(&self, id: &str) -> bool {
        if id.trim().is_empty() {
            return false;
        }
        self.read().nodes.contains_key(id)
    }

    pub fn node_by_id(&self, id: &str) -> Result<Arc<Node>> {
        if id.trim().is_empty() {
            return Err(Error::InvalidNodeId);
        }
        self.read()
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NodeNotFound(id.to_owned()))
    }

    /// All member nodes, ordered by id.
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        self.read().nodes.values().cloned().collect()
    }

    /// Returns the node responsible for `key`.
    pub fn get(&self, key: &str) -> Result<Arc<Node>> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }

        let hash = self.get_hash(key);
        let state = self.read();
        if state.ring.is_empty() {
            return Err(Error::EmptyRing);
        }

        let vnode = &state.ring[state.position(hash)];
        trace!(key, hash, vnode = vnode.hash, node = %vnode.node, "resolved key");
        state
            .nodes
            .get(&vnode.node)
            .cloned()
            .ok_or_else(|| Error::NodeNotFound(vnode.node.to_string()))
    }

    /// Returns up to `count` distinct nodes for `key`, walking clockwise from the
    /// position `get` resolves to. The first node is always the one `get` returns.
    /// Asking for more nodes than the ring holds returns every node once.
    pub fn get_n(&self, key: &str, count: usize) -> Result<Vec<Arc<Node>>> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        if count == 0 {
            return Err(Error::InvalidCount);
        }

        let hash = self.get_hash(key);
        let state = self.read();
        if state.ring.is_empty() {
            return Err(Error::EmptyRing);
        }

        let limit = count.min(state.nodes.len());
        let n = state.position(hash);
        let (before, after) = state.ring.split_at(n);

        let mut seen = HashSet::with_capacity(limit);
        let mut replica_nodes = Vec::with_capacity(limit);

        for vnode in after.iter().chain(before) {
            if seen.insert(&vnode.node) {
                if let Some(node) = state.nodes.get(&vnode.node) {
                    replica_nodes.push(node.clone());
                }

                if replica_nodes.len() == limit {
                    break;
                }
            }
        }

        Ok(replica_nodes)
    }
}
