use std::fmt::{self, Display};

#[cfg(feature = "derive")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A physical endpoint that owns a share of the ring.
///
/// The weight scales the number of virtual nodes placed for this node. A weight of
/// 0 is kept as given but placed as if it were 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
pub struct Node {
    id: String,
    host: String,
    port: u16,
    weight: u32,
}

impl Node {
    /// Create a node with weight 1. Validation happens when the node joins a ring.
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Node {
        Node {
            id: id.into(),
            host: host.into(),
            port,
            weight: 1,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Node {
        self.weight = weight;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The weight as given by the caller.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// The weight used for placement, never below 1.
    pub fn effective_weight(&self) -> usize {
        self.weight.max(1) as usize
    }

    /// Checks id, host and port. Surrounding whitespace does not count as content.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidNodeId);
        }
        if self.host.trim().is_empty() {
            return Err(Error::InvalidNodeHost);
        }
        if self.port == 0 {
            return Err(Error::InvalidNodePort);
        }
        Ok(())
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::Node;
    use crate::Error;

    #[test]
    fn valid_node() {
        let node = Node::new("node1", "localhost", 8080).with_weight(3);
        assert_eq!(node.validate(), Ok(()));
        assert_eq!(node.weight(), 3);
        assert_eq!(node.effective_weight(), 3);
    }

    #[test]
    fn rejects_blank_fields_and_port_zero() {
        let cases = [
            (Node::new("", "localhost", 8080), Error::InvalidNodeId),
            (Node::new("   ", "localhost", 8080), Error::InvalidNodeId),
            (Node::new("node1", "", 8080), Error::InvalidNodeHost),
            (Node::new("node1", "\t", 8080), Error::InvalidNodeHost),
            (Node::new("node1", "localhost", 0), Error::InvalidNodePort),
        ];

        for (node, expected) in cases {
            assert_eq!(node.validate(), Err(expected), "{node:?}");
        }
    }

    #[test]
    fn id_is_checked_before_host_and_port() {
        assert_eq!(Node::new(" ", "", 0).validate(), Err(Error::InvalidNodeId));
        assert_eq!(Node::new("n", " ", 0).validate(), Err(Error::InvalidNodeHost));
    }

    #[test]
    fn zero_weight_is_stored_but_placed_as_one() {
        let node = Node::new("node1", "localhost", 8080).with_weight(0);
        assert_eq!(node.weight(), 0);
        assert_eq!(node.effective_weight(), 1);
    }

    #[test]
    fn displays_as_host_and_port() {
        let node = Node::new("node1", "localhost", 8080);
        assert_eq!(node.to_string(), "localhost:8080");
    }
}
