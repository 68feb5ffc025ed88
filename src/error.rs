//! Error types returned by ring construction, membership changes and lookups.

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, mutating or querying a [`HashRing`](crate::HashRing).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The base replica factor handed to the ring was zero.
    #[error("virtual replicas must be positive")]
    InvalidVirtualReplicas,

    #[error("node ID cannot be empty")]
    InvalidNodeId,

    #[error("node host cannot be empty")]
    InvalidNodeHost,

    #[error("node port must be in 1..=65535")]
    InvalidNodePort,

    #[error("key cannot be empty")]
    EmptyKey,

    #[error("count must be positive")]
    InvalidCount,

    #[error("node {0} not found")]
    NodeNotFound(String),

    /// Lookup attempted while no virtual nodes are placed on the ring.
    #[error("no nodes available in the ring")]
    EmptyRing,

    /// `replicas * weight` does not fit in `usize`.
    #[error("virtual node count for node {0} overflows")]
    VirtualNodeOverflow(String),

    /// `load_distribution` was called without a key batch.
    #[error("keys cannot be absent")]
    MissingKeys,

    #[error("ring validation failed: {0}")]
    Validation(#[from] RingViolation),
}

/// Internal invariant violations detected by [`HashRing::validate`](crate::HashRing::validate).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingViolation {
    #[error("virtual nodes are not sorted at index {index}")]
    Unsorted { index: usize },

    #[error("virtual node points to non-existent physical node {0}")]
    DanglingNode(String),

    #[error("expected {expected} virtual nodes, found {actual}")]
    VirtualCountMismatch { expected: usize, actual: usize },
}
