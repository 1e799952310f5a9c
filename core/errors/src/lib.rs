//! Common errors from and for the cluster state simulator.

/// A replica with the requested core name already exists in the cluster.
#[derive(Debug, thiserror::Error)]
#[error("a replica with core name '{core}' already exists in the cluster")]
pub struct DuplicateCore {
    pub core: String,
}

impl DuplicateCore {
    pub fn new<S: Into<String>>(core: S) -> Self {
        Self { core: core.into() }
    }
}

/// The requested node is not part of the live node set.
#[derive(Debug, thiserror::Error)]
#[error("node '{node}' is not live")]
pub struct NodeNotLive {
    pub node: String,
}

impl NodeNotLive {
    pub fn new<S: Into<String>>(node: S) -> Self {
        Self { node: node.into() }
    }
}

/// `add_node` was called for a node that is already live.
#[derive(Debug, thiserror::Error)]
#[error("node '{node}' is already live")]
pub struct NodeAlreadyLive {
    pub node: String,
}

impl NodeAlreadyLive {
    pub fn new<S: Into<String>>(node: S) -> Self {
        Self { node: node.into() }
    }
}

/// No replica with the given name was found where one was expected.
#[derive(Debug, thiserror::Error)]
#[error("replica '{replica}' not found on node '{node}'")]
pub struct ReplicaNotFound {
    pub node: String,
    pub replica: String,
}

impl ReplicaNotFound {
    pub fn new<S1: Into<String>, S2: Into<String>>(node: S1, replica: S2) -> Self {
        Self {
            node: node.into(),
            replica: replica.into(),
        }
    }
}

/// The requested collection does not exist in the cluster.
#[derive(Debug, thiserror::Error)]
#[error("collection '{collection}' not found")]
pub struct CollectionNotFound {
    pub collection: String,
}

impl CollectionNotFound {
    pub fn new<S: Into<String>>(collection: S) -> Self {
        Self {
            collection: collection.into(),
        }
    }
}

/// An operation that is not implemented by the simulator was invoked.
#[derive(Debug, thiserror::Error)]
#[error("operation '{operation}' is not supported by the simulated cluster state provider")]
pub struct Unsupported {
    pub operation: &'static str,
}

impl Unsupported {
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}
