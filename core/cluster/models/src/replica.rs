//! A single replica of a shard, placed on a node.
use serde::Deserialize;
use serde::Serialize;

use crate::PropertyMap;

/// Replica type, as supported by the simulated cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaType {
    /// Can become leader, indexes updates and searches.
    Nrt,

    /// Can become leader, indexes updates via the transaction log, searches.
    Tlog,

    /// Cannot become leader, only replicates and searches.
    Pull,
}

impl ReplicaType {
    /// Lowercase first letter of the type name, used in the core-name format.
    pub fn initial(&self) -> char {
        match self {
            ReplicaType::Nrt => 'n',
            ReplicaType::Tlog => 't',
            ReplicaType::Pull => 'p',
        }
    }
}

impl std::fmt::Display for ReplicaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplicaType::Nrt => write!(f, "NRT"),
            ReplicaType::Tlog => write!(f, "TLOG"),
            ReplicaType::Pull => write!(f, "PULL"),
        }
    }
}

/// Observed state of a replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplicaState {
    /// Serving reads and, if leader, writes.
    Active,

    /// Not serving traffic; its host node is not live.
    Down,

    /// Catching up after coming back or after a leader change.
    Recovering,
}

impl std::fmt::Display for ReplicaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplicaState::Active => write!(f, "ACTIVE"),
            ReplicaState::Down => write!(f, "DOWN"),
            ReplicaState::Recovering => write!(f, "RECOVERING"),
        }
    }
}

/// Authoritative, mutable record of a single replica, owned exclusively by the provider.
///
/// The `core` and `name` identities are cluster-unique (invariant I1 covers `core`).
/// Anything beyond placement and identity — `state`, `leader`, or any ad-hoc attribute a test
/// wants to stash on a replica — lives in `variables`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplicaRecord {
    /// Cluster-unique replica identity, of the form `core_node<id>`.
    pub name: String,

    /// Cluster-unique core (on-disk identity), of the form `<collection>_<shard>_replica_<t><n>`.
    pub core: String,

    /// Collection this replica belongs to.
    pub collection: String,

    /// Shard (slice) this replica belongs to.
    pub shard: String,

    /// Replica type.
    pub replica_type: ReplicaType,

    /// Node currently hosting this replica.
    pub node: String,

    /// Mutable bag of attributes, including the well-known `state` and `leader` keys.
    #[serde(default)]
    pub variables: PropertyMap,
}

impl ReplicaRecord {
    /// Current [`ReplicaState`], defaulting to [`ReplicaState::Down`] if unset or unparseable.
    pub fn state(&self) -> ReplicaState {
        self.variables
            .get(crate::VAR_STATE)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or(ReplicaState::Down)
    }

    /// Set the `state` variable.
    pub fn set_state(&mut self, state: ReplicaState) {
        let value = serde_json::to_value(state).expect("ReplicaState always serialises");
        self.variables.insert(crate::VAR_STATE.to_string(), value);
    }

    /// Whether this record carries `leader = true`.
    pub fn is_leader(&self) -> bool {
        self.variables
            .get(crate::VAR_LEADER)
            .and_then(Self::as_true)
            .unwrap_or(false)
    }

    /// Mark this record as the shard leader.
    pub fn set_leader(&mut self) {
        self.variables
            .insert(crate::VAR_LEADER.to_string(), serde_json::Value::Bool(true));
    }

    /// Clear any `leader` flag on this record.
    pub fn clear_leader(&mut self) {
        self.variables.remove(crate::VAR_LEADER);
    }

    fn as_true(value: &serde_json::Value) -> Option<bool> {
        value.as_bool().filter(|value| *value)
    }
}
