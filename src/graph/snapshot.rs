// graph/snapshot.rs - Renderable Graph Snapshots

use serde::{Deserialize, Serialize};

use super::status::SigStatus;
use crate::keys::KeyId;

/// A consistent owned view of the graph, published after every batch of
/// mutations.
///
/// Node and signature views reference each other by node index, the same
/// stable indices the graph assigns at discovery, so a force-directed
/// layout can keep its simulation state across snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// All nodes in discovery order
    pub nodes: Vec<NodeView>,

    /// All directed signatures in discovery order
    pub sigs: Vec<SigView>,

    /// Undirected links, one per certified node pair
    pub links: Vec<LinkView>,
}

/// One node as the presentation layer sees it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    /// Stable node index
    pub index: usize,

    /// The key id
    pub id: KeyId,

    /// Display label: primary user id, or the hex id while unresolved
    pub label: String,

    /// Whether key material has arrived
    pub resolved: bool,
}

/// One directed signature as the presentation layer sees it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigView {
    /// Node index of the signed key
    pub subject: usize,

    /// Node index of the signing key
    pub issuer: usize,

    /// Current validity classification
    pub status: SigStatus,

    /// Index into `links`
    pub link: usize,

    /// Whether the reverse direction is also certified. Renderers arc the
    /// two directions apart when both exist.
    pub mutual: bool,
}

/// One undirected link as the presentation layer sees it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkView {
    /// Node index of the first-created direction's subject
    pub source: usize,

    /// Node index of that direction's issuer
    pub target: usize,
}
