// graph/mod.rs - Trust Graph Module

//! The incremental web-of-trust graph.
//!
//! Keys are nodes, certification signatures are directed edges, and each
//! certified pair of keys collapses into one undirected [`Link`] for
//! rendering:
//!
//! - **Nodes** are created on first reference and may exist as placeholders
//!   long before their key material arrives.
//! - **Signatures** are unique per ordered (subject, issuer) pair;
//!   re-verifying a subject updates statuses in place.
//! - **Links** merge the two directions between a pair, first-created wins.
//!
//! The graph itself is synchronous and single-writer; the asynchronous
//! fetch loop that grows it lives in [`crate::resolver`].
//!
//! # Example
//!
//! ```ignore
//! use keyweb::graph::{SigStatus, TrustGraph};
//! use keyweb::keys::KeyId;
//!
//! let mut graph = TrustGraph::new();
//! let root = KeyId::from_hex("f87a09cb27ab7e55")?;
//! let signer = KeyId::from_hex("0102030405060708")?;
//!
//! graph.add_node(root);
//! graph.add_edge(root, signer, SigStatus::IssuerUnavailable);
//!
//! let snapshot = graph.snapshot();
//! assert_eq!(snapshot.nodes.len(), 2);
//! ```

mod snapshot;
mod status;
mod web;

pub use snapshot::{GraphSnapshot, LinkView, NodeView, SigView};
pub use status::SigStatus;
pub use web::{Link, Node, Signature, TrustGraph};
