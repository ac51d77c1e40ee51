// graph/web.rs - The Incremental Trust Graph

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use super::snapshot::{GraphSnapshot, LinkView, NodeView, SigView};
use super::status::SigStatus;
use crate::keys::{KeyId, KeyMaterial};

/// One key in the graph, known or placeholder.
///
/// Nodes are created on first reference, either as a signature endpoint or
/// as the seed, and are never destroyed. `key` stays `None` until the key
/// material actually arrives from the key source.
#[derive(Clone, Debug)]
pub struct Node {
    /// Stable position assigned at first discovery, never reused
    pub index: usize,

    /// The key id
    pub id: KeyId,

    /// Key material, once fetched
    pub key: Option<KeyMaterial>,
}

impl Node {
    /// Whether key material has arrived for this node
    pub fn is_resolved(&self) -> bool {
        self.key.is_some()
    }
}

/// A directed certification: `issuer` signs `subject` with `status`.
///
/// At most one signature exists per ordered (subject, issuer) pair;
/// re-verification updates `status` in place.
#[derive(Clone, Debug)]
pub struct Signature {
    /// The key being signed
    pub subject: KeyId,

    /// The key that signed
    pub issuer: KeyId,

    /// Current validity classification
    pub status: SigStatus,

    /// Index of the owning [`Link`]
    pub link: usize,
}

/// An undirected renderable edge between two nodes.
///
/// When both directions of a pair are certified, both signatures share the
/// first-created link, so the layout draws one edge per key pair.
#[derive(Clone, Debug)]
pub struct Link {
    /// Node index of the subject of the first-created direction
    pub source: usize,

    /// Node index of that direction's issuer
    pub target: usize,
}

/// The web of trust graph: keys as nodes, certifications as edges.
///
/// Owns all nodes, signatures, and links, and keeps a forward signature
/// index (`subject -> issuer -> signature`) plus the inverse index
/// (`issuer -> subjects`) used to re-verify dependents when an issuer's
/// key finally arrives.
#[derive(Default)]
pub struct TrustGraph {
    /// Nodes in discovery order
    nodes: Vec<Node>,

    /// Key id -> node index
    id_to_node: HashMap<KeyId, usize>,

    /// All signatures in discovery order
    all_sigs: Vec<Signature>,

    /// subject -> issuer -> index into `all_sigs`
    sigs: HashMap<KeyId, HashMap<KeyId, usize>>,

    /// issuer -> set of subjects it certifies
    inv_sigs: HashMap<KeyId, HashSet<KeyId>>,

    /// Renderable links, each stored exactly once
    links: Vec<Link>,
}

impl TrustGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` already has a node
    pub fn contains(&self, id: KeyId) -> bool {
        self.id_to_node.contains_key(&id)
    }

    /// Add a node for `id`, or return the existing one's index.
    ///
    /// Indices are assigned sequentially at first discovery and stay
    /// stable for the lifetime of the graph.
    pub fn add_node(&mut self, id: KeyId) -> usize {
        if let Some(&index) = self.id_to_node.get(&id) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(Node {
            index,
            id,
            key: None,
        });
        self.id_to_node.insert(id, index);
        self.sigs.insert(id, HashMap::new());
        self.inv_sigs.insert(id, HashSet::new());
        index
    }

    /// Attach fetched key material, creating the node if needed.
    ///
    /// Replaces any previously attached material for the same id.
    pub fn attach_key(&mut self, key: KeyMaterial) -> usize {
        let index = self.add_node(key.id);
        self.nodes[index].key = Some(key);
        index
    }

    /// Record that `issuer` signs `subject` with the given status.
    ///
    /// Missing endpoints are created as placeholders. If the ordered pair
    /// already has a signature, only its status is updated; otherwise a new
    /// signature is created, reusing the reverse direction's link when one
    /// exists so a bidirectional pair renders as a single edge.
    pub fn add_edge(&mut self, subject: KeyId, issuer: KeyId, status: SigStatus) {
        let subject_idx = self.add_node(subject);
        let issuer_idx = self.add_node(issuer);

        if let Some(&sig_idx) = self.sigs.get(&subject).and_then(|m| m.get(&issuer)) {
            self.all_sigs[sig_idx].status = status;
            return;
        }

        let link = match self.sigs.get(&issuer).and_then(|m| m.get(&subject)) {
            Some(&reverse_idx) => self.all_sigs[reverse_idx].link,
            None => {
                self.links.push(Link {
                    source: subject_idx,
                    target: issuer_idx,
                });
                self.links.len() - 1
            }
        };

        let sig_idx = self.all_sigs.len();
        self.all_sigs.push(Signature {
            subject,
            issuer,
            status,
            link,
        });
        self.sigs.entry(subject).or_default().insert(issuer, sig_idx);
        self.inv_sigs.entry(issuer).or_default().insert(subject);
    }

    /// Look up the node for `id`
    pub fn node(&self, id: KeyId) -> Option<&Node> {
        self.id_to_node.get(&id).map(|&index| &self.nodes[index])
    }

    /// Look up the signature for the ordered (subject, issuer) pair
    pub fn signature(&self, subject: KeyId, issuer: KeyId) -> Option<&Signature> {
        let idx = *self.sigs.get(&subject)?.get(&issuer)?;
        Some(&self.all_sigs[idx])
    }

    /// Every subject that `issuer` certifies, in id order.
    ///
    /// This answers "whose signatures were pending on this key" when the
    /// issuer's material arrives.
    pub fn subjects_certified_by(&self, issuer: KeyId) -> Vec<KeyId> {
        let mut subjects: Vec<KeyId> = self
            .inv_sigs
            .get(&issuer)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        subjects.sort();
        subjects
    }

    /// Display label for `id`: first word of the primary user id, falling
    /// back to the hex id while the key is unresolved
    pub fn short_name(&self, id: KeyId) -> Option<String> {
        let node = self.node(id)?;
        let label = match node.key.as_ref().and_then(|k| k.primary_user_id()) {
            Some(uid) => uid
                .split_whitespace()
                .next()
                .unwrap_or(uid)
                .to_string(),
            None => id.to_string(),
        };
        Some(label)
    }

    /// Display label for `id`: full primary user id, falling back to the
    /// hex id while the key is unresolved
    pub fn long_name(&self, id: KeyId) -> Option<String> {
        let node = self.node(id)?;
        let label = match node.key.as_ref().and_then(|k| k.primary_user_id()) {
            Some(uid) => uid.to_string(),
            None => id.to_string(),
        };
        Some(label)
    }

    /// All nodes in discovery order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All signatures in discovery order
    pub fn signatures(&self) -> &[Signature] {
        &self.all_sigs
    }

    /// Renderable links, one per certified node pair
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Diagnostic listing of every resolved node and its outgoing
    /// certifications, for tests and headless runs
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            if !node.is_resolved() {
                continue;
            }
            if let Some(name) = self.short_name(node.id) {
                let _ = writeln!(out, "{name}");
            }
            let mut issuers: Vec<KeyId> = self
                .sigs
                .get(&node.id)
                .map(|m| m.keys().copied().collect())
                .unwrap_or_default();
            issuers.sort();
            for issuer in issuers {
                if let (Some(name), Some(sig)) =
                    (self.short_name(issuer), self.signature(node.id, issuer))
                {
                    let _ = writeln!(out, "  {name} : {}", sig.status);
                }
            }
        }
        out
    }

    /// Produce a consistent owned view of the graph for the presentation
    /// layer
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeView {
                index: node.index,
                id: node.id,
                label: self.long_name(node.id).unwrap_or_else(|| node.id.to_string()),
                resolved: node.is_resolved(),
            })
            .collect();

        let sigs = self
            .all_sigs
            .iter()
            .filter_map(|sig| {
                let subject = *self.id_to_node.get(&sig.subject)?;
                let issuer = *self.id_to_node.get(&sig.issuer)?;
                let mutual = self
                    .sigs
                    .get(&sig.issuer)
                    .is_some_and(|m| m.contains_key(&sig.subject));
                Some(SigView {
                    subject,
                    issuer,
                    status: sig.status,
                    link: sig.link,
                    mutual,
                })
            })
            .collect();

        let links = self
            .links
            .iter()
            .map(|link| LinkView {
                source: link.source,
                target: link.target,
            })
            .collect();

        GraphSnapshot { nodes, sigs, links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> KeyId {
        KeyId::from_bytes([byte; 8])
    }

    fn material(byte: u8, user_id: &str) -> KeyMaterial {
        KeyMaterial::new(id(byte), vec![user_id.to_string()])
    }

    #[test]
    fn test_add_node_idempotent() {
        let mut graph = TrustGraph::new();
        let first = graph.add_node(id(1));
        let second = graph.add_node(id(1));
        assert_eq!(first, second);
        assert_eq!(graph.nodes().len(), 1);

        let third = graph.add_node(id(2));
        assert_eq!(third, 1);
        assert_eq!(graph.nodes().len(), 2);
    }

    #[test]
    fn test_add_edge_creates_placeholders() {
        let mut graph = TrustGraph::new();
        graph.add_edge(id(1), id(2), SigStatus::IssuerUnavailable);

        assert_eq!(graph.nodes().len(), 2);
        assert!(graph.contains(id(1)));
        assert!(graph.contains(id(2)));
        assert!(!graph.node(id(1)).unwrap().is_resolved());
        assert!(!graph.node(id(2)).unwrap().is_resolved());
    }

    #[test]
    fn test_add_edge_updates_status_in_place() {
        let mut graph = TrustGraph::new();
        graph.add_edge(id(1), id(2), SigStatus::IssuerUnavailable);
        graph.add_edge(id(1), id(2), SigStatus::Valid);

        assert_eq!(graph.signatures().len(), 1);
        assert_eq!(graph.links().len(), 1);
        assert_eq!(
            graph.signature(id(1), id(2)).unwrap().status,
            SigStatus::Valid
        );
    }

    #[test]
    fn test_reverse_edge_shares_link() {
        let mut graph = TrustGraph::new();
        graph.add_edge(id(1), id(2), SigStatus::Valid);
        graph.add_edge(id(2), id(1), SigStatus::Expired);

        assert_eq!(graph.signatures().len(), 2);
        assert_eq!(graph.links().len(), 1);

        let forward = graph.signature(id(1), id(2)).unwrap();
        let reverse = graph.signature(id(2), id(1)).unwrap();
        assert_eq!(forward.link, reverse.link);
    }

    #[test]
    fn test_distinct_pairs_get_distinct_links() {
        let mut graph = TrustGraph::new();
        graph.add_edge(id(1), id(2), SigStatus::Valid);
        graph.add_edge(id(1), id(3), SigStatus::Valid);
        graph.add_edge(id(2), id(3), SigStatus::Valid);

        assert_eq!(graph.links().len(), 3);
    }

    #[test]
    fn test_attach_key_resolves_placeholder() {
        let mut graph = TrustGraph::new();
        graph.add_edge(id(1), id(2), SigStatus::IssuerUnavailable);
        assert!(!graph.node(id(2)).unwrap().is_resolved());

        let index = graph.attach_key(material(2, "Bob Builder <bob@example.org>"));
        assert_eq!(index, graph.node(id(2)).unwrap().index);
        assert!(graph.node(id(2)).unwrap().is_resolved());
    }

    #[test]
    fn test_subjects_certified_by() {
        let mut graph = TrustGraph::new();
        graph.add_edge(id(1), id(9), SigStatus::IssuerUnavailable);
        graph.add_edge(id(2), id(9), SigStatus::IssuerUnavailable);
        graph.add_edge(id(3), id(8), SigStatus::Valid);

        assert_eq!(graph.subjects_certified_by(id(9)), vec![id(1), id(2)]);
        assert_eq!(graph.subjects_certified_by(id(8)), vec![id(3)]);
        assert!(graph.subjects_certified_by(id(7)).is_empty());
    }

    #[test]
    fn test_names_fall_back_to_hex() {
        let mut graph = TrustGraph::new();
        graph.add_node(id(1));
        graph.attach_key(material(2, "Alice Example <alice@example.org>"));

        assert_eq!(graph.short_name(id(1)), Some(id(1).to_string()));
        assert_eq!(graph.short_name(id(2)), Some("Alice".to_string()));
        assert_eq!(
            graph.long_name(id(2)),
            Some("Alice Example <alice@example.org>".to_string())
        );
        assert_eq!(graph.short_name(id(3)), None);
    }

    #[test]
    fn test_dump_lists_resolved_nodes_only() {
        let mut graph = TrustGraph::new();
        graph.attach_key(material(1, "Alice Example <alice@example.org>"));
        graph.attach_key(material(2, "Bob Builder <bob@example.org>"));
        graph.add_edge(id(1), id(2), SigStatus::Valid);
        graph.add_edge(id(1), id(3), SigStatus::IssuerUnavailable);

        let dump = graph.dump();
        assert!(dump.contains("Alice\n"));
        assert!(dump.contains("  Bob : valid"));
        assert!(dump.contains(&format!("  {} : issuer-unavailable", id(3))));
        // The unresolved placeholder gets no section of its own.
        assert!(!dump.contains(&format!("{}\n  ", id(3))));
    }

    #[test]
    fn test_snapshot_views() {
        let mut graph = TrustGraph::new();
        graph.attach_key(material(1, "Alice Example <alice@example.org>"));
        graph.add_edge(id(1), id(2), SigStatus::IssuerUnavailable);
        graph.add_edge(id(2), id(1), SigStatus::Valid);

        let snapshot = graph.snapshot();
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.sigs.len(), 2);
        assert_eq!(snapshot.links.len(), 1);

        assert!(snapshot.nodes[0].resolved);
        assert_eq!(snapshot.nodes[0].label, "Alice Example <alice@example.org>");
        assert!(!snapshot.nodes[1].resolved);
        assert_eq!(snapshot.nodes[1].label, id(2).to_string());

        for sig in &snapshot.sigs {
            assert!(sig.mutual);
            assert_eq!(sig.link, 0);
        }
    }

    #[test]
    fn test_snapshot_mutual_flag_one_way() {
        let mut graph = TrustGraph::new();
        graph.add_edge(id(1), id(2), SigStatus::Valid);

        let snapshot = graph.snapshot();
        assert_eq!(snapshot.sigs.len(), 1);
        assert!(!snapshot.sigs[0].mutual);
    }
}
