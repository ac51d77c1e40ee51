// resolver/engine.rs - The Key Resolution Worker

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::source::{FetchError, KeySource};
use crate::graph::{GraphSnapshot, TrustGraph};
use crate::keys::{KeyId, KeyMaterial, Verifier};

/// Errors from talking to the resolver worker
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Resolver worker has stopped")]
    Closed,
}

/// Resolver tuning knobs
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Capacity of the snapshot broadcast channel. Slow subscribers that
    /// fall further behind than this miss intermediate snapshots; every
    /// snapshot is complete, so the latest one always suffices.
    pub snapshot_buffer: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            snapshot_buffer: 64,
        }
    }
}

enum Command {
    Request(KeyId),
    Fetched {
        id: KeyId,
        outcome: Result<Vec<KeyMaterial>, FetchError>,
    },
    Snapshot(oneshot::Sender<GraphSnapshot>),
    Dump(oneshot::Sender<String>),
    Shutdown,
}

/// Cloneable public face of a running resolver.
///
/// All graph access goes through the worker's mailbox, so callers never
/// observe a partially updated graph.
#[derive(Clone)]
pub struct ResolverHandle {
    tx: mpsc::UnboundedSender<Command>,
    changes: broadcast::Sender<GraphSnapshot>,
}

impl ResolverHandle {
    /// Request resolution of `id`, seeding a placeholder node if the graph
    /// does not know it yet.
    ///
    /// Idempotent: repeated requests for the same id, from any number of
    /// discovery paths, cause at most one fetch.
    pub fn request(&self, id: KeyId) -> Result<(), ResolverError> {
        self.tx
            .send(Command::Request(id))
            .map_err(|_| ResolverError::Closed)
    }

    /// Subscribe to graph snapshots, published once per key arrival
    pub fn subscribe(&self) -> broadcast::Receiver<GraphSnapshot> {
        self.changes.subscribe()
    }

    /// Pull the current graph snapshot
    pub async fn snapshot(&self) -> Result<GraphSnapshot, ResolverError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Command::Snapshot(reply))
            .map_err(|_| ResolverError::Closed)?;
        response.await.map_err(|_| ResolverError::Closed)
    }

    /// Pull the diagnostic dump of resolved nodes and their signatures
    pub async fn dump(&self) -> Result<String, ResolverError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Command::Dump(reply))
            .map_err(|_| ResolverError::Closed)?;
        response.await.map_err(|_| ResolverError::Closed)
    }

    /// Stop the worker. In-flight fetches finish but their results are
    /// discarded.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

/// The key resolution engine.
///
/// Owns the [`TrustGraph`] and the requested-id dedup set, and runs as a
/// single worker task: every mutation happens inside [`Resolver::run`],
/// fetches execute as independent spawned tasks that post their outcome
/// back to the mailbox, and completions may arrive in any order. One
/// worker per graph; independent graphs never share request state.
pub struct Resolver<S, V> {
    graph: TrustGraph,
    requested: HashSet<KeyId>,
    source: Arc<S>,
    verifier: V,
    tx: mpsc::UnboundedSender<Command>,
    rx: mpsc::UnboundedReceiver<Command>,
    changes: broadcast::Sender<GraphSnapshot>,
}

impl<S, V> Resolver<S, V>
where
    S: KeySource + 'static,
    V: Verifier + 'static,
{
    /// Create a resolver and its handle
    pub fn new(source: S, verifier: V, config: ResolverConfig) -> (Self, ResolverHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (changes, _) = broadcast::channel(config.snapshot_buffer);

        let handle = ResolverHandle {
            tx: tx.clone(),
            changes: changes.clone(),
        };
        let resolver = Self {
            graph: TrustGraph::new(),
            requested: HashSet::new(),
            source: Arc::new(source),
            verifier,
            tx,
            rx,
            changes,
        };
        (resolver, handle)
    }

    /// Create a resolver, spawn its worker task, and return the handle
    pub fn spawn(
        source: S,
        verifier: V,
        config: ResolverConfig,
    ) -> (ResolverHandle, JoinHandle<()>) {
        let (resolver, handle) = Self::new(source, verifier, config);
        let worker = tokio::spawn(resolver.run());
        (handle, worker)
    }

    /// Run the worker until [`ResolverHandle::shutdown`] is called
    pub async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Request(id) => self.on_request(id),
                Command::Fetched { id, outcome } => self.on_fetched(id, outcome),
                Command::Snapshot(reply) => {
                    let _ = reply.send(self.graph.snapshot());
                }
                Command::Dump(reply) => {
                    let _ = reply.send(self.graph.dump());
                }
                Command::Shutdown => break,
            }
        }
        debug!("resolver worker stopped");
    }

    /// External request: make sure the node exists, then fetch
    fn on_request(&mut self, id: KeyId) {
        if !self.graph.contains(id) {
            self.graph.add_node(id);
            self.publish();
        }
        self.request_key(id);
    }

    /// Issue at most one fetch per id, ever
    fn request_key(&mut self, id: KeyId) {
        if !self.requested.insert(id) {
            return;
        }
        debug!(id = %id, "requesting key");

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = source.fetch(id).await;
            let _ = tx.send(Command::Fetched { id, outcome });
        });
    }

    fn on_fetched(&mut self, id: KeyId, outcome: Result<Vec<KeyMaterial>, FetchError>) {
        match outcome {
            Ok(keys) if keys.is_empty() => {
                // Collaborator inconsistency rather than a network error:
                // the response imported nothing new. The id stays
                // unresolved, same as a failed fetch.
                warn!(id = %id, "fetch succeeded but imported no new keys");
            }
            Ok(keys) => {
                for key in keys {
                    self.receive_key(key);
                }
            }
            Err(error) => {
                warn!(id = %id, error = %error, "key fetch failed");
            }
        }
    }

    /// Process one newly arrived key: attach it, re-verify everything that
    /// was waiting on it, then publish a single snapshot.
    fn receive_key(&mut self, key: KeyMaterial) {
        let id = key.id;
        self.graph.attach_key(key);
        if let Some(user) = self.graph.long_name(id) {
            info!(id = %id, user = %user, "received key");
        }

        for subject in self.graph.subjects_certified_by(id) {
            self.update_key(subject);
        }
        self.update_key(id);
        self.publish();
    }

    /// Re-verify all certification signatures held by `id`'s key.
    ///
    /// Runs when the key first arrives and again whenever one of its
    /// signers arrives, upgrading pending signatures to their true status.
    /// Signatures whose issuer is still unknown schedule a fetch for it.
    fn update_key(&mut self, id: KeyId) {
        let Some(key) = self.graph.node(id).and_then(|node| node.key.clone()) else {
            return;
        };
        for cert in self.verifier.certifications(&key) {
            if cert.issuer == id {
                // Self-signatures are not trust edges.
                continue;
            }
            self.graph.add_edge(id, cert.issuer, cert.status);
            if cert.status.is_pending() {
                self.request_key(cert.issuer);
            }
        }
    }

    fn publish(&self) {
        let _ = self.changes.send(self.graph.snapshot());
    }
}
