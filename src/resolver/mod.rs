// resolver/mod.rs - Asynchronous Key Resolution

//! Breadth-first asynchronous growth of the trust graph.
//!
//! The resolver owns a [`crate::graph::TrustGraph`] and expands it from a
//! seed key id: each fetched key's certifications become edges, and every
//! certification whose issuer is still unknown schedules exactly one fetch
//! for that issuer. Arrival order does not matter; a requested-id set makes
//! the expansion convergent and cycle-safe.
//!
//! All mutation is serialized through one worker task ([`Resolver::run`]):
//! fetches run concurrently, graph updates never do.
//!
//! # Example
//!
//! ```ignore
//! use keyweb::keys::KeyId;
//! use keyweb::resolver::{HkpClient, HkpConfig, Resolver, ResolverConfig};
//!
//! let source = HkpClient::new(HkpConfig::default(), keyring);
//! let (handle, _worker) = Resolver::spawn(source, verifier, ResolverConfig::default());
//!
//! let mut changes = handle.subscribe();
//! handle.request(KeyId::from_fingerprint_hex(
//!     "2B90 56C0 1793 3F4B 12CA  2E3D F87A 09CB 27AB 7E55",
//! )?)?;
//!
//! while let Ok(snapshot) = changes.recv().await {
//!     redraw(&snapshot);
//! }
//! ```

mod engine;
mod source;

pub use engine::{Resolver, ResolverConfig, ResolverError, ResolverHandle};
pub use source::{FetchError, HkpClient, HkpConfig, ImportError, KeySource, Keyring};
