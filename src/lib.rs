// lib.rs - Incremental Web-of-Trust Graph Engine
//
// Grows a graph of PGP keys and certification signatures outward from a
// root key, fetching keys from an HKP keyserver as certifications
// reference unknown issuers.

#![doc = include_str!("../README.md")]

pub mod graph;
pub mod keys;
pub mod observability;
pub mod relay;
pub mod resolver;

// Re-export commonly used types
pub use graph::{GraphSnapshot, LinkView, NodeView, SigStatus, SigView, TrustGraph};

pub use keys::{Certification, KeyId, KeyIdError, KeyMaterial, Verifier};

pub use resolver::{
    FetchError, HkpClient, HkpConfig, KeySource, Keyring, Resolver, ResolverConfig,
    ResolverError, ResolverHandle,
};

pub use observability::{init_tracing, TracingConfig, TracingFormat};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::graph::{GraphSnapshot, SigStatus, TrustGraph};
    pub use crate::keys::{Certification, KeyId, KeyMaterial, Verifier};
    pub use crate::resolver::{
        HkpClient, HkpConfig, KeySource, Keyring, Resolver, ResolverConfig, ResolverHandle,
    };
}
