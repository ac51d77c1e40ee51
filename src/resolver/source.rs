// resolver/source.rs - Key Source Seam and HKP Keyserver Client

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::keys::{KeyId, KeyMaterial};

/// Errors from fetching and importing a key
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Keyserver returned HTTP {code}")]
    Status { code: u16 },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Key import failed: {0}")]
    Import(#[from] ImportError),
}

/// Failure reported by the external key store while importing fetched
/// material
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ImportError(pub String);

/// The abstract "fetch keys for this key id" capability the resolver
/// depends on.
///
/// A successful fetch returns only the keys *newly* imported into the
/// external key store; an empty list on success means the store already
/// held everything the response carried, which the resolver logs as an
/// import mismatch.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Fetch and import the key material for `id`
    async fn fetch(&self, id: KeyId) -> Result<Vec<KeyMaterial>, FetchError>;
}

/// The external PGP key store seam.
///
/// Parsing armored key blocks is the collaborator's job; the engine only
/// sees the resulting [`KeyMaterial`] for keys the store did not already
/// hold.
pub trait Keyring: Send + Sync {
    /// Import armored key material, returning the newly imported keys
    fn import(&self, armored: &str) -> Result<Vec<KeyMaterial>, ImportError>;
}

/// Keyserver endpoint configuration
#[derive(Clone, Debug)]
pub struct HkpConfig {
    /// Keyserver host name or address
    pub host: String,

    /// Keyserver port (HKP convention is 11371)
    pub port: u16,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for HkpConfig {
    fn default() -> Self {
        Self {
            host: "sks.keyservers.net".into(),
            port: 11371,
            timeout: Duration::from_secs(30),
        }
    }
}

impl HkpConfig {
    /// Set the keyserver host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the keyserver port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The lookup URL for `id`, per the HKP convention
    pub fn lookup_url(&self, id: KeyId) -> String {
        format!(
            "http://{}:{}/pks/lookup?op=get&search=0x{}",
            self.host, self.port, id
        )
    }
}

/// HKP keyserver client: fetches armored key blocks over HTTP and hands
/// them to a [`Keyring`] for import.
pub struct HkpClient<R> {
    client: reqwest::Client,
    config: HkpConfig,
    keyring: R,
}

impl<R: Keyring> HkpClient<R> {
    /// Create a client against the configured keyserver
    pub fn new(config: HkpConfig, keyring: R) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            config,
            keyring,
        }
    }
}

#[async_trait]
impl<R: Keyring> KeySource for HkpClient<R> {
    async fn fetch(&self, id: KeyId) -> Result<Vec<KeyMaterial>, FetchError> {
        let url = self.config.lookup_url(id);
        debug!(id = %id, url = %url, "fetching key");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                code: response.status().as_u16(),
            });
        }

        let armored = response.text().await?;
        Ok(self.keyring.import(&armored)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashSet;
    use std::net::SocketAddr;
    use std::sync::Mutex;

    /// Keyring stub that understands one `hexid|user id` entry per line
    /// and remembers what it has already imported.
    struct LineKeyring {
        seen: Mutex<HashSet<KeyId>>,
    }

    impl LineKeyring {
        fn new() -> Self {
            Self {
                seen: Mutex::new(HashSet::new()),
            }
        }
    }

    impl Keyring for LineKeyring {
        fn import(&self, armored: &str) -> Result<Vec<KeyMaterial>, ImportError> {
            let mut seen = self.seen.lock().unwrap();
            let mut fresh = Vec::new();
            for line in armored.lines().filter(|l| !l.trim().is_empty()) {
                let (id_part, user) = line
                    .split_once('|')
                    .ok_or_else(|| ImportError(format!("unparseable key block: {line}")))?;
                let id = KeyId::from_hex(id_part)
                    .map_err(|e| ImportError(e.to_string()))?;
                if seen.insert(id) {
                    fresh.push(KeyMaterial::new(id, vec![user.to_string()]));
                }
            }
            Ok(fresh)
        }
    }

    async fn spawn_stub(status: StatusCode, body: &'static str) -> SocketAddr {
        let app = Router::new().route(
            "/pks/lookup",
            get(move || async move { (status, body) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr) -> HkpClient<LineKeyring> {
        let config = HkpConfig::default()
            .with_host(addr.ip().to_string())
            .with_port(addr.port());
        HkpClient::new(config, LineKeyring::new())
    }

    #[test]
    fn test_lookup_url_format() {
        let config = HkpConfig::default();
        let id = KeyId::from_hex("f87a09cb27ab7e55").unwrap();
        assert_eq!(
            config.lookup_url(id),
            "http://sks.keyservers.net:11371/pks/lookup?op=get&search=0xf87a09cb27ab7e55"
        );
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let addr = spawn_stub(
            StatusCode::OK,
            "0102030405060708|Alice Example <alice@example.org>",
        )
        .await;
        let client = client_for(addr);

        let id = KeyId::from_hex("0102030405060708").unwrap();
        let keys = client.fetch(id).await.unwrap();

        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].id, id);
        assert_eq!(
            keys[0].primary_user_id(),
            Some("Alice Example <alice@example.org>")
        );
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let addr = spawn_stub(StatusCode::NOT_FOUND, "no such key").await;
        let client = client_for(addr);

        let id = KeyId::from_bytes([9; 8]);
        match client.fetch(id).await {
            Err(FetchError::Status { code }) => assert_eq!(code, 404),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_import_failure() {
        let addr = spawn_stub(StatusCode::OK, "this is not a key block").await;
        let client = client_for(addr);

        let id = KeyId::from_bytes([9; 8]);
        assert!(matches!(
            client.fetch(id).await,
            Err(FetchError::Import(_))
        ));
    }

    #[tokio::test]
    async fn test_refetch_imports_nothing_new() {
        let addr = spawn_stub(
            StatusCode::OK,
            "0102030405060708|Alice Example <alice@example.org>",
        )
        .await;
        let client = client_for(addr);

        let id = KeyId::from_hex("0102030405060708").unwrap();
        assert_eq!(client.fetch(id).await.unwrap().len(), 1);
        assert!(client.fetch(id).await.unwrap().is_empty());
    }
}
