// relay.rs - CORS-Bypass Keyserver Relay

//! HTTP relay that works around the lack of CORS support on public HKP
//! keyservers.
//!
//! Every inbound request path is forwarded verbatim to the configured
//! keyserver; the upstream status, headers, and body come back unchanged
//! except for an injected `Access-Control-Allow-Origin: *`. Upstream
//! failures answer 404.

use anyhow::Result;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Relay endpoint configuration
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Port to listen on (0 picks an ephemeral port)
    pub listen_port: u16,

    /// Upstream keyserver host
    pub upstream_host: String,

    /// Upstream keyserver port
    pub upstream_port: u16,

    /// Per-request timeout against the upstream
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_port: 11371,
            upstream_host: "subkeys.pgp.net".into(),
            upstream_port: 11371,
            timeout: Duration::from_secs(30),
        }
    }
}

impl RelayConfig {
    /// Set the listen port
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    /// Set the upstream keyserver host
    pub fn with_upstream_host(mut self, host: impl Into<String>) -> Self {
        self.upstream_host = host.into();
        self
    }

    /// Set the upstream keyserver port
    pub fn with_upstream_port(mut self, port: u16) -> Self {
        self.upstream_port = port;
        self
    }
}

struct RelayState {
    client: reqwest::Client,
    base: String,
}

/// A bound relay, ready to serve
pub struct Relay {
    listener: TcpListener,
    router: Router,
}

impl Relay {
    /// Bind the listen socket and prepare the forwarding router
    pub async fn bind(config: RelayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let state = Arc::new(RelayState {
            client,
            base: format!("http://{}:{}", config.upstream_host, config.upstream_port),
        });

        let router = Router::new().fallback(forward).with_state(state);
        let listener = TcpListener::bind(("0.0.0.0", config.listen_port)).await?;

        Ok(Self { listener, router })
    }

    /// The bound local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the task is dropped or the listener fails
    pub async fn serve(self) -> Result<()> {
        info!(addr = %self.listener.local_addr()?, "relay listening");
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}

async fn forward(State(state): State<Arc<RelayState>>, uri: Uri) -> Response {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let target = format!("{}{}", state.base, path_and_query);
    debug!(target = %target, "forwarding request");

    let upstream = match state.client.get(&target).send().await {
        Ok(upstream) => upstream,
        Err(error) => {
            warn!(target = %target, error = %error, "forwarded request failed");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let status = upstream.status();
    let headers = upstream.headers().clone();
    match upstream.bytes().await {
        Ok(body) => relayed(status, &headers, body),
        Err(error) => {
            warn!(target = %target, error = %error, "upstream body read failed");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn relayed(status: StatusCode, upstream_headers: &HeaderMap, body: Bytes) -> Response {
    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in upstream_headers {
            if skip_header(name) {
                continue;
            }
            headers.insert(name.clone(), value.clone());
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
    }
    builder
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::NOT_FOUND.into_response())
}

/// Headers that must not be copied through: connection-scoped ones, plus
/// content-length, which axum recomputes from the buffered body.
fn skip_header(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "content-length"
    )
}
