// bin/relay.rs - Keyserver Relay Binary

use anyhow::Result;
use clap::Parser;
use tracing::info;

use keyweb::observability::{init_tracing, TracingConfig, TracingFormat};
use keyweb::relay::{Relay, RelayConfig};

/// CORS-bypass keyserver relay
#[derive(Parser, Debug)]
#[command(name = "keyweb-relay")]
#[command(version)]
#[command(about = "Forwards HKP requests to a keyserver and adds CORS headers", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "11371")]
    listen_port: u16,

    /// Upstream keyserver host
    #[arg(short, long, default_value = "subkeys.pgp.net")]
    keyserver: String,

    /// Upstream keyserver port
    #[arg(long, default_value = "11371")]
    keyserver_port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (pretty, compact, json)
    #[arg(long, default_value = "pretty")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(TracingConfig {
        filter: format!("{},keyweb={}", args.log_level, args.log_level),
        format: match args.log_format.as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        },
        with_ansi: args.log_format != "json",
        ..Default::default()
    });

    info!(
        keyserver = %args.keyserver,
        keyserver_port = args.keyserver_port,
        "Starting keyserver relay"
    );

    let relay = Relay::bind(
        RelayConfig::default()
            .with_listen_port(args.listen_port)
            .with_upstream_host(args.keyserver)
            .with_upstream_port(args.keyserver_port),
    )
    .await?;

    tokio::select! {
        result = relay.serve() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}
