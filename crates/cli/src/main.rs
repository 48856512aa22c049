use clap::Parser;
use ember_dns_application::use_cases::ResolveQueryUseCase;
use ember_dns_domain::CliOverrides;
use ember_dns_infrastructure::dns::{server, snapshot, DnsCache, UdpUpstream};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod bootstrap;

#[derive(Parser)]
#[command(name = "ember-dns")]
#[command(version)]
#[command(about = "Caching DNS forwarding resolver")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS listen port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Upstream server (host:port)
    #[arg(short = 'u', long)]
    upstream: Option<String>,

    /// Cache snapshot file path
    #[arg(long)]
    cache_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        port: cli.port,
        bind_address: cli.bind.clone(),
        upstream: cli.upstream.clone(),
        snapshot_path: cli.cache_file.clone(),
        log_level: cli.log_level.clone(),
    };
    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
    bootstrap::init_logging(&config);

    info!("Starting ember-dns v{}", env!("CARGO_PKG_VERSION"));

    let cache = Arc::new(DnsCache::new());
    let snapshot_path = PathBuf::from(&config.cache.snapshot_path);
    snapshot::load(&snapshot_path, &cache);

    let upstream_addr: SocketAddr = config.dns.upstream.parse().map_err(|e| {
        anyhow::anyhow!("invalid upstream address '{}': {e}", config.dns.upstream)
    })?;
    let upstream = Arc::new(UdpUpstream::new(
        upstream_addr,
        Duration::from_secs(config.dns.query_timeout_secs),
    ));

    let use_case = Arc::new(ResolveQueryUseCase::new(cache.clone(), upstream));

    let bind_addr: SocketAddr =
        format!("{}:{}", config.server.bind_address, config.server.port).parse()?;
    if let Err(e) = server::run_udp_server(bind_addr, use_case).await {
        error!(error = %e, "DNS server error");
    }

    // The process is terminating either way; a failed save only loses
    // warm-cache state for the next start.
    if let Err(e) = snapshot::save(&snapshot_path, &cache) {
        error!(error = %e, "Failed to write cache snapshot");
    }
    info!("Server stopped");
    Ok(())
}
