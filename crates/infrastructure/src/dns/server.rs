//! UDP listen loop with task-per-query dispatch.

use ember_dns_application::use_cases::{ResolveOutcome, ResolveQueryUseCase};
use ember_dns_domain::DomainError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Plain DNS datagram limit without EDNS(0).
const MAX_DATAGRAM_SIZE: usize = 512;

/// Runs the listen loop until an "exit" control datagram or ctrl-c.
///
/// Each datagram is resolved on its own task; a slow upstream round trip
/// never blocks other clients. In-flight queries are drained before
/// returning, so a final snapshot save observes every cache update.
pub async fn run_udp_server(
    bind_addr: SocketAddr,
    use_case: Arc<ResolveQueryUseCase>,
) -> Result<(), DomainError> {
    let socket = Arc::new(
        UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::IoError(format!("failed to bind {bind_addr}: {e}")))?,
    );
    info!(bind_address = %bind_addr, "DNS server listening");

    let mut in_flight: JoinSet<()> = JoinSet::new();
    let mut recv_buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        tokio::select! {
            received = socket.recv_from(&mut recv_buf) => {
                let (len, from) = match received {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(error = %e, "recv_from failed");
                        continue;
                    }
                };
                let datagram = &recv_buf[..len];

                if is_exit_datagram(datagram) {
                    info!(client = %from, "Exit datagram received, shutting down");
                    break;
                }

                let raw_query = datagram.to_vec();
                let use_case = use_case.clone();
                let socket = socket.clone();
                in_flight.spawn(async move {
                    match use_case.execute(&raw_query).await {
                        ResolveOutcome::Responded(response) => {
                            if let Err(e) = socket.send_to(&response, from).await {
                                error!(client = %from, error = %e, "Failed to send response");
                            }
                        }
                        ResolveOutcome::Dropped => {
                            debug!(client = %from, "Query dropped, nothing sent");
                        }
                    }
                });

                // Reap finished tasks without blocking the loop.
                while in_flight.try_join_next().is_some() {}
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-c received, shutting down");
                break;
            }
        }
    }

    while in_flight.join_next().await.is_some() {}
    info!("DNS server stopped");
    Ok(())
}

/// Legacy control-plane shutdown: a datagram whose text is "exit",
/// case-insensitively, after trimming whitespace.
fn is_exit_datagram(datagram: &[u8]) -> bool {
    std::str::from_utf8(datagram)
        .map(|text| text.trim().eq_ignore_ascii_case("exit"))
        .unwrap_or(false)
}
