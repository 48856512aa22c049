//! Single-shot UDP upstream client.
//!
//! One ephemeral socket per call: bind, connect, send once, await one
//! datagram under a deadline. No retry, no fallback server, no TCP.

use async_trait::async_trait;
use ember_dns_application::ports::UpstreamClient;
use ember_dns_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Plain DNS datagram limit without EDNS(0).
const MAX_DATAGRAM_SIZE: usize = 512;

pub struct UdpUpstream {
    server_addr: SocketAddr,
    timeout: Duration,
}

impl UdpUpstream {
    pub fn new(server_addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            server_addr,
            timeout,
        }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }
}

#[async_trait]
impl UpstreamClient for UdpUpstream {
    async fn query(&self, raw_query: &[u8]) -> Result<Vec<u8>, DomainError> {
        let bind_addr: SocketAddr = if self.server_addr.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::IoError(format!("failed to bind upstream socket: {e}")))?;
        socket.connect(self.server_addr).await.map_err(|e| {
            DomainError::IoError(format!("failed to connect to {}: {e}", self.server_addr))
        })?;
        socket
            .send(raw_query)
            .await
            .map_err(|e| DomainError::IoError(format!("failed to send query: {e}")))?;

        let mut recv_buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let len = tokio::time::timeout(self.timeout, socket.recv(&mut recv_buf))
            .await
            .map_err(|_| {
                warn!(server = %self.server_addr, "Upstream query timed out");
                DomainError::UpstreamTimeout
            })?
            .map_err(|e| DomainError::IoError(format!("failed to receive reply: {e}")))?;
        recv_buf.truncate(len);

        debug!(server = %self.server_addr, bytes = len, "Upstream reply received");
        Ok(recv_buf)
    }
}
