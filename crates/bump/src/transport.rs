// Peer transport abstraction and the connection handle that owns it

use crate::{BumpError, CorrelationToken, Result};
use async_trait::async_trait;
use std::fmt::Debug;
use tracing::{debug, info};

/// Trait for the transport behind an established peer connection
#[async_trait]
pub trait PeerTransport: Send + Sync + Debug {
    /// Send a chunk of bytes to the connected peer
    async fn send(&self, chunk: &[u8]) -> Result<()>;

    /// Ask the transport to drop the connection
    async fn disconnect(&self) -> Result<()>;

    /// Check if the transport still considers itself connected
    fn is_open(&self) -> bool;
}

/// The single live peer connection of a session
#[derive(Debug)]
pub struct ConnectionHandle {
    peer_username: String,
    token: CorrelationToken,
    is_open: bool,
    transport: Box<dyn PeerTransport>,
}

impl ConnectionHandle {
    pub fn new(peer_username: String, token: CorrelationToken, transport: Box<dyn PeerTransport>) -> Self {
        Self {
            peer_username,
            token,
            is_open: true,
            transport,
        }
    }

    pub fn peer_username(&self) -> &str {
        &self.peer_username
    }

    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    /// Open until closed from either side or until the transport drops the link
    pub fn is_open(&self) -> bool {
        self.is_open && self.transport.is_open()
    }

    /// Send bytes over the transport. A failure leaves the handle open.
    pub async fn send(&self, chunk: &[u8]) -> Result<()> {
        if !self.is_open {
            return Err(BumpError::TransportError("connection is closed".to_string()));
        }

        debug!("Sending {} bytes to {}", chunk.len(), self.peer_username);
        self.transport.send(chunk).await
    }

    /// Close the transport. Only the first call reaches it.
    pub async fn close(&mut self) -> Result<()> {
        if !self.is_open {
            return Ok(());
        }
        self.is_open = false;

        info!("Closing connection to {}", self.peer_username);
        self.transport.disconnect().await
    }

    /// Mark the handle closed without touching the transport.
    /// Used when the remote side already dropped the connection.
    pub fn mark_closed(&mut self) {
        self.is_open = false;
    }
}
