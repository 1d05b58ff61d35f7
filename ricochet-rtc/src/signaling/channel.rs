use futures::{SinkExt, StreamExt};
use ricochet_core::SignalMessage;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info};

/// Upper bound for one JSON line; SDP with a full candidate list stays far below this.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingRole {
    /// Bind the address and wait for exactly one peer.
    Listen,
    /// Connect to a peer that is already listening.
    Dial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalingEndpoint {
    pub addr: SocketAddr,
    pub role: SignalingRole,
}

impl SignalingEndpoint {
    pub fn listen(addr: SocketAddr) -> Self {
        Self {
            addr,
            role: SignalingRole::Listen,
        }
    }

    pub fn dial(addr: SocketAddr) -> Self {
        Self {
            addr,
            role: SignalingRole::Dial,
        }
    }
}

impl fmt::Display for SignalingEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            SignalingRole::Listen => write!(f, "listen {}", self.addr),
            SignalingRole::Dial => write!(f, "dial {}", self.addr),
        }
    }
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("failed to connect signaling channel ({endpoint}): {source}")]
    Connect {
        endpoint: SignalingEndpoint,
        #[source]
        source: io::Error,
    },

    #[error("malformed signaling frame: {0}")]
    Decode(String),

    #[error("failed to encode signaling message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("signaling i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("signaling channel is not connected")]
    NotConnected,
}

impl From<LinesCodecError> for SignalingError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => {
                SignalingError::Decode(format!("line longer than {MAX_LINE_LENGTH} bytes"))
            }
            LinesCodecError::Io(e) if e.kind() == io::ErrorKind::InvalidData => {
                SignalingError::Decode(e.to_string())
            }
            LinesCodecError::Io(e) => SignalingError::Io(e),
        }
    }
}

/// Point-to-point signaling link carrying one JSON message per line.
///
/// A channel starts disconnected; `close` may be called at any point and any
/// number of times.
pub struct SignalingChannel<T = TcpStream> {
    endpoint: Option<SignalingEndpoint>,
    framed: Option<Framed<T, LinesCodec>>,
}

impl SignalingChannel<TcpStream> {
    pub fn new(endpoint: SignalingEndpoint) -> Self {
        Self {
            endpoint: Some(endpoint),
            framed: None,
        }
    }

    /// Establish the TCP link. Blocks until the peer is reachable (dial) or
    /// has connected to us (listen). Calling it on a connected channel is a no-op.
    pub async fn connect(&mut self) -> Result<(), SignalingError> {
        if self.framed.is_some() {
            return Ok(());
        }
        let endpoint = self.endpoint.ok_or(SignalingError::NotConnected)?;
        let connect_err = |source: io::Error| SignalingError::Connect { endpoint, source };

        let stream = match endpoint.role {
            SignalingRole::Listen => {
                let listener = TcpListener::bind(endpoint.addr).await.map_err(connect_err)?;
                info!("Signaling listening on {}", endpoint.addr);
                let (stream, peer) = listener.accept().await.map_err(connect_err)?;
                info!("Signaling peer connected from {}", peer);
                stream
            }
            SignalingRole::Dial => {
                let stream = TcpStream::connect(endpoint.addr)
                    .await
                    .map_err(connect_err)?;
                info!("Signaling connected to {}", endpoint.addr);
                stream
            }
        };
        stream.set_nodelay(true)?;

        self.framed = Some(Self::frame(stream));
        Ok(())
    }
}

impl<T> SignalingChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already established byte stream.
    pub fn from_stream(stream: T) -> Self {
        Self {
            endpoint: None,
            framed: Some(Self::frame(stream)),
        }
    }

    fn frame(stream: T) -> Framed<T, LinesCodec> {
        Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH))
    }

    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<(), SignalingError> {
        let framed = self.framed.as_mut().ok_or(SignalingError::NotConnected)?;
        let line = serde_json::to_string(msg)?;
        framed.send(line).await?;
        Ok(())
    }

    /// Wait for the next complete message. `Ok(None)` means the peer closed the stream.
    ///
    /// Cancel safe: a partially read line stays buffered for the next call.
    pub async fn receive(&mut self) -> Result<Option<SignalMessage>, SignalingError> {
        let framed = self.framed.as_mut().ok_or(SignalingError::NotConnected)?;

        loop {
            let Some(line) = framed.next().await else {
                return Ok(None);
            };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            return serde_json::from_str(&line)
                .map(Some)
                .map_err(|e| SignalingError::Decode(e.to_string()));
        }
    }

    pub async fn close(&mut self) {
        let Some(mut framed) = self.framed.take() else {
            return;
        };
        if let Err(e) = SinkExt::<String>::close(&mut framed).await {
            debug!("Signaling close error (ignored): {}", e);
        }
    }
}
