//! Host bridge
//!
//! The query seam between the shell and the host: one request batch in,
//! one reply batch out. `UnixSocketBridge` carries batches as framed JSON
//! over the host socket.

use framesync_proto::{FramedMessage, MAX_FRAME_LEN};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Why a round trip failed
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("host unreachable: {0}")]
    Unreachable(#[from] io::Error),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("host closed the connection")]
    Closed,

    #[error("reply frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Pending reply of a query
pub type QueryFuture = Pin<Box<dyn Future<Output = Result<String, TransportError>> + Send>>;

/// Something that answers request batches
pub trait HostBridge {
    /// Send one encoded batch and resolve to the encoded reply batch
    fn query(&self, request: String) -> QueryFuture;
}

/// Bridge over the host's Unix socket
///
/// The connection is opened on first use and dropped after any failure, so
/// the next query reconnects.
pub struct UnixSocketBridge {
    path: PathBuf,
    timeout: Duration,
    stream: Arc<Mutex<Option<UnixStream>>>,
}

impl UnixSocketBridge {
    pub fn new(path: PathBuf, timeout: Duration) -> Self {
        info!("Host bridge at {:?} (timeout {:?})", path, timeout);
        Self {
            path,
            timeout,
            stream: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostBridge for UnixSocketBridge {
    fn query(&self, request: String) -> QueryFuture {
        let path = self.path.clone();
        let timeout = self.timeout;
        let stream = Arc::clone(&self.stream);

        Box::pin(async move {
            let mut slot = stream.lock().await;
            let result = match tokio::time::timeout(timeout, round_trip(&mut slot, &path, request)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(timeout)),
            };
            if result.is_err() {
                *slot = None;
            }
            result
        })
    }
}

async fn round_trip(
    slot: &mut Option<UnixStream>,
    path: &Path,
    request: String,
) -> Result<String, TransportError> {
    if slot.is_none() {
        debug!("Connecting to host at {:?}", path);
        *slot = Some(UnixStream::connect(path).await?);
    }
    let Some(stream) = slot.as_mut() else {
        return Err(TransportError::Closed);
    };

    stream
        .write_all(&FramedMessage::from_payload(request).encode())
        .await?;

    // Read length prefix
    let mut len_buf = [0u8; 4];
    if let Err(e) = stream.read_exact(&mut len_buf).await {
        return Err(match e.kind() {
            io::ErrorKind::UnexpectedEof => TransportError::Closed,
            _ => e.into(),
        });
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(len));
    }

    let mut msg_buf = vec![0u8; len];
    stream.read_exact(&mut msg_buf).await?;

    FramedMessage { data: msg_buf }
        .into_text()
        .map_err(|e| TransportError::Protocol(e.to_string()))
}
