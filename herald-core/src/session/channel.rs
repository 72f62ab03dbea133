//! Push channel abstraction and the queue-backed implementation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

/// Unique channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Generates a new unique channel ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the inner ID value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chan-{}", self.0)
    }
}

/// Transport-level push failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel has been closed.
    #[error("channel closed")]
    Closed,
    /// The outbound queue is full.
    #[error("channel queue full")]
    Full,
    /// The send did not complete in time.
    #[error("send timed out")]
    Timeout,
    /// The transport reported an error.
    #[error("transport error: {0}")]
    Transport(String),
}

/// A duplex connection that accepts pushed frames.
#[async_trait]
pub trait PushChannel: Send + Sync + fmt::Debug {
    /// Identifier of this channel instance.
    fn id(&self) -> ChannelId;

    /// Sends one serialized frame. Exactly one attempt is made; a channel
    /// that cannot take the frame right away fails instead of waiting.
    async fn push(&self, frame: String) -> Result<(), ChannelError>;

    /// Signals the transport to close. Idempotent.
    fn close(&self);

    /// Returns true once the channel can no longer accept frames.
    fn is_closed(&self) -> bool;
}

/// Channel backed by a bounded queue drained by a transport task.
#[derive(Debug)]
pub struct QueuedChannel {
    id: ChannelId,
    frames: mpsc::Sender<String>,
    closed: watch::Sender<bool>,
}

/// Transport side of a [`QueuedChannel`].
#[derive(Debug)]
pub struct ChannelReceiver {
    id: ChannelId,
    frames: mpsc::Receiver<String>,
    closed: watch::Receiver<bool>,
}

impl QueuedChannel {
    /// Creates a channel with room for `capacity` queued frames.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, ChannelReceiver) {
        let id = ChannelId::generate();
        let (frames_tx, frames_rx) = mpsc::channel(capacity.max(1));
        let (closed_tx, closed_rx) = watch::channel(false);

        (
            Self {
                id,
                frames: frames_tx,
                closed: closed_tx,
            },
            ChannelReceiver {
                id,
                frames: frames_rx,
                closed: closed_rx,
            },
        )
    }
}

#[async_trait]
impl PushChannel for QueuedChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    async fn push(&self, frame: String) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.frames.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => ChannelError::Full,
            TrySendError::Closed(_) => ChannelError::Closed,
        })
    }

    fn close(&self) {
        self.closed.send_replace(true);
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow() || self.frames.is_closed()
    }
}

impl ChannelReceiver {
    /// Identifier of the paired channel.
    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    /// Receives the next queued frame.
    ///
    /// Frames accepted before a close are still handed out. Returns `None`
    /// once the channel is closed (or its handle dropped) and the queue is
    /// empty.
    pub async fn recv(&mut self) -> Option<String> {
        if let Ok(frame) = self.frames.try_recv() {
            return Some(frame);
        }
        tokio::select! {
            biased;
            frame = self.frames.recv() => frame,
            () = wait_closed(&mut self.closed) => self.frames.try_recv().ok(),
        }
    }

    /// Completes when the channel is closed or its handle is dropped.
    pub async fn closed(&mut self) {
        wait_closed(&mut self.closed).await;
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    loop {
        if *closed.borrow_and_update() {
            return;
        }
        if closed.changed().await.is_err() {
            return;
        }
    }
}
