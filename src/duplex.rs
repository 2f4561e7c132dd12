//! The byte-channel contract the fragmenting adapter wraps, plus an
//! in-memory double used by the adapter's own tests and by `demos/`.
//!
//! A duplex is a pair of independent read and write paths, each of which can
//! fail on its own, joined under one handle for lifecycle calls (`on_close`,
//! `dispose`, `is_disposed`, `availability`).

use crate::error::Error;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

/// A raw byte-frame duplex connection: the thing [`crate::adapter`] wraps.
///
/// Buffers exchanged here are wire fragments — optionally length-prefixed,
/// per whatever `encode_length` the adapter was built with — never
/// reassembled logical frames. Implementations are expected to preserve
/// send order and never interleave concurrent `send`/`send_one` calls.
#[async_trait]
pub trait DuplexConnection: Send + Sync {
    /// Sends one already-encoded wire fragment; completes when the
    /// underlying write completes.
    async fn send_one(&self, fragment: Bytes) -> Result<(), Error>;

    /// Sends an ordered sequence of wire fragments with no interleaving.
    async fn send(&self, fragments: Vec<Bytes>) -> Result<(), Error> {
        for fragment in fragments {
            self.send_one(fragment).await?;
        }
        Ok(())
    }

    /// The stream of inbound wire fragments, in arrival order.
    fn receive(&self) -> ReceiverStream<Result<Bytes, Error>>;

    /// Signals a graceful close of the underlying channel.
    async fn on_close(&self) -> Result<(), Error>;

    /// Tears the connection down; idempotent.
    async fn dispose(&self);

    /// Whether [`DuplexConnection::dispose`] has already run.
    fn is_disposed(&self) -> bool;

    /// A `0.0..=1.0` signal of how willing this connection is to accept more
    /// work right now; `0.0` once disposed.
    fn availability(&self) -> f64;
}

/// An in-memory [`DuplexConnection`] backed by a channel, for tests and
/// `demos/`. Fragments sent in are handed straight back out through
/// `receive()` in the same order — there is no real transport underneath.
pub struct InMemoryDuplex {
    inbound_tx: mpsc::Sender<Result<Bytes, Error>>,
    inbound_rx: Mutex<Option<mpsc::Receiver<Result<Bytes, Error>>>>,
    sent: Mutex<Vec<Bytes>>,
    disposed: AtomicBool,
}

impl InMemoryDuplex {
    pub fn new(channel_capacity: usize) -> Arc<Self> {
        let (inbound_tx, inbound_rx) = mpsc::channel(channel_capacity);
        Arc::new(InMemoryDuplex {
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            sent: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        })
    }

    /// Pushes a wire fragment into this duplex's inbound side, as if it had
    /// just arrived from the peer.
    pub async fn deliver(&self, fragment: Bytes) -> Result<(), Error> {
        self.inbound_tx
            .send(Ok(fragment))
            .await
            .map_err(|_| Error::TransportFailure {
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer gone"),
            })
    }

    /// Every fragment handed to `send`/`send_one` so far, in order.
    pub async fn sent_fragments(&self) -> Vec<Bytes> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl DuplexConnection for InMemoryDuplex {
    async fn send_one(&self, fragment: Bytes) -> Result<(), Error> {
        if self.is_disposed() {
            return Err(Error::TransportFailure {
                source: std::io::Error::new(std::io::ErrorKind::NotConnected, "duplex disposed"),
            });
        }
        self.sent.lock().await.push(fragment);
        Ok(())
    }

    fn receive(&self) -> ReceiverStream<Result<Bytes, Error>> {
        let receiver = self
            .inbound_rx
            .try_lock()
            .expect("receive() called concurrently with itself")
            .take()
            .expect("receive() called more than once on the same InMemoryDuplex");
        ReceiverStream::new(receiver)
    }

    async fn on_close(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn availability(&self) -> f64 {
        if self.is_disposed() {
            0.0
        } else {
            1.0
        }
    }
}
