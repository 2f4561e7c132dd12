//! The fragmenting duplex adapter (component C4 of the design): the public
//! entry point. Wraps a [`DuplexConnection`], splitting oversized outbound
//! frames through [`crate::fragment`] and reassembling inbound wire
//! fragments through [`crate::reassemble`].
//!
//! The receive side is a hand-rolled [`Stream`] impl: poll the underlying
//! duplex, feed whatever arrives through the reassembler, and loop back for
//! more input whenever the reassembler says "not yet" instead of waking the
//! task and returning pending — reassembly itself never blocks, so looping
//! costs nothing the executor wasn't already going to spend.

use crate::codec::encode_frame;
use crate::config::FragmentationConfig;
use crate::duplex::DuplexConnection;
use crate::error::Error;
use crate::fragment::fragment;
use crate::frame::Frame;
use crate::reassemble::Reassembler;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio_stream::wrappers::ReceiverStream;

/// Wraps one [`DuplexConnection`] with transparent fragmentation on send and
/// reassembly on receive.
pub struct FragmentingDuplexAdapter<D> {
    duplex: Arc<D>,
    config: FragmentationConfig,
    reassembler: Arc<Mutex<Reassembler>>,
}

impl<D: DuplexConnection> FragmentingDuplexAdapter<D> {
    pub fn new(duplex: Arc<D>, config: FragmentationConfig) -> Self {
        let reassembler = Reassembler::new(config.max_reassembly_size);
        FragmentingDuplexAdapter {
            duplex,
            config,
            reassembler: Arc::new(Mutex::new(reassembler)),
        }
    }

    /// Sends one logical frame, fragmenting it first if it is a
    /// fragmentable type whose encoded length exceeds the configured MTU.
    pub async fn send_one(&self, frame: Frame) -> Result<(), Error> {
        if self.config.fragmentation_enabled()
            && frame.is_fragmentable()
            && frame.wire_len() > self.config.mtu
        {
            let fragments = fragment(&frame, self.config.mtu, self.config.encode_length)?;
            self.duplex.send(fragments).await
        } else {
            let wire = encode_frame(&frame, self.config.encode_length);
            self.duplex.send_one(wire).await
        }
    }

    /// Sends an ordered sequence of logical frames with no interleaving:
    /// one frame's fragments are fully written before the next frame's send
    /// begins.
    pub async fn send(&self, frames: Vec<Frame>) -> Result<(), Error> {
        for frame in frames {
            self.send_one(frame).await?;
        }
        Ok(())
    }

    /// The stream of reassembled logical frames. Call once per adapter —
    /// like the underlying duplex's own `receive()`, a second call will
    /// find nothing left to read from.
    pub fn receive(&self) -> ReceivedFrames {
        ReceivedFrames {
            inbound: self.duplex.receive(),
            reassembler: self.reassembler.clone(),
            encode_length: self.config.encode_length,
        }
    }

    pub async fn on_close(&self) -> Result<(), Error> {
        self.duplex.on_close().await
    }

    /// Disposes the underlying duplex and discards any in-progress
    /// reassembly state.
    pub async fn dispose(&self) {
        self.duplex.dispose().await;
        self.reassembler.lock().unwrap().dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.duplex.is_disposed()
    }

    pub fn availability(&self) -> f64 {
        self.duplex.availability()
    }
}

/// Stream of reassembled logical frames produced by
/// [`FragmentingDuplexAdapter::receive`].
pub struct ReceivedFrames {
    inbound: ReceiverStream<Result<Bytes, Error>>,
    reassembler: Arc<Mutex<Reassembler>>,
    encode_length: bool,
}

impl Stream for ReceivedFrames {
    type Item = Result<Frame, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match Pin::new(&mut this.inbound).poll_next(cx) {
                Poll::Ready(Some(Ok(wire))) => {
                    let mut reassembler = this.reassembler.lock().unwrap();
                    match reassembler.reassemble(&wire, this.encode_length) {
                        Ok(Some(frame)) => return Poll::Ready(Some(Ok(frame))),
                        Ok(None) => continue,
                        Err(err) => return Poll::Ready(Some(Err(err))),
                    }
                }
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Some(Err(err))),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
