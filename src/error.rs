use std::io;
use thiserror::Error;

/// Errors raised by the fragmentation/reassembly layer.
///
/// These map one-to-one onto the error kinds a caller needs to react to
/// differently: a single bad frame (`InvalidFrameType`), a connection that
/// can no longer be trusted to contain frame boundaries
/// (`MalformedFrame`), a reassembly chain that violated the state machine
/// (`ReassemblyProtocolViolation`), one that grew past its configured cap
/// (`ReassemblyTooLarge`), or the underlying duplex itself failing
/// (`TransportFailure`).
#[derive(Error, Debug)]
pub enum Error {
    /// A frame reached the fragmenter with a type that can't legally be
    /// fragmented, or reached the reassembler with a type that can't
    /// legally appear where it did.
    #[error("invalid frame type for this operation")]
    InvalidFrameType,

    /// Not enough bytes for the declared header, metadata length, or
    /// payload length. Fatal for the connection: there is no way to know
    /// where the next frame starts.
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    /// A non-PAYLOAD continuation arrived mid-chain, a chain's stream id
    /// changed mid-flight, or a terminal fragment was expected but never
    /// arrived before something else did.
    #[error("reassembly protocol violation on stream {stream_id}: {reason}")]
    ReassemblyProtocolViolation {
        stream_id: u32,
        reason: &'static str,
    },

    /// The accumulated metadata+data for a stream's in-progress chain
    /// exceeded the configured `max_reassembly_size`.
    #[error("reassembly for stream {stream_id} exceeded the configured size cap ({limit} bytes)")]
    ReassemblyTooLarge { stream_id: u32, limit: usize },

    /// The underlying duplex connection failed; propagated unchanged.
    #[error("transport failure: {source}")]
    TransportFailure {
        #[from]
        source: io::Error,
    },
}
