use bitflags::bitflags;
use bytes::Bytes;

/// Size of the fixed frame header: a 31-bit stream id (plus one reserved
/// bit) followed by a 16-bit word packing the 6-bit frame type and the
/// 10-bit flags field.
pub const HEADER_SIZE: usize = 6;

/// Size of the metadata length prefix that precedes metadata bytes when
/// the `M` flag is set.
pub const METADATA_LENGTH_SIZE: usize = 3;

/// Size of the optional per-write frame length prefix (`encode_length`).
pub const FRAME_LENGTH_SIZE: usize = 3;

/// Size of the `initial_request_n` prefix carried by the first fragment of
/// a REQUEST_STREAM or REQUEST_CHANNEL frame.
pub const INITIAL_REQUEST_N_SIZE: usize = 4;

/// Highest legal stream id: 31 bits, the top bit of the header's first
/// word is reserved and must stay zero. `initial_request_n` shares the
/// same 31-bit-plus-reserved-bit shape, so this mask doubles for that
/// field too.
pub const MAX_STREAM_ID: u32 = 0x7FFF_FFFF;

bitflags! {
    /// The 10-bit flags field packed alongside the frame type.
    ///
    /// Only the four named flags get their own bit constant; any
    /// other bit in the 10-bit field round-trips through [`Flags::bits`]
    /// without a dedicated accessor. REQUEST_CHANNEL's "last" bit (`L`)
    /// is not a distinct bit position in the wire format — it reuses `C`
    /// (see [`Flags::channel_last`]).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u16 {
        /// Metadata present.
        const M = 0x100;
        /// More fragments follow this one.
        const F = 0x80;
        /// Stream complete (PAYLOAD), or initial request already complete
        /// (REQUEST_CHANNEL, where this bit is read as `L`).
        const C = 0x40;
        /// Next: payload data and/or metadata present (PAYLOAD).
        const N = 0x20;
    }
}

impl Flags {
    pub fn m(&self) -> bool {
        self.contains(Flags::M)
    }
    pub fn f(&self) -> bool {
        self.contains(Flags::F)
    }
    pub fn c(&self) -> bool {
        self.contains(Flags::C)
    }
    pub fn n(&self) -> bool {
        self.contains(Flags::N)
    }

    /// REQUEST_CHANNEL's "last" bit: the initial request is itself
    /// complete and no further `REQUEST_N` is needed. Same bit as `C`.
    pub fn channel_last(&self) -> bool {
        self.contains(Flags::C)
    }
}

/// The 6-bit frame type carried in every header.
///
/// `Unknown` preserves any header value outside the numbered set so that
/// `parse_header` never fails on an otherwise well-formed header — an
/// unrecognized type is only an error once something tries to act on the
/// frame (see [`crate::error::Error::InvalidFrameType`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Setup,
    Lease,
    Keepalive,
    RequestResponse,
    RequestFnf,
    RequestStream,
    RequestChannel,
    RequestN,
    Cancel,
    Payload,
    Error,
    MetadataPush,
    Resume,
    ResumeOk,
    Ext,
    Unknown(u8),
}

impl FrameType {
    pub fn from_u8(byte: u8) -> FrameType {
        match byte & 0x3F {
            1 => FrameType::Setup,
            2 => FrameType::Lease,
            3 => FrameType::Keepalive,
            4 => FrameType::RequestResponse,
            5 => FrameType::RequestFnf,
            6 => FrameType::RequestStream,
            7 => FrameType::RequestChannel,
            8 => FrameType::RequestN,
            9 => FrameType::Cancel,
            10 => FrameType::Payload,
            11 => FrameType::Error,
            12 => FrameType::MetadataPush,
            13 => FrameType::Resume,
            14 => FrameType::ResumeOk,
            63 => FrameType::Ext,
            other => FrameType::Unknown(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            FrameType::Setup => 1,
            FrameType::Lease => 2,
            FrameType::Keepalive => 3,
            FrameType::RequestResponse => 4,
            FrameType::RequestFnf => 5,
            FrameType::RequestStream => 6,
            FrameType::RequestChannel => 7,
            FrameType::RequestN => 8,
            FrameType::Cancel => 9,
            FrameType::Payload => 10,
            FrameType::Error => 11,
            FrameType::MetadataPush => 12,
            FrameType::Resume => 13,
            FrameType::ResumeOk => 14,
            FrameType::Ext => 63,
            FrameType::Unknown(byte) => *byte & 0x3F,
        }
    }

    /// Types whose payload may legally be split across multiple wire
    /// fragments. Every other type is emitted as-is regardless of size.
    pub fn is_fragmentable(&self) -> bool {
        matches!(
            self,
            FrameType::RequestResponse
                | FrameType::RequestFnf
                | FrameType::RequestStream
                | FrameType::RequestChannel
                | FrameType::Payload
        )
    }

    /// Whether this type carries a 4-byte `initial_request_n` prefix on
    /// its first fragment.
    pub fn has_initial_request_n(&self) -> bool {
        matches!(self, FrameType::RequestStream | FrameType::RequestChannel)
    }
}

/// The synthetic inbound-only aliases derived from a PAYLOAD
/// frame's `N`/`C` flags. These never appear on the wire as distinct frame
/// types; they exist only as a way to name what a fully-reassembled
/// PAYLOAD frame means to the layer above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalFrameKind {
    /// Any non-PAYLOAD wire type, named as itself.
    Plain(FrameType),
    Next,
    Complete,
    NextComplete,
}

/// A logical RSocket frame: the complete, possibly-reassembled unit as
/// seen by the protocol engine above this layer.
///
/// `metadata`/`data` are [`Bytes`] rather than owned `Vec<u8>` so that
/// slicing a frame's payload region (see [`crate::codec`]) is a reference
/// count bump, not a copy, matching the zero-copy slicing contract this
/// layer promises callers.
#[derive(Debug, Clone)]
pub struct Frame {
    pub stream_id: u32,
    pub frame_type: FrameType,
    pub flags: Flags,
    pub initial_request_n: Option<u32>,
    pub metadata: Option<Bytes>,
    pub data: Bytes,
}

impl Frame {
    pub fn new(stream_id: u32, frame_type: FrameType, flags: Flags, data: Bytes) -> Self {
        Frame {
            stream_id: stream_id & MAX_STREAM_ID,
            frame_type,
            flags,
            initial_request_n: None,
            metadata: None,
            data,
        }
    }

    pub fn with_metadata(mut self, metadata: Bytes) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_initial_request_n(mut self, initial_request_n: u32) -> Self {
        self.initial_request_n = Some(initial_request_n);
        self
    }

    pub fn is_fragmentable(&self) -> bool {
        self.frame_type.is_fragmentable()
    }

    /// Length of the metadata+data payload region only (no header, no
    /// type-specific prefix, no length prefixes) — the part a fragmenter
    /// splits across wire fragments.
    pub fn payload_len(&self) -> usize {
        let metadata_len = self
            .metadata
            .as_ref()
            .map(|m| METADATA_LENGTH_SIZE + m.len())
            .unwrap_or(0);
        metadata_len + self.data.len()
    }

    /// Total on-wire length of this frame if emitted as a single
    /// fragment (header + type-specific prefix + metadata length prefix +
    /// metadata + data), not counting the optional outer frame-length
    /// prefix.
    pub fn wire_len(&self) -> usize {
        let prefix_len = if self.frame_type.has_initial_request_n() {
            INITIAL_REQUEST_N_SIZE
        } else {
            0
        };
        HEADER_SIZE + prefix_len + self.payload_len()
    }

    pub fn logical_kind(&self) -> LogicalFrameKind {
        if self.frame_type == FrameType::Payload {
            match (self.flags.n(), self.flags.c()) {
                (true, true) => LogicalFrameKind::NextComplete,
                (true, false) => LogicalFrameKind::Next,
                (false, true) => LogicalFrameKind::Complete,
                (false, false) => LogicalFrameKind::Plain(FrameType::Payload),
            }
        } else {
            LogicalFrameKind::Plain(self.frame_type)
        }
    }
}
