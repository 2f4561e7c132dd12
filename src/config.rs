/// Configuration for a [`crate::adapter::FragmentingDuplexAdapter`].
///
/// A plain value type with a sensible `Default`, passed by value into the
/// adapter and cloned into whichever pieces need their own copy (the
/// fragmenter reads `mtu` and `encode_length` per call, the reassembler
/// reads `max_reassembly_size` once at construction).
#[derive(Debug, Clone)]
pub struct FragmentationConfig {
    /// Maximum wire size of any single fragment, header included. `0` (or
    /// anything that can't fit a header plus at least one content byte)
    /// disables fragmentation: every frame is sent as a single fragment
    /// regardless of size.
    pub mtu: usize,

    /// Whether each emitted wire fragment is prefixed with a 24-bit
    /// big-endian length, for transports that aren't self-delimiting
    /// (raw TCP). WebSocket- or framed-message transports leave this off.
    pub encode_length: bool,

    /// Upper bound on the accumulated metadata+data size of an in-progress
    /// reassembly chain. `None` means unbounded.
    pub max_reassembly_size: Option<usize>,
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        FragmentationConfig {
            mtu: 0,
            encode_length: false,
            max_reassembly_size: Some(16 << 20),
        }
    }
}

impl FragmentationConfig {
    /// Returns `true` when `mtu` is large enough to hold a 6-byte header
    /// plus at least one byte of content; anything smaller means
    /// fragmentation is effectively disabled.
    pub fn fragmentation_enabled(&self) -> bool {
        self.mtu > crate::frame::HEADER_SIZE
    }
}
