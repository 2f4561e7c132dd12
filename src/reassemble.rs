//! The frame reassembler (component C3 of the design): the inbound
//! counterpart to [`crate::fragment`]. Buffers wire fragments belonging to
//! one logical frame per stream id and emits the reassembled whole once the
//! terminal fragment arrives.
//!
//! One [`Reassembler`] holds a map keyed by `stream_id` rather than a single
//! slot, since RSocket multiplexes many streams over one connection and
//! fragments from different streams can legally interleave (see
//! `DESIGN.md`).

use crate::codec::parse_frame;
use crate::error::Error;
use crate::frame::{Flags, Frame, FrameType};
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;

struct Entry {
    frame_type: FrameType,
    flags: Flags,
    initial_request_n: Option<u32>,
    metadata: Option<BytesMut>,
    data: BytesMut,
}

impl Entry {
    fn accumulated_len(&self) -> usize {
        self.metadata.as_ref().map(BytesMut::len).unwrap_or(0) + self.data.len()
    }
}

/// Per-connection reassembly state, one entry per in-progress stream id.
pub struct Reassembler {
    max_size: Option<usize>,
    entries: HashMap<u32, Entry>,
}

impl Reassembler {
    pub fn new(max_reassembly_size: Option<usize>) -> Self {
        Reassembler {
            max_size: max_reassembly_size,
            entries: HashMap::new(),
        }
    }

    /// Feeds one wire fragment in. Returns the reassembled logical frame
    /// once `wire` is the terminal fragment of its chain; otherwise returns
    /// `None` and keeps the partial state.
    pub fn reassemble(&mut self, wire: &Bytes, encode_length: bool) -> Result<Option<Frame>, Error> {
        let fragment = parse_frame(wire, encode_length)?;
        let stream_id = fragment.stream_id;

        match self.entries.remove(&stream_id) {
            None => {
                if !fragment.flags.f() {
                    return Ok(Some(fragment));
                }
                if !fragment.is_fragmentable() {
                    return Err(Error::ReassemblyProtocolViolation {
                        stream_id,
                        reason: "F set on a non-fragmentable type with no chain in progress",
                    });
                }

                let entry = Entry {
                    frame_type: fragment.frame_type,
                    flags: fragment.flags.difference(Flags::F),
                    initial_request_n: fragment.initial_request_n,
                    metadata: fragment.metadata.map(|m| BytesMut::from(&m[..])),
                    data: BytesMut::from(&fragment.data[..]),
                };
                self.check_size(stream_id, &entry)?;
                self.entries.insert(stream_id, entry);
                Ok(None)
            }
            Some(mut entry) => {
                if fragment.frame_type != FrameType::Payload {
                    return Err(Error::ReassemblyProtocolViolation {
                        stream_id,
                        reason: "non-PAYLOAD continuation arrived mid-chain",
                    });
                }

                if let Some(metadata) = fragment.metadata {
                    entry
                        .metadata
                        .get_or_insert_with(BytesMut::new)
                        .extend_from_slice(&metadata);
                }
                entry.data.extend_from_slice(&fragment.data);
                self.check_size(stream_id, &entry)?;

                if !fragment.flags.f() {
                    // Terminal fragment. For a PAYLOAD chain, N/C/etc. live
                    // here; for a request chain they were already captured
                    // from the first fragment.
                    let flags = if entry.frame_type == FrameType::Payload {
                        fragment.flags.difference(Flags::F)
                    } else {
                        entry.flags
                    };
                    let mut flags = flags;
                    flags.set(Flags::M, entry.metadata.is_some());

                    let mut reassembled =
                        Frame::new(stream_id, entry.frame_type, flags, entry.data.freeze());
                    if let Some(metadata) = entry.metadata {
                        reassembled = reassembled.with_metadata(metadata.freeze());
                    }
                    if let Some(initial_request_n) = entry.initial_request_n {
                        reassembled = reassembled.with_initial_request_n(initial_request_n);
                    }
                    Ok(Some(reassembled))
                } else {
                    self.entries.insert(stream_id, entry);
                    Ok(None)
                }
            }
        }
    }

    fn check_size(&self, stream_id: u32, entry: &Entry) -> Result<(), Error> {
        if let Some(limit) = self.max_size {
            if entry.accumulated_len() > limit {
                return Err(Error::ReassemblyTooLarge { stream_id, limit });
            }
        }
        Ok(())
    }

    /// Releases all in-progress reassembly state without emitting anything,
    /// as if the connection had just been torn down.
    pub fn dispose(&mut self) {
        self.entries.clear();
    }

    /// Whether any stream currently has a partial chain buffered.
    pub fn is_idle(&self) -> bool {
        self.entries.is_empty()
    }
}
