//! The frame fragmenter (component C2 of the design): splits one oversized,
//! fragmentable logical frame into an ordered sequence of MTU-bounded wire
//! fragments.
//!
//! Builds the whole sequence eagerly into a `Vec` rather than a true lazy
//! iterator, since the fragment count for any one frame is small and
//! bounded by its size. The one-fragment-at-a-time laziness lives one level
//! up, in the adapter (`crate::adapter`), which only ever holds one
//! fragment before handing it to the underlying duplex.

use crate::codec::encode_frame;
use crate::error::Error;
use crate::frame::{
    Flags, Frame, FrameType, HEADER_SIZE, INITIAL_REQUEST_N_SIZE, METADATA_LENGTH_SIZE,
};
use bytes::Bytes;

/// Splits `frame` into wire fragments no larger than `mtu`, applying the
/// optional frame-length prefix to each.
///
/// `frame` must be a fragmentable type (see [`FrameType::is_fragmentable`]);
/// anything else is a programmer error, not a malformed-input error, and is
/// reported as [`Error::InvalidFrameType`].
pub fn fragment(frame: &Frame, mtu: usize, encode_length: bool) -> Result<Vec<Bytes>, Error> {
    if !frame.is_fragmentable() {
        return Err(Error::InvalidFrameType);
    }

    let mut fragments = Vec::new();
    let mut metadata_remaining = frame.metadata.clone();
    let mut data_remaining = frame.data.clone();
    let mut first = true;

    loop {
        let mut m = mtu.saturating_sub(HEADER_SIZE);

        let initial_request_n = if first && frame.frame_type.has_initial_request_n() {
            m = m.saturating_sub(INITIAL_REQUEST_N_SIZE);
            frame.initial_request_n
        } else {
            None
        };

        let metadata_chunk = if let Some(remaining) = metadata_remaining.take() {
            m = m.saturating_sub(METADATA_LENGTH_SIZE);
            let take = m.min(remaining.len());
            let chunk = remaining.slice(0..take);
            let rest = remaining.slice(take..);
            m -= take;
            if !rest.is_empty() {
                metadata_remaining = Some(rest);
            }
            Some(chunk)
        } else {
            None
        };

        let data_chunk = if m > 0 && !data_remaining.is_empty() {
            let take = m.min(data_remaining.len());
            let chunk = data_remaining.slice(0..take);
            data_remaining = data_remaining.slice(take..);
            chunk
        } else {
            Bytes::new()
        };

        let is_terminal = metadata_remaining.is_none() && data_remaining.is_empty();

        if !first
            && metadata_chunk.as_ref().map(Bytes::len).unwrap_or(0) == 0
            && data_chunk.is_empty()
            && !is_terminal
        {
            return Err(Error::MalformedFrame(
                "mtu too small for the fragmenter to make progress",
            ));
        }

        let frame_type = if first {
            frame.frame_type
        } else {
            FrameType::Payload
        };

        // N/C placement: request types carry their flags on the first
        // fragment only (never restored on a later one). A PAYLOAD-typed
        // input carries N/C on whichever fragment is terminal — the first
        // one if it fits whole, otherwise the last — since N/C describe the
        // logical payload as a whole, not any one wire fragment.
        let mut flags = if first {
            if frame.frame_type == FrameType::Payload && !is_terminal {
                Flags::empty()
            } else {
                frame.flags.difference(Flags::F)
            }
        } else if is_terminal && frame.frame_type == FrameType::Payload {
            frame.flags.difference(Flags::F)
        } else {
            Flags::empty()
        };
        flags.set(Flags::F, !is_terminal);

        let mut fragment_frame = Frame::new(frame.stream_id, frame_type, flags, data_chunk);
        if let Some(metadata) = metadata_chunk {
            fragment_frame = fragment_frame.with_metadata(metadata);
        }
        if let Some(initial_request_n) = initial_request_n {
            fragment_frame = fragment_frame.with_initial_request_n(initial_request_n);
        }

        fragments.push(encode_frame(&fragment_frame, encode_length));

        first = false;
        if is_terminal {
            break;
        }
    }

    Ok(fragments)
}
