//! Bit-exact wire codec for RSocket frames (component C1 of the design).
//!
//! Pure functions only: nothing here touches I/O. The duplex adapter
//! (`crate::adapter`) is the only place that awaits a read or a write;
//! everything in this module is ordinary, non-blocking buffer work, which
//! is what lets the fragmenter and reassembler call it from synchronous
//! code.

use crate::error::Error;
use crate::frame::{
    Flags, Frame, FrameType, FRAME_LENGTH_SIZE, HEADER_SIZE, INITIAL_REQUEST_N_SIZE,
    MAX_STREAM_ID, METADATA_LENGTH_SIZE,
};
use bytes::{BufMut, Bytes, BytesMut};

fn put_u24(buf: &mut BytesMut, value: usize) {
    let value = value as u32;
    buf.put_u8((value >> 16) as u8);
    buf.put_u8((value >> 8) as u8);
    buf.put_u8(value as u8);
}

fn read_u24(bytes: &[u8]) -> usize {
    ((bytes[0] as usize) << 16) | ((bytes[1] as usize) << 8) | bytes[2] as usize
}

/// Parses the fixed 6-byte header at the front of `wire`: the 31-bit
/// stream id and the 16-bit word packing frame type and flags.
pub fn parse_header(wire: &[u8]) -> Result<(u32, FrameType, Flags), Error> {
    if wire.len() < HEADER_SIZE {
        return Err(Error::MalformedFrame("fewer than 6 bytes for frame header"));
    }
    let word0 = u32::from_be_bytes([wire[0], wire[1], wire[2], wire[3]]);
    let stream_id = word0 & MAX_STREAM_ID;
    let word1 = u16::from_be_bytes([wire[4], wire[5]]);
    let frame_type = FrameType::from_u8((word1 >> 10) as u8);
    let flags = Flags::from_bits_truncate(word1 & 0x03FF);
    Ok((stream_id, frame_type, flags))
}

/// Writes the fixed 6-byte header.
pub fn encode_header(buf: &mut BytesMut, stream_id: u32, frame_type: FrameType, flags: Flags) {
    buf.put_u32(stream_id & MAX_STREAM_ID);
    let word1 = ((frame_type.as_u8() as u16) << 10) | (flags.bits() & 0x03FF);
    buf.put_u16(word1);
}

/// Regions of a single wire fragment beyond the header: the optional
/// `initial_request_n` prefix, the optional metadata, and the data.
struct Regions {
    stream_id: u32,
    frame_type: FrameType,
    flags: Flags,
    initial_request_n: Option<u32>,
    metadata: Option<Bytes>,
    data: Bytes,
}

/// Locates every region of one header-starting frame buffer (no outer
/// frame-length prefix) without copying metadata or data out of `body`.
fn parse_regions(body: &Bytes) -> Result<Regions, Error> {
    let (stream_id, frame_type, flags) = parse_header(body)?;
    let mut cursor = HEADER_SIZE;

    let initial_request_n = if frame_type.has_initial_request_n() {
        if body.len() < cursor + INITIAL_REQUEST_N_SIZE {
            return Err(Error::MalformedFrame("truncated initial_request_n prefix"));
        }
        let value = u32::from_be_bytes(body[cursor..cursor + 4].try_into().unwrap());
        cursor += INITIAL_REQUEST_N_SIZE;
        Some(value & MAX_STREAM_ID)
    } else {
        None
    };

    let metadata = if flags.m() {
        if body.len() < cursor + METADATA_LENGTH_SIZE {
            return Err(Error::MalformedFrame("truncated metadata length prefix"));
        }
        let metadata_len = read_u24(&body[cursor..cursor + METADATA_LENGTH_SIZE]);
        cursor += METADATA_LENGTH_SIZE;
        if body.len() < cursor + metadata_len {
            return Err(Error::MalformedFrame("declared metadata length exceeds frame"));
        }
        let metadata = body.slice(cursor..cursor + metadata_len);
        cursor += metadata_len;
        Some(metadata)
    } else {
        None
    };

    let data = body.slice(cursor..);

    Ok(Regions {
        stream_id,
        frame_type,
        flags,
        initial_request_n,
        metadata,
        data,
    })
}

/// Encodes one logical frame as a single wire fragment. Used directly for
/// non-fragmentable types and for fragmentable ones that fit in one MTU;
/// the fragmenter (`crate::fragment`) also calls this once per fragment it
/// produces, after slicing that fragment's own metadata/data out of the
/// original frame.
///
/// `M` is always derived from `frame.metadata.is_some()` rather than
/// trusted from `frame.flags`, so callers can never desync the bit from
/// the data it describes.
pub fn encode_frame(frame: &Frame, encode_length: bool) -> Bytes {
    let mut flags = frame.flags;
    flags.set(Flags::M, frame.metadata.is_some());

    let mut body = BytesMut::with_capacity(frame.wire_len());
    encode_header(&mut body, frame.stream_id, frame.frame_type, flags);

    if frame.frame_type.has_initial_request_n() {
        body.put_u32(frame.initial_request_n.unwrap_or(0) & MAX_STREAM_ID);
    }

    if let Some(metadata) = &frame.metadata {
        put_u24(&mut body, metadata.len());
        body.extend_from_slice(metadata);
    }
    body.extend_from_slice(&frame.data);

    if encode_length {
        let mut framed = BytesMut::with_capacity(FRAME_LENGTH_SIZE + body.len());
        put_u24(&mut framed, body.len());
        framed.extend_from_slice(&body);
        framed.freeze()
    } else {
        body.freeze()
    }
}

/// Parses one wire fragment (the unit the underlying duplex hands us per
/// read) back into a [`Frame`]. When `encode_length` is set, the leading
/// 3-byte length is checked for self-consistency against the remaining
/// buffer rather than used to delimit the read — the duplex below is
/// responsible for handing us one already-delimited fragment at a time
/// (see `DESIGN.md`).
pub fn parse_frame(wire: &Bytes, encode_length: bool) -> Result<Frame, Error> {
    let body = if encode_length {
        if wire.len() < FRAME_LENGTH_SIZE {
            return Err(Error::MalformedFrame("truncated frame length prefix"));
        }
        let declared_len = read_u24(&wire[..FRAME_LENGTH_SIZE]);
        let rest = wire.slice(FRAME_LENGTH_SIZE..);
        if rest.len() != declared_len {
            return Err(Error::MalformedFrame(
                "frame length prefix does not match delivered frame size",
            ));
        }
        rest
    } else {
        wire.clone()
    };

    let regions = parse_regions(&body)?;
    let mut frame = Frame::new(
        regions.stream_id,
        regions.frame_type,
        regions.flags,
        regions.data,
    );
    frame.initial_request_n = regions.initial_request_n;
    frame.metadata = regions.metadata;
    Ok(frame)
}

/// Parses just the header of an already-delimited wire fragment (no
/// metadata/data copying), mirroring the header-only accessor shape.
pub fn parse_header_only(wire: &Bytes, encode_length: bool) -> Result<(u32, FrameType, Flags), Error> {
    let body = if encode_length {
        if wire.len() < FRAME_LENGTH_SIZE {
            return Err(Error::MalformedFrame("truncated frame length prefix"));
        }
        &wire[FRAME_LENGTH_SIZE..]
    } else {
        &wire[..]
    };
    parse_header(body)
}

/// Zero-copy metadata accessor.
pub fn slice_metadata(wire: &Bytes, encode_length: bool) -> Result<Option<Bytes>, Error> {
    Ok(parse_frame(wire, encode_length)?.metadata)
}

/// Zero-copy data accessor.
pub fn slice_data(wire: &Bytes, encode_length: bool) -> Result<Bytes, Error> {
    Ok(parse_frame(wire, encode_length)?.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Flags;

    #[test]
    fn header_round_trips() {
        let mut buf = BytesMut::new();
        encode_header(&mut buf, 42, FrameType::RequestResponse, Flags::M | Flags::F);
        let (stream_id, frame_type, flags) = parse_header(&buf).unwrap();
        assert_eq!(stream_id, 42);
        assert_eq!(frame_type, FrameType::RequestResponse);
        assert!(flags.m());
        assert!(flags.f());
        assert!(!flags.c());
    }

    #[test]
    fn s1_small_request_response_no_fragmentation() {
        // Small REQUEST_RESPONSE, no fragmentation: metadata="md",
        // data="hello", no F, expect 16 bytes.
        let frame = Frame::new(
            1,
            FrameType::RequestResponse,
            Flags::empty(),
            Bytes::from_static(b"hello"),
        )
        .with_metadata(Bytes::from_static(b"md"));

        let wire = encode_frame(&frame, false);
        assert_eq!(wire.len(), 16);

        let decoded = parse_frame(&wire, false).unwrap();
        assert_eq!(decoded.stream_id, 1);
        assert_eq!(decoded.frame_type, FrameType::RequestResponse);
        assert!(decoded.flags.m());
        assert!(!decoded.flags.f());
        assert_eq!(decoded.metadata.unwrap(), Bytes::from_static(b"md"));
        assert_eq!(decoded.data, Bytes::from_static(b"hello"));
    }

    #[test]
    fn metadata_present_but_empty_is_distinct_from_absent() {
        let with_empty_metadata = Frame::new(
            2,
            FrameType::RequestFnf,
            Flags::empty(),
            Bytes::from_static(b"x"),
        )
        .with_metadata(Bytes::new());
        let wire = encode_frame(&with_empty_metadata, false);
        let decoded = parse_frame(&wire, false).unwrap();
        assert!(decoded.flags.m());
        assert_eq!(decoded.metadata, Some(Bytes::new()));

        let without_metadata =
            Frame::new(2, FrameType::RequestFnf, Flags::empty(), Bytes::from_static(b"x"));
        let wire = encode_frame(&without_metadata, false);
        let decoded = parse_frame(&wire, false).unwrap();
        assert!(!decoded.flags.m());
        assert_eq!(decoded.metadata, None);
    }

    #[test]
    fn length_prefix_round_trips_and_is_validated() {
        let frame = Frame::new(
            3,
            FrameType::RequestFnf,
            Flags::empty(),
            Bytes::from_static(b"payload"),
        );
        let wire = encode_frame(&frame, true);
        let decoded = parse_frame(&wire, true).unwrap();
        assert_eq!(decoded.data, Bytes::from_static(b"payload"));

        let mut tampered = BytesMut::from(&wire[..]);
        tampered[2] += 1; // corrupt the declared length
        let err = parse_frame(&tampered.freeze(), true);
        assert!(err.is_err());
    }

    #[test]
    fn truncated_header_is_malformed() {
        let wire = Bytes::from_static(&[0, 0, 0, 1]);
        assert!(parse_frame(&wire, false).is_err());
    }

    #[test]
    fn initial_request_n_round_trips_on_request_stream() {
        let frame = Frame::new(
            7,
            FrameType::RequestStream,
            Flags::empty(),
            Bytes::from_static(b"data"),
        )
        .with_initial_request_n(42);
        let wire = encode_frame(&frame, false);
        let decoded = parse_frame(&wire, false).unwrap();
        assert_eq!(decoded.initial_request_n, Some(42));
    }
}
