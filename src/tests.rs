//! Crate-level integration tests for the concrete scenarios named in the
//! design: end-to-end fragment/reassemble round trips exercised through the
//! public API rather than through any one module's internals.

use crate::codec::{encode_frame, parse_header};
use crate::fragment::fragment;
use crate::frame::{Flags, Frame, FrameType};
use crate::reassemble::Reassembler;
use bytes::Bytes;

#[test]
fn s1_small_request_response_produces_one_sixteen_byte_fragment() {
    let frame = Frame::new(
        1,
        FrameType::RequestResponse,
        Flags::empty(),
        Bytes::from_static(b"hello"),
    )
    .with_metadata(Bytes::from_static(b"md"));

    let fragments = fragment(&frame, 64, false).unwrap();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].len(), 16);

    let (_, _, flags) = parse_header(&fragments[0]).unwrap();
    assert!(flags.m());
    assert!(!flags.f());
}

#[test]
fn s2_request_fnf_splits_data_only_into_four_fragments() {
    let data: Vec<u8> = (0u8..32).collect();
    let frame = Frame::new(3, FrameType::RequestFnf, Flags::empty(), Bytes::from(data.clone()));

    let fragments = fragment(&frame, 14, false).unwrap();
    let expected_types = [
        FrameType::RequestFnf,
        FrameType::Payload,
        FrameType::Payload,
        FrameType::Payload,
    ];
    let expected_f = [true, true, true, false];

    assert_eq!(fragments.len(), 4);
    for (i, wire) in fragments.iter().enumerate() {
        let (_, frame_type, flags) = parse_header(wire).unwrap();
        assert_eq!(frame_type, expected_types[i]);
        assert_eq!(flags.f(), expected_f[i]);
    }
}

#[test]
fn s3_request_response_splits_across_metadata_data_boundary_and_round_trips() {
    let metadata: Vec<u8> = (0u8..10).collect();
    let data: Vec<u8> = (100u8..110).collect();
    let frame = Frame::new(5, FrameType::RequestResponse, Flags::empty(), Bytes::from(data.clone()))
        .with_metadata(Bytes::from(metadata.clone()));

    let fragments = fragment(&frame, 15, false).unwrap();

    let first = crate::codec::parse_frame(&fragments[0], false).unwrap();
    assert_eq!(first.metadata.as_deref(), Some(&metadata[0..6][..]));
    assert!(first.data.is_empty());
    assert!(first.flags.m());

    let mut reassembler = Reassembler::new(None);
    let mut result = None;
    for wire in &fragments {
        result = reassembler.reassemble(wire, false).unwrap();
    }
    let reassembled = result.unwrap();
    assert_eq!(reassembled.metadata.unwrap(), Bytes::from(metadata));
    assert_eq!(reassembled.data, Bytes::from(data));
}

#[test]
fn s4_request_stream_carries_initial_request_n_on_the_first_fragment_only() {
    let data: Vec<u8> = (0u8..100).collect();
    let frame = Frame::new(7, FrameType::RequestStream, Flags::empty(), Bytes::from(data))
        .with_initial_request_n(42);

    let fragments = fragment(&frame, 20, false).unwrap();
    let first = crate::codec::parse_frame(&fragments[0], false).unwrap();
    assert_eq!(first.data.len(), 10);
    assert_eq!(first.initial_request_n, Some(42));

    for wire in &fragments[1..] {
        let decoded = crate::codec::parse_frame(wire, false).unwrap();
        assert_eq!(decoded.initial_request_n, None);
    }

    let mut reassembler = Reassembler::new(None);
    let mut result = None;
    for wire in &fragments {
        result = reassembler.reassemble(wire, false).unwrap();
    }
    assert_eq!(result.unwrap().initial_request_n, Some(42));
}

#[test]
fn s5_payload_chain_carries_next_complete_on_the_terminal_fragment_only() {
    let data: Vec<u8> = (0u8..60).collect();
    let frame = Frame::new(9, FrameType::Payload, Flags::N | Flags::C, Bytes::from(data.clone()));

    let fragments = fragment(&frame, 16, false).unwrap();
    assert!(fragments.len() > 2);

    for wire in &fragments[..fragments.len() - 1] {
        let (_, _, flags) = parse_header(wire).unwrap();
        assert!(!flags.n());
        assert!(!flags.c());
    }
    let (_, _, last_flags) = parse_header(fragments.last().unwrap()).unwrap();
    assert!(last_flags.n());
    assert!(last_flags.c());

    let mut reassembler = Reassembler::new(None);
    let mut result = None;
    for wire in &fragments {
        result = reassembler.reassemble(wire, false).unwrap();
    }
    let reassembled = result.unwrap();
    assert!(reassembled.flags.n());
    assert!(reassembled.flags.c());
    assert_eq!(reassembled.data, Bytes::from(data));
}

#[test]
fn s6_reassembly_aborts_when_a_non_payload_continuation_arrives_mid_chain() {
    let first = Frame::new(
        2,
        FrameType::RequestResponse,
        Flags::F,
        Bytes::from_static(b"partial"),
    );
    let second = Frame::new(2, FrameType::Payload, Flags::F, Bytes::from_static(b"more"));
    let third = Frame::new(2, FrameType::RequestFnf, Flags::F, Bytes::from_static(b"oops"));

    let mut reassembler = Reassembler::new(None);
    assert!(reassembler
        .reassemble(&encode_frame(&first, false), false)
        .unwrap()
        .is_none());
    assert!(reassembler
        .reassemble(&encode_frame(&second, false), false)
        .unwrap()
        .is_none());

    let err = reassembler.reassemble(&encode_frame(&third, false), false);
    assert!(matches!(
        err,
        Err(crate::error::Error::ReassemblyProtocolViolation { stream_id: 2, .. })
    ));
    assert!(reassembler.is_idle());
}

#[test]
fn round_trip_holds_across_a_matrix_of_mtus_for_every_fragmentable_type() {
    let payload: Vec<u8> = (0u8..73).map(|b| b.wrapping_mul(7)).collect();
    let metadata: Vec<u8> = (0u8..5).collect();

    let frames = [
        Frame::new(11, FrameType::RequestResponse, Flags::empty(), Bytes::from(payload.clone()))
            .with_metadata(Bytes::from(metadata.clone())),
        Frame::new(12, FrameType::RequestFnf, Flags::empty(), Bytes::from(payload.clone())),
        Frame::new(13, FrameType::RequestStream, Flags::empty(), Bytes::from(payload.clone()))
            .with_initial_request_n(7),
        Frame::new(
            14,
            FrameType::RequestChannel,
            Flags::C,
            Bytes::from(payload.clone()),
        )
        .with_initial_request_n(3),
        Frame::new(15, FrameType::Payload, Flags::N, Bytes::from(payload.clone())),
    ];

    for frame in &frames {
        for mtu in [16usize, 20, 32, 64, 256] {
            let fragments = fragment(frame, mtu, false).unwrap();
            for wire in &fragments {
                assert!(wire.len() <= mtu);
            }

            let mut reassembler = Reassembler::new(None);
            let mut result = None;
            for wire in &fragments {
                result = reassembler.reassemble(wire, false).unwrap();
            }
            let reassembled = result.expect("every matrix case terminates in one chain");
            assert_eq!(reassembled.frame_type, frame.frame_type);
            assert_eq!(reassembled.stream_id, frame.stream_id);
            assert_eq!(reassembled.metadata, frame.metadata);
            assert_eq!(reassembled.data, frame.data);
            assert_eq!(reassembled.initial_request_n, frame.initial_request_n);
        }
    }
}

#[test]
fn non_fragmentable_type_is_never_split_at_any_mtu() {
    let frame = Frame::new(1, FrameType::Keepalive, Flags::empty(), Bytes::from_static(b"ping"));
    assert!(matches!(
        fragment(&frame, 6, false),
        Err(crate::error::Error::InvalidFrameType)
    ));
}
