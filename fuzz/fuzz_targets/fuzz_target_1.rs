#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use rsocket_fragmentation::codec::parse_frame;
use rsocket_fragmentation::reassemble::Reassembler;

// The untrusted-input boundary of this layer: parse_frame is the only place
// that turns bytes nobody controls into a Frame. A malformed or adversarial
// buffer must return an Err, never panic, and a sequence of them fed through
// a Reassembler must never panic or get stuck regardless of how nonsensical
// the stream-id/type/flag combination is.
fuzz_target!(|data: &[u8]| {
    let wire = Bytes::copy_from_slice(data);

    if let Ok(frame) = parse_frame(&wire, false) {
        let mut reassembler = Reassembler::new(Some(1 << 20));
        let _ = reassembler.reassemble(&wire, false);
        let _ = frame;
    }

    if data.len() >= 3 {
        let _ = parse_frame(&wire, true);
    }
});
