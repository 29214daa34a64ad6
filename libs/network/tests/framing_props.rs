//! Property tests for the stream framer
//!
//! Frames must come out identical however the byte stream is chunked, and
//! string content must never move the brace depth.

use bytes::Bytes;
use codec::{encode_heartbeat, HeartbeatMessage};
use network::StreamFramer;
use proptest::prelude::*;

fn frame_all(stream: &[u8], cuts: &[usize]) -> Vec<Bytes> {
    let mut framer = StreamFramer::new();
    let mut frames = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        let cut = cut.min(stream.len()).max(start);
        framer.push(&stream[start..cut], &mut frames).unwrap();
        start = cut;
    }
    framer.push(&stream[start..], &mut frames).unwrap();
    assert_eq!(framer.pending_len(), 0);
    frames
}

fn heartbeat_stream(payloads: &[String]) -> (Vec<u8>, Vec<Vec<u8>>) {
    let encoded: Vec<Vec<u8>> = payloads
        .iter()
        .enumerate()
        .map(|(seq, payload)| {
            let msg = HeartbeatMessage::new("prop-beacon", seq as u32, 1, payload.clone());
            encode_heartbeat(&msg).unwrap()
        })
        .collect();
    (encoded.concat(), encoded)
}

proptest! {
    #[test]
    fn prop_split_invariance(
        payloads in proptest::collection::vec(any::<String>(), 1..8),
        mut cuts in proptest::collection::vec(any::<usize>(), 0..16),
    ) {
        let (stream, expected) = heartbeat_stream(&payloads);
        let len = stream.len();
        for cut in cuts.iter_mut() {
            *cut %= len + 1;
        }
        cuts.sort_unstable();

        let frames = frame_all(&stream, &cuts);
        prop_assert_eq!(frames.len(), expected.len());
        for (frame, want) in frames.iter().zip(expected.iter()) {
            prop_assert_eq!(&frame[..], &want[..]);
        }
    }

    #[test]
    fn prop_byte_at_a_time_matches_whole(
        payloads in proptest::collection::vec("[{}\"\\\\a-z ]{0,24}", 1..6),
    ) {
        let (stream, expected) = heartbeat_stream(&payloads);
        let cuts: Vec<usize> = (1..stream.len()).collect();
        let frames = frame_all(&stream, &cuts);
        prop_assert_eq!(frames.len(), expected.len());
        for (frame, want) in frames.iter().zip(expected.iter()) {
            prop_assert_eq!(&frame[..], &want[..]);
        }
    }
}
