//! Whole-stream decoding tests

mod common;

use common::*;
use core_vorbis::{
    DecoderConfig, ErrorKind, OggPacket, PageInfo, Phase, StreamDecoder,
};

fn fake_stream_decoder() -> StreamDecoder {
    StreamDecoder::with_engine(DecoderConfig::default(), Box::new(FakeEngineFactory::default()))
        .unwrap()
}

#[test]
fn test_decode_whole_stream() {
    let packets = stream_packets(2, 44_100, 5);
    let mut decoder = fake_stream_decoder();

    let audio = decoder.decode(&packets).unwrap();

    // Packet i holds 16 + i bytes, two frames per byte
    let expected: usize = (0..5).map(|i| (16 + i) * 2).sum();
    assert_eq!(audio.channels(), 2);
    assert_eq!(audio.sample_rate, 44_100);
    assert_eq!(audio.samples_decoded, expected);
    assert!(audio.channel_data.iter().all(|plane| plane.len() == expected));
    assert!(audio.errors.is_empty());
    assert!(decoder.is_complete());
    assert_eq!(decoder.decoder().stats().packets_decoded, 5);
}

#[test]
fn test_decode_in_batches_matches_single_pass() {
    let packets = stream_packets(1, 22_050, 6);

    let mut single = fake_stream_decoder();
    let whole = single.decode(&packets).unwrap();

    let mut batched = fake_stream_decoder();
    let first = batched.decode(&packets[..2]).unwrap();
    assert_eq!(first.samples_decoded, 0);
    assert_eq!(first.sample_rate, 22_050);

    let mut combined = Vec::new();
    for chunk in packets[2..].chunks(3) {
        let audio = batched.decode(chunk).unwrap();
        combined.extend_from_slice(&audio.channel_data[0]);
    }

    assert_eq!(combined, whole.channel_data[0]);
}

#[test]
fn test_recoverable_errors_are_collected() {
    let mut packets = stream_packets(2, 48_000, 3);
    packets.insert(4, OggPacket::new(corrupt_packet(), PageInfo::new(false, false, 64)));
    packets.insert(5, OggPacket::new(Vec::new(), PageInfo::continuation()));

    let mut decoder = fake_stream_decoder();
    let audio = decoder.decode(&packets).unwrap();

    assert_eq!(audio.errors.len(), 2);

    let corrupt = &audio.errors[0];
    assert_eq!(corrupt.frame_length, 3);
    assert_eq!(corrupt.frame_number, 1);
    assert_eq!(corrupt.output_samples, 32);
    assert!(corrupt.message.contains("corrupt"));

    let empty = &audio.errors[1];
    assert_eq!(empty.frame_length, 0);
    assert_eq!(empty.frame_number, 2);
    assert_eq!(empty.input_bytes, 16 + 3);

    assert!(decoder.is_complete());
    assert_eq!(decoder.decoder().stats().packets_decoded, 3);
}

#[test]
fn test_packets_after_end_of_stream_are_ignored() {
    let mut packets = stream_packets(1, 8_000, 2);
    packets.push(OggPacket::new(audio_packet(8, 10), PageInfo::continuation()));

    let mut decoder = fake_stream_decoder();
    let audio = decoder.decode(&packets).unwrap();
    assert_eq!(audio.samples_decoded, (16 + 17) * 2);

    let again = decoder.decode(&packets[3..]).unwrap();
    assert_eq!(again.samples_decoded, 0);
    assert!(again.errors.is_empty());
}

#[test]
fn test_fatal_error_aborts_batch() {
    let mut packets = stream_packets(2, 44_100, 3);
    // Granule moves backwards on the last packet
    packets[5].page = PageInfo::new(false, true, 1);

    let mut decoder = fake_stream_decoder();
    let err = decoder.decode(&packets).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SequenceViolation);
    assert_eq!(
        decoder.decoder().phase(),
        Phase::Faulted(ErrorKind::SequenceViolation)
    );
}

#[test]
fn test_engine_init_failure_aborts() {
    let packets = stream_packets(2, 44_100, 1);
    let mut decoder =
        StreamDecoder::with_engine(DecoderConfig::default(), Box::new(FakeEngineFactory::failing()))
            .unwrap();

    let err = decoder.decode(&packets).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineInitFailed);
}

#[test]
fn test_decoded_audio_serializes_camel_case() {
    let mut packets = stream_packets(1, 8_000, 1);
    packets.insert(3, OggPacket::new(corrupt_packet(), PageInfo::continuation()));

    let mut decoder = fake_stream_decoder();
    let audio = decoder.decode(&packets).unwrap();

    let json = serde_json::to_value(&audio).unwrap();
    assert_eq!(json["sampleRate"], 8_000);
    assert_eq!(json["samplesDecoded"], 32);
    assert_eq!(json["errors"][0]["frameLength"], 3);
    assert!(json["channelData"].is_array());
}

#[test]
fn test_finish_destroys_session() {
    let mut decoder = fake_stream_decoder();
    decoder.decode(&stream_packets(1, 8_000, 1)).unwrap();
    assert!(decoder.finish().is_ok());
}
