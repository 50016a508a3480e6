use util::marshal::{Marshal, Unmarshal};

use super::*;

type Result<T> = std::result::Result<T, util::Error>;

#[test]
fn test_recorder_empty() {
    let mut recorder = Recorder::new();
    assert!(recorder.build_feedback().is_empty());
}

#[test]
fn test_recorder_single_message() {
    let mut recorder = Recorder::new();
    // out of order arrival
    recorder.record(5, 102);
    recorder.record(4, 100);
    recorder.record(7, 108);

    let messages = recorder.build_feedback();
    assert_eq!(messages.len(), 1);

    let message = &messages[0];
    assert_eq!(message.fb_pkt_count, 0);
    assert_eq!(message.base_sequence_number(), 4);
    assert_eq!(message.packet_status_count(), 4);
    assert_eq!(message.packet_info.arrival_time(4), Some(100));
    assert_eq!(message.packet_info.arrival_time(5), Some(102));
    assert_eq!(message.packet_info.arrival_time(6), None);
    assert_eq!(message.packet_info.arrival_time(7), Some(108));

    // drained; the next round counts onward
    assert!(recorder.build_feedback().is_empty());
    recorder.record(8, 110);
    let messages = recorder.build_feedback();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].fb_pkt_count, 1);
}

#[test]
fn test_recorder_splits_on_oversized_delta() {
    let mut recorder = Recorder::new();
    recorder.record(0, 0);
    // 9000 ms later: 36000 ticks cannot ride in the same message.
    recorder.record(1, 9000);

    let messages = recorder.build_feedback();
    assert_eq!(messages.len(), 2);

    assert_eq!(messages[0].fb_pkt_count, 0);
    assert_eq!(messages[0].base_sequence_number(), 0);
    assert_eq!(messages[0].packet_status_count(), 1);

    assert_eq!(messages[1].fb_pkt_count, 1);
    assert_eq!(messages[1].base_sequence_number(), 1);
    assert_eq!(messages[1].reference_time, 140);
    assert_eq!(messages[1].packet_info.arrival_time(1), Some(9000));
}

#[test]
fn test_recorder_duplicate_keeps_first() {
    let mut recorder = Recorder::new();
    recorder.record(9, 100);
    recorder.record(9, 150);

    let messages = recorder.build_feedback();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].packet_info.arrival_time(9), Some(100));
}

#[test]
fn test_recorder_rebases_large_clocks() -> Result<()> {
    let mut recorder = Recorder::new();
    // wall-clock style timestamps far beyond the 24-bit reference range
    recorder.record(2585, 1_537_916_094_447);
    recorder.record(2586, 1_537_916_094_452);
    recorder.record(2588, 1_537_916_094_475);

    let messages = recorder.build_feedback();
    assert_eq!(messages.len(), 1);

    let message = &messages[0];
    assert!(message.reference_time <= 0x00FF_FFFF);

    // The rebased map survives the wire unchanged.
    let buf = message.marshal()?;
    assert_eq!(buf.len() % 4, 0);
    let mut data = buf;
    let decoded = TransportCc::unmarshal(&mut data)?;
    assert_eq!(&decoded, message);

    // Relative spacing is preserved by the rebase.
    let info = &decoded.packet_info;
    let first = info.arrival_time(2585).unwrap();
    assert_eq!(info.arrival_time(2586), Some(first + 5));
    assert_eq!(info.arrival_time(2587), None);
    assert_eq!(info.arrival_time(2588), Some(first + 28));

    Ok(())
}

#[test]
fn test_recorder_feedback_marshals_round_trip() -> Result<()> {
    let mut recorder = Recorder::new();
    for (seq, arrival_ms) in [(100u16, 64i64), (101, 65), (103, 70), (104, 70), (110, 95)] {
        recorder.record(seq, arrival_ms);
    }

    let messages = recorder.build_feedback();
    assert_eq!(messages.len(), 1);

    let mut data = messages[0].marshal()?;
    let decoded = TransportCc::unmarshal(&mut data)?;
    assert_eq!(decoded.packet_info.received_count(), 5);
    assert_eq!(decoded.packet_info.len(), 11);
    assert_eq!(decoded.packet_info.arrival_time(110), Some(95));

    Ok(())
}
