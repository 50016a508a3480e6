#[cfg(test)]
mod recorder_test;

use crate::packet_map::PacketMap;
use crate::recv_delta::TICKS_PER_MS;
use crate::transport_cc::{TransportCc, REFERENCE_TIME_UNIT_MS};

/// Records incoming packets and their arrival times and assembles
/// transport-wide congestion control feedback messages from them.
///
/// Sequence numbers are compared as plain `u16`; a stream crossing 65535
/// belongs in separate recording rounds.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    arrivals: Vec<(u16, i64)>,
    fb_pkt_count: u8,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder::default()
    }

    /// Marks `sequence_number` as received at `arrival_ms`.
    pub fn record(&mut self, sequence_number: u16, arrival_ms: i64) {
        self.arrivals.push((sequence_number, arrival_ms));
    }

    /// Drains recorded arrivals into feedback messages. A new message starts
    /// whenever an arrival delta stops fitting 16 signed bits of ticks or
    /// the position range would overflow the status count field.
    pub fn build_feedback(&mut self) -> Vec<TransportCc> {
        if self.arrivals.is_empty() {
            return vec![];
        }

        let mut arrivals = std::mem::take(&mut self.arrivals);
        // stable: the first arrival of a duplicated sequence number wins
        arrivals.sort_by_key(|&(sequence_number, _)| sequence_number);

        let mut messages = vec![];
        let mut current: Option<Feedback> = None;
        for (sequence_number, arrival_ms) in arrivals {
            let added = match current.as_mut() {
                Some(feedback) => feedback.add_received(sequence_number, arrival_ms),
                None => false,
            };
            if !added {
                if let Some(feedback) = current.take() {
                    messages.push(feedback.into_message(self.next_fb_pkt_count()));
                }
                current = Some(Feedback::new(sequence_number, arrival_ms));
            }
        }
        if let Some(feedback) = current {
            messages.push(feedback.into_message(self.next_fb_pkt_count()));
        }

        messages
    }

    fn next_fb_pkt_count(&mut self) -> u8 {
        let count = self.fb_pkt_count;
        self.fb_pkt_count = self.fb_pkt_count.wrapping_add(1);
        count
    }
}

/// One in-progress feedback message.
///
/// Arrival times are rebased so the 24-bit reference time field reproduces
/// them exactly on decode; the epoch above that field's range is dropped.
#[derive(Debug)]
struct Feedback {
    reference_time: u32,
    epoch_ms: i64,
    base_sequence_number: u16,
    last_sequence_number: u16,
    last_arrival_ms: i64,
    packet_info: PacketMap,
}

impl Feedback {
    fn new(sequence_number: u16, arrival_ms: i64) -> Self {
        let anchor = arrival_ms / REFERENCE_TIME_UNIT_MS;
        let reference_time = (anchor & 0x00FF_FFFF) as u32;
        let epoch_ms = (anchor - reference_time as i64) * REFERENCE_TIME_UNIT_MS;

        let mut packet_info = PacketMap::new();
        packet_info.set_received(sequence_number, arrival_ms - epoch_ms);

        Feedback {
            reference_time,
            epoch_ms,
            base_sequence_number: sequence_number,
            last_sequence_number: sequence_number,
            last_arrival_ms: arrival_ms - epoch_ms,
            packet_info,
        }
    }

    /// Adds an arrival, filling the sequence gap before it with explicit
    /// not-received entries. Returns false when the arrival needs a fresh
    /// message; nothing is recorded in that case.
    fn add_received(&mut self, sequence_number: u16, arrival_ms: i64) -> bool {
        if self.packet_info.arrival_time(sequence_number).is_some() {
            // duplicate arrival, first one wins
            return true;
        }
        if sequence_number - self.base_sequence_number == u16::MAX {
            return false;
        }

        let arrival_ms = arrival_ms - self.epoch_ms;
        let ticks = (arrival_ms - self.last_arrival_ms) * TICKS_PER_MS;
        if ticks < i16::MIN as i64 || ticks > i16::MAX as i64 {
            return false;
        }

        for missing in (self.last_sequence_number + 1)..sequence_number {
            self.packet_info.set_not_received(missing);
        }
        self.packet_info.set_received(sequence_number, arrival_ms);
        self.last_sequence_number = sequence_number;
        self.last_arrival_ms = arrival_ms;
        true
    }

    fn into_message(self, fb_pkt_count: u8) -> TransportCc {
        TransportCc::new(self.reference_time, fb_pkt_count, self.packet_info)
    }
}
