
use std::collections::BTreeMap;

/// Ordered map from transport-wide sequence number to arrival time in
/// milliseconds. `None` marks a packet reported as not received.
///
/// Sequence numbers are plain `u16` values ordered ascending; a map whose
/// logical range would cross 65535 cannot be represented, the caller splits
/// its observations instead.
///
/// The encoder reads one position per sequence number in
/// `[first_key, last_key]`; keys absent from the map read as not received,
/// the decoder always stores an entry for every position.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PacketMap {
    arrivals: BTreeMap<u16, Option<i64>>,
}

impl PacketMap {
    pub fn new() -> Self {
        PacketMap::default()
    }

    /// Records `sequence_number` as received at `arrival_ms`.
    pub fn set_received(&mut self, sequence_number: u16, arrival_ms: i64) {
        self.arrivals.insert(sequence_number, Some(arrival_ms));
    }

    /// Records `sequence_number` as not received.
    pub fn set_not_received(&mut self, sequence_number: u16) {
        self.arrivals.insert(sequence_number, None);
    }

    /// Arrival time of `sequence_number`, or `None` if it was not received
    /// or never recorded.
    pub fn arrival_time(&self, sequence_number: u16) -> Option<i64> {
        self.arrivals.get(&sequence_number).copied().flatten()
    }

    pub fn first_key(&self) -> Option<u16> {
        self.arrivals.keys().next().copied()
    }

    pub fn last_key(&self) -> Option<u16> {
        self.arrivals.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    /// Entries in ascending sequence number order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, Option<i64>)> + '_ {
        self.arrivals.iter().map(|(seq, ts)| (*seq, *ts))
    }

    /// Number of entries recorded as received.
    pub fn received_count(&self) -> usize {
        self.arrivals.values().filter(|ts| ts.is_some()).count()
    }
}
