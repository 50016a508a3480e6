
use std::fmt;

use bytes::{Buf, BufMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Error;
use crate::packet_map::PacketMap;
use crate::packet_status_chunk::{
    PacketStatusChunk, RunLengthChunk, StatusVectorChunk, MAX_RUN_LENGTH, ONE_BIT_VECTOR_CAPACITY,
    PACKET_STATUS_CHUNK_LENGTH, TWO_BIT_VECTOR_CAPACITY,
};
use crate::packet_status_symbol::{OneBitSymbol, TwoBitSymbol};
use crate::recv_delta::{RecvDelta, TICKS_PER_MS};
use crate::util::{get_padding_size, get_u24, put_padding};

type Result<T> = std::result::Result<T, util::Error>;

/// Fixed fields before the first chunk: base sequence number (u16), packet
/// status count (u16), reference time (u24), feedback packet count (u8).
pub const FCI_HEADER_LENGTH: usize = 8;

/// The reference time field counts in units of 64 ms.
pub const REFERENCE_TIME_UNIT_MS: i64 = 64;

/// Runs of at least this many identical statuses become run-length chunks;
/// shorter stretches pack into status vector chunks.
const RUN_LENGTH_THRESHOLD: usize = 7;

/// Transport-wide congestion control feedback, FCI payload only.
///
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      base sequence number     |      packet status count      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 reference time                | fb pkt. count |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          packet chunk         |         packet chunk          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         packet chunk          |  recv delta   |  recv delta   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           recv delta          |  recv delta   | zero padding  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// The surrounding RTCP common header and SSRC pair are the container's
/// concern; `unmarshal` expects a buffer positioned at the FCI payload and
/// `marshal` produces one the container wraps.
///
/// Chunks and deltas are not stored: they are rebuilt from `packet_info` on
/// every `marshal` and flattened into it on `unmarshal`.
///
/// https://tools.ietf.org/html/draft-holmer-rmcat-transport-wide-cc-extensions-01#page-5
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct TransportCc {
    /// Arrival time anchor in 64 ms units; 24 bits on the wire.
    pub reference_time: u32,
    /// Feedback message counter from the receiver, wrapping.
    pub fb_pkt_count: u8,
    /// Arrival information per transport-wide sequence number.
    pub packet_info: PacketMap,
}

impl TransportCc {
    pub fn new(reference_time: u32, fb_pkt_count: u8, packet_info: PacketMap) -> Self {
        TransportCc {
            reference_time,
            fb_pkt_count,
            packet_info,
        }
    }

    /// Sequence number of the first reported position.
    pub fn base_sequence_number(&self) -> u16 {
        self.packet_info.first_key().unwrap_or(0)
    }

    /// Number of positions this feedback reports on, received or not.
    pub fn packet_status_count(&self) -> usize {
        match (self.packet_info.first_key(), self.packet_info.last_key()) {
            (Some(first), Some(last)) => (last - first) as usize + 1,
            _ => 0,
        }
    }

    /// Classifies every position in `[first_key, last_key]` against the
    /// previous received arrival time; the reference time anchors the first.
    fn classify(&self) -> crate::error::Result<Vec<Option<RecvDelta>>> {
        let (first, last) = match (self.packet_info.first_key(), self.packet_info.last_key()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(vec![]),
        };

        let count = (last - first) as usize + 1;
        if count > u16::MAX as usize {
            return Err(Error::TooManyPacketStatuses);
        }

        let mut statuses = Vec::with_capacity(count);
        let mut prev_arrival_ms =
            (self.reference_time & 0x00FF_FFFF) as i64 * REFERENCE_TIME_UNIT_MS;
        for sequence_number in first..=last {
            match self.packet_info.arrival_time(sequence_number) {
                Some(arrival_ms) => {
                    let ticks = (arrival_ms - prev_arrival_ms) * TICKS_PER_MS;
                    statuses.push(Some(RecvDelta::from_ticks(ticks)?));
                    prev_arrival_ms = arrival_ms;
                }
                None => statuses.push(None),
            }
        }

        Ok(statuses)
    }

    fn wire_parts(&self) -> crate::error::Result<(Vec<PacketStatusChunk>, Vec<RecvDelta>)> {
        let statuses = self.classify()?;
        let deltas: Vec<RecvDelta> = statuses.iter().filter_map(|s| *s).collect();
        let kinds: Vec<TwoBitSymbol> = statuses.iter().map(status_symbol).collect();
        Ok((build_chunks(&kinds), deltas))
    }
}

impl fmt::Display for TransportCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::from("TransportCc:\n");
        out += format!("\tBase Sequence Number {}\n", self.base_sequence_number()).as_str();
        out += format!("\tStatus Count {}\n", self.packet_status_count()).as_str();
        out += format!("\tReference Time {}\n", self.reference_time).as_str();
        out += format!("\tFeedback Packet Count {}\n", self.fb_pkt_count).as_str();
        out += format!("\tReceived {}\n", self.packet_info.received_count()).as_str();
        write!(f, "{out}")
    }
}

impl MarshalSize for TransportCc {
    fn marshal_size(&self) -> usize {
        match self.wire_parts() {
            Ok((chunks, deltas)) => {
                let raw_size = raw_wire_size(&chunks, &deltas);
                raw_size + get_padding_size(raw_size)
            }
            Err(_) => 0,
        }
    }
}

impl Marshal for TransportCc {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        let (chunks, deltas) = self.wire_parts()?;
        let raw_size = raw_wire_size(&chunks, &deltas);
        let padding = get_padding_size(raw_size);
        if buf.remaining_mut() < raw_size + padding {
            return Err(Error::BufferTooShort.into());
        }

        buf.put_u16(self.base_sequence_number());
        buf.put_u16(self.packet_status_count() as u16);
        buf.put_u32(((self.reference_time & 0x00FF_FFFF) << 8) | self.fb_pkt_count as u32);

        for chunk in &chunks {
            let n = chunk.marshal_to(buf)?;
            buf = &mut buf[n..];
        }
        for delta in &deltas {
            let n = delta.marshal_to(buf)?;
            buf = &mut buf[n..];
        }
        put_padding(&mut buf, padding);

        Ok(raw_size + padding)
    }
}

impl Unmarshal for TransportCc {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < FCI_HEADER_LENGTH {
            return Err(Error::TruncatedBuffer.into());
        }

        let base_sequence_number = raw_packet.get_u16();
        let packet_status_count = raw_packet.get_u16() as usize;
        let reference_time = get_u24(raw_packet);
        let fb_pkt_count = raw_packet.get_u8();

        // Sequence numbers are assigned base + i; ranges crossing 65535 are
        // rejected rather than wrapped.
        if packet_status_count > 0
            && base_sequence_number as usize + packet_status_count - 1 > u16::MAX as usize
        {
            return Err(Error::SequenceNumberWrap.into());
        }

        // Flatten chunks until the declared count is covered. The final
        // chunk may overshoot; the excess symbols are parsed and dropped.
        let mut symbols = Vec::with_capacity(packet_status_count);
        while symbols.len() < packet_status_count {
            if raw_packet.remaining() < PACKET_STATUS_CHUNK_LENGTH {
                return Err(Error::TruncatedBuffer.into());
            }
            let chunk = PacketStatusChunk::unmarshal(raw_packet)?;
            symbols.extend(chunk.symbols());
        }

        let mut packet_info = PacketMap::new();
        let mut arrival_ms = reference_time as i64 * REFERENCE_TIME_UNIT_MS;
        for (i, symbol) in symbols.iter().take(packet_status_count).enumerate() {
            let sequence_number = base_sequence_number + i as u16;
            match symbol.delta_width() {
                Some(width) => {
                    let delta = RecvDelta::read(width, raw_packet)?;
                    arrival_ms += delta.delta_ms();
                    packet_info.set_received(sequence_number, arrival_ms);
                }
                None => packet_info.set_not_received(sequence_number),
            }
        }

        // Whatever follows the last delta is padding from this payload.
        if raw_packet.has_remaining() {
            let remaining = raw_packet.remaining();
            raw_packet.advance(remaining);
        }

        Ok(TransportCc {
            reference_time,
            fb_pkt_count,
            packet_info,
        })
    }
}

fn raw_wire_size(chunks: &[PacketStatusChunk], deltas: &[RecvDelta]) -> usize {
    FCI_HEADER_LENGTH
        + chunks.len() * PACKET_STATUS_CHUNK_LENGTH
        + deltas.iter().map(|d| d.marshal_size()).sum::<usize>()
}

fn status_symbol(status: &Option<RecvDelta>) -> TwoBitSymbol {
    match status {
        None => TwoBitSymbol::NotReceived,
        Some(RecvDelta::Small(_)) => TwoBitSymbol::ReceivedSmallDelta,
        Some(RecvDelta::Large(_)) => TwoBitSymbol::ReceivedLargeOrNegativeDelta,
    }
}

fn is_large(symbol: &TwoBitSymbol) -> bool {
    *symbol == TwoBitSymbol::ReceivedLargeOrNegativeDelta
}

/// Greedy single-pass chunk layout over the classified positions.
fn build_chunks(kinds: &[TwoBitSymbol]) -> Vec<PacketStatusChunk> {
    let mut layout = ChunkLayout::default();
    let mut i = 0;
    while i < kinds.len() {
        if layout.pending.is_empty() {
            let run = kinds[i..].iter().take_while(|s| **s == kinds[i]).count();
            if run >= RUN_LENGTH_THRESHOLD {
                layout.push_run(kinds[i], run);
                i += run;
                continue;
            }
        }
        layout.push(kinds[i]);
        i += 1;
    }
    layout.finish()
}

/// Accumulates statuses into chunks. Statuses feed in position order; a
/// vector chunk is emitted only once full, so mid-message chunks never pad
/// and later positions never shift.
#[derive(Default)]
struct ChunkLayout {
    chunks: Vec<PacketStatusChunk>,
    pending: Vec<TwoBitSymbol>,
}

impl ChunkLayout {
    /// Lays out a uniform run as run-length chunks, longest first split at
    /// the 13-bit cap. Only valid between vector accumulations.
    fn push_run(&mut self, symbol: TwoBitSymbol, mut len: usize) {
        debug_assert!(self.pending.is_empty());
        while len > 0 {
            let run_length = len.min(MAX_RUN_LENGTH as usize);
            self.chunks.push(PacketStatusChunk::RunLength(RunLengthChunk {
                symbol,
                run_length: run_length as u16,
            }));
            len -= run_length;
        }
    }

    fn push(&mut self, symbol: TwoBitSymbol) {
        self.pending.push(symbol);
        if is_large(&symbol) {
            // The one-bit alphabet can no longer express the accumulation.
            while self.pending.len() >= TWO_BIT_VECTOR_CAPACITY {
                self.emit_two_bit();
            }
        } else if self.pending.iter().any(is_large) {
            if self.pending.len() == TWO_BIT_VECTOR_CAPACITY {
                self.emit_two_bit();
            }
        } else if self.pending.len() == ONE_BIT_VECTOR_CAPACITY {
            self.emit_one_bit();
        }
    }

    /// Flushes the tail accumulation, padding the chunk with not-received
    /// slots past the declared status count.
    fn finish(mut self) -> Vec<PacketStatusChunk> {
        if self.pending.is_empty() {
            return self.chunks;
        }
        if self.pending.iter().any(is_large) {
            self.pending
                .resize(TWO_BIT_VECTOR_CAPACITY, TwoBitSymbol::NotReceived);
            self.emit_two_bit();
        } else {
            self.pending
                .resize(ONE_BIT_VECTOR_CAPACITY, TwoBitSymbol::NotReceived);
            self.emit_one_bit();
        }
        self.chunks
    }

    fn emit_two_bit(&mut self) {
        let mut symbols = [TwoBitSymbol::NotReceived; TWO_BIT_VECTOR_CAPACITY];
        for (slot, symbol) in symbols
            .iter_mut()
            .zip(self.pending.drain(..TWO_BIT_VECTOR_CAPACITY))
        {
            *slot = symbol;
        }
        self.chunks
            .push(PacketStatusChunk::StatusVector(StatusVectorChunk::TwoBit(
                symbols,
            )));
    }

    fn emit_one_bit(&mut self) {
        let mut symbols = [OneBitSymbol::NotReceived; ONE_BIT_VECTOR_CAPACITY];
        for (slot, symbol) in symbols.iter_mut().zip(self.pending.drain(..)) {
            *slot = match symbol {
                TwoBitSymbol::ReceivedSmallDelta => OneBitSymbol::Received,
                _ => OneBitSymbol::NotReceived,
            };
        }
        self.chunks
            .push(PacketStatusChunk::StatusVector(StatusVectorChunk::OneBit(
                symbols,
            )));
    }
}
