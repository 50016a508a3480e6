#[cfg(test)]
mod packet_status_chunk_test;

use bytes::{Buf, BufMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Error;
use crate::packet_status_symbol::{OneBitSymbol, PacketStatusSymbol, TwoBitSymbol};

type Result<T> = std::result::Result<T, util::Error>;

/// Every packet status chunk occupies exactly 2 bytes on the wire.
pub const PACKET_STATUS_CHUNK_LENGTH: usize = 2;

/// Largest run a single run-length chunk can describe (13 bits).
pub const MAX_RUN_LENGTH: u16 = 0x1FFF;

/// Symbol slots in a one-bit status vector chunk.
pub const ONE_BIT_VECTOR_CAPACITY: usize = 14;

/// Symbol slots in a two-bit status vector chunk.
pub const TWO_BIT_VECTOR_CAPACITY: usize = 7;

/// RunLengthChunk
/// 0                   1
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |T=0| S |       Run Length      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunLengthChunk {
    pub symbol: TwoBitSymbol,
    /// Number of consecutive packets sharing `symbol`. A run length of 0 is
    /// a valid bit pattern that contributes no statuses.
    pub run_length: u16,
}

/// StatusVectorChunk
/// 0                   1
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |T=1|S|       symbol list       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// The symbol width bit picks the alphabet for the whole chunk; the slot
/// count is fixed by that alphabet, most significant slot first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusVectorChunk {
    OneBit([OneBitSymbol; ONE_BIT_VECTOR_CAPACITY]),
    TwoBit([TwoBitSymbol; TWO_BIT_VECTOR_CAPACITY]),
}

/// A parsed 2-byte packet status chunk, either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketStatusChunk {
    RunLength(RunLengthChunk),
    StatusVector(StatusVectorChunk),
}

impl PacketStatusChunk {
    /// Number of packet statuses this chunk describes, independent of how
    /// many of them fall inside the message's declared status count.
    pub fn num_packet_statuses(&self) -> usize {
        match self {
            PacketStatusChunk::RunLength(c) => c.run_length as usize,
            PacketStatusChunk::StatusVector(StatusVectorChunk::OneBit(_)) => {
                ONE_BIT_VECTOR_CAPACITY
            }
            PacketStatusChunk::StatusVector(StatusVectorChunk::TwoBit(_)) => {
                TWO_BIT_VECTOR_CAPACITY
            }
        }
    }

    /// Iterates the chunk's symbols in positional order. The iterator is
    /// lazy and can be created any number of times.
    pub fn symbols(&self) -> SymbolIter<'_> {
        SymbolIter { chunk: self, pos: 0 }
    }

    fn symbol_at(&self, pos: usize) -> PacketStatusSymbol {
        match self {
            PacketStatusChunk::RunLength(c) => PacketStatusSymbol::TwoBit(c.symbol),
            PacketStatusChunk::StatusVector(StatusVectorChunk::OneBit(symbols)) => {
                PacketStatusSymbol::OneBit(symbols[pos])
            }
            PacketStatusChunk::StatusVector(StatusVectorChunk::TwoBit(symbols)) => {
                PacketStatusSymbol::TwoBit(symbols[pos])
            }
        }
    }
}

/// Positional symbol iterator over one chunk.
pub struct SymbolIter<'a> {
    chunk: &'a PacketStatusChunk,
    pos: usize,
}

impl Iterator for SymbolIter<'_> {
    type Item = PacketStatusSymbol;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.chunk.num_packet_statuses() {
            return None;
        }
        let symbol = self.chunk.symbol_at(self.pos);
        self.pos += 1;
        Some(symbol)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.chunk.num_packet_statuses() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SymbolIter<'_> {}

impl MarshalSize for PacketStatusChunk {
    fn marshal_size(&self) -> usize {
        PACKET_STATUS_CHUNK_LENGTH
    }
}

impl Marshal for PacketStatusChunk {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < PACKET_STATUS_CHUNK_LENGTH {
            return Err(Error::BufferTooShort.into());
        }

        let word = match self {
            PacketStatusChunk::RunLength(c) => {
                if c.run_length > MAX_RUN_LENGTH {
                    return Err(Error::RunLengthOverflow.into());
                }
                ((c.symbol as u16) << 13) | c.run_length
            }
            PacketStatusChunk::StatusVector(StatusVectorChunk::OneBit(symbols)) => {
                let mut word = 0x8000;
                for (i, s) in symbols.iter().enumerate() {
                    word |= (*s as u16) << (13 - i);
                }
                word
            }
            PacketStatusChunk::StatusVector(StatusVectorChunk::TwoBit(symbols)) => {
                let mut word = 0x8000 | 0x4000;
                for (i, s) in symbols.iter().enumerate() {
                    word |= (*s as u16) << (12 - 2 * i);
                }
                word
            }
        };
        buf.put_u16(word);

        Ok(PACKET_STATUS_CHUNK_LENGTH)
    }
}

impl Unmarshal for PacketStatusChunk {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < PACKET_STATUS_CHUNK_LENGTH {
            return Err(Error::MalformedChunk.into());
        }

        let word = raw_packet.get_u16();

        // bit 15: chunk type, 0 = run length, 1 = status vector
        if word & 0x8000 == 0 {
            let symbol = TwoBitSymbol::from((word >> 13) & 0x3);
            let run_length = word & MAX_RUN_LENGTH;
            return Ok(PacketStatusChunk::RunLength(RunLengthChunk {
                symbol,
                run_length,
            }));
        }

        // bit 14: symbol width, 0 = one bit x14, 1 = two bit x7
        let chunk = if word & 0x4000 == 0 {
            let mut symbols = [OneBitSymbol::NotReceived; ONE_BIT_VECTOR_CAPACITY];
            for (i, s) in symbols.iter_mut().enumerate() {
                *s = OneBitSymbol::from((word >> (13 - i)) & 0x1);
            }
            StatusVectorChunk::OneBit(symbols)
        } else {
            let mut symbols = [TwoBitSymbol::NotReceived; TWO_BIT_VECTOR_CAPACITY];
            for (i, s) in symbols.iter_mut().enumerate() {
                *s = TwoBitSymbol::from((word >> (12 - 2 * i)) & 0x3);
            }
            StatusVectorChunk::TwoBit(symbols)
        };

        Ok(PacketStatusChunk::StatusVector(chunk))
    }
}
