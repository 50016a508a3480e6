
use bytes::{Buf, BufMut};
use util::marshal::{Marshal, MarshalSize};

use crate::error::Error;

type Result<T> = std::result::Result<T, util::Error>;

/// Duration of one delta tick in microseconds.
/// https://tools.ietf.org/html/draft-holmer-rmcat-transport-wide-cc-extensions-01#section-3.1.5
pub const DELTA_TICK_MICROS: i64 = 250;

/// Delta ticks per millisecond.
pub const TICKS_PER_MS: i64 = 4;

/// On-wire width of a receive delta field.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum DeltaWidth {
    /// 1 unsigned byte, [0, 255] ticks.
    Small,
    /// 2 bytes, signed, [-32768, 32767] ticks.
    Large,
}

impl DeltaWidth {
    pub fn num_bytes(&self) -> usize {
        match self {
            DeltaWidth::Small => 1,
            DeltaWidth::Large => 2,
        }
    }
}

/// Arrival time difference of a received packet, in 250us ticks.
///
/// Small deltas cover [0, 63.75]ms in 1 byte; large deltas cover
/// [-8192.0, 8191.75]ms in 2 signed bytes and are also used for any
/// negative difference.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum RecvDelta {
    Small(u8),
    Large(i16),
}

impl RecvDelta {
    /// Classifies a tick count into the narrowest width that represents it.
    ///
    /// `Small` iff `0 <= ticks <= 255`, otherwise `Large` while the value
    /// fits 16 signed bits.
    pub fn from_ticks(ticks: i64) -> crate::error::Result<Self> {
        if (0..=u8::MAX as i64).contains(&ticks) {
            Ok(RecvDelta::Small(ticks as u8))
        } else if (i16::MIN as i64..=i16::MAX as i64).contains(&ticks) {
            Ok(RecvDelta::Large(ticks as i16))
        } else {
            Err(Error::DeltaOutOfRange)
        }
    }

    /// Reads a delta of the given width. The width always comes from the
    /// packet status symbol, never from the buffer itself.
    pub fn read<B>(width: DeltaWidth, buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        if buf.remaining() < width.num_bytes() {
            return Err(Error::TruncatedBuffer.into());
        }
        Ok(match width {
            DeltaWidth::Small => RecvDelta::Small(buf.get_u8()),
            DeltaWidth::Large => RecvDelta::Large(buf.get_i16()),
        })
    }

    pub fn width(&self) -> DeltaWidth {
        match self {
            RecvDelta::Small(_) => DeltaWidth::Small,
            RecvDelta::Large(_) => DeltaWidth::Large,
        }
    }

    pub fn ticks(&self) -> i32 {
        match self {
            RecvDelta::Small(t) => *t as i32,
            RecvDelta::Large(t) => *t as i32,
        }
    }

    /// Delta in milliseconds, truncated toward zero.
    pub fn delta_ms(&self) -> i64 {
        self.ticks() as i64 / TICKS_PER_MS
    }

    /// Delta in microseconds.
    pub fn delta_us(&self) -> i64 {
        self.ticks() as i64 * DELTA_TICK_MICROS
    }
}

impl MarshalSize for RecvDelta {
    fn marshal_size(&self) -> usize {
        self.width().num_bytes()
    }
}

impl Marshal for RecvDelta {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort.into());
        }
        match self {
            RecvDelta::Small(t) => buf.put_u8(*t),
            RecvDelta::Large(t) => buf.put_i16(*t),
        }
        Ok(self.marshal_size())
    }
}
