
use crate::recv_delta::DeltaWidth;

/// Symbol alphabet used by one-bit status vector chunks.
///
/// A set bit means the packet arrived and carries a small (1 byte) delta.
///
/// https://tools.ietf.org/html/draft-holmer-rmcat-transport-wide-cc-extensions-01#section-3.1.4
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
#[repr(u16)]
pub enum OneBitSymbol {
    #[default]
    NotReceived = 0,
    Received = 1,
}

/// Symbol alphabet used by run-length chunks and two-bit status vector
/// chunks.
///
/// https://tools.ietf.org/html/draft-holmer-rmcat-transport-wide-cc-extensions-01#section-3.1.1
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
#[repr(u16)]
pub enum TwoBitSymbol {
    #[default]
    NotReceived = 0,
    ReceivedSmallDelta = 1,
    ReceivedLargeOrNegativeDelta = 2,
    /// Reserved on the wire; carries no delta and reads as not received.
    Reserved = 3,
}

impl From<u16> for OneBitSymbol {
    fn from(val: u16) -> Self {
        match val {
            0 => OneBitSymbol::NotReceived,
            _ => OneBitSymbol::Received,
        }
    }
}

impl From<u16> for TwoBitSymbol {
    fn from(val: u16) -> Self {
        match val {
            0 => TwoBitSymbol::NotReceived,
            1 => TwoBitSymbol::ReceivedSmallDelta,
            2 => TwoBitSymbol::ReceivedLargeOrNegativeDelta,
            _ => TwoBitSymbol::Reserved,
        }
    }
}

impl OneBitSymbol {
    /// Width of the receive delta this symbol consumes, if any.
    pub fn delta_width(&self) -> Option<DeltaWidth> {
        match self {
            OneBitSymbol::Received => Some(DeltaWidth::Small),
            OneBitSymbol::NotReceived => None,
        }
    }
}

impl TwoBitSymbol {
    /// Width of the receive delta this symbol consumes, if any.
    pub fn delta_width(&self) -> Option<DeltaWidth> {
        match self {
            TwoBitSymbol::ReceivedSmallDelta => Some(DeltaWidth::Small),
            TwoBitSymbol::ReceivedLargeOrNegativeDelta => Some(DeltaWidth::Large),
            TwoBitSymbol::NotReceived | TwoBitSymbol::Reserved => None,
        }
    }
}

/// A packet status symbol together with the alphabet it was read from.
///
/// The alphabet is fixed per chunk; the decoder only ever compares symbols
/// drawn from the same chunk, so the two alphabets stay distinct types and
/// this wrapper exists solely for chunk iteration.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum PacketStatusSymbol {
    OneBit(OneBitSymbol),
    TwoBit(TwoBitSymbol),
}

impl PacketStatusSymbol {
    /// Width of the receive delta this symbol consumes, if any.
    pub fn delta_width(&self) -> Option<DeltaWidth> {
        match self {
            PacketStatusSymbol::OneBit(s) => s.delta_width(),
            PacketStatusSymbol::TwoBit(s) => s.delta_width(),
        }
    }

    /// Whether the packet this symbol describes arrived at the receiver.
    pub fn is_received(&self) -> bool {
        self.delta_width().is_some()
    }
}
