#![warn(rust_2018_idioms)]
#![allow(dead_code)]

//! Wire codec for RTCP Transport-Wide Congestion Control feedback
//! (draft-holmer-rmcat-transport-wide-cc-extensions-01). Operates on the
//! feedback control information payload only; the surrounding RTCP header
//! and SSRC fields belong to the caller.

pub mod error;
pub mod packet_map;
pub mod packet_status_chunk;
pub mod packet_status_symbol;
pub mod recorder;
pub mod recv_delta;
pub mod transport_cc;
mod util;
