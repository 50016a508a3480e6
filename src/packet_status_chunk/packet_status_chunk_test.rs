use bytes::Bytes;

use super::*;

#[test]
fn test_run_length_chunk_unmarshal() -> Result<()> {
    let tests = vec![
        (
            // 3.1.3 example1: https://tools.ietf.org/html/draft-holmer-rmcat-transport-wide-cc-extensions-01#page-7
            "not received 221",
            Bytes::from_static(&[0x00, 0xDD]),
            RunLengthChunk {
                symbol: TwoBitSymbol::NotReceived,
                run_length: 221,
            },
        ),
        (
            // 3.1.3 example2
            "reserved 24",
            Bytes::from_static(&[0x60, 0x18]),
            RunLengthChunk {
                symbol: TwoBitSymbol::Reserved,
                run_length: 24,
            },
        ),
        (
            "not received 5886",
            Bytes::from_static(&[0x16, 0xFE]),
            RunLengthChunk {
                symbol: TwoBitSymbol::NotReceived,
                run_length: 5886,
            },
        ),
    ];

    for (name, mut data, want) in tests {
        let got = PacketStatusChunk::unmarshal(&mut data)?;
        assert_eq!(got, PacketStatusChunk::RunLength(want), "Unmarshal {name}");
    }

    Ok(())
}

#[test]
fn test_run_length_chunk_marshal() -> Result<()> {
    let tests = vec![
        (
            "not received 221",
            RunLengthChunk {
                symbol: TwoBitSymbol::NotReceived,
                run_length: 221,
            },
            Bytes::from_static(&[0x00, 0xDD]),
        ),
        (
            "reserved 24",
            RunLengthChunk {
                symbol: TwoBitSymbol::Reserved,
                run_length: 24,
            },
            Bytes::from_static(&[0x60, 0x18]),
        ),
        (
            "max run length",
            RunLengthChunk {
                symbol: TwoBitSymbol::NotReceived,
                run_length: MAX_RUN_LENGTH,
            },
            Bytes::from_static(&[0x1F, 0xFF]),
        ),
    ];

    for (name, chunk, want) in tests {
        let got = PacketStatusChunk::RunLength(chunk).marshal()?;
        assert_eq!(got, want, "Marshal {name}");
    }

    Ok(())
}

#[test]
fn test_run_length_chunk_overflow() {
    let chunk = PacketStatusChunk::RunLength(RunLengthChunk {
        symbol: TwoBitSymbol::NotReceived,
        run_length: MAX_RUN_LENGTH + 1,
    });
    let result = chunk.marshal();
    assert!(result.is_err());
    assert_eq!(Error::RunLengthOverflow, result.unwrap_err());
}

#[test]
fn test_status_vector_chunk_unmarshal() -> Result<()> {
    use OneBitSymbol::{NotReceived as Nr, Received as R};

    let tests = vec![
        (
            // 3.1.4 example1
            "one bit mixed",
            Bytes::from_static(&[0x9F, 0x1C]),
            StatusVectorChunk::OneBit([Nr, R, R, R, R, R, Nr, Nr, Nr, R, R, R, Nr, Nr]),
        ),
        (
            "one bit single received",
            Bytes::from_static(&[0xA0, 0x00]),
            StatusVectorChunk::OneBit([R, Nr, Nr, Nr, Nr, Nr, Nr, Nr, Nr, Nr, Nr, Nr, Nr, Nr]),
        ),
        (
            // 3.1.4 example2
            "two bit mixed",
            Bytes::from_static(&[0xCD, 0x50]),
            StatusVectorChunk::TwoBit([
                TwoBitSymbol::NotReceived,
                TwoBitSymbol::Reserved,
                TwoBitSymbol::ReceivedSmallDelta,
                TwoBitSymbol::ReceivedSmallDelta,
                TwoBitSymbol::ReceivedSmallDelta,
                TwoBitSymbol::NotReceived,
                TwoBitSymbol::NotReceived,
            ]),
        ),
        (
            "two bit large then small",
            Bytes::from_static(&[0xE5, 0x55]),
            StatusVectorChunk::TwoBit([
                TwoBitSymbol::ReceivedLargeOrNegativeDelta,
                TwoBitSymbol::ReceivedSmallDelta,
                TwoBitSymbol::ReceivedSmallDelta,
                TwoBitSymbol::ReceivedSmallDelta,
                TwoBitSymbol::ReceivedSmallDelta,
                TwoBitSymbol::ReceivedSmallDelta,
                TwoBitSymbol::ReceivedSmallDelta,
            ]),
        ),
    ];

    for (name, mut data, want) in tests {
        let got = PacketStatusChunk::unmarshal(&mut data)?;
        assert_eq!(got, PacketStatusChunk::StatusVector(want), "Unmarshal {name}");
    }

    Ok(())
}

#[test]
fn test_status_vector_chunk_marshal_round_trip() -> Result<()> {
    for raw in [
        [0x9Fu8, 0x1C],
        [0xA0, 0x00],
        [0xCD, 0x50],
        [0xE5, 0x55],
        [0xB9, 0x40],
    ] {
        let mut data = Bytes::copy_from_slice(&raw);
        let chunk = PacketStatusChunk::unmarshal(&mut data)?;
        assert_eq!(&chunk.marshal()?[..], &raw[..], "round trip {raw:02X?}");
    }

    Ok(())
}

#[test]
fn test_chunk_unmarshal_short_buffer() {
    let mut data = Bytes::from_static(&[0xA0]);
    let result = PacketStatusChunk::unmarshal(&mut data);
    assert!(result.is_err());
    assert_eq!(Error::MalformedChunk, result.unwrap_err());
}

#[test]
fn test_num_packet_statuses() -> Result<()> {
    let tests = vec![
        (Bytes::from_static(&[0x16, 0xFE]), 5886),
        (Bytes::from_static(&[0x00, 0x00]), 0),
        (Bytes::from_static(&[0xA0, 0x00]), 14),
        (Bytes::from_static(&[0xE5, 0x55]), 7),
        // Trailing slots past the message's status count still parse.
        (Bytes::from_static(&[0xB9, 0x40]), 14),
    ];

    for (mut data, want) in tests {
        let chunk = PacketStatusChunk::unmarshal(&mut data)?;
        assert_eq!(chunk.num_packet_statuses(), want);
        assert_eq!(chunk.symbols().count(), want);
    }

    Ok(())
}

#[test]
fn test_symbol_iteration() -> Result<()> {
    let mut data = Bytes::from_static(&[0xB9, 0x40]);
    let chunk = PacketStatusChunk::unmarshal(&mut data)?;

    let received: Vec<bool> = chunk.symbols().map(|s| s.is_received()).collect();
    assert_eq!(
        received,
        vec![
            true, true, true, false, false, true, false, true, false, false, false, false, false,
            false
        ]
    );

    // Restartable: a fresh iterator yields the same sequence.
    let again: Vec<bool> = chunk.symbols().map(|s| s.is_received()).collect();
    assert_eq!(received, again);

    Ok(())
}

#[test]
fn test_run_length_symbol_iteration() -> Result<()> {
    let mut data = Bytes::from_static(&[0x16, 0xFE]);
    let chunk = PacketStatusChunk::unmarshal(&mut data)?;

    assert_eq!(chunk.symbols().len(), 5886);
    for symbol in chunk.symbols() {
        assert_eq!(
            symbol,
            PacketStatusSymbol::TwoBit(TwoBitSymbol::NotReceived)
        );
    }

    Ok(())
}
