use proptest::prelude::*;
use static_arith::{
    compress, decompress, deserialize_table, serialize_table, ArithmeticCodec, ArithmeticEncoder,
    ByteCodec, CodecConfig, Error, FrequencyTable, IntervalTable, Symbol, TableFormat,
    MAX_FREQUENCY,
};

fn table_strategy() -> impl Strategy<Value = FrequencyTable> {
    prop::collection::btree_map(any::<u8>(), 1u64..=MAX_FREQUENCY, 0..64)
        .prop_map(|counts| counts.into_iter().collect())
}

proptest! {
    #[test]
    fn test_round_trip(data in prop::collection::vec(0u8..255, 0..2000)) {
        let compressed = compress(&data).unwrap();
        prop_assert_eq!(decompress(&compressed.bytes).unwrap(), data);
    }

    #[test]
    fn test_round_trip_small_alphabet(
        data in prop::collection::vec(prop::sample::select(b"ab\n".to_vec()), 0..5000),
    ) {
        let compressed = compress(&data).unwrap();
        prop_assert_eq!(decompress(&compressed.bytes).unwrap(), data);
    }

    #[test]
    fn test_table_round_trip(table in table_strategy()) {
        for format in [TableFormat::Packed, TableFormat::Presence] {
            let bytes = serialize_table(&table, format).unwrap();
            let (back, consumed) = deserialize_table(&bytes, format).unwrap();
            prop_assert_eq!(&back, &table);
            prop_assert_eq!(consumed, bytes.len());
        }
    }

    #[test]
    fn test_interval_partition(
        counts in prop::collection::btree_map(any::<u8>(), 1u64..10_000, 1..200),
        include_end in any::<bool>(),
    ) {
        let table: FrequencyTable = counts.into_iter().collect();
        let model = IntervalTable::new(&table, include_end).unwrap();

        let mut next = 0;
        let mut last_symbol = None;
        for iv in model.iter() {
            prop_assert_eq!(iv.start, next);
            prop_assert!(iv.end > iv.start);
            if iv.is_end {
                prop_assert_eq!(iv.width(), 1);
            } else {
                prop_assert_eq!(iv.width(), table.get(iv.symbol));
                prop_assert!(last_symbol < Some(iv.symbol));
                last_symbol = Some(iv.symbol);
            }
            next = iv.end;
        }
        prop_assert_eq!(next, model.total());
        prop_assert_eq!(model.total(), table.total() + u64::from(include_end));
    }

    #[test]
    fn test_register_invariant(data in prop::collection::vec(any::<u8>(), 1..500)) {
        let table = FrequencyTable::from_data(&data);
        prop_assume!(table.len() < 256);
        let model = IntervalTable::new(&table, true).unwrap();
        let mut encoder = ArithmeticEncoder::new(&model).unwrap();
        let full = encoder.register().range();
        for &b in &data {
            encoder.encode(Symbol::Byte(b)).unwrap();
            let reg = encoder.register();
            prop_assert!(reg.low() < reg.high());
            prop_assert!(reg.range() <= full);
        }
    }

    #[test]
    fn test_presence_codec_round_trip(data in prop::collection::vec(0u8..32, 0..1000)) {
        let codec = ArithmeticCodec::new(
            CodecConfig::default().with_table_format(TableFormat::Presence),
        );
        let compressed = codec.compress(&data).unwrap();
        prop_assert_eq!(codec.decompress(&compressed.bytes).unwrap(), data);
    }

    #[test]
    fn test_corrupted_payload_never_panics(
        data in prop::collection::vec(0u8..16, 1..300),
        flip in any::<prop::sample::Index>(),
    ) {
        let mut bytes = compress(&data).unwrap().bytes;
        let header_len = serialize_table(&FrequencyTable::from_data(&data), TableFormat::Packed)
            .unwrap()
            .len();
        let at = header_len + flip.index(bytes.len() - header_len);
        bytes[at] ^= 0x10;
        // wrong bytes or a misplaced END, never a panic
        match decompress(&bytes) {
            Ok(decoded) => prop_assert_eq!(decoded.len(), data.len()),
            Err(err) => prop_assert!(matches!(err, Error::LengthMismatch { .. }), "unexpected error: {:?}", err),
        }
    }
}

#[test]
fn test_full_alphabet_reports_model_error() {
    let data: Vec<u8> = (0..=255u8).collect();
    assert_eq!(compress(&data).unwrap_err(), Error::AlphabetFull);
}

#[test]
fn test_large_input_round_trip() {
    let data: Vec<u8> = (0..100_000u32)
        .map(|i| b"abcdefgh"[(i.wrapping_mul(2654435761) >> 29) as usize])
        .collect();
    let compressed = compress(&data).unwrap();
    assert!(compressed.bytes.len() < data.len() / 2);
    assert_eq!(decompress(&compressed.bytes).unwrap(), data);
}
