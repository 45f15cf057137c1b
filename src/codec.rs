//! Container: frequency-table header followed by the arithmetic-coded payload.
//!
//! ```text
//! [serialized FrequencyTable][payload bits, MSB first, byte padded]
//! ```
//!
//! There is no magic number, version or payload length. The header measures
//! itself, the original length is the sum of its counts, and the payload ends
//! with an END symbol.

use tracing::debug;

use crate::coder::{ArithmeticDecoder, ArithmeticEncoder};
use crate::config::CodecConfig;
use crate::error::Result;
use crate::model::{FrequencyTable, IntervalTable};
use crate::table::{deserialize_table, serialize_table};

/// Output of a compression call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    /// Header plus payload. Always a valid container, even when `ok` is false.
    pub bytes: Vec<u8>,
    /// Whether compression is expected to pay off. A soft hint, not an error;
    /// check it rather than comparing sizes.
    pub ok: bool,
}

/// The one-shot byte codec contract shared by lossless coders.
pub trait ByteCodec {
    /// Compress `data` into a self-contained buffer.
    fn compress(&self, data: &[u8]) -> Result<Compressed>;

    /// Reverse [`ByteCodec::compress`].
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Order-0 arithmetic coding behind the [`ByteCodec`] contract.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArithmeticCodec {
    config: CodecConfig,
}

impl ArithmeticCodec {
    /// Create a codec with the given settings.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// The codec's settings.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl ByteCodec for ArithmeticCodec {
    fn compress(&self, data: &[u8]) -> Result<Compressed> {
        let table = FrequencyTable::from_data(data);
        let payload = encode_with_model(data, &table, true)?;
        let mut bytes = serialize_table(&table, self.config.table_format)?;
        let header_len = bytes.len();
        bytes.extend_from_slice(&payload);

        let entropy = table.entropy();
        let ok = entropy < self.config.max_bits_per_symbol;
        debug!(
            input = data.len(),
            header = header_len,
            payload = payload.len(),
            entropy,
            ok,
            "compressed"
        );
        Ok(Compressed { bytes, ok })
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let (table, header_len) = deserialize_table(data, self.config.table_format)?;
        let original_len = table.total();
        debug!(
            header = header_len,
            payload = data.len() - header_len,
            original_len,
            "decompressing"
        );
        decode_with_model(&data[header_len..], &table, original_len)
    }
}

/// Compress with the default configuration.
///
/// # Errors
/// [`crate::Error::AlphabetFull`] if `data` uses all 256 byte values.
pub fn compress(data: &[u8]) -> Result<Compressed> {
    ArithmeticCodec::default().compress(data)
}

/// Decompress a container produced by [`compress`].
///
/// # Errors
/// Format errors for a bad header, decode errors for a bad payload.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    ArithmeticCodec::default().decompress(data)
}

/// Arithmetic-code `data` under `table`, without a header.
///
/// With `append_end` the stream is self-terminating; without it the reader
/// must know the length and use an [`IntervalTable`] built without END.
///
/// # Errors
/// Model errors, or [`crate::Error::UnknownSymbol`] for a byte `table` does
/// not count.
pub fn encode_with_model(data: &[u8], table: &FrequencyTable, append_end: bool) -> Result<Vec<u8>> {
    let model = IntervalTable::new(table, append_end)?;
    ArithmeticEncoder::new(&model)?.encode_all(data, append_end)
}

/// Decode an END-terminated payload produced under `table`.
///
/// `original_len` cross-checks where END lands.
///
/// # Errors
/// Model errors, [`crate::Error::EmptyPayload`] or
/// [`crate::Error::LengthMismatch`]. A corrupted payload that happens to
/// end at the right length decodes to wrong bytes without an error.
pub fn decode_with_model(
    payload: &[u8],
    table: &FrequencyTable,
    original_len: u64,
) -> Result<Vec<u8>> {
    let model = IntervalTable::new(table, true)?;
    ArithmeticDecoder::new(&model, payload)?.decode_all(original_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::table::TableFormat;

    #[test]
    fn test_aabb() {
        let compressed = compress(b"AABB").unwrap();
        assert!(compressed.ok);
        let (table, _) = deserialize_table(&compressed.bytes, TableFormat::Packed).unwrap();
        assert_eq!(table.get(b'A'), 2);
        assert_eq!(table.get(b'B'), 2);
        assert_eq!(IntervalTable::new(&table, true).unwrap().total(), 5);
        assert_eq!(decompress(&compressed.bytes).unwrap(), b"AABB");
    }

    #[test]
    fn test_single_byte() {
        let compressed = compress(b"Z").unwrap();
        assert!(compressed.ok);
        assert_eq!(decompress(&compressed.bytes).unwrap(), b"Z");
    }

    #[test]
    fn test_empty_input() {
        let compressed = compress(b"").unwrap();
        assert!(compressed.ok);
        assert_eq!(compressed.bytes, vec![0x00, 0x00, 0x00, 0x7F]);
        assert!(decompress(&compressed.bytes).unwrap().is_empty());
    }

    #[test]
    fn test_full_alphabet_is_model_error() {
        let data: Vec<u8> = (0..=255u8).chain(0..10).collect();
        let err = compress(&data).unwrap_err();
        assert_eq!(err, Error::AlphabetFull);
        assert_eq!(err.kind(), ErrorKind::Model);
    }

    #[test]
    fn test_255_symbols_still_compress() {
        let data: Vec<u8> = (1..=255u8).collect();
        let compressed = compress(&data).unwrap();
        assert_eq!(decompress(&compressed.bytes).unwrap(), data);

        let data: Vec<u8> = (0..=254u8).rev().collect();
        let compressed = compress(&data).unwrap();
        assert_eq!(decompress(&compressed.bytes).unwrap(), data);
    }

    #[test]
    fn test_high_entropy_is_not_ok() {
        let codec = ArithmeticCodec::new(CodecConfig::default().with_max_bits_per_symbol(2.0));
        let data: Vec<u8> = (0..64u8).collect();
        let compressed = codec.compress(&data).unwrap();
        assert!(!compressed.ok);
        // bytes are still a valid container
        assert_eq!(codec.decompress(&compressed.bytes).unwrap(), data);
    }

    #[test]
    fn test_default_threshold_accepts_any_alphabet() {
        // 255 equiprobable symbols is the entropy maximum, log2(255) < 8
        let data: Vec<u8> = (0..=254u8).cycle().take(255 * 4).collect();
        let compressed = compress(&data).unwrap();
        assert!(compressed.ok);
        assert_eq!(decompress(&compressed.bytes).unwrap(), data);
    }

    #[test]
    fn test_presence_format_codec() {
        let codec = ArithmeticCodec::new(
            CodecConfig::default().with_table_format(TableFormat::Presence),
        );
        let data = b"presence bitmask headers still round trip".repeat(40);
        let compressed = codec.compress(&data).unwrap();
        assert_eq!(codec.decompress(&compressed.bytes).unwrap(), data);
    }

    #[test]
    fn test_compresses_skewed_text() {
        let data = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaab".repeat(50);
        let compressed = compress(&data).unwrap();
        assert!(compressed.ok);
        assert!(compressed.bytes.len() < data.len() / 4);
        assert_eq!(decompress(&compressed.bytes).unwrap(), data);
    }

    #[test]
    fn test_header_errors_surface() {
        assert_eq!(decompress(&[]).unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(
            decompress(b"\x00A4").unwrap_err(),
            Error::Truncated { offset: 3 }
        );
    }

    #[test]
    fn test_missing_payload() {
        let table = FrequencyTable::from_data(b"abc");
        let header = serialize_table(&table, TableFormat::Packed).unwrap();
        let err = decompress(&header).unwrap_err();
        assert_eq!(err, Error::EmptyPayload);
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_encode_with_foreign_model() {
        let table = FrequencyTable::from_data(b"abc");
        assert_eq!(
            encode_with_model(b"abd", &table, true).unwrap_err(),
            Error::UnknownSymbol(b'd')
        );
    }

    #[test]
    fn test_shared_model_across_threads() {
        let text = b"shared static model ";
        let chunks: Vec<Vec<u8>> = (0..4)
            .map(|i| text.iter().cycle().skip(i).take(500).copied().collect())
            .collect();
        let table: FrequencyTable = FrequencyTable::from_data(&chunks.concat());
        let model = IntervalTable::new(&table, true).unwrap();

        let decoded: Vec<Vec<u8>> = std::thread::scope(|s| {
            let handles: Vec<_> = chunks
                .iter()
                .map(|chunk| {
                    let model = &model;
                    s.spawn(move || {
                        let payload = ArithmeticEncoder::new(model)
                            .unwrap()
                            .encode_all(chunk, true)
                            .unwrap();
                        ArithmeticDecoder::new(model, &payload)
                            .unwrap()
                            .decode_all(chunk.len() as u64)
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(decoded, chunks);
    }
}
