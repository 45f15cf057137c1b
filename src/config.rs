//! Codec configuration.

use crate::table::TableFormat;

/// Entropy at or above which compression is reported as not worthwhile.
///
/// An order-0 coder cannot beat the entropy of the byte distribution, and at
/// 8 bits per symbol it cannot beat storing the bytes verbatim.
pub const DEFAULT_MAX_BITS_PER_SYMBOL: f64 = 8.0;

/// Settings shared by the compressing and decompressing side.
///
/// The container carries no format tag, so both sides must agree on
/// `table_format`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecConfig {
    /// Magnitude packing for the frequency-table header.
    pub table_format: TableFormat,
    /// `Compressed::ok` is false when the data's entropy reaches this.
    ///
    /// A compressible input uses at most 255 distinct bytes, so its entropy
    /// is at most `log2(255)`, about 7.994. With the default of 8.0 the flag
    /// is therefore always true. Lower it to get a real cut-off.
    pub max_bits_per_symbol: f64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            table_format: TableFormat::Packed,
            max_bits_per_symbol: DEFAULT_MAX_BITS_PER_SYMBOL,
        }
    }
}

impl CodecConfig {
    /// Set the table format.
    pub fn with_table_format(mut self, format: TableFormat) -> Self {
        self.table_format = format;
        self
    }

    /// Set the entropy threshold for the `ok` signal.
    pub fn with_max_bits_per_symbol(mut self, bits: f64) -> Self {
        self.max_bits_per_symbol = bits;
        self
    }
}
