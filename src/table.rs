//! Self-delimiting serialization of a [`FrequencyTable`].
//!
//! Layout:
//!
//! ```text
//! [n - 1]                                  1 byte, 1..=256 entries
//! { [symbol] [hex digits...] [0x00] } × n
//! ```
//!
//! Digits are ASCII hex, least significant first, with high-order zero
//! digits dropped. An ASCII digit is never `0x00`, so the terminator cannot
//! appear inside a magnitude and the table's length falls out of a single
//! scan.
//!
//! The magnitude splits a frequency into five 10-bit units weighted
//! 1, 1024, 1024², 1024³ and 1024⁴. [`TableFormat::Packed`] lays all five
//! units side by side. [`TableFormat::Presence`] prefixes a 5-bit mask and
//! stores only the non-zero units, which is shorter for counts that are round
//! multiples of a unit. Either way the ceiling is [`MAX_FREQUENCY`].

use tracing::warn;

use crate::error::{Error, Result};
use crate::model::FrequencyTable;

/// Largest frequency the five 10-bit units can hold (`2^50 - 1`).
pub const MAX_FREQUENCY: u64 = (1 << (UNIT_BITS * UNITS as u32)) - 1;

const UNITS: usize = 5;
const UNIT_BITS: u32 = 10;
const UNIT_MASK: u64 = (1 << UNIT_BITS) - 1;
const PRESENCE_BITS: u32 = UNITS as u32;
const TERMINATOR: u8 = 0x00;
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";
const MAX_DIGITS: u32 = u64::BITS / 4;

/// How a frequency is packed into its hex magnitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableFormat {
    /// All five units, concatenated. The production format.
    #[default]
    Packed,
    /// Unit-presence bitmask followed by the non-zero units only.
    Presence,
}

impl TableFormat {
    fn pack(self, freq: u64) -> u64 {
        match self {
            TableFormat::Packed => freq,
            TableFormat::Presence => {
                let mut magnitude = 0u64;
                let mut shift = PRESENCE_BITS;
                for i in 0..UNITS {
                    let unit = unit(freq, i);
                    if unit != 0 {
                        magnitude |= 1 << i;
                        magnitude |= unit << shift;
                        shift += UNIT_BITS;
                    }
                }
                magnitude
            }
        }
    }

    fn unpack(self, magnitude: u64) -> Result<u64> {
        let mut freq = 0u64;
        let used_bits = match self {
            TableFormat::Packed => {
                for i in 0..UNITS {
                    freq += unit(magnitude, i) << (UNIT_BITS * i as u32);
                }
                UNIT_BITS * UNITS as u32
            }
            TableFormat::Presence => {
                let mut shift = PRESENCE_BITS;
                for i in 0..UNITS {
                    if magnitude & (1 << i) != 0 {
                        freq += ((magnitude >> shift) & UNIT_MASK) << (UNIT_BITS * i as u32);
                        shift += UNIT_BITS;
                    }
                }
                shift
            }
        };
        if used_bits < u64::BITS && magnitude >> used_bits != 0 {
            return Err(Error::FrequencyOutOfRange(magnitude));
        }
        Ok(freq)
    }
}

fn unit(value: u64, index: usize) -> u64 {
    (value >> (UNIT_BITS * index as u32)) & UNIT_MASK
}

fn hex_value(byte: u8) -> Option<u64> {
    match byte {
        b'0'..=b'9' => Some(u64::from(byte - b'0')),
        b'a'..=b'f' => Some(u64::from(byte - b'a' + 10)),
        b'A'..=b'F' => Some(u64::from(byte - b'A' + 10)),
        _ => None,
    }
}

fn write_hex(out: &mut Vec<u8>, mut value: u64) {
    while value != 0 {
        out.push(HEX_DIGITS[(value & 0xF) as usize]);
        value >>= 4;
    }
}

/// Serialize `table` in ascending symbol order.
///
/// An empty table is written as a single zero-count entry, since the count
/// byte cannot express zero entries.
///
/// # Errors
/// [`Error::FrequencyOutOfRange`] if any count exceeds [`MAX_FREQUENCY`].
pub fn serialize_table(table: &FrequencyTable, format: TableFormat) -> Result<Vec<u8>> {
    if table.is_empty() {
        return Ok(vec![0x00, 0x00, TERMINATOR]);
    }

    let mut out = Vec::with_capacity(1 + table.len() * 6);
    out.push((table.len() - 1) as u8);
    for (symbol, freq) in table.iter() {
        if freq > MAX_FREQUENCY {
            return Err(Error::FrequencyOutOfRange(freq));
        }
        out.push(symbol);
        write_hex(&mut out, format.pack(freq));
        out.push(TERMINATOR);
    }
    Ok(out)
}

/// Parse a table from the front of `data`.
///
/// Returns the table and the number of bytes it occupied; whatever follows
/// is left untouched. Zero-count entries are accepted and dropped.
///
/// # Errors
/// - [`Error::Truncated`] if `data` ends inside the table.
/// - [`Error::InvalidDigit`] for a byte that is neither a hex digit nor the
///   terminator.
/// - [`Error::FrequencyOutOfRange`] for a magnitude wider than the format.
/// - [`Error::DuplicateSymbol`] if a symbol appears twice.
pub fn deserialize_table(data: &[u8], format: TableFormat) -> Result<(FrequencyTable, usize)> {
    let entries = usize::from(*data.first().ok_or(Error::Truncated { offset: 0 })?) + 1;
    let mut pos = 1;
    let mut seen = [false; 256];
    let mut table = FrequencyTable::new();

    for _ in 0..entries {
        let symbol = *data.get(pos).ok_or(Error::Truncated { offset: pos })?;
        pos += 1;
        if seen[symbol as usize] {
            warn!(
                symbol,
                offset = pos - 1,
                "duplicate symbol in frequency table"
            );
            return Err(Error::DuplicateSymbol(symbol));
        }
        seen[symbol as usize] = true;

        let mut magnitude = 0u64;
        let mut digits = 0u32;
        loop {
            let byte = *data.get(pos).ok_or(Error::Truncated { offset: pos })?;
            pos += 1;
            if byte == TERMINATOR {
                break;
            }
            let nibble = hex_value(byte).ok_or(Error::InvalidDigit {
                byte,
                offset: pos - 1,
            })?;
            if digits == MAX_DIGITS {
                return Err(Error::FrequencyOutOfRange(magnitude));
            }
            magnitude |= nibble << (4 * digits);
            digits += 1;
        }

        table.insert(symbol, format.unpack(magnitude)?);
    }

    Ok((table, pos))
}
