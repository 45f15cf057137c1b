//! # Static Arithmetic Coding
//!
//! *Order-0 integer arithmetic coding with a self-describing model header.*
//!
//! ## Intuition First
//!
//! Think of a message as a single point somewhere in `[0, 1)`. Every symbol
//! picks a slice of the current range, sized by how often that symbol occurs,
//! and the point must lie in that slice. Frequent symbols get wide slices and
//! barely shrink the range; rare ones shrink it a lot. The encoded message is
//! just enough binary digits to name a point inside the final, tiny range.
//!
//! ## The Problem
//!
//! Doing this with real numbers needs unbounded precision. A 64-bit float
//! runs out after a few dozen symbols. The integer coder keeps only a fixed
//! window of the range's binary expansion and shifts settled digits out as
//! soon as the range's ends agree on them. The one awkward case is a range
//! that shrinks around the midpoint without ever settling; the coder folds
//! those digits away and emits them later, once the side is known.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon     Entropy as the fundamental limit
//! 1976  Rissanen,   Finite-precision arithmetic coding
//!       Pasco
//! 1979  Rissanen,   Arithmetic coding as a general framework
//!       Langdon
//! 1987  Witten,     "Arithmetic Coding for Data Compression" (CACM):
//!       Neal,       the E1/E2/E3 renormalization used here
//!       Cleary
//! ```
//!
//! ## Mathematical Formulation
//!
//! With register width $N$, current bounds `low`, `high`, a symbol whose
//! cumulative slice is `[start, end)` out of `total`:
//!
//! ```text
//! width = high - low + 1
//! low'  = low + floor(width * start / total)
//! high' = low + floor(width * end   / total) - 1
//! ```
//!
//! The decoder inverts this with the `code` register:
//!
//! ```text
//! scaled = floor((total * (code - low + 1) - 1) / width)
//! ```
//!
//! and picks the symbol whose slice contains `scaled`.
//!
//! ## Complexity Analysis
//!
//! - **Time**: $O(n)$ symbols, $O(\log k)$ slice lookup per decoded symbol.
//! - **Space**: $O(k)$ for the model. The payload stays close to
//!   $n \cdot H$ bits for the model's entropy $H$, plus the flush pair and
//!   byte padding.
//!
//! ## Failure Modes
//!
//! 1. **No room for END**: data that uses all 256 byte values cannot be
//!    terminated ([`Error::AlphabetFull`]).
//! 2. **No integrity check**: a flipped payload bit corrupts everything after
//!    it. If END then lands at the wrong position, decoding fails with
//!    [`Error::LengthMismatch`]. Otherwise the output has the right length
//!    and wrong bytes, and no error is reported.
//!
//! ## Implementation Notes
//!
//! This crate provides:
//! - [`model`]: frequency counts, END selection, cumulative intervals.
//! - [`bitstream`]: MSB-first bit buffer with a read cursor.
//! - [`coder`]: the register machine ([`ArithmeticEncoder`],
//!   [`ArithmeticDecoder`]).
//! - [`table`]: the compact frequency-table header.
//! - [`codec`]: the `[header][payload]` container and [`ByteCodec`].
//!
//! ## References
//!
//! - Witten, I. H., Neal, R. M., Cleary, J. G. (1987). "Arithmetic coding for data
//!   compression." CACM 30(6).
//! - Nelson, M. (2014). "Data Compression With Arithmetic Coding."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitstream;
pub mod codec;
pub mod coder;
pub mod config;
pub mod error;
pub mod model;
pub mod table;

pub use bitstream::BitStream;
pub use codec::{
    compress, decode_with_model, decompress, encode_with_model, ArithmeticCodec, ByteCodec,
    Compressed,
};
pub use coder::{ArithmeticDecoder, ArithmeticEncoder, CoderRegister};
pub use config::CodecConfig;
pub use error::{Error, ErrorKind, Result};
pub use model::{choose_unused_symbol, CumulativeInterval, FrequencyTable, IntervalTable, Symbol};
pub use table::{deserialize_table, serialize_table, TableFormat, MAX_FREQUENCY};
