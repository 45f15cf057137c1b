//! Integer arithmetic coder.
//!
//! The coder keeps the current interval as two N-bit integers, `low` and
//! `high`, standing for the fraction range `[low / 2^N, (high + 1) / 2^N)`.
//! Each symbol narrows that range to its cumulative slice, then the range is
//! renormalized:
//!
//! - **E1/E2**: `low` and `high` share their top bit. That bit is settled, so
//!   the encoder emits it (followed by any pending underflow bits, inverted)
//!   and both registers shift left.
//! - **E3**: `low = 01…` and `high = 10…`. The range straddles the midpoint
//!   but is at most half wide. The second-highest bit is dropped and the
//!   encoder counts one more pending bit instead of committing to a side.
//!
//! The decoder runs the same rules, pulling bits into a `code` register
//! instead of emitting them. Division truncates on both sides; any asymmetry
//! here breaks every symbol that follows.
//!
//! N is 16 whenever the model total fits (`total <= 2^14`). Larger totals
//! need a wider register so every slice keeps a non-zero width after
//! narrowing, and both sides pick the same N from the same total.

use tracing::{trace, warn};

use crate::bitstream::BitStream;
use crate::error::{Error, Result};
use crate::model::{CumulativeInterval, IntervalTable, Symbol};

/// Register width used for any model with `total <= 2^14`.
pub const DEFAULT_PRECISION: u32 = 16;

/// Widest supported register. Products are computed in `u128`.
pub const MAX_PRECISION: u32 = 62;

/// Register width needed for a model whose frequencies sum to `total`.
///
/// After renormalization the range is always wider than a quarter of the
/// register, so `2^(N-2) >= total` guarantees every slice a non-empty
/// sub-range.
///
/// # Errors
/// - [`Error::EmptyModel`] if `total` is zero.
/// - [`Error::TotalTooLarge`] if `total > 2^60`.
pub fn precision_for_total(total: u64) -> Result<u32> {
    if total == 0 {
        return Err(Error::EmptyModel);
    }
    let log2_ceil = 64 - (total - 1).leading_zeros();
    let precision = (log2_ceil + 2).max(DEFAULT_PRECISION);
    if precision > MAX_PRECISION {
        return Err(Error::TotalTooLarge(total));
    }
    Ok(precision)
}

/// What the next renormalization step should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Top bits agree; the bit is settled.
    Converge(bool),
    /// `low = 01…`, `high = 10…`.
    Underflow,
    /// `low < half <= high` and no E3 condition.
    Settled,
}

/// The `(low, high, underflow)` state of one encode or decode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoderRegister {
    low: u64,
    high: u64,
    underflow: u64,
    precision: u32,
}

impl CoderRegister {
    /// Full-range register `[0, 2^precision - 1]`.
    ///
    /// # Panics
    /// If `precision` is outside `2..=MAX_PRECISION`.
    pub fn new(precision: u32) -> Self {
        assert!(
            (2..=MAX_PRECISION).contains(&precision),
            "precision {precision} out of range"
        );
        Self {
            low: 0,
            high: (1u64 << precision) - 1,
            underflow: 0,
            precision,
        }
    }

    /// Lower bound (inclusive).
    pub fn low(&self) -> u64 {
        self.low
    }

    /// Upper bound (inclusive).
    pub fn high(&self) -> u64 {
        self.high
    }

    /// Pending E3 bits not yet written.
    pub fn underflow(&self) -> u64 {
        self.underflow
    }

    /// Register width in bits.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// `high - low + 1`.
    pub fn range(&self) -> u64 {
        self.high - self.low + 1
    }

    fn mask(&self) -> u64 {
        (1u64 << self.precision) - 1
    }

    fn top_bit(&self) -> u64 {
        1u64 << (self.precision - 1)
    }

    fn second_bit(&self) -> u64 {
        1u64 << (self.precision - 2)
    }

    /// Narrow to `interval`'s share of the current range, both bounds
    /// computed from the pre-update `low`.
    fn narrow(&mut self, interval: &CumulativeInterval, total: u64) {
        let width = u128::from(self.range());
        let low = u128::from(self.low);
        let total = u128::from(total);
        let new_low = low + width * u128::from(interval.start) / total;
        let new_high = low + width * u128::from(interval.end) / total - 1;
        self.low = new_low as u64;
        self.high = new_high as u64;
    }

    fn step(&self) -> Step {
        let top = self.top_bit();
        let second = self.second_bit();
        if self.low & top == self.high & top {
            Step::Converge(self.low & top != 0)
        } else if self.low & second != 0 && self.high & second == 0 {
            Step::Underflow
        } else {
            Step::Settled
        }
    }

    /// E1/E2: drop the settled top bit.
    fn shift(&mut self) {
        let mask = self.mask();
        self.low = (self.low << 1) & mask;
        self.high = ((self.high << 1) | 1) & mask;
    }

    /// E3: drop the second-highest bit, keeping `low < half <= high`.
    fn fold(&mut self) {
        self.shift();
        self.low &= !self.top_bit();
        self.high |= self.top_bit();
    }
}

/// Arithmetic encoder over a shared [`IntervalTable`].
#[derive(Debug)]
pub struct ArithmeticEncoder<'m> {
    model: &'m IntervalTable,
    register: CoderRegister,
    output: BitStream,
}

impl<'m> ArithmeticEncoder<'m> {
    /// Create an encoder with a full-range register.
    ///
    /// # Errors
    /// Fails if the model total is zero or too large for any register width.
    pub fn new(model: &'m IntervalTable) -> Result<Self> {
        let precision = precision_for_total(model.total())?;
        trace!(total = model.total(), precision, "arithmetic encoder");
        Ok(Self {
            model,
            register: CoderRegister::new(precision),
            output: BitStream::new(),
        })
    }

    /// Current register state.
    pub fn register(&self) -> &CoderRegister {
        &self.register
    }

    /// Bits written so far.
    pub fn bits_written(&self) -> usize {
        self.output.num_bits()
    }

    /// Encode one symbol.
    ///
    /// # Errors
    /// [`Error::UnknownSymbol`] / [`Error::MissingEnd`] if the model has no
    /// slice for `symbol`. The encoder state is unchanged in that case.
    pub fn encode(&mut self, symbol: Symbol) -> Result<()> {
        let interval = *self.model.lookup(symbol)?;
        self.register.narrow(&interval, self.model.total());
        self.renormalize();
        Ok(())
    }

    /// Encode every byte of `data`, optionally followed by END, and finish.
    ///
    /// # Errors
    /// Fails on the first byte the model does not cover.
    pub fn encode_all(mut self, data: &[u8], append_end: bool) -> Result<Vec<u8>> {
        for &b in data {
            self.encode(Symbol::Byte(b))?;
        }
        if append_end {
            self.encode(Symbol::End)?;
        }
        Ok(self.finish())
    }

    /// Flush the disambiguating `0 1` pair, pad to a whole byte with ones and
    /// return the encoded bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.output.append_bit(false);
        self.output.append_bit(true);
        let padding = self.output.expand_to_byte_boundary();
        let len = self.output.num_bits();
        for index in len - padding..len {
            self.output.set_bit(index, true);
        }
        self.output.into_bytes()
    }

    fn renormalize(&mut self) {
        loop {
            match self.register.step() {
                Step::Converge(bit) => {
                    self.output.append_bit(bit);
                    self.output.append_repeated(!bit, self.register.underflow);
                    self.register.underflow = 0;
                    self.register.shift();
                }
                Step::Underflow => {
                    self.register.underflow += 1;
                    self.register.fold();
                }
                Step::Settled => break,
            }
        }
    }
}

/// Arithmetic decoder over a shared [`IntervalTable`].
#[derive(Debug)]
pub struct ArithmeticDecoder<'m> {
    model: &'m IntervalTable,
    register: CoderRegister,
    code: u64,
    input: BitStream,
    decoded: usize,
    finished: bool,
}

impl<'m> ArithmeticDecoder<'m> {
    /// Create a decoder and load the first N bits of `payload`.
    ///
    /// # Errors
    /// - Fails if the model total is zero or too large.
    /// - [`Error::EmptyPayload`] if `payload` is empty.
    pub fn new(model: &'m IntervalTable, payload: &[u8]) -> Result<Self> {
        let precision = precision_for_total(model.total())?;
        if payload.is_empty() {
            return Err(Error::EmptyPayload);
        }
        trace!(
            total = model.total(),
            precision,
            bytes = payload.len(),
            "arithmetic decoder"
        );
        let mut decoder = Self {
            model,
            register: CoderRegister::new(precision),
            code: 0,
            input: BitStream::from_bytes(payload),
            decoded: 0,
            finished: false,
        };
        for _ in 0..precision {
            decoder.code = (decoder.code << 1) | decoder.pull_bit();
        }
        Ok(decoder)
    }

    /// Current register state.
    pub fn register(&self) -> &CoderRegister {
        &self.register
    }

    /// Decode the next symbol. Once END is returned, further calls keep
    /// returning END.
    ///
    /// # Errors
    /// [`Error::Desync`] if the code value lies outside every interval. The
    /// register arithmetic keeps `code` inside `[low, high]`, so this does not
    /// happen for any input bytes; corruption shows up as wrong symbols.
    pub fn decode(&mut self) -> Result<Symbol> {
        if self.finished {
            return Ok(Symbol::End);
        }
        let low = self.register.low;
        if self.code < low || self.code > self.register.high {
            return Err(self.desync());
        }

        let width = u128::from(self.register.range());
        let offset = u128::from(self.code - low + 1);
        let scaled = (u128::from(self.model.total()) * offset - 1) / width;
        let interval = match u64::try_from(scaled).ok().and_then(|v| self.model.find(v)) {
            Some(interval) => *interval,
            None => return Err(self.desync()),
        };

        if interval.is_end {
            self.finished = true;
            return Ok(Symbol::End);
        }

        self.register.narrow(&interval, self.model.total());
        self.renormalize();
        self.decoded += 1;
        Ok(interval.as_symbol())
    }

    /// Decode a whole stream of `expected_len` bytes.
    ///
    /// With an END-terminated model, decoding runs until END and the length
    /// is a cross-check. Without END, exactly `expected_len` symbols are read.
    ///
    /// # Errors
    /// [`Error::LengthMismatch`] if END arrives early or late.
    pub fn decode_all(mut self, expected_len: u64) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(expected_len.min(1 << 20) as usize);
        if self.model.end_interval().is_none() {
            for _ in 0..expected_len {
                match self.decode()? {
                    Symbol::Byte(b) => out.push(b),
                    Symbol::End => return Err(self.desync()),
                }
            }
            return Ok(out);
        }

        loop {
            match self.decode()? {
                Symbol::Byte(b) => {
                    if out.len() as u64 == expected_len {
                        warn!(expected_len, "END missing at expected length");
                        return Err(Error::LengthMismatch {
                            expected: expected_len,
                            actual: expected_len + 1,
                        });
                    }
                    out.push(b);
                }
                Symbol::End => break,
            }
        }
        if out.len() as u64 != expected_len {
            return Err(Error::LengthMismatch {
                expected: expected_len,
                actual: out.len() as u64,
            });
        }
        Ok(out)
    }

    /// Next payload bit. Past the end the cursor is clamped so the final bit
    /// repeats; the encoder's trailing ones make that the right continuation.
    fn pull_bit(&mut self) -> u64 {
        if self.input.cursor() >= self.input.num_bits() {
            self.input.set_cursor(self.input.num_bits() - 1);
        }
        self.input.next_bit().map_or(0, u64::from)
    }

    fn renormalize(&mut self) {
        loop {
            match self.register.step() {
                Step::Converge(_) => {
                    self.register.shift();
                    self.code = ((self.code << 1) & self.register.mask()) | self.pull_bit();
                }
                Step::Underflow => {
                    self.register.fold();
                    let top = self.register.top_bit();
                    let below = self.register.second_bit() - 1;
                    self.code = (self.code & top) | ((self.code & below) << 1) | self.pull_bit();
                }
                Step::Settled => break,
            }
        }
    }

    fn desync(&self) -> Error {
        warn!(position = self.decoded, "arithmetic decoder desynchronized");
        Error::Desync {
            position: self.decoded,
        }
    }
}
