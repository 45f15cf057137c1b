//! Bit-level I/O for the arithmetic coder.
//!
//! Bits are packed most-significant-first within each byte and stream order
//! is append order. The same type serves both sides: the encoder appends,
//! the decoder wraps a byte slice and walks it with a cursor.

const BYTE_BITS: usize = 8;

/// A growable, random-access sequence of bits backed by a byte buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStream {
    bytes: Vec<u8>,
    num_bits: usize,
    cursor: usize,
}

impl BitStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing bytes; every bit of every byte is addressable.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            num_bits: bytes.len() * BYTE_BITS,
            cursor: 0,
        }
    }

    /// Number of logical bits.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Append one bit at the end.
    pub fn append_bit(&mut self, bit: bool) {
        if self.num_bits == self.bytes.len() * BYTE_BITS {
            self.bytes.push(0);
        }
        let index = self.num_bits;
        self.num_bits += 1;
        self.write(index, bit);
    }

    /// Append `bit` `count` times.
    pub fn append_repeated(&mut self, bit: bool, count: u64) {
        for _ in 0..count {
            self.append_bit(bit);
        }
    }

    /// Overwrite the bit at `index`.
    ///
    /// # Panics
    /// If `index >= num_bits()`.
    pub fn set_bit(&mut self, index: usize, bit: bool) {
        assert!(
            index < self.num_bits,
            "bit index {index} out of range for {} bits",
            self.num_bits
        );
        self.write(index, bit);
    }

    /// Bit at `index`, or `None` past the end.
    pub fn bit_at(&self, index: usize) -> Option<bool> {
        if index >= self.num_bits {
            return None;
        }
        let mask = 0x80u8 >> (index % BYTE_BITS);
        Some(self.bytes[index / BYTE_BITS] & mask != 0)
    }

    /// Read the bit under the cursor and advance.
    pub fn next_bit(&mut self) -> Option<bool> {
        let bit = self.bit_at(self.cursor)?;
        self.cursor += 1;
        Some(bit)
    }

    /// Position of the read cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the read cursor.
    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index;
    }

    /// Grow the logical length up to the next byte boundary.
    ///
    /// The new bits are whatever the backing byte already holds (zero for a
    /// stream built by appending); existing bits are unchanged. Returns the
    /// number of bits added.
    pub fn expand_to_byte_boundary(&mut self) -> usize {
        let rem = self.num_bits % BYTE_BITS;
        if rem == 0 {
            return 0;
        }
        let added = BYTE_BITS - rem;
        self.num_bits += added;
        added
    }

    /// Backing bytes. Only whole bytes are meaningful once the stream has
    /// been expanded to a byte boundary.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the stream and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn write(&mut self, index: usize, bit: bool) {
        let mask = 0x80u8 >> (index % BYTE_BITS);
        let byte = &mut self.bytes[index / BYTE_BITS];
        if bit {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}
