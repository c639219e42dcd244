// src/bitstream/bit_buffer.rs

//! An append-only, bit-granular output buffer.
//!
//! `BitBuffer` is the storage every node of the composition tree writes into.
//! It is backed by a `BitVec<u8, Msb0>`, so the first bit written is the most
//! significant bit of the first byte, which is the order every syntax
//! structure in the bitstream is defined in. Appending one buffer to another
//! is a true bit-level concatenation: a substream that ends in the middle of a
//! byte is spliced in without any padding.

use crate::utils::error::Result;
use bitvec::prelude::*;

/// An owned, growable bit sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bits: BitVec<u8, Msb0>,
}

impl BitBuffer {
    /// Creates an empty buffer without allocating.
    #[inline]
    pub fn new() -> Self {
        BitBuffer { bits: BitVec::new() }
    }

    /// Creates an empty buffer with room for `bytes` bytes.
    ///
    /// Allocation failure is reported as `BitstreamError::OutOfMemory`
    /// instead of aborting the process.
    pub fn try_with_capacity(bytes: usize) -> Result<Self> {
        let mut storage: Vec<u8> = Vec::new();
        storage.try_reserve(bytes)?;
        Ok(BitBuffer { bits: BitVec::from_vec(storage) })
    }

    /// Makes room for at least `additional_bits` more bits.
    ///
    /// On failure the contents are kept and `BitstreamError::OutOfMemory` is
    /// returned.
    pub fn try_reserve(&mut self, additional_bits: usize) -> Result<()> {
        let len = self.bits.len();
        if self.bits.capacity() - len >= additional_bits {
            return Ok(());
        }
        let mut storage = std::mem::take(&mut self.bits).into_vec();
        let needed = len.div_ceil(8) + additional_bits.div_ceil(8);
        let reserved = storage.try_reserve(needed.saturating_sub(storage.len()));
        let mut bits = BitVec::from_vec(storage);
        bits.truncate(len);
        self.bits = bits;
        reserved?;
        Ok(())
    }

    /// Appends the low `n_bits` of `value`, most significant bit first.
    ///
    /// # Panics
    ///
    /// Panics if `n_bits > 32` or if `value` does not fit in `n_bits`. Both
    /// are bugs in the calling syntax writer.
    pub fn write_fixed(&mut self, value: u32, n_bits: u32) {
        assert!(n_bits <= 32, "cannot write {} bits in one field", n_bits);
        assert!(
            n_bits == 32 || value >> n_bits == 0,
            "value {} does not fit in {} bits",
            value,
            n_bits
        );
        self.bits
            .extend((0..n_bits).rev().map(|i| (value >> i) & 1 != 0));
    }

    /// Appends a single bit.
    #[inline]
    pub fn write_flag(&mut self, flag: bool) {
        self.bits.push(flag);
    }

    /// Appends a whole byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.write_fixed(byte as u32, 8);
    }

    /// Appends raw bytes, starting at the current (possibly unaligned) position.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bits.extend_from_bitslice(bytes.view_bits::<Msb0>());
    }

    /// Appends `value` as an unsigned Exp-Golomb code, `ue(v)`.
    #[inline]
    pub fn write_ue(&mut self, value: u32) {
        self.write_exp_golomb(value as u64);
    }

    /// Appends `value` as a signed Exp-Golomb code, `se(v)`.
    #[inline]
    pub fn write_se(&mut self, value: i32) {
        let value = value as i64;
        let code_num = if value > 0 { 2 * value - 1 } else { -2 * value };
        self.write_exp_golomb(code_num as u64);
    }

    // code_num is at most 2^32, so the suffix never needs more than 32 bits.
    fn write_exp_golomb(&mut self, code_num: u64) {
        let code = code_num + 1;
        let k = 63 - code.leading_zeros();
        self.bits.extend(std::iter::repeat_n(false, k as usize));
        self.bits.push(true);
        self.write_fixed((code - (1u64 << k)) as u32, k);
    }

    /// Pads with `fill` bits up to the next byte boundary.
    pub fn align(&mut self, fill: bool) {
        let pad = (8 - self.bits.len() % 8) % 8;
        self.bits.extend(std::iter::repeat_n(fill, pad));
    }

    /// Pads with zero bits up to the next byte boundary.
    #[inline]
    pub fn align_zero(&mut self) {
        self.align(false);
    }

    /// Writes `rbsp_trailing_bits()`: a stop bit followed by zero alignment.
    #[inline]
    pub fn write_trailing_bits(&mut self) {
        self.bits.push(true);
        self.align_zero();
    }

    /// Concatenates `other` onto `self` bit-exactly and empties `other`.
    ///
    /// The room for `other` is reserved up front, so running out of memory
    /// is reported instead of aborting; `self` and `other` are then untouched.
    pub fn append(&mut self, other: &mut BitBuffer) -> Result<()> {
        self.try_reserve(other.tell_bits())?;
        self.bits.extend_from_bitslice(other.bits.as_bitslice());
        other.clear();
        Ok(())
    }

    /// Resets the buffer to empty and releases its storage.
    #[inline]
    pub fn clear(&mut self) {
        self.bits = BitVec::new();
    }

    /// Number of bits written so far.
    #[inline]
    pub fn tell_bits(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.bits.len() % 8 == 0
    }

    /// Byte length, if the buffer currently ends on a byte boundary.
    #[inline]
    pub fn aligned_len(&self) -> Option<usize> {
        self.is_aligned().then(|| self.bits.len() / 8)
    }

    /// The written bits.
    #[inline]
    pub fn as_bitslice(&self) -> &BitSlice<u8, Msb0> {
        &self.bits
    }

    /// Copies the buffer out as bytes. A trailing partial byte is zero padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.bits.as_raw_slice().to_vec();
        let tail = self.bits.len() % 8;
        if tail != 0 {
            if let Some(last) = out.last_mut() {
                *last &= 0xFFu8 << (8 - tail);
            }
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod test_reader {
    use bitvec::prelude::*;

    /// Minimal reader used by the unit tests to walk written syntax.
    pub struct BitReader<'a> {
        bits: &'a BitSlice<u8, Msb0>,
        pos: usize,
    }

    impl<'a> BitReader<'a> {
        pub fn new(bits: &'a BitSlice<u8, Msb0>) -> Self {
            BitReader { bits, pos: 0 }
        }

        pub fn position(&self) -> usize {
            self.pos
        }

        pub fn remaining(&self) -> usize {
            self.bits.len() - self.pos
        }

        pub fn read_bits(&mut self, n: u32) -> u32 {
            let mut value = 0u32;
            for _ in 0..n {
                value = (value << 1) | self.bits[self.pos] as u32;
                self.pos += 1;
            }
            value
        }

        pub fn read_flag(&mut self) -> bool {
            self.read_bits(1) == 1
        }

        pub fn read_ue(&mut self) -> u32 {
            let mut zeros = 0;
            while !self.bits[self.pos] {
                zeros += 1;
                self.pos += 1;
            }
            self.pos += 1;
            let suffix = self.read_bits(zeros) as u64;
            ((1u64 << zeros) + suffix - 1) as u32
        }

        pub fn read_se(&mut self) -> i32 {
            let code = self.read_ue() as i64;
            if code % 2 == 1 {
                ((code + 1) / 2) as i32
            } else {
                (-(code / 2)) as i32
            }
        }
    }
}
