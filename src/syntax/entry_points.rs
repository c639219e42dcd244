// src/syntax/entry_points.rs

//! Entry point offset table of a slice header.

use crate::bitstream::BitBuffer;
use crate::utils::error::{BitstreamError, Result};

/// Number of bits needed to represent `value`; 0 for 0.
#[inline]
pub fn bit_length(value: usize) -> u32 {
    usize::BITS - value.leading_zeros()
}

/// Field width used for `entry_point_offset_minus1` given the largest
/// substream length under the slice.
#[inline]
pub fn offset_width(max_len: usize) -> u32 {
    bit_length(max_len) + 1
}

/// Writes `num_entry_point_offsets` and, if there are any units at all,
/// `offset_len_minus1` and one offset per unit except the last.
///
/// `substreams` holds the byte length of every terminal unit under the slice,
/// in left-to-right order.
pub fn write_entry_points(stream: &mut BitBuffer, substreams: &[usize]) -> Result<()> {
    if let Some(unit) = substreams.iter().position(|&len| len == 0) {
        return Err(BitstreamError::EmptySubstream { unit });
    }
    let Some(&max_len) = substreams.iter().max() else {
        return Ok(());
    };

    let width = offset_width(max_len);
    debug_assert!(width <= 32);
    stream.write_ue(substreams.len() as u32 - 1); // num_entry_point_offsets
    stream.write_ue(width - 1); // offset_len_minus1
    for &len in &substreams[..substreams.len() - 1] {
        stream.write_fixed(len as u32 - 1, width);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::bit_buffer::test_reader::BitReader;

    #[test]
    fn test_bit_length() {
        assert_eq!(bit_length(0), 0);
        assert_eq!(bit_length(1), 1);
        assert_eq!(bit_length(255), 8);
        assert_eq!(bit_length(256), 9);
        assert_eq!(bit_length(300), 9);
    }

    #[test]
    fn test_three_units() {
        let mut stream = BitBuffer::new();
        write_entry_points(&mut stream, &[10, 300, 5]).unwrap();

        let mut reader = BitReader::new(stream.as_bitslice());
        assert_eq!(reader.read_ue(), 2);
        assert_eq!(reader.read_ue(), 9);
        assert_eq!(reader.read_bits(10), 9);
        assert_eq!(reader.read_bits(10), 299);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_lengths_are_recoverable() {
        let lengths = [1usize, 4096, 77, 3, 65535, 12];
        let mut stream = BitBuffer::new();
        write_entry_points(&mut stream, &lengths).unwrap();

        let mut reader = BitReader::new(stream.as_bitslice());
        let count = reader.read_ue() as usize + 1;
        let width = reader.read_ue() + 1;
        assert_eq!(count, lengths.len());
        let decoded: Vec<usize> = (0..count - 1)
            .map(|_| reader.read_bits(width) as usize + 1)
            .collect();
        assert_eq!(decoded, &lengths[..count - 1]);
    }

    #[test]
    fn test_single_unit_still_writes_width() {
        let mut stream = BitBuffer::new();
        write_entry_points(&mut stream, &[42]).unwrap();
        let mut reader = BitReader::new(stream.as_bitslice());
        assert_eq!(reader.read_ue(), 0);
        assert_eq!(reader.read_ue(), 6);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_no_units_writes_nothing() {
        let mut stream = BitBuffer::new();
        write_entry_points(&mut stream, &[]).unwrap();
        assert!(stream.is_empty());
    }

    #[test]
    fn test_empty_unit_is_rejected() {
        let mut stream = BitBuffer::new();
        let err = write_entry_points(&mut stream, &[12, 0, 3]).unwrap_err();
        assert!(matches!(err, BitstreamError::EmptySubstream { unit: 1 }));
    }
}
