// src/tree/terminator.rs

//! The entropy coder contract needed to close a substream.

use super::node::UnitInfo;
use crate::bitstream::BitBuffer;
use crate::utils::error::{BitstreamError, Result};

/// The two termination signals of an arithmetic coder.
///
/// `flush` must leave `stream` byte aligned.
pub trait EntropyTerminator {
    /// Codes one bin in terminating mode.
    fn encode_bin_trm(&mut self, stream: &mut BitBuffer, bin: bool);

    /// Writes out pending state and resets the coder for the next substream.
    fn flush(&mut self, stream: &mut BitBuffer);
}

/// Closes a terminal unit after its last LCU.
pub fn terminate_unit<C: EntropyTerminator + ?Sized>(
    coder: &mut C,
    stream: &mut BitBuffer,
    unit: &UnitInfo,
) -> Result<()> {
    let boundary = unit.boundary;
    coder.encode_bin_trm(stream, boundary.ends_slice); // end_of_slice_segment_flag

    if boundary.ends_slice {
        coder.flush(stream);
        stream.write_trailing_bits();
    } else {
        if !boundary.ends_partition && !boundary.ends_row {
            return Err(BitstreamError::InvalidUnitBoundary { unit: unit.index });
        }
        coder.encode_bin_trm(stream, true); // end_of_sub_stream_one_bit
        coder.flush(stream);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fake::RawBins;
    use super::*;
    use crate::tree::node::UnitBoundary;

    fn unit(ends_slice: bool, ends_partition: bool, ends_row: bool) -> UnitInfo {
        UnitInfo {
            index: 3,
            lcu_start_ts: 0,
            lcu_end_ts: 1,
            boundary: UnitBoundary { ends_slice, ends_partition, ends_row },
        }
    }

    #[test]
    fn test_slice_end_gets_trailing_bits() {
        let mut coder = RawBins::default();
        let mut stream = BitBuffer::new();
        stream.write_byte(0xAB);
        terminate_unit(&mut coder, &mut stream, &unit(true, true, true)).unwrap();
        assert_eq!(stream.to_bytes(), vec![0xAB, 0x80, 0x80]);
        assert_eq!(coder.flushes, 1);
    }

    #[test]
    fn test_row_end_gets_substream_bit() {
        let mut coder = RawBins::default();
        let mut stream = BitBuffer::new();
        terminate_unit(&mut coder, &mut stream, &unit(false, false, true)).unwrap();
        assert_eq!(stream.to_bytes(), vec![0b0100_0000]);
        assert!(stream.is_aligned());
    }

    #[test]
    fn test_mid_row_unit_is_rejected() {
        let mut coder = RawBins::default();
        let mut stream = BitBuffer::new();
        let err = terminate_unit(&mut coder, &mut stream, &unit(false, false, false)).unwrap_err();
        assert!(matches!(err, BitstreamError::InvalidUnitBoundary { unit: 3 }));
    }
}
