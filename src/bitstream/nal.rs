// src/bitstream/nal.rs

//! Unit wrappers: start codes and the two-byte unit header.

use super::bit_buffer::BitBuffer;

/// `nal_unit_type` values used by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum NalUnitType {
    TrailN = 0,
    TrailR = 1,
    TsaN = 2,
    TsaR = 3,
    StsaN = 4,
    StsaR = 5,
    RadlN = 6,
    RadlR = 7,
    RaslN = 8,
    RaslR = 9,
    BlaWLp = 16,
    BlaWRadl = 17,
    BlaNLp = 18,
    IdrWRadl = 19,
    IdrNLp = 20,
    CraNut = 21,
    RsvIrapVcl22 = 22,
    RsvIrapVcl23 = 23,
    Vps = 32,
    Sps = 33,
    Pps = 34,
    Aud = 35,
    Eos = 36,
    Eob = 37,
    Fd = 38,
    PrefixSei = 39,
    SuffixSei = 40,
}

impl NalUnitType {
    /// Intra random access point picture types, BLA_W_LP through RSV_IRAP_VCL23.
    #[inline]
    pub fn is_irap(self) -> bool {
        (NalUnitType::BlaWLp..=NalUnitType::RsvIrapVcl23).contains(&self)
    }

    #[inline]
    pub fn is_idr(self) -> bool {
        matches!(self, NalUnitType::IdrWRadl | NalUnitType::IdrNLp)
    }
}

const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

/// Writes a start code followed by the unit header.
///
/// A long start code carries the extra leading `zero_byte` required before
/// parameter sets and the first unit of an access unit.
pub fn write_nal_header(
    stream: &mut BitBuffer,
    nal_type: NalUnitType,
    temporal_id: u8,
    long_start_code: bool,
) {
    debug_assert!(stream.is_aligned(), "unit must start on a byte boundary");
    if long_start_code {
        stream.write_byte(0x00);
    }
    stream.write_bytes(&START_CODE_PREFIX);
    write_nal_unit_header(stream, nal_type, temporal_id);
}

/// Writes only the two header bytes: forbidden_zero_bit, nal_unit_type(6),
/// nuh_layer_id(6) = 0 and nuh_temporal_id_plus1(3).
pub fn write_nal_unit_header(stream: &mut BitBuffer, nal_type: NalUnitType, temporal_id: u8) {
    stream.write_fixed(0, 1);
    stream.write_fixed(nal_type as u32, 6);
    stream.write_fixed(0, 6);
    stream.write_fixed((temporal_id as u32 + 1) & 7, 3);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_start_codes() {
        let mut stream = BitBuffer::new();
        write_nal_header(&mut stream, NalUnitType::Vps, 0, true);
        assert_eq!(stream.to_bytes(), vec![0x00, 0x00, 0x00, 0x01, 0x40, 0x01]);

        let mut stream = BitBuffer::new();
        write_nal_header(&mut stream, NalUnitType::SuffixSei, 0, false);
        assert_eq!(stream.to_bytes(), vec![0x00, 0x00, 0x01, 0x50, 0x01]);
    }

    #[test]
    fn test_header_only() {
        let mut stream = BitBuffer::new();
        write_nal_unit_header(&mut stream, NalUnitType::Pps, 0);
        assert_eq!(stream.to_bytes(), vec![0x44, 0x01]);

        let mut stream = BitBuffer::new();
        write_nal_unit_header(&mut stream, NalUnitType::IdrWRadl, 2);
        assert_eq!(stream.to_bytes(), vec![0x26, 0x03]);
    }

    #[test]
    fn test_irap_classification() {
        assert!(NalUnitType::IdrWRadl.is_irap());
        assert!(NalUnitType::CraNut.is_irap());
        assert!(NalUnitType::BlaWLp.is_irap());
        assert!(!NalUnitType::TrailR.is_irap());
        assert!(!NalUnitType::Vps.is_irap());
        assert!(NalUnitType::IdrNLp.is_idr());
        assert!(!NalUnitType::CraNut.is_idr());
    }
}
