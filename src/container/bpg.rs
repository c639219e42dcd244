// src/container/bpg.rs

//! Single-picture BPG envelope.
//!
//! The envelope replaces the parameter set units with a compact header: a
//! file magic, image geometry as 7-bit varints, a subset of the SPS fields
//! and a PPS unit without start code. The coded picture follows as one
//! start-code delimited IDR unit.

use crate::bitstream::BitBuffer;
use crate::bitstream::nal::{NalUnitType, write_nal_header, write_nal_unit_header};
use crate::core::config::EncoderConfig;
use crate::syntax::parameter_sets::{write_coding_tree_sizes, write_pps};
use crate::utils::error::{BitstreamError, Result};
use log::info;

pub const BPG_MAGIC: u32 = 0x4250_47fb;

/// Length of the SPS subset carried in the header, as signalled.
const HEVC_HEADER_LENGTH: u32 = 3;

/// Writes `value` as big-endian 7-bit groups. Every byte but the last has its
/// top bit set.
pub fn write_ue7(stream: &mut BitBuffer, value: u32) {
    let groups = (32 - value.leading_zeros()).div_ceil(7).max(1);
    for i in (0..groups).rev() {
        let group = (value >> (7 * i)) & 0x7f;
        let continuation = if i > 0 { 0x80 } else { 0 };
        stream.write_byte(group as u8 | continuation);
    }
}

/// Writes a complete BPG file for one picture.
///
/// `payload` is the merged content of the picture node; it is consumed.
pub fn write_bpg_picture(
    stream: &mut BitBuffer,
    config: &EncoderConfig,
    payload: Option<&mut BitBuffer>,
) -> Result<()> {
    let payload = payload.ok_or(BitstreamError::MissingPayload)?;
    let payload_len = payload.aligned_len().ok_or(BitstreamError::UnalignedPicture {
        bits: payload.tell_bits(),
    })?;

    stream.write_fixed(BPG_MAGIC, 32);

    stream.write_fixed(config.chroma_format as u32, 3); // pixel_format
    stream.write_fixed(0, 1); // alpha1_flag
    stream.write_fixed(config.bit_depth as u32 - 8, 4);

    stream.write_fixed(0, 4); // color_space, YCbCr
    stream.write_fixed(0, 1); // extension_present_flag
    stream.write_fixed(0, 3); // alpha2_flag, limited_range_flag, animation_flag

    write_ue7(stream, config.real_width);
    write_ue7(stream, config.real_height);
    write_ue7(stream, payload_len as u32 + 2); // picture_data_length
    write_ue7(stream, HEVC_HEADER_LENGTH);

    write_coding_tree_sizes(stream, config);
    stream.write_ue(config.coding.tr_depth_intra);
    stream.write_flag(config.sao_enable);
    stream.write_fixed(0, 1); // pcm_enabled_flag
    stream.write_fixed(0, 1); // strong_intra_smoothing_enabled_flag
    stream.write_fixed(0, 1); // sps_extension_present_flag
    stream.align_zero();

    write_nal_unit_header(stream, NalUnitType::Pps, 0);
    write_pps(stream, config);
    stream.write_trailing_bits();

    write_nal_header(stream, NalUnitType::IdrWRadl, 0, false);
    stream.append(payload)?;

    info!(
        "BPG picture {}x{}: {} payload bytes",
        config.real_width, config.real_height, payload_len
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::bit_buffer::test_reader::BitReader;

    fn ue7(value: u32) -> Vec<u8> {
        let mut stream = BitBuffer::new();
        write_ue7(&mut stream, value);
        stream.to_bytes()
    }

    #[test]
    fn test_ue7() {
        assert_eq!(ue7(0), vec![0x00]);
        assert_eq!(ue7(127), vec![0x7f]);
        assert_eq!(ue7(128), vec![0x81, 0x00]);
        assert_eq!(ue7(300), vec![0x82, 0x2C]);
        assert_eq!(ue7(u32::MAX), vec![0x8f, 0xff, 0xff, 0xff, 0x7f]);
    }

    #[test]
    fn test_missing_payload() {
        let config = EncoderConfig::new(64, 64);
        let mut stream = BitBuffer::new();
        let err = write_bpg_picture(&mut stream, &config, None).unwrap_err();
        assert!(matches!(err, BitstreamError::MissingPayload));
    }

    #[test]
    fn test_header_layout() {
        let config = EncoderConfig::new(300, 64).with_sao(false);
        let mut payload = BitBuffer::new();
        payload.write_bytes(&[0xde, 0xad, 0xbe]);
        let mut stream = BitBuffer::new();
        write_bpg_picture(&mut stream, &config, Some(&mut payload)).unwrap();
        assert!(payload.is_empty());

        let bytes = stream.to_bytes();
        assert_eq!(&bytes[..4], &[0x42, 0x50, 0x47, 0xfb]);
        assert_eq!(bytes[4], 0b0010_0000); // 4:2:0, no alpha, 8 bits
        assert_eq!(bytes[5], 0);
        assert_eq!(&bytes[6..8], &[0x82, 0x2C]);
        assert_eq!(bytes[8], 64);
        assert_eq!(bytes[9], 5);
        assert_eq!(bytes[10], 3);

        let mut reader = BitReader::new(&stream.as_bitslice()[88..]);
        assert_eq!(reader.read_ue(), 0);
        assert_eq!(reader.read_ue(), 3);
        assert_eq!(reader.read_ue(), 0);
        assert_eq!(reader.read_ue(), 3);
        assert_eq!(reader.read_ue(), 0);
        assert!(!reader.read_flag()); // sao follows the configuration
        assert_eq!(reader.read_bits(3), 0);
        assert_eq!(reader.position(), 17);
        assert_eq!(reader.read_bits(7), 0); // zero alignment

        assert_eq!(&bytes[14..16], &[0x44, 0x01]);
        assert_eq!(&bytes[bytes.len() - 8..], &[0, 0, 1, 0x26, 0x01, 0xde, 0xad, 0xbe]);
    }

    #[test]
    fn test_unaligned_payload_is_rejected() {
        let config = EncoderConfig::new(64, 64);
        let mut payload = BitBuffer::new();
        payload.write_fixed(1, 3);
        let mut stream = BitBuffer::new();
        let err = write_bpg_picture(&mut stream, &config, Some(&mut payload)).unwrap_err();
        assert!(matches!(err, BitstreamError::UnalignedPicture { bits: 3 }));
    }
}
