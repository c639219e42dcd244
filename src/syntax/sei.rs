// src/syntax/sei.rs

//! Supplemental enhancement information messages written by the encoder.

use super::checksum::frame_checksums;
use crate::bitstream::BitBuffer;
use crate::core::config::EncoderConfig;
use crate::core::picture::Frame;

const PAYLOAD_USER_DATA_UNREGISTERED: u32 = 5;
const PAYLOAD_DECODED_PICTURE_HASH: u32 = 132;
const HASH_TYPE_CHECKSUM: u32 = 2;

/// `uuid_iso_iec_11578` identifying the version message.
pub const VERSION_UUID: [u8; 16] = [
    0x8b, 0x1d, 0x52, 0xe0, 0x4c, 0x7a, 0x4f, 0x03, 0x9d, 0x66, 0x21, 0xc4, 0xa8, 0x5e, 0x07, 0xb9,
];

/// Human readable encoder identification and options.
pub fn version_string(config: &EncoderConfig) -> String {
    format!(
        "{} v. {} - options: {}x{} deblock={}:{}:{} sao={} intra_period={} qp={} ref={}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.real_width,
        config.real_height,
        config.deblock.enable as u8,
        config.deblock.beta_offset_div2,
        config.deblock.tc_offset_div2,
        config.sao_enable as u8,
        config.intra_period,
        config.qp,
        config.ref_frames
    )
}

/// Writes `payloadSize` as a run of `0xff` bytes and a final remainder byte.
fn write_payload_size(stream: &mut BitBuffer, size: usize) {
    let mut remaining = size;
    while remaining >= 255 {
        stream.write_byte(0xff);
        remaining -= 255;
    }
    stream.write_byte(remaining as u8);
}

/// Writes the user-data-unregistered version message without trailing bits.
pub fn write_version_sei(stream: &mut BitBuffer, config: &EncoderConfig) {
    let text = version_string(config);
    let length = VERSION_UUID.len() + text.len() + 1;

    stream.write_fixed(PAYLOAD_USER_DATA_UNREGISTERED, 8);
    write_payload_size(stream, length);
    stream.write_bytes(&VERSION_UUID);
    stream.write_bytes(text.as_bytes());
    stream.write_byte(0);
}

/// Writes the decoded picture hash message without trailing bits.
pub fn write_checksum_sei(stream: &mut BitBuffer, frame: &Frame) {
    let checksums = frame_checksums(frame);
    stream.write_fixed(PAYLOAD_DECODED_PICTURE_HASH, 8);
    stream.write_fixed(1 + 4 * checksums.len() as u32, 8);
    stream.write_fixed(HASH_TYPE_CHECKSUM, 8);
    for bytes in &checksums {
        stream.write_bytes(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ChromaFormat;

    #[test]
    fn test_version_string() {
        let config = EncoderConfig::new(1918, 1080).with_intra_period(16).with_qp(27);
        let text = version_string(&config);
        assert!(text.starts_with(env!("CARGO_PKG_NAME")));
        assert!(text.ends_with(
            " - options: 1918x1080 deblock=1:0:0 sao=1 intra_period=16 qp=27 ref=3"
        ));
    }

    #[test]
    fn test_version_sei_layout() {
        let config = EncoderConfig::new(64, 64);
        let mut stream = BitBuffer::new();
        write_version_sei(&mut stream, &config);
        let bytes = stream.to_bytes();

        let length = 16 + version_string(&config).len() + 1;
        assert!(length < 255);
        assert_eq!(bytes[0], 5);
        assert_eq!(bytes[1] as usize, length);
        assert_eq!(&bytes[2..18], &VERSION_UUID);
        assert_eq!(bytes.len(), 2 + length);
        assert_eq!(*bytes.last().unwrap(), 0);
    }

    #[test]
    fn test_payload_size_bytes() {
        for (size, expected) in [
            (0usize, vec![0u8]),
            (254, vec![254]),
            (255, vec![255, 0]),
            (600, vec![255, 255, 90]),
        ] {
            let mut stream = BitBuffer::new();
            write_payload_size(&mut stream, size);
            assert_eq!(stream.to_bytes(), expected, "size {}", size);
        }
    }

    #[test]
    fn test_checksum_sei_sizes() {
        let frame = Frame::new(8, 8, ChromaFormat::Yuv420, 8);
        let mut stream = BitBuffer::new();
        write_checksum_sei(&mut stream, &frame);
        let bytes = stream.to_bytes();
        assert_eq!(&bytes[..3], &[132, 13, 2]);
        assert_eq!(bytes.len(), 3 + 12);

        let frame = Frame::new(8, 8, ChromaFormat::Monochrome, 8);
        let mut stream = BitBuffer::new();
        write_checksum_sei(&mut stream, &frame);
        assert_eq!(&stream.to_bytes()[..3], &[132, 5, 2]);
    }
}
