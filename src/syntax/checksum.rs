// src/syntax/checksum.rs

//! Decoded picture hash, checksum method.

use crate::core::picture::{Frame, Plane};
use byteorder::{BigEndian, ByteOrder};

/// Checksum of one plane as defined for `picture_checksum`.
///
/// Each sample is XOR-ed with a mask derived from its coordinates before
/// being summed. Samples wider than eight bits contribute their high byte as
/// a second term.
pub fn plane_checksum(plane: &Plane, bit_depth: u8) -> u32 {
    let mut sum = 0u32;
    for y in 0..plane.height {
        for x in 0..plane.width {
            let mask = ((x & 0xff) ^ (y & 0xff) ^ (x >> 8) ^ (y >> 8)) as u32;
            let sample = plane.get(x, y) as u32;
            sum = sum.wrapping_add((sample & 0xff) ^ mask);
            if bit_depth > 8 {
                sum = sum.wrapping_add((sample >> 8) ^ mask);
            }
        }
    }
    sum
}

/// Big-endian checksum bytes of every plane, in plane order.
pub fn frame_checksums(frame: &Frame) -> Vec<[u8; 4]> {
    frame
        .planes
        .iter()
        .map(|plane| {
            let mut bytes = [0u8; 4];
            BigEndian::write_u32(&mut bytes, plane_checksum(plane, frame.bit_depth));
            bytes
        })
        .collect()
}
