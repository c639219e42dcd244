//! Per-picture state and the reconstructed picture handed to the writer.

use crate::bitstream::nal::NalUnitType;
use crate::core::config::{ChromaFormat, EncoderConfig};

/// Slice type, stored as its `slice_type` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SliceType {
    B = 0,
    P = 1,
    #[default]
    I = 2,
}

impl SliceType {
    /// `pic_type` of an access unit delimiter whose slices are all of this type.
    #[inline]
    pub fn aud_pic_type(self) -> u32 {
        match self {
            SliceType::I => 0,
            SliceType::P => 1,
            SliceType::B => 2,
        }
    }
}

/// What the writer needs to know about the picture being emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureState {
    /// Index of the picture in coding order; 0 is the first of the sequence.
    pub frame: u64,
    pub poc: i32,
    pub slice_type: SliceType,
    pub nal_type: NalUnitType,
    /// Number of reference pictures in use.
    pub ref_count: u32,
    /// QP the picture was coded with.
    pub qp: i32,
}

impl PictureState {
    /// An IDR picture starting a sequence.
    pub fn idr(frame: u64, qp: i32) -> Self {
        Self {
            frame,
            poc: 0,
            slice_type: SliceType::I,
            nal_type: NalUnitType::IdrWRadl,
            ref_count: 0,
            qp,
        }
    }

    /// A trailing inter picture predicted from `ref_count` earlier pictures.
    pub fn inter(frame: u64, poc: i32, slice_type: SliceType, ref_count: u32, qp: i32) -> Self {
        Self {
            frame,
            poc,
            slice_type,
            nal_type: NalUnitType::TrailR,
            ref_count,
            qp,
        }
    }

    #[inline]
    pub fn is_irap(&self) -> bool {
        self.nal_type.is_irap()
    }
}

/// One plane of reconstructed samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub samples: Vec<u16>,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            stride: width,
            samples: vec![0; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.samples[y * self.stride + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u16) {
        self.samples[y * self.stride + x] = value;
    }

    pub fn fill(&mut self, value: u16) {
        self.samples.fill(value);
    }
}

/// A reconstructed picture at coded (padded) size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bit_depth: u8,
    pub planes: Vec<Plane>,
}

impl Frame {
    /// Allocates a zeroed frame shaped after the configuration.
    pub fn for_config(config: &EncoderConfig) -> Self {
        Self::new(
            config.width as usize,
            config.height as usize,
            config.chroma_format,
            config.bit_depth,
        )
    }

    pub fn new(width: usize, height: usize, format: ChromaFormat, bit_depth: u8) -> Self {
        let (sx, sy) = format.subsampling();
        let planes = (0..format.plane_count())
            .map(|i| {
                if i == 0 {
                    Plane::new(width, height)
                } else {
                    Plane::new(width >> sx, height >> sy)
                }
            })
            .collect();
        Self { bit_depth, planes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_plane_shapes() {
        let frame = Frame::new(64, 32, ChromaFormat::Yuv420, 8);
        assert_eq!(frame.planes.len(), 3);
        assert_eq!((frame.planes[1].width, frame.planes[1].height), (32, 16));

        let frame = Frame::new(64, 32, ChromaFormat::Monochrome, 8);
        assert_eq!(frame.planes.len(), 1);

        let frame = Frame::new(64, 32, ChromaFormat::Yuv422, 10);
        assert_eq!((frame.planes[2].width, frame.planes[2].height), (32, 32));
    }

    #[test]
    fn test_picture_state_constructors() {
        let idr = PictureState::idr(0, 32);
        assert!(idr.is_irap());
        assert_eq!(idr.slice_type.aud_pic_type(), 0);

        let p = PictureState::inter(1, 1, SliceType::P, 1, 33);
        assert!(!p.is_irap());
        assert_eq!(p.slice_type.aud_pic_type(), 1);
        assert_eq!(SliceType::B.aud_pic_type(), 2);
    }
}
