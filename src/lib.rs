//! # HEVC Bitstream Writer
//!
//! Assembles the coded byte stream of an HEVC encoder from independently
//! produced substreams, and writes the structural syntax around them.
//!
//! This library is organized into several modules:
//! - `utils`: Error handling
//! - `bitstream`: Bit-level writer and unit headers
//! - `core`: Encoder configuration and picture state
//! - `syntax`: Parameter sets, slice headers, scaling lists, SEI and entry points
//! - `tree`: Composition tree, parallel unit production and merge
//! - `container`: The single-picture BPG envelope
//!
//! A picture is written by planning its composition tree, letting a
//! [`UnitEncoder`] fill every terminal unit (in parallel with the `rayon`
//! feature) and merging the tree bottom-up:
//!
//! ```no_run
//! use hevc_bitstream::{BitstreamWriter, EncoderConfig, Frame, PictureState, UnitEncoder};
//! # fn demo<E: UnitEncoder>(encoder: &E) -> hevc_bitstream::Result<()> {
//! let config = EncoderConfig::new(1920, 1080).with_wpp(true);
//! let frame = Frame::for_config(&config);
//! let mut writer = BitstreamWriter::new(config)?;
//! let bytes = writer.write_picture(&PictureState::idr(0, 32), &frame, encoder)?;
//! # let _ = bytes;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used types at the crate root
pub use utils::error::{BitstreamError, Result};

pub mod utils {
    pub mod error;
}

pub mod bitstream {
    pub mod bit_buffer;
    pub mod nal;

    pub use self::bit_buffer::BitBuffer;
}

pub mod core {
    pub mod config;
    pub mod picture;
}

pub mod syntax {
    pub mod checksum;
    pub mod entry_points;
    pub mod parameter_sets;
    pub mod scaling_list;
    pub mod sei;
    pub mod slice_header;
    pub mod tables;
}

pub mod tree {
    pub mod merge;
    pub mod node;
    pub mod plan;
    pub mod terminator;
    pub mod workers;

    pub use self::node::{CompositionTree, NodeId, NodeKind};
}

pub mod container {
    pub mod bpg;
}

pub mod writer;

// Public API exports
pub use crate::bitstream::BitBuffer;
pub use crate::bitstream::nal::NalUnitType;
pub use crate::core::config::{
    ChromaFormat, ContainerFormat, DeblockParams, EncoderConfig, TileConfig, TileSpacing,
    VuiParams,
};
pub use crate::core::picture::{Frame, PictureState, Plane, SliceType};
pub use crate::syntax::scaling_list::{ScalingLists, ScalingMatrix};
pub use crate::tree::merge::PictureStats;
pub use crate::tree::node::UnitInfo;
pub use crate::tree::plan::SliceLayout;
pub use crate::tree::terminator::EntropyTerminator;
pub use crate::tree::workers::UnitEncoder;
pub use crate::writer::BitstreamWriter;
