// src/tree/merge.rs

//! Post-order merge of a populated composition tree into picture bytes.

use super::node::{CompositionTree, NodeId, NodeKind};
use crate::bitstream::BitBuffer;
use crate::bitstream::nal::{NalUnitType, write_nal_header};
use crate::container::bpg::write_bpg_picture;
use crate::core::config::{ContainerFormat, EncoderConfig};
use crate::core::picture::{Frame, PictureState};
use crate::syntax::parameter_sets::{write_aud, write_pps, write_sps, write_vps};
use crate::syntax::sei::{write_checksum_sei, write_version_sei};
use crate::syntax::slice_header::write_slice_header;
use crate::utils::error::{BitstreamError, Result};
use log::{debug, trace};
use std::mem;

/// Everything the merge reads besides the tree itself.
#[derive(Debug, Clone, Copy)]
pub struct MergeContext<'a> {
    pub config: &'a EncoderConfig,
    pub picture: &'a PictureState,
    /// Reconstructed picture, hashed into the suffix SEI.
    pub frame: &'a Frame,
}

/// Byte counts of one emitted picture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PictureStats {
    pub frame: u64,
    /// Bytes emitted for the whole access unit.
    pub bytes: usize,
    /// Byte length of every terminal unit, left to right. Without entry
    /// points a unit may end mid-byte; its length is then rounded up.
    pub substreams: Vec<usize>,
}

/// Merges every node bottom-up and returns the picture's bytes.
///
/// All terminal units must already be produced. Children are drained into
/// their parents, so the tree is left empty.
///
/// Units only need to be byte aligned when their slice carries entry points;
/// otherwise they are spliced bit-exactly and only the finished picture has
/// to end on a byte boundary.
pub fn merge_tree(
    tree: &mut CompositionTree,
    ctx: &MergeContext<'_>,
) -> Result<(BitBuffer, PictureStats)> {
    let entry_points = ctx.config.parallel_substreams();
    for id in tree.post_order() {
        match tree.node(id).kind.clone() {
            NodeKind::Unit(info) => {
                let node = tree.node_mut(id);
                let bits = node.stream.tell_bits();
                let len = if entry_points {
                    node.stream
                        .aligned_len()
                        .ok_or(BitstreamError::UnalignedSubstream { unit: info.index, bits })?
                } else {
                    bits.div_ceil(8)
                };
                node.substreams = vec![len];
            }
            NodeKind::Partition(info) => {
                let (stream, substreams) = drain_children(tree, id)?;
                trace!("Partition {} merged: {} units", info.id, substreams.len());
                let node = tree.node_mut(id);
                node.stream = stream;
                node.substreams = substreams;
            }
            NodeKind::Slice(info) => {
                let (mut body, substreams) = drain_children(tree, id)?;
                let mut stream = mem::take(&mut tree.node_mut(id).stream);
                write_slice_header(&mut stream, ctx.config, ctx.picture, &info, &substreams)?;
                stream.write_trailing_bits();
                trace!(
                    "Slice at {} merged: header {} bits, {} entry points",
                    info.start_in_rs,
                    stream.tell_bits(),
                    substreams.len().saturating_sub(1)
                );
                stream.append(&mut body)?;
                let node = tree.node_mut(id);
                node.stream = stream;
                node.substreams = substreams;
            }
            NodeKind::Picture => {}
        }
    }

    let root = tree.root();
    let mut stream = mem::take(&mut tree.node_mut(root).stream);
    let substreams = match ctx.config.container {
        ContainerFormat::Bpg => merge_bpg_picture(tree, root, &mut stream, ctx.config)?,
        ContainerFormat::AnnexB => merge_picture(tree, root, &mut stream, ctx)?,
    };

    let bytes = stream
        .aligned_len()
        .ok_or(BitstreamError::UnalignedPicture { bits: stream.tell_bits() })?;
    debug!(
        "Picture {} (POC {}) written: {} bytes, {} units",
        ctx.picture.frame,
        ctx.picture.poc,
        bytes,
        substreams.len()
    );
    let stats = PictureStats {
        frame: ctx.picture.frame,
        bytes,
        substreams,
    };
    Ok((stream, stats))
}

/// Concatenates all children of `id` in order, emptying them.
fn drain_children(tree: &mut CompositionTree, id: NodeId) -> Result<(BitBuffer, Vec<usize>)> {
    let children = tree.children(id).to_vec();
    let total_bits = children.iter().map(|&c| tree.node(c).stream.tell_bits()).sum();
    let mut stream = BitBuffer::new();
    stream.try_reserve(total_bits)?;
    let mut substreams = Vec::new();
    for child in children {
        let node = tree.node_mut(child);
        stream.append(&mut node.stream)?;
        substreams.append(&mut node.substreams);
    }
    Ok((stream, substreams))
}

/// Wraps `write` in a unit with a long start code and trailing bits.
fn write_parameter_unit(
    stream: &mut BitBuffer,
    nal_type: NalUnitType,
    write: impl FnOnce(&mut BitBuffer) -> Result<()>,
) -> Result<()> {
    write_nal_header(stream, nal_type, 0, true);
    write(stream)?;
    stream.write_trailing_bits();
    Ok(())
}

fn merge_picture(
    tree: &mut CompositionTree,
    root: NodeId,
    stream: &mut BitBuffer,
    ctx: &MergeContext<'_>,
) -> Result<Vec<usize>> {
    let config = ctx.config;
    let picture = ctx.picture;
    let aud = |stream: &mut BitBuffer| {
        write_parameter_unit(stream, NalUnitType::Aud, |s| {
            write_aud(s, picture.slice_type);
            Ok(())
        })
    };

    if picture.is_irap() {
        if picture.frame == 0 {
            if config.aud_enable {
                aud(stream)?;
            }
            write_parameter_unit(stream, NalUnitType::Vps, |s| {
                write_vps(s, config);
                Ok(())
            })?;
            write_parameter_unit(stream, NalUnitType::Sps, |s| write_sps(s, config))?;
            write_parameter_unit(stream, NalUnitType::Pps, |s| {
                write_pps(s, config);
                Ok(())
            })?;

            write_nal_header(stream, NalUnitType::PrefixSei, 0, false);
            write_version_sei(stream, config);
            stream.write_trailing_bits();
        }
    } else if config.aud_enable {
        aud(stream)?;
    }

    let long_start_code = !(picture.is_irap() || config.aud_enable);
    write_nal_header(stream, picture.nal_type, 0, long_start_code);

    let (mut body, substreams) = drain_children(tree, root)?;
    if !body.is_aligned() {
        return Err(BitstreamError::UnalignedPicture { bits: body.tell_bits() });
    }
    stream.append(&mut body)?;

    write_nal_header(stream, NalUnitType::SuffixSei, 0, false);
    write_checksum_sei(stream, ctx.frame);
    stream.write_trailing_bits();
    Ok(substreams)
}

/// Wraps every child of the picture, in order, in one BPG envelope.
fn merge_bpg_picture(
    tree: &mut CompositionTree,
    root: NodeId,
    stream: &mut BitBuffer,
    config: &EncoderConfig,
) -> Result<Vec<usize>> {
    if tree.children(root).is_empty() {
        write_bpg_picture(stream, config, None)?;
        return Ok(Vec::new());
    }
    let (mut payload, substreams) = drain_children(tree, root)?;
    write_bpg_picture(stream, config, Some(&mut payload))?;
    Ok(substreams)
}
