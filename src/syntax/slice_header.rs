// src/syntax/slice_header.rs

//! `slice_segment_header()` of an independent slice segment.

use super::entry_points::write_entry_points;
use crate::bitstream::BitBuffer;
use crate::core::config::EncoderConfig;
use crate::core::picture::{PictureState, SliceType};
use crate::tree::node::SliceInfo;
use crate::utils::error::Result;

/// Writes the short-term reference picture set inline in the header.
///
/// Every negative picture is signalled with `delta_poc_s0_minus1 = 0` and
/// marked as used, which describes a chain of directly preceding pictures.
fn write_short_term_rps(stream: &mut BitBuffer, picture: &PictureState) {
    stream.write_fixed((picture.poc & 0xf) as u32, 4); // pic_order_cnt_lsb
    stream.write_fixed(0, 1); // short_term_ref_pic_set_sps_flag
    stream.write_ue(picture.ref_count); // num_negative_pics
    stream.write_ue(0); // num_positive_pics
    for _ in 0..picture.ref_count {
        stream.write_ue(0); // delta_poc_s0_minus1
        stream.write_fixed(1, 1); // used_by_curr_pic_s0_flag
    }
}

/// Writes a slice header, up to and including the entry point table.
///
/// `substreams` are the byte lengths of the slice's terminal units; they are
/// only consulted when tiles or wavefronts are enabled.
pub fn write_slice_header(
    stream: &mut BitBuffer,
    config: &EncoderConfig,
    picture: &PictureState,
    slice: &SliceInfo,
    substreams: &[usize],
) -> Result<()> {
    stream.write_flag(slice.is_first()); // first_slice_segment_in_pic_flag
    if picture.is_irap() {
        stream.write_fixed(1, 1); // no_output_of_prior_pics_flag
    }
    stream.write_ue(0); // slice_pic_parameter_set_id
    if !slice.is_first() {
        stream.write_ue(slice.start_in_rs); // slice_segment_address
    }
    stream.write_ue(picture.slice_type as u32);

    if !picture.nal_type.is_idr() {
        write_short_term_rps(stream, picture);
    }

    if config.sao_enable {
        stream.write_fixed(1, 1); // slice_sao_luma_flag
        stream.write_fixed(1, 1); // slice_sao_chroma_flag
    }

    if picture.slice_type != SliceType::I {
        stream.write_fixed(1, 1); // num_ref_idx_active_override_flag
        stream.write_ue(picture.ref_count.saturating_sub(1)); // num_ref_idx_l0_active_minus1
        stream.write_ue(5 - config.coding.max_merge_candidates); // five_minus_max_num_merge_cand
    }
    if picture.slice_type == SliceType::B {
        stream.write_fixed(0, 1); // mvd_l1_zero_flag
    }

    let slice_qp = slice.qp.unwrap_or(picture.qp);
    stream.write_se(slice_qp - config.qp as i32); // slice_qp_delta

    if config.parallel_substreams() {
        write_entry_points(stream, substreams)?;
    }
    Ok(())
}
