// src/syntax/parameter_sets.rs

//! Video, sequence and picture parameter sets, plus the access unit delimiter.
//!
//! The writers emit RBSP content only. Wrapping each structure in a unit
//! header and terminating it with trailing bits is up to the caller, so the
//! same PPS writer serves both the start-code stream and the BPG envelope.

use super::scaling_list::write_scaling_list_data;
use super::tables::{EXTENDED_SAR, SAR_TABLE};
use crate::bitstream::BitBuffer;
use crate::core::config::{ChromaFormat, EncoderConfig, TileSpacing, VuiParams};
use crate::core::picture::SliceType;
use crate::utils::error::{BitstreamError, Result};

/// Main profile.
const GENERAL_PROFILE_IDC: u32 = 1;
/// Compatibility flags 1 (Main) and 2 (Main 10).
const GENERAL_PROFILE_COMPATIBILITY: u32 = 3 << 29;
const MAX_SUB_LAYERS_MINUS1: u32 = 1;

/// Writes `profile_tier_level()`.
pub fn write_profile_tier_level(stream: &mut BitBuffer, config: &EncoderConfig) {
    stream.write_fixed(0, 2); // general_profile_space
    stream.write_fixed(0, 1); // general_tier_flag
    stream.write_fixed(GENERAL_PROFILE_IDC, 5);
    stream.write_fixed(GENERAL_PROFILE_COMPATIBILITY, 32);

    stream.write_fixed(1, 1); // general_progressive_source_flag
    stream.write_fixed(0, 1); // general_interlaced_source_flag
    stream.write_fixed(0, 1); // general_non_packed_constraint_flag
    stream.write_fixed(0, 1); // general_frame_only_constraint_flag

    stream.write_fixed(0, 32); // general_reserved_zero_44bits
    stream.write_fixed(0, 12);

    stream.write_fixed(config.level as u32 * 3, 8); // general_level_idc

    stream.write_fixed(0, 1); // sub_layer_profile_present_flag
    stream.write_fixed(0, 1); // sub_layer_level_present_flag
    for _ in MAX_SUB_LAYERS_MINUS1..8 {
        stream.write_fixed(0, 2); // reserved_zero_2bits
    }
}

/// Writes `video_parameter_set_rbsp()` without trailing bits.
pub fn write_vps(stream: &mut BitBuffer, config: &EncoderConfig) {
    stream.write_fixed(0, 4); // vps_video_parameter_set_id
    stream.write_fixed(3, 2); // vps_reserved_three_2bits
    stream.write_fixed(0, 6); // vps_reserved_zero_6bits
    stream.write_fixed(MAX_SUB_LAYERS_MINUS1, 3);
    stream.write_fixed(0, 1); // vps_temporal_id_nesting_flag
    stream.write_fixed(0xffff, 16);

    write_profile_tier_level(stream, config);

    stream.write_fixed(0, 1); // vps_sub_layer_ordering_info_present_flag
    stream.write_ue(1); // vps_max_dec_pic_buffering
    stream.write_ue(0); // vps_num_reorder_pics
    stream.write_ue(0); // vps_max_latency_increase

    stream.write_fixed(0, 6); // vps_max_nuh_reserved_zero_layer_id
    stream.write_ue(0); // vps_max_op_sets_minus1
    stream.write_fixed(0, 1); // vps_timing_info_present_flag
    stream.write_fixed(0, 1); // vps_extension_flag
}

/// Writes `vui_parameters()`.
pub fn write_vui(stream: &mut BitBuffer, vui: &VuiParams) {
    if vui.sar_width > 0 && vui.sar_height > 0 {
        let idc = SAR_TABLE
            .iter()
            .find(|&&(w, h, _)| w == vui.sar_width && h == vui.sar_height)
            .map_or(EXTENDED_SAR, |&(_, _, idc)| idc);
        stream.write_fixed(1, 1); // aspect_ratio_info_present_flag
        stream.write_fixed(idc as u32, 8);
        if idc == EXTENDED_SAR {
            stream.write_fixed(vui.sar_width as u32, 16);
            stream.write_fixed(vui.sar_height as u32, 16);
        }
    } else {
        stream.write_fixed(0, 1);
    }

    if vui.overscan > 0 {
        stream.write_fixed(1, 1); // overscan_info_present_flag
        stream.write_fixed(vui.overscan as u32 - 1, 1); // overscan_appropriate_flag
    } else {
        stream.write_fixed(0, 1);
    }

    let colour_description = vui.colour_primaries != 2
        || vui.transfer_characteristics != 2
        || vui.matrix_coeffs != 2;
    if vui.video_format != 5 || vui.full_range || colour_description {
        stream.write_fixed(1, 1); // video_signal_type_present_flag
        stream.write_fixed(vui.video_format as u32, 3);
        stream.write_flag(vui.full_range);
        if colour_description {
            stream.write_fixed(1, 1); // colour_description_present_flag
            stream.write_fixed(vui.colour_primaries as u32, 8);
            stream.write_fixed(vui.transfer_characteristics as u32, 8);
            stream.write_fixed(vui.matrix_coeffs as u32, 8);
        } else {
            stream.write_fixed(0, 1);
        }
    } else {
        stream.write_fixed(0, 1);
    }

    if vui.chroma_loc > 0 {
        stream.write_fixed(1, 1); // chroma_loc_info_present_flag
        stream.write_ue(vui.chroma_loc); // top field
        stream.write_ue(vui.chroma_loc); // bottom field
    } else {
        stream.write_fixed(0, 1);
    }

    stream.write_fixed(0, 1); // neutral_chroma_indication_flag
    stream.write_fixed(0, 1); // field_seq_flag
    stream.write_fixed(0, 1); // frame_field_info_present_flag
    stream.write_fixed(0, 1); // default_display_window_flag
    stream.write_fixed(0, 1); // vui_timing_info_present_flag
    stream.write_fixed(0, 1); // bitstream_restriction_flag
}

/// Writes the conformance window flag and, when the coded size is padded,
/// the right/bottom offsets in chroma sample units (half the padding for
/// 4:2:0, unscaled for 4:4:4 and monochrome).
fn write_conformance_window(stream: &mut BitBuffer, config: &EncoderConfig) -> Result<()> {
    let width_pad = config.width - config.real_width;
    let height_pad = config.height - config.real_height;
    if width_pad == 0 && height_pad == 0 {
        stream.write_fixed(0, 1);
        return Ok(());
    }
    let (shift_x, shift_y) = config.chroma_format.subsampling();
    // Padding that is not a whole number of chroma samples cannot be cropped.
    if width_pad % (1 << shift_x) != 0 || height_pad % (1 << shift_y) != 0 {
        return Err(BitstreamError::OddConformancePadding { width_pad, height_pad });
    }
    stream.write_fixed(1, 1); // conformance_window_flag
    stream.write_ue(0); // conf_win_left_offset
    stream.write_ue(width_pad >> shift_x);
    stream.write_ue(0); // conf_win_top_offset
    stream.write_ue(height_pad >> shift_y);
    Ok(())
}

/// Writes `seq_parameter_set_rbsp()` without trailing bits.
pub fn write_sps(stream: &mut BitBuffer, config: &EncoderConfig) -> Result<()> {
    let coding = &config.coding;

    stream.write_fixed(0, 4); // sps_video_parameter_set_id
    stream.write_fixed(MAX_SUB_LAYERS_MINUS1, 3);
    stream.write_fixed(0, 1); // sps_temporal_id_nesting_flag

    write_profile_tier_level(stream, config);

    stream.write_ue(0); // sps_seq_parameter_set_id
    stream.write_ue(config.chroma_format as u32);
    if config.chroma_format == ChromaFormat::Yuv444 {
        stream.write_fixed(0, 1); // separate_colour_plane_flag
    }

    stream.write_ue(config.width); // pic_width_in_luma_samples
    stream.write_ue(config.height);
    write_conformance_window(stream, config)?;

    stream.write_ue(config.bit_depth as u32 - 8); // bit_depth_luma_minus8
    stream.write_ue(config.bit_depth as u32 - 8); // bit_depth_chroma_minus8
    stream.write_ue(0); // log2_max_pic_order_cnt_lsb_minus4
    stream.write_fixed(0, 1); // sps_sub_layer_ordering_info_present_flag

    stream.write_ue(config.ref_frames); // sps_max_dec_pic_buffering
    stream.write_ue(0); // sps_num_reorder_pics
    stream.write_ue(0); // sps_max_latency_increase

    write_coding_tree_sizes(stream, config);
    stream.write_ue(coding.tr_depth_inter);
    stream.write_ue(coding.tr_depth_intra);

    stream.write_flag(config.scaling_lists.enable);
    if config.scaling_lists.enable {
        stream.write_fixed(1, 1); // sps_scaling_list_data_present_flag
        write_scaling_list_data(stream, &config.scaling_lists);
    }

    stream.write_fixed(0, 1); // amp_enabled_flag
    stream.write_flag(config.sao_enable);
    stream.write_flag(config.pcm_enable);
    if config.pcm_enable {
        stream.write_fixed(7, 4); // pcm_sample_bit_depth_luma_minus1
        stream.write_fixed(7, 4); // pcm_sample_bit_depth_chroma_minus1
        stream.write_ue(0); // log2_min_pcm_coding_block_size_minus3
        stream.write_ue(2); // log2_diff_max_min_pcm_coding_block_size
        stream.write_fixed(1, 1); // pcm_loop_filter_disable_flag
    }

    stream.write_ue(0); // num_short_term_ref_pic_sets
    stream.write_fixed(0, 1); // long_term_ref_pics_present_flag
    stream.write_flag(config.temporal_mvp);
    stream.write_fixed(0, 1); // sps_strong_intra_smoothing_enable_flag

    stream.write_fixed(1, 1); // vui_parameters_present_flag
    write_vui(stream, &config.vui);

    stream.write_fixed(0, 1); // sps_extension_flag
    Ok(())
}

/// Coding block and transform block size fields shared with the BPG header.
pub(crate) fn write_coding_tree_sizes(stream: &mut BitBuffer, config: &EncoderConfig) {
    stream.write_ue(config.coding.min_cu_log2 - 3); // log2_min_coding_block_size_minus3
    stream.write_ue(config.coding.max_depth); // log2_diff_max_min_coding_block_size
    stream.write_ue(0); // log2_min_transform_block_size_minus2, 4x4
    stream.write_ue(3); // log2_diff_max_min_transform_block_size, up to 32x32
}

/// Writes `pic_parameter_set_rbsp()` without trailing bits.
pub fn write_pps(stream: &mut BitBuffer, config: &EncoderConfig) {
    stream.write_ue(0); // pic_parameter_set_id
    stream.write_ue(0); // seq_parameter_set_id
    stream.write_fixed(0, 1); // dependent_slice_segments_enabled_flag
    stream.write_fixed(0, 1); // output_flag_present_flag
    stream.write_fixed(0, 3); // num_extra_slice_header_bits
    stream.write_flag(config.sign_hiding);
    stream.write_fixed(0, 1); // cabac_init_present_flag

    stream.write_ue(0); // num_ref_idx_l0_default_active_minus1
    stream.write_ue(0); // num_ref_idx_l1_default_active_minus1
    stream.write_se(config.qp as i32 - 26); // init_qp_minus26
    stream.write_fixed(0, 1); // constrained_intra_pred_flag
    stream.write_flag(config.trskip_enable);
    stream.write_fixed(0, 1); // cu_qp_delta_enabled_flag

    stream.write_se(0); // pps_cb_qp_offset
    stream.write_se(0); // pps_cr_qp_offset
    stream.write_fixed(0, 1); // pps_slice_chroma_qp_offsets_present_flag
    stream.write_fixed(0, 1); // weighted_pred_flag
    stream.write_fixed(0, 1); // weighted_bipred_flag

    stream.write_fixed(0, 1); // transquant_bypass_enabled_flag
    stream.write_flag(config.tiles.is_some());
    stream.write_flag(config.wpp); // entropy_coding_sync_enabled_flag

    if let Some(tiles) = &config.tiles {
        stream.write_ue(tiles.columns - 1);
        stream.write_ue(tiles.rows - 1);
        stream.write_flag(tiles.is_uniform());
        if let TileSpacing::Explicit { column_widths, row_heights } = &tiles.spacing {
            for &width in column_widths {
                stream.write_ue(width - 1); // column_width_minus1
            }
            for &height in row_heights {
                stream.write_ue(height - 1); // row_height_minus1
            }
        }
        stream.write_fixed(0, 1); // loop_filter_across_tiles_enabled_flag
    }

    stream.write_fixed(0, 1); // pps_loop_filter_across_slices_enabled_flag
    stream.write_fixed(1, 1); // deblocking_filter_control_present_flag
    stream.write_fixed(0, 1); // deblocking_filter_override_enabled_flag
    stream.write_flag(!config.deblock.enable); // pps_deblocking_filter_disabled_flag
    if config.deblock.enable {
        stream.write_se(config.deblock.beta_offset_div2 as i32);
        stream.write_se(config.deblock.tc_offset_div2 as i32);
    }

    stream.write_fixed(0, 1); // pps_scaling_list_data_present_flag
    stream.write_fixed(0, 1); // lists_modification_present_flag
    stream.write_ue(0); // log2_parallel_merge_level_minus2
    stream.write_fixed(0, 1); // slice_segment_header_extension_present_flag
    stream.write_fixed(0, 1); // pps_extension_flag
}

/// Writes `access_unit_delimiter_rbsp()` without trailing bits.
pub fn write_aud(stream: &mut BitBuffer, slice_type: SliceType) {
    stream.write_fixed(slice_type.aud_pic_type(), 3);
}
