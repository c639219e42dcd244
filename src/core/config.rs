//! Encoder configuration consumed by the bitstream writer.
//!
//! Everything here is decided before the first picture is coded. The writer
//! only reads it: parameter sets, slice headers and the composition tree
//! layout are all derived from one `EncoderConfig`.

use crate::syntax::scaling_list::ScalingLists;
use crate::utils::error::{BitstreamError, Result};

/// Chroma sampling, stored as its `chroma_format_idc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ChromaFormat {
    Monochrome = 0,
    #[default]
    Yuv420 = 1,
    Yuv422 = 2,
    Yuv444 = 3,
}

impl ChromaFormat {
    /// Number of sample planes in a picture of this format.
    #[inline]
    pub fn plane_count(self) -> usize {
        if self == ChromaFormat::Monochrome { 1 } else { 3 }
    }

    /// Horizontal and vertical chroma subsampling shifts.
    #[inline]
    pub fn subsampling(self) -> (u32, u32) {
        match self {
            ChromaFormat::Monochrome | ChromaFormat::Yuv444 => (0, 0),
            ChromaFormat::Yuv420 => (1, 1),
            ChromaFormat::Yuv422 => (1, 0),
        }
    }
}

/// How the coded pictures are wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerFormat {
    /// Start-code delimited units with parameter sets and SEI.
    #[default]
    AnnexB,
    /// Single-picture BPG envelope.
    Bpg,
}

/// Deblocking filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeblockParams {
    pub enable: bool,
    pub beta_offset_div2: i8,
    pub tc_offset_div2: i8,
}

impl Default for DeblockParams {
    fn default() -> Self {
        Self {
            enable: true,
            beta_offset_div2: 0,
            tc_offset_div2: 0,
        }
    }
}

/// Column and row sizes of a tile grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileSpacing {
    /// Boundaries derived from the picture size.
    Uniform,
    /// Explicit sizes in LCUs for every column and row but the last.
    Explicit {
        column_widths: Vec<u32>,
        row_heights: Vec<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileConfig {
    pub columns: u32,
    pub rows: u32,
    pub spacing: TileSpacing,
}

impl TileConfig {
    /// A uniformly spaced `columns` x `rows` grid.
    pub fn uniform(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            spacing: TileSpacing::Uniform,
        }
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self.spacing, TileSpacing::Uniform)
    }
}

/// Video usability information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VuiParams {
    /// Sample aspect ratio; 0 in either field means unspecified.
    pub sar_width: u16,
    pub sar_height: u16,
    /// 0 = undefined, 1 = show (not appropriate), 2 = crop (appropriate).
    pub overscan: u8,
    pub video_format: u8,
    pub full_range: bool,
    pub colour_primaries: u8,
    pub transfer_characteristics: u8,
    pub matrix_coeffs: u8,
    pub chroma_loc: u32,
}

impl Default for VuiParams {
    fn default() -> Self {
        Self {
            sar_width: 0,
            sar_height: 0,
            overscan: 0,
            video_format: 5,
            full_range: false,
            colour_primaries: 2,
            transfer_characteristics: 2,
            matrix_coeffs: 2,
            chroma_loc: 0,
        }
    }
}

/// Coding tree and transform tree limits announced in the SPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingTreeParams {
    pub min_cu_log2: u32,
    pub max_depth: u32,
    pub tr_depth_intra: u32,
    pub tr_depth_inter: u32,
    pub max_merge_candidates: u32,
}

impl Default for CodingTreeParams {
    fn default() -> Self {
        Self {
            min_cu_log2: 3,
            max_depth: 3,
            tr_depth_intra: 0,
            tr_depth_inter: 2,
            max_merge_candidates: 5,
        }
    }
}

impl CodingTreeParams {
    /// Largest coding unit edge in luma samples.
    #[inline]
    pub fn lcu_size(&self) -> u32 {
        1 << (self.min_cu_log2 + self.max_depth)
    }
}

/// Full encoder configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    /// Coded picture size, padded to a multiple of the minimum CU size.
    pub width: u32,
    pub height: u32,
    /// Display size before padding.
    pub real_width: u32,
    pub real_height: u32,
    pub chroma_format: ChromaFormat,
    pub bit_depth: u8,
    /// Base QP; `pic_init_qp` and every slice QP delta are relative to it.
    pub qp: u8,
    pub ref_frames: u32,
    pub intra_period: i32,
    pub deblock: DeblockParams,
    pub sao_enable: bool,
    pub trskip_enable: bool,
    pub pcm_enable: bool,
    pub sign_hiding: bool,
    pub temporal_mvp: bool,
    pub aud_enable: bool,
    pub tiles: Option<TileConfig>,
    /// Wavefront parallel processing (`entropy_coding_sync_enabled_flag`).
    pub wpp: bool,
    pub scaling_lists: ScalingLists,
    pub vui: VuiParams,
    pub coding: CodingTreeParams,
    /// Level in tenths, e.g. 62 for level 6.2.
    pub level: u8,
    pub container: ContainerFormat,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            real_width: 0,
            real_height: 0,
            chroma_format: ChromaFormat::default(),
            bit_depth: 8,
            qp: 32,
            ref_frames: 3,
            intra_period: 0,
            deblock: DeblockParams::default(),
            sao_enable: true,
            trskip_enable: false,
            pcm_enable: false,
            sign_hiding: false,
            temporal_mvp: false,
            aud_enable: false,
            tiles: None,
            wpp: false,
            scaling_lists: ScalingLists::default(),
            vui: VuiParams::default(),
            coding: CodingTreeParams::default(),
            level: 62,
            container: ContainerFormat::default(),
        }
    }
}

impl EncoderConfig {
    /// Creates a configuration for a `width` x `height` display size.
    ///
    /// The coded size is padded up to a multiple of the minimum CU size.
    pub fn new(width: u32, height: u32) -> Self {
        let mut config = Self {
            real_width: width,
            real_height: height,
            ..Default::default()
        };
        let min_cu = 1 << config.coding.min_cu_log2;
        config.width = width.div_ceil(min_cu) * min_cu;
        config.height = height.div_ceil(min_cu) * min_cu;
        config
    }

    pub fn with_qp(mut self, qp: u8) -> Self {
        self.qp = qp;
        self
    }

    pub fn with_ref_frames(mut self, ref_frames: u32) -> Self {
        self.ref_frames = ref_frames;
        self
    }

    pub fn with_intra_period(mut self, intra_period: i32) -> Self {
        self.intra_period = intra_period;
        self
    }

    pub fn with_bit_depth(mut self, bit_depth: u8) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn with_deblock(mut self, deblock: DeblockParams) -> Self {
        self.deblock = deblock;
        self
    }

    pub fn with_sao(mut self, enable: bool) -> Self {
        self.sao_enable = enable;
        self
    }

    pub fn with_aud(mut self, enable: bool) -> Self {
        self.aud_enable = enable;
        self
    }

    pub fn with_tiles(mut self, tiles: TileConfig) -> Self {
        self.tiles = Some(tiles);
        self
    }

    pub fn with_wpp(mut self, enable: bool) -> Self {
        self.wpp = enable;
        self
    }

    pub fn with_scaling_lists(mut self, lists: ScalingLists) -> Self {
        self.scaling_lists = lists;
        self
    }

    pub fn with_vui(mut self, vui: VuiParams) -> Self {
        self.vui = vui;
        self
    }

    pub fn with_container(mut self, container: ContainerFormat) -> Self {
        self.container = container;
        self
    }

    /// `true` when slices carry entry points (tiles or wavefronts).
    #[inline]
    pub fn parallel_substreams(&self) -> bool {
        self.tiles.is_some() || self.wpp
    }

    #[inline]
    pub fn width_in_lcu(&self) -> u32 {
        self.width.div_ceil(self.coding.lcu_size())
    }

    #[inline]
    pub fn height_in_lcu(&self) -> u32 {
        self.height.div_ceil(self.coding.lcu_size())
    }

    /// Checks the relations between fields that the syntax writers rely on.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid("picture size must be non-zero"));
        }
        if self.real_width > self.width || self.real_height > self.height {
            return Err(invalid(format!(
                "display size {}x{} exceeds coded size {}x{}",
                self.real_width, self.real_height, self.width, self.height
            )));
        }
        if !(8..=16).contains(&self.bit_depth) {
            return Err(invalid(format!("unsupported bit depth {}", self.bit_depth)));
        }
        if self.qp > 51 {
            return Err(invalid(format!("QP {} out of range", self.qp)));
        }
        // general_level_idc is level * 3 in eight bits.
        if self.level == 0 || self.level > 85 {
            return Err(invalid(format!("level {} out of range", self.level)));
        }
        if !(1..=5).contains(&self.coding.max_merge_candidates) {
            return Err(invalid(format!(
                "{} merge candidates, expected 1 to 5",
                self.coding.max_merge_candidates
            )));
        }
        if let Some(tiles) = &self.tiles {
            self.validate_tiles(tiles)?;
        }
        self.scaling_lists.validate()?;
        Ok(())
    }

    fn validate_tiles(&self, tiles: &TileConfig) -> Result<()> {
        let (w, h) = (self.width_in_lcu(), self.height_in_lcu());
        if tiles.columns == 0 || tiles.rows == 0 || tiles.columns > w || tiles.rows > h {
            return Err(invalid(format!(
                "{}x{} tiles do not fit a {}x{} LCU picture",
                tiles.columns, tiles.rows, w, h
            )));
        }
        if let TileSpacing::Explicit { column_widths, row_heights } = &tiles.spacing {
            let check = |sizes: &[u32], count: u32, total: u32, what: &str| {
                if sizes.len() as u32 != count - 1
                    || sizes.contains(&0)
                    || sizes.iter().sum::<u32>() >= total
                {
                    Err(invalid(format!("explicit tile {} sizes {:?} do not fit", what, sizes)))
                } else {
                    Ok(())
                }
            };
            check(column_widths, tiles.columns, w, "column")?;
            check(row_heights, tiles.rows, h, "row")?;
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> BitstreamError {
    BitstreamError::InvalidConfig(msg.into())
}
