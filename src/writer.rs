// src/writer.rs

//! Top-level entry point: plans, produces and merges one picture at a time.

use crate::bitstream::BitBuffer;
use crate::core::config::EncoderConfig;
use crate::core::picture::{Frame, PictureState};
use crate::tree::merge::{MergeContext, PictureStats, merge_tree};
use crate::tree::node::CompositionTree;
use crate::tree::plan::{SliceLayout, plan_picture};
use crate::tree::workers::{UnitEncoder, produce_units};
use crate::utils::error::Result;
use log::info;
use std::io::Write;

/// Writes the coded pictures of one sequence.
#[derive(Debug)]
pub struct BitstreamWriter {
    config: EncoderConfig,
    layout: SliceLayout,
    stats: Vec<PictureStats>,
}

impl BitstreamWriter {
    /// Validates `config` and creates a writer for it.
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Bitstream writer for {}x{} ({}x{} coded), {:?}",
            config.real_width, config.real_height, config.width, config.height, config.container
        );
        Ok(Self {
            config,
            layout: SliceLayout::default(),
            stats: Vec::new(),
        })
    }

    pub fn with_slice_layout(mut self, layout: SliceLayout) -> Self {
        self.layout = layout;
        self
    }

    #[inline]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Statistics of every picture written so far.
    #[inline]
    pub fn stats(&self) -> &[PictureStats] {
        &self.stats
    }

    pub fn total_bytes(&self) -> usize {
        self.stats.iter().map(|s| s.bytes).sum()
    }

    /// The composition tree a picture will be written with.
    pub fn plan(&self) -> Result<CompositionTree> {
        plan_picture(&self.config, self.layout, None)
    }

    /// Produces every unit of `tree` with `encoder`, then merges the tree.
    pub fn write_tree<E: UnitEncoder>(
        &mut self,
        tree: &mut CompositionTree,
        picture: &PictureState,
        frame: &Frame,
        encoder: &E,
    ) -> Result<BitBuffer> {
        produce_units(tree, encoder)?;
        let ctx = MergeContext {
            config: &self.config,
            picture,
            frame,
        };
        let (stream, stats) = merge_tree(tree, &ctx)?;
        self.stats.push(stats);
        Ok(stream)
    }

    /// Writes one picture and returns its bytes.
    pub fn write_picture<E: UnitEncoder>(
        &mut self,
        picture: &PictureState,
        frame: &Frame,
        encoder: &E,
    ) -> Result<Vec<u8>> {
        let mut tree = self.plan()?;
        let stream = self.write_tree(&mut tree, picture, frame, encoder)?;
        Ok(stream.to_bytes())
    }

    /// Writes one picture to `out` and returns the number of bytes written.
    pub fn write_picture_to<W: Write, E: UnitEncoder>(
        &mut self,
        out: &mut W,
        picture: &PictureState,
        frame: &Frame,
        encoder: &E,
    ) -> Result<usize> {
        let bytes = self.write_picture(picture, frame, encoder)?;
        out.write_all(&bytes)?;
        Ok(bytes.len())
    }
}
