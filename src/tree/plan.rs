// src/tree/plan.rs

//! Derives a picture's composition tree from the encoder configuration.
//!
//! The picture is cut into an LCU grid, the grid into tiles and each tile
//! into terminal units: one per LCU row of the tile with wavefronts, one per
//! tile otherwise. LCU ranges are given in tile-scan order.

use super::node::{CompositionTree, NodeId, NodeKind, PartitionInfo, SliceInfo, UnitInfo};
use crate::core::config::{EncoderConfig, TileSpacing};
use crate::utils::error::{BitstreamError, Result};
use log::debug;

/// How slices relate to tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliceLayout {
    /// One slice spanning every tile: picture, slice, tiles, units.
    #[default]
    Single,
    /// One slice inside each tile: picture, tiles, slice, units.
    PerPartition,
}

/// Tile boundaries of the LCU grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    pub width_in_lcu: u32,
    pub height_in_lcu: u32,
    /// `columns + 1` boundaries, starting at 0 and ending at the grid width.
    pub column_bounds: Vec<u32>,
    pub row_bounds: Vec<u32>,
}

fn uniform_bounds(count: u32, total: u32) -> Vec<u32> {
    (0..=count).map(|i| i * total / count).collect()
}

fn explicit_bounds(sizes: &[u32], total: u32) -> Vec<u32> {
    let mut bounds = Vec::with_capacity(sizes.len() + 2);
    bounds.push(0);
    let mut pos = 0;
    for &size in sizes {
        pos += size;
        bounds.push(pos);
    }
    bounds.push(total);
    bounds
}

impl TileGrid {
    pub fn from_config(config: &EncoderConfig) -> Self {
        let (w, h) = (config.width_in_lcu(), config.height_in_lcu());
        let (column_bounds, row_bounds) = match &config.tiles {
            None => (vec![0, w], vec![0, h]),
            Some(tiles) => match &tiles.spacing {
                TileSpacing::Uniform => {
                    (uniform_bounds(tiles.columns, w), uniform_bounds(tiles.rows, h))
                }
                TileSpacing::Explicit { column_widths, row_heights } => {
                    (explicit_bounds(column_widths, w), explicit_bounds(row_heights, h))
                }
            },
        };
        Self {
            width_in_lcu: w,
            height_in_lcu: h,
            column_bounds,
            row_bounds,
        }
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.column_bounds.len() - 1
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.row_bounds.len() - 1
    }

    /// Tiles in raster order with their tile-scan ranges.
    pub fn tiles(&self) -> Vec<PartitionInfo> {
        let mut tiles = Vec::with_capacity(self.columns() * self.rows());
        let mut ts = 0;
        for r in 0..self.rows() {
            for c in 0..self.columns() {
                let x = self.column_bounds[c];
                let y = self.row_bounds[r];
                let width = self.column_bounds[c + 1] - x;
                let height = self.row_bounds[r + 1] - y;
                tiles.push(PartitionInfo {
                    id: tiles.len() as u32,
                    x,
                    y,
                    width,
                    height,
                    lcu_start_ts: ts,
                    lcu_end_ts: ts + width * height,
                });
                ts += width * height;
            }
        }
        tiles
    }

    /// Raster-scan address of the LCU at tile-scan address `ts`.
    pub fn ts_to_rs(&self, ts: u32) -> Option<u32> {
        let tiles = self.tiles();
        let tile = tiles.iter().find(|t| (t.lcu_start_ts..t.lcu_end_ts).contains(&ts))?;
        let offset = ts - tile.lcu_start_ts;
        let x = tile.x + offset % tile.width;
        let y = tile.y + offset / tile.width;
        Some(y * self.width_in_lcu + x)
    }
}

/// Builds the tree for one picture.
///
/// `slice_qp` is forwarded to every slice; `None` leaves the picture QP in
/// charge.
pub fn plan_picture(
    config: &EncoderConfig,
    layout: SliceLayout,
    slice_qp: Option<i32>,
) -> Result<CompositionTree> {
    config.validate()?;
    let grid = TileGrid::from_config(config);
    let tiles = grid.tiles();
    let total = grid.width_in_lcu * grid.height_in_lcu;

    let mut tree = CompositionTree::new();
    let root = tree.root();
    let mut next_unit = 0;

    match layout {
        SliceLayout::Single => {
            let slice = tree.add_child(
                root,
                NodeKind::Slice(SliceInfo {
                    start_in_rs: 0,
                    lcu_start_ts: 0,
                    lcu_end_ts: total,
                    qp: slice_qp,
                }),
            );
            for tile in tiles {
                let partition = tree.add_child(slice, NodeKind::Partition(tile.clone()));
                add_units(&mut tree, partition, &tile, config.wpp, &mut next_unit);
            }
        }
        SliceLayout::PerPartition => {
            for tile in tiles {
                let start_in_rs = grid.ts_to_rs(tile.lcu_start_ts).ok_or_else(|| {
                    BitstreamError::InvalidConfig(format!("tile {} holds no LCUs", tile.id))
                })?;
                let partition = tree.add_child(root, NodeKind::Partition(tile.clone()));
                let slice = tree.add_child(
                    partition,
                    NodeKind::Slice(SliceInfo {
                        start_in_rs,
                        lcu_start_ts: tile.lcu_start_ts,
                        lcu_end_ts: tile.lcu_end_ts,
                        qp: slice_qp,
                    }),
                );
                add_units(&mut tree, slice, &tile, config.wpp, &mut next_unit);
            }
        }
    }

    debug!(
        "Planned {}x{} LCUs, {}x{} tiles, {} units: {}",
        grid.width_in_lcu,
        grid.height_in_lcu,
        grid.columns(),
        grid.rows(),
        next_unit,
        tree.outline()
    );
    Ok(tree)
}

fn add_units(
    tree: &mut CompositionTree,
    parent: NodeId,
    tile: &PartitionInfo,
    wpp: bool,
    next_unit: &mut usize,
) {
    if wpp {
        for row in 0..tile.height {
            let start = tile.lcu_start_ts + row * tile.width;
            let unit = UnitInfo::new(*next_unit, start, start + tile.width, true);
            tree.add_child(parent, NodeKind::Unit(unit));
            *next_unit += 1;
        }
    } else {
        let unit = UnitInfo::new(*next_unit, tile.lcu_start_ts, tile.lcu_end_ts, true);
        tree.add_child(parent, NodeKind::Unit(unit));
        *next_unit += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TileConfig;

    #[test]
    fn test_uniform_bounds() {
        assert_eq!(uniform_bounds(3, 10), vec![0, 3, 6, 10]);
        assert_eq!(uniform_bounds(1, 7), vec![0, 7]);
        assert_eq!(explicit_bounds(&[2, 3], 8), vec![0, 2, 5, 8]);
    }

    #[test]
    fn test_tile_scan_ranges() {
        // 4x2 LCUs, two tile columns of 1 and 3.
        let config = EncoderConfig::new(256, 128).with_tiles(TileConfig {
            columns: 2,
            rows: 1,
            spacing: TileSpacing::Explicit { column_widths: vec![1], row_heights: vec![] },
        });
        let grid = TileGrid::from_config(&config);
        let tiles = grid.tiles();
        assert_eq!(tiles.len(), 2);
        assert_eq!((tiles[0].lcu_start_ts, tiles[0].lcu_end_ts), (0, 2));
        assert_eq!((tiles[1].lcu_start_ts, tiles[1].lcu_end_ts), (2, 8));

        let rs: Vec<u32> = (0..8).filter_map(|ts| grid.ts_to_rs(ts)).collect();
        assert_eq!(rs, vec![0, 4, 1, 2, 3, 5, 6, 7]);
        assert_eq!(grid.ts_to_rs(8), None);
    }

    #[test]
    fn test_plain_picture_is_one_unit() {
        let config = EncoderConfig::new(200, 100);
        let tree = plan_picture(&config, SliceLayout::Single, None).unwrap();
        assert_eq!(tree.outline(), "M(S(T(W)))");
        let unit = tree.node(tree.units()[0]).unit().unwrap().clone();
        assert_eq!((unit.lcu_start_ts, unit.lcu_end_ts), (0, 8));
        assert!(unit.boundary.ends_slice);
    }

    #[test]
    fn test_wavefront_rows() {
        let config = EncoderConfig::new(192, 192).with_wpp(true);
        let tree = plan_picture(&config, SliceLayout::Single, Some(30)).unwrap();
        assert_eq!(tree.outline(), "M(S(T(WWW)))");
        let units = tree.units();
        let last = tree.node(units[2]).unit().unwrap();
        assert_eq!((last.index, last.lcu_start_ts, last.lcu_end_ts), (2, 6, 9));
        assert!(last.boundary.ends_slice);
        assert!(!tree.node(units[0]).unit().unwrap().boundary.ends_slice);
    }

    #[test]
    fn test_slice_per_tile() {
        let config = EncoderConfig::new(256, 256)
            .with_tiles(TileConfig::uniform(2, 2))
            .with_wpp(true);
        let tree = plan_picture(&config, SliceLayout::PerPartition, None).unwrap();
        assert_eq!(tree.outline(), "M(T(S(WW))T(S(WW))T(S(WW))T(S(WW)))");

        let slices: Vec<u32> = tree
            .post_order()
            .into_iter()
            .filter_map(|id| match &tree.node(id).kind {
                NodeKind::Slice(s) => Some(s.start_in_rs),
                _ => None,
            })
            .collect();
        assert_eq!(slices, vec![0, 2, 8, 10]);
        for id in tree.units() {
            let unit = tree.node(id).unit().unwrap();
            assert_eq!(unit.boundary.ends_slice, unit.boundary.ends_partition);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EncoderConfig::new(64, 64).with_tiles(TileConfig::uniform(2, 1));
        assert!(plan_picture(&config, SliceLayout::Single, None).is_err());
    }
}
