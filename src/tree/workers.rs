// src/tree/workers.rs

//! Parallel production of terminal units.

use super::node::{CompositionTree, Node, NodeKind, UnitInfo};
use super::terminator::{EntropyTerminator, terminate_unit};
use crate::bitstream::BitBuffer;
use crate::utils::error::Result;
use log::trace;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Produces the entropy-coded LCUs of one terminal unit.
///
/// Implementations are shared between workers and must not depend on the
/// order in which units are produced.
pub trait UnitEncoder: Sync {
    type Coder: EntropyTerminator;

    /// Codes every LCU of `unit` into `stream` and hands back the coder so
    /// the unit can be terminated.
    fn encode_unit(&self, unit: &UnitInfo, stream: &mut BitBuffer) -> Result<Self::Coder>;
}

fn produce_one<E: UnitEncoder>(encoder: &E, node: &mut Node) -> Result<()> {
    let NodeKind::Unit(info) = &node.kind else {
        return Ok(());
    };
    node.stream.clear();
    // At least one byte per LCU.
    node.stream.try_reserve(info.lcu_count() as usize * 8)?;
    let mut coder = encoder.encode_unit(info, &mut node.stream)?;
    terminate_unit(&mut coder, &mut node.stream, info)?;
    trace!(
        "Unit {} closed at {} bits ({:?})",
        info.index,
        node.stream.tell_bits(),
        info.boundary
    );
    Ok(())
}

/// Fills the buffer of every terminal unit. Returns once all units are done.
///
/// With the `rayon` feature each unit is a separate task on the global pool;
/// otherwise units are produced in order on the calling thread.
pub fn produce_units<E: UnitEncoder>(tree: &mut CompositionTree, encoder: &E) -> Result<()> {
    #[cfg(feature = "rayon")]
    {
        tree.nodes
            .par_iter_mut()
            .filter(|node| node.is_terminal())
            .try_for_each(|node| produce_one(encoder, node))
    }

    #[cfg(not(feature = "rayon"))]
    {
        tree.nodes
            .iter_mut()
            .filter(|node| node.is_terminal())
            .try_for_each(|node| produce_one(encoder, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::{PartitionInfo, SliceInfo};
    use crate::tree::terminator::fake::RawBins;
    use crate::utils::error::BitstreamError;

    struct IndexBytes;

    impl UnitEncoder for IndexBytes {
        type Coder = RawBins;

        fn encode_unit(&self, unit: &UnitInfo, stream: &mut BitBuffer) -> Result<RawBins> {
            for _ in 0..unit.lcu_count() {
                stream.write_byte(unit.index as u8);
            }
            Ok(RawBins::default())
        }
    }

    fn two_row_tree(second_ends_row: bool) -> CompositionTree {
        let mut tree = CompositionTree::new();
        let s = tree.add_child(
            tree.root(),
            NodeKind::Slice(SliceInfo { start_in_rs: 0, lcu_start_ts: 0, lcu_end_ts: 4, qp: None }),
        );
        let t = tree.add_child(
            s,
            NodeKind::Partition(PartitionInfo {
                id: 0,
                x: 0,
                y: 0,
                width: 2,
                height: 2,
                lcu_start_ts: 0,
                lcu_end_ts: 4,
            }),
        );
        tree.add_child(t, NodeKind::Unit(UnitInfo::new(0, 0, 1, second_ends_row)));
        tree.add_child(t, NodeKind::Unit(UnitInfo::new(1, 1, 4, true)));
        tree
    }

    #[test]
    fn test_units_are_produced_and_terminated() {
        let mut tree = two_row_tree(true);
        produce_units(&mut tree, &IndexBytes).unwrap();

        let units = tree.units();
        assert_eq!(tree.node(units[0]).stream.to_bytes(), vec![0, 0b0100_0000]);
        assert_eq!(tree.node(units[1]).stream.to_bytes(), vec![1, 1, 1, 0x80, 0x80]);
        assert!(tree.node(tree.root()).stream.is_empty());
    }

    #[test]
    fn test_bad_boundary_fails_production() {
        let mut tree = two_row_tree(false);
        let err = produce_units(&mut tree, &IndexBytes).unwrap_err();
        assert!(matches!(err, BitstreamError::InvalidUnitBoundary { unit: 0 }));
    }
}
