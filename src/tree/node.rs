// src/tree/node.rs

//! Arena-backed composition tree of one picture.
//!
//! Nodes are addressed by [`NodeId`]. The root is always the picture node;
//! partitions and slices nest under it in either order and terminal units
//! hang off the innermost level. Every node owns a [`BitBuffer`] that is
//! filled during its merge turn and drained into its parent.

use crate::bitstream::BitBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One-letter node tags used in tree outlines and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTag {
    Picture,
    Partition,
    Slice,
    Unit,
}

impl NodeTag {
    pub fn as_char(self) -> char {
        match self {
            NodeTag::Picture => 'M',
            NodeTag::Partition => 'T',
            NodeTag::Slice => 'S',
            NodeTag::Unit => 'W',
        }
    }
}

/// A rectangular partition (tile), in LCU coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfo {
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Tile-scan address of the first LCU.
    pub lcu_start_ts: u32,
    /// One past the tile-scan address of the last LCU.
    pub lcu_end_ts: u32,
}

/// An independent slice segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceInfo {
    /// Raster-scan address of the first LCU (`slice_segment_address`).
    pub start_in_rs: u32,
    pub lcu_start_ts: u32,
    pub lcu_end_ts: u32,
    /// Slice QP; falls back to the picture QP when unset.
    pub qp: Option<i32>,
}

impl SliceInfo {
    #[inline]
    pub fn is_first(&self) -> bool {
        self.start_in_rs == 0
    }
}

/// Where a terminal unit's last LCU sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitBoundary {
    pub ends_slice: bool,
    pub ends_partition: bool,
    pub ends_row: bool,
}

/// A terminal unit: a run of LCUs coded into one substream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    /// Position among all units of the picture, left to right.
    pub index: usize,
    pub lcu_start_ts: u32,
    pub lcu_end_ts: u32,
    pub boundary: UnitBoundary,
}

impl UnitInfo {
    /// A unit whose last LCU does or does not close a CTU row. Slice and
    /// partition boundaries are filled in when the unit joins a tree.
    pub fn new(index: usize, lcu_start_ts: u32, lcu_end_ts: u32, ends_row: bool) -> Self {
        Self {
            index,
            lcu_start_ts,
            lcu_end_ts,
            boundary: UnitBoundary {
                ends_row,
                ..Default::default()
            },
        }
    }

    #[inline]
    pub fn lcu_count(&self) -> u32 {
        self.lcu_end_ts - self.lcu_start_ts
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Picture,
    Partition(PartitionInfo),
    Slice(SliceInfo),
    Unit(UnitInfo),
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Picture => NodeTag::Picture,
            NodeKind::Partition(_) => NodeTag::Partition,
            NodeKind::Slice(_) => NodeTag::Slice,
            NodeKind::Unit(_) => NodeTag::Unit,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeKind::Unit(_))
    }

    fn lcu_end_ts(&self) -> Option<u32> {
        match self {
            NodeKind::Partition(p) => Some(p.lcu_end_ts),
            NodeKind::Slice(s) => Some(s.lcu_end_ts),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub stream: BitBuffer,
    /// Byte lengths of the terminal units merged beneath this node.
    pub substreams: Vec<usize>,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            stream: BitBuffer::new(),
            substreams: Vec::new(),
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }

    pub fn unit(&self) -> Option<&UnitInfo> {
        match &self.kind {
            NodeKind::Unit(info) => Some(info),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CompositionTree {
    pub(crate) nodes: Vec<Node>,
}

impl Default for CompositionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionTree {
    /// A tree holding only the picture node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Picture, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Attaches a new node as the last child of `parent`.
    ///
    /// Units get their slice and partition boundary flags from the nearest
    /// enclosing slice and partition.
    pub fn add_child(&mut self, parent: NodeId, mut kind: NodeKind) -> NodeId {
        debug_assert!(!self.nodes[parent.0].is_terminal(), "units cannot have children");
        if let NodeKind::Unit(info) = &mut kind {
            let slice_end = self.enclosing_end(parent, NodeTag::Slice);
            let partition_end = self.enclosing_end(parent, NodeTag::Partition);
            info.boundary.ends_slice = slice_end == Some(info.lcu_end_ts);
            info.boundary.ends_partition = partition_end == Some(info.lcu_end_ts);
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn enclosing_end(&self, mut id: NodeId, tag: NodeTag) -> Option<u32> {
        loop {
            let node = &self.nodes[id.0];
            if node.kind.tag() == tag {
                return node.kind.lcu_end_ts();
            }
            id = node.parent?;
        }
    }

    /// Terminal units in left-to-right order.
    pub fn units(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_units(self.root(), &mut out);
        out
    }

    fn collect_units(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.nodes[id.0].is_terminal() {
            out.push(id);
            return;
        }
        for &child in &self.nodes[id.0].children {
            self.collect_units(child, out);
        }
    }

    /// Nodes in merge order: every child before its parent, siblings left to
    /// right.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.collect_post_order(self.root(), &mut out);
        out
    }

    fn collect_post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id.0].children {
            self.collect_post_order(child, out);
        }
        out.push(id);
    }

    /// Bracketed outline of the tree, e.g. `M(S(T(WW)T(WW)))`.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(self.root(), &mut out);
        out
    }

    fn write_outline(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        out.push(node.kind.tag().as_char());
        if !node.children.is_empty() {
            out.push('(');
            for &child in &node.children {
                self.write_outline(child, out);
            }
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(start: u32, end: u32) -> NodeKind {
        NodeKind::Slice(SliceInfo {
            start_in_rs: start,
            lcu_start_ts: start,
            lcu_end_ts: end,
            qp: None,
        })
    }

    fn partition(id: u32, start: u32, end: u32) -> NodeKind {
        NodeKind::Partition(PartitionInfo {
            id,
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            lcu_start_ts: start,
            lcu_end_ts: end,
        })
    }

    #[test]
    fn test_tags_are_distinct() {
        let tags: Vec<char> = [NodeTag::Picture, NodeTag::Partition, NodeTag::Slice, NodeTag::Unit]
            .into_iter()
            .map(NodeTag::as_char)
            .collect();
        assert_eq!(tags, vec!['M', 'T', 'S', 'W']);
    }

    #[test]
    fn test_unit_boundaries_follow_ancestors() {
        let mut tree = CompositionTree::new();
        let s = tree.add_child(tree.root(), slice(0, 8));
        let t0 = tree.add_child(s, partition(0, 0, 4));
        let t1 = tree.add_child(s, partition(1, 4, 8));
        let u0 = tree.add_child(t0, NodeKind::Unit(UnitInfo::new(0, 0, 2, true)));
        let u1 = tree.add_child(t0, NodeKind::Unit(UnitInfo::new(1, 2, 4, true)));
        let u2 = tree.add_child(t1, NodeKind::Unit(UnitInfo::new(2, 4, 8, false)));

        let b = |id| tree.node(id).unit().unwrap().boundary;
        assert_eq!(b(u0), UnitBoundary { ends_slice: false, ends_partition: false, ends_row: true });
        assert_eq!(b(u1), UnitBoundary { ends_slice: false, ends_partition: true, ends_row: true });
        assert_eq!(b(u2), UnitBoundary { ends_slice: true, ends_partition: true, ends_row: false });

        assert_eq!(tree.units(), vec![u0, u1, u2]);
        assert_eq!(tree.outline(), "M(S(T(WW)T(W)))");
    }

    #[test]
    fn test_post_order_visits_children_first() {
        let mut tree = CompositionTree::new();
        let t = tree.add_child(tree.root(), partition(0, 0, 2));
        let s = tree.add_child(t, slice(0, 2));
        let u = tree.add_child(s, NodeKind::Unit(UnitInfo::new(0, 0, 2, true)));
        assert_eq!(tree.post_order(), vec![u, s, t, tree.root()]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.node(u).parent, Some(s));
    }
}
