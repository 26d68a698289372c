//! Huffman tree: arena storage, greedy construction, and serialization.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. A leaf
//! carries its symbol value (0-255) as `index`; internal nodes carry an
//! allocation sequence number starting at 256. Parent links exist only for
//! the leaf-to-root walks that derive symbol codes.
//!
//! # Serialized form
//!
//! The tree is written in preorder as signed 16-bit values: a present node
//! emits its `index` followed by its left and right subtrees, an absent
//! subtree emits [`SENTINEL`]. A leaf therefore serializes as
//! `[symbol, -1, -1]` and an empty tree as `[-1]`. A full 256-symbol tree
//! takes 1023 values, which fits [`HUF_BTREE_LEN`].

use crate::histogram::{ASCII_COUNT, HUF_HISTOGRAM_LEN, Histogram};
use oxihuf_core::error::{HufError, Result};

/// Maximum number of 16-bit values in a serialized tree.
pub const HUF_BTREE_LEN: usize = 1024;

/// Serialized marker for an absent subtree.
pub const SENTINEL: i16 = -1;

/// Handle of a node inside a [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A node of the Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    index: i16,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl Node {
    fn new(index: i16, parent: Option<NodeId>) -> Self {
        Self {
            index,
            parent,
            left: None,
            right: None,
        }
    }

    /// Symbol value for a leaf, sequence number for an internal node.
    pub fn index(&self) -> i16 {
        self.index
    }

    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Left child (reached by a 0 bit).
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right child (reached by a 1 bit).
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Returns `true` if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// The decoded byte for a leaf.
    pub fn symbol(&self) -> Option<u8> {
        if self.is_leaf() {
            u8::try_from(self.index).ok()
        } else {
            None
        }
    }
}

/// A Huffman tree with per-symbol leaf lookup.
///
/// The same `Tree` is reused chunk after chunk; [`Tree::reset`] drops the
/// nodes but keeps every allocation.
#[derive(Debug, Clone)]
pub struct Tree {
    /// Node arena.
    nodes: Vec<Node>,
    /// Root node, `None` for an empty tree.
    root: Option<NodeId>,
    /// Leaf of each symbol value.
    leaves: Vec<Option<NodeId>>,
    /// Scratch weights for construction, indexed like the histogram.
    weights: Vec<u64>,
    /// Node allocated for each weight slot during construction.
    slots: Vec<Option<NodeId>>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(HUF_HISTOGRAM_LEN),
            root: None,
            leaves: vec![None; ASCII_COUNT],
            weights: vec![0; HUF_HISTOGRAM_LEN],
            slots: vec![None; HUF_HISTOGRAM_LEN],
        }
    }

    /// Drop all nodes and clear the leaf table.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.leaves.fill(None);
    }

    /// Root node, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Access a node by handle.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Leaf node of `symbol`, if it occurs in the tree.
    pub fn leaf(&self, symbol: u8) -> Option<NodeId> {
        self.leaves[symbol as usize]
    }

    /// Number of nodes currently in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of symbols with a leaf.
    pub fn leaf_count(&self) -> usize {
        self.leaves.iter().filter(|leaf| leaf.is_some()).count()
    }

    /// Returns `true` if the tree has no root.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Child of `id` selected by `bit` (`true` goes right).
    #[inline]
    pub fn child(&self, id: NodeId, bit: bool) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        if bit { node.right } else { node.left }
    }

    fn alloc(&mut self, index: i16, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(index, parent));
        id
    }

    /// Node for a weight slot, created on first use.
    fn slot(&mut self, index: usize) -> NodeId {
        if let Some(id) = self.slots[index] {
            return id;
        }

        let id = self.alloc(index as i16, None);
        self.slots[index] = Some(id);
        if index < ASCII_COUNT {
            self.leaves[index] = Some(id);
        }
        id
    }

    /// Build the tree from a byte histogram, replacing the current contents.
    ///
    /// # Algorithm
    ///
    /// 1. Copy the symbol weights into scratch space indexed like the histogram
    /// 2. Scan from the lowest live index for the two smallest non-zero weights
    ///    below the next internal sequence number (ties go to the lower index)
    /// 3. Join them under a new internal node whose weight is their sum, and
    ///    zero their slots
    /// 4. Repeat until one live weight remains; that node is the root
    ///
    /// The scan is quadratic in the number of distinct symbols and fully
    /// deterministic for a given histogram. A histogram with one symbol yields
    /// a single leaf as root; an empty one yields an empty tree.
    pub fn build(&mut self, histogram: &Histogram) -> Result<()> {
        self.reset();

        let frequencies = histogram.frequencies();
        if frequencies.iter().skip(ASCII_COUNT).any(|&f| f > 0) {
            return Err(HufError::invalid_argument(
                "tree construction needs single-byte symbols",
            ));
        }

        let Some(mut start) = histogram.start() else {
            return Ok(());
        };

        let symbols = frequencies.len().min(ASCII_COUNT);
        self.weights.fill(0);
        self.weights[..symbols].copy_from_slice(&frequencies[..symbols]);
        self.slots.fill(None);

        let mut next = ASCII_COUNT;
        loop {
            while start < next && self.weights[start] == 0 {
                start += 1;
            }

            match lowest_pair(&self.weights[start..next], start) {
                (Some(only), None) => {
                    self.root = Some(self.slot(only));
                    break;
                }
                (Some(first), Some(second)) => {
                    if next >= HUF_HISTOGRAM_LEN {
                        return Err(HufError::fatal("internal node sequence exhausted"));
                    }

                    let left = self.slot(first);
                    let right = self.slot(second);
                    let parent = self.alloc(next as i16, None);
                    self.slots[next] = Some(parent);

                    self.nodes[left.0].parent = Some(parent);
                    self.nodes[right.0].parent = Some(parent);
                    self.nodes[parent.0].left = Some(left);
                    self.nodes[parent.0].right = Some(right);

                    self.weights[next] = self.weights[first] + self.weights[second];
                    self.weights[first] = 0;
                    self.weights[second] = 0;
                    next += 1;
                }
                (None, _) => {
                    return Err(HufError::fatal("histogram start points past every weight"));
                }
            }
        }

        tracing::trace!(
            nodes = self.nodes.len(),
            leaves = self.leaf_count(),
            "built huffman tree"
        );
        Ok(())
    }

    /// Append the preorder serialization to `out`; returns the number of values written.
    pub fn serialize(&self, out: &mut Vec<i16>) -> usize {
        let before = out.len();
        self.serialize_node(self.root, out);
        out.len() - before
    }

    fn serialize_node(&self, node: Option<NodeId>, out: &mut Vec<i16>) {
        match node {
            None => out.push(SENTINEL),
            Some(id) => {
                let node = &self.nodes[id.0];
                out.push(node.index);
                self.serialize_node(node.left, out);
                self.serialize_node(node.right, out);
            }
        }
    }

    /// Rebuild the tree from its serialized form, replacing the current contents.
    ///
    /// Every descent checks the remaining length, so a buffer that ends before
    /// the sentinel structure closes fails with `BtreeCorrupted` rather than
    /// reading past `buf`. Values left over after the root closes, one-child
    /// nodes, out-of-range indices and duplicate leaves are rejected the same
    /// way. On failure the tree is left empty.
    pub fn deserialize(&mut self, buf: &[i16]) -> Result<()> {
        self.reset();

        if buf.is_empty() || buf.len() > HUF_BTREE_LEN {
            return Err(HufError::btree_overflow(buf.len() as i64, HUF_BTREE_LEN));
        }

        let mut position = 0;
        let result = match self.deserialize_node(buf, &mut position, None) {
            Ok(root) if position == buf.len() => {
                self.root = root;
                Ok(())
            }
            Ok(_) => Err(HufError::btree_corrupted(position, buf.len())),
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.reset();
        }
        result
    }

    fn deserialize_node(
        &mut self,
        buf: &[i16],
        position: &mut usize,
        parent: Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        let at = *position;
        let Some(&value) = buf.get(at) else {
            return Err(HufError::btree_corrupted(at, buf.len()));
        };
        *position += 1;

        if value == SENTINEL {
            return Ok(None);
        }
        if value < 0 || value as usize >= HUF_HISTOGRAM_LEN {
            return Err(HufError::btree_corrupted(at, buf.len()));
        }

        let id = self.alloc(value, parent);
        let left = self.deserialize_node(buf, position, Some(id))?;
        let right = self.deserialize_node(buf, position, Some(id))?;

        match (left, right) {
            (None, None) => {
                let symbol = value as usize;
                if symbol >= ASCII_COUNT || self.leaves[symbol].is_some() {
                    return Err(HufError::btree_corrupted(at, buf.len()));
                }
                self.leaves[symbol] = Some(id);
            }
            (Some(_), Some(_)) if value as usize >= ASCII_COUNT => {
                self.nodes[id.0].left = left;
                self.nodes[id.0].right = right;
            }
            _ => return Err(HufError::btree_corrupted(at, buf.len())),
        }

        Ok(Some(id))
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Positions of the smallest and second smallest non-zero weights.
///
/// `base` is the index of `weights[0]`. Among equal weights the lower index
/// is kept.
fn lowest_pair(weights: &[u64], base: usize) -> (Option<usize>, Option<usize>) {
    let mut first: Option<(usize, u64)> = None;
    let mut second: Option<(usize, u64)> = None;

    for (offset, &weight) in weights.iter().enumerate() {
        if weight == 0 {
            continue;
        }

        let candidate = (base + offset, weight);
        match first {
            None => first = Some(candidate),
            Some((_, lowest)) if weight < lowest => {
                second = first;
                first = Some(candidate);
            }
            _ => match second {
                Some((_, runner_up)) if weight >= runner_up => {}
                _ => second = Some(candidate),
            },
        }
    }

    (first.map(|(i, _)| i), second.map(|(i, _)| i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_for(data: &[u8]) -> Tree {
        let mut histogram = Histogram::bytes();
        histogram.populate(data).unwrap();
        let mut tree = Tree::new();
        tree.build(&histogram).unwrap();
        tree
    }

    fn serialized(tree: &Tree) -> Vec<i16> {
        let mut out = Vec::new();
        tree.serialize(&mut out);
        out
    }

    #[test]
    fn test_empty_histogram() {
        let tree = tree_for(b"");
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
        assert_eq!(serialized(&tree), vec![SENTINEL]);
    }

    #[test]
    fn test_single_symbol_is_leaf_root() {
        let tree = tree_for(b"1111");
        let root = tree.root().unwrap();
        assert!(tree.node(root).is_leaf());
        assert_eq!(tree.node(root).symbol(), Some(b'1'));
        assert_eq!(tree.leaf(b'1'), Some(root));
        assert_eq!(serialized(&tree), vec![b'1' as i16, SENTINEL, SENTINEL]);
    }

    #[test]
    fn test_two_symbols() {
        // 'b' is rarer, so it is picked first and becomes the left child.
        let tree = tree_for(b"aab");
        let root = tree.root().unwrap();
        let node = tree.node(root);
        assert_eq!(node.index(), ASCII_COUNT as i16);
        assert_eq!(tree.node(node.left().unwrap()).symbol(), Some(b'b'));
        assert_eq!(tree.node(node.right().unwrap()).symbol(), Some(b'a'));
        assert_eq!(
            serialized(&tree),
            vec![256, b'b' as i16, -1, -1, b'a' as i16, -1, -1]
        );
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let tree = tree_for(b"dcba");
        // Four equal weights: (a, b) merge first, then (c, d), then the two pairs.
        let root = tree.node(tree.root().unwrap());
        assert_eq!(root.index(), 258);

        let left = tree.node(root.left().unwrap());
        let right = tree.node(root.right().unwrap());
        assert_eq!(left.index(), 256);
        assert_eq!(right.index(), 257);
        assert_eq!(tree.node(left.left().unwrap()).symbol(), Some(b'a'));
        assert_eq!(tree.node(left.right().unwrap()).symbol(), Some(b'b'));
        assert_eq!(tree.node(right.left().unwrap()).symbol(), Some(b'c'));
        assert_eq!(tree.node(right.right().unwrap()).symbol(), Some(b'd'));
    }

    #[test]
    fn test_build_is_deterministic() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let first = tree_for(data);
        let second = tree_for(data);
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(serialized(&first), serialized(&second));
    }

    #[test]
    fn test_parent_links() {
        let tree = tree_for(b"abracadabra");
        for symbol in [b'a', b'b', b'r', b'c', b'd'] {
            let mut id = tree.leaf(symbol).unwrap();
            let mut steps = 0;
            while let Some(parent) = tree.node(id).parent() {
                let parent_node = tree.node(parent);
                assert!(parent_node.left() == Some(id) || parent_node.right() == Some(id));
                id = parent;
                steps += 1;
            }
            assert_eq!(Some(id), tree.root());
            assert!(steps >= 1);
        }
    }

    #[test]
    fn test_all_symbols_fit_serialized_limit() {
        let data: Vec<u8> = (0..=255).collect();
        let tree = tree_for(&data);
        assert_eq!(tree.leaf_count(), 256);
        assert_eq!(tree.node_count(), 511);
        assert_eq!(serialized(&tree).len(), 1023);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let tree = tree_for(b"she sells sea shells by the sea shore");
        let buf = serialized(&tree);

        let mut rebuilt = Tree::new();
        rebuilt.deserialize(&buf).unwrap();
        assert_eq!(serialized(&rebuilt), buf);
        assert_eq!(rebuilt.leaf_count(), tree.leaf_count());
    }

    #[test]
    fn test_deserialize_truncated() {
        let tree = tree_for(b"abcabcaa");
        let buf = serialized(&tree);

        let mut rebuilt = Tree::new();
        let err = rebuilt.deserialize(&buf[..buf.len() - 1]).unwrap_err();
        assert!(matches!(err, HufError::BtreeCorrupted { .. }));
        assert!(rebuilt.is_empty());
        assert_eq!(rebuilt.node_count(), 0);
    }

    #[test]
    fn test_deserialize_rejects_malformed() {
        let mut tree = Tree::new();

        // Trailing values after the root closes.
        assert!(matches!(
            tree.deserialize(&[-1, -1]),
            Err(HufError::BtreeCorrupted { .. })
        ));
        // Internal node with a single child.
        assert!(matches!(
            tree.deserialize(&[256, 65, -1, -1, -1]),
            Err(HufError::BtreeCorrupted { .. })
        ));
        // Leaf index outside the byte range.
        assert!(matches!(
            tree.deserialize(&[300, -1, -1]),
            Err(HufError::BtreeCorrupted { .. })
        ));
        // Same symbol twice.
        assert!(matches!(
            tree.deserialize(&[256, 65, -1, -1, 65, -1, -1]),
            Err(HufError::BtreeCorrupted { .. })
        ));
        // Negative value other than the sentinel.
        assert!(matches!(
            tree.deserialize(&[-7]),
            Err(HufError::BtreeCorrupted { .. })
        ));
    }

    #[test]
    fn test_deserialize_length_bounds() {
        let mut tree = Tree::new();
        assert!(matches!(
            tree.deserialize(&[]),
            Err(HufError::BtreeOverflow { .. })
        ));
        let oversized = vec![SENTINEL; HUF_BTREE_LEN + 1];
        assert!(matches!(
            tree.deserialize(&oversized),
            Err(HufError::BtreeOverflow { .. })
        ));
    }

    #[test]
    fn test_reset_reuses_arena() {
        let mut histogram = Histogram::bytes();
        let mut tree = Tree::new();

        for round in 0..4u8 {
            histogram.reset();
            histogram.populate(&[round, round + 1, round + 2, round]).unwrap();
            tree.build(&histogram).unwrap();
            assert_eq!(tree.node_count(), 5);
            assert_eq!(tree.leaf_count(), 3);
        }

        tree.reset();
        assert!(tree.is_empty());
        assert_eq!(tree.leaf_count(), 0);
    }

    #[test]
    fn test_wide_histogram_rejected() {
        let mut histogram = Histogram::new(2, HUF_HISTOGRAM_LEN).unwrap();
        histogram.populate(&[0x00, 0x01]).unwrap();
        let mut tree = Tree::new();
        assert!(matches!(
            tree.build(&histogram),
            Err(HufError::InvalidArgument { .. })
        ));
    }
}
