// this_file: backends/ufr-core/src/codepoint_set.rs

//! Tiered bitset over the 21-bit code point space.
//!
//! Nodes live in an append-only arena and refer to each other by index.
//! Child link `0` means "absent": the root occupies slot 0 and is never a
//! child, so the value is free to act as the sentinel. Sparse coverage only
//! allocates the paths it touches, which keeps narrow-script subsets small
//! at the cost of a few indirections per query.

use crate::{ranges, CodeRange, Result, UfrError, MAX_CODE_POINT};
use serde::{Deserialize, Serialize};

const ADDRESS_BITS: u32 = 21;
const MAX_LEAF_BITS: u8 = 6;

/// Bit widths of each trie level.
///
/// The first width sizes the leaf word (`2^w` code points per word); the
/// remaining widths, read from the end, give the fan-out of each branch level
/// from the top down. An implicit root consumes the leftover high bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrieLayout {
    widths: Vec<u8>,
}

impl TrieLayout {
    /// Validate and build a layout from branch widths.
    pub fn new(widths: Vec<u8>) -> Result<Self> {
        let invalid = |reason: String| Err(UfrError::InvalidLayout { reason });

        let Some(&leaf) = widths.first() else {
            return invalid("at least the leaf width is required".to_string());
        };
        if widths.iter().any(|&w| w == 0) {
            return invalid(format!("zero width in {widths:?}"));
        }
        if leaf > MAX_LEAF_BITS {
            return invalid(format!("leaf width {leaf} exceeds {MAX_LEAF_BITS}"));
        }
        let sum: u32 = widths.iter().map(|&w| u32::from(w)).sum();
        if sum > ADDRESS_BITS {
            return invalid(format!("widths sum to {sum}, more than {ADDRESS_BITS} bits"));
        }
        Ok(Self { widths })
    }

    pub fn widths(&self) -> &[u8] {
        &self.widths
    }

    fn leaf_bits(&self) -> u32 {
        u32::from(self.widths[0])
    }

    fn total_bits(&self) -> u32 {
        self.widths.iter().map(|&w| u32::from(w)).sum()
    }

    fn root_bits(&self) -> u32 {
        ADDRESS_BITS - self.total_bits()
    }

    /// Branch widths from the top of the trie down.
    fn levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.widths[1..].iter().rev().map(|&w| u32::from(w))
    }

    fn depth(&self) -> usize {
        self.widths.len() - 1
    }
}

impl Default for TrieLayout {
    fn default() -> Self {
        Self {
            widths: vec![4, 2, 2, 2, 3, 4],
        }
    }
}

/// A leaf packs `2^(slot bits + leaf width)` membership bits into as few
/// `u64` words as that takes, so narrow leaf widths do not waste bits.
#[derive(Debug, Clone)]
enum Node {
    Branch(Box<[u32]>),
    Leaf(Box<[u64]>),
}

/// Word index and bit mask of bit `index` in a packed leaf
fn leaf_bit(index: u32) -> (usize, u64) {
    ((index >> 6) as usize, 1u64 << (index & 63))
}

impl Node {
    fn branch(bits: u32) -> Self {
        Node::Branch(vec![0; 1 << bits].into_boxed_slice())
    }

    fn leaf(bits: u32, leaf_bits: u32) -> Self {
        let words = (1usize << (bits + leaf_bits)).div_ceil(64);
        Node::Leaf(vec![0; words].into_boxed_slice())
    }

    fn size_bytes(&self) -> usize {
        match self {
            Node::Branch(slots) => slots.len() * std::mem::size_of::<u32>(),
            Node::Leaf(words) => words.len() * std::mem::size_of::<u64>(),
        }
    }
}

/// Set of code points stored as a tiered trie.
#[derive(Debug, Clone)]
pub struct CodePointSet {
    layout: TrieLayout,
    nodes: Vec<Node>,
}

impl CodePointSet {
    /// Empty set with the default layout.
    pub fn new() -> Self {
        Self::with_layout(TrieLayout::default())
    }

    /// Empty set with a custom layout.
    pub fn with_layout(layout: TrieLayout) -> Self {
        let root_bits = layout.root_bits();
        let root = if layout.depth() == 0 {
            Node::leaf(root_bits, layout.leaf_bits())
        } else {
            Node::branch(root_bits)
        };
        Self {
            layout,
            nodes: vec![root],
        }
    }

    /// Build from a list of ranges.
    pub fn from_ranges(ranges: &[CodeRange]) -> Self {
        let mut set = Self::new();
        for range in ranges {
            set.add_range(range.start, range.end);
        }
        set
    }

    /// Build from a range string such as `"0-7F,A0-FF"`.
    pub fn from_range_string(input: &str) -> Result<Self> {
        Self::from_range_string_with_layout(input, TrieLayout::default())
    }

    /// Build from a range string using a custom layout.
    pub fn from_range_string_with_layout(input: &str, layout: TrieLayout) -> Result<Self> {
        let mut set = Self::with_layout(layout);
        ranges::for_each_code_point(input, |cp| set.add(cp))?;
        Ok(set)
    }

    pub fn layout(&self) -> &TrieLayout {
        &self.layout
    }

    /// Add one code point. Values above U+10FFFF are ignored.
    pub fn add(&mut self, code_point: u32) {
        if code_point > MAX_CODE_POINT {
            return;
        }

        let layout = &self.layout;
        let nodes = &mut self.nodes;
        let depth = layout.depth();
        let mut shift = layout.total_bits();
        let mut slot = (code_point >> shift) as usize;
        let mut current = 0usize;

        for (level, bits) in layout.levels().enumerate() {
            let child = match &nodes[current] {
                Node::Branch(slots) => slots[slot],
                Node::Leaf(_) => unreachable!("leaf above the bottom level"),
            };
            let child = if child == 0 {
                let index = nodes.len() as u32;
                nodes.push(if level + 1 == depth {
                    Node::leaf(bits, layout.leaf_bits())
                } else {
                    Node::branch(bits)
                });
                if let Node::Branch(slots) = &mut nodes[current] {
                    slots[slot] = index;
                }
                index
            } else {
                child
            };

            current = child as usize;
            shift -= bits;
            slot = ((code_point >> shift) & ((1 << bits) - 1)) as usize;
        }

        let leaf_mask = (1u32 << layout.leaf_bits()) - 1;
        let index = ((slot as u32) << layout.leaf_bits()) | (code_point & leaf_mask);
        let (word, mask) = leaf_bit(index);
        if let Node::Leaf(words) = &mut nodes[current] {
            words[word] |= mask;
        }
    }

    /// Add every code point of an inclusive range.
    pub fn add_range(&mut self, start: u32, end: u32) {
        let end = end.min(MAX_CODE_POINT);
        if start > end {
            return;
        }
        for cp in start..=end {
            self.add(cp);
        }
    }

    /// Membership test; never allocates.
    pub fn has(&self, code_point: u32) -> bool {
        if code_point > MAX_CODE_POINT {
            return false;
        }

        let mut shift = self.layout.total_bits();
        let mut slot = (code_point >> shift) as usize;
        let mut current = 0usize;

        for bits in self.layout.levels() {
            let child = match &self.nodes[current] {
                Node::Branch(slots) => slots[slot],
                Node::Leaf(_) => return false,
            };
            if child == 0 {
                return false;
            }
            current = child as usize;
            shift -= bits;
            slot = ((code_point >> shift) & ((1 << bits) - 1)) as usize;
        }

        match &self.nodes[current] {
            Node::Leaf(words) => {
                let index =
                    ((slot as u32) << self.layout.leaf_bits()) | (code_point & self.leaf_mask());
                let (word, mask) = leaf_bit(index);
                words[word] & mask != 0
            }
            Node::Branch(_) => false,
        }
    }

    /// Number of covered code points.
    pub fn len(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match node {
                Node::Leaf(words) => words.iter().map(|w| w.count_ones() as usize).sum(),
                Node::Branch(_) => 0,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of allocated arena nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Approximate heap footprint of the node arena.
    pub fn memory_bytes(&self) -> usize {
        self.nodes.iter().map(Node::size_bytes).sum()
    }

    /// Covered code points in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let mut points = Vec::with_capacity(self.len());
        self.collect_from(0, 0, self.layout.total_bits(), 0, &mut points);
        points.into_iter()
    }

    /// Contiguous covered ranges in ascending order.
    pub fn ranges(&self) -> Vec<CodeRange> {
        let mut out: Vec<CodeRange> = Vec::new();
        for cp in self.iter() {
            match out.last_mut() {
                Some(prev) if prev.end + 1 == cp => prev.end = cp,
                _ => out.push(CodeRange::single(cp)),
            }
        }
        out
    }

    /// Serialize back to a range string.
    pub fn to_range_string(&self) -> String {
        ranges::serialize_ranges(&self.ranges())
    }

    fn leaf_mask(&self) -> u32 {
        (1 << self.layout.leaf_bits()) - 1
    }

    /// Depth-first walk; `shift` is the bit position below the slots of
    /// `node`, `base` the code point prefix accumulated so far.
    fn collect_from(&self, node: usize, level: usize, shift: u32, base: u32, out: &mut Vec<u32>) {
        match &self.nodes[node] {
            Node::Branch(slots) => {
                let bits = self.layout.levels().nth(level).unwrap_or_default();
                for (slot, &child) in slots.iter().enumerate() {
                    if child != 0 {
                        let prefix = base | ((slot as u32) << shift);
                        self.collect_from(child as usize, level + 1, shift - bits, prefix, out);
                    }
                }
            }
            Node::Leaf(words) => {
                for (position, &word) in words.iter().enumerate() {
                    let mut remaining = word;
                    while remaining != 0 {
                        let bit = remaining.trailing_zeros();
                        remaining &= remaining - 1;
                        out.push(base | ((position as u32) << 6) | bit);
                    }
                }
            }
        }
    }
}

impl Default for CodePointSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<u32> for CodePointSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for cp in iter {
            self.add(cp);
        }
    }
}

impl FromIterator<u32> for CodePointSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
