// Suffix-tree match finder.
//
// The tree is built once per buffer with Ukkonen's online algorithm over the
// buffer bytes plus a unique terminal symbol, so every suffix ends in a leaf.
// Nodes live in an arena and refer to each other by `u32` index: children
// through first-child / next-sibling lists (the root additionally keeps a
// direct table), suffix links as plain indices.
//
// Every node is annotated with the smallest suffix start in its subtree. A
// query walks the tree along the suffix at the query position only while some
// occurrence starts early enough to be a copy source, which bounds the
// achievable length. The per-byte offset lists then supply the concrete
// window-eligible sources, nearest first, until one reaches that bound.

use log::debug;

use super::config::FindLimitations;
use super::{Match, match_length, order_matches, prepare_query, unit_length};
use crate::error::{Error, Result};

const NONE: u32 = u32::MAX;
const ROOT: u32 = 0;
/// Leaf edges run to the current end of the text.
const LEAF_END: u32 = u32::MAX;
/// Symbol appended after the last byte.
const TERMINAL: u16 = 256;
const ALPHABET: usize = 257;

#[derive(Debug, Clone, Copy)]
struct Node {
    /// Edge label start in `text`.
    start: u32,
    /// Edge label end (exclusive), `LEAF_END` for leaves.
    end: u32,
    link: u32,
    first_child: u32,
    next_sibling: u32,
    /// Smallest suffix start below this node.
    min_start: u32,
}

impl Node {
    const fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            link: ROOT,
            first_child: NONE,
            next_sibling: NONE,
            min_start: NONE,
        }
    }
}

/// Arena-backed suffix tree over a byte buffer.
#[derive(Debug)]
pub struct SuffixTree {
    text: Vec<u16>,
    nodes: Vec<Node>,
    root_children: Box<[u32; ALPHABET]>,
}

impl SuffixTree {
    /// Build the tree for `input`. Fails if the buffer does not fit `u32`
    /// indices.
    pub fn build(input: &[u8]) -> Result<Self> {
        if input.len() >= u32::MAX as usize - 1 {
            return Err(Error::InvalidOptions(format!(
                "buffer of {} bytes is too large for a suffix tree",
                input.len()
            )));
        }

        let mut text = Vec::with_capacity(input.len() + 1);
        text.extend(input.iter().map(|&b| b as u16));
        text.push(TERMINAL);

        let mut tree = Self {
            nodes: Vec::with_capacity(text.len() * 2),
            text,
            root_children: Box::new([NONE; ALPHABET]),
        };
        tree.nodes.push(Node::new(0, 0));
        tree.construct();
        tree.annotate_min_starts();
        Ok(tree)
    }

    /// Number of buffer bytes indexed (terminal excluded).
    pub fn len(&self) -> usize {
        self.text.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn construct(&mut self) {
        let n = self.text.len();
        let mut active_node = ROOT;
        let mut active_edge = 0usize;
        let mut active_length = 0usize;
        let mut remainder = 0usize;

        for i in 0..n {
            remainder += 1;
            let mut last_new = NONE;

            while remainder > 0 {
                if active_length == 0 {
                    active_edge = i;
                }
                let next = self.child(active_node, self.text[active_edge]);

                if next == NONE {
                    let leaf = self.push_node(i as u32, LEAF_END);
                    self.add_child(active_node, leaf);
                    if last_new != NONE {
                        self.nodes[last_new as usize].link = active_node;
                        last_new = NONE;
                    }
                } else {
                    let edge_len = self.edge_end(next, i + 1) - self.nodes[next as usize].start as usize;
                    if active_length >= edge_len {
                        // Walk down.
                        active_edge += edge_len;
                        active_length -= edge_len;
                        active_node = next;
                        continue;
                    }

                    let next_start = self.nodes[next as usize].start as usize;
                    if self.text[next_start + active_length] == self.text[i] {
                        // Already present; extend the active point.
                        if last_new != NONE && active_node != ROOT {
                            self.nodes[last_new as usize].link = active_node;
                        }
                        active_length += 1;
                        break;
                    }

                    // Split the edge.
                    let split = self.push_node(next_start as u32, (next_start + active_length) as u32);
                    self.replace_child(active_node, next, split);
                    let leaf = self.push_node(i as u32, LEAF_END);
                    self.add_child(split, leaf);
                    self.nodes[next as usize].start += active_length as u32;
                    self.add_child(split, next);

                    if last_new != NONE {
                        self.nodes[last_new as usize].link = split;
                    }
                    last_new = split;
                }

                remainder -= 1;
                if active_node == ROOT && active_length > 0 {
                    active_length -= 1;
                    active_edge = i + 1 - remainder;
                } else if active_node != ROOT {
                    active_node = self.nodes[active_node as usize].link;
                }
            }
        }
    }

    /// Post-order pass storing each subtree's smallest suffix start.
    fn annotate_min_starts(&mut self) {
        let n = self.text.len();
        // (node, string depth including its own edge, children pushed)
        let mut stack: Vec<(u32, usize, bool)> = vec![(ROOT, 0, false)];

        while let Some((node, depth, expanded)) = stack.pop() {
            let first = self.nodes[node as usize].first_child;
            if first == NONE {
                self.nodes[node as usize].min_start = (n - depth) as u32;
                continue;
            }
            if expanded {
                let mut min = NONE;
                let mut c = first;
                while c != NONE {
                    min = min.min(self.nodes[c as usize].min_start);
                    c = self.nodes[c as usize].next_sibling;
                }
                self.nodes[node as usize].min_start = min;
                continue;
            }

            stack.push((node, depth, true));
            let mut c = first;
            while c != NONE {
                let child = &self.nodes[c as usize];
                let edge = self.edge_end(c, n) - child.start as usize;
                stack.push((c, depth + edge, false));
                c = child.next_sibling;
            }
        }
    }

    /// Length of the longest prefix of the suffix at `position` (capped at
    /// `cap`) that also starts somewhere at or before `latest_start`.
    pub fn earlier_prefix_len(&self, position: usize, cap: usize, latest_start: usize) -> usize {
        let n = self.text.len();
        let mut node = ROOT;
        let mut depth = 0usize;

        while depth < cap {
            let c = self.child(node, self.text[position + depth]);
            if c == NONE || self.nodes[c as usize].min_start as usize > latest_start {
                break;
            }
            let start = self.nodes[c as usize].start as usize;
            let end = self.edge_end(c, n);
            for k in start..end {
                if depth == cap {
                    return depth;
                }
                if self.text[k] != self.text[position + depth] {
                    return depth;
                }
                depth += 1;
            }
            node = c;
        }
        depth
    }

    #[inline]
    fn edge_end(&self, node: u32, current_end: usize) -> usize {
        match self.nodes[node as usize].end {
            LEAF_END => current_end,
            end => end as usize,
        }
    }

    #[inline]
    fn child(&self, node: u32, symbol: u16) -> u32 {
        if node == ROOT {
            return self.root_children[symbol as usize];
        }
        let mut c = self.nodes[node as usize].first_child;
        while c != NONE {
            let child = &self.nodes[c as usize];
            if self.text[child.start as usize] == symbol {
                return c;
            }
            c = child.next_sibling;
        }
        NONE
    }

    fn push_node(&mut self, start: u32, end: u32) -> u32 {
        self.nodes.push(Node::new(start, end));
        (self.nodes.len() - 1) as u32
    }

    fn add_child(&mut self, parent: u32, child: u32) {
        self.nodes[child as usize].next_sibling = self.nodes[parent as usize].first_child;
        self.nodes[parent as usize].first_child = child;
        if parent == ROOT {
            let symbol = self.text[self.nodes[child as usize].start as usize];
            self.root_children[symbol as usize] = child;
        }
    }

    /// Put `new` in place of `old` in `parent`'s child list; `old` is detached.
    fn replace_child(&mut self, parent: u32, old: u32, new: u32) {
        self.nodes[new as usize].next_sibling = self.nodes[old as usize].next_sibling;
        self.nodes[old as usize].next_sibling = NONE;

        if self.nodes[parent as usize].first_child == old {
            self.nodes[parent as usize].first_child = new;
        } else {
            let mut c = self.nodes[parent as usize].first_child;
            while c != NONE {
                if self.nodes[c as usize].next_sibling == old {
                    self.nodes[c as usize].next_sibling = new;
                    break;
                }
                c = self.nodes[c as usize].next_sibling;
            }
        }
        if parent == ROOT {
            let symbol = self.text[self.nodes[new as usize].start as usize];
            self.root_children[symbol as usize] = new;
        }
    }
}

// ---------------------------------------------------------------------------
// Finder
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Index {
    tree: SuffixTree,
    /// Ascending positions of every byte value.
    offsets: Vec<Vec<u32>>,
}

impl Index {
    fn build(input: &[u8]) -> Result<Self> {
        let tree = SuffixTree::build(input)?;
        let mut offsets = vec![Vec::new(); 256];
        for (pos, &b) in input.iter().enumerate() {
            offsets[b as usize].push(pos as u32);
        }
        debug!(
            "suffix tree: indexed {} bytes into {} nodes",
            input.len(),
            tree.node_count()
        );
        Ok(Self { tree, offsets })
    }

    /// Window-eligible sources of the byte at `position`, nearest first.
    fn sources(&self, first: u8, lo: usize, hi: usize) -> impl Iterator<Item = usize> + '_ {
        let list = &self.offsets[first as usize];
        let end = list.partition_point(|&x| x as usize <= hi);
        list[..end]
            .iter()
            .rev()
            .map(|&x| x as usize)
            .take_while(move |&x| x >= lo)
    }
}

/// Finder backed by a suffix tree built once per buffer.
///
/// The index is built on the first query and kept for later queries. A query
/// on a buffer of a different length rebuilds it; reusing the finder for an
/// unrelated buffer of the same length requires [`reset`](Self::reset).
#[derive(Debug)]
pub struct SuffixTreeMatchFinder {
    limits: FindLimitations,
    index: Option<Index>,
}

impl SuffixTreeMatchFinder {
    pub fn new(limits: FindLimitations) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            limits,
            index: None,
        })
    }

    pub fn limitations(&self) -> &FindLimitations {
        &self.limits
    }

    pub fn reset(&mut self) {
        self.index = None;
    }

    fn index(&mut self, input: &[u8]) -> Result<&Index> {
        let index = match self.index.take() {
            Some(index) if index.tree.len() == input.len() => index,
            _ => Index::build(input)?,
        };
        Ok(self.index.insert(index))
    }

    pub fn find_longest_match(&mut self, input: &[u8], position: usize) -> Result<Option<Match>> {
        let limits = self.limits;
        let Some(q) = prepare_query(&limits, input, position)? else {
            return Ok(None);
        };
        let unit = limits.unit_size;
        let min_len = limits.min_length();
        let index = self.index(input)?;

        let bound = unit_length(unit, index.tree.earlier_prefix_len(position, q.cap, q.hi));
        if bound < min_len {
            return Ok(None);
        }

        let mut best: Option<Match> = None;
        for src in index.sources(input[position], q.lo, q.hi) {
            let disp = position - src;
            if !unit.is_aligned(disp) {
                continue;
            }
            let len = unit_length(unit, match_length(input, src, position, bound));
            if len >= min_len && best.is_none_or(|b| len > b.length) {
                best = Some(Match::new(position, disp, len));
                if len == bound {
                    break;
                }
            }
        }
        Ok(best)
    }

    pub fn find_all_matches(
        &mut self,
        input: &[u8],
        position: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Match>> {
        let limits = self.limits;
        let Some(q) = prepare_query(&limits, input, position)? else {
            return Ok(Vec::new());
        };
        let unit = limits.unit_size;
        let min_len = limits.min_length();
        let index = self.index(input)?;

        let bound = unit_length(unit, index.tree.earlier_prefix_len(position, q.cap, q.hi));
        if bound < min_len {
            return Ok(Vec::new());
        }

        let mut matches: Vec<Match> = index
            .sources(input[position], q.lo, q.hi)
            .filter(|&src| unit.is_aligned(position - src))
            .filter_map(|src| {
                let len = unit_length(unit, match_length(input, src, position, bound));
                (len >= min_len).then(|| Match::new(position, position - src, len))
            })
            .collect();
        order_matches(&mut matches, limit);
        Ok(matches)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_starts(tree: &SuffixTree) -> Vec<usize> {
        let n = tree.text.len();
        let mut starts = Vec::new();
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let mut c = tree.nodes[node as usize].first_child;
            if c == NONE {
                starts.push(n - depth);
            }
            while c != NONE {
                let edge = tree.edge_end(c, n) - tree.nodes[c as usize].start as usize;
                stack.push((c, depth + edge));
                c = tree.nodes[c as usize].next_sibling;
            }
        }
        starts.sort_unstable();
        starts
    }

    #[test]
    fn every_suffix_is_a_leaf() {
        for input in [&b""[..], b"a", b"banana", b"mississippi", b"aaaaaaaa", b"abcabxabcd"] {
            let tree = SuffixTree::build(input).unwrap();
            assert_eq!(
                leaf_starts(&tree),
                (0..=input.len()).collect::<Vec<_>>(),
                "input {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn node_count_is_linear() {
        let input: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 13) as u8).collect();
        let tree = SuffixTree::build(&input).unwrap();
        assert!(tree.node_count() <= 2 * (input.len() + 1));
    }

    #[test]
    fn earlier_prefix_bound() {
        let tree = SuffixTree::build(b"abcabcabc").unwrap();
        // "abcabc" at 3 occurs at 0.
        assert_eq!(tree.earlier_prefix_len(3, 6, 2), 6);
        // "abc" at 6 occurs at 0 and 3.
        assert_eq!(tree.earlier_prefix_len(6, 3, 5), 3);
        // Only sources at or before 0 allowed for "bcabc..." at 4: starts at 1, so none.
        assert_eq!(tree.earlier_prefix_len(4, 5, 0), 0);
    }

    #[test]
    fn abcabc_scenario() {
        let limits = FindLimitations::new(2, 0, 1, 255).unwrap();
        let mut finder = SuffixTreeMatchFinder::new(limits).unwrap();
        let m = finder.find_longest_match(b"ABCABCABC", 3).unwrap().unwrap();
        assert_eq!(m, Match::new(3, 3, 6));

        let all = finder.find_all_matches(b"ABCABCABC", 6, None).unwrap();
        assert_eq!(all, vec![Match::new(6, 3, 3), Match::new(6, 6, 3)]);
    }

    #[test]
    fn run_of_one_byte_uses_displacement_one() {
        let limits = FindLimitations::new(3, 255, 1, 255).unwrap();
        let mut finder = SuffixTreeMatchFinder::new(limits).unwrap();
        let m = finder.find_longest_match(b"AAAAAAAAAA", 1).unwrap();
        assert_eq!(m, Some(Match::new(1, 1, 9)));
    }

    #[test]
    fn window_excludes_far_sources() {
        let limits = FindLimitations::new(3, 0, 1, 4).unwrap();
        let mut finder = SuffixTreeMatchFinder::new(limits).unwrap();
        assert_eq!(finder.find_longest_match(b"xyz12345xyz", 8).unwrap(), None);
    }

    #[test]
    fn min_displacement_respected() {
        let limits = FindLimitations::new(3, 0, 3, 0).unwrap();
        let mut finder = SuffixTreeMatchFinder::new(limits).unwrap();
        let m = finder.find_longest_match(b"aaaaaaaa", 3).unwrap().unwrap();
        assert_eq!(m.displacement, 3);
        assert_eq!(m.length, 5);
    }

    #[test]
    fn rebuilds_for_new_length() {
        let limits = FindLimitations::new(3, 0, 1, 0).unwrap();
        let mut finder = SuffixTreeMatchFinder::new(limits).unwrap();
        assert!(finder.find_longest_match(b"abcd", 0).unwrap().is_none());
        let m = finder.find_longest_match(b"abcdabcd", 4).unwrap();
        assert_eq!(m, Some(Match::new(4, 4, 4)));
    }
}
