// Hash-chain (history) match finder.
//
// Every position is hashed on its first key bytes (up to four) and linked to
// the previous position in the same bucket. Unlike a streaming hash table the
// `prev` array has one slot per position, so chains never go stale and the
// index can be queried in any order once built.
//
// Both arrays store `pos + CHAIN_OFFSET` so that 0 means "empty".

use log::debug;

use super::config::FindLimitations;
use super::{Match, match_length, order_matches, prepare_query, unit_length};
use crate::error::{Error, Result};

const CHAIN_OFFSET: u32 = 1;

/// Multiplier of the small-key hash (golden-ratio constant).
const HASH_MULT: u32 = 0x9E37_79B1;

/// Widest key hashed per position.
const MAX_KEY: usize = 4;

// ---------------------------------------------------------------------------
// Chain table
// ---------------------------------------------------------------------------

/// Bucket heads plus one back link per indexed position.
#[derive(Debug)]
pub struct ChainTable {
    /// `head[bucket] = pos + CHAIN_OFFSET` of the newest entry, or 0.
    head: Vec<u32>,
    /// `prev[pos] = older_pos + CHAIN_OFFSET`, or 0 at the end of a chain.
    prev: Vec<u32>,
    shift: u32,
}

impl ChainTable {
    /// Table for `len` positions; the bucket count is the next power of two.
    pub fn new(len: usize) -> Self {
        let bits = len.max(16).next_power_of_two().trailing_zeros().min(24);
        Self {
            head: vec![0; 1 << bits],
            prev: vec![0; len],
            shift: 32 - bits,
        }
    }

    #[inline(always)]
    fn bucket(&self, key: &[u8]) -> usize {
        let mut word = [0u8; MAX_KEY];
        word[..key.len()].copy_from_slice(key);
        (u32::from_le_bytes(word).wrapping_mul(HASH_MULT) >> self.shift) as usize
    }

    /// Link `pos` behind the newest entry sharing its key's bucket.
    #[inline]
    pub fn insert(&mut self, key: &[u8], pos: usize) {
        let bucket = self.bucket(key);
        self.prev[pos] = self.head[bucket];
        self.head[bucket] = pos as u32 + CHAIN_OFFSET;
    }

    /// Previous entry in the chain of `pos`.
    #[inline]
    pub fn chain_prev(&self, pos: usize) -> Option<usize> {
        match self.prev[pos] {
            0 => None,
            v => Some((v - CHAIN_OFFSET) as usize),
        }
    }

    /// Number of indexed positions.
    pub fn len(&self) -> usize {
        self.prev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prev.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Finder
// ---------------------------------------------------------------------------

/// Finder walking hash chains of earlier positions.
///
/// The index is built once per buffer on the first query. As with the suffix
/// tree, a buffer of a new length triggers a rebuild, and an unrelated buffer
/// of the same length needs [`reset`](Self::reset) first.
#[derive(Debug)]
pub struct HashChainMatchFinder {
    limits: FindLimitations,
    /// Chain links followed per query (0 = whole window).
    max_chain: usize,
    table: Option<ChainTable>,
}

impl HashChainMatchFinder {
    pub fn new(limits: FindLimitations) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            limits,
            max_chain: 0,
            table: None,
        })
    }

    /// Bound the links followed per query, trading ratio for speed.
    pub fn with_max_chain(mut self, max_chain: usize) -> Self {
        self.max_chain = max_chain;
        self
    }

    pub fn limitations(&self) -> &FindLimitations {
        &self.limits
    }

    pub fn reset(&mut self) {
        self.table = None;
    }

    fn key_len(&self) -> usize {
        self.limits.min_length().min(MAX_KEY)
    }

    fn table(&mut self, input: &[u8]) -> Result<&ChainTable> {
        if input.len() >= u32::MAX as usize {
            return Err(Error::InvalidOptions(format!(
                "buffer of {} bytes is too large for a hash chain",
                input.len()
            )));
        }
        let key = self.key_len();
        let table = match self.table.take() {
            Some(table) if table.len() == input.len() => table,
            _ => {
                let mut table = ChainTable::new(input.len());
                if input.len() >= key {
                    for pos in 0..=input.len() - key {
                        table.insert(&input[pos..pos + key], pos);
                    }
                }
                debug!("hash chain: indexed {} positions", input.len());
                table
            }
        };
        Ok(self.table.insert(table))
    }

    /// Walk the chain of `position` through the window, calling `visit` with
    /// each unit-aligned source and its match length until it returns false.
    fn walk(
        &mut self,
        input: &[u8],
        position: usize,
        mut visit: impl FnMut(usize, usize) -> bool,
    ) -> Result<()> {
        let limits = self.limits;
        let Some(q) = prepare_query(&limits, input, position)? else {
            return Ok(());
        };
        let unit = limits.unit_size;
        let min_len = limits.min_length();
        let max_chain = self.max_chain;
        let table = self.table(input)?;

        let mut links = 0usize;
        let mut cursor = table.chain_prev(position);
        while let Some(src) = cursor {
            if src < q.lo {
                break;
            }
            if src <= q.hi && unit.is_aligned(position - src) {
                let len = unit_length(unit, match_length(input, src, position, q.cap));
                if len >= min_len && !visit(src, len) {
                    break;
                }
            }
            links += 1;
            if max_chain != 0 && links >= max_chain {
                break;
            }
            cursor = table.chain_prev(src);
        }
        Ok(())
    }

    pub fn find_longest_match(&mut self, input: &[u8], position: usize) -> Result<Option<Match>> {
        let cap = if position < input.len() {
            self.limits.length_cap(position, input.len())
        } else {
            0
        };
        let mut best: Option<Match> = None;
        self.walk(input, position, |src, len| {
            if best.is_none_or(|b| len > b.length) {
                best = Some(Match::new(position, position - src, len));
            }
            len < cap
        })?;
        Ok(best)
    }

    pub fn find_all_matches(
        &mut self,
        input: &[u8],
        position: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Match>> {
        let mut matches = Vec::new();
        self.walk(input, position, |src, len| {
            matches.push(Match::new(position, position - src, len));
            true
        })?;
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

    #[test]
    fn chain_links_same_key() {
        let mut t = ChainTable::new(64);
        t.insert(b"abc", 10);
        t.insert(b"abc", 50);
        assert_eq!(t.chain_prev(50), Some(10));
        assert_eq!(t.chain_prev(10), None);
    }

    #[test]
    fn empty_slots_read_as_none() {
        let t = ChainTable::new(8);
        assert!((0..8).all(|p| t.chain_prev(p).is_none()));
    }

    #[test]
    fn nearest_of_equal_length_wins() {
        let limits = FindLimitations::new(3, 0, 1, 0).unwrap();
        let mut f = HashChainMatchFinder::new(limits).unwrap();
        let input = b"abc-abc-abc";
        assert_eq!(
            f.find_longest_match(input, 8).unwrap(),
            Some(Match::new(8, 4, 3))
        );
        let all = f.find_all_matches(input, 8, None).unwrap();
        assert_eq!(all, vec![Match::new(8, 4, 3), Match::new(8, 8, 3)]);
    }

    #[test]
    fn chain_depth_limits_search() {
        let limits = FindLimitations::new(3, 0, 1, 0).unwrap();
        let mut f = HashChainMatchFinder::new(limits).unwrap().with_max_chain(1);
        // Nearest "abc" is short, the longer one is two links away.
        let input = b"abcdefg_abc_abcdefg";
        let m = f.find_longest_match(input, 12).unwrap().unwrap();
        assert_eq!(m, Match::new(12, 4, 3));

        let mut f = HashChainMatchFinder::new(limits).unwrap();
        let m = f.find_longest_match(input, 12).unwrap().unwrap();
        assert_eq!(m, Match::new(12, 12, 7));
    }

    #[test]
    fn window_stops_walk() {
        let limits = FindLimitations::new(3, 0, 1, 5).unwrap();
        let mut f = HashChainMatchFinder::new(limits).unwrap();
        assert_eq!(f.find_longest_match(b"abc123456abc", 9).unwrap(), None);
    }
}
