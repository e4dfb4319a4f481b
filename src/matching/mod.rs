// Match finding for LZ-family encoders.
//
// This module provides:
// - The `Match` value shared by finders, parsers and codecs
// - Find limitations, parse options and per-format presets (`config`)
// - Three finder strategies behind the closed `MatchFinder` enum:
//     suffix tree (build-once index), needle/haystack (stateless
//     bad-character search) and hash chain (build-once history index)

pub mod chain;
pub mod config;
pub mod needle;
pub mod suffix_tree;

use crate::error::{Error, Result};

use self::chain::HashChainMatchFinder;
use self::config::{FindLimitations, UnitSize};
use self::needle::NeedleHaystackMatchFinder;
use self::suffix_tree::SuffixTreeMatchFinder;

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// One repeat occurrence: `length` units at `position` equal the units
/// starting `displacement` units earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
    /// Start of the repeated run.
    pub position: usize,
    /// Distance back to the source of the copy (> 0).
    pub displacement: usize,
    /// Number of bytes covered.
    pub length: usize,
}

impl Match {
    pub const fn new(position: usize, displacement: usize, length: usize) -> Self {
        Self {
            position,
            displacement,
            length,
        }
    }

    /// One past the last covered position.
    #[inline]
    pub const fn end(&self) -> usize {
        self.position + self.length
    }

    /// Longer wins; equal lengths prefer the nearer source.
    #[inline]
    pub(crate) fn is_better_than(&self, other: &Match) -> bool {
        self.length > other.length
            || (self.length == other.length && self.displacement < other.displacement)
    }
}

/// Order matches by decreasing length, then increasing displacement, and
/// keep at most `limit` of them.
pub(crate) fn order_matches(matches: &mut Vec<Match>, limit: Option<usize>) {
    matches.sort_by(|a, b| {
        b.length
            .cmp(&a.length)
            .then(a.displacement.cmp(&b.displacement))
    });
    if let Some(limit) = limit {
        matches.truncate(limit);
    }
}

/// Number of equal bytes at `source` and `position`, up to `cap`.
///
/// The source run may overlap the target run (`source + n > position`),
/// which is how a copy with `displacement < length` replicates a period.
#[inline]
pub(crate) fn match_length(input: &[u8], source: usize, position: usize, cap: usize) -> usize {
    input[source..]
        .iter()
        .zip(&input[position..position + cap])
        .take_while(|(a, b)| a == b)
        .count()
}

/// A validated query: the length cap and the inclusive source window.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Query {
    pub position: usize,
    pub cap: usize,
    pub lo: usize,
    pub hi: usize,
}

/// Validate a finder query. `Ok(None)` means no match can exist at all.
pub(crate) fn prepare_query(
    limits: &FindLimitations,
    input: &[u8],
    position: usize,
) -> Result<Option<Query>> {
    if position >= input.len() {
        return Err(Error::PositionOutOfRange {
            position,
            len: input.len(),
        });
    }
    let unit = limits.unit_size;
    if !unit.is_aligned(position) {
        return Err(Error::MisalignedPosition {
            position,
            unit: unit.bytes(),
        });
    }

    let cap = limits.length_cap(position, input.len());
    if cap < limits.min_length() {
        return Ok(None);
    }
    Ok(limits.window(position).map(|(lo, hi)| Query {
        position,
        cap,
        lo,
        hi,
    }))
}

/// Turn a raw common-prefix length into a reportable one.
#[inline]
pub(crate) fn unit_length(unit: UnitSize, raw: usize) -> usize {
    unit.round_down(raw)
}

// ---------------------------------------------------------------------------
// Finder strategies
// ---------------------------------------------------------------------------

/// Which finder strategy to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinderKind {
    #[default]
    SuffixTree,
    NeedleHaystack,
    HashChain,
}

impl FinderKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::SuffixTree => "suffix-tree",
            Self::NeedleHaystack => "needle-haystack",
            Self::HashChain => "hash-chain",
        }
    }
}

/// A match finder. The strategy set is closed; dispatch is a `match`.
#[derive(Debug)]
pub enum MatchFinder {
    SuffixTree(SuffixTreeMatchFinder),
    NeedleHaystack(NeedleHaystackMatchFinder),
    HashChain(HashChainMatchFinder),
}

impl MatchFinder {
    /// Build a finder of `kind` for `limits`.
    pub fn new(kind: FinderKind, limits: FindLimitations) -> Result<Self> {
        Ok(match kind {
            FinderKind::SuffixTree => Self::SuffixTree(SuffixTreeMatchFinder::new(limits)?),
            FinderKind::NeedleHaystack => {
                Self::NeedleHaystack(NeedleHaystackMatchFinder::new(limits)?)
            }
            FinderKind::HashChain => Self::HashChain(HashChainMatchFinder::new(limits)?),
        })
    }

    pub fn kind(&self) -> FinderKind {
        match self {
            Self::SuffixTree(_) => FinderKind::SuffixTree,
            Self::NeedleHaystack(_) => FinderKind::NeedleHaystack,
            Self::HashChain(_) => FinderKind::HashChain,
        }
    }

    pub fn limitations(&self) -> &FindLimitations {
        match self {
            Self::SuffixTree(f) => f.limitations(),
            Self::NeedleHaystack(f) => f.limitations(),
            Self::HashChain(f) => f.limitations(),
        }
    }

    pub fn unit_size(&self) -> UnitSize {
        self.limitations().unit_size
    }

    /// Longest match at `position`; ties go to the smallest displacement.
    pub fn find_longest_match(&mut self, input: &[u8], position: usize) -> Result<Option<Match>> {
        match self {
            Self::SuffixTree(f) => f.find_longest_match(input, position),
            Self::NeedleHaystack(f) => f.find_longest_match(input, position),
            Self::HashChain(f) => f.find_longest_match(input, position),
        }
    }

    /// Every match at `position`, longest first, at most `limit`.
    pub fn find_all_matches(
        &mut self,
        input: &[u8],
        position: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Match>> {
        match self {
            Self::SuffixTree(f) => f.find_all_matches(input, position, limit),
            Self::NeedleHaystack(f) => f.find_all_matches(input, position, limit),
            Self::HashChain(f) => f.find_all_matches(input, position, limit),
        }
    }

    /// Drop any index built for a previous buffer. Safe to call repeatedly.
    pub fn reset(&mut self) {
        match self {
            Self::SuffixTree(f) => f.reset(),
            Self::NeedleHaystack(f) => f.reset(),
            Self::HashChain(f) => f.reset(),
        }
    }
}

impl From<SuffixTreeMatchFinder> for MatchFinder {
    fn from(f: SuffixTreeMatchFinder) -> Self {
        Self::SuffixTree(f)
    }
}

impl From<NeedleHaystackMatchFinder> for MatchFinder {
    fn from(f: NeedleHaystackMatchFinder) -> Self {
        Self::NeedleHaystack(f)
    }
}

impl From<HashChainMatchFinder> for MatchFinder {
    fn from(f: HashChainMatchFinder) -> Self {
        Self::HashChain(f)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [FinderKind; 3] = [
        FinderKind::SuffixTree,
        FinderKind::NeedleHaystack,
        FinderKind::HashChain,
    ];

    fn brute_longest(input: &[u8], pos: usize, limits: &FindLimitations) -> Option<Match> {
        let q = prepare_query(limits, input, pos).unwrap()?;
        let mut best: Option<Match> = None;
        for src in (q.lo..=q.hi).rev() {
            let disp = pos - src;
            if !limits.unit_size.is_aligned(disp) {
                continue;
            }
            let len = unit_length(limits.unit_size, match_length(input, src, pos, q.cap));
            if len < limits.min_length() {
                continue;
            }
            let m = Match::new(pos, disp, len);
            if best.is_none_or(|b| m.is_better_than(&b)) {
                best = Some(m);
            }
        }
        best
    }

    #[test]
    fn all_finders_agree_with_brute_force() {
        let input = b"abracadabra abracadabra cadabra bra bracket abracadabra!!!!!!!!";
        let limits = FindLimitations::new(2, 12, 1, 24).unwrap();
        for kind in KINDS {
            let mut finder = MatchFinder::new(kind, limits).unwrap();
            for pos in 0..input.len() {
                let got = finder.find_longest_match(input, pos).unwrap();
                let want = brute_longest(input, pos, &limits);
                if kind == FinderKind::HashChain {
                    // The chain keys on min_length bytes, so it finds the same
                    // length; displacement may only differ when lengths tie.
                    assert_eq!(
                        got.map(|m| m.length),
                        want.map(|m| m.length),
                        "{} at {pos}",
                        kind.name()
                    );
                } else {
                    assert_eq!(got, want, "{} at {pos}", kind.name());
                }
            }
        }
    }

    #[test]
    fn short_units_agree_with_brute_force() {
        let input = b"\x01\x02\x01\x02\x01\x02\x03\x04\x01\x02\x01\x02\x03\x04\x05\x01\x02\x01";
        let limits = FindLimitations::new(2, 0, 1, 0)
            .unwrap()
            .with_unit_size(UnitSize::Short);
        for kind in KINDS {
            let mut finder = MatchFinder::new(kind, limits).unwrap();
            for pos in (0..input.len()).step_by(2) {
                let got = finder.find_longest_match(input, pos).unwrap();
                let want = brute_longest(input, pos, &limits);
                assert_eq!(
                    got.map(|m| m.length),
                    want.map(|m| m.length),
                    "{} at {pos}",
                    kind.name()
                );
                if let Some(m) = got {
                    assert_eq!(m.length % 2, 0);
                    assert_eq!(m.displacement % 2, 0);
                }
            }
        }
    }

    #[test]
    fn out_of_range_and_misaligned_rejected() {
        let limits = FindLimitations::new(2, 0, 1, 0)
            .unwrap()
            .with_unit_size(UnitSize::Short);
        for kind in KINDS {
            let mut finder = MatchFinder::new(kind, limits).unwrap();
            assert!(matches!(
                finder.find_longest_match(b"abcd", 4),
                Err(Error::PositionOutOfRange { .. })
            ));
            assert!(matches!(
                finder.find_all_matches(b"abcd", 1, None),
                Err(Error::MisalignedPosition { .. })
            ));
        }
    }

    #[test]
    fn not_enough_data_left() {
        let limits = FindLimitations::new(3, 0, 1, 0).unwrap();
        for kind in KINDS {
            let mut finder = MatchFinder::new(kind, limits).unwrap();
            assert_eq!(finder.find_longest_match(b"aaaaa", 3).unwrap(), None);
            assert!(finder.find_all_matches(b"aaaaa", 4, None).unwrap().is_empty());
        }
    }

    #[test]
    fn order_matches_sorts_and_limits() {
        let mut v = vec![
            Match::new(9, 5, 3),
            Match::new(9, 2, 4),
            Match::new(9, 1, 3),
            Match::new(9, 7, 6),
        ];
        order_matches(&mut v, Some(3));
        assert_eq!(
            v,
            vec![Match::new(9, 7, 6), Match::new(9, 2, 4), Match::new(9, 1, 3)]
        );
    }

    #[test]
    fn reset_is_idempotent() {
        let limits = FindLimitations::new(3, 0, 1, 0).unwrap();
        for kind in KINDS {
            let mut finder = MatchFinder::new(kind, limits).unwrap();
            finder.reset();
            finder.reset();
            let m = finder.find_longest_match(b"abcabc", 3).unwrap();
            assert_eq!(m, Some(Match::new(3, 3, 3)));
            finder.reset();
            finder.reset();
            assert_eq!(finder.find_longest_match(b"xyzxyz", 3).unwrap(), m);
        }
    }
}
