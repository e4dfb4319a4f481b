// Needle/haystack match finder.
//
// No persistent index: every query treats the units at the query position as
// a needle and the window as a haystack. The haystack is scanned from the
// nearest source backwards with a reverse Horspool search; on a mismatch the
// byte under the leftmost needle slot picks the shift from the bad-character
// table. The table is rebuilt whenever the needle changes.

use super::config::{FindLimitations, UnitSize};
use super::{Match, match_length, order_matches, prepare_query, unit_length};
use crate::error::Result;

/// Stateless-per-call finder using a bad-character heuristic.
///
/// The only state is the shift table, which every search overwrites, so the
/// finder can be reused on any buffer without [`reset`](Self::reset).
#[derive(Debug)]
pub struct NeedleHaystackMatchFinder {
    limits: FindLimitations,
    /// `shift[c]`: smallest `s >= 1` with `needle[s] == c`, else the needle length.
    shift: Box<[usize; 256]>,
}

impl NeedleHaystackMatchFinder {
    pub fn new(limits: FindLimitations) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            limits,
            shift: Box::new([0; 256]),
        })
    }

    pub fn limitations(&self) -> &FindLimitations {
        &self.limits
    }

    pub fn reset(&mut self) {
        self.shift.fill(0);
    }

    fn build_table(&mut self, needle: &[u8]) {
        let len = needle.len();
        self.shift.fill(len);
        for s in (1..len).rev() {
            self.shift[needle[s] as usize] = s;
        }
    }

    /// Nearest source in `lo..=start` whose next `len` bytes equal the needle
    /// at `position` and whose displacement is unit-aligned.
    fn search(
        &self,
        input: &[u8],
        position: usize,
        len: usize,
        start: usize,
        lo: usize,
        unit: UnitSize,
    ) -> Option<usize> {
        let needle = &input[position..position + len];
        let mut q = start;
        loop {
            let step = if &input[q..q + len] == needle {
                if unit.is_aligned(position - q) {
                    return Some(q);
                }
                1
            } else {
                self.shift[input[q] as usize]
            };
            if q < lo + step {
                return None;
            }
            q -= step;
        }
    }

    pub fn find_longest_match(&mut self, input: &[u8], position: usize) -> Result<Option<Match>> {
        let limits = self.limits;
        let Some(q) = prepare_query(&limits, input, position)? else {
            return Ok(None);
        };
        let unit = limits.unit_size;

        let mut best: Option<Match> = None;
        let mut needle_len = limits.min_length();
        let mut start = q.hi;

        // Grow the needle past every match found; sources nearer than the
        // last hit already failed a shorter needle.
        while needle_len <= q.cap {
            self.build_table(&input[position..position + needle_len]);
            let Some(src) = self.search(input, position, needle_len, start, q.lo, unit) else {
                break;
            };
            let len = unit_length(unit, match_length(input, src, position, q.cap));
            best = Some(Match::new(position, position - src, len));
            if len == q.cap || src == q.lo {
                break;
            }
            needle_len = len + unit.bytes();
            start = src - 1;
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
        let needle_len = limits.min_length();
        self.build_table(&input[position..position + needle_len]);

        let mut matches = Vec::new();
        let mut start = q.hi;
        while let Some(src) = self.search(input, position, needle_len, start, q.lo, unit) {
            let len = unit_length(unit, match_length(input, src, position, q.cap));
            matches.push(Match::new(position, position - src, len));
            if src == q.lo {
                break;
            }
            start = src - 1;
        }
        order_matches(&mut matches, limit);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_character_table() {
        let mut f = NeedleHaystackMatchFinder::new(FindLimitations::new(1, 0, 1, 0).unwrap()).unwrap();
        f.build_table(b"abcab");
        assert_eq!(f.shift[b'a' as usize], 3);
        assert_eq!(f.shift[b'b' as usize], 1);
        assert_eq!(f.shift[b'c' as usize], 2);
        assert_eq!(f.shift[b'z' as usize], 5);
    }

    #[test]
    fn random_bytes_have_no_match() {
        let limits = FindLimitations::new(3, 0, 1, 0).unwrap();
        let mut f = NeedleHaystackMatchFinder::new(limits).unwrap();
        let input = [0x13, 0x9a, 0x44, 0xe0];
        for pos in 0..input.len() {
            assert_eq!(f.find_longest_match(&input, pos).unwrap(), None);
        }
    }

    #[test]
    fn grows_needle_to_farther_longer_match() {
        let limits = FindLimitations::new(3, 0, 1, 0).unwrap();
        let mut f = NeedleHaystackMatchFinder::new(limits).unwrap();
        // "abcdef" at 0, "abcx" at 7, query "abcdef" at 12.
        let input = b"abcdef_abcx_abcdef";
        let m = f.find_longest_match(input, 12).unwrap().unwrap();
        assert_eq!(m, Match::new(12, 12, 6));
    }

    #[test]
    fn all_occurrences_collected() {
        let limits = FindLimitations::new(2, 0, 1, 0).unwrap();
        let mut f = NeedleHaystackMatchFinder::new(limits).unwrap();
        let input = b"ABCABCABC";
        let all = f.find_all_matches(input, 6, None).unwrap();
        assert_eq!(all, vec![Match::new(6, 3, 3), Match::new(6, 6, 3)]);
        let capped = f.find_all_matches(input, 6, Some(1)).unwrap();
        assert_eq!(capped, vec![Match::new(6, 3, 3)]);
    }

    #[test]
    fn max_length_truncates() {
        let limits = FindLimitations::new(3, 5, 1, 0).unwrap();
        let mut f = NeedleHaystackMatchFinder::new(limits).unwrap();
        let m = f.find_longest_match(b"AAAAAAAAAA", 1).unwrap().unwrap();
        assert_eq!(m, Match::new(1, 1, 5));
    }

    #[test]
    fn close_sources_rejected_by_min_displacement() {
        let limits = FindLimitations::new(3, 0, 4, 0).unwrap();
        let mut f = NeedleHaystackMatchFinder::new(limits).unwrap();
        assert_eq!(f.find_longest_match(b"aaaaaa", 3).unwrap(), None);
        let m = f.find_longest_match(b"aaaaaaaa", 4).unwrap().unwrap();
        assert_eq!(m.displacement, 4);
    }

    #[test]
    fn odd_displacements_skipped_for_short_units() {
        let limits = FindLimitations::new(2, 0, 1, 0)
            .unwrap()
            .with_unit_size(UnitSize::Short);
        let mut f = NeedleHaystackMatchFinder::new(limits).unwrap();
        // "xy" at 1 (odd distance 3 from 4) and at 0 is "zx".
        let input = b"zxyzxy";
        assert_eq!(f.find_longest_match(input, 4).unwrap(), None);
        let input = b"xyzwxy";
        assert_eq!(
            f.find_longest_match(input, 4).unwrap(),
            Some(Match::new(4, 4, 2))
        );
    }
}
