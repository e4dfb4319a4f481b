// Greedy parsing with a one-unit lookahead.
//
// At every position the longest match wins, unless the match one unit ahead
// is longer by more than one unit; then the current unit becomes a literal
// and the lookahead match is taken instead.

use log::trace;

use super::longest_match;
use crate::error::Result;
use crate::matching::config::FindOptions;
use crate::matching::{Match, MatchFinder};

pub(crate) fn parse(
    finders: &mut [MatchFinder],
    data: &[u8],
    start: usize,
    options: &FindOptions,
) -> Result<Vec<Match>> {
    let unit = options.unit_size.bytes();
    let skip = options.skip_bytes();
    let mut matches = Vec::new();
    let mut pos = start;

    while pos < data.len() {
        let Some(mut m) = longest_match(finders, data, pos)? else {
            pos += unit;
            continue;
        };

        let ahead_pos = pos + unit;
        if ahead_pos < data.len()
            && let Some(ahead) = longest_match(finders, data, ahead_pos)?
            && m.length + unit < ahead.length
        {
            trace!(
                "greedy: deferring {}-unit match at {pos} for {} units at {ahead_pos}",
                m.length,
                ahead.length
            );
            m = ahead;
        }

        pos = m.end() + skip;
        matches.push(m);
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::FinderKind;
    use crate::matching::config::FindLimitations;

    fn finders(kind: FinderKind) -> Vec<MatchFinder> {
        let limits = FindLimitations::new(3, 255, 1, 255).unwrap();
        vec![MatchFinder::new(kind, limits).unwrap()]
    }

    #[test]
    fn single_run_after_one_literal() {
        let mut f = finders(FinderKind::SuffixTree);
        let m = parse(&mut f, b"AAAAAAAAAA", 0, &FindOptions::default()).unwrap();
        assert_eq!(m, vec![Match::new(1, 1, 9)]);
    }

    #[test]
    fn defers_to_longer_match_one_unit_ahead() {
        // "zab" repeats at 11 (3 units), "abcdefg" repeats at 12 (7 units).
        let input = b"zababcdefg-zabcdefg";
        for kind in [
            FinderKind::SuffixTree,
            FinderKind::NeedleHaystack,
            FinderKind::HashChain,
        ] {
            let mut f = finders(kind);
            let m = parse(&mut f, input, 0, &FindOptions::default()).unwrap();
            assert_eq!(m, vec![Match::new(12, 9, 7)], "{}", kind.name());
        }
    }

    #[test]
    fn keeps_current_match_when_ahead_is_only_one_longer() {
        // At 8 "abc" (3) is available, at 9 "bcd" reaches 4: not enough.
        let input = b"abcxbcdyabcdy";
        let mut f = finders(FinderKind::SuffixTree);
        let m = parse(&mut f, input, 0, &FindOptions::default()).unwrap();
        assert_eq!(m.first(), Some(&Match::new(8, 8, 3)));
    }

    #[test]
    fn skip_units_leave_literals_after_matches() {
        let mut f = finders(FinderKind::SuffixTree);
        let opts = FindOptions::default().with_skip_units(2);
        let m = parse(&mut f, b"abcabcabcabcabc", 0, &opts).unwrap();
        assert_eq!(m[0], Match::new(3, 3, 12));

        let m = parse(&mut f, b"abcabcXYabcabcXY", 0, &opts).unwrap();
        for pair in m.windows(2) {
            assert!(pair[1].position >= pair[0].end() + 2);
        }
    }
}
