// Price-driven optimal parsing.
//
// The backward pass fills one `PriceEntry` per unit-aligned working position
// with the cheapest way to encode everything from there to the end: either a
// literal unit or a match of any length from the finder's minimum up to the
// longest match found there. The forward pass then follows the chosen
// entries from the first input unit.
//
// Two variants differ only in when the finders are queried:
//   - `Precomputed` collects every position's longest matches in ascending
//     order before the backward pass;
//   - `Interleaved` queries each position inside the backward pass.

use log::{debug, trace as log_trace};

use crate::error::Result;
use crate::matching::config::FindOptions;
use crate::matching::{Match, MatchFinder};
use crate::price::PriceCalculator;

/// Cheapest known encoding from one position to the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceEntry {
    /// Encode a literal unit here rather than a match.
    pub is_literal: bool,
    /// Match length in bytes (0 for literals).
    pub length: usize,
    /// Match displacement in bytes (0 for literals).
    pub displacement: usize,
    /// Total price from this position to the end.
    pub price: u64,
}

impl Default for PriceEntry {
    fn default() -> Self {
        Self {
            is_literal: true,
            length: 0,
            displacement: 0,
            price: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchSource {
    Precomputed,
    Interleaved,
}

/// Longest match of every finder at one position, with that finder's
/// minimum length.
fn candidates(
    finders: &mut [MatchFinder],
    data: &[u8],
    position: usize,
) -> Result<Vec<(Match, usize)>> {
    let mut found = Vec::with_capacity(finders.len());
    for finder in finders.iter_mut() {
        if let Some(m) = finder.find_longest_match(data, position)? {
            found.push((m, finder.limitations().min_length()));
        }
    }
    Ok(found)
}

/// Fill the price table for `data[start..]`. The table has `data.len() + 1`
/// entries; the last one is the zero-cost end, entries before `start` and at
/// unaligned positions stay at their defaults.
pub(crate) fn build_price_table(
    finders: &mut [MatchFinder],
    data: &[u8],
    start: usize,
    options: &FindOptions,
    price: &dyn PriceCalculator,
    source: MatchSource,
) -> Result<Vec<PriceEntry>> {
    let n = data.len();
    let unit = options.unit_size.bytes();
    let skip = options.skip_bytes();

    // literal_sum[k] = price of data[..k] as literals.
    let mut literal_sum = Vec::with_capacity(n + 1);
    literal_sum.push(0u64);
    let mut acc = 0u64;
    for &b in data {
        acc += u64::from(price.literal_price(b));
        literal_sum.push(acc);
    }

    let mut precomputed = match source {
        MatchSource::Precomputed => {
            let mut all = Vec::with_capacity((n - start.min(n)).div_ceil(unit));
            for pos in (start..n).step_by(unit) {
                all.push(candidates(finders, data, pos)?);
            }
            Some(all)
        }
        MatchSource::Interleaved => None,
    };

    let mut table = vec![PriceEntry::default(); n + 1];
    let positions: Vec<usize> = (start..n).step_by(unit).collect();
    for (slot, &i) in positions.iter().enumerate().rev() {
        let next = (i + unit).min(n);
        let mut best = PriceEntry {
            is_literal: true,
            length: 0,
            displacement: 0,
            price: literal_sum[next] - literal_sum[i] + table[next].price,
        };

        let found = match precomputed.as_mut() {
            Some(all) => std::mem::take(&mut all[slot]),
            None => candidates(finders, data, i)?,
        };
        for &(m, min_len) in &found {
            for len in (min_len..=m.length).step_by(unit) {
                if i + len > n {
                    break;
                }
                let resume = (i + len + skip).min(n);
                let cost = u64::from(price.match_price(m.displacement, len))
                    + (literal_sum[resume] - literal_sum[i + len])
                    + table[resume].price;
                if cost < best.price {
                    best = PriceEntry {
                        is_literal: false,
                        length: len,
                        displacement: m.displacement,
                        price: cost,
                    };
                }
            }
        }
        table[i] = best;
    }

    debug!(
        "price table: {} positions, total price {}",
        positions.len(),
        table.get(start).map_or(0, |e| e.price)
    );
    Ok(table)
}

/// Forward pass: follow the table from `start` and collect the matches.
pub(crate) fn trace(table: &[PriceEntry], start: usize, options: &FindOptions) -> Vec<Match> {
    let n = table.len().saturating_sub(1);
    let unit = options.unit_size.bytes();
    let skip = options.skip_bytes();

    let mut matches = Vec::new();
    let mut pos = start;
    while pos < n {
        let entry = table[pos];
        if entry.is_literal {
            pos = (pos + unit).min(n);
        } else {
            log_trace!(
                "optimal: match at {pos}, displacement {}, length {}",
                entry.displacement,
                entry.length
            );
            matches.push(Match::new(pos, entry.displacement, entry.length));
            pos = (pos + entry.length + skip).min(n);
        }
    }
    matches
}
