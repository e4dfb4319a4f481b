// Match parsing: turning per-position match candidates into a token stream.
//
// A parser owns its finders and covers the whole input with non-overlapping
// matches; uncovered units are literals. Strategies:
//   - `greedy` : longest match with a one-unit lookahead
//   - `optimal`: backward dynamic programming over a price model, either
//              with all matches precomputed (`Optimal`) or queried inside
//              the backward pass (`BackwardForward`)

pub mod greedy;
pub mod optimal;

use std::fmt;
use std::io::Read;

use log::debug;

use crate::error::{Error, Result};
use crate::matching::config::FindOptions;
use crate::matching::{Match, MatchFinder};
use crate::price::PriceCalculator;

pub use optimal::PriceEntry;

/// Which parser to build, without its price model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserKind {
    Greedy,
    #[default]
    Optimal,
    BackwardForward,
}

impl ParserKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::Optimal => "optimal",
            Self::BackwardForward => "backward-forward",
        }
    }

    /// Attach a price model (ignored by the greedy parser).
    pub fn with_price(self, price: Box<dyn PriceCalculator>) -> ParseStrategy {
        match self {
            Self::Greedy => ParseStrategy::Greedy,
            Self::Optimal => ParseStrategy::Optimal(price),
            Self::BackwardForward => ParseStrategy::BackwardForward(price),
        }
    }
}

/// Parsing strategy, carrying the price model where one is needed.
pub enum ParseStrategy {
    Greedy,
    Optimal(Box<dyn PriceCalculator>),
    BackwardForward(Box<dyn PriceCalculator>),
}

impl ParseStrategy {
    pub fn kind(&self) -> ParserKind {
        match self {
            Self::Greedy => ParserKind::Greedy,
            Self::Optimal(_) => ParserKind::Optimal,
            Self::BackwardForward(_) => ParserKind::BackwardForward,
        }
    }
}

impl fmt::Debug for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().name())
    }
}

/// Build the buffer the finders see: `pre_buffer_size` zero bytes followed
/// by the input, reversed first when searching backwards.
pub fn working_buffer(input: &[u8], options: &FindOptions) -> Vec<u8> {
    let mut data = Vec::with_capacity(options.pre_buffer_size + input.len());
    data.resize(options.pre_buffer_size, 0);
    if options.search_backwards {
        data.extend(input.iter().rev());
    } else {
        data.extend_from_slice(input);
    }
    data
}

/// Longest match over all finders; ties keep the earlier finder's match.
pub(crate) fn longest_match(
    finders: &mut [MatchFinder],
    data: &[u8],
    position: usize,
) -> Result<Option<Match>> {
    let mut best: Option<Match> = None;
    for finder in finders.iter_mut() {
        if let Some(m) = finder.find_longest_match(data, position)?
            && best.is_none_or(|b| m.is_better_than(&b))
        {
            best = Some(m);
        }
    }
    Ok(best)
}

// ---------------------------------------------------------------------------
// MatchParser
// ---------------------------------------------------------------------------

/// A parser over one or more finders sharing a unit size.
///
/// Returned match positions are relative to the first input unit of the
/// working buffer: with a pre-buffer a displacement may exceed its position,
/// and when searching backwards positions count from the end of the input.
#[derive(Debug)]
pub struct MatchParser {
    strategy: ParseStrategy,
    finders: Vec<MatchFinder>,
    options: FindOptions,
}

impl MatchParser {
    /// Validate the configuration and take ownership of `finders`.
    ///
    /// Fails before any input is seen when the finders disagree with
    /// `options` on the unit size, or the pre-buffer is not unit-aligned.
    pub fn new(
        strategy: ParseStrategy,
        finders: Vec<MatchFinder>,
        options: FindOptions,
    ) -> Result<Self> {
        if finders.is_empty() {
            return Err(Error::NoFinders);
        }
        options.validate()?;
        let expected = options.unit_size;
        for (index, finder) in finders.iter().enumerate() {
            if finder.unit_size() != expected {
                return Err(Error::UnitSizeMismatch {
                    expected: expected.bytes(),
                    actual: finder.unit_size().bytes(),
                    index,
                });
            }
        }
        Ok(Self {
            strategy,
            finders,
            options,
        })
    }

    pub fn greedy(finders: Vec<MatchFinder>, options: FindOptions) -> Result<Self> {
        Self::new(ParseStrategy::Greedy, finders, options)
    }

    pub fn optimal(
        finders: Vec<MatchFinder>,
        price: impl PriceCalculator + 'static,
        options: FindOptions,
    ) -> Result<Self> {
        Self::new(ParseStrategy::Optimal(Box::new(price)), finders, options)
    }

    pub fn backward_forward(
        finders: Vec<MatchFinder>,
        price: impl PriceCalculator + 'static,
        options: FindOptions,
    ) -> Result<Self> {
        Self::new(
            ParseStrategy::BackwardForward(Box::new(price)),
            finders,
            options,
        )
    }

    pub fn kind(&self) -> ParserKind {
        self.strategy.kind()
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    pub fn finders(&self) -> &[MatchFinder] {
        &self.finders
    }

    /// Release the finders.
    pub fn into_finders(self) -> Vec<MatchFinder> {
        self.finders
    }

    /// Parse `input` into the ordered matches covering it.
    pub fn parse(&mut self, input: &[u8]) -> Result<Vec<Match>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let data = working_buffer(input, &self.options);
        let start = self.options.pre_buffer_size;
        for finder in &mut self.finders {
            finder.reset();
        }

        let mut matches = match &self.strategy {
            ParseStrategy::Greedy => greedy::parse(&mut self.finders, &data, start, &self.options)?,
            ParseStrategy::Optimal(price) => {
                let table = optimal::build_price_table(
                    &mut self.finders,
                    &data,
                    start,
                    &self.options,
                    price.as_ref(),
                    optimal::MatchSource::Precomputed,
                )?;
                optimal::trace(&table, start, &self.options)
            }
            ParseStrategy::BackwardForward(price) => {
                let table = optimal::build_price_table(
                    &mut self.finders,
                    &data,
                    start,
                    &self.options,
                    price.as_ref(),
                    optimal::MatchSource::Interleaved,
                )?;
                optimal::trace(&table, start, &self.options)
            }
        };

        for m in &mut matches {
            m.position -= start;
        }
        debug!(
            "{} parser: {} bytes -> {} matches covering {} bytes",
            self.strategy.kind().name(),
            input.len(),
            matches.len(),
            matches.iter().map(|m| m.length).sum::<usize>()
        );
        Ok(matches)
    }

    /// Read `reader` to the end and parse it. I/O errors propagate.
    pub fn parse_reader<R: Read>(&mut self, mut reader: R) -> Result<Vec<Match>> {
        let mut input = Vec::new();
        reader.read_to_end(&mut input)?;
        self.parse(&input)
    }

    /// The optimal parsers' price table for `input`, one entry per working
    /// position from the first input unit up to and including the end.
    pub fn price_table(&mut self, input: &[u8]) -> Result<Vec<PriceEntry>> {
        let (price, source) = match &self.strategy {
            ParseStrategy::Greedy => {
                return Err(Error::InvalidOptions(
                    "the greedy parser keeps no price table".into(),
                ));
            }
            ParseStrategy::Optimal(p) => (p.as_ref(), optimal::MatchSource::Precomputed),
            ParseStrategy::BackwardForward(p) => (p.as_ref(), optimal::MatchSource::Interleaved),
        };
        let data = working_buffer(input, &self.options);
        let start = self.options.pre_buffer_size;
        for finder in &mut self.finders {
            finder.reset();
        }
        let mut table = optimal::build_price_table(
            &mut self.finders,
            &data,
            start,
            &self.options,
            price,
            source,
        )?;
        Ok(table.split_off(start))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::FinderKind;
    use crate::matching::config::{FindLimitations, UnitSize};
    use crate::price::Lz10PriceCalculator;

    fn finder(kind: FinderKind, unit: UnitSize) -> MatchFinder {
        let limits = FindLimitations::new(3, 255, 1, 255)
            .unwrap()
            .with_unit_size(unit);
        MatchFinder::new(kind, limits).unwrap()
    }

    #[test]
    fn mixed_unit_sizes_fail_fast() {
        let finders = vec![
            finder(FinderKind::SuffixTree, UnitSize::Byte),
            finder(FinderKind::NeedleHaystack, UnitSize::Short),
        ];
        let err = MatchParser::optimal(finders, Lz10PriceCalculator, FindOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnitSizeMismatch {
                expected: 1,
                actual: 2,
                index: 1
            }
        ));
    }

    #[test]
    fn finder_unit_must_match_options() {
        let finders = vec![finder(FinderKind::HashChain, UnitSize::Byte)];
        let opts = FindOptions::default().with_unit_size(UnitSize::Short);
        assert!(MatchParser::greedy(finders, opts).is_err());
    }

    #[test]
    fn no_finders_rejected() {
        assert!(matches!(
            MatchParser::greedy(Vec::new(), FindOptions::default()),
            Err(Error::NoFinders)
        ));
    }

    #[test]
    fn empty_input_empty_parse() {
        for kind in [ParserKind::Greedy, ParserKind::Optimal, ParserKind::BackwardForward] {
            let mut p = MatchParser::new(
                kind.with_price(Box::new(Lz10PriceCalculator)),
                vec![finder(FinderKind::SuffixTree, UnitSize::Byte)],
                FindOptions::default(),
            )
            .unwrap();
            assert!(p.parse(b"").unwrap().is_empty());
        }
    }

    #[test]
    fn working_buffer_layout() {
        let opts = FindOptions::default().with_pre_buffer(2).searching_backwards();
        assert_eq!(working_buffer(b"abc", &opts), vec![0, 0, b'c', b'b', b'a']);
        assert_eq!(working_buffer(b"abc", &FindOptions::default()), b"abc".to_vec());
    }

    #[test]
    fn pre_buffer_matches_reach_before_start() {
        let mut p = MatchParser::greedy(
            vec![finder(FinderKind::SuffixTree, UnitSize::Byte)],
            FindOptions::default().with_pre_buffer(4),
        )
        .unwrap();
        let matches = p.parse(&[0, 0, 0, 0, 7]).unwrap();
        assert_eq!(matches, vec![Match::new(0, 1, 4)]);
    }

    #[test]
    fn parse_reader_reads_everything() {
        let mut p = MatchParser::greedy(
            vec![finder(FinderKind::SuffixTree, UnitSize::Byte)],
            FindOptions::default(),
        )
        .unwrap();
        let m = p.parse_reader(std::io::Cursor::new(b"AAAAAAAAAA")).unwrap();
        assert_eq!(m, vec![Match::new(1, 1, 9)]);
        let finders = p.into_finders();
        assert_eq!(finders.len(), 1);
        assert_eq!(finders[0].kind(), FinderKind::SuffixTree);
    }

    #[test]
    fn greedy_has_no_price_table() {
        let mut p = MatchParser::greedy(
            vec![finder(FinderKind::SuffixTree, UnitSize::Byte)],
            FindOptions::default(),
        )
        .unwrap();
        assert!(p.price_table(b"abc").is_err());
    }
}
