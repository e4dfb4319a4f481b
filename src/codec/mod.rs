// Bundled LZ formats on top of the match parser.
//
// Compression: preset limitations -> finder -> parser -> tokens -> format
// writer. Decompression reads the format's token stream and rebuilds the
// bytes through a `SlidingWindow`.
//
// - `lz10`         : Nintendo LZ10 (0x10 header, match flag = 1)
// - `yaz0`         : Yaz0 (literal flag = 1, 2- or 3-byte matches)
// - `backward_lz77`: stream decoded from the end of the buffer backwards

pub mod backward_lz77;
pub mod lz10;
pub mod yaz0;

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::error::{Error, Result};
use crate::matching::chain::HashChainMatchFinder;
use crate::matching::config::{self, FormatPreset};
use crate::matching::{FinderKind, MatchFinder};
use crate::parser::{MatchParser, ParserKind};
use crate::price::{
    BackwardLz77PriceCalculator, Lz10PriceCalculator, PriceCalculator, Yaz0PriceCalculator,
};
use crate::replay::{self, Token};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Upper bound on output pre-allocation taken from an untrusted header.
const MAX_PREALLOC: usize = 1 << 20;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How to build the compression pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    pub parser: ParserKind,
    pub finder: FinderKind,
    /// Hash-chain links followed per query (0 = whole window).
    pub chain_depth: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            parser: ParserKind::Optimal,
            finder: FinderKind::SuffixTree,
            chain_depth: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

/// A bundled compression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Lz10,
    Yaz0,
    BackwardLz77,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Lz10, Format::Yaz0, Format::BackwardLz77];

    pub fn name(self) -> &'static str {
        self.preset().name
    }

    /// Limitations and parse options the format's tokens can express.
    pub fn preset(self) -> FormatPreset {
        match self {
            Self::Lz10 => config::LZ10,
            Self::Yaz0 => config::YAZ0,
            Self::BackwardLz77 => config::BACKWARD_LZ77,
        }
    }

    pub fn price_calculator(self) -> Box<dyn PriceCalculator> {
        match self {
            Self::Lz10 => Box::new(Lz10PriceCalculator),
            Self::Yaz0 => Box::new(Yaz0PriceCalculator),
            Self::BackwardLz77 => Box::new(BackwardLz77PriceCalculator),
        }
    }

    /// Guess the format of compressed data from its magic. Backward LZ77
    /// carries no magic and is never detected.
    pub fn detect(data: &[u8]) -> Option<Format> {
        if data.starts_with(yaz0::MAGIC) {
            Some(Self::Yaz0)
        } else if data.first() == Some(&lz10::MAGIC) {
            Some(Self::Lz10)
        } else {
            None
        }
    }

    /// Build the parser the format uses for `opts`.
    pub fn build_parser(self, opts: &CompressOptions) -> Result<MatchParser> {
        let preset = self.preset();
        let finder = match opts.finder {
            FinderKind::HashChain => MatchFinder::from(
                HashChainMatchFinder::new(preset.limitations)?.with_max_chain(opts.chain_depth),
            ),
            kind => MatchFinder::new(kind, preset.limitations)?,
        };
        MatchParser::new(
            opts.parser.with_price(self.price_calculator()),
            vec![finder],
            preset.options,
        )
    }

    /// Tokens for `input` in the format's working order.
    pub fn tokenize(self, input: &[u8], opts: &CompressOptions) -> Result<Vec<Token>> {
        let mut parser = self.build_parser(opts)?;
        let matches = parser.parse(input)?;
        Ok(replay::tokenize(input, &matches, parser.options()))
    }

    pub fn compress(self, input: &[u8], opts: &CompressOptions) -> Result<Vec<u8>> {
        let tokens = self.tokenize(input, opts)?;
        let out = match self {
            Self::Lz10 => lz10::encode(&tokens, input.len())?,
            Self::Yaz0 => yaz0::encode(&tokens, input.len())?,
            Self::BackwardLz77 => backward_lz77::encode(&tokens, input.len())?,
        };
        debug!(
            "{}: {} -> {} bytes ({} tokens, {} parser, {} finder)",
            self.name(),
            input.len(),
            out.len(),
            tokens.len(),
            opts.parser.name(),
            opts.finder.name()
        );
        Ok(out)
    }

    pub fn decompress(self, input: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Lz10 => lz10::decode(input),
            Self::Yaz0 => yaz0::decode(input),
            Self::BackwardLz77 => backward_lz77::decode(input),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidFormat(format!("unknown format '{s}'")))
    }
}

/// Compress independent buffers in parallel, one parser per buffer.
#[cfg(feature = "parallel")]
pub fn compress_many<T: AsRef<[u8]> + Sync>(
    inputs: &[T],
    format: Format,
    opts: &CompressOptions,
) -> Result<Vec<Vec<u8>>> {
    inputs
        .par_iter()
        .map(|input| format.compress(input.as_ref(), opts))
        .collect()
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Bounds-checked cursor over a compressed stream.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    format: &'static str,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8], format: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            format,
        }
    }

    #[inline]
    pub(crate) fn u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or_else(|| {
            Error::InvalidData(format!("{} stream truncated at byte {}", self.format, self.pos))
        })?;
        self.pos += 1;
        Ok(byte)
    }
}

/// Output buffer sized from a header without trusting it blindly.
pub(crate) fn output_buffer(declared: usize) -> Vec<u8> {
    Vec::with_capacity(declared.min(MAX_PREALLOC))
}

/// Reject a match the format cannot express.
pub(crate) fn check_match(
    format: &'static str,
    displacement: usize,
    length: usize,
    displacements: std::ops::RangeInclusive<usize>,
    lengths: std::ops::RangeInclusive<usize>,
) -> Result<()> {
    if displacements.contains(&displacement) && lengths.contains(&length) {
        Ok(())
    } else {
        Err(Error::InvalidData(format!(
            "{format} cannot encode a match of length {length} at displacement {displacement}"
        )))
    }
}
