//! lzmatch: LZ match finding and price-driven optimal parsing.
//!
//! The crate provides:
//! - Match finders over a sliding window (`matching`): suffix tree,
//!   needle/haystack and hash chain
//! - Greedy and optimal parsers over a pluggable price model (`parser`, `price`)
//! - The windowed replay every decoder shares (`replay`)
//! - LZ10, Yaz0 and backward LZ77 codecs built on top (`codec`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use lzmatch::matching::config::{FindLimitations, FindOptions};
//! use lzmatch::matching::{FinderKind, Match, MatchFinder};
//! use lzmatch::parser::MatchParser;
//! use lzmatch::price::Lz10PriceCalculator;
//! use lzmatch::replay;
//!
//! let limits = FindLimitations::new(3, 255, 1, 255).unwrap();
//! let finder = MatchFinder::new(FinderKind::SuffixTree, limits).unwrap();
//! let mut parser =
//!     MatchParser::optimal(vec![finder], Lz10PriceCalculator, FindOptions::default()).unwrap();
//!
//! let input = b"AAAAAAAAAA";
//! let matches = parser.parse(input).unwrap();
//! assert_eq!(matches, vec![Match::new(1, 1, 9)]);
//!
//! let rebuilt = replay::reconstruct(&matches, input, parser.options()).unwrap();
//! assert_eq!(rebuilt, input);
//! ```
//!
//! Or go straight to a container format:
//!
//! ```
//! use lzmatch::codec::{CompressOptions, Format};
//!
//! let data = b"hello hello hello hello";
//! let packed = Format::Yaz0.compress(data, &CompressOptions::default()).unwrap();
//! assert_eq!(Format::Yaz0.decompress(&packed).unwrap(), data);
//! ```

pub mod codec;
pub mod error;
pub mod matching;
pub mod parser;
pub mod price;
pub mod replay;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};
