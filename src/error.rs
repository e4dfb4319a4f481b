// Error type shared by finders, parsers, replay and codecs.

use thiserror::Error;

/// Errors raised by the match-finding engine and the bundled codecs.
#[derive(Debug, Error)]
pub enum Error {
    /// Find limitations that can never be satisfied.
    #[error("invalid find limitations: {0}")]
    InvalidLimitations(String),

    /// Find options that do not fit the configured unit size.
    #[error("invalid find options: {0}")]
    InvalidOptions(String),

    /// Finders passed to one parser disagree on the unit size.
    #[error("unit size mismatch: parser uses {expected}, finder {index} uses {actual}")]
    UnitSizeMismatch {
        expected: usize,
        actual: usize,
        index: usize,
    },

    /// A parser needs at least one finder.
    #[error("a match parser needs at least one match finder")]
    NoFinders,

    /// Query position outside of the buffer.
    #[error("position {position} out of range for buffer of length {len}")]
    PositionOutOfRange { position: usize, len: usize },

    /// Query position not aligned to the unit size.
    #[error("position {position} is not aligned to unit size {unit}")]
    MisalignedPosition { position: usize, unit: usize },

    /// Magic, header or footer does not identify the expected format.
    #[error("invalid compression format: {0}")]
    InvalidFormat(String),

    /// Compressed stream is truncated or references data outside its window.
    #[error("invalid compressed data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
