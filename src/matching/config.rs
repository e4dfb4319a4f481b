// Match finder limitations, parse options and per-format presets.
//
// Every bundled format describes its token constraints with one
// `FindLimitations` (what a single match may look like) and one `FindOptions`
// (how the parser walks the buffer).

use crate::error::{Error, Result};

/// Granularity at which positions, lengths and displacements are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum UnitSize {
    /// Byte granularity.
    #[default]
    Byte,
    /// 16-bit units; everything a finder produces is even.
    Short,
}

impl UnitSize {
    /// Width of one unit in bytes.
    #[inline(always)]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
        }
    }

    #[inline(always)]
    pub(crate) const fn round_down(self, n: usize) -> usize {
        n - n % self.bytes()
    }

    #[inline(always)]
    pub(crate) const fn round_up(self, n: usize) -> usize {
        n.div_ceil(self.bytes()) * self.bytes()
    }

    #[inline(always)]
    pub(crate) const fn is_aligned(self, n: usize) -> bool {
        n % self.bytes() == 0
    }
}

// ---------------------------------------------------------------------------
// Find limitations
// ---------------------------------------------------------------------------

/// Bounds on the matches a finder may report.
///
/// `max_length == 0` and `max_displacement == 0` mean unbounded: the rest of
/// the buffer, and everything already seen, respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindLimitations {
    /// Shortest match worth reporting.
    pub min_length: usize,
    /// Longest match the format can encode (0 = unbounded).
    pub max_length: usize,
    /// Smallest encodable distance back (0 is treated as 1).
    pub min_displacement: usize,
    /// Window size (0 = unbounded).
    pub max_displacement: usize,
    /// Unit granularity of reported matches.
    pub unit_size: UnitSize,
}

impl FindLimitations {
    /// Byte-granular limitations, validated.
    pub fn new(
        min_length: usize,
        max_length: usize,
        min_displacement: usize,
        max_displacement: usize,
    ) -> Result<Self> {
        let limits = Self {
            min_length,
            max_length,
            min_displacement,
            max_displacement,
            unit_size: UnitSize::Byte,
        };
        limits.validate()?;
        Ok(limits)
    }

    /// Same bounds with a different unit size.
    pub const fn with_unit_size(mut self, unit_size: UnitSize) -> Self {
        self.unit_size = unit_size;
        self
    }

    /// Reject bounds that no match could ever satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.min_length == 0 {
            return Err(Error::InvalidLimitations(
                "min_length must be at least 1".into(),
            ));
        }
        if self.max_length != 0 && self.max_length < self.min_length {
            return Err(Error::InvalidLimitations(format!(
                "max_length {} is below min_length {}",
                self.max_length, self.min_length
            )));
        }
        if self.max_length != 0 && self.unit_size.round_down(self.max_length) < self.min_length() {
            return Err(Error::InvalidLimitations(format!(
                "max_length {} holds no whole {}-byte unit match",
                self.max_length,
                self.unit_size.bytes()
            )));
        }
        if self.max_displacement != 0 && self.max_displacement < self.min_displacement() {
            return Err(Error::InvalidLimitations(format!(
                "max_displacement {} is below min_displacement {}",
                self.max_displacement, self.min_displacement
            )));
        }
        Ok(())
    }

    /// Minimum length rounded up to a whole unit.
    #[inline]
    pub(crate) fn min_length(&self) -> usize {
        self.unit_size.round_up(self.min_length)
    }

    /// Minimum displacement, at least one unit.
    #[inline]
    pub(crate) fn min_displacement(&self) -> usize {
        self.unit_size.round_up(self.min_displacement.max(1))
    }

    /// Longest length a match at `position` can have in a buffer of `len`.
    #[inline]
    pub(crate) fn length_cap(&self, position: usize, len: usize) -> usize {
        let remaining = len - position;
        let cap = if self.max_length == 0 {
            remaining
        } else {
            remaining.min(self.max_length)
        };
        self.unit_size.round_down(cap)
    }

    /// Inclusive range of source positions in the window of `position`.
    /// `None` when the window is empty.
    #[inline]
    pub(crate) fn window(&self, position: usize) -> Option<(usize, usize)> {
        let hi = position.checked_sub(self.min_displacement())?;
        let lo = if self.max_displacement == 0 {
            0
        } else {
            position.saturating_sub(self.max_displacement)
        };
        (lo <= hi).then_some((lo, hi))
    }
}

// ---------------------------------------------------------------------------
// Find options
// ---------------------------------------------------------------------------

/// How a parser prepares and walks its working buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    /// Zero bytes logically preceding the data; referenceable, never emitted.
    pub pre_buffer_size: usize,
    /// Parse the reversed buffer.
    pub search_backwards: bool,
    /// Units left as literals after every match.
    pub skip_units_after_match: usize,
    /// Unit granularity; must equal every finder's.
    pub unit_size: UnitSize,
}

impl FindOptions {
    pub const fn with_pre_buffer(mut self, size: usize) -> Self {
        self.pre_buffer_size = size;
        self
    }

    pub const fn searching_backwards(mut self) -> Self {
        self.search_backwards = true;
        self
    }

    pub const fn with_skip_units(mut self, units: usize) -> Self {
        self.skip_units_after_match = units;
        self
    }

    pub const fn with_unit_size(mut self, unit_size: UnitSize) -> Self {
        self.unit_size = unit_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.unit_size.is_aligned(self.pre_buffer_size) {
            return Err(Error::InvalidOptions(format!(
                "pre-buffer of {} bytes is not a whole number of {}-byte units",
                self.pre_buffer_size,
                self.unit_size.bytes()
            )));
        }
        Ok(())
    }

    /// Bytes skipped after each match.
    #[inline]
    pub(crate) fn skip_bytes(&self) -> usize {
        self.skip_units_after_match * self.unit_size.bytes()
    }
}

// ---------------------------------------------------------------------------
// Format presets
// ---------------------------------------------------------------------------

/// Limitations and options of one bundled format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPreset {
    /// Name for display purposes.
    pub name: &'static str,
    pub limitations: FindLimitations,
    pub options: FindOptions,
}

pub const LZ10: FormatPreset = FormatPreset {
    name: "lz10",
    limitations: FindLimitations {
        min_length: 3,
        max_length: 0x12,
        min_displacement: 1,
        max_displacement: 0x1000,
        unit_size: UnitSize::Byte,
    },
    options: FindOptions {
        pre_buffer_size: 0,
        search_backwards: false,
        skip_units_after_match: 0,
        unit_size: UnitSize::Byte,
    },
};

pub const YAZ0: FormatPreset = FormatPreset {
    name: "yaz0",
    limitations: FindLimitations {
        min_length: 3,
        max_length: 0x111,
        min_displacement: 1,
        max_displacement: 0x1000,
        unit_size: UnitSize::Byte,
    },
    options: FindOptions {
        pre_buffer_size: 0,
        search_backwards: false,
        skip_units_after_match: 0,
        unit_size: UnitSize::Byte,
    },
};

pub const BACKWARD_LZ77: FormatPreset = FormatPreset {
    name: "backward-lz77",
    limitations: FindLimitations {
        min_length: 3,
        max_length: 0x12,
        min_displacement: 3,
        max_displacement: 0x1002,
        unit_size: UnitSize::Byte,
    },
    options: FindOptions {
        pre_buffer_size: 0,
        search_backwards: true,
        skip_units_after_match: 0,
        unit_size: UnitSize::Byte,
    },
};

/// Look up a preset by (case-insensitive) name.
pub fn preset_for_name(name: &str) -> Option<FormatPreset> {
    [LZ10, YAZ0, BACKWARD_LZ77]
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}
