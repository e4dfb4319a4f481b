// Price models for the optimal parsers.
//
// A price is an estimate of the encoded size of one token, in bits. The
// parsers only compare sums of prices, so any consistent unit works.

/// Cost model supplied by a format.
///
/// # Implementing a custom model
///
/// ```
/// use lzmatch::price::PriceCalculator;
///
/// struct Nibbles;
///
/// impl PriceCalculator for Nibbles {
///     fn literal_price(&self, _value: u8) -> u32 { 9 }
///     fn match_price(&self, displacement: usize, _length: usize) -> u32 {
///         if displacement <= 16 { 9 } else { 17 }
///     }
/// }
/// ```
pub trait PriceCalculator: Send + Sync {
    /// Cost of emitting `value` verbatim.
    fn literal_price(&self, value: u8) -> u32;

    /// Cost of emitting a back reference.
    fn match_price(&self, displacement: usize, length: usize) -> u32;
}

impl<P: PriceCalculator + ?Sized> PriceCalculator for Box<P> {
    fn literal_price(&self, value: u8) -> u32 {
        (**self).literal_price(value)
    }

    fn match_price(&self, displacement: usize, length: usize) -> u32 {
        (**self).match_price(displacement, length)
    }
}

/// LZ10: flag bit plus a byte per literal, flag bit plus two bytes per match.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz10PriceCalculator;

impl PriceCalculator for Lz10PriceCalculator {
    fn literal_price(&self, _value: u8) -> u32 {
        9
    }

    fn match_price(&self, _displacement: usize, _length: usize) -> u32 {
        17
    }
}

/// Yaz0: matches longer than 17 bytes take a third byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct Yaz0PriceCalculator;

impl PriceCalculator for Yaz0PriceCalculator {
    fn literal_price(&self, _value: u8) -> u32 {
        9
    }

    fn match_price(&self, _displacement: usize, length: usize) -> u32 {
        if length <= 0x11 { 17 } else { 25 }
    }
}

/// Backward LZ77 shares the LZ10 token sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackwardLz77PriceCalculator;

impl PriceCalculator for BackwardLz77PriceCalculator {
    fn literal_price(&self, _value: u8) -> u32 {
        9
    }

    fn match_price(&self, _displacement: usize, _length: usize) -> u32 {
        17
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaz0_long_matches_cost_more() {
        let p = Yaz0PriceCalculator;
        assert_eq!(p.match_price(1, 17), 17);
        assert_eq!(p.match_price(1, 18), 25);
        // Three literals always lose to a three-byte match.
        assert!(p.match_price(4096, 3) < 3 * p.literal_price(0));
    }

    #[test]
    fn boxed_models_delegate() {
        let boxed: Box<dyn PriceCalculator> = Box::new(Lz10PriceCalculator);
        assert_eq!(boxed.literal_price(7), 9);
        assert_eq!(boxed.match_price(1, 3), 17);
    }
}
