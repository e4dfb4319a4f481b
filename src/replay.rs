// Windowed replay: rebuilding bytes from literals and back references.
//
// Every decoder keeps a fixed-size circular window of the most recently
// produced bytes. A match copies from `displacement` bytes behind the write
// cursor one byte at a time, so a copy whose source overlaps its own output
// (displacement < length) repeats the period instead of reading stale data.

use crate::error::{Error, Result};
use crate::matching::Match;
use crate::matching::config::FindOptions;
use crate::parser::working_buffer;

/// One decoded token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    Match { displacement: usize, length: usize },
}

// ---------------------------------------------------------------------------
// Sliding window
// ---------------------------------------------------------------------------

/// Circular buffer of the last `capacity` output bytes.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    buf: Vec<u8>,
    cursor: usize,
    /// Bytes available behind the cursor, capped at the capacity.
    filled: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)],
            cursor: 0,
            filled: 0,
        }
    }

    /// Window whose first `prefill` bytes are zeros already "produced",
    /// matching a zero pre-buffer on the encoder side.
    pub fn with_prefill(capacity: usize, prefill: usize) -> Self {
        let mut window = Self::new(capacity);
        window.filled = prefill.min(window.buf.len());
        window.cursor = prefill % window.buf.len();
        window
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes a match may currently reach back over.
    pub fn available(&self) -> usize {
        self.filled
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buf[self.cursor] = byte;
        self.cursor += 1;
        if self.cursor == self.buf.len() {
            self.cursor = 0;
        }
        if self.filled < self.buf.len() {
            self.filled += 1;
        }
    }

    /// Copy `length` bytes from `displacement` behind the cursor, appending
    /// each to the window and to `out`.
    pub fn copy_match(&mut self, displacement: usize, length: usize, out: &mut Vec<u8>) -> Result<()> {
        if displacement == 0 || displacement > self.filled {
            return Err(Error::InvalidData(format!(
                "displacement {displacement} reaches outside the {} available window bytes",
                self.filled
            )));
        }
        out.reserve(length);
        let size = self.buf.len();
        for _ in 0..length {
            let byte = self.buf[(self.cursor + size - displacement) % size];
            self.push(byte);
            out.push(byte);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Token streams
// ---------------------------------------------------------------------------

/// Expand a parse into tokens over the working buffer order (reversed when
/// searching backwards); uncovered bytes become literals.
pub fn tokenize(input: &[u8], matches: &[Match], options: &FindOptions) -> Vec<Token> {
    let data: Vec<u8> = if options.search_backwards {
        input.iter().rev().copied().collect()
    } else {
        input.to_vec()
    };
    let mut tokens = Vec::with_capacity(data.len());
    let mut pos = 0;
    for m in matches {
        let gap_end = m.position.min(data.len());
        tokens.extend(data[pos.min(gap_end)..gap_end].iter().map(|&b| Token::Literal(b)));
        tokens.push(Token::Match {
            displacement: m.displacement,
            length: m.length,
        });
        pos = m.end();
    }
    if pos < data.len() {
        tokens.extend(data[pos..].iter().map(|&b| Token::Literal(b)));
    }
    tokens
}

/// Replay `tokens` through a window of `window_size` bytes preceded by
/// `pre_buffer_size` zeros. The pre-buffer is not part of the output.
pub fn replay(tokens: &[Token], window_size: usize, pre_buffer_size: usize) -> Result<Vec<u8>> {
    let mut window = SlidingWindow::with_prefill(window_size, pre_buffer_size);
    let mut out = Vec::new();
    for token in tokens {
        match *token {
            Token::Literal(b) => {
                window.push(b);
                out.push(b);
            }
            Token::Match {
                displacement,
                length,
            } => window.copy_match(displacement, length, &mut out)?,
        }
    }
    Ok(out)
}

/// Rebuild `input` from its parse: tokenize, replay, undo the reversal.
pub fn reconstruct(matches: &[Match], input: &[u8], options: &FindOptions) -> Result<Vec<u8>> {
    let tokens = tokenize(input, matches, options);
    let window = working_buffer(input, options).len();
    let mut out = replay(&tokens, window, options.pre_buffer_size)?;
    if options.search_backwards {
        out.reverse();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_copy_repeats_period() {
        let tokens = [
            Token::Literal(b'a'),
            Token::Literal(b'b'),
            Token::Match {
                displacement: 2,
                length: 7,
            },
        ];
        assert_eq!(replay(&tokens, 16, 0).unwrap(), b"ababababa".to_vec());
    }

    #[test]
    fn copy_before_window_start_fails() {
        let tokens = [
            Token::Literal(b'x'),
            Token::Match {
                displacement: 2,
                length: 3,
            },
        ];
        assert!(matches!(replay(&tokens, 16, 0), Err(Error::InvalidData(_))));
    }

    #[test]
    fn window_wraps_and_forgets() {
        let mut w = SlidingWindow::new(4);
        for b in b"abcdef" {
            w.push(*b);
        }
        assert_eq!(w.available(), 4);
        let mut out = Vec::new();
        w.copy_match(4, 2, &mut out).unwrap();
        assert_eq!(out, b"cd");
        assert!(w.copy_match(5, 1, &mut out).is_err());
    }

    #[test]
    fn prefill_serves_zeros() {
        let tokens = [Token::Match {
            displacement: 3,
            length: 5,
        }];
        assert_eq!(replay(&tokens, 8, 3).unwrap(), vec![0; 5]);
        assert!(replay(&tokens, 8, 2).is_err());
    }

    #[test]
    fn tokenize_fills_gaps_with_literals() {
        let input = b"AAAAAAAAAA";
        let tokens = tokenize(input, &[Match::new(1, 1, 9)], &FindOptions::default());
        assert_eq!(
            tokens,
            vec![
                Token::Literal(b'A'),
                Token::Match {
                    displacement: 1,
                    length: 9
                }
            ]
        );
        assert_eq!(
            reconstruct(&[Match::new(1, 1, 9)], input, &FindOptions::default()).unwrap(),
            input.to_vec()
        );
    }

    #[test]
    fn reconstruct_undoes_reversal() {
        let opts = FindOptions::default().searching_backwards();
        // Reversed buffer "cbacba": "cba" repeats at 3.
        let input = b"abcabc";
        let out = reconstruct(&[Match::new(3, 3, 3)], input, &opts).unwrap();
        assert_eq!(out, input.to_vec());
    }
}
