// Nintendo LZ10.
//
// Header: 0x10, decompressed size as u24 LE (size 0 is followed by a u32 LE
// size for buffers of 16 MiB and more). Body: groups of up to eight tokens,
// each preceded by a flag byte read MSB first, 1 = match. A match is two
// bytes: `(len - 3) << 4 | (disp - 1) >> 8`, `(disp - 1) & 0xFF`.

use log::debug;

use super::{ByteReader, check_match, output_buffer};
use crate::error::{Error, Result};
use crate::replay::{SlidingWindow, Token};

pub const MAGIC: u8 = 0x10;

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x12;
const WINDOW: usize = 0x1000;

pub fn encode(tokens: &[Token], decompressed_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(8 + decompressed_len / 2);
    out.push(MAGIC);
    if decompressed_len <= 0xFF_FFFF {
        out.extend_from_slice(&(decompressed_len as u32).to_le_bytes()[..3]);
    } else {
        let len = u32::try_from(decompressed_len).map_err(|_| {
            Error::InvalidData(format!("lz10 cannot store {decompressed_len} bytes"))
        })?;
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(&len.to_le_bytes());
    }

    for group in tokens.chunks(8) {
        let flag_at = out.len();
        out.push(0);
        for (bit, token) in group.iter().enumerate() {
            match *token {
                Token::Literal(b) => out.push(b),
                Token::Match {
                    displacement,
                    length,
                } => {
                    check_match("lz10", displacement, length, 1..=WINDOW, MIN_LENGTH..=MAX_LENGTH)?;
                    let disp = displacement - 1;
                    out[flag_at] |= 0x80 >> bit;
                    out.push((((length - MIN_LENGTH) << 4) | (disp >> 8)) as u8);
                    out.push(disp as u8);
                }
            }
        }
    }
    Ok(out)
}

pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    if input.len() < 4 || input[0] != MAGIC {
        return Err(Error::InvalidFormat("missing lz10 header".into()));
    }
    let mut size = u32::from_le_bytes([input[1], input[2], input[3], 0]) as usize;
    let mut body = &input[4..];
    if size == 0 && body.len() >= 4 {
        let extended = u32::from_le_bytes([body[0], body[1], body[2], body[3]]) as usize;
        if extended > 0xFF_FFFF {
            size = extended;
            body = &body[4..];
        }
    }

    let mut reader = ByteReader::new(body, "lz10");
    let mut window = SlidingWindow::new(WINDOW);
    let mut out = output_buffer(size);
    while out.len() < size {
        let flags = reader.u8()?;
        for bit in 0..8 {
            if out.len() >= size {
                break;
            }
            if flags & (0x80 >> bit) != 0 {
                let b0 = reader.u8()? as usize;
                let b1 = reader.u8()? as usize;
                let length = (b0 >> 4) + MIN_LENGTH;
                let displacement = (((b0 & 0xF) << 8) | b1) + 1;
                window.copy_match(displacement, length, &mut out)?;
            } else {
                let b = reader.u8()?;
                window.push(b);
                out.push(b);
            }
        }
    }
    out.truncate(size);
    debug!("lz10: decoded {} bytes", out.len());
    Ok(out)
}
