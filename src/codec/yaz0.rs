// Yaz0.
//
// Header: "Yaz0", decompressed size as u32 BE, 8 reserved bytes. Body: flag
// bytes read MSB first, 1 = literal. Matches with length 3..=17 take two
// bytes (`(len - 2) << 4 | (disp - 1) >> 8`, `(disp - 1) & 0xFF`); longer ones
// take three, with a zero length nibble and `len - 0x12` in the third byte.

use log::debug;

use super::{ByteReader, check_match, output_buffer};
use crate::error::{Error, Result};
use crate::replay::{SlidingWindow, Token};

pub const MAGIC: &[u8; 4] = b"Yaz0";

const HEADER_LEN: usize = 16;
const MIN_LENGTH: usize = 3;
const SHORT_MAX_LENGTH: usize = 0x11;
const MAX_LENGTH: usize = 0x111;
const WINDOW: usize = 0x1000;

pub fn encode(tokens: &[Token], decompressed_len: usize) -> Result<Vec<u8>> {
    let size = u32::try_from(decompressed_len)
        .map_err(|_| Error::InvalidData(format!("yaz0 cannot store {decompressed_len} bytes")))?;
    let mut out = Vec::with_capacity(HEADER_LEN + decompressed_len / 2);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(&[0; 8]);

    for group in tokens.chunks(8) {
        let flag_at = out.len();
        out.push(0);
        for (bit, token) in group.iter().enumerate() {
            match *token {
                Token::Literal(b) => {
                    out[flag_at] |= 0x80 >> bit;
                    out.push(b);
                }
                Token::Match {
                    displacement,
                    length,
                } => {
                    check_match("yaz0", displacement, length, 1..=WINDOW, MIN_LENGTH..=MAX_LENGTH)?;
                    let disp = displacement - 1;
                    if length <= SHORT_MAX_LENGTH {
                        out.push((((length - 2) << 4) | (disp >> 8)) as u8);
                        out.push(disp as u8);
                    } else {
                        out.push((disp >> 8) as u8);
                        out.push(disp as u8);
                        out.push((length - 0x12) as u8);
                    }
                }
            }
        }
    }
    Ok(out)
}

pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    if input.len() < HEADER_LEN || !input.starts_with(MAGIC) {
        return Err(Error::InvalidFormat("missing Yaz0 header".into()));
    }
    let size = u32::from_be_bytes([input[4], input[5], input[6], input[7]]) as usize;

    let mut reader = ByteReader::new(&input[HEADER_LEN..], "yaz0");
    let mut window = SlidingWindow::new(WINDOW);
    let mut out = output_buffer(size);
    while out.len() < size {
        let flags = reader.u8()?;
        for bit in 0..8 {
            if out.len() >= size {
                break;
            }
            if flags & (0x80 >> bit) != 0 {
                let b = reader.u8()?;
                window.push(b);
                out.push(b);
            } else {
                let b0 = reader.u8()? as usize;
                let b1 = reader.u8()? as usize;
                let displacement = (((b0 & 0xF) << 8) | b1) + 1;
                let length = match b0 >> 4 {
                    0 => reader.u8()? as usize + 0x12,
                    n => n + 2,
                };
                window.copy_match(displacement, length, &mut out)?;
            }
        }
    }
    out.truncate(size);
    debug!("yaz0: decoded {} bytes", out.len());
    Ok(out)
}
