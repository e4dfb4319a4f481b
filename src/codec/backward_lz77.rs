// Backward LZ77.
//
// The token stream is produced over the reversed input and stored reversed,
// so a decoder walks the file from its end towards the start and writes the
// output from its end as well. The last 8 bytes form the footer:
//
//   u32 LE  (header_len << 24) | compressed_len
//   u32 LE  decompressed_len - file_len (wrapping)
//
// `compressed_len` counts from the start of the compressed region to the end
// of the file; anything before that region is stored verbatim and counts
// towards `decompressed_len`. The encoder writes no such prefix. `header_len`
// covers the footer plus 0xFF padding up to a four-byte boundary.
//
// Flags are read MSB first, 1 = match. A match is the u16
// `(len - 3) << 12 | (disp - 3)`, high byte first in reading order.

use log::debug;

use super::{ByteReader, check_match, output_buffer};
use crate::error::{Error, Result};
use crate::replay::{SlidingWindow, Token};

const FOOTER_LEN: usize = 8;
const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x12;
const MIN_DISPLACEMENT: usize = 3;
const MAX_DISPLACEMENT: usize = 0x1002;

/// Encode tokens taken over the reversed input.
pub fn encode(tokens: &[Token], decompressed_len: usize) -> Result<Vec<u8>> {
    let mut stream = Vec::with_capacity(decompressed_len / 2 + 8);
    for group in tokens.chunks(8) {
        let flag_at = stream.len();
        stream.push(0);
        for (bit, token) in group.iter().enumerate() {
            match *token {
                Token::Literal(b) => stream.push(b),
                Token::Match {
                    displacement,
                    length,
                } => {
                    check_match(
                        "backward-lz77",
                        displacement,
                        length,
                        MIN_DISPLACEMENT..=MAX_DISPLACEMENT,
                        MIN_LENGTH..=MAX_LENGTH,
                    )?;
                    let value = ((length - MIN_LENGTH) << 12) | (displacement - MIN_DISPLACEMENT);
                    stream[flag_at] |= 0x80 >> bit;
                    stream.push((value >> 8) as u8);
                    stream.push(value as u8);
                }
            }
        }
    }

    let padding = (4 - (stream.len() + FOOTER_LEN) % 4) % 4;
    let header_len = FOOTER_LEN + padding;
    let compressed_len = stream.len() + header_len;
    if compressed_len > 0xFF_FFFF {
        return Err(Error::InvalidData(format!(
            "backward-lz77 region of {compressed_len} bytes exceeds the 24-bit footer field"
        )));
    }
    let decompressed = u32::try_from(decompressed_len).map_err(|_| {
        Error::InvalidData(format!("backward-lz77 cannot store {decompressed_len} bytes"))
    })?;

    let mut out = Vec::with_capacity(compressed_len);
    out.extend(stream.iter().rev());
    out.resize(stream.len() + padding, 0xFF);
    out.extend_from_slice(&(((header_len as u32) << 24) | compressed_len as u32).to_le_bytes());
    out.extend_from_slice(&decompressed.wrapping_sub(compressed_len as u32).to_le_bytes());
    Ok(out)
}

pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    if input.len() < FOOTER_LEN {
        return Err(Error::InvalidFormat("missing backward-lz77 footer".into()));
    }
    let footer = &input[input.len() - FOOTER_LEN..];
    let top = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let extra = u32::from_le_bytes([footer[4], footer[5], footer[6], footer[7]]);
    let header_len = (top >> 24) as usize;
    let compressed_len = (top & 0xFF_FFFF) as usize;
    if header_len < FOOTER_LEN || compressed_len < header_len || compressed_len > input.len() {
        return Err(Error::InvalidFormat(format!(
            "inconsistent backward-lz77 footer (header {header_len}, region {compressed_len}, file {})",
            input.len()
        )));
    }
    let file_len = u32::try_from(input.len())
        .map_err(|_| Error::InvalidFormat("backward-lz77 file exceeds 4 GiB".into()))?;
    let total = file_len.wrapping_add(extra) as usize;

    let prefix_len = input.len() - compressed_len;
    let Some(tail_len) = total.checked_sub(prefix_len) else {
        return Err(Error::InvalidFormat(format!(
            "backward-lz77 output of {total} bytes is shorter than the stored prefix"
        )));
    };

    let stream: Vec<u8> = input[prefix_len..input.len() - header_len]
        .iter()
        .rev()
        .copied()
        .collect();
    let mut reader = ByteReader::new(&stream, "backward-lz77");
    let mut window = SlidingWindow::new(MAX_DISPLACEMENT);
    let mut tail = output_buffer(tail_len);
    while tail.len() < tail_len {
        let flags = reader.u8()?;
        for bit in 0..8 {
            if tail.len() >= tail_len {
                break;
            }
            if flags & (0x80 >> bit) != 0 {
                let value = (usize::from(reader.u8()?) << 8) | usize::from(reader.u8()?);
                let length = (value >> 12) + MIN_LENGTH;
                let displacement = (value & 0xFFF) + MIN_DISPLACEMENT;
                window.copy_match(displacement, length, &mut tail)?;
            } else {
                let b = reader.u8()?;
                window.push(b);
                tail.push(b);
            }
        }
    }
    tail.truncate(tail_len);

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&input[..prefix_len]);
    out.extend(tail.iter().rev());
    debug!(
        "backward-lz77: decoded {} bytes ({} stored verbatim)",
        out.len(),
        prefix_len
    );
    Ok(out)
}
