use std::io::{Read, Write};

use log::{debug, trace};

use crate::bitstream::bitreader::BitReader;

use super::header::Header;
use super::{LzwError, CLEAR_CODE, DICT_OFFSET};

const BUFFER_SIZE: usize = 32 * 1024;

/// The decompressor's dictionary. Codes are handed out sequentially, so a
/// flat array of (previous code, final byte) indexed by code suffices; an
/// entry's full byte string is recovered by walking the prev chain, which
/// always terminates because every prev is smaller than its code.
struct FlatDict {
    prevs: Vec<u16>,
    bytes: Vec<u8>,
    offset: u16,
    /// Expansion scratch; the chain comes out back to front.
    scratch: Vec<u8>,
}

impl FlatDict {
    fn new(entries: u32, offset: u16) -> Self {
        let capacity = entries as usize - offset as usize;
        Self {
            prevs: vec![0; capacity],
            bytes: vec![0; capacity],
            offset,
            scratch: Vec::with_capacity(entries as usize),
        }
    }

    fn insert(&mut self, code: u16, prev: u16, byte: u8) {
        let index = (code - self.offset) as usize;
        self.prevs[index] = prev;
        self.bytes[index] = byte;
    }

    /// Expand `code` onto `out` and return the first byte of the expansion.
    fn expand(&mut self, code: u16, out: &mut Vec<u8>) -> u8 {
        self.scratch.clear();
        let mut code = code;
        while code > 0xFF {
            let index = (code - self.offset) as usize;
            self.scratch.push(self.bytes[index]);
            code = self.prevs[index];
        }
        let first = code as u8;
        out.push(first);
        out.extend(self.scratch.iter().rev());
        first
    }
}

/// Decompress a .Z stream from `input` onto `output`. Bytes the caller
/// already consumed to probe the format go into `prefix`; they are replayed
/// before the rest of the input. Returns the size ratio 1 - input/output,
/// or -1.0 when the stream expands to nothing.
pub fn decompress(
    input: impl Read,
    mut output: impl Write,
    prefix: &[u8],
) -> Result<f64, LzwError> {
    let mut reader = BitReader::with_prefix(input, prefix);

    let mut header_bytes = [0u8; 3];
    for byte in header_bytes.iter_mut() {
        *byte = reader
            .read_byte()
            .map_err(LzwError::Read)?
            .ok_or(LzwError::Format("file too short for a header"))?;
    }
    let header = Header::parse(header_bytes)?;
    trace!(
        "maximum code width {}, block compression {}",
        header.maxbits,
        header.block_compress
    );

    let dict_entries = 1u32 << header.maxbits;
    let dict_offset = if header.block_compress {
        DICT_OFFSET
    } else {
        DICT_OFFSET - 1
    };
    let mut dict = FlatDict::new(dict_entries, dict_offset);
    let mut next_free = dict_offset as u32;

    let mut out_buf: Vec<u8> = Vec::with_capacity(2 * BUFFER_SIZE);
    let mut bytes_out: u64 = 0;

    // The first code must be a literal; nothing else can be in the
    // dictionary yet.
    let mut prev = match reader.read_code().map_err(LzwError::Read)? {
        None => return Ok(-1.0),
        Some(code) if code > 0xFF => {
            return Err(LzwError::Format("first code is not a literal"))
        }
        Some(code) => code,
    };
    out_buf.push(prev as u8);
    bytes_out += 1;

    while let Some(code) = reader.read_code().map_err(LzwError::Read)? {
        if code as u32 > next_free {
            return Err(LzwError::Format("code outside the dictionary"));
        }

        if header.block_compress && code == CLEAR_CODE {
            if !reader.discard_padding().map_err(LzwError::Read)? {
                return Err(LzwError::Format("truncated padding after clear code"));
            }
            next_free = dict_offset as u32;
            reader.set_width(9);
            trace!("dictionary cleared at input byte {}", reader.bytes_in());

            prev = match reader.read_code().map_err(LzwError::Read)? {
                None => break,
                Some(code) if code > 0xFF => {
                    return Err(LzwError::Format("first code after clear is not a literal"))
                }
                Some(code) => code,
            };
            out_buf.push(prev as u8);
            bytes_out += 1;
        } else {
            // A code equal to next_free refers to the entry being built
            // right now: its expansion is the previous one plus the
            // previous one's first byte.
            let not_yet_defined = code as u32 == next_free;
            let expanded = if not_yet_defined { prev } else { code };
            let first = dict.expand(expanded, &mut out_buf);
            if not_yet_defined {
                out_buf.push(first);
            }
            bytes_out += 1 + dict.scratch.len() as u64 + not_yet_defined as u64;

            if next_free < dict_entries {
                dict.insert(next_free as u16, prev, first);
                next_free += 1;
                // Mirror the compressor's width growth, including the 10
                // bit codes it emits when the maximum width is 9.
                if next_free & (next_free - 1) == 0
                    && (reader.width() < header.maxbits || reader.width() == 9)
                {
                    if !reader.discard_padding().map_err(LzwError::Read)? {
                        return Err(LzwError::Format("truncated padding at width change"));
                    }
                    reader.set_width(reader.width() + 1);
                }
            }
            prev = code;
        }

        if out_buf.len() >= BUFFER_SIZE {
            output.write_all(&out_buf).map_err(LzwError::Write)?;
            out_buf.clear();
        }
    }

    output.write_all(&out_buf).map_err(LzwError::Write)?;
    output.flush().map_err(LzwError::Write)?;

    debug!("expanded {} bytes to {}", reader.bytes_in(), bytes_out);
    Ok(1.0 - reader.bytes_in() as f64 / bytes_out as f64)
}

#[cfg(test)]
mod test {
    use super::decompress;
    use crate::compression::LzwError;

    #[test]
    fn header_only_stream_is_empty() {
        let mut out = Vec::new();
        let ratio = decompress(&[0x1F, 0x9D, 0x90][..], &mut out, &[]).unwrap();
        assert!(out.is_empty());
        assert_eq!(ratio, -1.0);
    }

    #[test]
    fn rejects_short_files() {
        let mut out = Vec::new();
        let result = decompress(&[0x1F, 0x9D][..], &mut out, &[]);
        assert!(matches!(result, Err(LzwError::Format(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn rejects_reserved_flags() {
        let mut out = Vec::new();
        let result = decompress(&[0x1F, 0x9D, 0xA0, 0x00][..], &mut out, &[]);
        assert!(matches!(result, Err(LzwError::Format(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn rejects_codes_beyond_the_dictionary() {
        // Codes 65 and then 300; only 257 entries exist at that point.
        let mut data = vec![0x1F, 0x9D, 0x90];
        data.extend(pack9(&[65, 300]));
        let mut out = Vec::new();
        let result = decompress(&data[..], &mut out, &[]);
        assert!(matches!(result, Err(LzwError::Format(_))));
    }

    #[test]
    fn rejects_a_leading_non_literal() {
        let mut data = vec![0x1F, 0x9D, 0x90];
        data.extend(pack9(&[257]));
        let mut out = Vec::new();
        let result = decompress(&data[..], &mut out, &[]);
        assert!(matches!(result, Err(LzwError::Format(_))));
    }

    #[test]
    fn prefix_and_stream_are_one_input() {
        // The literal sequence "ab" split between prefix and stream.
        let mut data = vec![0x1F, 0x9D, 0x90];
        data.extend(pack9(&[97, 98]));
        let (prefix, rest) = data.split_at(3);
        let mut out = Vec::new();
        decompress(rest, &mut out, prefix).unwrap();
        assert_eq!(out, b"ab");
    }

    /// Pack codes as 9 bit little-endian values, the way the writer does.
    fn pack9(codes: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut queue = 0u32;
        let mut bits = 0;
        for &code in codes {
            queue |= (code as u32) << bits;
            bits += 9;
            while bits >= 8 {
                out.push((queue & 0xFF) as u8);
                queue >>= 8;
                bits -= 8;
            }
        }
        if bits > 0 {
            out.push((queue & 0xFF) as u8);
        }
        out
    }
}
