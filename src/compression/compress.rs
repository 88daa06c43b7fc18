use std::io::{Read, Write};

use log::{debug, trace};

use crate::bitstream::bitwriter::BitWriter;

use super::hash_dict::{HashDict, Probe};
use super::header::{Header, MAX_BITS, MIN_BITS};
use super::{LzwError, CLEAR_CODE, DICT_OFFSET};

/// How many input bytes pass between two looks at the compression ratio.
/// Historical convention; the value affects compression quality only.
const CHECK_INTERVAL: u64 = 5000;

const BUFFER_SIZE: usize = 32 * 1024;

/// Watches the running compression ratio once the dictionary is full. The
/// dictionary is cleared when the ratio drops below the best one seen so
/// far, meaning the dictionary has gone stale for the data now coming in.
struct RatioWatch {
    best: f64,
    check_offset: u64,
}

impl RatioWatch {
    fn new() -> Self {
        Self {
            best: 0.0,
            check_offset: CHECK_INTERVAL,
        }
    }

    /// True when the dictionary should be cleared. Consulted on every
    /// discarded entry, but only acts once per CHECK_INTERVAL input bytes.
    fn should_clear(&mut self, bytes_in: u64, bytes_out: u64) -> bool {
        if bytes_in < self.check_offset {
            return false;
        }
        self.check_offset = bytes_in + CHECK_INTERVAL;
        let ratio = bytes_in as f64 / bytes_out as f64;
        if ratio >= self.best {
            self.best = ratio;
            false
        } else {
            self.best = 0.0;
            true
        }
    }
}

/// Compress `input` into the .Z format on `output`, using codes of at most
/// `maxbits` bits. Returns the size ratio 1 - output/input, or -1.0 for an
/// empty input (which still produces the three header bytes).
///
/// A `maxbits` of 9 reproduces the historical quirk where codes still grow
/// to 10 bits once the dictionary fills; avoid it unless you need it.
pub fn compress(
    mut input: impl Read,
    output: impl Write,
    maxbits: u8,
) -> Result<f64, LzwError> {
    assert!(
        (MIN_BITS..=MAX_BITS).contains(&maxbits),
        "maxbits must be between 9 and 16"
    );

    let mut writer = BitWriter::new(output);
    for byte in Header::new(maxbits).to_bytes() {
        writer.put_byte(byte).map_err(LzwError::Write)?;
    }

    let mut chunk = vec![0u8; BUFFER_SIZE];
    let mut len = input.read(&mut chunk).map_err(LzwError::Read)?;
    if len == 0 {
        writer.finish().map_err(LzwError::Write)?;
        return Ok(-1.0);
    }

    let dict_entries = 1u32 << maxbits;
    let mut dict = HashDict::new();
    let mut next_free = DICT_OFFSET as u32;
    let mut ratio = RatioWatch::new();

    // The first byte starts the current sequence; every further byte either
    // extends it or forces the code for it onto the stream.
    let mut cur = chunk[0] as u16;
    let mut pos = 1;
    let mut bytes_in: u64 = 1;

    loop {
        if pos >= len {
            len = input.read(&mut chunk).map_err(LzwError::Read)?;
            if len == 0 {
                break;
            }
            pos = 0;
        }
        let byte = chunk[pos];
        pos += 1;
        bytes_in += 1;

        let slot = match dict.probe(cur, byte) {
            Probe::Found(code) => {
                cur = code;
                continue;
            }
            Probe::Vacant(slot) => slot,
        };

        writer.write_code(cur).map_err(LzwError::Write)?;

        // The 9 bit quirk: with maxbits 9 the dictionary fills before the
        // width ever needs to grow, yet historical compress grows it anyway
        // and emits 10 bit codes whose high bit is always zero.
        if next_free == 512 && maxbits == 9 && writer.width() == 9 {
            writer.pad_group().map_err(LzwError::Write)?;
            writer.set_width(10);
        }

        if next_free < dict_entries {
            dict.insert(slot, next_free as u16, cur, byte);
            // A new code crossed a power of two: all further codes are
            // emitted one bit wider, after the group padding.
            if next_free & (next_free - 1) == 0 {
                writer.pad_group().map_err(LzwError::Write)?;
                writer.set_width(writer.width() + 1);
            }
            next_free += 1;
        } else if ratio.should_clear(bytes_in, writer.bytes_out()) {
            writer.write_code(CLEAR_CODE).map_err(LzwError::Write)?;
            writer.pad_group().map_err(LzwError::Write)?;
            dict.clear();
            next_free = DICT_OFFSET as u32;
            writer.set_width(9);
            trace!("dictionary cleared at input byte {}", bytes_in);
        }
        cur = byte as u16;
    }

    writer.write_code(cur).map_err(LzwError::Write)?;
    let bytes_out = writer.finish().map_err(LzwError::Write)?;

    debug!("compressed {} bytes to {}", bytes_in, bytes_out);
    Ok(1.0 - bytes_out as f64 / bytes_in as f64)
}

#[cfg(test)]
mod test {
    use super::{compress, RatioWatch};

    #[test]
    fn empty_input_is_just_the_header() {
        let mut out = Vec::new();
        let ratio = compress(std::io::empty(), &mut out, 16).unwrap();
        assert_eq!(out, vec![0x1F, 0x9D, 0x90]);
        assert_eq!(ratio, -1.0);
    }

    #[test]
    fn header_carries_the_requested_width() {
        for maxbits in 9..=16 {
            let mut out = Vec::new();
            compress(&b"abc"[..], &mut out, maxbits).unwrap();
            assert_eq!(out[..3], [0x1F, 0x9D, 0x80 | maxbits]);
        }
    }

    #[test]
    fn compression_is_deterministic() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
        let mut first = Vec::new();
        let mut second = Vec::new();
        compress(&data[..], &mut first, 13).unwrap();
        compress(&data[..], &mut second, 13).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_byte_input() {
        let mut out = Vec::new();
        let ratio = compress(&b"A"[..], &mut out, 16).unwrap();
        // Header plus one 9 bit code flushed into two bytes.
        assert_eq!(out.len(), 5);
        assert_eq!(out[3], b'A');
        assert_eq!(out[4], 0);
        assert!(ratio < 0.0);
    }

    #[test]
    fn runs_shrink() {
        let data = vec![b'A'; 4096];
        let mut out = Vec::new();
        let ratio = compress(&data[..], &mut out, 12).unwrap();
        assert!(out.len() < data.len());
        assert!(ratio > 0.0);
    }

    #[test]
    fn ratio_watch_waits_for_the_interval() {
        let mut watch = RatioWatch::new();
        assert!(!watch.should_clear(4999, 100));
        // First look establishes the best ratio.
        assert!(!watch.should_clear(5000, 1000));
        // Not consulted again until another interval has passed.
        assert!(!watch.should_clear(6000, 6000));
        // Improvement keeps the dictionary.
        assert!(!watch.should_clear(10_000, 1500));
        // Regression clears it.
        assert!(watch.should_clear(15_200, 4000));
        // And the best ratio starts over afterwards.
        assert!(!watch.should_clear(20_300, 10_000));
    }
}
