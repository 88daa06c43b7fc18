use std::io::{self, Write};

/// How many bytes we buffer internally before pushing them to the sink.
const BUFFER_SIZE: usize = 32 * 1024;

/// Writes variable-width codes to an output stream. Codes are packed
/// little-endian, least significant bit first, which is what every known
/// implementation of compress produces. The writer also tracks how many
/// whole bytes were emitted since the last width change so that the group
/// padding rule can be applied at each transition.
pub struct BitWriter<W> {
    sink: W,
    buffer: Vec<u8>,
    /// Pending bits, newest above the oldest. Never holds more than 23 bits.
    queue: u32,
    q_bits: u8,
    width: u8,
    bytes_in_group: u64,
    bytes_out: u64,
}

impl<W: Write> BitWriter<W> {
    /// Create a new BitWriter starting at the initial 9 bit code width.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            buffer: Vec::with_capacity(BUFFER_SIZE),
            queue: 0,
            q_bits: 0,
            width: 9,
            bytes_in_group: 0,
            bytes_out: 0,
        }
    }

    /// The current code width in bits.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Change the code width. Callers must pad the group first.
    pub fn set_width(&mut self, width: u8) {
        self.width = width;
    }

    /// Whole bytes pushed to the stream so far. Partial bytes still in the
    /// bit queue are not counted until they complete.
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Put a raw byte on the stream, outside of any code group. Only used
    /// for the file header, before any code has been written.
    pub fn put_byte(&mut self, byte: u8) -> io::Result<()> {
        self.push_byte(byte)?;
        self.bytes_out += 1;
        Ok(())
    }

    /// Append one code at the current width.
    pub fn write_code(&mut self, code: u16) -> io::Result<()> {
        self.queue |= (code as u32) << self.q_bits;
        self.q_bits += self.width;
        while self.q_bits >= 8 {
            self.push_byte((self.queue & 0xFF) as u8)?;
            self.queue >>= 8;
            self.q_bits -= 8;
            self.bytes_in_group += 1;
            self.bytes_out += 1;
        }
        Ok(())
    }

    /// Apply the group padding rule for the current width: complete any
    /// partial byte with zero bits, then emit zero bytes until the number of
    /// bytes written at this width is a multiple of the width. Must be
    /// called before the width changes and after a clear code.
    pub fn pad_group(&mut self) -> io::Result<()> {
        if self.q_bits > 0 {
            self.push_byte((self.queue & 0xFF) as u8)?;
            self.queue = 0;
            self.q_bits = 0;
            self.bytes_in_group += 1;
            self.bytes_out += 1;
        }
        let misalignment = self.bytes_in_group % self.width as u64;
        self.bytes_in_group = 0;
        if misalignment == 0 {
            return Ok(());
        }
        for _ in 0..self.width as u64 - misalignment {
            self.push_byte(0)?;
            self.bytes_out += 1;
        }
        Ok(())
    }

    /// Complete any partial byte and flush everything to the sink. Returns
    /// the total number of bytes written to the stream. Must be called
    /// before the writer is dropped or the tail of the stream is lost.
    pub fn finish(mut self) -> io::Result<u64> {
        if self.q_bits > 0 {
            let byte = (self.queue & 0xFF) as u8;
            self.push_byte(byte)?;
            self.q_bits = 0;
            self.bytes_out += 1;
        }
        self.sink.write_all(&self.buffer)?;
        self.sink.flush()?;
        Ok(self.bytes_out)
    }

    fn push_byte(&mut self, byte: u8) -> io::Result<()> {
        self.buffer.push(byte);
        if self.buffer.len() >= BUFFER_SIZE {
            self.sink.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }
}
