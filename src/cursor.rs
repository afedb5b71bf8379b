//! Byte cursor over an in-memory JPEG stream.

/// Cursor over a borrowed byte buffer with big-endian integer reads.
///
/// Reads that would run past the end of the buffer yield `0` instead of
/// failing, so a truncated stream decodes as zero-valued trailing fields
/// rather than aborting the dump.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, position: 0 }
    }

    /// Current byte offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes left in the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.position)
    }

    /// Returns the `width`-byte big-endian unsigned integer at the current
    /// position without advancing.
    ///
    /// `width` must be 1, 2, or 4. Returns `0` when fewer than `width` bytes
    /// remain.
    pub fn peek_int(&self, width: usize) -> u32 {
        debug_assert!(matches!(width, 1 | 2 | 4));
        match self.buf.get(self.position..self.position + width) {
            Some(bytes) => bytes.iter().fold(0, |acc, &b| acc << 8 | u32::from(b)),
            None => {
                log::debug!(
                    "{width}-byte read at offset {} runs past end of {}-byte buffer",
                    self.position,
                    self.buf.len(),
                );
                0
            }
        }
    }

    /// Same as [`ByteCursor::peek_int`], then advances by `width` bytes.
    pub fn read_int(&mut self, width: usize) -> u32 {
        let value = self.peek_int(width);
        self.position += width;
        value
    }

    /// Advances past a single byte.
    #[inline]
    pub fn skip(&mut self) {
        self.position += 1;
    }

    /// True while at least one byte remains.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.position < self.buf.len()
    }

    /// Guard for 2-byte reads near the end of the buffer. Assumed to hold
    /// within the first 10 bytes of the stream.
    #[inline]
    pub fn has_2_next(&self) -> bool {
        self.position <= 10 || self.position + 1 < self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_reads() {
        let mut cursor = ByteCursor::new(&[0x12, 0x34, 0x56, 0x78, 0x9A]);
        assert_eq!(cursor.peek_int(1), 0x12);
        assert_eq!(cursor.peek_int(2), 0x1234);
        assert_eq!(cursor.peek_int(4), 0x12345678);
        // Peeking does not advance.
        assert_eq!(cursor.position(), 0);

        assert_eq!(cursor.read_int(2), 0x1234);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.read_int(1), 0x56);
        assert_eq!(cursor.read_int(2), 0x789A);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn reads_past_end_yield_zero() {
        let mut cursor = ByteCursor::new(&[0xAB]);
        assert_eq!(cursor.peek_int(2), 0);
        assert_eq!(cursor.peek_int(4), 0);
        assert_eq!(cursor.read_int(2), 0);
        // Position advances past the end; later reads stay at zero.
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.read_int(1), 0);
        assert_eq!(cursor.read_int(4), 0);
    }

    #[test]
    fn has_next_flips_at_exhaustion() {
        let mut cursor = ByteCursor::new(&[1, 2]);
        assert!(cursor.has_next());
        cursor.skip();
        assert!(cursor.has_next());
        cursor.skip();
        assert!(!cursor.has_next());
    }

    #[test]
    fn has_2_next_heuristic() {
        // Assumed true within the first 10 bytes, even on an empty buffer.
        let cursor = ByteCursor::new(&[]);
        assert!(cursor.has_2_next());

        let mut cursor = ByteCursor::new(&[0; 13]);
        for _ in 0..10 {
            cursor.skip();
        }
        assert!(cursor.has_2_next()); // position 10, still assumed
        cursor.skip();
        assert!(cursor.has_2_next()); // position 11, bytes 11 and 12 remain
        cursor.skip();
        assert!(!cursor.has_2_next()); // position 12, only byte 12 remains
    }
}
