use crate::{CaffError, Result};

/// A cursor over borrowed bytes.
///
/// All decoders read through a `ByteReader` passed by `&mut`, so a caller can
/// see exactly how many bytes a nested decoder consumed. Reads never move the
/// cursor when they fail.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next byte to be read.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the next byte without consuming it.
    #[inline]
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Consumes `len` bytes.
    ///
    /// The length is checked against the remaining input before anything is
    /// touched, so callers may pass untrusted lengths.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.eof(len));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64_le(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Reads up to and including `delimiter`, looking at no more than `limit` bytes.
    ///
    /// Returns the bytes before the delimiter; the delimiter itself is consumed
    /// but not returned. `Ok(None)` means the delimiter is not within `limit`
    /// bytes. If the input ends before `limit` bytes could be searched, the
    /// result is [`CaffError::UnexpectedEof`].
    pub fn read_delimited(&mut self, delimiter: u8, limit: usize) -> Result<Option<&'a [u8]>> {
        let window_len = limit.min(self.remaining());
        let window = &self.data[self.pos..self.pos + window_len];
        match window.iter().position(|&b| b == delimiter) {
            Some(idx) => {
                self.pos += idx + 1;
                Ok(Some(&window[..idx]))
            }
            None if window_len < limit => Err(self.eof(window_len + 1)),
            None => Ok(None),
        }
    }

    fn eof(&self, needed: usize) -> CaffError {
        CaffError::UnexpectedEof {
            offset: self.pos,
            needed: needed.saturating_sub(self.remaining()),
        }
    }
}
