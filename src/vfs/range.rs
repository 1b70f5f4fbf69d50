//! A read-only window over a byte stream.
//!
//! Content backends use this to expose a sub-range of an underlying stream
//! (one entry of an archive, one record of a pack file) as an independent
//! stream. The tree itself never touches it.

use std::io::{self, Read, Seek, SeekFrom};

use crate::core::Result;

/// Bounds reads and seeks of an inner stream to `[start, start + len)`.
///
/// Positions are window-relative: position 0 is `start` of the inner
/// stream, and reads never cross the end of the window. Seeking past the
/// end is allowed (further reads return 0), seeking before the window's
/// origin is an error, matching `std::io` file semantics.
#[derive(Debug)]
pub struct RangeStream<S> {
    inner: S,
    start: u64,
    len: u64,
    pos: u64,
}

impl<S: Read + Seek> RangeStream<S> {
    /// Positions `inner` at `start` and bounds it to `len` bytes.
    pub fn new(mut inner: S, start: u64, len: u64) -> Result<Self> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self {
            inner,
            start,
            len,
            pos: 0,
        })
    }

    /// Window length in bytes (not the remaining count).
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Releases the wrapper, returning the inner stream at its current
    /// position.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read + Seek> Read for RangeStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.pos);
        if remaining == 0 {
            return Ok(0);
        }
        let max = buf.len().min(remaining.min(usize::MAX as u64) as usize);
        let n = self.inner.read(&mut buf[..max])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<S: Read + Seek> Seek for RangeStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::End(n) => self.len as i128 + n as i128,
            SeekFrom::Current(n) => self.pos as i128 + n as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the start of the range",
            ));
        }
        let target = target as u64;
        // Move the inner stream first; the window position only changes
        // once the inner seek has succeeded.
        self.inner.seek(SeekFrom::Start(self.start + target))?;
        self.pos = target;
        Ok(self.pos)
    }
}
