//! A buffer-backed content capability, useful for tests, config overlays
//! and any data that already lives in memory.

use std::io::Cursor;

use crate::core::{Content, ReadStream, Result, VfsError};

/// Content backed by an in-process byte buffer.
///
/// The buffer can be invalidated to model a backend whose storage has gone
/// away (a closed archive, a reclaimed pool slot); an invalid backend
/// reports size 0 and refuses reads, per the content capability contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryContent {
    data: Vec<u8>,
    valid: bool,
}

impl MemoryContent {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            valid: true,
        }
    }

    /// Marks the content invalid; subsequent reads fail with
    /// [`VfsError::InvalidContent`] and `size()` reports 0.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

impl Content for MemoryContent {
    fn size(&self) -> u64 {
        if self.valid { self.data.len() as u64 } else { 0 }
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn read_into(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        if !self.valid {
            return Err(VfsError::InvalidContent);
        }
        let available = buf.len().saturating_sub(offset);
        if available < self.data.len() {
            return Err(VfsError::BufferTooSmall {
                needed: self.data.len(),
                available,
            });
        }
        if self.data.is_empty() {
            // Nothing to write; the offset may lie past the buffer's end.
            return Ok(0);
        }
        buf[offset..offset + self.data.len()].copy_from_slice(&self.data);
        Ok(self.data.len())
    }

    fn open_stream(&self) -> Result<Box<dyn ReadStream + '_>> {
        if !self.valid {
            return Err(VfsError::InvalidContent);
        }
        Ok(Box::new(Cursor::new(self.data.as_slice())))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn test_size_and_validity() {
        let mut content = MemoryContent::new(b"hello".to_vec());
        assert!(content.is_valid());
        assert_eq!(content.size(), 5);

        content.invalidate();
        assert!(!content.is_valid());
        assert_eq!(content.size(), 0);
    }

    #[test]
    fn test_read_into_at_offset() {
        let content = MemoryContent::new(b"abc".to_vec());
        let mut buf = [0u8; 5];

        let written = content.read_into(&mut buf, 2).unwrap();
        assert_eq!(written, 3);
        assert_eq!(&buf, b"\0\0abc");
    }

    #[test]
    fn test_read_into_small_buffer() {
        let content = MemoryContent::new(b"abcdef".to_vec());
        let mut buf = [0u8; 4];

        let err = content.read_into(&mut buf, 0).unwrap_err();
        match err {
            VfsError::BufferTooSmall { needed, available } => {
                assert_eq!(needed, 6);
                assert_eq!(available, 4);
            }
            other => panic!("unexpected error: {other}"),
        }

        // An offset past the end of the buffer leaves no room at all.
        let mut big = [0u8; 16];
        assert!(content.read_into(&mut big, 20).is_err());
    }

    #[test]
    fn test_read_into_empty_content_succeeds_at_any_offset() {
        let content = MemoryContent::new(Vec::new());

        // Zero bytes always fit, even when the offset lies past the end of
        // the buffer.
        let mut buf = [0u8; 4];
        assert_eq!(content.read_into(&mut buf, 10).unwrap(), 0);
        assert_eq!(content.read_into(&mut buf, 4).unwrap(), 0);
        assert_eq!(content.read_into(&mut [], 0).unwrap(), 0);
        assert_eq!(buf, [0u8; 4]);
    }

    #[test]
    fn test_invalid_content_refuses_access() {
        let mut content = MemoryContent::new(b"x".to_vec());
        content.invalidate();

        let mut buf = [0u8; 8];
        assert!(matches!(
            content.read_into(&mut buf, 0),
            Err(VfsError::InvalidContent)
        ));
        assert!(matches!(content.open_stream(), Err(VfsError::InvalidContent)));
    }

    #[test]
    fn test_stream_reads_whole_content() {
        let content = MemoryContent::new(b"streamed".to_vec());
        let mut stream = content.open_stream().unwrap();

        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"streamed");
    }
}
