//! In-memory byte source with bounds-checked read and seek.

use std::io::{self, Read, Seek, SeekFrom};

/// Owns a complete file image and serves reads against a cursor.
///
/// Invariant: `0 <= position <= len` at all times. A read past the end
/// returns fewer bytes (zero at end-of-stream, which is legitimate EOF).
/// Unlike plain `io::Seek` semantics, a seek whose target falls outside the
/// buffer is rejected and leaves the position unchanged.
#[derive(Debug)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: u64,
}

impl MemorySource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Total length of the underlying buffer in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read position. No side effects.
    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl Read for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remain = (self.len() - self.pos) as usize;
        let n = buf.len().min(remain);
        let start = self.pos as usize;
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for MemorySource {
    fn seek(&mut self, from: SeekFrom) -> io::Result<u64> {
        let len = self.data.len() as i64;
        let target = match from {
            SeekFrom::Start(offset) => i64::try_from(offset).ok(),
            SeekFrom::Current(delta) => (self.pos as i64).checked_add(delta),
            SeekFrom::End(delta) => len.checked_add(delta),
        };
        match target {
            Some(t) if (0..=len).contains(&t) => {
                self.pos = t as u64;
                Ok(self.pos)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek target outside the buffer",
            )),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.pos)
    }
}
