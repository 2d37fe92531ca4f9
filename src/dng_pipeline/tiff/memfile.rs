//! Growable in-memory file backing the DNG encoder.
//!
//! The encoder needs file semantics (read, write, seek, size) without
//! touching the filesystem, so the buffer implements the std I/O traits and
//! hands its contents out when encoding is done.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Capacity floor for the first allocation and for every growth step.
const GROW_FLOOR: usize = 1024;

/// In-memory random-access file.
///
/// Tracks three quantities: `capacity` (allocated bytes), `size` (high-water
/// mark of bytes written) and `cursor` (current read/write offset). Writes
/// and seeks past the current capacity grow it to twice the required offset;
/// a cursor moved past `size` extends `size` to match.
#[derive(Debug, Default)]
pub struct MemFile {
    data: Vec<u8>,
    size: usize,
    cursor: usize,
}

impl MemFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a file with `capacity` bytes preallocated, so a well-sized
    /// encode run never reallocates.
    pub fn with_capacity(capacity: usize) -> io::Result<Self> {
        let capacity = capacity.max(GROW_FLOOR);
        let mut data = Vec::new();
        data.try_reserve_exact(capacity).map_err(|_| {
            io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("cannot preallocate {} bytes", capacity),
            )
        })?;
        data.resize(capacity, 0);
        Ok(Self {
            data,
            size: 0,
            cursor: 0,
        })
    }

    /// Logical size: the furthest offset ever written or seeked to.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Allocated bytes; always at least `position()`.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Consumes the file and returns its contents, truncated to the logical
    /// size.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.data.truncate(self.size);
        self.data
    }

    fn grow(&mut self, needed: usize) -> io::Result<()> {
        if needed <= self.data.len() {
            return Ok(());
        }

        let new_capacity = needed.saturating_mul(2).max(GROW_FLOOR);
        self.data
            .try_reserve_exact(new_capacity - self.data.len())
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    format!("cannot grow buffer to {} bytes", new_capacity),
                )
            })?;
        self.data.resize(new_capacity, 0);

        Ok(())
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let end = self.cursor.checked_add(buf.len()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "write past addressable range")
        })?;
        self.grow(end)?;

        self.data[self.cursor..end].copy_from_slice(buf);
        self.cursor = end;
        if self.cursor > self.size {
            self.size = self.cursor;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => self.cursor as i128 + i128::from(delta),
            SeekFrom::End(delta) => self.size as i128 + i128::from(delta),
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of buffer",
            ));
        }
        let target = usize::try_from(target).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek past addressable range")
        })?;

        self.grow(target)?;
        self.cursor = target;
        if self.cursor > self.size {
            self.size = self.cursor;
        }

        Ok(self.cursor as u64)
    }
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.size.saturating_sub(self.cursor);
        let count = buf.len().min(available);
        buf[..count].copy_from_slice(&self.data[self.cursor..self.cursor + count]);
        self.cursor += count;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_advances_cursor_and_size() {
        let mut file = MemFile::new();
        file.write_all(b"abcdef").unwrap();
        assert_eq!(file.position(), 6);
        assert_eq!(file.len(), 6);
        assert!(file.capacity() >= 6);
    }

    #[test]
    fn test_growth_floor_and_doubling() {
        let mut file = MemFile::new();
        file.write_all(&[1]).unwrap();
        assert_eq!(file.capacity(), 1024);

        file.seek(SeekFrom::Start(4000)).unwrap();
        assert!(file.capacity() >= 2 * 4000);
        file.write_all(&[2]).unwrap();
        assert_eq!(file.len(), 4001);
    }

    #[test]
    fn test_cursor_never_exceeds_capacity() {
        let mut file = MemFile::new();
        for step in [10usize, 1000, 5000, 2, 80000] {
            file.seek(SeekFrom::Current(step as i64)).unwrap();
            assert!(file.position() <= file.capacity());
            file.write_all(&[0xAB]).unwrap();
            assert!(file.position() <= file.capacity());
        }
    }

    #[test]
    fn test_seek_past_end_extends_size() {
        let mut file = MemFile::new();
        file.seek(SeekFrom::Start(100)).unwrap();
        assert_eq!(file.len(), 100);
    }

    #[test]
    fn test_backward_seek_write_does_not_shrink_size() {
        let mut file = MemFile::new();
        file.write_all(&[0u8; 64]).unwrap();
        file.seek(SeekFrom::Start(4)).unwrap();
        file.write_all(b"xy").unwrap();
        assert_eq!(file.len(), 64);
        assert_eq!(file.position(), 6);
    }

    #[test]
    fn test_seek_whence_variants() {
        let mut file = MemFile::new();
        file.write_all(&[0u8; 10]).unwrap();
        assert_eq!(file.seek(SeekFrom::Start(3)).unwrap(), 3);
        assert_eq!(file.seek(SeekFrom::Current(2)).unwrap(), 5);
        assert_eq!(file.seek(SeekFrom::End(-4)).unwrap(), 6);
        assert!(file.seek(SeekFrom::Current(-7)).is_err());
    }

    #[test]
    fn test_read_is_bounded_by_size() {
        let mut file = MemFile::new();
        file.write_all(b"hello").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(file.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"hello");
        assert_eq!(file.read(&mut buf).unwrap(), 0);

        // Capacity beyond `size` is never readable.
        file.seek(SeekFrom::Start(200)).unwrap();
        file.seek(SeekFrom::Start(190)).unwrap();
        assert_eq!(file.read(&mut buf).unwrap(), 10);
    }

    #[test]
    fn test_into_bytes_truncates_to_logical_size() {
        let mut file = MemFile::new();
        file.write_all(b"dng").unwrap();
        assert!(file.capacity() > 3);
        assert_eq!(file.into_bytes(), b"dng".to_vec());
    }
}
