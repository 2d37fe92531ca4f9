//! Low-level TIFF container writer.
//!
//! `TiffWriter` owns the output stream and the file header; `DirectoryWriter`
//! collects tag/value pairs for one IFD and serializes them in one shot.
//! Directories are emitted after their image data, so strip offsets and
//! sub-directory offsets are known before the entry table is written.

use std::io::{self, Seek, SeekFrom, Write};

use crate::dng_pipeline::tiff::types::Value;

const TIFF_MAGIC: u16 = 42;

/// Byte offset of the IFD0 pointer inside the file header.
const IFD0_POINTER_OFFSET: u64 = 4;

pub struct TiffWriter<W: Write + Seek> {
    inner: W,
}

impl<W: Write + Seek> TiffWriter<W> {
    /// Writes the little-endian classic TIFF header with a placeholder IFD0
    /// offset; `finish` patches it once the directory chain is known.
    pub fn new(mut inner: W) -> io::Result<Self> {
        inner.write_all(b"II")?;
        inner.write_all(&TIFF_MAGIC.to_le_bytes())?;
        inner.write_all(&0u32.to_le_bytes())?;
        Ok(Self { inner })
    }

    /// Current write offset. Classic TIFF offsets are 32-bit, so running
    /// past 4 GiB is an encode error.
    pub fn position(&mut self) -> io::Result<u32> {
        let position = self.inner.stream_position()?;
        u32::try_from(position)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "output exceeds 4 GiB"))
    }

    /// Pads the stream to the next word boundary. TIFF requires even value
    /// and directory offsets.
    pub fn align_word(&mut self) -> io::Result<()> {
        if self.inner.stream_position()? % 2 != 0 {
            self.inner.write_all(&[0])?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }

    /// Writes a strip of image data at the next word boundary and returns
    /// its offset.
    pub fn write_strip(&mut self, data: &[u8]) -> io::Result<u32> {
        self.align_word()?;
        let offset = self.position()?;
        self.inner.write_all(data)?;
        Ok(offset)
    }

    /// Patches the header to point at the first directory and returns the
    /// underlying stream.
    pub fn finish(mut self, ifd0_offset: u32) -> io::Result<W> {
        self.inner.seek(SeekFrom::Start(IFD0_POINTER_OFFSET))?;
        self.inner.write_all(&ifd0_offset.to_le_bytes())?;
        Ok(self.inner)
    }
}

struct DirectoryEntry {
    tag: u16,
    field_type: u16,
    count: u32,
    data: Vec<u8>,
}

/// Collects the tags of one image file directory.
///
/// All tags must be set before `build`; the serialized table sorts entries
/// ascending by tag number as TIFF requires, inlines values of up to four
/// bytes, and stores larger values before the table.
#[derive(Default)]
pub struct DirectoryWriter {
    entries: Vec<DirectoryEntry>,
}

impl DirectoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a tag, replacing any previous value for the same tag.
    pub fn set_tag<V: Into<Value>>(&mut self, tag: u16, value: V) {
        let value = value.into();
        let entry = DirectoryEntry {
            tag,
            field_type: value.field_type(),
            count: value.count(),
            data: value.to_bytes(),
        };

        match self.entries.iter_mut().find(|e| e.tag == tag) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Serializes the directory at the writer's current position and
    /// returns the directory offset. The next-IFD pointer is left zero;
    /// chaining happens through `SubIFDs` entries.
    pub fn build<W: Write + Seek>(mut self, tiff: &mut TiffWriter<W>) -> io::Result<u32> {
        self.entries.sort_by_key(|e| e.tag);

        // Out-of-line values go first so their offsets are known when the
        // entry table is written.
        let mut value_offsets = vec![0u32; self.entries.len()];
        for (entry, offset) in self.entries.iter().zip(value_offsets.iter_mut()) {
            if entry.data.len() > 4 {
                tiff.align_word()?;
                *offset = tiff.position()?;
                tiff.write_bytes(&entry.data)?;
            }
        }

        tiff.align_word()?;
        let ifd_offset = tiff.position()?;

        tiff.write_bytes(&(self.entries.len() as u16).to_le_bytes())?;
        for (entry, value_offset) in self.entries.iter().zip(value_offsets) {
            tiff.write_bytes(&entry.tag.to_le_bytes())?;
            tiff.write_bytes(&entry.field_type.to_le_bytes())?;
            tiff.write_bytes(&entry.count.to_le_bytes())?;
            if entry.data.len() > 4 {
                tiff.write_bytes(&value_offset.to_le_bytes())?;
            } else {
                let mut inline = [0u8; 4];
                inline[..entry.data.len()].copy_from_slice(&entry.data);
                tiff.write_bytes(&inline)?;
            }
        }
        tiff.write_bytes(&0u32.to_le_bytes())?;

        Ok(ifd_offset)
    }
}
