//! Output-side module: the in-memory file, the low-level TIFF container
//! writer and the DNG assembly on top of them.

pub mod directory;
pub mod memfile;
pub mod standard_dng_writer;
pub mod types;
pub mod writer;

pub use directory::{DirectoryWriter, TiffWriter};
pub use memfile::MemFile;
pub use standard_dng_writer::StandardDngWriter;
pub use writer::{DngWriter, TiffOutput};
