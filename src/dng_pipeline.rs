//! RAW to DNG packing pipeline
//!
//! This module provides a structured approach to packaging MIPI-packed
//! sensor frames as DNG files, with separate modules for bit-depth
//! unpacking, thumbnail header scanning, TIFF/DNG writing and pack
//! orchestration.

pub mod common;
pub mod conversions;
pub mod raw;
pub mod thumbnail;
pub mod tiff;

pub use common::{PackError, Result};

pub use raw::{CfaPattern, FrameLayout, MipiUnpacker, PackRequest, RawUnpacker, UnpackedPlane};

pub use thumbnail::{JpegInfo, Thumbnail};

pub use tiff::{DngWriter, MemFile, StandardDngWriter, TiffOutput};

pub use conversions::{PackResult, RawToDngPipeline};
