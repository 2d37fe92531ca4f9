//! In-memory RAW to DNG packing engine.
//!
//! Takes a MIPI CSI-2 packed Bayer frame (8, 10, 12 or 16 bits per pixel)
//! plus an optional JPEG thumbnail and produces a complete DNG file buffer,
//! without touching the filesystem or re-encoding the thumbnail.

pub mod dng_pipeline;
pub mod logger;
