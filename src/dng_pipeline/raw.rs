//! Input-side module: raw frame description and MIPI unpacking.

pub mod mipi_unpacker;
pub mod types;
pub mod unpacker;

pub use mipi_unpacker::MipiUnpacker;
pub use types::{CfaPattern, FrameLayout, PackRequest, UnpackedPlane};
pub use unpacker::RawUnpacker;
