//! Pipeline conversions module
//!
//! This module contains the orchestration logic driving unpack, thumbnail
//! scan and DNG encoding for one request.

pub mod raw_to_dng;


pub use raw_to_dng::{PackResult, RawToDngPipeline};
