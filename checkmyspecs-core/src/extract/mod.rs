//! Attribute Extraction
//!
//! Turns uploaded bytes into measurable attributes. Extractors never judge;
//! the rules in [`crate::validation`] do.

use thiserror::Error;

pub mod jpeg;
pub mod page;
pub mod raster;

pub use page::{ColourSpaceProbe, PageAttributes, PageExtractor, TokenScanProbe};
pub use raster::{extract_raster, RasterAttributes};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Cannot decode image: {0}")]
    Decode(String),

    #[error("Cannot parse document: {0}")]
    Parse(String),
}

impl From<image::ImageError> for ExtractError {
    fn from(e: image::ImageError) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<lopdf::Error> for ExtractError {
    fn from(e: lopdf::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
