//! Check My Specs Core - Artwork Validation Engine
//!
//! Given uploaded artwork and the name of a board spec, decide whether the
//! file's measurable attributes match the spec.
//!
//! # Ground Rules
//! 1. Spec names are matched exactly
//! 2. The filename extension picks the container; the container must suit the board
//! 3. Every content rule runs; every violation is reported
//! 4. Nothing is persisted, nothing is cached
//! 5. Errors become verdicts, never panics

pub mod catalog;
pub mod extract;
pub mod hashing;
pub mod pipeline;
pub mod print;
pub mod report;
pub mod validation;

pub use catalog::{CatalogError, FileType, FormatFamily, Requirements, SpecCatalog, SpecProfile};
pub use extract::{ColourSpaceProbe, ExtractError, PageAttributes, PageExtractor, RasterAttributes, TokenScanProbe};
pub use hashing::{canonical_json, sha256_hex, verdict_digest};
pub use pipeline::CheckPipeline;
pub use print::{ColourModel, PageSize, Tolerances};
pub use report::{BatchReport, FileVerdict};
pub use validation::{ValidationRule, Verdict, VerdictStatus};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check `bytes`, uploaded as `filename`, against the built-in spec `spec_name`.
pub fn evaluate(bytes: &[u8], spec_name: &str, filename: &str) -> Verdict {
    lazy_static::lazy_static! {
        static ref PIPELINE: CheckPipeline = CheckPipeline::default();
    }
    PIPELINE.evaluate(bytes, spec_name, filename)
}
