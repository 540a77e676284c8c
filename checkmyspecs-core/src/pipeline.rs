//! Check Pipeline - Single Entry Point
//!
//! `evaluate` resolves the spec, gates on the declared container type and
//! routes to the matching extractor/validator pair. It never fails: every
//! error becomes a verdict.

use tracing::{debug, info, warn};

use crate::catalog::{FileType, FormatFamily, Requirements, SpecCatalog, SpecProfile};
use crate::extract::{extract_raster, PageExtractor};
use crate::validation::{PageValidator, RasterValidator, Verdict};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static EXTRACTION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_extraction_call_count() -> u32 {
    EXTRACTION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_extraction_call_count() {
    EXTRACTION_CALL_COUNT.store(0, Ordering::SeqCst);
}

pub const UNKNOWN_SPEC_MESSAGE: &str = "Unknown spec selected.";
pub const UNSUPPORTED_MESSAGE: &str = "Unsupported file format. Only JPG and PDF are allowed.";
pub const WRONG_TYPE_MESSAGE: &str = "Wrong file type for the selected spec.";
pub const UNREADABLE_JPG_MESSAGE: &str = "Unable to read JPG file.";
pub const UNREADABLE_PDF_MESSAGE: &str = "Unable to read PDF file.";

/// The check pipeline. Holds only read-only state, so one instance can
/// serve any number of concurrent requests.
pub struct CheckPipeline {
    catalog: SpecCatalog,
    raster_validator: RasterValidator,
    page_validator: PageValidator,
    page_extractor: PageExtractor,
}

impl CheckPipeline {
    pub fn new(catalog: SpecCatalog) -> Self {
        Self {
            catalog,
            raster_validator: RasterValidator::new(),
            page_validator: PageValidator::new(),
            page_extractor: PageExtractor::new(),
        }
    }

    /// Swap the page extractor, e.g. for one with a different colour probe.
    pub fn with_page_extractor(mut self, extractor: PageExtractor) -> Self {
        self.page_extractor = extractor;
        self
    }

    pub fn catalog(&self) -> &SpecCatalog {
        &self.catalog
    }

    /// Spec names for a selection list, in catalog order.
    pub fn spec_names(&self) -> Vec<&str> {
        self.catalog.names()
    }

    /// Check `bytes` (uploaded as `filename`) against the spec called `spec_name`.
    ///
    /// The filename extension alone decides the container type; content is
    /// only inspected once the type matches the spec's format family.
    pub fn evaluate(&self, bytes: &[u8], spec_name: &str, filename: &str) -> Verdict {
        let Some(profile) = self.catalog.get(spec_name) else {
            warn!(spec = spec_name, "unknown spec requested");
            return Verdict::error(UNKNOWN_SPEC_MESSAGE);
        };

        let Some(file_type) = FileType::from_filename(filename) else {
            debug!(filename, "unsupported container type");
            return Verdict::fail(
                UNSUPPORTED_MESSAGE,
                vec!["Accepted file types are JPG (digital boards) and PDF (static boards)".to_string()],
            );
        };

        if file_type.family() != profile.family() {
            debug!(filename, ?file_type, family = ?profile.family(), "container does not match spec family");
            return wrong_file_type(profile.family());
        }

        let verdict = match file_type {
            FileType::Jpg => self.check_raster(bytes, profile),
            FileType::Pdf => self.check_page_doc(bytes, profile),
        };
        info!(spec = spec_name, filename, status = ?verdict.status, issues = verdict.issues.len(), "artwork checked");
        verdict
    }

    /// Raster checks for a digital profile.
    pub fn check_raster(&self, bytes: &[u8], profile: &SpecProfile) -> Verdict {
        let Requirements::Digital(required) = &profile.requirements else {
            return wrong_file_type(profile.family());
        };

        #[cfg(feature = "test-hooks")]
        EXTRACTION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        match extract_raster(bytes) {
            Ok(attrs) => self.raster_validator.validate(
                &profile.name,
                &attrs,
                required,
                self.catalog.tolerances(),
            ),
            Err(e) => {
                warn!(error = %e, "raster extraction failed");
                Verdict::fail(
                    UNREADABLE_JPG_MESSAGE,
                    vec!["File cannot be opened as an image".to_string()],
                )
            }
        }
    }

    /// Page-description checks for a static profile. Resolution figures for
    /// embedded images assume each image spans the full page.
    pub fn check_page_doc(&self, bytes: &[u8], profile: &SpecProfile) -> Verdict {
        let Requirements::Static(required) = &profile.requirements else {
            return wrong_file_type(profile.family());
        };

        #[cfg(feature = "test-hooks")]
        EXTRACTION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        match self.page_extractor.extract(bytes) {
            Ok(attrs) => self.page_validator.validate(
                &profile.name,
                &attrs,
                required,
                self.catalog.tolerances(),
            ),
            Err(e) => {
                warn!(error = %e, "page extraction failed");
                Verdict::fail(
                    UNREADABLE_PDF_MESSAGE,
                    vec!["File cannot be opened as a PDF document".to_string()],
                )
            }
        }
    }
}

fn wrong_file_type(family: FormatFamily) -> Verdict {
    let label = match family {
        FormatFamily::Digital => "Digital",
        FormatFamily::Static => "Static",
    };
    Verdict::fail(
        WRONG_TYPE_MESSAGE,
        vec![format!("{} specs require a {} file", label, family.required_file().as_str())],
    )
}

impl Default for CheckPipeline {
    fn default() -> Self {
        Self::new(SpecCatalog::builtin().clone())
    }
}
