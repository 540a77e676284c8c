//! Validation System - Rules and Verdicts
//!
//! Rules compare extracted attributes with a profile's requirements and
//! produce human-readable issues. Every rule runs; the verdict carries all
//! of their issues in rule order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{DigitalRequirements, StaticRequirements};
use crate::extract::{PageAttributes, RasterAttributes};
use crate::print::Tolerances;

pub const FAIL_MESSAGE: &str = "Artwork does not meet the specifications.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Pass,
    Fail,
    Error,
}

/// Outcome of a single check, returned to the caller as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl Verdict {
    pub fn pass(spec_name: &str) -> Self {
        Self {
            status: VerdictStatus::Pass,
            message: format!("Artwork meets the {spec_name} specifications."),
            issues: vec![],
        }
    }

    pub fn fail(message: impl Into<String>, issues: Vec<String>) -> Self {
        Self {
            status: VerdictStatus::Fail,
            message: message.into(),
            issues,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Error,
            message: message.into(),
            issues: vec![],
        }
    }

    /// Pass when `issues` is empty, otherwise the generic failure headline.
    pub fn from_issues(spec_name: &str, issues: Vec<String>) -> Self {
        if issues.is_empty() {
            Self::pass(spec_name)
        } else {
            Self::fail(FAIL_MESSAGE, issues)
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == VerdictStatus::Pass
    }
}

/// A single independent check over attributes `A` against requirements `R`.
pub trait ValidationRule<A, R> {
    fn name(&self) -> &'static str;
    fn validate(&self, attrs: &A, required: &R, tolerances: &Tolerances) -> Vec<String>;
}

/// Runs a fixed list of rules and folds their issues into a verdict.
pub struct Validator<A, R> {
    rules: Vec<Box<dyn ValidationRule<A, R> + Send + Sync>>,
}

pub type RasterValidator = Validator<RasterAttributes, DigitalRequirements>;
pub type PageValidator = Validator<PageAttributes, StaticRequirements>;

impl<A, R> Validator<A, R> {
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, spec_name: &str, attrs: &A, required: &R, tolerances: &Tolerances) -> Verdict {
        let mut issues = vec![];
        for rule in &self.rules {
            let found = rule.validate(attrs, required, tolerances);
            if !found.is_empty() {
                debug!(rule = rule.name(), count = found.len(), "rule reported issues");
            }
            issues.extend(found);
        }
        Verdict::from_issues(spec_name, issues)
    }
}

impl RasterValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(ContainerFormatRule),
                Box::new(PixelDimensionsRule),
                Box::new(StoredResolutionRule),
                Box::new(ColourModeRule),
            ],
        }
    }
}

impl Default for RasterValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PageValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(PageCountRule),
                Box::new(PageSizeRule),
                Box::new(PageBoxRule),
                Box::new(OversizeRule),
                Box::new(ColourSpaceRule),
                Box::new(ImageResolutionRule),
            ],
        }
    }
}

impl Default for PageValidator {
    fn default() -> Self {
        Self::new()
    }
}

// --- Raster Rules ---

pub const JPEG_FORMAT_TAG: &str = "JPEG";

/// Content must really be JPEG, not something renamed to `.jpg`.
pub struct ContainerFormatRule;

impl ValidationRule<RasterAttributes, DigitalRequirements> for ContainerFormatRule {
    fn name(&self) -> &'static str { "container_format" }

    fn validate(&self, attrs: &RasterAttributes, _: &DigitalRequirements, _: &Tolerances) -> Vec<String> {
        if attrs.format == JPEG_FORMAT_TAG {
            vec![]
        } else {
            vec![format!("File is not a genuine JPG: detected {} content", attrs.format)]
        }
    }
}

pub struct PixelDimensionsRule;

impl ValidationRule<RasterAttributes, DigitalRequirements> for PixelDimensionsRule {
    fn name(&self) -> &'static str { "pixel_dimensions" }

    fn validate(&self, attrs: &RasterAttributes, required: &DigitalRequirements, _: &Tolerances) -> Vec<String> {
        let mut issues = vec![];
        if attrs.width != required.width_px {
            issues.push(format!(
                "Incorrect width: expected {}px, detected {}px",
                required.width_px, attrs.width
            ));
        }
        if attrs.height != required.height_px {
            issues.push(format!(
                "Incorrect height: expected {}px, detected {}px",
                required.height_px, attrs.height
            ));
        }
        issues
    }
}

/// Stored DPI metadata, horizontal component rounded to the nearest integer.
pub struct StoredResolutionRule;

impl ValidationRule<RasterAttributes, DigitalRequirements> for StoredResolutionRule {
    fn name(&self) -> &'static str { "stored_resolution" }

    fn validate(&self, attrs: &RasterAttributes, required: &DigitalRequirements, _: &Tolerances) -> Vec<String> {
        match attrs.dpi {
            None => vec![format!(
                "Missing DPI information: expected {} DPI",
                required.dpi
            )],
            Some((x, _)) if x.round() != required.dpi as f64 => vec![format!(
                "Incorrect DPI: expected {}, detected {}",
                required.dpi,
                x.round()
            )],
            Some(_) => vec![],
        }
    }
}

pub struct ColourModeRule;

impl ValidationRule<RasterAttributes, DigitalRequirements> for ColourModeRule {
    fn name(&self) -> &'static str { "colour_mode" }

    fn validate(&self, attrs: &RasterAttributes, required: &DigitalRequirements, _: &Tolerances) -> Vec<String> {
        if attrs.colour_mode == required.colour.as_str() {
            vec![]
        } else {
            vec![format!(
                "Incorrect colour mode: expected {}, detected {}",
                required.colour, attrs.colour_mode
            )]
        }
    }
}

// --- Page Rules ---

pub struct PageCountRule;

impl ValidationRule<PageAttributes, StaticRequirements> for PageCountRule {
    fn name(&self) -> &'static str { "page_count" }

    fn validate(&self, attrs: &PageAttributes, _: &StaticRequirements, _: &Tolerances) -> Vec<String> {
        if attrs.page_count == 1 {
            vec![]
        } else {
            vec![format!(
                "PDF must contain exactly one page: found {} pages",
                attrs.page_count
            )]
        }
    }
}

/// Two-sided size check of the MediaBox against the profile.
pub struct PageSizeRule;

impl ValidationRule<PageAttributes, StaticRequirements> for PageSizeRule {
    fn name(&self) -> &'static str { "page_size" }

    fn validate(&self, attrs: &PageAttributes, required: &StaticRequirements, tolerances: &Tolerances) -> Vec<String> {
        let expected = required.page_size();
        if attrs.media.matches(&expected, tolerances.geometry_mm) {
            vec![]
        } else {
            vec![format!(
                "Incorrect page size: expected {}, detected {}",
                expected, attrs.media
            )]
        }
    }
}

/// Trim, bleed and crop boxes that differ from the page mean printer's
/// marks or bleed were left in. Absent boxes are fine.
pub struct PageBoxRule;

impl ValidationRule<PageAttributes, StaticRequirements> for PageBoxRule {
    fn name(&self) -> &'static str { "page_boxes" }

    fn validate(&self, attrs: &PageAttributes, _: &StaticRequirements, tolerances: &Tolerances) -> Vec<String> {
        [("Trim", attrs.trim), ("Bleed", attrs.bleed), ("Crop", attrs.crop)]
            .into_iter()
            .filter_map(|(label, size)| {
                let size = size?;
                if size.matches(&attrs.media, tolerances.geometry_mm) {
                    None
                } else {
                    Some(format!(
                        "{} area detected: {}Box is {}, page is {}",
                        label, label, size, attrs.media
                    ))
                }
            })
            .collect()
    }
}

/// One-sided: page larger than the profile. Overlaps with [`PageSizeRule`]
/// and [`PageBoxRule`]; both findings are reported.
pub struct OversizeRule;

impl ValidationRule<PageAttributes, StaticRequirements> for OversizeRule {
    fn name(&self) -> &'static str { "oversize" }

    fn validate(&self, attrs: &PageAttributes, required: &StaticRequirements, tolerances: &Tolerances) -> Vec<String> {
        let expected = required.page_size();
        if attrs.media.exceeds(&expected, tolerances.geometry_mm) {
            vec![format!(
                "Artwork is larger than {}: remove bleed or crop marks",
                expected
            )]
        } else {
            vec![]
        }
    }
}

pub struct ColourSpaceRule;

impl ValidationRule<PageAttributes, StaticRequirements> for ColourSpaceRule {
    fn name(&self) -> &'static str { "colour_space" }

    fn validate(&self, attrs: &PageAttributes, required: &StaticRequirements, _: &Tolerances) -> Vec<String> {
        if attrs.has_rgb {
            vec![format!(
                "RGB colour space detected: artwork must be {}",
                required.colour
            )]
        } else {
            vec![]
        }
    }
}

/// Asymmetric: up to `tolerances.resolution_dpi` under the requirement
/// passes, any amount over passes. Vector-only pages are skipped.
pub struct ImageResolutionRule;

impl ValidationRule<PageAttributes, StaticRequirements> for ImageResolutionRule {
    fn name(&self) -> &'static str { "image_resolution" }

    fn validate(&self, attrs: &PageAttributes, required: &StaticRequirements, tolerances: &Tolerances) -> Vec<String> {
        let Some(estimate) = attrs.min_image_dpi else {
            return vec![];
        };
        let floor = required.dpi as f64 - tolerances.resolution_dpi;
        // page boxes are f32, so the estimate carries a little noise
        if estimate + 1e-3 < floor {
            vec![format!(
                "Low image resolution: estimated {:.0} DPI, expected {} DPI",
                estimate, required.dpi
            )]
        } else {
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FileType;
    use crate::print::{ColourModel, PageSize};

    fn digital() -> DigitalRequirements {
        DigitalRequirements {
            width_px: 504,
            height_px: 224,
            dpi: 72,
            colour: ColourModel::Rgb,
            file: FileType::Jpg,
        }
    }

    fn raster(width: u32, height: u32) -> RasterAttributes {
        RasterAttributes {
            format: "JPEG".into(),
            width,
            height,
            dpi: Some((72.0, 72.0)),
            colour_mode: "RGB".into(),
        }
    }

    fn poster() -> StaticRequirements {
        StaticRequirements {
            width_mm: 600.0,
            height_mm: 300.0,
            dpi: 300,
            colour: ColourModel::Cmyk,
            file: FileType::Pdf,
        }
    }

    fn page(width_mm: f64, height_mm: f64) -> PageAttributes {
        PageAttributes {
            page_count: 1,
            media: PageSize::new(width_mm, height_mm),
            trim: None,
            bleed: None,
            crop: None,
            has_rgb: false,
            min_image_dpi: None,
        }
    }

    fn check_raster(attrs: &RasterAttributes) -> Verdict {
        RasterValidator::new().validate("Digital Poster", attrs, &digital(), &Tolerances::default())
    }

    fn check_page(attrs: &PageAttributes) -> Verdict {
        PageValidator::new().validate("Poster", attrs, &poster(), &Tolerances::default())
    }

    #[test]
    fn test_exact_raster_passes() {
        let verdict = check_raster(&raster(504, 224));
        assert_eq!(verdict.status, VerdictStatus::Pass);
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.message, "Artwork meets the Digital Poster specifications.");
    }

    #[test]
    fn test_width_and_height_are_separate_issues() {
        let verdict = check_raster(&raster(500, 220));
        assert_eq!(verdict.status, VerdictStatus::Fail);
        assert_eq!(verdict.message, FAIL_MESSAGE);
        assert_eq!(
            verdict.issues,
            vec![
                "Incorrect width: expected 504px, detected 500px".to_string(),
                "Incorrect height: expected 224px, detected 220px".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_and_wrong_dpi_differ() {
        let mut attrs = raster(504, 224);
        attrs.dpi = None;
        let missing = check_raster(&attrs).issues;

        attrs.dpi = Some((300.0, 300.0));
        let wrong = check_raster(&attrs).issues;

        assert_eq!(missing.len(), 1);
        assert_eq!(wrong.len(), 1);
        assert!(missing[0].starts_with("Missing DPI"));
        assert!(wrong[0].starts_with("Incorrect DPI"));
    }

    #[test]
    fn test_dpi_rounds_to_nearest() {
        let mut attrs = raster(504, 224);
        attrs.dpi = Some((71.6, 71.6));
        assert!(check_raster(&attrs).is_pass());
        attrs.dpi = Some((72.4, 300.0));
        assert!(check_raster(&attrs).is_pass());
        attrs.dpi = Some((71.4, 72.0));
        assert!(!check_raster(&attrs).is_pass());
    }

    #[test]
    fn test_all_raster_rules_accumulate() {
        let attrs = RasterAttributes {
            format: "PNG".into(),
            width: 1,
            height: 1,
            dpi: None,
            colour_mode: "CMYK".into(),
        };
        assert_eq!(check_raster(&attrs).issues.len(), 5);
    }

    #[test]
    fn test_geometry_tolerance_boundary() {
        assert!(check_page(&page(600.5, 300.0)).is_pass());

        let verdict = check_page(&page(600.51, 300.0));
        assert_eq!(verdict.issues.len(), 2);
        assert!(verdict.issues[0].starts_with("Incorrect page size"));
        assert!(verdict.issues[1].starts_with("Artwork is larger"));
    }

    #[test]
    fn test_undersize_is_not_oversize() {
        let verdict = check_page(&page(590.0, 300.0));
        assert_eq!(verdict.issues.len(), 1);
        assert!(verdict.issues[0].contains("expected 600.0mm x 300.0mm, detected 590.0mm x 300.0mm"));
    }

    #[test]
    fn test_boxes_matching_page_are_fine() {
        let mut attrs = page(600.0, 300.0);
        attrs.trim = Some(PageSize::new(600.2, 300.0));
        attrs.crop = Some(PageSize::new(600.0, 300.0));
        assert!(check_page(&attrs).is_pass());
    }

    #[test]
    fn test_each_differing_box_is_named() {
        let mut attrs = page(600.0, 300.0);
        attrs.trim = Some(PageSize::new(590.0, 290.0));
        attrs.bleed = Some(PageSize::new(610.0, 310.0));
        attrs.crop = Some(PageSize::new(600.0, 250.0));
        let issues = check_page(&attrs).issues;
        assert_eq!(issues.len(), 3);
        assert!(issues[0].starts_with("Trim area detected"));
        assert!(issues[1].starts_with("Bleed area detected"));
        assert!(issues[2].starts_with("Crop area detected"));
    }

    #[test]
    fn test_multi_page_still_measures_geometry() {
        let mut attrs = page(601.0, 300.0);
        attrs.page_count = 2;
        let issues = check_page(&attrs).issues;
        assert!(issues[0].contains("exactly one page"));
        assert!(issues.iter().any(|i| i.starts_with("Incorrect page size")));
    }

    #[test]
    fn test_rgb_detected_fails() {
        let mut attrs = page(600.0, 300.0);
        attrs.has_rgb = true;
        let issues = check_page(&attrs).issues;
        assert_eq!(issues, vec!["RGB colour space detected: artwork must be CMYK".to_string()]);
    }

    #[test]
    fn test_resolution_asymmetry() {
        let mut attrs = page(600.0, 300.0);
        for (estimate, passes) in [(290.0, true), (289.0, false), (300.0, true), (1200.0, true)] {
            attrs.min_image_dpi = Some(estimate);
            assert_eq!(check_page(&attrs).is_pass(), passes, "estimate {estimate}");
        }
    }

    #[test]
    fn test_vector_only_skips_resolution() {
        let attrs = page(600.0, 300.0);
        assert!(check_page(&attrs).is_pass());
    }

    #[test]
    fn test_verdict_serialization_omits_empty_issues() {
        let json = serde_json::to_value(Verdict::pass("Poster")).unwrap();
        assert_eq!(json["status"], "pass");
        assert!(json.get("issues").is_none());

        let json = serde_json::to_value(Verdict::error("Unknown spec selected.")).unwrap();
        assert_eq!(json["status"], "error");
    }
}
