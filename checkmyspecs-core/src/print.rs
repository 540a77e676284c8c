//! Print Units and Tolerances
//!
//! Physical measurements for print artwork. Page-description geometry is
//! stored in points; every comparison happens in millimetres.

use serde::{Deserialize, Serialize};

/// Millimetres per PDF point (1/72 inch).
pub const MM_PER_POINT: f64 = 0.352778;

pub const MM_PER_INCH: f64 = 25.4;

/// Convert PDF points to millimetres.
pub fn mm_from_points(value_pt: f64) -> f64 {
    value_pt * MM_PER_POINT
}

pub fn inches_from_mm(value_mm: f64) -> f64 {
    value_mm / MM_PER_INCH
}

/// Colour model required by a spec profile, or reported by an extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColourModel {
    Rgb,
    Cmyk,
}

impl ColourModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Cmyk => "CMYK",
        }
    }
}

impl std::fmt::Display for ColourModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width and height of a box, in millimetres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    pub fn new(width_mm: f64, height_mm: f64) -> Self {
        Self { width_mm, height_mm }
    }

    /// Build from a `[x0, y0, x1, y1]` rectangle in points.
    pub fn from_points_rect(rect: [f64; 4]) -> Self {
        Self {
            width_mm: mm_from_points((rect[2] - rect[0]).abs()),
            height_mm: mm_from_points((rect[3] - rect[1]).abs()),
        }
    }

    /// Both axes within `tolerance_mm` of `other` (inclusive).
    pub fn matches(&self, other: &PageSize, tolerance_mm: f64) -> bool {
        within(self.width_mm, other.width_mm, tolerance_mm)
            && within(self.height_mm, other.height_mm, tolerance_mm)
    }

    /// Either axis larger than `other` by more than `tolerance_mm`.
    pub fn exceeds(&self, other: &PageSize, tolerance_mm: f64) -> bool {
        self.width_mm - other.width_mm > tolerance_mm + EPSILON
            || self.height_mm - other.height_mm > tolerance_mm + EPSILON
    }

    pub fn width_in(&self) -> f64 {
        inches_from_mm(self.width_mm)
    }

    pub fn height_in(&self) -> f64 {
        inches_from_mm(self.height_mm)
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}mm x {:.1}mm", self.width_mm, self.height_mm)
    }
}

// Page boxes are stored as f32 points, so a box drawn exactly on the
// tolerance boundary reads back up to ~1e-4mm off. The allowance must absorb
// that while staying well below the 0.01mm resolution of the boundary.
const EPSILON: f64 = 1e-3;

fn within(measured: f64, expected: f64, tolerance: f64) -> bool {
    (measured - expected).abs() <= tolerance + EPSILON
}

/// Comparison tolerances applied by the rule evaluator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tolerances {
    #[serde(default = "default_geometry_mm")]
    pub geometry_mm: f64,
    #[serde(default = "default_resolution_dpi")]
    pub resolution_dpi: f64,
}

fn default_geometry_mm() -> f64 { 0.5 }
fn default_resolution_dpi() -> f64 { 10.0 }

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            geometry_mm: default_geometry_mm(),
            resolution_dpi: default_resolution_dpi(),
        }
    }
}
