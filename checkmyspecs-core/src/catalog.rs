//! Spec Catalog - Board Format Contracts
//!
//! Every board format the checker knows about is a named, immutable
//! [`SpecProfile`]. Names are matched byte-for-byte; the dropdown in the
//! front end sends the key back unchanged.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::print::{ColourModel, PageSize, Tolerances};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate spec name: {0}")]
    DuplicateName(String),

    #[error("Spec has an empty name")]
    EmptyName,

    #[error("Spec '{name}' is invalid: {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Board format family. Decides which checker runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FormatFamily {
    Digital,
    Static,
}

impl FormatFamily {
    /// The only container type accepted for this family.
    pub fn required_file(&self) -> FileType {
        match self {
            Self::Digital => FileType::Jpg,
            Self::Static => FileType::Pdf,
        }
    }
}

/// Declared artwork container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Jpg,
    Pdf,
}

impl FileType {
    /// Container type from the filename extension alone (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpg),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn family(&self) -> FormatFamily {
        match self {
            Self::Jpg => FormatFamily::Digital,
            Self::Pdf => FormatFamily::Static,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpg => "JPG",
            Self::Pdf => "PDF",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigitalRequirements {
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: u32,
    pub colour: ColourModel,
    pub file: FileType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaticRequirements {
    pub width_mm: f64,
    pub height_mm: f64,
    pub dpi: u32,
    pub colour: ColourModel,
    pub file: FileType,
}

impl StaticRequirements {
    pub fn page_size(&self) -> PageSize {
        PageSize::new(self.width_mm, self.height_mm)
    }
}

/// Family-specific requirements; exactly one set per profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum Requirements {
    Digital(DigitalRequirements),
    Static(StaticRequirements),
}

impl Requirements {
    pub fn family(&self) -> FormatFamily {
        match self {
            Self::Digital(_) => FormatFamily::Digital,
            Self::Static(_) => FormatFamily::Static,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecProfile {
    pub name: String,
    pub size: String,
    #[serde(flatten)]
    pub requirements: Requirements,
}

impl SpecProfile {
    pub fn family(&self) -> FormatFamily {
        self.requirements.family()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        let invalid = |reason: &str| CatalogError::InvalidProfile {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.size.trim().is_empty() {
            return Err(invalid("size label is empty"));
        }

        match &self.requirements {
            Requirements::Digital(d) => {
                if d.width_px == 0 || d.height_px == 0 {
                    return Err(invalid("pixel dimensions must be positive"));
                }
                if d.dpi == 0 {
                    return Err(invalid("dpi must be positive"));
                }
                if d.colour != ColourModel::Rgb {
                    return Err(invalid("digital specs must be RGB"));
                }
                if d.file != FileType::Jpg {
                    return Err(invalid("digital specs must use JPG files"));
                }
            }
            Requirements::Static(s) => {
                if !(s.width_mm > 0.0 && s.height_mm > 0.0) {
                    return Err(invalid("physical dimensions must be positive"));
                }
                if s.dpi == 0 {
                    return Err(invalid("dpi must be positive"));
                }
                if s.colour != ColourModel::Cmyk {
                    return Err(invalid("static specs must be CMYK"));
                }
                if s.file != FileType::Pdf {
                    return Err(invalid("static specs must use PDF files"));
                }
            }
        }
        Ok(())
    }
}

/// On-disk catalog shape.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tolerances: Tolerances,
    specs: Vec<SpecProfile>,
}

/// Read-only spec registry, keyed by exact profile name.
#[derive(Debug, Clone)]
pub struct SpecCatalog {
    profiles: Vec<SpecProfile>,
    index: HashMap<String, usize>,
    tolerances: Tolerances,
}

lazy_static! {
    static ref BUILTIN: SpecCatalog = SpecCatalog::from_profiles(builtin_profiles())
        .expect("built-in spec catalog must be valid");
}

impl SpecCatalog {
    /// The process-wide catalog shipped with the engine.
    pub fn builtin() -> &'static SpecCatalog {
        &BUILTIN
    }

    pub fn from_profiles(profiles: Vec<SpecProfile>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(profiles.len());
        for (i, profile) in profiles.iter().enumerate() {
            profile.validate()?;
            if index.insert(profile.name.clone(), i).is_some() {
                return Err(CatalogError::DuplicateName(profile.name.clone()));
            }
        }
        Ok(Self {
            profiles,
            index,
            tolerances: Tolerances::default(),
        })
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;
        let catalog = Self::from_profiles(file.specs)?;
        Ok(catalog.with_tolerances(file.tolerances))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    pub fn get(&self, name: &str) -> Option<&SpecProfile> {
        self.index.get(name).map(|&i| &self.profiles[i])
    }

    /// Profile names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn list(&self) -> &[SpecProfile] {
        &self.profiles
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn digital(name: &str, size: &str, width_px: u32, height_px: u32) -> SpecProfile {
    SpecProfile {
        name: name.to_string(),
        size: size.to_string(),
        requirements: Requirements::Digital(DigitalRequirements {
            width_px,
            height_px,
            dpi: 72,
            colour: ColourModel::Rgb,
            file: FileType::Jpg,
        }),
    }
}

fn static_board(name: &str, size: &str, width_mm: f64, height_mm: f64) -> SpecProfile {
    SpecProfile {
        name: name.to_string(),
        size: size.to_string(),
        requirements: Requirements::Static(StaticRequirements {
            width_mm,
            height_mm,
            dpi: 300,
            colour: ColourModel::Cmyk,
            file: FileType::Pdf,
        }),
    }
}

fn builtin_profiles() -> Vec<SpecProfile> {
    vec![
        // Digital boards (JPG)
        digital("Digital Super8 (8.00m x 2.08m)", "8.00m x 2.08m", 1224, 324),
        digital("Digital Supersite (12.48m x 3.20m)", "12.48m x 3.20m", 1224, 324),
        digital("Digital Poster (6.00m x 3.00m)", "6.00m x 3.00m", 504, 224),
        digital("Digital Double Screen (16.00m x 2.08m)", "16.00m x 2.08m", 2448, 324),
        digital("Digital Spectacular (19.00m x 4.57m)", "19.00m x 4.57m", 1224, 324),
        // Static boards (PDF), artwork supplied at half scale
        static_board("Supersite (12.66m x 3.35m)", "12.66m x 3.35m", 633.0, 167.5),
        static_board("Super8 (8.30m x 2.20m)", "8.30m x 2.20m", 830.0, 220.0),
        static_board("Spectacular (19.00m x 4.57m)", "19.00m x 4.57m", 950.0, 228.5),
        static_board("Super6 (6.30m x 2.20m)", "6.30m x 2.20m", 630.0, 220.0),
        static_board("Super7 (7.40m x 2.40m)", "7.40m x 2.40m", 740.0, 240.0),
        static_board("Super9 (9.00m x 3.00m)", "9.00m x 3.00m", 900.0, 300.0),
        static_board("Poster (6.00m x 3.00m)", "6.00m x 3.00m", 600.0, 300.0),
        static_board("Small Format (6.20m x 2.20m)", "6.20m x 2.20m", 620.0, 220.0),
        static_board("Portrait (6.40m x 7.20m)", "6.40m x 7.20m", 320.0, 360.0),
        static_board("Square Format (4.00m x 2.00m)", "4.00m x 2.00m", 400.0, 200.0),
        static_board("Smaller Format (5.15m x 2.50m)", "5.15m x 2.50m", 515.0, 250.0),
        static_board("Horizontal (4.41m x 2.24m)", "4.41m x 2.24m", 440.0, 224.0),
        static_board("Thin Portrait (4.00m x 7.95m)", "4.00m x 7.95m", 400.0, 795.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = SpecCatalog::builtin();
        assert_eq!(catalog.len(), 18);
        assert_eq!(catalog.names()[0], "Digital Super8 (8.00m x 2.08m)");

        let digital = catalog.list().iter().filter(|p| p.family() == FormatFamily::Digital).count();
        assert_eq!(digital, 5);
    }

    #[test]
    fn test_lookup_is_exact() {
        let catalog = SpecCatalog::builtin();
        assert!(catalog.get("Poster (6.00m x 3.00m)").is_some());
        assert!(catalog.get("poster (6.00m x 3.00m)").is_none());
        assert!(catalog.get("Poster (6.00m x 3.00m) ").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let profiles = vec![
            digital("Same", "1m x 1m", 10, 10),
            digital("Same", "1m x 1m", 20, 20),
        ];
        let err = SpecCatalog::from_profiles(profiles).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName(name) if name == "Same"));
    }

    #[test]
    fn test_family_attribute_mismatch_rejected() {
        let mut profile = static_board("Bad", "1m x 1m", 100.0, 100.0);
        if let Requirements::Static(s) = &mut profile.requirements {
            s.colour = ColourModel::Rgb;
        }
        assert!(SpecCatalog::from_profiles(vec![profile]).is_err());

        let zero = digital("Zero", "1m x 1m", 0, 10);
        assert!(SpecCatalog::from_profiles(vec![zero]).is_err());
    }

    #[test]
    fn test_from_json_record_shape() {
        let json = r#"{
            "tolerances": {"geometryMm": 1.0},
            "specs": [
                {"name": "Tiny", "format": "digital", "size": "1m x 1m",
                 "width_px": 10, "height_px": 5, "dpi": 72, "colour": "RGB", "file": "JPG"},
                {"name": "Sheet", "format": "static", "size": "2m x 1m",
                 "width_mm": 200, "height_mm": 100.5, "dpi": 300, "colour": "CMYK", "file": "PDF"}
            ]
        }"#;
        let catalog = SpecCatalog::from_json(json).unwrap();
        assert_eq!(catalog.names(), vec!["Tiny", "Sheet"]);
        assert_eq!(catalog.tolerances().geometry_mm, 1.0);
        assert_eq!(catalog.tolerances().resolution_dpi, 10.0);

        match &catalog.get("Sheet").unwrap().requirements {
            Requirements::Static(s) => assert_eq!(s.height_mm, 100.5),
            other => panic!("unexpected requirements: {other:?}"),
        }
    }

    #[test]
    fn test_file_type_from_filename() {
        assert_eq!(FileType::from_filename("art.JPG"), Some(FileType::Jpg));
        assert_eq!(FileType::from_filename("art.jpeg"), Some(FileType::Jpg));
        assert_eq!(FileType::from_filename("print.Pdf"), Some(FileType::Pdf));
        assert_eq!(FileType::from_filename("art.png"), None);
        assert_eq!(FileType::from_filename("jpg"), None);
        assert_eq!(FileType::from_filename(".jpg"), Some(FileType::Jpg));
        assert_eq!(FileType::from_filename(".PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_filename("art.pdf.png"), None);
    }
}
