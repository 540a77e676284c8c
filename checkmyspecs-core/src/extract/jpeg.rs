//! JPEG header scan
//!
//! Reads the marker segments in front of the first scan to recover what the
//! pixel decoder throws away: the JFIF density and the component count of
//! the frame (a CMYK JPEG decodes to RGB pixels but is still CMYK artwork).

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;
const DHT: u8 = 0xC4;
const JPG: u8 = 0xC8;
const DAC: u8 = 0xCC;

/// JFIF density units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityUnit {
    /// Pixel aspect ratio only, no absolute resolution.
    Aspect,
    PerInch,
    PerCentimetre,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JfifDensity {
    pub unit: DensityUnit,
    pub x: u16,
    pub y: u16,
}

impl JfifDensity {
    /// Dots per inch, when the unit is absolute.
    pub fn dpi(&self) -> Option<(f64, f64)> {
        match self.unit {
            DensityUnit::Aspect => None,
            DensityUnit::PerInch => Some((self.x as f64, self.y as f64)),
            DensityUnit::PerCentimetre => Some((self.x as f64 * 2.54, self.y as f64 * 2.54)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JpegHeader {
    pub density: Option<JfifDensity>,
    /// Number of colour components in the frame (1 = grey, 3 = RGB/YCbCr, 4 = CMYK).
    pub components: Option<u8>,
}

impl JpegHeader {
    pub fn colour_mode(&self) -> Option<&'static str> {
        match self.components? {
            1 => Some("L"),
            3 => Some("RGB"),
            4 => Some("CMYK"),
            _ => None,
        }
    }
}

fn is_sof(marker: u8) -> bool {
    (0xC0..=0xCF).contains(&marker) && marker != DHT && marker != JPG && marker != DAC
}

/// Scan a JPEG stream up to its first scan. Returns `None` when the data
/// does not start with an SOI marker. Truncated or malformed segments end
/// the scan with whatever was found so far.
pub fn scan_header(data: &[u8]) -> Option<JpegHeader> {
    if data.len() < 4 || data[..2] != SOI {
        return None;
    }

    let mut header = JpegHeader::default();
    let mut pos = 2;

    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        if marker == 0xFF {
            // fill byte
            pos += 1;
            continue;
        }
        if marker == SOS || marker == EOI {
            break;
        }
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }

        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let start = pos + 4;
        let end = pos + 2 + length;
        if length < 2 || end > data.len() {
            break;
        }
        let segment = &data[start..end];

        if marker == APP0 && header.density.is_none() && segment.len() >= 12 && &segment[..5] == b"JFIF\0" {
            let unit = match segment[7] {
                1 => DensityUnit::PerInch,
                2 => DensityUnit::PerCentimetre,
                _ => DensityUnit::Aspect,
            };
            header.density = Some(JfifDensity {
                unit,
                x: u16::from_be_bytes([segment[8], segment[9]]),
                y: u16::from_be_bytes([segment[10], segment[11]]),
            });
        } else if is_sof(marker) && header.components.is_none() && segment.len() >= 6 {
            header.components = Some(segment[5]);
        }

        pos = end;
    }

    Some(header)
}
