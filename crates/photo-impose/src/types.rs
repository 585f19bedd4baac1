use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImposeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid configuration: {0}")]
    Validation(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("Slot {0} is out of range")]
    SlotOutOfRange(usize),
    #[error("Invalid state transition: {0}")]
    InvalidTransition(&'static str),
}

pub type Result<T> = std::result::Result<T, ImposeError>;

/// Orientation of a rectangle: landscape when width >= height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Portrait: height > width (default for most paper sizes)
    #[default]
    Portrait,
    /// Landscape: width >= height
    Landscape,
}

impl Orientation {
    /// Classify a width/height pair. Squares count as landscape.
    pub fn of(width: f64, height: f64) -> Self {
        if width >= height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Get base dimensions (always portrait: width < height for standard sizes)
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Tabloid => (279.4, 431.8),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Get dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => (w.min(h), w.max(h)),
            Orientation::Landscape => (w.max(h), w.min(h)),
        }
    }
}

/// Length units accepted for user-entered sizes. Everything is stored in mm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    #[default]
    Millimeters,
    Centimeters,
    Inches,
}

impl LengthUnit {
    pub fn name(&self) -> &'static str {
        match self {
            LengthUnit::Millimeters => "mm",
            LengthUnit::Centimeters => "cm",
            LengthUnit::Inches => "in",
        }
    }

    pub fn to_mm(&self, value: f32) -> f32 {
        match self {
            LengthUnit::Millimeters => value,
            LengthUnit::Centimeters => value * 10.0,
            LengthUnit::Inches => value * 25.4,
        }
    }

    pub fn from_mm(&self, value: f32) -> f32 {
        match self {
            LengthUnit::Millimeters => value,
            LengthUnit::Centimeters => value / 10.0,
            LengthUnit::Inches => value / 25.4,
        }
    }
}

/// Four-sided margins in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top_mm: f32,
    pub right_mm: f32,
    pub bottom_mm: f32,
    pub left_mm: f32,
}

impl Margins {
    /// Create uniform margins on all sides
    pub fn uniform(margin_mm: f32) -> Self {
        Self {
            top_mm: margin_mm,
            right_mm: margin_mm,
            bottom_mm: margin_mm,
            left_mm: margin_mm,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left_mm + self.right_mm
    }

    pub fn vertical(&self) -> f32 {
        self.top_mm + self.bottom_mm
    }

    fn values(&self) -> [f32; 4] {
        [self.top_mm, self.right_mm, self.bottom_mm, self.left_mm]
    }
}

/// Spacing between adjacent slots
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gap {
    pub horizontal_mm: f32,
    pub vertical_mm: f32,
}

impl Gap {
    pub fn uniform(gap_mm: f32) -> Self {
        Self {
            horizontal_mm: gap_mm,
            vertical_mm: gap_mm,
        }
    }
}

/// The print sheet: size, printer-safe margins and the gap between slots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperConfig {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margins: Margins,
    pub gap: Gap,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            width_mm: 297.0,
            height_mm: 210.0,
            margins: Margins::uniform(10.0),
            gap: Gap::uniform(3.0),
        }
    }
}

impl PaperConfig {
    pub fn usable_width_mm(&self) -> f32 {
        self.width_mm - self.margins.horizontal()
    }

    pub fn usable_height_mm(&self) -> f32 {
        self.height_mm - self.margins.vertical()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_positive("paper width", self.width_mm)?;
        check_positive("paper height", self.height_mm)?;
        check_margins("paper margin", &self.margins)?;
        check_non_negative("horizontal gap", self.gap.horizontal_mm)?;
        check_non_negative("vertical gap", self.gap.vertical_mm)
    }
}

/// One placement position: its outer size and an optional inset for the image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub width_mm: f32,
    pub height_mm: f32,
    #[serde(default)]
    pub margins: Margins,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            width_mm: 30.0,
            height_mm: 40.0,
            margins: Margins::default(),
        }
    }
}

impl SlotConfig {
    pub fn new(width_mm: f32, height_mm: f32) -> Self {
        Self {
            width_mm,
            height_mm,
            margins: Margins::default(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::of(self.width_mm as f64, self.height_mm as f64)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_positive("slot width", self.width_mm)?;
        check_positive("slot height", self.height_mm)?;
        check_margins("slot margin", &self.margins)
    }
}

/// Free-text job information printed in the footer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
}

impl Default for MetaInfo {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            description: String::new(),
            date: today_string(),
        }
    }
}

impl MetaInfo {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_empty() && self.description.is_empty() && self.date.is_empty()
    }

    /// Customer, description and date in that order, or `None` when all are empty
    pub fn footer_line(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!(
            "{}   {}   {}",
            self.customer_name, self.description, self.date
        ))
    }
}

/// Today's local date as `YYYY-MM-DD`
pub fn today_string() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor { r: 0, g: 0, b: 0 };

    /// Components scaled to the 0..1 range used by PDF color operators
    pub fn unit_components(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

/// Corner registration marks drawn around every occupied slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegistrationMarks {
    pub enabled: bool,
    /// Length of each mark arm
    pub length_mm: f32,
    /// Stroke width in points
    pub thickness_pt: f32,
    pub color: RgbColor,
    /// Diagonal shift of each corner: positive moves outward, negative inward
    #[serde(default)]
    pub corner_offset_mm: f32,
}

impl Default for RegistrationMarks {
    fn default() -> Self {
        Self {
            enabled: true,
            length_mm: crate::constants::DEFAULT_MARK_LENGTH_MM,
            thickness_pt: crate::constants::DEFAULT_MARK_THICKNESS_PT,
            color: RgbColor::BLACK,
            corner_offset_mm: 0.0,
        }
    }
}

/// Encoding used for working rasters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RasterFormat {
    /// Lossless
    #[default]
    Png,
    /// Lossy, quality 1-100
    Jpeg { quality: u8 },
}

fn check_finite(name: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ImposeError::Validation(format!("{name} must be finite")))
    }
}

pub(crate) fn check_non_negative(name: &str, value: f32) -> Result<()> {
    check_finite(name, value)?;
    if value < 0.0 {
        return Err(ImposeError::Validation(format!(
            "{name} must not be negative (got {value})"
        )));
    }
    Ok(())
}

pub(crate) fn check_positive(name: &str, value: f32) -> Result<()> {
    check_finite(name, value)?;
    if value <= 0.0 {
        return Err(ImposeError::Validation(format!(
            "{name} must be positive (got {value})"
        )));
    }
    Ok(())
}

fn check_margins(name: &str, margins: &Margins) -> Result<()> {
    for value in margins.values() {
        check_non_negative(name, value)?;
    }
    Ok(())
}
