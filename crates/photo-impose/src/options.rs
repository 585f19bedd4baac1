use crate::constants::DEFAULT_DPI;
use crate::layout::{GridLayout, calculate_grid_layout};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Complete configuration for one imposition job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpositionOptions {
    // Sheet and slot geometry
    pub paper: PaperConfig,
    pub slot: SlotConfig,

    // Printer's marks
    pub marks: RegistrationMarks,

    // Footer
    pub meta: MetaInfo,
    pub display_meta: bool,

    // Working raster
    pub dpi: u32,
    pub raster_format: RasterFormat,
}

impl Default for ImpositionOptions {
    fn default() -> Self {
        Self {
            paper: PaperConfig::default(),
            slot: SlotConfig::default(),
            marks: RegistrationMarks::default(),
            meta: MetaInfo::default(),
            display_meta: true,
            dpi: DEFAULT_DPI,
            raster_format: RasterFormat::Png,
        }
    }
}

impl ImpositionOptions {
    /// Load options from JSON file
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| ImposeError::Validation(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ImposeError::Validation(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Grid produced by the current paper and slot settings
    pub fn grid(&self) -> GridLayout {
        calculate_grid_layout(&self.paper, &self.slot)
    }

    /// Footer text to print, if any
    pub fn footer_line(&self) -> Option<String> {
        if self.display_meta {
            self.meta.footer_line()
        } else {
            None
        }
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        self.paper.validate()?;
        self.slot.validate()?;

        if self.marks.enabled {
            check_positive("mark length", self.marks.length_mm)?;
            check_positive("mark thickness", self.marks.thickness_pt)?;
            if !self.marks.corner_offset_mm.is_finite() {
                return Err(ImposeError::Validation(
                    "mark corner offset must be finite".to_string(),
                ));
            }
        }

        if self.dpi == 0 {
            return Err(ImposeError::Validation("DPI must be positive".to_string()));
        }

        if let RasterFormat::Jpeg { quality } = self.raster_format {
            if !(1..=100).contains(&quality) {
                return Err(ImposeError::Validation(format!(
                    "JPEG quality must be between 1 and 100 (got {})",
                    quality
                )));
            }
        }

        Ok(())
    }
}
