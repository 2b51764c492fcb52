use crate::config::RangeConfig;
use crate::error::{PageFitError, PfResult};
use serde::{Deserialize, Serialize};

/// The two continuous knobs under search, plus the column count the layout
/// engine fixed before the run started. `columns` is read-only here.
///
/// A fresh copy is produced at every step; the optimizer never mutates a
/// caller's value in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParameters {
    pub font_size_px: f32,
    pub line_spacing: f32,
    pub columns: u32,
}

impl LayoutParameters {
    pub fn new(font_size_px: f32, line_spacing: f32, columns: u32) -> Self {
        Self {
            font_size_px,
            line_spacing,
            columns,
        }
    }

    pub fn validate(&self, ranges: &RangeConfig) -> PfResult<()> {
        if !self.font_size_px.is_finite()
            || self.font_size_px < ranges.font_min
            || self.font_size_px > ranges.font_max
        {
            return Err(PageFitError::Validation(format!(
                "font_size_px {} outside [{}, {}]",
                self.font_size_px, ranges.font_min, ranges.font_max
            )));
        }
        if !self.line_spacing.is_finite()
            || self.line_spacing < ranges.spacing_min
            || self.line_spacing > ranges.spacing_max
        {
            return Err(PageFitError::Validation(format!(
                "line_spacing {} outside [{}, {}]",
                self.line_spacing, ranges.spacing_min, ranges.spacing_max
            )));
        }
        if self.columns == 0 {
            return Err(PageFitError::Validation(
                "columns must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// How much content must fit. Supplied once at the start of a run and
/// treated as frozen for that run; edits made while a run is in flight are
/// not picked up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContentProfile {
    pub item_count: u32,
    pub group_count: u32,
}

impl ContentProfile {
    pub fn new(item_count: u32, group_count: u32) -> Self {
        Self {
            item_count,
            group_count,
        }
    }
}
