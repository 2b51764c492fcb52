use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::config::StepTuning;
use crate::core_types::ContentProfile;
use crate::error::{PageFitError, PfResult};

/// Which of the two knobs a step size applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum TunedParameter {
    FontSize,
    LineSpacing,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum StepDirection {
    Grow,
    Shrink,
}

/// Weighted content-to-space ratio. Groups carry a 1.5x weight because a
/// group adds a heading plus surrounding gaps on top of its items.
pub fn density_score(profile: &ContentProfile, columns: u32) -> f32 {
    let cols = columns.max(1) as f32;
    profile.item_count as f32 / cols + 1.5 * profile.group_count as f32 / cols
}

/// Maps a density score to a step size per parameter and direction.
///
/// Sparse content tolerates large jumps; dense content needs fine growth
/// control to avoid overshooting into overflow, while shrink steps scale
/// *up* with density so an overflowing page escapes quickly. The grow and
/// shrink tables are deliberately not mirror images.
#[derive(Debug, Clone)]
pub struct DensityModel {
    tiers: [f32; 3],
    font_grow: [f32; 4],
    font_shrink: [f32; 4],
    spacing_grow: [f32; 4],
    spacing_shrink: [f32; 4],
}

impl DensityModel {
    pub fn from_tuning(tuning: &StepTuning) -> PfResult<Self> {
        let model = Self {
            tiers: tuning.get_density_tiers(),
            font_grow: tuning.get_font_grow_steps(),
            font_shrink: tuning.get_font_shrink_steps(),
            spacing_grow: tuning.get_spacing_grow_steps(),
            spacing_shrink: tuning.get_spacing_shrink_steps(),
        };
        model.check_tables()?;
        Ok(model)
    }

    pub fn step_size(
        &self,
        score: f32,
        parameter: TunedParameter,
        direction: StepDirection,
    ) -> f32 {
        let table = match (parameter, direction) {
            (TunedParameter::FontSize, StepDirection::Grow) => &self.font_grow,
            (TunedParameter::FontSize, StepDirection::Shrink) => &self.font_shrink,
            (TunedParameter::LineSpacing, StepDirection::Grow) => &self.spacing_grow,
            (TunedParameter::LineSpacing, StepDirection::Shrink) => &self.spacing_shrink,
        };
        table[self.tier_index(score)]
    }

    /// Tier boundaries are inclusive-low: a score equal to a boundary
    /// belongs to the tier above it.
    fn tier_index(&self, score: f32) -> usize {
        self.tiers
            .iter()
            .position(|&t| score < t)
            .unwrap_or(self.tiers.len())
    }

    fn check_tables(&self) -> PfResult<()> {
        if !self.tiers.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(PageFitError::Validation(format!(
                "density_tiers must be strictly increasing, got {:?}",
                self.tiers
            )));
        }

        let all_tables = [
            ("font_grow_steps", &self.font_grow),
            ("font_shrink_steps", &self.font_shrink),
            ("spacing_grow_steps", &self.spacing_grow),
            ("spacing_shrink_steps", &self.spacing_shrink),
        ];
        for (name, table) in all_tables {
            if table.iter().any(|&s| !s.is_finite() || s <= 0.0) {
                return Err(PageFitError::Validation(format!(
                    "{} must be positive and finite, got {:?}",
                    name, table
                )));
            }
        }

        // Grow steps shrink as density rises; shrink steps do the opposite.
        for (name, table) in [
            ("font_grow_steps", &self.font_grow),
            ("spacing_grow_steps", &self.spacing_grow),
        ] {
            if !table.iter().tuple_windows().all(|(a, b)| a >= b) {
                return Err(PageFitError::Validation(format!(
                    "{} must not increase with density, got {:?}",
                    name, table
                )));
            }
        }
        for (name, table) in [
            ("font_shrink_steps", &self.font_shrink),
            ("spacing_shrink_steps", &self.spacing_shrink),
        ] {
            if !table.iter().tuple_windows().all(|(a, b)| a <= b) {
                return Err(PageFitError::Validation(format!(
                    "{} must not decrease with density, got {:?}",
                    name, table
                )));
            }
        }

        Ok(())
    }
}
