use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PageFitError, PfResult};

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OptimizerConfig {
    #[command(flatten)]
    pub ranges: RangeConfig,
    #[command(flatten)]
    pub tuning: StepTuning,
}

impl OptimizerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> PfResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> PfResult<()> {
        self.ranges.validate()?;
        self.tuning.validate()
    }
}

/// Hard bounds and bisection tolerances for the two tunable parameters.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    #[arg(long, default_value_t = 8.0)]
    pub font_min: f32,
    #[arg(long, default_value_t = 48.0)]
    pub font_max: f32,
    #[arg(long, default_value_t = 0.5)]
    pub font_tolerance: f32,

    #[arg(long, default_value_t = 0.1)]
    pub spacing_min: f32,
    #[arg(long, default_value_t = 1.0)]
    pub spacing_max: f32,
    #[arg(long, default_value_t = 0.01)]
    pub spacing_tolerance: f32,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            font_min: 8.0,
            font_max: 48.0,
            font_tolerance: 0.5,
            spacing_min: 0.1,
            spacing_max: 1.0,
            spacing_tolerance: 0.01,
        }
    }
}

impl RangeConfig {
    pub fn validate(&self) -> PfResult<()> {
        if self.font_min >= self.font_max {
            return Err(PageFitError::Config(format!(
                "font_min {} must be below font_max {}",
                self.font_min, self.font_max
            )));
        }
        if self.spacing_min >= self.spacing_max {
            return Err(PageFitError::Config(format!(
                "spacing_min {} must be below spacing_max {}",
                self.spacing_min, self.spacing_max
            )));
        }
        if self.font_tolerance <= 0.0 || self.spacing_tolerance <= 0.0 {
            return Err(PageFitError::Config(
                "tolerances must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Step-size tables and search pacing.
///
/// The four tables hold one step per density tier; `density_tiers` holds
/// the three inclusive-low tier boundaries separating them.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StepTuning {
    /// Total `step()` budget per run. A run that is still open past this
    /// many steps is aborted as failed.
    #[arg(long, default_value_t = 50)]
    pub max_steps: usize,

    /// Accepted linear steps inside one phase before the proposal
    /// mechanism is promoted to bisection.
    #[arg(long, default_value_t = 3)]
    pub bisection_after: usize,

    #[arg(long, default_value = "5,15,25")]
    pub density_tiers: String,

    #[arg(long, default_value = "4.0,2.0,1.0,0.5")]
    pub font_grow_steps: String,

    #[arg(long, default_value = "0.5,1.0,1.0,2.0")]
    pub font_shrink_steps: String,

    #[arg(long, default_value = "0.20,0.10,0.05,0.02")]
    pub spacing_grow_steps: String,

    #[arg(long, default_value = "0.05,0.05,0.10,0.15")]
    pub spacing_shrink_steps: String,
}

impl Default for StepTuning {
    fn default() -> Self {
        Self {
            max_steps: 50,
            bisection_after: 3,
            density_tiers: "5,15,25".to_string(),
            font_grow_steps: "4.0,2.0,1.0,0.5".to_string(),
            font_shrink_steps: "0.5,1.0,1.0,2.0".to_string(),
            spacing_grow_steps: "0.20,0.10,0.05,0.02".to_string(),
            spacing_shrink_steps: "0.05,0.05,0.10,0.15".to_string(),
        }
    }
}

impl StepTuning {
    pub fn get_density_tiers(&self) -> [f32; 3] {
        parse_f32_array::<3>(&self.density_tiers, "density_tiers")
    }

    pub fn get_font_grow_steps(&self) -> [f32; 4] {
        parse_f32_array::<4>(&self.font_grow_steps, "font_grow_steps")
    }

    pub fn get_font_shrink_steps(&self) -> [f32; 4] {
        parse_f32_array::<4>(&self.font_shrink_steps, "font_shrink_steps")
    }

    pub fn get_spacing_grow_steps(&self) -> [f32; 4] {
        parse_f32_array::<4>(&self.spacing_grow_steps, "spacing_grow_steps")
    }

    pub fn get_spacing_shrink_steps(&self) -> [f32; 4] {
        parse_f32_array::<4>(&self.spacing_shrink_steps, "spacing_shrink_steps")
    }

    pub fn validate(&self) -> PfResult<()> {
        if self.max_steps == 0 {
            return Err(PageFitError::Config(
                "max_steps must be at least 1".to_string(),
            ));
        }
        if self.bisection_after == 0 {
            return Err(PageFitError::Config(
                "bisection_after must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_f32_array<const N: usize>(s: &str, name: &str) -> [f32; N] {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != N {
        panic!("--{} requires {} values", name, N);
    }
    let mut arr = [0.0; N];
    for (i, p) in parts.iter().enumerate() {
        arr[i] = p
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("Invalid number in {}", name));
    }
    arr
}
