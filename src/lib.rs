pub mod config;
pub mod core_types;
pub mod density;
pub mod error;
pub mod optimizer;
pub mod search;

pub use crate::config::{OptimizerConfig, RangeConfig, StepTuning};
pub use crate::core_types::{ContentProfile, LayoutParameters};
pub use crate::error::{PageFitError, PfResult};
pub use crate::optimizer::{
    solve_batch, Controller, OptimizationResult, OptimizationState, Optimizer, OptimizerParams,
    Outcome, OverflowOracle, ProgressCallback, SolveJob,
};
