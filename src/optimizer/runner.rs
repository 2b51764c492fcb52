use rayon::prelude::*;
use tracing::info;
use typed_builder::TypedBuilder;

use super::{Controller, FailureReason, OptimizationResult, OptimizationState, Outcome, OverflowOracle};
use crate::config::OptimizerConfig;
use crate::core_types::{ContentProfile, LayoutParameters};
use crate::error::{PageFitError, PfResult};

/// A trait for receiving updates during optimization.
/// Boolean return value indicates if the run should continue (true) or
/// abort (false). Cancellation is the caller's concern; aborting simply
/// stops driving the loop.
pub trait ProgressCallback: Send + Sync {
    fn on_step(
        &self,
        iteration: usize,
        params: &LayoutParameters,
        state: &OptimizationState,
    ) -> bool;
}

/// For callers that don't need incremental feedback.
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_step(
        &self,
        _iteration: usize,
        _params: &LayoutParameters,
        _state: &OptimizationState,
    ) -> bool {
        true
    }
}

#[derive(TypedBuilder)]
pub struct OptimizerParams {
    profile: ContentProfile,
    #[builder(default)]
    config: OptimizerConfig,
}

impl OptimizerParams {
    pub fn build_optimizer(self) -> PfResult<Optimizer> {
        Optimizer::new(self.profile, self.config)
    }
}

pub struct Optimizer {
    controller: Controller,
}

impl Optimizer {
    pub fn new(profile: ContentProfile, config: OptimizerConfig) -> PfResult<Self> {
        Ok(Self {
            controller: Controller::new(config, profile)?,
        })
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Stepwise entry point for UI-driven loops that re-render between
    /// calls. `overflowed` is the oracle's answer for `params` as passed;
    /// the result carries the next proposal to test.
    pub fn step(
        &self,
        params: &LayoutParameters,
        state: Option<OptimizationState>,
        overflowed: bool,
        oracle: &mut dyn OverflowOracle,
    ) -> OptimizationResult {
        self.controller.step(params, state, overflowed, oracle)
    }

    /// One-shot entry point: drives `step()` to completion against the
    /// synchronous oracle.
    pub fn solve(
        &self,
        initial: LayoutParameters,
        oracle: &mut dyn OverflowOracle,
    ) -> PfResult<LayoutParameters> {
        self.solve_with_progress(initial, oracle, &NoProgress)
    }

    /// Like [`Optimizer::solve`], reporting each proposal to `callback`.
    /// An aborted run returns the last parameters the oracle certified
    /// safe.
    pub fn solve_with_progress(
        &self,
        initial: LayoutParameters,
        oracle: &mut dyn OverflowOracle,
        callback: &dyn ProgressCallback,
    ) -> PfResult<LayoutParameters> {
        initial.validate(&self.controller.config().ranges)?;

        let mut params = initial;
        let mut state: Option<OptimizationState> = None;
        let mut best = initial;

        loop {
            let overflowed = oracle.overflows(&params);
            if !overflowed {
                best = params;
            }

            let result = self.controller.step(&params, state.take(), overflowed, oracle);
            params = result.params;

            match result.outcome {
                Outcome::Continue => {
                    if !callback.on_step(result.state.iteration_count, &params, &result.state) {
                        info!("run aborted by caller; keeping last safe parameters");
                        return Ok(best);
                    }
                    state = Some(result.state);
                }
                Outcome::Done => {
                    return Ok(params);
                }
                Outcome::Failed => {
                    return Err(match result.state.failure {
                        Some(FailureReason::IterationBudget) => {
                            PageFitError::IterationBudget(result.message)
                        }
                        _ => PageFitError::BoundsExhausted(result.message),
                    });
                }
            }
        }
    }
}

/// One optimization job for [`solve_batch`].
pub struct SolveJob<O> {
    pub initial: LayoutParameters,
    pub profile: ContentProfile,
    pub oracle: O,
}

/// Runs independent jobs in parallel. Each run is a pure computation over
/// its own oracle and profile, so the jobs need no coordination; a single
/// run is still driven strictly serially.
pub fn solve_batch<O>(
    config: &OptimizerConfig,
    jobs: Vec<SolveJob<O>>,
) -> Vec<PfResult<LayoutParameters>>
where
    O: OverflowOracle + Send,
{
    jobs.into_par_iter()
        .map(|mut job| {
            let optimizer = Optimizer::new(job.profile, config.clone())?;
            optimizer.solve(job.initial, &mut job.oracle)
        })
        .collect()
}
