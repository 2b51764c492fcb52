pub mod runner;

pub use self::runner::{solve_batch, NoProgress, Optimizer, OptimizerParams, ProgressCallback, SolveJob};

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{debug, info, warn};

use crate::config::OptimizerConfig;
use crate::core_types::{ContentProfile, LayoutParameters};
use crate::density::{density_score, DensityModel, StepDirection, TunedParameter};
use crate::error::PfResult;
use crate::search::find_boundary;

/// External predicate answering whether a candidate layout overflows its
/// container. Implemented by the rendering layer (apply parameters,
/// measure scroll extent vs. client extent). Assumed monotonic per
/// parameter; see [`Controller::step`] for how violations are handled.
pub trait OverflowOracle {
    /// `true` means the content overflows at `candidate`.
    fn overflows(&mut self, candidate: &LayoutParameters) -> bool;
}

impl<F> OverflowOracle for F
where
    F: FnMut(&LayoutParameters) -> bool,
{
    fn overflows(&mut self, candidate: &LayoutParameters) -> bool {
        self(candidate)
    }
}

/// Which parameter is currently being searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    FontSize,
    LineHeight,
    Complete,
}

impl Phase {
    fn parameter(self) -> Option<TunedParameter> {
        match self {
            Self::FontSize => Some(TunedParameter::FontSize),
            Self::LineHeight => Some(TunedParameter::LineSpacing),
            Self::Complete => None,
        }
    }
}

/// Whether the run grows parameters into free space or shrinks them out of
/// an overflow. Chosen once from the first oracle reading and never
/// re-derived, even if content changes mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    Expansion,
    Reduction,
}

/// Proposal mechanism inside the current phase. Linear stepping is
/// promoted to bisection after `bisection_after` accepted steps; every
/// phase transition resets back to linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    Linear,
    Bisection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    BoundsExhausted,
    IterationBudget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    /// The caller must re-render with `params`, re-measure, and call again.
    Continue,
    Done,
    Failed,
}

/// Caller-owned search state, threaded through [`Controller::step`] calls.
/// The controller holds nothing between calls; the state is a
/// deterministic function of the oracle answer sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationState {
    pub phase: Phase,
    pub mode: Mode,
    pub strategy: Strategy,
    /// Total `step()` calls consumed by this run.
    pub iteration_count: usize,
    /// Accepted linear steps inside the current phase; drives promotion.
    pub phase_iterations: usize,
    /// Last applied increment of the active parameter, for backoff.
    pub last_step: f32,
    /// Last value of the active parameter the oracle certified safe.
    pub last_safe: Option<f32>,
    pub hit_font_ceiling: bool,
    pub hit_line_ceiling: bool,
    pub failure: Option<FailureReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub outcome: Outcome,
    pub params: LayoutParameters,
    pub state: OptimizationState,
    pub message: String,
}

/// The phase/mode state machine driving the search, one proposal per call.
///
/// The controller never calls the oracle for its own proposals; the caller
/// tests each proposal and passes the boolean back into the next call. The
/// one exception is the internal bisection refinement, whose oracle call
/// count is bounded and known in advance.
pub struct Controller {
    config: OptimizerConfig,
    model: DensityModel,
    profile: ContentProfile,
}

impl Controller {
    pub fn new(config: OptimizerConfig, profile: ContentProfile) -> PfResult<Self> {
        config.validate()?;
        let model = DensityModel::from_tuning(&config.tuning)?;
        Ok(Self {
            config,
            model,
            profile,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn profile(&self) -> &ContentProfile {
        &self.profile
    }

    /// Starts a run from the first oracle reading. Overflow present means
    /// the run can only shrink; reduction starts at line spacing because
    /// tightening it has the smaller perceptual cost.
    pub fn init_state(&self, overflowed: bool) -> OptimizationState {
        let (mode, phase) = if overflowed {
            (Mode::Reduction, Phase::LineHeight)
        } else {
            (Mode::Expansion, Phase::FontSize)
        };
        OptimizationState {
            phase,
            mode,
            strategy: Strategy::Linear,
            iteration_count: 0,
            phase_iterations: 0,
            last_step: 0.0,
            last_safe: None,
            hit_font_ceiling: false,
            hit_line_ceiling: false,
            failure: None,
        }
    }

    /// Absorbs the oracle's answer for `params` (the previous proposal) and
    /// emits the next one. Pass `state: None` on the first call; the mode
    /// is then fixed from `overflowed` for the life of the run.
    ///
    /// Terminal states are idempotent: once `Done` or `Failed`, further
    /// calls return the same outcome with unchanged parameters.
    pub fn step(
        &self,
        params: &LayoutParameters,
        state: Option<OptimizationState>,
        overflowed: bool,
        oracle: &mut dyn OverflowOracle,
    ) -> OptimizationResult {
        let (mut state, first) = match state {
            Some(s) => (s, false),
            None => (self.init_state(overflowed), true),
        };
        let params = *params;

        if state.phase == Phase::Complete {
            return self.terminal_result(params, state);
        }

        state.iteration_count += 1;
        if state.iteration_count > self.config.tuning.max_steps {
            warn!(
                steps = state.iteration_count,
                "optimization aborted; oracle did not converge"
            );
            state.failure = Some(FailureReason::IterationBudget);
            state.phase = Phase::Complete;
            return self.terminal_result(params, state);
        }

        match state.mode {
            Mode::Expansion => self.step_expansion(params, state, overflowed, first, oracle),
            Mode::Reduction => self.step_reduction(params, state, overflowed, first),
        }
    }

    fn step_expansion(
        &self,
        mut params: LayoutParameters,
        mut state: OptimizationState,
        overflowed: bool,
        first: bool,
        oracle: &mut dyn OverflowOracle,
    ) -> OptimizationResult {
        let active = match state.phase.parameter() {
            Some(p) => p,
            None => return self.terminal_result(params, state),
        };

        if first {
            state.last_safe = Some(param_value(&params, active));
        } else if overflowed {
            // The pending proposal was rejected: roll back the last
            // increment and stop growing this parameter.
            let rejected = param_value(&params, active);
            let accepted = state
                .last_safe
                .unwrap_or(rejected - state.last_step);
            set_param(&mut params, active, accepted);
            note_ceiling(&mut state, active);
            debug!(parameter = %active, rejected, accepted, "oracle ceiling hit; backed off");
            self.advance_phase(&mut state, &params);
            if state.phase == Phase::Complete {
                return self.completed(
                    params,
                    state,
                    format!("{} ceiling found at {:.2}; layout fits", active, accepted),
                );
            }
        } else {
            state.last_safe = Some(param_value(&params, active));
            state.phase_iterations += 1;
        }

        self.propose_growth(params, state, oracle)
    }

    fn propose_growth(
        &self,
        mut params: LayoutParameters,
        mut state: OptimizationState,
        oracle: &mut dyn OverflowOracle,
    ) -> OptimizationResult {
        let score = density_score(&self.profile, params.columns);

        loop {
            let active = match state.phase.parameter() {
                Some(p) => p,
                None => return self.terminal_result(params, state),
            };
            let (_min, max, tolerance) = self.bounds_of(active);
            let value = param_value(&params, active);

            if state.phase_iterations >= self.config.tuning.bisection_after {
                // Linear stepping has not found the ceiling; refine the
                // remaining bracket in bounded time instead.
                state.strategy = Strategy::Bisection;
            }

            if state.strategy == Strategy::Bisection {
                let lo = state.last_safe.unwrap_or(value);
                let boundary = find_boundary(
                    lo,
                    max,
                    tolerance,
                    |v| {
                        let mut candidate = params;
                        set_param(&mut candidate, active, v);
                        !oracle.overflows(&candidate)
                    },
                    true,
                );

                // A monotonic oracle cannot reject the value the search
                // just certified; keep the estimate either way.
                let mut candidate = params;
                set_param(&mut candidate, active, boundary);
                if oracle.overflows(&candidate) {
                    warn!(
                        parameter = %active,
                        boundary,
                        "oracle contradicted bisection result; keeping best estimate"
                    );
                }

                set_param(&mut params, active, boundary);
                state.last_safe = Some(boundary);
                if max - boundary > tolerance {
                    note_ceiling(&mut state, active);
                }
                debug!(parameter = %active, boundary, "bisection converged");
                self.advance_phase(&mut state, &params);
                if state.phase == Phase::Complete {
                    return self.completed(
                        params,
                        state,
                        format!("{} boundary located at {:.2}; layout fits", active, boundary),
                    );
                }
                continue;
            }

            let step = self.model.step_size(score, active, StepDirection::Grow);
            let candidate = value + step;
            if candidate > max {
                // Range ceiling: leave the value as is and move on.
                self.advance_phase(&mut state, &params);
                if state.phase == Phase::Complete {
                    return self.completed(
                        params,
                        state,
                        format!("{} at range ceiling; layout fits", active),
                    );
                }
                continue;
            }

            state.last_step = step;
            set_param(&mut params, active, candidate);
            debug!(parameter = %active, candidate, "proposing growth");
            return OptimizationResult {
                outcome: Outcome::Continue,
                params,
                message: format!("growing {} to {:.2}", active, candidate),
                state,
            };
        }
    }

    fn step_reduction(
        &self,
        mut params: LayoutParameters,
        mut state: OptimizationState,
        overflowed: bool,
        first: bool,
    ) -> OptimizationResult {
        if !first && !overflowed {
            // The tested proposal resolved the overflow; accept it as is.
            state.phase = Phase::Complete;
            state.strategy = Strategy::Linear;
            return self.completed(params, state, "overflow resolved; layout fits".to_string());
        }

        let score = density_score(&self.profile, params.columns);

        loop {
            let active = match state.phase.parameter() {
                Some(p) => p,
                None => return self.terminal_result(params, state),
            };
            let (min, _max, _tolerance) = self.bounds_of(active);
            let value = param_value(&params, active);

            if value <= min {
                if active == TunedParameter::LineSpacing {
                    debug!("line_spacing floor reached; shrinking font size");
                    self.advance_phase(&mut state, &params);
                    continue;
                }
                // Both parameters exhausted: terminal, non-recoverable.
                state.failure = Some(FailureReason::BoundsExhausted);
                state.phase = Phase::Complete;
                warn!("both parameters at their floor with overflow still present");
                return self.terminal_result(params, state);
            }

            let step = self.model.step_size(score, active, StepDirection::Shrink);
            let candidate = (value - step).max(min);
            state.last_step = value - candidate;
            set_param(&mut params, active, candidate);
            debug!(parameter = %active, candidate, "proposing shrink");
            return OptimizationResult {
                outcome: Outcome::Continue,
                params,
                message: format!("shrinking {} to {:.2}", active, candidate),
                state,
            };
        }
    }

    fn advance_phase(&self, state: &mut OptimizationState, params: &LayoutParameters) {
        state.phase = match (state.mode, state.phase) {
            (Mode::Expansion, Phase::FontSize) => Phase::LineHeight,
            (Mode::Expansion, Phase::LineHeight) => Phase::Complete,
            (Mode::Reduction, Phase::LineHeight) => Phase::FontSize,
            (Mode::Reduction, Phase::FontSize) => Phase::Complete,
            (_, Phase::Complete) => Phase::Complete,
        };
        state.strategy = Strategy::Linear;
        state.phase_iterations = 0;
        state.last_step = 0.0;
        // Entering line-height expansion, the current spacing is the value
        // the safe font size was certified against.
        state.last_safe = match (state.mode, state.phase) {
            (Mode::Expansion, Phase::LineHeight) => Some(params.line_spacing),
            _ => None,
        };
    }

    fn completed(
        &self,
        params: LayoutParameters,
        state: OptimizationState,
        message: String,
    ) -> OptimizationResult {
        info!(
            iterations = state.iteration_count,
            font_size = params.font_size_px,
            line_spacing = params.line_spacing,
            "auto-format complete"
        );
        OptimizationResult {
            outcome: Outcome::Done,
            params,
            state,
            message,
        }
    }

    /// Result for a run already in a terminal state. Pure in `state`, so
    /// repeated calls keep returning the same outcome and message.
    fn terminal_result(
        &self,
        params: LayoutParameters,
        state: OptimizationState,
    ) -> OptimizationResult {
        let (outcome, message) = match state.failure {
            Some(FailureReason::BoundsExhausted) => (
                Outcome::Failed,
                format!(
                    "{} and {} are both at their minimums and the content still \
                     overflows; reduce content or increase columns",
                    TunedParameter::FontSize,
                    TunedParameter::LineSpacing
                ),
            ),
            Some(FailureReason::IterationBudget) => (
                Outcome::Failed,
                format!(
                    "no convergence after {} steps; the overflow oracle may be unstable",
                    self.config.tuning.max_steps
                ),
            ),
            None => (Outcome::Done, "layout fits".to_string()),
        };
        OptimizationResult {
            outcome,
            params,
            state,
            message,
        }
    }

    fn bounds_of(&self, parameter: TunedParameter) -> (f32, f32, f32) {
        let ranges = &self.config.ranges;
        match parameter {
            TunedParameter::FontSize => {
                (ranges.font_min, ranges.font_max, ranges.font_tolerance)
            }
            TunedParameter::LineSpacing => (
                ranges.spacing_min,
                ranges.spacing_max,
                ranges.spacing_tolerance,
            ),
        }
    }
}

fn param_value(params: &LayoutParameters, parameter: TunedParameter) -> f32 {
    match parameter {
        TunedParameter::FontSize => params.font_size_px,
        TunedParameter::LineSpacing => params.line_spacing,
    }
}

fn set_param(params: &mut LayoutParameters, parameter: TunedParameter, value: f32) {
    match parameter {
        TunedParameter::FontSize => params.font_size_px = value,
        TunedParameter::LineSpacing => params.line_spacing = value,
    }
}

fn note_ceiling(state: &mut OptimizationState, parameter: TunedParameter) {
    match parameter {
        TunedParameter::FontSize => state.hit_font_ceiling = true,
        TunedParameter::LineSpacing => state.hit_line_ceiling = true,
    }
}
