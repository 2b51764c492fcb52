#![allow(dead_code)] // Suppress warnings for unused test helpers

use pagefit::core_types::LayoutParameters;
use pagefit::optimizer::{Controller, OptimizationResult, OptimizationState, Outcome};

/// Drives a controller the way the rendering loop would: test the current
/// proposal against the oracle, feed the answer into the next step, repeat
/// until a terminal outcome or `max_calls` is reached.
pub fn drive<F>(
    controller: &Controller,
    initial: LayoutParameters,
    oracle: &mut F,
    max_calls: usize,
) -> Vec<OptimizationResult>
where
    F: FnMut(&LayoutParameters) -> bool,
{
    let mut results = Vec::new();
    let mut params = initial;
    let mut state: Option<OptimizationState> = None;

    for _ in 0..max_calls {
        let overflowed = oracle(&params);
        let result = controller.step(&params, state.take(), overflowed, &mut *oracle);
        params = result.params;
        state = Some(result.state.clone());
        let terminal = result.outcome != Outcome::Continue;
        results.push(result);
        if terminal {
            break;
        }
    }

    results
}

/// Threshold oracle: overflow as soon as either knob crosses its limit.
/// Monotonic per parameter by construction.
pub fn threshold_oracle(
    font_limit: f32,
    spacing_limit: f32,
) -> impl FnMut(&LayoutParameters) -> bool {
    move |c: &LayoutParameters| c.font_size_px > font_limit || c.line_spacing > spacing_limit
}

/// Crude page model: a fixed number of content lines split across columns,
/// each line costing `font * (1 + spacing)` pixels of height.
pub fn page_oracle(lines: f32, page_height: f32) -> impl FnMut(&LayoutParameters) -> bool {
    move |c: &LayoutParameters| {
        let rows = (lines / c.columns as f32).ceil();
        rows * c.font_size_px * (1.0 + c.line_spacing) > page_height
    }
}
