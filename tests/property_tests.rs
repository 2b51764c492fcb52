mod common;

use common::{drive, threshold_oracle};
use pagefit::config::OptimizerConfig;
use pagefit::core_types::{ContentProfile, LayoutParameters};
use pagefit::error::PageFitError;
use pagefit::optimizer::{Controller, Mode, Optimizer, Outcome};
use proptest::prelude::*;

// --- STRATEGIES ---

prop_compose! {
    fn arb_profile()(
        items in 1u32..200,
        groups in 0u32..20
    ) -> ContentProfile {
        ContentProfile::new(items, groups)
    }
}

prop_compose! {
    fn arb_params()(
        font in 8.0f32..48.0,
        spacing in 0.1f32..1.0,
        columns in 1u32..5
    ) -> LayoutParameters {
        LayoutParameters::new(font, spacing, columns)
    }
}

fn patient_config() -> OptimizerConfig {
    let mut config = OptimizerConfig::default();
    config.tuning.max_steps = 1000;
    config
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Any overflowing start either escapes the overflow or exhausts both
    /// floors, within the linear-step bound per parameter.
    #[test]
    fn reduction_terminates_within_bound(
        start in arb_params(),
        profile in arb_profile(),
        font_limit in 8.0f32..48.0,
        spacing_limit in 0.1f32..1.0,
    ) {
        let mut oracle = threshold_oracle(font_limit, spacing_limit);
        if !oracle(&start) {
            // Not a reduction run; covered by the expansion property.
            return Ok(());
        }

        let controller = Controller::new(patient_config(), profile).unwrap();
        // Smallest shrink steps are 0.5 (font) and 0.05 (spacing), plus
        // slack for the init call and the phase fall-through.
        let bound = ((start.font_size_px - 8.0) / 0.5).ceil() as usize
            + ((start.line_spacing - 0.1) / 0.05).ceil() as usize
            + 4;

        let results = drive(&controller, start, &mut oracle, bound);
        let last = results.last().unwrap();

        prop_assert_eq!(last.state.mode, Mode::Reduction);
        prop_assert!(results.len() <= bound);
        // Thresholds are inside the ranges, so the floor always fits and
        // the run must end in success.
        prop_assert_eq!(last.outcome, Outcome::Done);
        prop_assert!(!oracle(&last.params));
        prop_assert!(last.params.font_size_px >= 8.0);
        prop_assert!(last.params.line_spacing >= 0.1);
    }

    /// Whatever the controller accepts after an oracle rejection is itself
    /// safe and no larger than the rejected value.
    #[test]
    fn expansion_accepts_only_safe_values(
        profile in arb_profile(),
        columns in 1u32..5,
        font_limit in 20.0f32..48.0,
        spacing_limit in 0.4f32..1.0,
    ) {
        let start = LayoutParameters::new(10.0, 0.2, columns);
        let mut oracle = threshold_oracle(font_limit, spacing_limit);
        prop_assert!(!oracle(&start));

        let optimizer = Optimizer::new(profile, patient_config()).unwrap();
        let fitted = optimizer.solve(start, &mut oracle).unwrap();

        prop_assert!(!oracle(&fitted), "accepted layout overflows");
        prop_assert!(fitted.font_size_px <= font_limit + 1e-3);
        prop_assert!(fitted.line_spacing <= spacing_limit + 1e-3);
        prop_assert!(fitted.font_size_px >= start.font_size_px);
        prop_assert!(fitted.line_spacing >= start.line_spacing);
    }

    /// A non-monotonic, effectively random oracle must never hang the
    /// optimizer: the step budget turns it into a structured outcome.
    #[test]
    fn flaky_oracle_cannot_hang(
        start in arb_params(),
        profile in arb_profile(),
        seed in any::<u64>(),
    ) {
        let mut oracle = move |c: &LayoutParameters| {
            let mut h = seed
                ^ u64::from(c.font_size_px.to_bits())
                ^ (u64::from(c.line_spacing.to_bits()) << 32);
            h ^= h >> 33;
            h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
            h ^= h >> 33;
            h & 1 == 0
        };

        let optimizer = Optimizer::new(profile, OptimizerConfig::default()).unwrap();
        let result = optimizer.solve(start, &mut oracle);

        prop_assert!(matches!(
            result,
            Ok(_)
                | Err(PageFitError::BoundsExhausted(_))
                | Err(PageFitError::IterationBudget(_))
        ));
    }

    /// The density score stays finite and non-negative over the whole
    /// input domain.
    #[test]
    fn density_score_is_finite(profile in arb_profile(), columns in 0u32..16) {
        let score = pagefit::density::density_score(&profile, columns);
        prop_assert!(score.is_finite());
        prop_assert!(score >= 0.0);
    }
}
