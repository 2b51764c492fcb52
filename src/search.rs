use tracing::debug;

/// Number of bisection probes needed to localize a boundary inside
/// `[min, max]` to within `tolerance`: `ceil(log2((max - min) / tolerance))`.
pub fn probe_budget(min: f32, max: f32, tolerance: f32) -> usize {
    if max <= min || tolerance <= 0.0 {
        return 0;
    }
    let span = max - min;
    if span <= tolerance {
        return 0;
    }
    (span / tolerance).log2().ceil() as usize
}

/// Locates the threshold of a monotonic predicate by bisection.
///
/// Precondition: `is_safe` is monotonic over `[min, max]`. With
/// `prefer_max`, there is a threshold `t` such that `is_safe(v)` holds for
/// all `v <= t` and fails above it; `min` itself is assumed safe and the
/// largest safe value is returned, within `tolerance` of `t`. With
/// `prefer_max = false` the predicate is mirrored (safe for `v >= t`,
/// `max` assumed safe) and the smallest safe value is returned.
///
/// `is_safe` may call an expensive external oracle; that is acceptable
/// here only because the probe count is bounded by
/// [`probe_budget`] and known before the search starts. The returned
/// endpoint is either an endpoint assumed safe by the precondition or a
/// value that probed safe during the search.
pub fn find_boundary<F>(min: f32, max: f32, tolerance: f32, mut is_safe: F, prefer_max: bool) -> f32
where
    F: FnMut(f32) -> bool,
{
    let mut lo = min;
    let mut hi = max;

    for _ in 0..probe_budget(min, max, tolerance) {
        if hi - lo <= tolerance {
            break;
        }
        let mid = lo + (hi - lo) / 2.0;
        if is_safe(mid) == prefer_max {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let found = if prefer_max { lo } else { hi };
    debug!(
        min,
        max, tolerance, found, "boundary search converged"
    );
    found
}
