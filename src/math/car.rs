//! Cumulative abnormal return over a window anchored at an event position.

/// Sums `returns[anchor..=anchor + window]`, i.e. `window + 1` consecutive values.
///
/// Returns `None` when the window runs past the last element; partial windows are
/// never summed.
#[inline]
pub fn car(returns: &[f64], anchor: usize, window: usize) -> Option<f64> {
    let end = anchor.checked_add(window)?;
    returns.get(anchor..=end).map(|slice| slice.iter().sum())
}
