// Rolling class proportions along the injection time axis

use crate::classifier::Classification;
use crate::config::validate_window;
use crate::error::{AnalysisError, Result};
use crate::outcome::{OutcomeClass, PerClass};
use crate::rate::confidence::binary_half_width;
use crate::rate::quantile::two_sided_z;
use serde::Serialize;

/// Local estimate inside one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowEstimate {
    /// Runs inside the window (always the window size)
    pub n: usize,
    pub rate: PerClass<f64>,
    pub lower: PerClass<f64>,
    pub upper: PerClass<f64>,
}

/// One position of the sorted run sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowPoint {
    /// Sort key (e.g. injection cycle)
    pub order: f64,
    pub run_id: String,
    /// `None` in the first and last `window_size / 2` positions
    pub estimate: Option<WindowEstimate>,
}

/// Windowed class rates with pointwise confidence bands
///
/// Runs are sorted by `ordering_values` (stable, so ties keep record order).
/// Position `i` gets the proportions of the `window_size` runs in
/// `[i - window_size/2, i + window_size/2)`; the first and last
/// `window_size/2` positions are reported without an estimate instead of
/// being extrapolated.
///
/// The bands are pointwise. They are not a simultaneous band over the whole
/// series.
///
/// Counts are updated incrementally as the window slides, so the whole series
/// costs O(n log n) for the sort plus O(n).
///
/// # Errors
/// - `InvalidParameter`: odd or zero window, confidence outside (0, 1),
///   ordering values not aligned with the classification
/// - `InsufficientData`: not a single full window fits (n <= window_size)
pub fn windowed_rate(
    classification: &Classification,
    ordering_values: &[f64],
    window_size: usize,
    confidence_level: f64,
) -> Result<Vec<WindowPoint>> {
    validate_window(window_size)?;
    let z = two_sided_z(confidence_level)?;

    let n = classification.len();
    if ordering_values.len() != n {
        return Err(AnalysisError::invalid(
            "ordering_values",
            format!(
                "expected one value per classified run ({}), got {}",
                n,
                ordering_values.len()
            ),
        ));
    }
    if n <= window_size {
        return Err(AnalysisError::insufficient(window_size + 1, n));
    }

    let mut sorted: Vec<(f64, &str, OutcomeClass)> = classification
        .iter()
        .zip(ordering_values)
        .map(|((id, class), &order)| (order, id, class))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let half = window_size / 2;
    let mut counts = PerClass::<usize>::default();
    for &(_, _, class) in &sorted[..window_size] {
        *counts.get_mut(class) += 1;
    }

    let mut points = Vec::with_capacity(n);
    for (i, &(order, id, _)) in sorted.iter().enumerate() {
        let in_window = i >= half && i < n - half;

        if in_window && i > half {
            *counts.get_mut(sorted[i - half - 1].2) -= 1;
            *counts.get_mut(sorted[i + half - 1].2) += 1;
        }

        let estimate = in_window.then(|| {
            let rate = counts.map(|_, &c| c as f64 / window_size as f64);
            let hw = counts.map(|_, &c| binary_half_width(c, window_size, z));
            WindowEstimate {
                n: window_size,
                lower: rate.map(|class, r| r - hw.get(class)),
                upper: rate.map(|class, r| r + hw.get(class)),
                rate,
            }
        });

        points.push(WindowPoint {
            order,
            run_id: id.to_string(),
            estimate,
        });
    }

    tracing::debug!(
        runs = n,
        window_size,
        estimates = n - window_size,
        "Computed windowed error rate"
    );

    Ok(points)
}
