// Error-rate estimation with confidence bands
//
// Point estimates: per-class proportions over a whole population with a
// normal-approximation confidence half-width z * s / sqrt(n), where s is the
// sample standard deviation of the one-hot encoded class column.
//
// Windowed estimates: the same statistic evaluated inside a symmetric window
// that slides along the injection time axis. Bands are POINTWISE. Read as a
// single simultaneous band over all positions they understate uncertainty.
//
// Scientific Foundation:
// [1] Welford, B. P. (1962). Note on a method for calculating corrected sums of
//     squares and products. Technometrics, 4(3). Incremental update of the
//     window statistics instead of re-aggregating each window.
// [2] Acklam, P. J. (2003). An algorithm for computing the inverse normal
//     cumulative distribution function.

mod confidence;
mod quantile;
mod windowed;

pub use confidence::{binary_half_width, confidence_interval, ConfidenceInterval};
pub use quantile::{normal_quantile, two_sided_z};
pub use windowed::{windowed_rate, WindowEstimate, WindowPoint};
