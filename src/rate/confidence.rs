// Point confidence intervals over an unordered set of runs

use crate::classifier::Classification;
use crate::error::{AnalysisError, Result};
use crate::outcome::{OutcomeClass, PerClass};
use crate::rate::quantile::two_sided_z;
use serde::Serialize;
use trueno::Vector;

/// Per-class proportions with normal-approximation confidence half-widths
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    /// Number of runs the estimate is based on
    pub n: usize,
    pub confidence_level: f64,
    /// Empirical proportion of each class
    pub rates: PerClass<f64>,
    /// Sample standard deviation of each one-hot class column (f32 precision)
    pub std: PerClass<f64>,
    /// z * std / sqrt(n)
    pub half_width: PerClass<f64>,
}

impl ConfidenceInterval {
    pub fn lower(&self, class: OutcomeClass) -> f64 {
        self.rates.get(class) - self.half_width.get(class)
    }

    pub fn upper(&self, class: OutcomeClass) -> f64 {
        self.rates.get(class) + self.half_width.get(class)
    }

    /// Full interval width (2 × half-width)
    pub fn width(&self, class: OutcomeClass) -> f64 {
        2.0 * self.half_width.get(class)
    }
}

/// Confidence half-width of a binary proportion
///
/// `count` successes out of `n`, sample (n - 1) variance. A single
/// observation carries no variance estimate and yields 0.
pub fn binary_half_width(count: usize, n: usize, z: f64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let p = count as f64 / n_f;
    let variance = (p * (1.0 - p)).max(0.0) * n_f / (n_f - 1.0);
    z * variance.sqrt() / n_f.sqrt()
}

/// Confidence interval of every class proportion over the whole population
///
/// The column variance is computed by trueno in `f32`, so `std` and
/// `half_width` agree with [`binary_half_width`] to about 1e-6 and lose
/// exactness past 2^24 runs. Proportions are exact.
///
/// # Errors
/// `InsufficientData` for an empty classification, `InvalidParameter` for a
/// confidence level outside (0, 1).
///
/// # Example
/// ```
/// use seuscope::classifier::classify;
/// use seuscope::rate::confidence_interval;
/// use seuscope::record::{GoldenRecord, RunRecord};
///
/// let golden = GoldenRecord::new().with_field("crc", 7);
/// let runs: Vec<RunRecord> = (0..20)
///     .map(|i| {
///         let crc = if i % 4 == 0 { 8 } else { 7 };
///         RunRecord::new(format!("r{}", i)).with_field("crc", crc)
///     })
///     .collect();
/// let labels = classify(&runs, &golden, &["crc"], &["crc"]);
///
/// let ci = confidence_interval(&labels, 0.95)?;
/// assert_eq!(ci.n, 20);
/// assert!((ci.rates.corruption - 0.25).abs() < 1e-9);
/// assert!(ci.half_width.corruption > 0.0);
/// # Ok::<(), seuscope::error::AnalysisError>(())
/// ```
pub fn confidence_interval(
    classification: &Classification,
    confidence_level: f64,
) -> Result<ConfidenceInterval> {
    let z = two_sided_z(confidence_level)?;
    let n = classification.len();
    if n == 0 {
        return Err(AnalysisError::insufficient(1, 0));
    }

    let rates = classification.rates()?;

    let mut std = PerClass::<f64>::default();
    if n > 1 {
        let correction = n as f64 / (n as f64 - 1.0);
        for class in OutcomeClass::ALL {
            let column: Vec<f32> = classification
                .classes()
                .map(|c| if c == class { 1.0 } else { 0.0 })
                .collect();

            // trueno reports the population variance
            let Ok(variance) = Vector::from_slice(&column).variance() else {
                return Err(AnalysisError::insufficient(2, n));
            };
            *std.get_mut(class) = (f64::from(variance).max(0.0) * correction).sqrt();
        }
    }

    let sqrt_n = (n as f64).sqrt();
    let half_width = std.map(|_, s| z * s / sqrt_n);

    Ok(ConfidenceInterval {
        n,
        confidence_level,
        rates,
        std,
        half_width,
    })
}
