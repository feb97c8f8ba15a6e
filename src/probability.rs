//! Probability models of the injection design space
//!
//! Pure numeric routines, independent of any particular run set.
//!
//! # Adjusted error probability
//!
//! Campaigns sample the fault space (every `(cycle, bit)` pair) instead of
//! enumerating it. Comparing raw failure rates between programs of different
//! runtime is misleading; rescaling by the fault-space size gives the
//! expected number of failures per full enumeration.
//!
//! # Multi-injection collisions
//!
//! With `M` runs drawn uniformly from a space of `S` points, each point is hit
//! `X ~ Binomial(M, 1/S)` times. Points hit more than once waste runs; the
//! expected and variance of that count drive campaign sizing.
//!
//! The binomial pmf is evaluated in log space with an incrementally updated
//! log-binomial coefficient, so campaigns with millions of runs do not
//! underflow.
//!
//! # Scientific Foundation
//!
//! - Schirmeier, H., Borchert, C., & Spinczyk, O. (2015). Avoiding pitfalls in
//!   fault-injection based comparison of program susceptibility to soft
//!   errors. DSN 2015.

use crate::classifier::Classification;
use crate::error::{AnalysisError, Result};
use crate::outcome::PerClass;
use serde::Serialize;

/// Per-class error rates rescaled to the size of the injection space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustedErrorProbability {
    pub rates: PerClass<f64>,
    /// Size of the injection space (n_bits × n_cycles)
    pub w_size: f64,
    /// Number of runs the rates were normalized by
    pub n_runs: usize,
}

/// Expected errors per full enumeration of the fault space
///
/// `rate[class] = W × count(class) / N`
///
/// # Example
/// ```
/// use seuscope::classifier::classify;
/// use seuscope::probability::adjusted_probability;
/// use seuscope::record::{GoldenRecord, RunRecord};
///
/// let golden = GoldenRecord::new().with_field("crc", 1);
/// let runs: Vec<RunRecord> = (0..10)
///     .map(|i| {
///         let r = RunRecord::new(format!("r{}", i));
///         match i {
///             0..=2 => r.with_field("crc", 1),
///             3..=6 => r.with_field("crc", 2),
///             _ => r.with_null("crc"),
///         }
///     })
///     .collect();
/// let labels = classify(&runs, &golden, &["crc"], &["crc"]);
///
/// let adjusted = adjusted_probability(&labels, 1000.0, 10)?;
/// assert!((adjusted.rates.silent - 300.0).abs() < 1e-9);
/// assert!((adjusted.rates.corruption - 400.0).abs() < 1e-9);
/// assert!((adjusted.rates.critical - 300.0).abs() < 1e-9);
/// # Ok::<(), seuscope::error::AnalysisError>(())
/// ```
pub fn adjusted_probability(
    classification: &Classification,
    w_size: f64,
    n_runs: usize,
) -> Result<AdjustedErrorProbability> {
    if n_runs == 0 {
        return Err(AnalysisError::insufficient(1, 0));
    }
    if !(w_size.is_finite() && w_size >= 0.0) {
        return Err(AnalysisError::invalid(
            "w_size",
            format!("must be a non-negative finite number, got {}", w_size),
        ));
    }

    let counts = classification.counts();
    let rates = counts.map(|_, &c| w_size * (c as f64 / n_runs as f64));

    Ok(AdjustedErrorProbability {
        rates,
        w_size,
        n_runs,
    })
}

/// Iterator over `(k, P(X = k))` of a binomial distribution, computed in log space
#[derive(Debug, Clone)]
pub struct BinomialPmf {
    n: u64,
    k: u64,
    ln_p: f64,
    ln_q: f64,
    ln_choose: f64,
    certain: bool,
    done: bool,
}

impl BinomialPmf {
    pub fn new(n: u64, p: f64) -> Self {
        Self {
            n,
            k: 0,
            ln_p: p.ln(),
            ln_q: (-p).ln_1p(),
            ln_choose: 0.0,
            certain: p >= 1.0,
            done: false,
        }
    }

    fn mean(&self) -> f64 {
        self.n as f64 * self.ln_p.exp()
    }
}

impl Iterator for BinomialPmf {
    type Item = (u64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let k = self.k;

        let pmf = if self.certain {
            if k == self.n {
                1.0
            } else {
                0.0
            }
        } else {
            let ln_pmf = self.ln_choose
                + k as f64 * self.ln_p
                + (self.n - k) as f64 * self.ln_q;
            ln_pmf.exp()
        };

        // beyond the mode the pmf only decreases; once it underflows the
        // remaining terms contribute nothing
        if k == self.n || (!self.certain && pmf == 0.0 && k as f64 > self.mean()) {
            self.done = true;
        } else {
            self.ln_choose += ((self.n - k) as f64).ln() - ((k + 1) as f64).ln();
            self.k += 1;
        }

        Some((k, pmf))
    }
}

fn injection_space(n_cycles: u64, n_target_bits: u64) -> Result<f64> {
    let size = n_cycles as f64 * n_target_bits as f64;
    if size < 1.0 {
        return Err(AnalysisError::invalid(
            "injection_space",
            format!(
                "n_cycles × n_target_bits must be >= 1, got {} × {}",
                n_cycles, n_target_bits
            ),
        ));
    }
    Ok(size)
}

/// Expected number of runs landing on an injection point hit at least twice
///
/// `S × Σ_{k≥2} k · P(X = k)` with `X ~ Binomial(n_runs, 1/S)` and
/// `S = n_cycles × n_target_bits`. Equals the closed form
/// `n_runs · (1 − (1 − ε)^(n_runs − 1))`.
pub fn expected_collisions(n_cycles: u64, n_target_bits: u64, n_runs: u64) -> Result<f64> {
    let space = injection_space(n_cycles, n_target_bits)?;

    let sum: f64 = BinomialPmf::new(n_runs, 1.0 / space)
        .filter(|&(k, _)| k >= 2)
        .map(|(k, pmf)| k as f64 * pmf)
        .sum();

    Ok(space * sum)
}

/// Variance companion of [`expected_collisions`]
///
/// `S × Σ_{j=1..n_runs} (j − E)² · P(X = j)` where `E` is the value returned
/// by [`expected_collisions`] for the same arguments.
pub fn variance_collisions(n_cycles: u64, n_target_bits: u64, n_runs: u64) -> Result<f64> {
    let space = injection_space(n_cycles, n_target_bits)?;
    let expected = expected_collisions(n_cycles, n_target_bits, n_runs)?;

    let sum: f64 = BinomialPmf::new(n_runs, 1.0 / space)
        .filter(|&(j, _)| j >= 1)
        .map(|(j, pmf)| (j as f64 - expected).powi(2) * pmf)
        .sum();

    Ok(space * sum)
}

/// Closed-form expected re-samples sampled over a range of run counts
///
/// Returns `points` evenly spaced `(m, m · (1 − (1 − ε)^(m − 1)))` pairs for
/// `m` in `[runs.0, runs.1]`.
pub fn expected_multi_injection_curve(
    n_cycles: u64,
    n_target_bits: u64,
    runs: (f64, f64),
    points: usize,
) -> Result<Vec<(f64, f64)>> {
    let space = injection_space(n_cycles, n_target_bits)?;
    let (lo, hi) = runs;

    if points == 0 {
        return Err(AnalysisError::invalid("points", "must be >= 1"));
    }
    if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
        return Err(AnalysisError::invalid(
            "runs",
            format!("expected a finite range lo <= hi, got ({}, {})", lo, hi),
        ));
    }

    let ln_q = (-1.0 / space).ln_1p();
    let step = if points > 1 {
        (hi - lo) / (points - 1) as f64
    } else {
        0.0
    };

    Ok((0..points)
        .map(|i| {
            let m = lo + step * i as f64;
            (m, m * (1.0 - ((m - 1.0) * ln_q).exp()))
        })
        .collect())
}
