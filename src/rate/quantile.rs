// Inverse of the standard normal CDF
//
// Rational approximation with three regions (lower tail, central, upper
// tail). Relative error below 1.15e-9 over (0, 1).

use crate::config::validate_confidence;
use crate::error::{AnalysisError, Result};

const A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_69e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];

const B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];

const C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];

const D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];

const P_LOW: f64 = 0.02425;

fn tail(q: f64) -> f64 {
    (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
        / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
}

/// Quantile of the standard normal distribution, `p` strictly inside (0, 1)
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(AnalysisError::invalid(
            "p",
            format!("normal quantile needs p in (0, 1), got {}", p),
        ));
    }

    let x = if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    };

    Ok(x)
}

/// Two-sided z multiplier for a confidence level: `Φ⁻¹(1 − (1 − c) / 2)`
///
/// 0.95 gives ≈ 1.96.
pub fn two_sided_z(confidence_level: f64) -> Result<f64> {
    validate_confidence(confidence_level)?;
    normal_quantile(1.0 - (1.0 - confidence_level) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_quantiles() {
        assert!((normal_quantile(0.5).unwrap()).abs() < 1e-12);
        assert!((normal_quantile(0.975).unwrap() - 1.959_963_984_540_054).abs() < 1e-8);
        assert!((normal_quantile(0.995).unwrap() - 2.575_829_303_548_901).abs() < 1e-8);
        assert!((normal_quantile(0.01).unwrap() + 2.326_347_874_040_841).abs() < 1e-8);
    }

    #[test]
    fn test_symmetry() {
        for p in [0.001, 0.02, 0.1, 0.3] {
            let lo = normal_quantile(p).unwrap();
            let hi = normal_quantile(1.0 - p).unwrap();
            assert!((lo + hi).abs() < 1e-8, "p={} lo={} hi={}", p, lo, hi);
        }
    }

    #[test]
    fn test_two_sided_z() {
        assert!((two_sided_z(0.95).unwrap() - 1.96).abs() < 1e-3);
        assert!((two_sided_z(0.90).unwrap() - 1.644_853_626_951_472).abs() < 1e-8);
    }

    #[test]
    fn test_out_of_range() {
        assert!(normal_quantile(0.0).is_err());
        assert!(normal_quantile(1.0).is_err());
        assert!(two_sided_z(1.2).is_err());
        assert!(two_sided_z(f64::NAN).is_err());
    }
}
