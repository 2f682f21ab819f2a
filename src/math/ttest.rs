//! Two-sided Student t-tests on summary moments.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::{
    error::{EventStudyResult, SystemError},
    math::moments::Moments,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTest {
    pub t_stat: f64,
    pub p_value: f64,
    pub dof: f64,
}

/// One-sample t-test of `sample` against `mu`.
///
/// Returns `Ok(None)` when the statistic is undefined: fewer than two
/// observations, or zero sample variance.
pub fn one_sample(sample: &Moments, mu: f64) -> EventStudyResult<Option<TTest>> {
    let (Some(mean), Some(var)) = (sample.mean(), sample.variance()) else {
        return Ok(None);
    };

    let se = (var / sample.count() as f64).sqrt();
    if se <= 0.0 || !se.is_finite() {
        return Ok(None);
    }

    let dof = (sample.count() - 1) as f64;
    let t_stat = (mean - mu) / se;
    Ok(Some(TTest {
        t_stat,
        p_value: two_sided_p(t_stat, dof)?,
        dof,
    }))
}

/// Independent two-sample t-test assuming equal variances (pooled variance).
///
/// The statistic is `(mean(a) - mean(b)) / (s_p * sqrt(1/n_a + 1/n_b))` with
/// `n_a + n_b - 2` degrees of freedom. Returns `Ok(None)` if either sample is empty,
/// the degrees of freedom are below one, or the pooled variance is zero.
pub fn pooled_two_sample(a: &Moments, b: &Moments) -> EventStudyResult<Option<TTest>> {
    let (Some(mean_a), Some(mean_b)) = (a.mean(), b.mean()) else {
        return Ok(None);
    };

    let (na, nb) = (a.count() as f64, b.count() as f64);
    let dof = na + nb - 2.0;
    if dof < 1.0 {
        return Ok(None);
    }

    // A single-observation sample contributes no within-sample variation.
    let ss_a = a.variance().map_or(0.0, |v| v * (na - 1.0));
    let ss_b = b.variance().map_or(0.0, |v| v * (nb - 1.0));
    let pooled = (ss_a + ss_b) / dof;

    let se = (pooled * (1.0 / na + 1.0 / nb)).sqrt();
    if se <= 0.0 || !se.is_finite() {
        return Ok(None);
    }

    let t_stat = (mean_a - mean_b) / se;
    Ok(Some(TTest {
        t_stat,
        p_value: two_sided_p(t_stat, dof)?,
        dof,
    }))
}

fn two_sided_p(t_stat: f64, dof: f64) -> EventStudyResult<f64> {
    let dist =
        StudentsT::new(0.0, 1.0, dof).map_err(|e| SystemError::Distribution(e.to_string()))?;
    Ok((2.0 * dist.sf(t_stat.abs())).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moments(xs: &[f64]) -> Moments {
        xs.iter().copied().collect()
    }

    #[test]
    fn one_sample_reference_values() {
        // mean 3, sd sqrt(2.5), n 5 => t = 3 / sqrt(0.5) = 4.2426...
        let m = moments(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let t = one_sample(&m, 0.0).unwrap().unwrap();

        assert!((t.t_stat - 4.242_640_687).abs() < 1e-8);
        assert_eq!(t.dof, 4.0);
        // scipy.stats.ttest_1samp([1, 2, 3, 4, 5], 0).pvalue
        assert!((t.p_value - 0.013_236_1).abs() < 1e-5);
    }

    #[test]
    fn one_sample_against_own_mean_is_zero() {
        let m = moments(&[0.5, -0.2, 0.1, 0.4]);
        let t = one_sample(&m, m.mean().unwrap()).unwrap().unwrap();
        assert!(t.t_stat.abs() < 1e-12);
        assert!((t.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn one_sample_undefined_cases() {
        assert!(one_sample(&moments(&[]), 0.0).unwrap().is_none());
        assert!(one_sample(&moments(&[1.0]), 0.0).unwrap().is_none());
        assert!(one_sample(&moments(&[2.0, 2.0, 2.0]), 0.0).unwrap().is_none());
    }

    #[test]
    fn pooled_two_sample_reference_values() {
        let a = moments(&[1.0, 2.0, 3.0, 4.0]);
        let b = moments(&[3.0, 4.0, 5.0, 6.0, 7.0]);
        let t = pooled_two_sample(&a, &b).unwrap().unwrap();

        // pooled var = (5 + 10) / 7, se = sqrt(15/7 * (1/4 + 1/5))
        let expected = (2.5 - 5.0) / (15.0_f64 / 7.0 * 0.45).sqrt();
        assert!((t.t_stat - expected).abs() < 1e-12);
        assert_eq!(t.dof, 7.0);
        assert!(t.p_value > 0.0 && t.p_value < 0.05);
    }

    #[test]
    fn pooled_two_sample_is_antisymmetric() {
        let a = moments(&[0.1, 0.3, -0.2]);
        let b = moments(&[0.0, 0.05, 0.4, -0.1]);
        let ab = pooled_two_sample(&a, &b).unwrap().unwrap();
        let ba = pooled_two_sample(&b, &a).unwrap().unwrap();
        assert!((ab.t_stat + ba.t_stat).abs() < 1e-12);
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
    }

    #[test]
    fn pooled_two_sample_undefined_cases() {
        let empty = moments(&[]);
        let one = moments(&[1.0]);
        let flat = moments(&[1.0, 1.0]);
        assert!(pooled_two_sample(&empty, &flat).unwrap().is_none());
        assert!(pooled_two_sample(&one, &one).unwrap().is_none());
        assert!(pooled_two_sample(&flat, &flat).unwrap().is_none());
        assert!(pooled_two_sample(&one, &moments(&[0.0, 2.0])).unwrap().is_some());
    }
}
