use std::{
    collections::BTreeSet,
    hash::{DefaultHasher, Hash, Hasher},
};

use chrono::NaiveDate;
use rand::{
    Rng, SeedableRng,
    rngs::StdRng,
    seq::{IndexedRandom, SliceRandom},
};

use crate::{
    error::{EventStudyResult, InputError},
    series::ReturnSeries,
};

/// Draws random date sets from a fixed pool of candidate dates.
///
/// The pool is deduplicated and kept in axis order, so for a given RNG state the
/// draw does not depend on the order in which candidates were supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resampler {
    pool: Vec<NaiveDate>,
}

impl Resampler {
    /// Pool = every date of `source` that is not in `exclude`.
    pub fn from_series(source: &ReturnSeries, exclude: &BTreeSet<NaiveDate>) -> Self {
        Self::from_dates(source.dates().iter().copied(), exclude)
    }

    /// Pool = the distinct `candidates` that are not in `exclude`.
    pub fn from_dates(
        candidates: impl IntoIterator<Item = NaiveDate>,
        exclude: &BTreeSet<NaiveDate>,
    ) -> Self {
        let pool = candidates
            .into_iter()
            .filter(|d| !exclude.contains(d))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { pool }
    }

    #[inline]
    pub fn pool(&self) -> &[NaiveDate] {
        &self.pool
    }

    #[inline]
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Draws `n` dates uniformly from the pool.
    ///
    /// Without replacement the result holds `n` distinct dates in random order.
    ///
    /// # Errors
    /// - [`InputError::SampleTooLarge`] if `n` exceeds the pool without replacement.
    /// - [`InputError::EmptyPool`] if `n > 0` and the pool is empty with replacement.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        n: usize,
        replacement: bool,
        rng: &mut R,
    ) -> EventStudyResult<Vec<NaiveDate>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        if replacement {
            if self.pool.is_empty() {
                return Err(InputError::EmptyPool.into());
            }
            return Ok((0..n)
                .filter_map(|_| self.pool.choose(rng).copied())
                .collect());
        }

        if n > self.pool.len() {
            return Err(InputError::SampleTooLarge {
                requested: n,
                pool: self.pool.len(),
            }
            .into());
        }

        let mut drawn = self.pool.choose_multiple(rng, n).copied().collect::<Vec<_>>();
        drawn.shuffle(rng);
        Ok(drawn)
    }
}

/// Derives an independent, reproducible RNG for one trial of a batch.
///
/// Mixing the batch seed with the trial index makes every trial's draw independent
/// of how trials are scheduled across threads.
pub fn trial_rng(seed: u64, trial: usize) -> StdRng {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    trial.hash(&mut hasher);
    StdRng::seed_from_u64(hasher.finish())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Days;

    use super::*;
    use crate::error::EventStudyError;

    fn dates(n: u64) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2022, 6, 1).expect("valid date");
        (0..n).map(|i| start + Days::new(i)).collect()
    }

    #[test]
    fn without_replacement_draws_distinct_pool_members() {
        let pool = dates(30);
        let sampler = Resampler::from_dates(pool.iter().copied(), &BTreeSet::new());
        let mut rng = StdRng::seed_from_u64(7);

        for n in [0, 1, 10, 30] {
            let drawn = sampler.draw(n, false, &mut rng).unwrap();
            let distinct = drawn.iter().collect::<HashSet<_>>();
            assert_eq!(drawn.len(), n);
            assert_eq!(distinct.len(), n);
            assert!(drawn.iter().all(|d| pool.contains(d)));
        }
    }

    #[test]
    fn oversized_sample_without_replacement_fails() {
        let sampler = Resampler::from_dates(dates(5), &BTreeSet::new());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            sampler.draw(6, false, &mut rng),
            Err(EventStudyError::Input(InputError::SampleTooLarge { requested: 6, pool: 5 }))
        ));
    }

    #[test]
    fn with_replacement_may_exceed_pool() {
        let pool = dates(3);
        let sampler = Resampler::from_dates(pool.iter().copied(), &BTreeSet::new());
        let mut rng = StdRng::seed_from_u64(3);
        let drawn = sampler.draw(50, true, &mut rng).unwrap();
        assert_eq!(drawn.len(), 50);
        assert!(drawn.iter().all(|d| pool.contains(d)));

        let empty = Resampler::from_dates(Vec::new(), &BTreeSet::new());
        assert!(matches!(
            empty.draw(1, true, &mut rng),
            Err(EventStudyError::Input(InputError::EmptyPool))
        ));
    }

    #[test]
    fn exclusions_and_duplicates_are_removed_from_pool() {
        let all = dates(10);
        let exclude = all[..4].iter().copied().collect::<BTreeSet<_>>();
        let mut candidates = all.clone();
        candidates.extend_from_slice(&all[6..]);

        let sampler = Resampler::from_dates(candidates, &exclude);
        assert_eq!(sampler.pool(), &all[4..]);

        let mut rng = StdRng::seed_from_u64(11);
        let drawn = sampler.draw(6, false, &mut rng).unwrap();
        assert!(drawn.iter().all(|d| !exclude.contains(d)));
    }

    #[test]
    fn same_seed_same_draw() {
        let sampler = Resampler::from_dates(dates(100), &BTreeSet::new());
        let a = sampler.draw(20, false, &mut trial_rng(42, 3)).unwrap();
        let b = sampler.draw(20, false, &mut trial_rng(42, 3)).unwrap();
        let c = sampler.draw(20, false, &mut trial_rng(42, 4)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
