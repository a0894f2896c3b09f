use crate::table::Table;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::num::NonZeroUsize;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AugmentOptions {
    noise_std_dev: f64,
    removal_fraction: f64,
    iterations: NonZeroUsize,
    seed: Option<u64>,
}

impl AugmentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard deviation of the Gaussian noise added to every feature cell.
    pub fn noise_std_dev(mut self, std_dev: f64) -> Self {
        self.noise_std_dev = std_dev;
        self
    }

    /// Fraction of rows deleted from each variant, rounded down to a row count.
    pub fn removal_fraction(mut self, fraction: f64) -> Self {
        self.removal_fraction = fraction;
        self
    }

    pub fn iterations(mut self, iterations: NonZeroUsize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for AugmentOptions {
    fn default() -> Self {
        Self {
            noise_std_dev: 0.05,
            removal_fraction: 0.02,
            iterations: NonZeroUsize::new(5000).expect("never fails"),
            seed: None,
        }
    }
}

/// A finite lazy sequence of augmented copies of one source table.
///
/// Each iteration derives its own `StdRng` from the master seed, so variant
/// `k` has the same content for a given seed no matter in which order the
/// variants are generated.
#[derive(Debug)]
pub struct Augmentor<'a> {
    table: &'a Table,
    noise: Normal<f64>,
    rows_to_remove: usize,
    master: StdRng,
    remaining: usize,
}

impl<'a> Augmentor<'a> {
    pub fn new(table: &'a Table, options: AugmentOptions) -> Result<Self, AugmentError> {
        if !(options.noise_std_dev.is_finite() && options.noise_std_dev > 0.0) {
            return Err(AugmentError::NoiseStdDev(options.noise_std_dev));
        }
        if !(0.0..1.0).contains(&options.removal_fraction) {
            return Err(AugmentError::RemovalFraction(options.removal_fraction));
        }

        let seed_u64 = options.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut seed = [0u8; 32];
        (&mut seed[0..8]).copy_from_slice(&seed_u64.to_be_bytes()[..]);

        Ok(Self {
            table,
            noise: Normal::new(0.0, options.noise_std_dev).expect("never fails"),
            rows_to_remove: (table.rows_len() as f64 * options.removal_fraction) as usize,
            master: StdRng::from_seed(seed),
            remaining: options.iterations.get(),
        })
    }

    /// Generates the remaining variants in parallel. Output is identical to
    /// draining the iterator sequentially with the same seed.
    pub fn collect_parallel(mut self) -> Vec<Table> {
        let rngs = (0..self.remaining)
            .map(|_| self.next_rng())
            .collect::<Vec<_>>();
        rngs.into_par_iter()
            .map(|mut rng| self.variant(&mut rng))
            .collect()
    }

    fn next_rng(&mut self) -> StdRng {
        let mut seed = [0u8; 32];
        self.master.fill(&mut seed);
        StdRng::from_seed(seed)
    }

    fn variant<R: Rng + ?Sized>(&self, rng: &mut R) -> Table {
        let mut features = (0..self.table.features_len())
            .map(|i| self.table.feature(i).to_vec())
            .collect::<Vec<_>>();
        let mut labels = self.table.labels().to_vec();

        for column in &mut features {
            for value in column.iter_mut() {
                *value += self.noise.sample(rng);
            }
        }

        if self.rows_to_remove > 0 {
            let mut keep = vec![true; labels.len()];
            for i in rand::seq::index::sample(rng, labels.len(), self.rows_to_remove) {
                keep[i] = false;
            }
            for column in &mut features {
                let mut kept = keep.iter();
                column.retain(|_| *kept.next().expect("never fails"));
            }
            let mut kept = keep.iter();
            labels.retain(|_| *kept.next().expect("never fails"));
        }

        Table::new(features, labels).expect("never fails")
    }
}

impl Iterator for Augmentor<'_> {
    type Item = Table;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let mut rng = self.next_rng();
        Some(self.variant(&mut rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Augmentor<'_> {}

#[derive(Debug, Error, Clone)]
pub enum AugmentError {
    #[error("noise standard deviation must be a positive finite number, got {0}")]
    NoiseStdDev(f64),

    #[error("removal fraction must be within [0, 1), got {0}")]
    RemovalFraction(f64),
}
