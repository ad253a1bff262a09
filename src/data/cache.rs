//! On-disk cache of pre-split 2D Ising samples.
//!
//! Simulating a full temperature sweep takes a while, so the classification
//! experiment keeps a reduced train/test split in `ising_L{L}_{n}.bin`
//! (bincode). The file records the `LatticeConfig` it was simulated with.
//! Loading is best-effort: any failure (missing file, decode error, wrong
//! shape, different simulation settings) regenerates the samples and rewrites
//! the cache.

use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::lattice::{LatticeSample, simulate};
use crate::data::split::train_test_split;
use crate::domain::LatticeConfig;
use crate::error::AppError;

/// A reduced train/test split of ordered + disordered configurations, plus the
/// critical band for out-of-distribution evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsingSamples {
    /// Simulation settings the samples were drawn with.
    pub lattice: LatticeConfig,
    pub x_train: Vec<Vec<i8>>,
    pub target_train: Vec<u8>,
    pub x_test: Vec<Vec<i8>>,
    pub target_test: Vec<u8>,
    pub x_critical: Vec<Vec<i8>>,
    pub target_critical: Vec<u8>,
}

impl IsingSamples {
    pub fn n_features(&self) -> usize {
        self.lattice.l * self.lattice.l
    }

    /// Check that every configuration has `L²` spins and every row has a label.
    pub fn validate(&self) -> Result<(), AppError> {
        let n = self.n_features();
        let sets = [
            ("train", &self.x_train, &self.target_train),
            ("test", &self.x_test, &self.target_test),
            ("critical", &self.x_critical, &self.target_critical),
        ];
        for (name, x, y) in sets {
            if x.len() != y.len() {
                return Err(AppError::data(format!(
                    "Cached {name} set has {} configurations but {} labels.",
                    x.len(),
                    y.len()
                )));
            }
            if x.iter().any(|row| row.len() != n) {
                return Err(AppError::data(format!(
                    "Cached {name} set has configurations that are not {n} spins long."
                )));
            }
        }
        if self.x_train.is_empty() || self.x_test.is_empty() {
            return Err(AppError::data("Cached train/test sets are empty."));
        }
        Ok(())
    }
}

/// Cache file location for a lattice side and sample count.
pub fn cache_path(dir: &Path, lattice_side: usize, n_samples: usize) -> PathBuf {
    dir.join(format!("ising_L{lattice_side}_{n_samples}.bin"))
}

/// Simulate, split 50/50, keep the first `n_samples` of each side and write the cache.
pub fn save_ising_smaller(
    dir: &Path,
    n_samples: usize,
    lattice: &LatticeConfig,
) -> Result<IsingSamples, AppError> {
    if n_samples == 0 {
        return Err(AppError::usage("Number of cached samples must be > 0."));
    }

    let phases = simulate(lattice)?;

    let (rows, labels): (Vec<Vec<i8>>, Vec<u8>) = phases
        .ordered
        .into_iter()
        .chain(phases.disordered)
        .map(|s| {
            let label = s.label();
            (s.spins, label)
        })
        .unzip();

    let mut rng = StdRng::seed_from_u64(lattice.seed);
    let split = train_test_split(rows, labels, 0.5, &mut rng)?;

    let available = split.train_rows.len().min(split.test_rows.len());
    if available < n_samples {
        warn!(
            requested = n_samples,
            available, "not enough simulated configurations; keeping all of them"
        );
    }

    let (x_critical, target_critical) = split_critical(phases.critical);
    let mut samples = IsingSamples {
        lattice: lattice.clone(),
        x_train: split.train_rows,
        target_train: split.train_labels,
        x_test: split.test_rows,
        target_test: split.test_labels,
        x_critical,
        target_critical,
    };
    samples.x_train.truncate(n_samples);
    samples.target_train.truncate(n_samples);
    samples.x_test.truncate(n_samples);
    samples.target_test.truncate(n_samples);
    samples.validate()?;

    write_cache(&cache_path(dir, lattice.l, n_samples), &samples)?;
    Ok(samples)
}

/// Load the cached split, regenerating it on any failure.
pub fn load_ising_smaller(
    dir: &Path,
    n_samples: usize,
    lattice: &LatticeConfig,
) -> Result<IsingSamples, AppError> {
    let path = cache_path(dir, lattice.l, n_samples);
    match read_cache(&path, lattice) {
        Ok(samples) => {
            info!(path = %path.display(), "loaded cached Ising samples");
            Ok(samples)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cache unavailable; regenerating samples");
            save_ising_smaller(dir, n_samples, lattice)
        }
    }
}

fn split_critical(samples: Vec<LatticeSample>) -> (Vec<Vec<i8>>, Vec<u8>) {
    samples
        .into_iter()
        .map(|s| {
            let label = s.label();
            (s.spins, label)
        })
        .unzip()
}

fn read_cache(path: &Path, lattice: &LatticeConfig) -> Result<IsingSamples, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::data(format!("Failed to open cache '{}': {e}", path.display())))?;
    let samples: IsingSamples = bincode::deserialize_from(BufReader::new(file))
        .map_err(|e| AppError::data(format!("Invalid cache '{}': {e}", path.display())))?;
    if samples.lattice != *lattice {
        return Err(AppError::data(format!(
            "Cache '{}' was simulated with {:?}, expected {lattice:?}.",
            path.display(),
            samples.lattice
        )));
    }
    samples.validate()?;
    Ok(samples)
}

fn write_cache(path: &Path, samples: &IsingSamples) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(|e| {
            AppError::runtime(format!("Failed to create cache dir '{}': {e}", parent.display()))
        })?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::runtime(format!("Failed to create cache '{}': {e}", path.display())))?;
    bincode::serialize_into(BufWriter::new(file), samples)
        .map_err(|e| AppError::runtime(format!("Failed to write cache '{}': {e}", path.display())))?;
    info!(path = %path.display(), "wrote Ising sample cache");
    Ok(())
}
