//! Metropolis Monte Carlo for the 2D Ising model.
//!
//! Square `L × L` lattice, periodic boundaries, coupling `J = 1`, no external
//! field. Configurations are sampled at `T = 0.25, 0.50, …, 4.00` and labelled
//! by phase: ordered (1) below the Onsager critical temperature, disordered (0)
//! above it.
//!
//! Temperatures are grouped into three bands:
//!
//! - ordered: `T ≤ 1.75`
//! - critical: `2.00 ≤ T ≤ 2.50` (kept apart; hard to classify)
//! - disordered: `T ≥ 2.75`

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::LatticeConfig;
use crate::error::AppError;

/// `T_c = 2 / ln(1 + √2)`.
pub const CRITICAL_TEMPERATURE: f64 = 2.269_185_314_213_022;

const TEMPERATURE_STEP: f64 = 0.25;
const TEMPERATURE_COUNT: usize = 16;

/// Temperature band a configuration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ordered,
    Critical,
    Disordered,
}

impl Phase {
    pub fn of(temperature: f64) -> Self {
        if temperature < 1.75 + 1e-9 {
            Phase::Ordered
        } else if temperature < 2.5 + 1e-9 {
            Phase::Critical
        } else {
            Phase::Disordered
        }
    }
}

/// Binary phase label: 1 for ordered (`T < T_c`), 0 otherwise.
pub fn phase_label(temperature: f64) -> u8 {
    u8::from(temperature < CRITICAL_TEMPERATURE)
}

/// The sampled temperature grid `0.25, 0.50, …, 4.00`.
pub fn temperatures() -> Vec<f64> {
    (1..=TEMPERATURE_COUNT)
        .map(|k| TEMPERATURE_STEP * k as f64)
        .collect()
}

/// Metropolis acceptance probabilities for the two positive energy changes.
#[derive(Debug, Clone, Copy)]
struct Acceptance {
    de4: f64,
    de8: f64,
}

impl Acceptance {
    fn at(temperature: f64) -> Self {
        let beta = 1.0 / temperature;
        Self {
            de4: (-4.0 * beta).exp(),
            de8: (-8.0 * beta).exp(),
        }
    }

    fn probability(&self, delta_e: i32) -> f64 {
        match delta_e {
            d if d <= 0 => 1.0,
            4 => self.de4,
            _ => self.de8,
        }
    }
}

/// A periodic square lattice of ±1 spins, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinLattice {
    l: usize,
    spins: Vec<i8>,
}

impl SpinLattice {
    /// Every spin set to `sign` (which must be ±1).
    pub fn uniform(l: usize, sign: i8) -> Self {
        Self {
            l,
            spins: vec![sign.signum(); l * l],
        }
    }

    pub fn random<R: Rng>(l: usize, rng: &mut R) -> Self {
        Self {
            l,
            spins: (0..l * l)
                .map(|_| if rng.gen_bool(0.5) { 1 } else { -1 })
                .collect(),
        }
    }

    pub fn side(&self) -> usize {
        self.l
    }

    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    fn at(&self, row: usize, col: usize) -> i32 {
        i32::from(self.spins[row * self.l + col])
    }

    fn neighbour_sum(&self, row: usize, col: usize) -> i32 {
        let l = self.l;
        self.at((row + l - 1) % l, col)
            + self.at((row + 1) % l, col)
            + self.at(row, (col + l - 1) % l)
            + self.at(row, (col + 1) % l)
    }

    /// One Metropolis sweep: `L²` single-spin-flip attempts at random sites.
    ///
    /// Returns the number of accepted flips.
    fn sweep<R: Rng>(&mut self, acceptance: &Acceptance, rng: &mut R) -> usize {
        let n = self.spins.len();
        let mut accepted = 0;
        for _ in 0..n {
            let site = rng.gen_range(0..n);
            let (row, col) = (site / self.l, site % self.l);
            let delta_e = 2 * i32::from(self.spins[site]) * self.neighbour_sum(row, col);
            let p = acceptance.probability(delta_e);
            if p >= 1.0 || rng.gen_bool(p) {
                self.spins[site] = -self.spins[site];
                accepted += 1;
            }
        }
        accepted
    }

    /// Total energy `−J Σ_<ij> s_i s_j`, each bond counted once.
    pub fn energy(&self) -> f64 {
        let mut e = 0;
        for row in 0..self.l {
            for col in 0..self.l {
                let s = self.at(row, col);
                e -= s * (self.at(row, (col + 1) % self.l) + self.at((row + 1) % self.l, col));
            }
        }
        f64::from(e)
    }

    /// Mean spin in `[−1, 1]`.
    pub fn magnetization(&self) -> f64 {
        let total: i64 = self.spins.iter().map(|&s| i64::from(s)).sum();
        total as f64 / self.spins.len() as f64
    }
}

/// One recorded configuration.
#[derive(Debug, Clone)]
pub struct LatticeSample {
    pub temperature: f64,
    pub spins: Vec<i8>,
}

impl LatticeSample {
    pub fn label(&self) -> u8 {
        phase_label(self.temperature)
    }
}

/// Sampled configurations grouped by phase band.
#[derive(Debug, Clone, Default)]
pub struct PhaseSamples {
    pub ordered: Vec<LatticeSample>,
    pub critical: Vec<LatticeSample>,
    pub disordered: Vec<LatticeSample>,
}

/// Run one Markov chain at `temperature` and record its configurations.
pub fn sample_temperature(
    config: &LatticeConfig,
    temperature: f64,
    seed: u64,
) -> Vec<LatticeSample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let acceptance = Acceptance::at(temperature);

    // Start magnetized; a random start at low T freezes into long-lived domains.
    let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
    let mut lattice = SpinLattice::uniform(config.l, sign);

    for _ in 0..config.thermalization_sweeps {
        lattice.sweep(&acceptance, &mut rng);
    }

    let mut out = Vec::with_capacity(config.samples_per_temperature);
    let mut accepted = 0usize;
    for _ in 0..config.samples_per_temperature {
        for _ in 0..config.decorrelation_sweeps.max(1) {
            accepted += lattice.sweep(&acceptance, &mut rng);
        }
        out.push(LatticeSample {
            temperature,
            spins: lattice.spins().to_vec(),
        });
    }

    let attempts = config.samples_per_temperature
        * config.decorrelation_sweeps.max(1)
        * config.l
        * config.l;
    debug!(
        temperature,
        magnetization = lattice.magnetization(),
        acceptance = accepted as f64 / attempts.max(1) as f64,
        "chain finished"
    );
    out
}

/// Sample every temperature of the grid (one chain per temperature, in parallel).
pub fn simulate(config: &LatticeConfig) -> Result<PhaseSamples, AppError> {
    if config.l < 2 {
        return Err(AppError::usage(format!("Lattice side must be >= 2 (got {}).", config.l)));
    }
    if config.samples_per_temperature == 0 {
        return Err(AppError::usage("Samples per temperature must be > 0."));
    }

    info!(
        l = config.l,
        samples_per_temperature = config.samples_per_temperature,
        "simulating 2D Ising configurations"
    );

    let chains: Vec<Vec<LatticeSample>> = temperatures()
        .par_iter()
        .enumerate()
        .map(|(idx, &t)| sample_temperature(config, t, config.seed.wrapping_add(idx as u64)))
        .collect();

    let mut out = PhaseSamples::default();
    for chain in chains {
        for sample in chain {
            match Phase::of(sample.temperature) {
                Phase::Ordered => out.ordered.push(sample),
                Phase::Critical => out.critical.push(sample),
                Phase::Disordered => out.disordered.push(sample),
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> LatticeConfig {
        LatticeConfig {
            l: 8,
            samples_per_temperature: 5,
            thermalization_sweeps: 200,
            decorrelation_sweeps: 5,
            seed: 3,
        }
    }

    #[test]
    fn temperature_grid_and_bands() {
        let temps = temperatures();
        assert_eq!(temps.len(), 16);
        assert_eq!(temps[0], 0.25);
        assert_eq!(temps[15], 4.0);

        let ordered = temps.iter().filter(|&&t| Phase::of(t) == Phase::Ordered).count();
        let critical = temps.iter().filter(|&&t| Phase::of(t) == Phase::Critical).count();
        let disordered = temps.iter().filter(|&&t| Phase::of(t) == Phase::Disordered).count();
        assert_eq!((ordered, critical, disordered), (7, 3, 6));
    }

    #[test]
    fn labels_follow_critical_temperature() {
        assert_eq!(phase_label(2.25), 1);
        assert_eq!(phase_label(2.5), 0);
    }

    #[test]
    fn uniform_lattice_energy_and_magnetization() {
        let lattice = SpinLattice::uniform(4, -1);
        assert_eq!(lattice.energy(), -32.0);
        assert_eq!(lattice.magnetization(), -1.0);
    }

    #[test]
    fn low_temperature_stays_ordered() {
        let cfg = small_config();
        let samples = sample_temperature(&cfg, 0.5, 1);
        for s in &samples {
            let m: f64 = s.spins.iter().map(|&x| f64::from(x)).sum::<f64>() / 64.0;
            assert!(m.abs() > 0.9, "magnetization {m}");
        }
    }

    #[test]
    fn high_temperature_disorders() {
        let cfg = small_config();
        let samples = sample_temperature(&cfg, 4.0, 1);
        let mean_abs: f64 = samples
            .iter()
            .map(|s| (s.spins.iter().map(|&x| f64::from(x)).sum::<f64>() / 64.0).abs())
            .sum::<f64>()
            / samples.len() as f64;
        assert!(mean_abs < 0.6, "mean |m| = {mean_abs}");
    }

    #[test]
    fn simulate_is_deterministic_and_grouped() {
        let cfg = LatticeConfig {
            thermalization_sweeps: 5,
            ..small_config()
        };
        let a = simulate(&cfg).unwrap();
        let b = simulate(&cfg).unwrap();
        assert_eq!(a.ordered.len(), 7 * 5);
        assert_eq!(a.critical.len(), 3 * 5);
        assert_eq!(a.disordered.len(), 6 * 5);
        assert_eq!(a.ordered[0].spins, b.ordered[0].spins);
        assert!(a.ordered.iter().all(|s| s.label() == 1));
        assert!(a.disordered.iter().all(|s| s.label() == 0));
    }
}
