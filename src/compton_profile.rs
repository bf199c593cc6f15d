// Tabulated Compton profiles
//
// A Compton profile J(pz) is the probability density of the bound
// electron momentum projection pz along the scattering vector, in
// atomic me*c units. Tables come in two layouts: full profiles spanning
// [-pmax, pmax] (native libraries) and half profiles spanning [0, pmax]
// that rely on the symmetry J(-pz) = J(pz) (ACE libraries, sometimes
// stored pre-doubled so the half integrates to one).

use crate::interpolation::InterpolationPolicy;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the stored table maps onto the physical momentum domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComptonProfilePolicy {
    /// Table spans [-pmax, pmax]
    Full,
    /// Table spans [0, pmax]; the stored half integrates to 1/2
    Half,
    /// Table spans [0, pmax]; the stored half was doubled to integrate to 1
    DoubledHalf,
}

/// A tabulated Compton profile for one subshell.
#[derive(Debug, Clone)]
pub struct ComptonProfile {
    momentum_grid: Vec<f64>,
    profile: Vec<f64>,
    policy: ComptonProfilePolicy,
    interp: InterpolationPolicy,
    /// Unnormalized trapezoid CDF over the stored table
    cdf: Vec<f64>,
}

impl ComptonProfile {
    /// Build a profile from a stored table.
    ///
    /// Panics on invalid data: fewer than two points, a non-ascending
    /// momentum grid, negative profile values, or a half-layout table
    /// that does not start at zero momentum.
    pub fn new(
        momentum_grid: Vec<f64>,
        profile: Vec<f64>,
        policy: ComptonProfilePolicy,
        interp: InterpolationPolicy,
    ) -> Self {
        if momentum_grid.len() < 2 {
            panic!(
                "Compton profile momentum grid must have at least 2 points (got {})",
                momentum_grid.len()
            );
        }
        if momentum_grid.len() != profile.len() {
            panic!(
                "Compton profile table size mismatch: {} momentum points, {} profile values",
                momentum_grid.len(),
                profile.len()
            );
        }
        for w in momentum_grid.windows(2) {
            if w[1] <= w[0] {
                panic!("Compton profile momentum grid must be strictly ascending");
            }
        }
        for &j in &profile {
            if !j.is_finite() || j < 0.0 {
                panic!("Compton profile values must be finite and non-negative (got {})", j);
            }
        }
        match policy {
            ComptonProfilePolicy::Half | ComptonProfilePolicy::DoubledHalf => {
                if momentum_grid[0] != 0.0 {
                    panic!(
                        "half Compton profile must start at pz = 0 (starts at {})",
                        momentum_grid[0]
                    );
                }
            }
            ComptonProfilePolicy::Full => {
                if momentum_grid[0] >= 0.0 {
                    panic!(
                        "full Compton profile must start at negative momentum (starts at {})",
                        momentum_grid[0]
                    );
                }
            }
        }

        let cdf = Self::build_cdf(&momentum_grid, &profile);

        ComptonProfile {
            momentum_grid,
            profile,
            policy,
            interp,
            cdf,
        }
    }

    fn build_cdf(grid: &[f64], profile: &[f64]) -> Vec<f64> {
        let mut cdf = Vec::with_capacity(grid.len());
        cdf.push(0.0);
        for i in 1..grid.len() {
            let area = 0.5 * (profile[i] + profile[i - 1]) * (grid[i] - grid[i - 1]);
            let prev = cdf[i - 1];
            cdf.push(prev + area);
        }
        cdf
    }

    pub fn policy(&self) -> ComptonProfilePolicy {
        self.policy
    }

    /// Largest physical momentum covered by the table (me*c units)
    pub fn upper_bound_of_momentum(&self) -> f64 {
        *self.momentum_grid.last().unwrap()
    }

    /// Smallest physical momentum covered by the table (me*c units)
    pub fn lower_bound_of_momentum(&self) -> f64 {
        match self.policy {
            ComptonProfilePolicy::Full => self.momentum_grid[0],
            // Half layouts cover the negative domain by symmetry
            ComptonProfilePolicy::Half | ComptonProfilePolicy::DoubledHalf => {
                -self.upper_bound_of_momentum()
            }
        }
    }

    /// Evaluate J(pz) in the physical (full) momentum domain.
    ///
    /// Outside the covered domain the profile is zero.
    pub fn evaluate(&self, pz: f64) -> f64 {
        let (stored_pz, scale) = match self.policy {
            ComptonProfilePolicy::Full => (pz, 1.0),
            ComptonProfilePolicy::Half => (pz.abs(), 1.0),
            // Stored values were doubled; halve to recover J
            ComptonProfilePolicy::DoubledHalf => (pz.abs(), 0.5),
        };

        scale * self.evaluate_stored(stored_pz)
    }

    /// Evaluate J(pz), treating the profile as zero above a momentum limit
    pub fn evaluate_with_possible_limit(&self, pz: f64, pz_limit: f64) -> f64 {
        if pz > pz_limit {
            0.0
        } else {
            self.evaluate(pz)
        }
    }

    fn evaluate_stored(&self, pz: f64) -> f64 {
        let grid = &self.momentum_grid;
        if pz < grid[0] || pz > *grid.last().unwrap() {
            return 0.0;
        }
        let bin = match grid.binary_search_by(|v| v.partial_cmp(&pz).unwrap()) {
            Ok(i) => i.min(grid.len() - 2),
            Err(i) => i - 1,
        };
        self.interp.interpolate(
            grid[bin],
            grid[bin + 1],
            pz,
            self.profile[bin],
            self.profile[bin + 1],
        )
    }

    /// Fraction of the stored table integral below a physical momentum.
    ///
    /// For half layouts the symmetry is applied, so the result is the
    /// CDF over the full physical domain.
    pub fn cdf_at(&self, pz: f64) -> f64 {
        let total = *self.cdf.last().unwrap();
        if total <= 0.0 {
            return 0.0;
        }
        match self.policy {
            ComptonProfilePolicy::Full => self.stored_cdf_at(pz) / total,
            ComptonProfilePolicy::Half | ComptonProfilePolicy::DoubledHalf => {
                // Half the mass sits below zero
                if pz >= 0.0 {
                    0.5 + 0.5 * self.stored_cdf_at(pz) / total
                } else {
                    0.5 - 0.5 * self.stored_cdf_at(-pz) / total
                }
            }
        }
    }

    fn stored_cdf_at(&self, pz: f64) -> f64 {
        let grid = &self.momentum_grid;
        if pz <= grid[0] {
            return 0.0;
        }
        if pz >= *grid.last().unwrap() {
            return *self.cdf.last().unwrap();
        }
        let bin = match grid.binary_search_by(|v| v.partial_cmp(&pz).unwrap()) {
            Ok(i) => i.min(grid.len() - 2),
            Err(i) => i - 1,
        };
        let dx = pz - grid[bin];
        let slope = (self.profile[bin + 1] - self.profile[bin]) / (grid[bin + 1] - grid[bin]);
        self.cdf[bin] + self.profile[bin] * dx + 0.5 * slope * dx * dx
    }

    /// Invert the stored-table CDF at an unnormalized target value
    fn invert_stored_cdf(&self, target: f64) -> f64 {
        let grid = &self.momentum_grid;
        let bin = match self
            .cdf
            .binary_search_by(|v| v.partial_cmp(&target).unwrap())
        {
            Ok(i) => i.min(grid.len() - 2),
            Err(i) => (i - 1).min(grid.len() - 2),
        };
        let residual = target - self.cdf[bin];
        let p0 = self.profile[bin];
        let slope = (self.profile[bin + 1] - self.profile[bin]) / (grid[bin + 1] - grid[bin]);

        // Solve p0*dx + slope/2*dx^2 = residual for dx on a lin-lin bin
        let dx = if slope.abs() * (grid[bin + 1] - grid[bin]) < 1e-12 * p0.max(f64::MIN_POSITIVE) {
            if p0 > 0.0 {
                residual / p0
            } else {
                0.0
            }
        } else {
            let disc = p0 * p0 + 2.0 * slope * residual;
            (-p0 + disc.max(0.0).sqrt()) / slope
        };

        (grid[bin] + dx).clamp(grid[bin], grid[bin + 1])
    }

    /// Sample a physical momentum projection no greater than `pz_max`.
    ///
    /// Full layouts invert the table CDF restricted to
    /// [table front, min(pz_max, table back)]. Half layouts sample a
    /// magnitude from the stored half (restricted to pz_max when it is
    /// positive) and flip the sign with probability one half; a sample
    /// that still lands above pz_max is resolved downstream by the
    /// Compton-line fallback.
    pub fn sample_in_subrange<R: Rng + ?Sized>(&self, pz_max: f64, rng: &mut R) -> f64 {
        let total = *self.cdf.last().unwrap();
        debug_assert!(total > 0.0);

        match self.policy {
            ComptonProfilePolicy::Full => {
                let upper = pz_max.min(self.upper_bound_of_momentum());
                let cdf_upper = self.stored_cdf_at(upper);
                let target = rng.gen::<f64>() * cdf_upper;
                self.invert_stored_cdf(target)
            }
            ComptonProfilePolicy::Half | ComptonProfilePolicy::DoubledHalf => {
                let upper = if pz_max > 0.0 {
                    pz_max.min(self.upper_bound_of_momentum())
                } else {
                    self.upper_bound_of_momentum()
                };
                let cdf_upper = self.stored_cdf_at(upper);
                let target = rng.gen::<f64>() * cdf_upper;
                let magnitude = self.invert_stored_cdf(target);

                if rng.gen::<f64>() < 0.5 {
                    -magnitude
                } else {
                    magnitude
                }
            }
        }
    }

    /// Sample a physical momentum projection over the full table
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sample_in_subrange(self.upper_bound_of_momentum(), rng)
    }
}
