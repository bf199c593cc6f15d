// Coherent (Rayleigh) scattering
//
// The photon scatters off the whole electron cloud with no energy loss.
// The angle is sampled by drawing from the free-electron Thompson
// distribution and rejecting against the squared atomic form factor at
// the corresponding momentum transfer.

use crate::bank::ParticleBank;
use crate::constants::PLANCK_TIMES_C;
use crate::interpolation::InterpolationPolicy;
use crate::kinematics::rotate_direction;
use crate::particle::Particle;
use crate::subshell::Subshell;
use rand::Rng;
use std::f64::consts::PI;

/// Squared atomic form factor tabulated against the squared momentum
/// transfer argument x^2 = ((1-mu)/2) * (E/hc)^2, in inverse square cm.
#[derive(Debug, Clone)]
pub struct FormFactorSquared {
    squared_argument_grid: Vec<f64>,
    values: Vec<f64>,
    interp: InterpolationPolicy,
}

impl FormFactorSquared {
    pub fn new(
        squared_argument_grid: Vec<f64>,
        values: Vec<f64>,
        interp: InterpolationPolicy,
    ) -> Self {
        if squared_argument_grid.len() < 2 {
            panic!(
                "form factor table must have at least 2 points (got {})",
                squared_argument_grid.len()
            );
        }
        if squared_argument_grid.len() != values.len() {
            panic!(
                "form factor table size mismatch: {} arguments, {} values",
                squared_argument_grid.len(),
                values.len()
            );
        }
        if squared_argument_grid[0] != 0.0 {
            panic!(
                "form factor table must start at zero momentum transfer (starts at {})",
                squared_argument_grid[0]
            );
        }
        for w in squared_argument_grid.windows(2) {
            if w[1] <= w[0] {
                panic!("form factor argument grid must be strictly ascending");
            }
        }
        for &v in &values {
            if !v.is_finite() || v < 0.0 {
                panic!("form factor values must be finite and non-negative (got {})", v);
            }
        }

        FormFactorSquared {
            squared_argument_grid,
            values,
            interp,
        }
    }

    /// FF^2 at a squared momentum transfer argument; zero beyond the table
    pub fn evaluate(&self, squared_argument: f64) -> f64 {
        let grid = &self.squared_argument_grid;
        if squared_argument < 0.0 || squared_argument > *grid.last().unwrap() {
            return 0.0;
        }
        let bin = match grid.binary_search_by(|v| v.partial_cmp(&squared_argument).unwrap()) {
            Ok(i) => i.min(grid.len() - 2),
            Err(i) => i - 1,
        };
        self.interp.interpolate(
            grid[bin],
            grid[bin + 1],
            squared_argument,
            self.values[bin],
            self.values[bin + 1],
        )
    }

    /// Value at zero momentum transfer (Z^2, the table maximum)
    pub fn max_value(&self) -> f64 {
        self.values[0]
    }
}

/// Coherent scattering distribution with form-factor rejection.
pub struct CoherentScatteringDistribution {
    form_factor_squared: FormFactorSquared,
}

impl CoherentScatteringDistribution {
    pub fn new(form_factor_squared: FormFactorSquared) -> Self {
        CoherentScatteringDistribution {
            form_factor_squared,
        }
    }

    /// Sample the scattering angle cosine from a Thompson-distributed
    /// trial accepted against the squared form factor
    pub fn sample_angle_and_record_trials<R: Rng + ?Sized>(
        &self,
        incoming_energy: f64,
        rng: &mut R,
        trials: &mut u64,
    ) -> f64 {
        debug_assert!(incoming_energy > 0.0);

        let inverse_wavelength = incoming_energy / PLANCK_TIMES_C;
        let max_form_factor = self.form_factor_squared.max_value();

        loop {
            *trials += 1;

            let mu = sample_thompson_angle_cosine(rng);

            let squared_argument =
                0.5 * (1.0 - mu) * inverse_wavelength * inverse_wavelength;
            let form_factor = self.form_factor_squared.evaluate(squared_argument);

            if rng.gen::<f64>() * max_form_factor <= form_factor {
                return mu;
            }
        }
    }

    /// One coherent scattering event: new direction, unchanged energy.
    ///
    /// No vacancy is created, so the interaction subshell is Unknown.
    pub fn scatter_photon<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        _bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Subshell {
        let mut trials = 0u64;
        let mu = self.sample_angle_and_record_trials(particle.energy, rng, &mut trials);

        let phi = 2.0 * PI * rng.gen::<f64>();
        particle.direction = rotate_direction(&particle.direction, mu, phi);
        particle.increment_collision_number();

        Subshell::Unknown
    }
}

/// Sample an angle cosine from the Thompson distribution, with pdf
/// proportional to (1 + mu^2) on [-1, 1]. The cubic CDF is inverted
/// analytically (Cardano; the discriminant is always positive).
fn sample_thompson_angle_cosine<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u = 2.0 * rng.gen::<f64>() - 1.0;

    // mu^3 + 3 mu - 4u = 0
    let s = (4.0 * u * u + 1.0).sqrt();
    let mu = (2.0 * u + s).cbrt() + (2.0 * u - s).cbrt();

    mu.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn free_electron_form_factor() -> FormFactorSquared {
        // Constant FF^2 accepts every Thompson trial
        FormFactorSquared::new(
            vec![0.0, 1e18, 1e22],
            vec![1.0, 1.0, 1.0],
            InterpolationPolicy::LinLin,
        )
    }

    fn screened_form_factor() -> FormFactorSquared {
        FormFactorSquared::new(
            vec![0.0, 1e17, 1e19, 1e21],
            vec![4.0, 1.0, 0.1, 0.0],
            InterpolationPolicy::LinLin,
        )
    }

    #[test]
    fn test_thompson_cosine_in_range_and_symmetric() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut sum = 0.0;
        let n = 100_000;
        for _ in 0..n {
            let mu = sample_thompson_angle_cosine(&mut rng);
            assert!((-1.0..=1.0).contains(&mu));
            sum += mu;
        }
        // Distribution is symmetric about zero
        assert!((sum / n as f64).abs() < 0.01);
    }

    #[test]
    fn test_free_electron_accepts_first_trial() {
        let dist = CoherentScatteringDistribution::new(free_electron_form_factor());
        let mut rng = StdRng::seed_from_u64(3);
        let mut trials = 0u64;
        for _ in 0..100 {
            dist.sample_angle_and_record_trials(1e-3, &mut rng, &mut trials);
        }
        assert_eq!(trials, 100);
    }

    #[test]
    fn test_screening_forward_peaks_the_angle() {
        // At high energy, the screened form factor suppresses large
        // momentum transfers, pushing mu toward +1
        let dist = CoherentScatteringDistribution::new(screened_form_factor());
        let mut rng = StdRng::seed_from_u64(17);
        let mut trials = 0u64;
        let mut mean = 0.0;
        let n = 5_000;
        for _ in 0..n {
            mean += dist.sample_angle_and_record_trials(1.0, &mut rng, &mut trials);
        }
        mean /= n as f64;
        assert!(mean > 0.5, "mean mu = {}", mean);
        assert!(trials >= n as u64);
    }

    #[test]
    fn test_scatter_preserves_energy() {
        let dist = CoherentScatteringDistribution::new(screened_form_factor());
        let mut rng = StdRng::seed_from_u64(2);
        let mut bank = ParticleBank::new();
        let mut photon = Particle::new_photon([0.0; 3], [0.0, 0.0, 1.0], 0.2);

        let subshell = dist.scatter_photon(&mut photon, &mut bank, &mut rng);

        assert_eq!(photon.energy, 0.2);
        assert_eq!(photon.collision_number, 1);
        assert_eq!(subshell, Subshell::Unknown);
        assert!(bank.is_empty());

        let norm: f64 = photon.direction.iter().map(|c| c * c).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "start at zero momentum transfer")]
    fn test_nonzero_front_panics() {
        FormFactorSquared::new(
            vec![1.0, 2.0],
            vec![4.0, 1.0],
            InterpolationPolicy::LinLin,
        );
    }
}
