// Incoherent (Compton) scattering
//
// Two bound-electron models on top of free-electron Klein-Nishina angle
// sampling: the Waller-Hartree model rejects angles against the
// whole-atom scattering function and Doppler-broadens the outgoing
// energy with the complete profile distribution; the impulse
// approximation treats one specific subshell, rejecting angles by the
// fraction of that shell's momentum profile that is energetically
// accessible.

use crate::bank::ParticleBank;
use crate::compton_profile::ComptonProfile;
use crate::constants::{
    CLASSICAL_ELECTRON_RADIUS_SQ_BARN, ELECTRON_REST_MASS_ENERGY, PLANCK_TIMES_C,
};
use crate::doppler::CompleteDopplerBroadenedPhotonEnergyDistribution;
use crate::interpolation::InterpolationPolicy;
use crate::kinematics::{
    compton_line_energy, doppler_broadened_energy, ejected_electron_angle_cosine,
    max_electron_momentum_projection, rotate_direction,
};
use crate::particle::Particle;
use crate::subshell::Subshell;
use rand::Rng;
use std::f64::consts::PI;
use std::sync::Arc;

/// Energy above which Koblinger's direct method replaces Kahn's
/// rejection scheme for Klein-Nishina angle sampling
const KOBLINGER_CUTOFF_ENERGY: f64 = 3.0 * ELECTRON_REST_MASS_ENERGY;

/// Sample a scattering angle cosine from the free-electron
/// Klein-Nishina distribution.
///
/// Below three electron rest masses Kahn's rejection scheme is used;
/// above, Koblinger's direct (mixture) method, which is only valid
/// there.
pub fn sample_klein_nishina_angle<R: Rng + ?Sized>(
    incoming_energy: f64,
    rng: &mut R,
    trials: &mut u64,
) -> f64 {
    debug_assert!(incoming_energy > 0.0);

    let alpha = incoming_energy / ELECTRON_REST_MASS_ENERGY;

    // x = E/E', in [1, 1 + 2 alpha]
    let x = if incoming_energy < KOBLINGER_CUTOFF_ENERGY {
        sample_kahn(alpha, rng, trials)
    } else {
        *trials += 1;
        sample_koblinger(alpha, rng)
    };

    (1.0 + (1.0 - x) / alpha).clamp(-1.0, 1.0)
}

/// Kahn's rejection scheme for the inverse energy ratio x = E/E'
fn sample_kahn<R: Rng + ?Sized>(alpha: f64, rng: &mut R, trials: &mut u64) -> f64 {
    let beta = 1.0 + 2.0 * alpha;
    let branch_probability = beta / (beta + 8.0);

    loop {
        *trials += 1;

        let r1 = rng.gen::<f64>();
        let r2 = rng.gen::<f64>();
        let r3 = rng.gen::<f64>();

        if r1 < branch_probability {
            let x = 1.0 + 2.0 * alpha * r2;
            if r3 < 4.0 * (1.0 / x - 1.0 / (x * x)) {
                return x;
            }
        } else {
            let x = beta / (1.0 + 2.0 * alpha * r2);
            let mu = 1.0 + (1.0 - x) / alpha;
            if r3 < 0.5 * (mu * mu + 1.0 / x) {
                return x;
            }
        }
    }
}

/// Koblinger's direct sampling of x = E/E' from a four-component
/// mixture of analytically invertible densities. Requires
/// alpha > 1 + sqrt(3) so every mixing weight is positive.
fn sample_koblinger<R: Rng + ?Sized>(alpha: f64, rng: &mut R) -> f64 {
    let gamma = 1.0 + 2.0 * alpha;

    // Component weights: integrals of 1/x, 1/x^2, 1/x^3 and constant
    // pieces of the Klein-Nishina density over [1, gamma]
    let w1 = (1.0 - 2.0 * (1.0 + alpha) / (alpha * alpha)) * gamma.ln();
    let w2 = (2.0 / alpha + 1.0 / (alpha * alpha)) * (1.0 - 1.0 / gamma);
    let w3 = 0.5 * (1.0 - 1.0 / (gamma * gamma));
    let w4 = 2.0 / alpha;
    let total = w1 + w2 + w3 + w4;

    debug_assert!(w1 > 0.0);

    let xi = rng.gen::<f64>() * total;
    let eta = rng.gen::<f64>();

    if xi < w1 {
        gamma.powf(eta)
    } else if xi < w1 + w2 {
        1.0 / (1.0 - eta * (1.0 - 1.0 / gamma))
    } else if xi < w1 + w2 + w3 {
        1.0 / (1.0 - eta * (1.0 - 1.0 / (gamma * gamma))).sqrt()
    } else {
        1.0 + 2.0 * alpha * eta
    }
}

/// Free-electron Klein-Nishina cross section (barns) differential in
/// the scattering angle cosine
pub fn evaluate_klein_nishina(incoming_energy: f64, scattering_angle_cosine: f64) -> f64 {
    debug_assert!(incoming_energy > 0.0);
    debug_assert!((-1.0..=1.0).contains(&scattering_angle_cosine));

    let compton_line = compton_line_energy(incoming_energy, scattering_angle_cosine);
    let ratio = compton_line / incoming_energy;

    PI * CLASSICAL_ELECTRON_RADIUS_SQ_BARN
        * ratio
        * ratio
        * (ratio + 1.0 / ratio - 1.0
            + scattering_angle_cosine * scattering_angle_cosine)
}

/// Whole-atom incoherent scattering function tabulated against the
/// momentum transfer argument x = sqrt((1-mu)/2) * E/hc, in inverse cm.
#[derive(Debug, Clone)]
pub struct ScatteringFunction {
    argument_grid: Vec<f64>,
    values: Vec<f64>,
    interp: InterpolationPolicy,
}

impl ScatteringFunction {
    pub fn new(argument_grid: Vec<f64>, values: Vec<f64>, interp: InterpolationPolicy) -> Self {
        if argument_grid.len() < 2 {
            panic!(
                "scattering function table must have at least 2 points (got {})",
                argument_grid.len()
            );
        }
        if argument_grid.len() != values.len() {
            panic!(
                "scattering function table size mismatch: {} arguments, {} values",
                argument_grid.len(),
                values.len()
            );
        }
        if argument_grid[0] != 0.0 {
            panic!(
                "scattering function table must start at zero momentum transfer (starts at {})",
                argument_grid[0]
            );
        }
        for w in argument_grid.windows(2) {
            if w[1] <= w[0] {
                panic!("scattering function argument grid must be strictly ascending");
            }
        }
        for &v in &values {
            if !v.is_finite() || v < 0.0 {
                panic!(
                    "scattering function values must be finite and non-negative (got {})",
                    v
                );
            }
        }

        ScatteringFunction {
            argument_grid,
            values,
            interp,
        }
    }

    /// S at a momentum transfer argument; saturates at the table back
    /// (the free-atom limit Z) beyond it
    pub fn evaluate(&self, argument: f64) -> f64 {
        let grid = &self.argument_grid;
        if argument <= 0.0 {
            return self.values[0];
        }
        if argument >= *grid.last().unwrap() {
            return *self.values.last().unwrap();
        }
        let bin = match grid.binary_search_by(|v| v.partial_cmp(&argument).unwrap()) {
            Ok(i) => i.min(grid.len() - 2),
            Err(i) => i - 1,
        };
        self.interp.interpolate(
            grid[bin],
            grid[bin + 1],
            argument,
            self.values[bin],
            self.values[bin + 1],
        )
    }

    /// Saturation value at large momentum transfer (Z)
    pub fn max_value(&self) -> f64 {
        *self.values.last().unwrap()
    }
}

/// Waller-Hartree incoherent scattering with Doppler-broadened outgoing
/// energies.
pub struct IncoherentPhotonScatteringDistribution {
    scattering_function: ScatteringFunction,
    doppler: Arc<CompleteDopplerBroadenedPhotonEnergyDistribution>,
}

impl IncoherentPhotonScatteringDistribution {
    pub fn new(
        scattering_function: ScatteringFunction,
        doppler: Arc<CompleteDopplerBroadenedPhotonEnergyDistribution>,
    ) -> Self {
        IncoherentPhotonScatteringDistribution {
            scattering_function,
            doppler,
        }
    }

    /// Sample the scattering angle cosine: Klein-Nishina trials
    /// rejected against the scattering function
    pub fn sample_angle_and_record_trials<R: Rng + ?Sized>(
        &self,
        incoming_energy: f64,
        rng: &mut R,
        trials: &mut u64,
    ) -> f64 {
        let inverse_wavelength = incoming_energy / PLANCK_TIMES_C;
        let max_value = self.scattering_function.max_value();

        loop {
            let mu = sample_klein_nishina_angle(incoming_energy, rng, trials);

            let argument = (0.5 * (1.0 - mu)).sqrt() * inverse_wavelength;
            let scattering_function_value = self.scattering_function.evaluate(argument);

            if rng.gen::<f64>() * max_value <= scattering_function_value {
                return mu;
            }
        }
    }

    /// Differential cross section in angle cosine (barns): the
    /// Klein-Nishina kernel weighted by the scattering function
    pub fn evaluate_differential(
        &self,
        incoming_energy: f64,
        scattering_angle_cosine: f64,
    ) -> f64 {
        let argument = (0.5 * (1.0 - scattering_angle_cosine)).sqrt() * incoming_energy
            / PLANCK_TIMES_C;

        evaluate_klein_nishina(incoming_energy, scattering_angle_cosine)
            * self.scattering_function.evaluate(argument)
    }

    /// One incoherent scattering event: Doppler-broadened energy loss,
    /// new direction, ejected electron banked when energetically
    /// possible. Returns the recorded interaction subshell.
    pub fn scatter_photon<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Subshell {
        let incoming_energy = particle.energy;
        let mut trials = 0u64;

        let mu = self.sample_angle_and_record_trials(incoming_energy, rng, &mut trials);

        let (outgoing_energy, subshell) = self.doppler.sample(incoming_energy, mu, rng);

        let binding_energy = self
            .doppler
            .subshells()
            .iter()
            .find(|s| s.subshell == subshell)
            .map(|s| s.binding_energy)
            .unwrap_or(0.0);

        let phi = 2.0 * PI * rng.gen::<f64>();

        // Electron recoils in the plane of scattering, opposite azimuth
        let electron_energy = incoming_energy - outgoing_energy - binding_energy;
        if electron_energy > 0.0 {
            let electron_mu =
                ejected_electron_angle_cosine(incoming_energy, outgoing_energy, mu);
            let electron_direction =
                rotate_direction(&particle.direction, electron_mu, phi + PI);
            bank.bank_secondary(Particle::new_electron(
                particle.position,
                electron_direction,
                electron_energy,
            ));
        }

        particle.energy = outgoing_energy;
        particle.direction = rotate_direction(&particle.direction, mu, phi);
        particle.increment_collision_number();

        subshell
    }
}

/// Impulse-approximation incoherent scattering restricted to a single
/// subshell.
pub struct SubshellIncoherentPhotonScatteringDistribution {
    subshell: Subshell,
    binding_energy: f64,
    occupancy: f64,
    profile: ComptonProfile,
}

impl SubshellIncoherentPhotonScatteringDistribution {
    pub fn new(
        subshell: Subshell,
        binding_energy: f64,
        occupancy: f64,
        profile: ComptonProfile,
    ) -> Self {
        if !subshell.is_valid() {
            panic!("subshell incoherent distribution requires a valid subshell");
        }
        if !(binding_energy > 0.0) {
            panic!(
                "subshell {:?} binding energy must be positive (got {})",
                subshell, binding_energy
            );
        }
        if !(occupancy > 0.0) {
            panic!(
                "subshell {:?} occupancy must be positive (got {})",
                subshell, occupancy
            );
        }

        SubshellIncoherentPhotonScatteringDistribution {
            subshell,
            binding_energy,
            occupancy,
            profile,
        }
    }

    pub fn subshell(&self) -> Subshell {
        self.subshell
    }

    pub fn binding_energy(&self) -> f64 {
        self.binding_energy
    }

    pub fn occupancy(&self) -> f64 {
        self.occupancy
    }

    /// Sample the scattering angle cosine: Klein-Nishina trials
    /// rejected by the fraction of the shell's momentum profile that
    /// is accessible at the trial angle
    pub fn sample_angle_and_record_trials<R: Rng + ?Sized>(
        &self,
        incoming_energy: f64,
        rng: &mut R,
        trials: &mut u64,
    ) -> f64 {
        debug_assert!(incoming_energy > self.binding_energy);

        loop {
            let mu = sample_klein_nishina_angle(incoming_energy, rng, trials);

            let pz_max = max_electron_momentum_projection(
                incoming_energy,
                self.binding_energy,
                mu,
            );

            // Accessible fraction of the shell electrons at this angle
            let accessible_fraction = self.profile.cdf_at(pz_max);

            if rng.gen::<f64>() <= accessible_fraction {
                return mu;
            }
        }
    }

    /// One impulse-approximation scattering event on this subshell.
    pub fn scatter_photon<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Subshell {
        let incoming_energy = particle.energy;
        let mut trials = 0u64;

        let mu = self.sample_angle_and_record_trials(incoming_energy, rng, &mut trials);

        let pz_max =
            max_electron_momentum_projection(incoming_energy, self.binding_energy, mu);
        let pz = self.profile.sample_in_subrange(pz_max, rng);

        let outgoing_energy = match doppler_broadened_energy(pz, incoming_energy, mu) {
            Some(e) if e >= 0.0 && e <= incoming_energy => {
                if e == 0.0 {
                    f64::MIN_POSITIVE
                } else {
                    e
                }
            }
            _ => compton_line_energy(incoming_energy, mu),
        };

        let phi = 2.0 * PI * rng.gen::<f64>();

        let electron_energy = incoming_energy - outgoing_energy - self.binding_energy;
        if electron_energy > 0.0 {
            let electron_mu =
                ejected_electron_angle_cosine(incoming_energy, outgoing_energy, mu);
            let electron_direction =
                rotate_direction(&particle.direction, electron_mu, phi + PI);
            bank.bank_secondary(Particle::new_electron(
                particle.position,
                electron_direction,
                electron_energy,
            ));
        }

        particle.energy = outgoing_energy;
        particle.direction = rotate_direction(&particle.direction, mu, phi);
        particle.increment_collision_number();

        self.subshell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compton_profile::ComptonProfilePolicy;
    use crate::doppler::DopplerSubshell;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_profile() -> ComptonProfile {
        ComptonProfile::new(
            vec![-1.0, -0.5, 0.0, 0.5, 1.0],
            vec![0.1, 0.5, 1.0, 0.5, 0.1],
            ComptonProfilePolicy::Full,
            InterpolationPolicy::LinLin,
        )
    }

    fn test_doppler() -> Arc<CompleteDopplerBroadenedPhotonEnergyDistribution> {
        Arc::new(CompleteDopplerBroadenedPhotonEnergyDistribution::new(vec![
            DopplerSubshell {
                subshell: Subshell::K,
                occupancy: 2.0,
                binding_energy: 8.8e-2,
                profile: test_profile(),
            },
            DopplerSubshell {
                subshell: Subshell::L1,
                occupancy: 2.0,
                binding_energy: 1.5e-2,
                profile: test_profile(),
            },
        ]))
    }

    fn free_atom_scattering_function() -> ScatteringFunction {
        // S already saturated: every trial accepted
        ScatteringFunction::new(
            vec![0.0, 1e21],
            vec![4.0, 4.0],
            InterpolationPolicy::LinLin,
        )
    }

    #[test]
    fn test_klein_nishina_angle_in_range_both_schemes() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut trials = 0u64;

        // Kahn regime
        for _ in 0..2_000 {
            let mu = sample_klein_nishina_angle(0.5, &mut rng, &mut trials);
            assert!((-1.0..=1.0).contains(&mu));
        }
        // Koblinger regime
        for _ in 0..2_000 {
            let mu = sample_klein_nishina_angle(5.0, &mut rng, &mut trials);
            assert!((-1.0..=1.0).contains(&mu));
        }
        assert!(trials >= 4_000);
    }

    #[test]
    fn test_high_energy_scattering_is_forward_peaked() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut trials = 0u64;
        let mut mean = 0.0;
        let n = 20_000;
        for _ in 0..n {
            mean += sample_klein_nishina_angle(10.0, &mut rng, &mut trials);
        }
        mean /= n as f64;
        assert!(mean > 0.8, "mean mu = {}", mean);
    }

    #[test]
    fn test_klein_nishina_differential_positive() {
        for &mu in &[-1.0, -0.5, 0.0, 0.5, 1.0] {
            assert!(evaluate_klein_nishina(1.0, mu) > 0.0);
        }
    }

    #[test]
    fn test_waller_hartree_scatter_energy_decreases() {
        let dist = IncoherentPhotonScatteringDistribution::new(
            free_atom_scattering_function(),
            test_doppler(),
        );
        let mut rng = StdRng::seed_from_u64(21);

        for _ in 0..500 {
            let mut bank = ParticleBank::new();
            let mut photon = Particle::new_photon([0.0; 3], [0.0, 0.0, 1.0], 1.0);

            let subshell = dist.scatter_photon(&mut photon, &mut bank, &mut rng);

            assert!(photon.energy > 0.0);
            assert!(photon.energy <= 1.0);
            assert!(subshell.is_valid());
            assert_eq!(photon.collision_number, 1);

            // Any banked secondary must be an electron with positive energy
            for secondary in bank.iter() {
                assert!(secondary.energy > 0.0);
            }
        }
    }

    #[test]
    fn test_subshell_incoherent_records_its_subshell() {
        let dist = SubshellIncoherentPhotonScatteringDistribution::new(
            Subshell::K,
            8.8e-2,
            2.0,
            test_profile(),
        );
        let mut rng = StdRng::seed_from_u64(8);
        let mut bank = ParticleBank::new();
        let mut photon = Particle::new_photon([0.0; 3], [0.0, 0.0, 1.0], 0.5);

        let subshell = dist.scatter_photon(&mut photon, &mut bank, &mut rng);

        assert_eq!(subshell, Subshell::K);
        assert!(photon.energy > 0.0 && photon.energy <= 0.5);
    }

    #[test]
    #[should_panic(expected = "binding energy must be positive")]
    fn test_subshell_incoherent_invalid_binding_panics() {
        SubshellIncoherentPhotonScatteringDistribution::new(
            Subshell::K,
            0.0,
            2.0,
            test_profile(),
        );
    }
}
