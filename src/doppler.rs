// Doppler-broadened photon energy distribution
//
// Complete (whole-atom) distribution over the outgoing photon energy at
// a fixed scattering angle, built from per-subshell Compton profiles.
// The interaction subshell used for momentum sampling and the subshell
// reported to the caller are drawn independently (the "decoupled"
// treatment used with ACE-style data, where the profile index ordering
// and the ENDF occupancy ordering differ).

use crate::compton_profile::ComptonProfile;
use crate::constants::{CLASSICAL_ELECTRON_RADIUS_SQ_BARN, ELECTRON_REST_MASS_ENERGY};
use crate::kinematics::{
    compton_line_energy, doppler_broadened_energy, electron_momentum_projection,
    max_electron_momentum_projection,
};
use crate::quadrature::GaussKronrodIntegrator;
use crate::subshell::Subshell;
use rand::Rng;
use std::f64::consts::PI;

/// Per-subshell data needed for Doppler broadening.
#[derive(Debug, Clone)]
pub struct DopplerSubshell {
    pub subshell: Subshell,
    /// ENDF electron occupancy (number of electrons in the shell)
    pub occupancy: f64,
    /// Binding energy in MeV
    pub binding_energy: f64,
    pub profile: ComptonProfile,
}

/// Whole-atom Doppler-broadened photon energy distribution.
pub struct CompleteDopplerBroadenedPhotonEnergyDistribution {
    subshells: Vec<DopplerSubshell>,
    /// Normalized cumulative occupancies for discrete subshell sampling
    occupancy_cdf: Vec<f64>,
}

impl CompleteDopplerBroadenedPhotonEnergyDistribution {
    /// Panics on empty subshell data, non-positive occupancies, or
    /// invalid binding energies.
    pub fn new(subshells: Vec<DopplerSubshell>) -> Self {
        if subshells.is_empty() {
            panic!("Doppler distribution requires at least one subshell");
        }
        for shell in &subshells {
            if !shell.subshell.is_valid() {
                panic!("Doppler distribution subshell {:?} is not valid", shell.subshell);
            }
            if !(shell.occupancy > 0.0) {
                panic!(
                    "subshell {:?} occupancy must be positive (got {})",
                    shell.subshell, shell.occupancy
                );
            }
            if !(shell.binding_energy >= 0.0) || !shell.binding_energy.is_finite() {
                panic!(
                    "subshell {:?} binding energy is invalid ({})",
                    shell.subshell, shell.binding_energy
                );
            }
        }

        let total: f64 = subshells.iter().map(|s| s.occupancy).sum();
        let mut occupancy_cdf = Vec::with_capacity(subshells.len());
        let mut running = 0.0;
        for shell in &subshells {
            running += shell.occupancy / total;
            occupancy_cdf.push(running);
        }
        // Guard against rounding at the top
        *occupancy_cdf.last_mut().unwrap() = 1.0;

        CompleteDopplerBroadenedPhotonEnergyDistribution {
            subshells,
            occupancy_cdf,
        }
    }

    pub fn subshells(&self) -> &[DopplerSubshell] {
        &self.subshells
    }

    fn subshell_entry(&self, subshell: Subshell) -> Option<&DopplerSubshell> {
        self.subshells.iter().find(|s| s.subshell == subshell)
    }

    /// Draw a subshell index in proportion to electron occupancy
    fn sample_interaction_subshell<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let xi = rng.gen::<f64>();
        match self
            .occupancy_cdf
            .binary_search_by(|v| v.partial_cmp(&xi).unwrap())
        {
            Ok(i) => i,
            Err(i) => i.min(self.subshells.len() - 1),
        }
    }

    /// Sample an outgoing photon energy and an interaction subshell.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        incoming_energy: f64,
        scattering_angle_cosine: f64,
        rng: &mut R,
    ) -> (f64, Subshell) {
        let mut trials = 0u64;
        self.sample_and_record_trials(incoming_energy, scattering_angle_cosine, rng, &mut trials)
    }

    /// Sample an outgoing photon energy, accumulating the number of
    /// subshell-selection iterations into `trials`.
    pub fn sample_and_record_trials<R: Rng + ?Sized>(
        &self,
        incoming_energy: f64,
        scattering_angle_cosine: f64,
        rng: &mut R,
        trials: &mut u64,
    ) -> (f64, Subshell) {
        debug_assert!(incoming_energy > 0.0);
        debug_assert!((-1.0..=1.0).contains(&scattering_angle_cosine));

        // Select a subshell where the interaction is energetically
        // possible; every draw counts as a trial
        let mut iterations = 0u64;
        let interaction_index = loop {
            iterations += 1;
            debug_assert!(iterations <= 1000, "subshell rejection loop did not terminate");

            let index = self.sample_interaction_subshell(rng);
            if incoming_energy - self.subshells[index].binding_energy >= 0.0 {
                break index;
            }
        };

        let shell = &self.subshells[interaction_index];

        let pz_max = max_electron_momentum_projection(
            incoming_energy,
            shell.binding_energy,
            scattering_angle_cosine,
        );

        let pz = shell.profile.sample_in_subrange(pz_max, rng);

        let outgoing_energy =
            match doppler_broadened_energy(pz, incoming_energy, scattering_angle_cosine) {
                Some(e) if e >= 0.0 && e <= incoming_energy => {
                    // A zero energy is not representable downstream
                    if e == 0.0 {
                        f64::MIN_POSITIVE
                    } else {
                        e
                    }
                }
                // No valid kinematic solution: fall back to the
                // unbroadened Compton line
                _ => compton_line_energy(incoming_energy, scattering_angle_cosine),
            };

        // The reported subshell is drawn independently of the one used
        // for momentum sampling
        let recorded_index = self.sample_interaction_subshell(rng);
        let recorded_subshell = self.subshells[recorded_index].subshell;

        *trials += iterations;

        debug_assert!(outgoing_energy > 0.0);
        debug_assert!(outgoing_energy <= incoming_energy);
        debug_assert!(recorded_subshell.is_valid());

        (outgoing_energy, recorded_subshell)
    }

    /// Double differential cross section (barns/MeV) summed over
    /// subshells, as a function of outgoing energy.
    pub fn evaluate(
        &self,
        incoming_energy: f64,
        outgoing_energy: f64,
        scattering_angle_cosine: f64,
    ) -> f64 {
        let mut cross_section = 0.0;
        for shell in &self.subshells {
            cross_section += self.evaluate_subshell_entry(
                incoming_energy,
                outgoing_energy,
                scattering_angle_cosine,
                shell,
            );
        }
        debug_assert!(cross_section >= 0.0);
        cross_section
    }

    /// Double differential cross section (barns/MeV) for one subshell.
    ///
    /// Panics if the subshell is not part of this distribution.
    pub fn evaluate_subshell(
        &self,
        incoming_energy: f64,
        outgoing_energy: f64,
        scattering_angle_cosine: f64,
        subshell: Subshell,
    ) -> f64 {
        let shell = self
            .subshell_entry(subshell)
            .unwrap_or_else(|| panic!("subshell {:?} is not in this distribution", subshell));
        self.evaluate_subshell_entry(
            incoming_energy,
            outgoing_energy,
            scattering_angle_cosine,
            shell,
        )
    }

    fn evaluate_subshell_entry(
        &self,
        incoming_energy: f64,
        outgoing_energy: f64,
        scattering_angle_cosine: f64,
        shell: &DopplerSubshell,
    ) -> f64 {
        debug_assert!(incoming_energy > 0.0);
        debug_assert!(outgoing_energy >= 0.0);
        debug_assert!(outgoing_energy <= incoming_energy);

        // The subshell cannot scatter to energies above E - E_b
        if outgoing_energy > incoming_energy - shell.binding_energy {
            return 0.0;
        }

        let pz = electron_momentum_projection(
            incoming_energy,
            outgoing_energy,
            scattering_angle_cosine,
        );

        let multiplier = Self::evaluate_multiplier_exact(
            incoming_energy,
            outgoing_energy,
            scattering_angle_cosine,
        );
        let relativistic_term = Self::evaluate_relativistic_term_exact(
            incoming_energy,
            outgoing_energy,
            scattering_angle_cosine,
        );

        let cross_section =
            multiplier * relativistic_term * shell.occupancy * shell.profile.evaluate(pz);

        debug_assert!(cross_section >= 0.0);
        cross_section
    }

    /// Double differential cross section (barns) for one subshell as a
    /// function of electron momentum projection (me*c units).
    pub fn evaluate_subshell_with_momentum_projection(
        &self,
        incoming_energy: f64,
        electron_momentum_projection: f64,
        scattering_angle_cosine: f64,
        subshell: Subshell,
    ) -> f64 {
        let shell = self
            .subshell_entry(subshell)
            .unwrap_or_else(|| panic!("subshell {:?} is not in this distribution", subshell));

        let pz_max = max_electron_momentum_projection(
            incoming_energy,
            shell.binding_energy,
            scattering_angle_cosine,
        );

        let profile_value = shell
            .profile
            .evaluate_with_possible_limit(electron_momentum_projection, pz_max);

        let multiplier =
            Self::evaluate_multiplier(incoming_energy, scattering_angle_cosine);
        let relativistic_term =
            Self::evaluate_relativistic_term(incoming_energy, scattering_angle_cosine);

        let cross_section =
            multiplier * relativistic_term * shell.occupancy * profile_value;

        debug_assert!(cross_section >= 0.0);
        cross_section
    }

    /// Cross section (barns per unit angle cosine) for one subshell,
    /// integrated over outgoing energy with adaptive quadrature.
    pub fn evaluate_subshell_integrated_cross_section(
        &self,
        incoming_energy: f64,
        scattering_angle_cosine: f64,
        subshell: Subshell,
        precision: f64,
    ) -> f64 {
        let shell = self
            .subshell_entry(subshell)
            .unwrap_or_else(|| panic!("subshell {:?} is not in this distribution", subshell));

        let mut energy_max = incoming_energy - shell.binding_energy;
        if energy_max <= 0.0 {
            return 0.0;
        }

        // Above the table max the profile evaluates to zero; restrict
        // the integration domain accordingly
        let pz_max = max_electron_momentum_projection(
            incoming_energy,
            shell.binding_energy,
            scattering_angle_cosine,
        );
        let pz_table_max = shell.profile.upper_bound_of_momentum();
        if pz_max > pz_table_max {
            if let Some(limited) = doppler_broadened_energy(
                pz_table_max,
                incoming_energy,
                scattering_angle_cosine,
            ) {
                energy_max = limited.min(energy_max);
            }
        }

        let integrator = GaussKronrodIntegrator::new(precision);
        let (cross_section, _abs_error) = integrator.integrate_adaptively(
            &|outgoing| {
                self.evaluate_subshell_entry(
                    incoming_energy,
                    outgoing,
                    scattering_angle_cosine,
                    shell,
                )
            },
            0.0,
            energy_max,
        );

        debug_assert!(cross_section >= 0.0);
        cross_section
    }

    /// Cross section (barns per unit angle cosine) summed over subshells
    pub fn evaluate_integrated_cross_section(
        &self,
        incoming_energy: f64,
        scattering_angle_cosine: f64,
        precision: f64,
    ) -> f64 {
        self.subshells
            .iter()
            .map(|s| {
                self.evaluate_subshell_integrated_cross_section(
                    incoming_energy,
                    scattering_angle_cosine,
                    s.subshell,
                    precision,
                )
            })
            .sum()
    }

    /// Multiplier for the energy-differentiated cross section (barns/MeV
    /// when multiplied by a profile in inverse me*c units)
    fn evaluate_multiplier_exact(
        incoming_energy: f64,
        outgoing_energy: f64,
        scattering_angle_cosine: f64,
    ) -> f64 {
        let momentum_term = (incoming_energy * incoming_energy
            + outgoing_energy * outgoing_energy
            - 2.0 * incoming_energy * outgoing_energy * scattering_angle_cosine)
            .sqrt();

        PI * CLASSICAL_ELECTRON_RADIUS_SQ_BARN * ELECTRON_REST_MASS_ENERGY / momentum_term
            * (outgoing_energy / incoming_energy)
    }

    /// Multiplier for the momentum-differentiated cross section (barns)
    fn evaluate_multiplier(incoming_energy: f64, scattering_angle_cosine: f64) -> f64 {
        let compton_line = compton_line_energy(incoming_energy, scattering_angle_cosine);
        let ratio = compton_line / incoming_energy;

        PI * CLASSICAL_ELECTRON_RADIUS_SQ_BARN * ratio * ratio
    }

    fn evaluate_relativistic_term_exact(
        incoming_energy: f64,
        outgoing_energy: f64,
        scattering_angle_cosine: f64,
    ) -> f64 {
        let term = incoming_energy / outgoing_energy + outgoing_energy / incoming_energy - 1.0
            + scattering_angle_cosine * scattering_angle_cosine;
        debug_assert!(term >= 0.0);
        term
    }

    fn evaluate_relativistic_term(incoming_energy: f64, scattering_angle_cosine: f64) -> f64 {
        let compton_line = compton_line_energy(incoming_energy, scattering_angle_cosine);
        let term = incoming_energy / compton_line + compton_line / incoming_energy - 1.0
            + scattering_angle_cosine * scattering_angle_cosine;
        debug_assert!(term >= 0.0);
        term
    }
}
