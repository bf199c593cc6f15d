// Photoatomic reactions
//
// A reaction pairs a tabulated cross section with the outgoing-state
// model for one interaction channel. The model is a closed set of
// variants rather than a trait object so reactions stay Send + Sync
// and cheap to match on in the collision kernel.

use crate::bank::ParticleBank;
use crate::coherent::CoherentScatteringDistribution;
use crate::constants::{ELECTRON_REST_MASS_ENERGY, PAIR_PRODUCTION_THRESHOLD};
use crate::cross_section::TabulatedCrossSection;
use crate::incoherent::{
    IncoherentPhotonScatteringDistribution, SubshellIncoherentPhotonScatteringDistribution,
};
use crate::particle::Particle;
use crate::subshell::Subshell;
use rand::Rng;
use rand_distr::{Distribution, UnitSphere};
use serde::{Deserialize, Serialize};

/// Identifier for a photoatomic interaction channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PhotoatomicReactionType {
    TotalIncoherent,
    SubshellIncoherent(Subshell),
    Coherent,
    PairProduction,
    TotalPhotoelectric,
    SubshellPhotoelectric(Subshell),
    Heating,
    GammaAbsorption,
    TotalAbsorption,
    Total,
}

/// Secondary-emission treatment for pair production, chosen once at
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairProductionModel {
    /// Annihilate the positron in place: bank two back-to-back
    /// annihilation photons, deposit the electron locally
    Basic,
    /// Bank the electron/positron pair for transport
    Detailed,
}

/// Outgoing-state model for one reaction channel.
pub enum ReactionModel {
    /// Terminal capture with no vacancy
    Absorption,
    Coherent(CoherentScatteringDistribution),
    Incoherent(IncoherentPhotonScatteringDistribution),
    SubshellIncoherent(SubshellIncoherentPhotonScatteringDistribution),
    PairProduction(PairProductionModel),
    Photoelectric,
    SubshellPhotoelectric {
        subshell: Subshell,
        binding_energy: f64,
    },
    /// Absorption-like channel tracking local energy deposition
    Heating,
}

/// One photoatomic interaction channel.
pub struct PhotoatomicReaction {
    reaction_type: PhotoatomicReactionType,
    cross_section: TabulatedCrossSection,
    model: ReactionModel,
}

impl PhotoatomicReaction {
    /// Panics when the model does not fit the reaction type tag.
    pub fn new(
        reaction_type: PhotoatomicReactionType,
        cross_section: TabulatedCrossSection,
        model: ReactionModel,
    ) -> Self {
        let tag_matches = matches!(
            (&reaction_type, &model),
            (PhotoatomicReactionType::Coherent, ReactionModel::Coherent(_))
                | (PhotoatomicReactionType::TotalIncoherent, ReactionModel::Incoherent(_))
                | (
                    PhotoatomicReactionType::SubshellIncoherent(_),
                    ReactionModel::SubshellIncoherent(_)
                )
                | (PhotoatomicReactionType::PairProduction, ReactionModel::PairProduction(_))
                | (PhotoatomicReactionType::TotalPhotoelectric, ReactionModel::Photoelectric)
                | (
                    PhotoatomicReactionType::SubshellPhotoelectric(_),
                    ReactionModel::SubshellPhotoelectric { .. }
                )
                | (PhotoatomicReactionType::Heating, ReactionModel::Heating)
                | (PhotoatomicReactionType::GammaAbsorption, ReactionModel::Absorption)
                | (PhotoatomicReactionType::TotalAbsorption, ReactionModel::Absorption)
                | (PhotoatomicReactionType::Total, ReactionModel::Absorption)
        );
        if !tag_matches {
            panic!(
                "reaction model does not match reaction type {:?}",
                reaction_type
            );
        }
        if let (
            PhotoatomicReactionType::SubshellIncoherent(tag),
            ReactionModel::SubshellIncoherent(dist),
        ) = (&reaction_type, &model)
        {
            if *tag != dist.subshell() {
                panic!(
                    "subshell incoherent tag {:?} does not match distribution subshell {:?}",
                    tag,
                    dist.subshell()
                );
            }
        }
        if let (
            PhotoatomicReactionType::SubshellPhotoelectric(tag),
            ReactionModel::SubshellPhotoelectric { subshell, .. },
        ) = (&reaction_type, &model)
        {
            if tag != subshell {
                panic!(
                    "subshell photoelectric tag {:?} does not match model subshell {:?}",
                    tag, subshell
                );
            }
        }

        PhotoatomicReaction {
            reaction_type,
            cross_section,
            model,
        }
    }

    pub fn reaction_type(&self) -> PhotoatomicReactionType {
        self.reaction_type
    }

    pub fn tabulated_cross_section(&self) -> &TabulatedCrossSection {
        &self.cross_section
    }

    pub fn threshold_energy(&self) -> f64 {
        self.cross_section.threshold_energy()
    }

    pub fn cross_section_at(&self, energy: f64) -> f64 {
        self.cross_section.cross_section_at(energy)
    }

    pub fn cross_section_at_bin(&self, energy: f64, bin_index: usize) -> f64 {
        self.cross_section.cross_section_at_bin(energy, bin_index)
    }

    /// Photons leaving the reaction at a given incoming energy
    pub fn number_of_emitted_photons(&self, energy: f64) -> u32 {
        if energy < self.threshold_energy() {
            return 0;
        }
        match &self.model {
            ReactionModel::Coherent(_)
            | ReactionModel::Incoherent(_)
            | ReactionModel::SubshellIncoherent(_) => 1,
            ReactionModel::PairProduction(PairProductionModel::Basic) => 2,
            _ => 0,
        }
    }

    /// Electrons banked by the reaction at a given incoming energy
    pub fn number_of_emitted_electrons(&self, energy: f64) -> u32 {
        if energy < self.threshold_energy() {
            return 0;
        }
        match &self.model {
            ReactionModel::Incoherent(_) | ReactionModel::SubshellIncoherent(_) => 1,
            ReactionModel::PairProduction(PairProductionModel::Detailed) => 1,
            _ => 0,
        }
    }

    /// Positrons banked by the reaction at a given incoming energy
    pub fn number_of_emitted_positrons(&self, energy: f64) -> u32 {
        if energy < self.threshold_energy() {
            return 0;
        }
        match &self.model {
            ReactionModel::PairProduction(PairProductionModel::Detailed) => 1,
            _ => 0,
        }
    }

    /// Whether this channel removes the photon from the problem
    pub fn is_absorption(&self) -> bool {
        matches!(
            self.model,
            ReactionModel::Absorption
                | ReactionModel::Photoelectric
                | ReactionModel::SubshellPhotoelectric { .. }
                | ReactionModel::Heating
        )
    }

    /// Undergo the reaction, mutating the photon state and banking
    /// secondaries. Returns the interaction subshell for relaxation
    /// (Unknown when no vacancy was created).
    pub fn react<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Subshell {
        match &self.model {
            ReactionModel::Absorption | ReactionModel::Heating | ReactionModel::Photoelectric => {
                particle.set_gone();
                Subshell::Unknown
            }
            ReactionModel::SubshellPhotoelectric { subshell, .. } => {
                particle.set_gone();
                *subshell
            }
            ReactionModel::Coherent(dist) => dist.scatter_photon(particle, bank, rng),
            ReactionModel::Incoherent(dist) => dist.scatter_photon(particle, bank, rng),
            ReactionModel::SubshellIncoherent(dist) => dist.scatter_photon(particle, bank, rng),
            ReactionModel::PairProduction(model) => {
                self.pair_production_react(*model, particle, bank, rng)
            }
        }
    }

    fn pair_production_react<R: Rng + ?Sized>(
        &self,
        model: PairProductionModel,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Subshell {
        debug_assert!(particle.energy >= PAIR_PRODUCTION_THRESHOLD);

        match model {
            PairProductionModel::Basic => {
                // Annihilation in place: two 0.511 MeV photons emitted
                // back to back along a random axis
                let direction: [f64; 3] = UnitSphere.sample(rng);
                let opposite = [-direction[0], -direction[1], -direction[2]];

                bank.bank_secondary(Particle::new_photon(
                    particle.position,
                    direction,
                    ELECTRON_REST_MASS_ENERGY,
                ));
                bank.bank_secondary(Particle::new_photon(
                    particle.position,
                    opposite,
                    ELECTRON_REST_MASS_ENERGY,
                ));
            }
            PairProductionModel::Detailed => {
                // Split the available kinetic energy between the pair;
                // both members continue along the photon direction
                let kinetic_energy = particle.energy - PAIR_PRODUCTION_THRESHOLD;
                let electron_fraction = rng.gen::<f64>();

                bank.bank_secondary(Particle::new_electron(
                    particle.position,
                    particle.direction,
                    electron_fraction * kinetic_energy,
                ));
                bank.bank_secondary(Particle::new_positron(
                    particle.position,
                    particle.direction,
                    (1.0 - electron_fraction) * kinetic_energy,
                ));
            }
        }

        particle.set_gone();
        Subshell::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_searcher::HashGridSearcher;
    use crate::interpolation::InterpolationPolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn flat_cross_section(threshold_index: usize) -> TabulatedCrossSection {
        let grid = Arc::new(vec![1e-3, 1e-2, 1e-1, 1.0, 10.0]);
        let n = grid.len() - threshold_index;
        TabulatedCrossSection::new(
            grid,
            vec![1.0; n],
            threshold_index,
            InterpolationPolicy::LogLog,
            false,
        )
    }

    fn pair_production_cross_section() -> TabulatedCrossSection {
        let grid = Arc::new(vec![1e-2, PAIR_PRODUCTION_THRESHOLD, 5.0, 10.0, 20.0]);
        let searcher = Arc::new(HashGridSearcher::with_default_bins(grid.clone()));
        TabulatedCrossSection::with_grid_searcher(
            grid,
            vec![0.0, 0.5, 1.0, 1.5],
            1,
            InterpolationPolicy::LinLin,
            false,
            searcher,
        )
    }

    #[test]
    fn test_absorption_reaction_terminal() {
        let reaction = PhotoatomicReaction::new(
            PhotoatomicReactionType::GammaAbsorption,
            flat_cross_section(0),
            ReactionModel::Absorption,
        );
        let mut rng = StdRng::seed_from_u64(1);
        let mut bank = ParticleBank::new();
        let mut photon = Particle::new_photon([0.0; 3], [0.0, 0.0, 1.0], 1.0);

        let subshell = reaction.react(&mut photon, &mut bank, &mut rng);

        assert!(!photon.alive);
        assert_eq!(subshell, Subshell::Unknown);
        assert!(bank.is_empty());
        assert_eq!(reaction.number_of_emitted_photons(1.0), 0);
        assert!(reaction.is_absorption());
    }

    #[test]
    fn test_subshell_photoelectric_records_vacancy() {
        let reaction = PhotoatomicReaction::new(
            PhotoatomicReactionType::SubshellPhotoelectric(Subshell::K),
            flat_cross_section(1),
            ReactionModel::SubshellPhotoelectric {
                subshell: Subshell::K,
                binding_energy: 8.8e-2,
            },
        );
        let mut rng = StdRng::seed_from_u64(2);
        let mut bank = ParticleBank::new();
        let mut photon = Particle::new_photon([0.0; 3], [0.0, 0.0, 1.0], 0.5);

        let subshell = reaction.react(&mut photon, &mut bank, &mut rng);

        assert!(!photon.alive);
        assert_eq!(subshell, Subshell::K);
    }

    #[test]
    fn test_basic_pair_production_banks_annihilation_photons() {
        let reaction = PhotoatomicReaction::new(
            PhotoatomicReactionType::PairProduction,
            pair_production_cross_section(),
            ReactionModel::PairProduction(PairProductionModel::Basic),
        );
        let mut rng = StdRng::seed_from_u64(3);
        let mut bank = ParticleBank::new();
        let mut photon = Particle::new_photon([0.0; 3], [0.0, 0.0, 1.0], 5.0);

        reaction.react(&mut photon, &mut bank, &mut rng);

        assert!(!photon.alive);
        assert_eq!(bank.len(), 2);
        let first = bank.pop_particle().unwrap();
        let second = bank.pop_particle().unwrap();
        assert_eq!(first.energy, ELECTRON_REST_MASS_ENERGY);
        assert_eq!(second.energy, ELECTRON_REST_MASS_ENERGY);
        for i in 0..3 {
            assert!((first.direction[i] + second.direction[i]).abs() < 1e-12);
        }
        assert_eq!(reaction.number_of_emitted_photons(5.0), 2);
        assert_eq!(reaction.number_of_emitted_positrons(5.0), 0);
    }

    #[test]
    fn test_detailed_pair_production_banks_pair() {
        let reaction = PhotoatomicReaction::new(
            PhotoatomicReactionType::PairProduction,
            pair_production_cross_section(),
            ReactionModel::PairProduction(PairProductionModel::Detailed),
        );
        let mut rng = StdRng::seed_from_u64(4);
        let mut bank = ParticleBank::new();
        let mut photon = Particle::new_photon([0.0; 3], [0.0, 0.0, 1.0], 5.0);

        reaction.react(&mut photon, &mut bank, &mut rng);

        assert_eq!(bank.len(), 2);
        let electron = bank.pop_particle().unwrap();
        let positron = bank.pop_particle().unwrap();

        let total_kinetic = electron.energy + positron.energy;
        assert!((total_kinetic - (5.0 - PAIR_PRODUCTION_THRESHOLD)).abs() < 1e-12);
        assert_eq!(reaction.number_of_emitted_photons(5.0), 0);
        assert_eq!(reaction.number_of_emitted_electrons(5.0), 1);
        assert_eq!(reaction.number_of_emitted_positrons(5.0), 1);
    }

    #[test]
    fn test_emission_counts_below_threshold_are_zero() {
        let reaction = PhotoatomicReaction::new(
            PhotoatomicReactionType::PairProduction,
            pair_production_cross_section(),
            ReactionModel::PairProduction(PairProductionModel::Basic),
        );
        assert_eq!(reaction.number_of_emitted_photons(0.5), 0);
    }

    #[test]
    #[should_panic(expected = "does not match reaction type")]
    fn test_mismatched_model_panics() {
        PhotoatomicReaction::new(
            PhotoatomicReactionType::Coherent,
            flat_cross_section(0),
            ReactionModel::Absorption,
        );
    }
}
