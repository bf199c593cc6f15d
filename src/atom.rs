// Photoatom core
//
// Aggregates the reaction channels of one atom over a shared energy
// grid, synthesizing the total-absorption and total reactions from the
// per-channel tables at construction. Everything is read-only after
// construction so one core can serve many concurrent histories; the
// per-history mutable state (particle, bank, generator) is supplied to
// each call.

use crate::bank::ParticleBank;
use crate::cross_section::TabulatedCrossSection;
use crate::grid_searcher::HashGridSearcher;
use crate::interpolation::InterpolationPolicy;
use crate::particle::Particle;
use crate::reaction::{PhotoatomicReaction, PhotoatomicReactionType, ReactionModel};
use crate::relaxation::AtomicRelaxationModel;
use crate::subshell::Subshell;
use once_cell::sync::Lazy;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Reaction types that remove the photon from the problem. Subshell
/// photoelectric entries are enumerated for every ENDF designator.
pub static ABSORPTION_REACTION_TYPES: Lazy<BTreeSet<PhotoatomicReactionType>> = Lazy::new(|| {
    let mut types = BTreeSet::new();
    types.insert(PhotoatomicReactionType::TotalPhotoelectric);
    types.insert(PhotoatomicReactionType::Heating);
    types.insert(PhotoatomicReactionType::GammaAbsorption);
    for designator in 1..=39 {
        let subshell = Subshell::from_endf_designator(designator);
        if subshell.is_valid() {
            types.insert(PhotoatomicReactionType::SubshellPhotoelectric(subshell));
        }
    }
    types
});

type ReactionMap = BTreeMap<PhotoatomicReactionType, Arc<PhotoatomicReaction>>;

/// Shared, immutable collision data for one atom.
pub struct PhotoatomCore {
    energy_grid: Arc<Vec<f64>>,
    grid_searcher: Arc<HashGridSearcher>,
    scattering_reactions: ReactionMap,
    absorption_reactions: ReactionMap,
    miscellaneous_reactions: ReactionMap,
    total_reaction: Arc<PhotoatomicReaction>,
    total_absorption_reaction: Arc<PhotoatomicReaction>,
    relaxation_model: AtomicRelaxationModel,
    policy: InterpolationPolicy,
    processed: bool,
}

impl PhotoatomCore {
    /// Build a core from the individual reaction channels, synthesizing
    /// the total-absorption and total reactions.
    ///
    /// Panics when a reaction does not share the core energy grid or
    /// when an aggregate array comes out with an exact zero or an
    /// infinity, both of which mean bad input data.
    pub fn new(
        energy_grid: Arc<Vec<f64>>,
        grid_searcher: Arc<HashGridSearcher>,
        reactions: Vec<Arc<PhotoatomicReaction>>,
        relaxation_model: AtomicRelaxationModel,
        policy: InterpolationPolicy,
        processed: bool,
    ) -> Self {
        if reactions.is_empty() {
            panic!("photoatom core requires at least one reaction");
        }

        let mut scattering_reactions = ReactionMap::new();
        let mut absorption_reactions = ReactionMap::new();
        let mut miscellaneous_reactions = ReactionMap::new();

        for reaction in reactions {
            if !Arc::ptr_eq(reaction.tabulated_cross_section().energy_grid(), &energy_grid) {
                panic!(
                    "reaction {:?} does not share the core energy grid",
                    reaction.reaction_type()
                );
            }

            let reaction_type = reaction.reaction_type();
            if ABSORPTION_REACTION_TYPES.contains(&reaction_type) {
                absorption_reactions.insert(reaction_type, reaction);
            } else if matches!(
                reaction_type,
                PhotoatomicReactionType::TotalIncoherent
                    | PhotoatomicReactionType::SubshellIncoherent(_)
                    | PhotoatomicReactionType::Coherent
                    | PhotoatomicReactionType::PairProduction
            ) {
                scattering_reactions.insert(reaction_type, reaction);
            } else {
                miscellaneous_reactions.insert(reaction_type, reaction);
            }
        }

        let total_absorption_reaction = Arc::new(Self::synthesize_aggregate(
            &energy_grid,
            &grid_searcher,
            PhotoatomicReactionType::TotalAbsorption,
            absorption_reactions.values(),
            None,
            policy,
            processed,
        ));

        let total_reaction = Arc::new(Self::synthesize_aggregate(
            &energy_grid,
            &grid_searcher,
            PhotoatomicReactionType::Total,
            scattering_reactions.values(),
            Some(&total_absorption_reaction),
            policy,
            processed,
        ));

        PhotoatomCore {
            energy_grid,
            grid_searcher,
            scattering_reactions,
            absorption_reactions,
            miscellaneous_reactions,
            total_reaction,
            total_absorption_reaction,
            relaxation_model,
            policy,
            processed,
        }
    }

    /// Sum bucket cross sections point by point over the grid. Leading
    /// zero sums advance the threshold index instead of being stored.
    fn synthesize_aggregate<'a>(
        energy_grid: &Arc<Vec<f64>>,
        grid_searcher: &Arc<HashGridSearcher>,
        reaction_type: PhotoatomicReactionType,
        bucket: impl Iterator<Item = &'a Arc<PhotoatomicReaction>> + Clone,
        base: Option<&Arc<PhotoatomicReaction>>,
        policy: InterpolationPolicy,
        processed: bool,
    ) -> PhotoatomicReaction {
        let grid_len = energy_grid.len();
        let mut aggregate = Vec::with_capacity(grid_len);
        let mut threshold_index = 0usize;

        for i in 0..grid_len {
            // The top grid point has no bin of its own
            let bin_index = if i == grid_len - 1 { i - 1 } else { i };

            let energy = if processed {
                policy.recover_processed_indep_var(energy_grid[i])
            } else {
                energy_grid[i]
            };

            let mut sum = 0.0;
            if let Some(base_reaction) = base {
                sum += base_reaction.cross_section_at_bin(energy, bin_index);
            }
            for reaction in bucket.clone() {
                sum += reaction.cross_section_at_bin(energy, bin_index);
            }

            if sum > 0.0 {
                if processed {
                    aggregate.push(policy.process_dep_var(sum));
                } else {
                    aggregate.push(sum);
                }
            } else {
                threshold_index += 1;
            }
        }

        // An exact zero or an infinity in the aggregate means a data or
        // summation bug
        for (offset, &value) in aggregate.iter().enumerate() {
            let raw = if processed {
                policy.recover_processed_dep_var(value)
            } else {
                value
            };
            if raw == 0.0 || raw.is_infinite() {
                panic!(
                    "aggregate {:?} cross section is degenerate at grid index {} ({})",
                    reaction_type,
                    threshold_index + offset,
                    raw
                );
            }
        }

        let cross_section = TabulatedCrossSection::with_grid_searcher(
            energy_grid.clone(),
            aggregate,
            threshold_index,
            policy,
            processed,
            grid_searcher.clone(),
        );

        PhotoatomicReaction::new(reaction_type, cross_section, ReactionModel::Absorption)
    }

    pub fn energy_grid(&self) -> &Arc<Vec<f64>> {
        &self.energy_grid
    }

    pub fn grid_searcher(&self) -> &Arc<HashGridSearcher> {
        &self.grid_searcher
    }

    pub fn interpolation_policy(&self) -> InterpolationPolicy {
        self.policy
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn scattering_reactions(&self) -> &ReactionMap {
        &self.scattering_reactions
    }

    pub fn absorption_reactions(&self) -> &ReactionMap {
        &self.absorption_reactions
    }

    pub fn miscellaneous_reactions(&self) -> &ReactionMap {
        &self.miscellaneous_reactions
    }

    pub fn total_reaction(&self) -> &PhotoatomicReaction {
        &self.total_reaction
    }

    pub fn total_absorption_reaction(&self) -> &PhotoatomicReaction {
        &self.total_absorption_reaction
    }

    pub fn relaxation_model(&self) -> &AtomicRelaxationModel {
        &self.relaxation_model
    }

    /// Find a reaction channel by type in any bucket
    pub fn reaction(&self, reaction_type: PhotoatomicReactionType) -> Option<&Arc<PhotoatomicReaction>> {
        self.scattering_reactions
            .get(&reaction_type)
            .or_else(|| self.absorption_reactions.get(&reaction_type))
            .or_else(|| self.miscellaneous_reactions.get(&reaction_type))
    }

    pub fn total_cross_section(&self, energy: f64) -> f64 {
        self.total_reaction.cross_section_at(energy)
    }

    pub fn absorption_cross_section(&self, energy: f64) -> f64 {
        self.total_absorption_reaction.cross_section_at(energy)
    }

    /// Probability that a collision at this energy is not an absorption
    pub fn survival_probability(&self, energy: f64) -> f64 {
        let total = self.total_cross_section(energy);
        if total <= 0.0 {
            return 1.0;
        }
        let survival = 1.0 - self.absorption_cross_section(energy) / total;
        debug_assert!((0.0..=1.0).contains(&survival) || survival.abs() < 1e-12);
        survival.clamp(0.0, 1.0)
    }

    /// Undergo a collision: pick a channel with probability
    /// proportional to its cross section, react, then relax any
    /// vacancy. Returns the chosen reaction type.
    pub fn collide<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> PhotoatomicReactionType {
        let energy = particle.energy;
        let total = self.total_cross_section(energy);
        debug_assert!(total > 0.0, "collision sampled at zero total cross section");

        let mut remaining = rng.gen::<f64>() * total;

        let channels = self
            .absorption_reactions
            .values()
            .chain(self.scattering_reactions.values());

        let mut selected = None;
        for reaction in channels {
            remaining -= reaction.cross_section_at(energy);
            if remaining <= 0.0 {
                selected = Some(reaction);
                break;
            }
        }

        // Rounding in the total can leave a sliver; attribute it to the
        // last nonzero channel
        let reaction = match selected {
            Some(reaction) => reaction.clone(),
            None => self
                .absorption_reactions
                .values()
                .chain(self.scattering_reactions.values())
                .filter(|r| r.cross_section_at(energy) > 0.0)
                .last()
                .expect("no reaction channel open at collision energy")
                .clone(),
        };

        let position = particle.position;
        let vacancy = reaction.react(particle, bank, rng);

        if vacancy.is_valid() && vacancy != Subshell::Unknown {
            self.relaxation_model.relax_atom(vacancy, position, bank, rng);
        }

        reaction.reaction_type()
    }
}

/// A named atom delegating to its shared core.
pub struct Photoatom {
    name: String,
    atomic_number: u32,
    atomic_weight: f64,
    core: Arc<PhotoatomCore>,
}

impl Photoatom {
    pub fn new(name: String, atomic_number: u32, atomic_weight: f64, core: Arc<PhotoatomCore>) -> Self {
        if atomic_number == 0 {
            panic!("photoatom atomic number must be positive");
        }
        if !(atomic_weight > 0.0) {
            panic!("photoatom atomic weight must be positive (got {})", atomic_weight);
        }
        Photoatom {
            name,
            atomic_number,
            atomic_weight,
            core,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    pub fn atomic_weight(&self) -> f64 {
        self.atomic_weight
    }

    pub fn core(&self) -> &Arc<PhotoatomCore> {
        &self.core
    }

    pub fn total_cross_section(&self, energy: f64) -> f64 {
        self.core.total_cross_section(energy)
    }

    pub fn absorption_cross_section(&self, energy: f64) -> f64 {
        self.core.absorption_cross_section(energy)
    }

    pub fn survival_probability(&self, energy: f64) -> f64 {
        self.core.survival_probability(energy)
    }

    /// Cross section of one reaction channel, zero when the channel is
    /// not present
    pub fn reaction_cross_section(
        &self,
        reaction_type: PhotoatomicReactionType,
        energy: f64,
    ) -> f64 {
        match self.core.reaction(reaction_type) {
            Some(reaction) => reaction.cross_section_at(energy),
            None => 0.0,
        }
    }

    pub fn collide<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> PhotoatomicReactionType {
        self.core.collide(particle, bank, rng)
    }
}
