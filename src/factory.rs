// Photoatom factory
//
// Builds a live Photoatom from a photoatomic data container: one shared
// energy grid and searcher, one reaction per tabulated channel, the
// Doppler broadening distribution, and the relaxation model. Channel
// selection avoids double counting: subshell-resolved photoelectric
// tables replace the total photoelectric channel when present, and the
// impulse approximation replaces the Waller-Hartree incoherent channel
// when requested and resolvable.

use crate::atom::{Photoatom, PhotoatomCore};
use crate::coherent::{CoherentScatteringDistribution, FormFactorSquared};
use crate::compton_profile::ComptonProfile;
use crate::cross_section::TabulatedCrossSection;
use crate::data_container::PhotoatomicDataContainer;
use crate::doppler::{CompleteDopplerBroadenedPhotonEnergyDistribution, DopplerSubshell};
use crate::grid_searcher::HashGridSearcher;
use crate::incoherent::{
    IncoherentPhotonScatteringDistribution, ScatteringFunction,
    SubshellIncoherentPhotonScatteringDistribution,
};
use crate::interpolation::InterpolationPolicy;
use crate::reaction::{
    PairProductionModel, PhotoatomicReaction, PhotoatomicReactionType, ReactionModel,
};
use crate::relaxation::{
    AtomicRelaxationModel, DetailedAtomicRelaxationModel, SubshellRelaxationTable,
    SubshellRelaxationTransition,
};
use crate::subshell::Subshell;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Model choices applied when a photoatom is built.
#[derive(Debug, Clone, Copy)]
pub struct FactoryOptions {
    pub pair_production_model: PairProductionModel,
    /// Run the detailed relaxation cascade when transition data exists
    pub use_detailed_relaxation: bool,
    /// Use per-subshell impulse-approximation incoherent channels
    /// instead of the Waller-Hartree channel when the container
    /// resolves them
    pub use_impulse_approximation: bool,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        FactoryOptions {
            pair_production_model: PairProductionModel::Basic,
            use_detailed_relaxation: true,
            use_impulse_approximation: false,
        }
    }
}

/// Builds photoatoms from data containers.
pub struct PhotoatomFactory;

impl PhotoatomFactory {
    pub fn create_photoatom(
        container: &PhotoatomicDataContainer,
        options: &FactoryOptions,
    ) -> Photoatom {
        let energy_grid = Arc::new(container.energy_grid.clone());
        let grid_searcher = Arc::new(HashGridSearcher::with_default_bins(energy_grid.clone()));

        let mut reactions = Vec::new();

        Self::append_incoherent_reactions(
            container,
            options,
            &energy_grid,
            &grid_searcher,
            &mut reactions,
        );
        Self::append_coherent_reaction(container, &energy_grid, &grid_searcher, &mut reactions);
        Self::append_photoelectric_reactions(
            container,
            &energy_grid,
            &grid_searcher,
            &mut reactions,
        );
        Self::append_pair_production_reaction(
            container,
            options,
            &energy_grid,
            &grid_searcher,
            &mut reactions,
        );
        Self::append_heating_reaction(container, &energy_grid, &grid_searcher, &mut reactions);

        let relaxation_model = Self::create_relaxation_model(container, options);

        let core = PhotoatomCore::new(
            energy_grid,
            grid_searcher,
            reactions,
            relaxation_model,
            container.interpolation,
            container.processed,
        );

        Photoatom::new(
            container.atom_name.clone(),
            container.atomic_number,
            container.atomic_weight,
            Arc::new(core),
        )
    }

    /// The complete Doppler broadening distribution over all subshells
    pub fn create_doppler_distribution(
        container: &PhotoatomicDataContainer,
    ) -> Arc<CompleteDopplerBroadenedPhotonEnergyDistribution> {
        let subshells = container
            .subshells
            .iter()
            .map(|record| DopplerSubshell {
                subshell: Self::designator_to_subshell(record.designator),
                occupancy: record.occupancy,
                binding_energy: record.binding_energy,
                profile: ComptonProfile::new(
                    record.compton_profile_momentum_grid.clone(),
                    record.compton_profile.clone(),
                    container.compton_profile_policy,
                    InterpolationPolicy::LinLin,
                ),
            })
            .collect();

        Arc::new(CompleteDopplerBroadenedPhotonEnergyDistribution::new(
            subshells,
        ))
    }

    fn append_incoherent_reactions(
        container: &PhotoatomicDataContainer,
        options: &FactoryOptions,
        energy_grid: &Arc<Vec<f64>>,
        grid_searcher: &Arc<HashGridSearcher>,
        reactions: &mut Vec<Arc<PhotoatomicReaction>>,
    ) {
        let subshells_resolved = !container.subshells.is_empty()
            && container
                .subshells
                .iter()
                .all(|s| !s.incoherent_cross_section.is_empty());

        if options.use_impulse_approximation && subshells_resolved {
            // One impulse-approximation channel per subshell; the
            // Waller-Hartree channel is dropped to avoid double counting
            for record in &container.subshells {
                let subshell = Self::designator_to_subshell(record.designator);
                let profile = ComptonProfile::new(
                    record.compton_profile_momentum_grid.clone(),
                    record.compton_profile.clone(),
                    container.compton_profile_policy,
                    InterpolationPolicy::LinLin,
                );
                let distribution = SubshellIncoherentPhotonScatteringDistribution::new(
                    subshell,
                    record.binding_energy,
                    record.occupancy,
                    profile,
                );
                reactions.push(Arc::new(PhotoatomicReaction::new(
                    PhotoatomicReactionType::SubshellIncoherent(subshell),
                    Self::create_cross_section(
                        container,
                        energy_grid,
                        grid_searcher,
                        &record.incoherent_cross_section,
                        record.incoherent_threshold_index,
                    ),
                    ReactionModel::SubshellIncoherent(distribution),
                )));
            }
        } else {
            // Rejection against log-scale tables fails at the zero
            // momentum transfer point, so the argument tables always
            // interpolate linearly
            let scattering_function = ScatteringFunction::new(
                container.scattering_function_grid.clone(),
                container.scattering_function.clone(),
                InterpolationPolicy::LinLin,
            );
            let doppler = Self::create_doppler_distribution(container);
            let distribution =
                IncoherentPhotonScatteringDistribution::new(scattering_function, doppler);

            reactions.push(Arc::new(PhotoatomicReaction::new(
                PhotoatomicReactionType::TotalIncoherent,
                Self::create_cross_section(
                    container,
                    energy_grid,
                    grid_searcher,
                    &container.incoherent_cross_section,
                    container.incoherent_threshold_index,
                ),
                ReactionModel::Incoherent(distribution),
            )));
        }
    }

    fn append_coherent_reaction(
        container: &PhotoatomicDataContainer,
        energy_grid: &Arc<Vec<f64>>,
        grid_searcher: &Arc<HashGridSearcher>,
        reactions: &mut Vec<Arc<PhotoatomicReaction>>,
    ) {
        if container.coherent_cross_section.is_empty() {
            return;
        }

        let form_factor_squared = FormFactorSquared::new(
            container.form_factor_squared_grid.clone(),
            container.form_factor_squared.clone(),
            InterpolationPolicy::LinLin,
        );

        reactions.push(Arc::new(PhotoatomicReaction::new(
            PhotoatomicReactionType::Coherent,
            Self::create_cross_section(
                container,
                energy_grid,
                grid_searcher,
                &container.coherent_cross_section,
                container.coherent_threshold_index,
            ),
            ReactionModel::Coherent(CoherentScatteringDistribution::new(form_factor_squared)),
        )));
    }

    fn append_photoelectric_reactions(
        container: &PhotoatomicDataContainer,
        energy_grid: &Arc<Vec<f64>>,
        grid_searcher: &Arc<HashGridSearcher>,
        reactions: &mut Vec<Arc<PhotoatomicReaction>>,
    ) {
        let subshells_resolved = !container.subshells.is_empty()
            && container
                .subshells
                .iter()
                .all(|s| !s.photoelectric_cross_section.is_empty());

        if subshells_resolved {
            // Subshell channels replace the total channel so the
            // absorption aggregate counts each event once
            for record in &container.subshells {
                let subshell = Self::designator_to_subshell(record.designator);
                reactions.push(Arc::new(PhotoatomicReaction::new(
                    PhotoatomicReactionType::SubshellPhotoelectric(subshell),
                    Self::create_cross_section(
                        container,
                        energy_grid,
                        grid_searcher,
                        &record.photoelectric_cross_section,
                        record.photoelectric_threshold_index,
                    ),
                    ReactionModel::SubshellPhotoelectric {
                        subshell,
                        binding_energy: record.binding_energy,
                    },
                )));
            }
        } else if !container.photoelectric_cross_section.is_empty() {
            reactions.push(Arc::new(PhotoatomicReaction::new(
                PhotoatomicReactionType::TotalPhotoelectric,
                Self::create_cross_section(
                    container,
                    energy_grid,
                    grid_searcher,
                    &container.photoelectric_cross_section,
                    container.photoelectric_threshold_index,
                ),
                ReactionModel::Photoelectric,
            )));
        }
    }

    fn append_pair_production_reaction(
        container: &PhotoatomicDataContainer,
        options: &FactoryOptions,
        energy_grid: &Arc<Vec<f64>>,
        grid_searcher: &Arc<HashGridSearcher>,
        reactions: &mut Vec<Arc<PhotoatomicReaction>>,
    ) {
        if container.pair_production_cross_section.is_empty() {
            return;
        }

        reactions.push(Arc::new(PhotoatomicReaction::new(
            PhotoatomicReactionType::PairProduction,
            Self::create_cross_section(
                container,
                energy_grid,
                grid_searcher,
                &container.pair_production_cross_section,
                container.pair_production_threshold_index,
            ),
            ReactionModel::PairProduction(options.pair_production_model),
        )));
    }

    fn append_heating_reaction(
        container: &PhotoatomicDataContainer,
        energy_grid: &Arc<Vec<f64>>,
        grid_searcher: &Arc<HashGridSearcher>,
        reactions: &mut Vec<Arc<PhotoatomicReaction>>,
    ) {
        if container.heating_cross_section.is_empty() {
            return;
        }

        reactions.push(Arc::new(PhotoatomicReaction::new(
            PhotoatomicReactionType::Heating,
            Self::create_cross_section(
                container,
                energy_grid,
                grid_searcher,
                &container.heating_cross_section,
                container.heating_threshold_index,
            ),
            ReactionModel::Heating,
        )));
    }

    fn create_relaxation_model(
        container: &PhotoatomicDataContainer,
        options: &FactoryOptions,
    ) -> AtomicRelaxationModel {
        if !options.use_detailed_relaxation || container.relaxation_transitions.is_empty() {
            return AtomicRelaxationModel::Void;
        }

        let mut tables = BTreeMap::new();
        for (&vacancy_designator, records) in &container.relaxation_transitions {
            let vacancy = Self::designator_to_subshell(vacancy_designator);
            let transitions = records
                .iter()
                .map(|r| SubshellRelaxationTransition {
                    primary_shell: Self::designator_to_subshell(r.primary_designator),
                    secondary_shell: r.secondary_designator.map(Self::designator_to_subshell),
                    probability: r.probability,
                    emission_energy: r.emission_energy,
                })
                .collect();
            tables.insert(vacancy, SubshellRelaxationTable::new(transitions));
        }

        AtomicRelaxationModel::Detailed(DetailedAtomicRelaxationModel::new(tables))
    }

    fn create_cross_section(
        container: &PhotoatomicDataContainer,
        energy_grid: &Arc<Vec<f64>>,
        grid_searcher: &Arc<HashGridSearcher>,
        values: &[f64],
        threshold_index: usize,
    ) -> TabulatedCrossSection {
        TabulatedCrossSection::with_grid_searcher(
            energy_grid.clone(),
            values.to_vec(),
            threshold_index,
            container.interpolation,
            container.processed,
            grid_searcher.clone(),
        )
    }

    fn designator_to_subshell(designator: u32) -> Subshell {
        let subshell = Subshell::from_endf_designator(designator);
        if !subshell.is_valid() {
            panic!("unknown subshell designator {}", designator);
        }
        subshell
    }
}
