// First, import any modules and re-export the types for Rust usage
mod atom;
mod bank;
mod coherent;
mod compton_profile;
mod constants;
mod cross_section;
mod data_container;
mod doppler;
mod factory;
mod fast_rng;
mod grid_searcher;
mod incoherent;
mod interpolation;
mod kinematics;
mod particle;
mod quadrature;
mod reaction;
mod relaxation;
mod subshell;

pub use atom::{Photoatom, PhotoatomCore, ABSORPTION_REACTION_TYPES};
pub use bank::ParticleBank;
pub use coherent::{CoherentScatteringDistribution, FormFactorSquared};
pub use compton_profile::{ComptonProfile, ComptonProfilePolicy};
pub use constants::{
    CLASSICAL_ELECTRON_RADIUS_SQ_BARN, ELECTRON_REST_MASS_ENERGY, PAIR_PRODUCTION_THRESHOLD,
    PLANCK_TIMES_C,
};
pub use cross_section::TabulatedCrossSection;
pub use data_container::{PhotoatomicDataContainer, RelaxationTransitionRecord, SubshellRecord};
pub use doppler::{CompleteDopplerBroadenedPhotonEnergyDistribution, DopplerSubshell};
pub use factory::{FactoryOptions, PhotoatomFactory};
pub use fast_rng::FastRng;
pub use grid_searcher::HashGridSearcher;
pub use incoherent::{
    evaluate_klein_nishina, sample_klein_nishina_angle, IncoherentPhotonScatteringDistribution,
    ScatteringFunction, SubshellIncoherentPhotonScatteringDistribution,
};
pub use interpolation::InterpolationPolicy;
pub use kinematics::{
    compton_line_energy, doppler_broadened_energy, ejected_electron_angle_cosine,
    electron_momentum_projection, max_electron_momentum_projection, rotate_direction,
};
pub use particle::{Particle, ParticleKind};
pub use quadrature::GaussKronrodIntegrator;
pub use reaction::{
    PairProductionModel, PhotoatomicReaction, PhotoatomicReactionType, ReactionModel,
};
pub use relaxation::{
    AtomicRelaxationModel, DetailedAtomicRelaxationModel, SubshellRelaxationTable,
    SubshellRelaxationTransition,
};
pub use subshell::Subshell;
