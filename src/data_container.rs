// Photoatomic data container
//
// The construction-time data contract handed over by a nuclear-data
// library reader. The container is plain serde-deserializable data;
// the reaction factory turns it into live reactions and distributions.
// Both ACE-style records (log-processed shared grid, half Compton
// profiles) and native-style records (raw grid, full profiles) are
// expressed through the same fields.

use crate::compton_profile::ComptonProfilePolicy;
use crate::interpolation::InterpolationPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Per-subshell data: occupancy, binding energy, Compton profile, and
/// optional subshell-resolved reaction tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubshellRecord {
    /// ENDF subshell designator (1 = K, 2 = L1, ...)
    pub designator: u32,
    pub occupancy: f64,
    /// Binding energy in MeV
    pub binding_energy: f64,
    /// Compton profile momentum grid in me*c units
    pub compton_profile_momentum_grid: Vec<f64>,
    /// Compton profile values in inverse me*c units
    pub compton_profile: Vec<f64>,
    /// Subshell photoelectric cross section (empty when unresolved)
    #[serde(default)]
    pub photoelectric_cross_section: Vec<f64>,
    #[serde(default)]
    pub photoelectric_threshold_index: usize,
    /// Subshell incoherent cross section for the impulse approximation
    /// (empty when unresolved)
    #[serde(default)]
    pub incoherent_cross_section: Vec<f64>,
    #[serde(default)]
    pub incoherent_threshold_index: usize,
}

/// One relaxation transition record for a vacancy subshell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxationTransitionRecord {
    /// Designator of the shell the filling electron falls from
    pub primary_designator: u32,
    /// Designator of the Auger electron's shell; None for radiative
    #[serde(default)]
    pub secondary_designator: Option<u32>,
    pub probability: f64,
    /// Emission energy in MeV
    pub emission_energy: f64,
}

/// Complete photoatomic record for one atom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoatomicDataContainer {
    pub atom_name: String,
    pub atomic_number: u32,
    pub atomic_weight: f64,

    /// Shared energy grid in MeV, or its processed transform when
    /// `processed` is set (ACE-style records)
    pub energy_grid: Vec<f64>,
    pub interpolation: InterpolationPolicy,
    #[serde(default)]
    pub processed: bool,

    pub incoherent_cross_section: Vec<f64>,
    #[serde(default)]
    pub incoherent_threshold_index: usize,

    pub coherent_cross_section: Vec<f64>,
    #[serde(default)]
    pub coherent_threshold_index: usize,

    pub photoelectric_cross_section: Vec<f64>,
    #[serde(default)]
    pub photoelectric_threshold_index: usize,

    pub pair_production_cross_section: Vec<f64>,
    #[serde(default)]
    pub pair_production_threshold_index: usize,

    #[serde(default)]
    pub heating_cross_section: Vec<f64>,
    #[serde(default)]
    pub heating_threshold_index: usize,

    /// Incoherent scattering function S(x), argument in inverse cm
    pub scattering_function_grid: Vec<f64>,
    pub scattering_function: Vec<f64>,

    /// Squared coherent form factor against squared argument
    pub form_factor_squared_grid: Vec<f64>,
    pub form_factor_squared: Vec<f64>,

    /// Table layout of the per-subshell Compton profiles
    pub compton_profile_policy: ComptonProfilePolicy,
    pub subshells: Vec<SubshellRecord>,

    /// Relaxation transition tables keyed by vacancy designator;
    /// empty when the library carries no relaxation data
    #[serde(default)]
    pub relaxation_transitions: BTreeMap<u32, Vec<RelaxationTransitionRecord>>,
}

impl PhotoatomicDataContainer {
    /// Load a container from a JSON record produced by a data library
    /// reader
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let container: PhotoatomicDataContainer = serde_json::from_reader(reader)?;
        Ok(container)
    }

    pub fn from_json_str(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(serde_json::from_str(json)?)
    }
}
