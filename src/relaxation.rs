// Atomic relaxation
//
// After a vacancy is created (photoelectric absorption or incoherent
// scattering), the atom relaxes by filling the hole from an outer
// shell. Radiative transitions emit a fluorescence photon; non-radiative
// transitions eject an Auger electron and leave a second vacancy. The
// cascade continues until no transition data exists for the open
// vacancies.

use crate::bank::ParticleBank;
use crate::particle::Particle;
use crate::subshell::Subshell;
use rand::Rng;
use rand_distr::{Distribution, UnitSphere};
use std::collections::{BTreeMap, VecDeque};

/// One way a vacancy in a given subshell can be filled.
#[derive(Debug, Clone)]
pub struct SubshellRelaxationTransition {
    /// Shell the filling electron falls from (new vacancy)
    pub primary_shell: Subshell,
    /// Shell the Auger electron leaves from; None for radiative
    /// (fluorescence) transitions
    pub secondary_shell: Option<Subshell>,
    pub probability: f64,
    /// Energy of the emitted photon or Auger electron (MeV)
    pub emission_energy: f64,
}

/// Transition table for vacancies in one subshell.
#[derive(Debug, Clone)]
pub struct SubshellRelaxationTable {
    transitions: Vec<SubshellRelaxationTransition>,
    cdf: Vec<f64>,
}

impl SubshellRelaxationTable {
    /// Panics on an empty table, non-positive probabilities, or
    /// negative emission energies.
    pub fn new(transitions: Vec<SubshellRelaxationTransition>) -> Self {
        if transitions.is_empty() {
            panic!("relaxation table requires at least one transition");
        }
        for t in &transitions {
            if !(t.probability > 0.0) {
                panic!(
                    "relaxation transition probability must be positive (got {})",
                    t.probability
                );
            }
            if !(t.emission_energy >= 0.0) || !t.emission_energy.is_finite() {
                panic!(
                    "relaxation transition emission energy is invalid ({})",
                    t.emission_energy
                );
            }
        }

        let total: f64 = transitions.iter().map(|t| t.probability).sum();
        let mut cdf = Vec::with_capacity(transitions.len());
        let mut running = 0.0;
        for t in &transitions {
            running += t.probability / total;
            cdf.push(running);
        }
        *cdf.last_mut().unwrap() = 1.0;

        SubshellRelaxationTable { transitions, cdf }
    }

    pub fn sample_transition<R: Rng + ?Sized>(&self, rng: &mut R) -> &SubshellRelaxationTransition {
        let xi = rng.gen::<f64>();
        let index = match self.cdf.binary_search_by(|v| v.partial_cmp(&xi).unwrap()) {
            Ok(i) => i,
            Err(i) => i.min(self.transitions.len() - 1),
        };
        &self.transitions[index]
    }
}

/// Detailed cascade model with per-subshell transition tables.
pub struct DetailedAtomicRelaxationModel {
    tables: BTreeMap<Subshell, SubshellRelaxationTable>,
}

impl DetailedAtomicRelaxationModel {
    pub fn new(tables: BTreeMap<Subshell, SubshellRelaxationTable>) -> Self {
        DetailedAtomicRelaxationModel { tables }
    }

    fn relax<R: Rng + ?Sized>(
        &self,
        vacancy: Subshell,
        position: [f64; 3],
        bank: &mut ParticleBank,
        rng: &mut R,
    ) {
        let mut vacancies = VecDeque::new();
        vacancies.push_back(vacancy);

        while let Some(shell) = vacancies.pop_front() {
            let table = match self.tables.get(&shell) {
                Some(table) => table,
                // Outermost shells carry no transition data
                None => continue,
            };

            let transition = table.sample_transition(rng);

            if transition.emission_energy > 0.0 {
                let direction = sample_isotropic_direction(rng);
                let emitted = match transition.secondary_shell {
                    None => Particle::new_photon(position, direction, transition.emission_energy),
                    Some(_) => {
                        Particle::new_electron(position, direction, transition.emission_energy)
                    }
                };
                bank.bank_secondary(emitted);
            }

            vacancies.push_back(transition.primary_shell);
            if let Some(secondary) = transition.secondary_shell {
                vacancies.push_back(secondary);
            }
        }
    }
}

/// Relaxation treatment selected when the atom is built.
pub enum AtomicRelaxationModel {
    /// Vacancies are ignored
    Void,
    Detailed(DetailedAtomicRelaxationModel),
}

impl AtomicRelaxationModel {
    /// Relax the atom after a vacancy was created, banking any emitted
    /// fluorescence photons and Auger electrons
    pub fn relax_atom<R: Rng + ?Sized>(
        &self,
        vacancy: Subshell,
        position: [f64; 3],
        bank: &mut ParticleBank,
        rng: &mut R,
    ) {
        match self {
            AtomicRelaxationModel::Void => {}
            AtomicRelaxationModel::Detailed(model) => {
                if vacancy.is_valid() {
                    model.relax(vacancy, position, bank, rng);
                }
            }
        }
    }
}

fn sample_isotropic_direction<R: Rng + ?Sized>(rng: &mut R) -> [f64; 3] {
    UnitSphere.sample(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn k_shell_model() -> DetailedAtomicRelaxationModel {
        // K vacancy: radiative fill from L1, or Auger with L1/L2 holes.
        // L1 vacancies relax radiatively from M1; L2 and M1 have no data.
        let mut tables = BTreeMap::new();
        tables.insert(
            Subshell::K,
            SubshellRelaxationTable::new(vec![
                SubshellRelaxationTransition {
                    primary_shell: Subshell::L1,
                    secondary_shell: None,
                    probability: 0.6,
                    emission_energy: 7.0e-2,
                },
                SubshellRelaxationTransition {
                    primary_shell: Subshell::L1,
                    secondary_shell: Some(Subshell::L2),
                    probability: 0.4,
                    emission_energy: 5.5e-2,
                },
            ]),
        );
        tables.insert(
            Subshell::L1,
            SubshellRelaxationTable::new(vec![SubshellRelaxationTransition {
                primary_shell: Subshell::M1,
                secondary_shell: None,
                probability: 1.0,
                emission_energy: 1.0e-2,
            }]),
        );
        DetailedAtomicRelaxationModel::new(tables)
    }

    #[test]
    fn test_void_model_banks_nothing() {
        let model = AtomicRelaxationModel::Void;
        let mut bank = ParticleBank::new();
        let mut rng = StdRng::seed_from_u64(1);

        model.relax_atom(Subshell::K, [0.0; 3], &mut bank, &mut rng);
        assert!(bank.is_empty());
    }

    #[test]
    fn test_detailed_cascade_banks_products() {
        let model = AtomicRelaxationModel::Detailed(k_shell_model());
        let mut rng = StdRng::seed_from_u64(42);

        let mut saw_photon = false;
        let mut saw_electron = false;

        for _ in 0..200 {
            let mut bank = ParticleBank::new();
            model.relax_atom(Subshell::K, [1.0, 2.0, 3.0], &mut bank, &mut rng);

            // Every K vacancy produces at least the K emission plus the
            // L1 cascade emission
            assert!(bank.len() >= 2, "bank had {} particles", bank.len());

            for p in bank.iter() {
                assert!(p.energy > 0.0);
                assert_eq!(p.position, [1.0, 2.0, 3.0]);
                match p.kind {
                    ParticleKind::Photon => saw_photon = true,
                    ParticleKind::Electron => saw_electron = true,
                    ParticleKind::Positron => panic!("relaxation emitted a positron"),
                }
            }
        }

        assert!(saw_photon);
        assert!(saw_electron);
    }

    #[test]
    fn test_vacancy_without_data_is_ignored() {
        let model = AtomicRelaxationModel::Detailed(k_shell_model());
        let mut bank = ParticleBank::new();
        let mut rng = StdRng::seed_from_u64(9);

        model.relax_atom(Subshell::Q3, [0.0; 3], &mut bank, &mut rng);
        assert!(bank.is_empty());
    }

    #[test]
    #[should_panic(expected = "at least one transition")]
    fn test_empty_table_panics() {
        SubshellRelaxationTable::new(Vec::new());
    }
}
