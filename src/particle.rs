use serde::{Deserialize, Serialize};

/// Kind of particle tracked during photon transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    #[serde(rename = "photon")]
    Photon,
    #[serde(rename = "electron")]
    Electron,
    #[serde(rename = "positron")]
    Positron,
}

/// Particle state mutated by reactions.
///
/// A reaction's `react()` call only ever touches the particle it is handed
/// (and the bank); reactions themselves stay immutable, which is what makes
/// a shared atom safe to query from many concurrent histories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub kind: ParticleKind,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    /// Energy in MeV
    pub energy: f64,
    /// Number of collisions this particle has undergone
    pub collision_number: u32,
    pub alive: bool,
}

impl Particle {
    pub fn new_photon(position: [f64; 3], direction: [f64; 3], energy: f64) -> Self {
        Particle {
            kind: ParticleKind::Photon,
            position,
            direction,
            energy,
            collision_number: 0,
            alive: true,
        }
    }

    pub fn new_electron(position: [f64; 3], direction: [f64; 3], energy: f64) -> Self {
        Particle {
            kind: ParticleKind::Electron,
            position,
            direction,
            energy,
            collision_number: 0,
            alive: true,
        }
    }

    pub fn new_positron(position: [f64; 3], direction: [f64; 3], energy: f64) -> Self {
        Particle {
            kind: ParticleKind::Positron,
            position,
            direction,
            energy,
            collision_number: 0,
            alive: true,
        }
    }

    /// Mark the particle as absorbed (terminal)
    #[inline]
    pub fn set_gone(&mut self) {
        self.alive = false;
    }

    #[inline]
    pub fn increment_collision_number(&mut self) {
        self.collision_number += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photon_construction() {
        let p = Particle::new_photon([0.0, 1.0, 2.0], [0.0, 0.0, 1.0], 1.0);
        assert_eq!(p.kind, ParticleKind::Photon);
        assert_eq!(p.energy, 1.0);
        assert_eq!(p.collision_number, 0);
        assert!(p.alive);
    }

    #[test]
    fn test_set_gone() {
        let mut p = Particle::new_photon([0.0; 3], [0.0, 0.0, 1.0], 1.0);
        p.set_gone();
        assert!(!p.alive);
    }

    #[test]
    fn test_collision_number() {
        let mut p = Particle::new_photon([0.0; 3], [0.0, 0.0, 1.0], 1.0);
        p.increment_collision_number();
        p.increment_collision_number();
        assert_eq!(p.collision_number, 2);
    }
}
