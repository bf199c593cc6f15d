// Particle banking system
//
// Handles secondary particle queuing during a photon history: Compton
// electrons, pair production electron/positron pairs, and atomic
// relaxation fluorescence/Auger emissions. The transport loop drains
// the queue after the primary history completes. One bank per history,
// never shared across threads.

use crate::particle::Particle;
use std::collections::VecDeque;

/// FIFO queue of secondary particles produced during one history.
pub struct ParticleBank {
    queue: VecDeque<Particle>,
}

impl ParticleBank {
    /// Create a new empty particle bank
    pub fn new() -> Self {
        ParticleBank {
            queue: VecDeque::new(),
        }
    }

    /// Create a particle bank with an initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        ParticleBank {
            queue: VecDeque::with_capacity(capacity),
        }
    }

    /// Bank a secondary particle produced by a reaction
    pub fn bank_secondary(&mut self, particle: Particle) {
        self.queue.push_back(particle);
    }

    /// Get the next particle from the bank for transport
    /// Returns None if the bank is empty
    pub fn pop_particle(&mut self) -> Option<Particle> {
        self.queue.pop_front()
    }

    /// Check if the bank is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get the number of particles in the bank
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Clear all particles from the bank
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Iterate over banked particles without draining them
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.queue.iter()
    }
}

impl Default for ParticleBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleKind;

    #[test]
    fn test_particle_bank_fifo() {
        let mut bank = ParticleBank::new();
        assert!(bank.is_empty());
        assert_eq!(bank.len(), 0);

        bank.bank_secondary(Particle::new_electron(
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            0.4,
        ));
        bank.bank_secondary(Particle::new_photon(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            0.511,
        ));
        assert_eq!(bank.len(), 2);

        // Electron was banked first (FIFO)
        let p1 = bank.pop_particle().unwrap();
        assert_eq!(p1.kind, ParticleKind::Electron);
        assert_eq!(p1.energy, 0.4);

        let p2 = bank.pop_particle().unwrap();
        assert_eq!(p2.kind, ParticleKind::Photon);
        assert_eq!(p2.energy, 0.511);

        assert!(bank.pop_particle().is_none());
        assert!(bank.is_empty());
    }

    #[test]
    fn test_particle_bank_with_capacity() {
        let bank = ParticleBank::with_capacity(100);
        assert!(bank.is_empty());
        assert!(bank.queue.capacity() >= 100);
    }

    #[test]
    fn test_particle_bank_clear() {
        let mut bank = ParticleBank::new();
        for _ in 0..3 {
            bank.bank_secondary(Particle::new_photon(
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
                1.0,
            ));
        }
        assert_eq!(bank.len(), 3);

        bank.clear();
        assert!(bank.is_empty());
        assert_eq!(bank.len(), 0);
    }
}
