// Integration tests for Doppler broadening - verifies that the complete
// distribution reproduces the free-electron Klein-Nishina limit and that
// sampled energies cluster around the Compton line for narrow profiles

use photoatomics_for_mc::{
    compton_line_energy, evaluate_klein_nishina, CompleteDopplerBroadenedPhotonEnergyDistribution,
    ComptonProfile, ComptonProfilePolicy, DopplerSubshell, GaussKronrodIntegrator,
    InterpolationPolicy, Subshell,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A nearly free electron: narrow unit-area profile around pz = 0 and a
/// negligible binding energy
fn narrow_profile_distribution(occupancy: f64) -> CompleteDopplerBroadenedPhotonEnergyDistribution {
    let profile = ComptonProfile::new(
        vec![-0.01, 0.0, 0.01],
        vec![0.0, 100.0, 0.0],
        ComptonProfilePolicy::Full,
        InterpolationPolicy::LinLin,
    );

    CompleteDopplerBroadenedPhotonEnergyDistribution::new(vec![DopplerSubshell {
        subshell: Subshell::K,
        occupancy,
        binding_energy: 1e-9,
        profile,
    }])
}

#[test]
fn test_free_electron_limit_matches_klein_nishina() {
    // Integrating the momentum-projection differential over a unit-area
    // profile recovers occupancy times the Klein-Nishina cross section
    let dist = narrow_profile_distribution(2.0);
    let integrator = GaussKronrodIntegrator::new(1e-8);

    for &mu in &[-0.9, -0.3, 0.0, 0.3, 0.9] {
        let (integrated, _) = integrator.integrate_adaptively(
            &|pz| dist.evaluate_subshell_with_momentum_projection(0.5, pz, mu, Subshell::K),
            -0.01,
            0.01,
        );
        let free_electron = 2.0 * evaluate_klein_nishina(0.5, mu);

        let relative_error = (integrated - free_electron).abs() / free_electron;
        assert!(
            relative_error < 1e-4,
            "mu = {}: integrated = {}, free electron = {}",
            mu,
            integrated,
            free_electron
        );
    }
}

#[test]
fn test_narrow_profile_samples_near_compton_line() {
    let dist = narrow_profile_distribution(2.0);
    let mut rng = StdRng::seed_from_u64(314);

    let incoming_energy = 0.5;
    let mu = -0.5;
    let compton_line = compton_line_energy(incoming_energy, mu);

    let n = 5_000;
    let mut mean = 0.0;
    for _ in 0..n {
        let (energy, _) = dist.sample(incoming_energy, mu, &mut rng);
        assert!(energy > 0.0);
        assert!(energy <= incoming_energy);
        mean += energy;
    }
    mean /= n as f64;

    // The profile width of 0.01 me*c shifts the line by well under 1%
    assert!(
        (mean - compton_line).abs() / compton_line < 0.01,
        "mean = {}, compton line = {}",
        mean,
        compton_line
    );
}

#[test]
fn test_sampling_reproducible_with_same_seed() {
    let dist = narrow_profile_distribution(2.0);

    let mut first_rng = StdRng::seed_from_u64(2718);
    let mut second_rng = StdRng::seed_from_u64(2718);

    for _ in 0..100 {
        let (first_energy, first_shell) = dist.sample(1.0, 0.2, &mut first_rng);
        let (second_energy, second_shell) = dist.sample(1.0, 0.2, &mut second_rng);
        assert_eq!(first_energy.to_bits(), second_energy.to_bits());
        assert_eq!(first_shell, second_shell);
    }
}

#[test]
fn test_tight_binding_suppresses_high_outgoing_energies() {
    let profile = ComptonProfile::new(
        vec![-1.0, 0.0, 1.0],
        vec![0.1, 0.9, 0.1],
        ComptonProfilePolicy::Full,
        InterpolationPolicy::LinLin,
    );
    let dist = CompleteDopplerBroadenedPhotonEnergyDistribution::new(vec![DopplerSubshell {
        subshell: Subshell::K,
        occupancy: 2.0,
        binding_energy: 0.1,
        profile,
    }]);

    // The double differential vanishes above E - E_b
    assert_eq!(dist.evaluate(0.5, 0.45, 0.0), 0.0);
    assert!(dist.evaluate(0.5, 0.3, 0.0) > 0.0);

    // Integration respects the same bound
    let integrated = dist.evaluate_integrated_cross_section(0.5, 0.0, 1e-4);
    assert!(integrated > 0.0);
}
