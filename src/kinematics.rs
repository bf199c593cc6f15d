// Photon scattering kinematics
//
// Relations between incoming/outgoing photon energy, scattering angle
// cosine, and the bound electron momentum projection pz (in me*c
// units). Energies are in MeV throughout.

use crate::constants::ELECTRON_REST_MASS_ENERGY;
use nalgebra::Vector3;

/// Outgoing photon energy for scattering off a free electron at rest
pub fn compton_line_energy(incoming_energy: f64, scattering_angle_cosine: f64) -> f64 {
    debug_assert!(incoming_energy > 0.0);
    debug_assert!((-1.0..=1.0).contains(&scattering_angle_cosine));

    incoming_energy
        / (1.0 + incoming_energy * (1.0 - scattering_angle_cosine) / ELECTRON_REST_MASS_ENERGY)
}

/// Electron momentum projection (me*c units) that produces a given
/// outgoing energy at a given scattering angle
pub fn electron_momentum_projection(
    incoming_energy: f64,
    outgoing_energy: f64,
    scattering_angle_cosine: f64,
) -> f64 {
    debug_assert!(incoming_energy > 0.0);
    debug_assert!(outgoing_energy >= 0.0);
    debug_assert!((-1.0..=1.0).contains(&scattering_angle_cosine));

    let numerator = outgoing_energy - incoming_energy
        + incoming_energy * outgoing_energy * (1.0 - scattering_angle_cosine)
            / ELECTRON_REST_MASS_ENERGY;

    let denominator = (incoming_energy * incoming_energy + outgoing_energy * outgoing_energy
        - 2.0 * incoming_energy * outgoing_energy * scattering_angle_cosine)
        .sqrt();

    numerator / denominator
}

/// Largest momentum projection compatible with ejecting an electron
/// bound with the given energy (outgoing photon energy E - E_b)
pub fn max_electron_momentum_projection(
    incoming_energy: f64,
    binding_energy: f64,
    scattering_angle_cosine: f64,
) -> f64 {
    debug_assert!(incoming_energy >= binding_energy);
    debug_assert!(binding_energy >= 0.0);
    debug_assert!((-1.0..=1.0).contains(&scattering_angle_cosine));

    let energy_diff = incoming_energy - binding_energy;

    let numerator = -binding_energy
        + incoming_energy * energy_diff * (1.0 - scattering_angle_cosine)
            / ELECTRON_REST_MASS_ENERGY;

    let denominator = (2.0 * incoming_energy * energy_diff * (1.0 - scattering_angle_cosine)
        + binding_energy * binding_energy)
        .sqrt();

    numerator / denominator
}

/// Outgoing photon energy Doppler-shifted by a bound electron with
/// momentum projection pz.
///
/// Returns None when the kinematics have no solution for this pz
/// (the energy is not physically attainable at this angle).
pub fn doppler_broadened_energy(
    electron_momentum_projection: f64,
    incoming_energy: f64,
    scattering_angle_cosine: f64,
) -> Option<f64> {
    debug_assert!(incoming_energy > 0.0);
    debug_assert!((-1.0..=1.0).contains(&scattering_angle_cosine));

    let pz = electron_momentum_projection;
    let pz_sq = pz * pz;
    let alpha = 1.0
        + incoming_energy * (1.0 - scattering_angle_cosine) / ELECTRON_REST_MASS_ENERGY;

    // E' solves a quadratic obtained by squaring the pz relation
    let a = pz_sq - alpha * alpha;
    let b = 2.0 * incoming_energy * (alpha - pz_sq * scattering_angle_cosine);
    let c = (pz_sq - 1.0) * incoming_energy * incoming_energy;

    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 || a == 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();

    // Squaring introduced a spurious root; keep the one whose
    // reconstituted pz has the sampled sign. With a < 0 the larger
    // root is (-b - sqrt)/2a.
    let outgoing_energy = if pz >= 0.0 {
        (-b - sqrt_disc) / (2.0 * a)
    } else {
        (-b + sqrt_disc) / (2.0 * a)
    };

    if outgoing_energy.is_finite() {
        Some(outgoing_energy)
    } else {
        None
    }
}

/// Cosine of the ejected electron polar angle relative to the incoming
/// photon direction, from momentum conservation
pub fn ejected_electron_angle_cosine(
    incoming_energy: f64,
    outgoing_energy: f64,
    scattering_angle_cosine: f64,
) -> f64 {
    debug_assert!(incoming_energy > 0.0);
    debug_assert!(outgoing_energy >= 0.0);

    let transfer_momentum = (incoming_energy * incoming_energy
        + outgoing_energy * outgoing_energy
        - 2.0 * incoming_energy * outgoing_energy * scattering_angle_cosine)
        .sqrt();

    if transfer_momentum == 0.0 {
        return 1.0;
    }

    ((incoming_energy - outgoing_energy * scattering_angle_cosine) / transfer_momentum)
        .clamp(-1.0, 1.0)
}

/// Rotate a direction vector to a new direction with cosine mu relative
/// to the original, at azimuthal angle phi
pub fn rotate_direction(direction: &[f64; 3], mu: f64, phi: f64) -> [f64; 3] {
    let u_old = Vector3::new(direction[0], direction[1], direction[2]);
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    // Find a perpendicular vector to u_old
    let perp = if u_old.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(&u_old).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(&u_old).normalize()
    };
    let ortho = u_old.cross(&perp);

    let rotated = mu * u_old + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho;

    [rotated.x, rotated.y, rotated.z]
}
