//! Closed-form reference values and monotonicity of the forward model.

use langmuir_core::common::{PhysicalConstants, ProbeGeometry, SimulationConfig};
use langmuir_core::modules::simulate::{
    electron_saturation_current, ion_saturation_current, plasma_potential, simulate,
};
use std::f64::consts::PI;

#[test]
fn reference_scenario_matches_hand_computed_values() {
    let constants = PhysicalConstants::default();
    let geometry = ProbeGeometry::default();

    // A_probe = 2 pi r L + pi r^2 for d = 2.5e-3 m, L = 2.75e-4 m.
    let radius: f64 = 1.25e-3;
    let expected_area = 2.0 * PI * radius * 2.75e-4 + PI * radius * radius;
    assert!((geometry.area_m2() - expected_area).abs() <= 1.0e-18);

    // Vp(Te = 1 eV) = ln(sqrt(1.67e-27 / (2 pi 9.11e-31))).
    let expected_vp = (1.67e-27_f64 / (2.0 * PI * 9.11e-31)).sqrt().ln();
    let vp = plasma_potential(1.0, &constants);
    assert!((vp - expected_vp).abs() <= 1.0e-12);
    assert!((vp - 2.838).abs() <= 1.0e-3, "Vp at 1 eV was {vp}");

    // Ie_sat = 0.25 e ne sqrt(8 kb Te_K / (pi me)) A at Te_K = 11600 K.
    let thermal_velocity = (8.0 * 1.38e-23 * 11_600.0 / (PI * 9.11e-31_f64)).sqrt();
    let expected_ie = 0.25 * 1.602e-19 * 1.0e16 * thermal_velocity * expected_area;
    let ie = electron_saturation_current(1.0, 1.0e16, &geometry, &constants);
    assert!(
        ((ie - expected_ie) / expected_ie).abs() <= 1.0e-12,
        "Ie_sat was {ie:.6e}, expected {expected_ie:.6e}"
    );

    // Ii_sat = 0.61 e ni sqrt(kb Te_K / mi) A.
    let bohm_speed = (1.38e-23 * 11_600.0 / 1.67e-27_f64).sqrt();
    let expected_ii = 0.61 * 1.602e-19 * 1.0e16 * bohm_speed * expected_area;
    let ii = ion_saturation_current(1.0, 1.0e16, &geometry, &constants);
    assert!(
        ((ii - expected_ii) / expected_ii).abs() <= 1.0e-12,
        "Ii_sat was {ii:.6e}, expected {expected_ii:.6e}"
    );
}

#[test]
fn saturation_currents_and_vp_grow_monotonically_with_te() {
    let config = SimulationConfig::default();
    let geometry = ProbeGeometry::default();
    let constants = PhysicalConstants::default();

    let te_ladder = [0.1, 0.25, 0.5, 1.0, 2.0];
    let mut previous: Option<(f64, f64, f64)> = None;

    for te in te_ladder {
        let run = simulate(te, &config, &geometry, &constants, 31).expect("simulation");

        if let Some((vp, ie, ii)) = previous {
            assert!(run.vp > vp, "Vp not monotonic at Te = {te}");
            assert!(run.ie_sat > ie, "Ie_sat not monotonic at Te = {te}");
            assert!(run.ii_sat > ii, "Ii_sat not monotonic at Te = {te}");
        }
        previous = Some((run.vp, run.ie_sat, run.ii_sat));
    }
}

#[test]
fn noisy_variant_stays_near_the_theoretical_curve() {
    let config = SimulationConfig::default();
    let geometry = ProbeGeometry::default();
    let constants = PhysicalConstants::default();

    let run = simulate(1.0, &config, &geometry, &constants, 17).expect("simulation");

    // The noisy variant differs from the theoretical curve by the knee
    // artifact, the leakage tails, and the averaged Gaussian noise; all
    // three together stay far below this envelope for the default config.
    let envelope = 2.0e-3;
    for (noisy, clean) in run
        .averaged_noisy
        .current()
        .iter()
        .zip(run.theoretical.current())
    {
        assert!(
            (noisy - clean).abs() <= envelope,
            "noisy sample {noisy:.6e} strayed from theoretical {clean:.6e}"
        );
    }
}
