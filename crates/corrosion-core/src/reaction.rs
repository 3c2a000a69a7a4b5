//! Reaction kinetics (CORE component C5): Eyring exchange-current
//! density, Butler-Volmer activation current, the Nernst equilibrium
//! potential, Koutecky-Levich diffusion-limited combination, and the
//! Newton-Raphson passive-film IR-drop correction.

use crate::common::{CorrosionResult, ProvenanceMetadata, CELSIUS_TO_KELVIN, FARADAY, K_BOLTZMANN, PLANCK_H, R_GAS};

/// Potentiodynamic scan rate assumed when converting an overpotential
/// into an elapsed time for passive-film growth, V/s (0.167 mV/s).
const PASSIVE_FILM_SCAN_RATE_V_S: f64 = 0.167e-3;
const NEWTON_MAX_ITERATIONS: u32 = 50;
const NEWTON_RELATIVE_TOLERANCE: f64 = 1e-6;
const NEWTON_RELAXATION_FACTOR: f64 = 1.001;

/// Eyring-rate-theory exchange current density, A/cm^2:
/// `i0 = z*F*lambda0*exp(-dG/RT)`, `lambda0 = kB*T/h`.
pub fn exchange_current_density(dg_j_mol: f64, z_electrons: f64, temperature_c: f64) -> f64 {
    let t_k = temperature_c + CELSIUS_TO_KELVIN;
    let lambda0 = K_BOLTZMANN * t_k / PLANCK_H;
    z_electrons * FARADAY * lambda0 * (-dg_j_mol / (R_GAS * t_k)).exp()
}

/// Full Butler-Volmer activation current density, A/cm^2, for an
/// overpotential `eta_v` (V, positive = anodic) with symmetry factor
/// `alpha` in `[0, 1]`.
pub fn butler_volmer_current(
    i0_a_cm2: f64,
    eta_v: f64,
    alpha: f64,
    z_electrons: f64,
    temperature_c: f64,
) -> f64 {
    let t_k = temperature_c + CELSIUS_TO_KELVIN;
    let exponent_term = z_electrons * FARADAY / (R_GAS * t_k);
    i0_a_cm2
        * ((alpha * exponent_term * eta_v).exp() - (-(1.0 - alpha) * exponent_term * eta_v).exp())
}

/// Nernst equilibrium potential, V SHE: `E = E0 + (RT/zF)*ln(products/reactants)`.
pub fn nernst_potential(
    e0_v_she: f64,
    z_electrons: f64,
    temperature_c: f64,
    activity_ratio: f64,
) -> f64 {
    let t_k = temperature_c + CELSIUS_TO_KELVIN;
    e0_v_she + (R_GAS * t_k / (z_electrons * FARADAY)) * activity_ratio.ln()
}

/// Levich diffusion-limited current density magnitude, A/cm^2, for a
/// species at bulk concentration `c_g_cm3` (g/cm^3), diffusivity
/// `d_cm2_s` (cm^2/s), across a stagnant layer of thickness `delta_cm`.
pub fn diffusion_limited_current(
    c_g_cm3: f64,
    d_cm2_s: f64,
    delta_cm: f64,
    z_electrons: f64,
    molar_mass_g_mol: f64,
) -> f64 {
    let c_mol_cm3 = c_g_cm3 / molar_mass_g_mol;
    z_electrons * FARADAY * d_cm2_s * c_mol_cm3 / delta_cm
}

/// Koutecky-Levich combination of an activation-controlled current with
/// a diffusion-limited current: `i = i_lim*i_act / (i_act + i_lim)`.
/// Both currents are taken as unsigned magnitudes; the caller reapplies
/// sign/direction.
pub fn koutecky_levich(i_activation: f64, i_limiting: f64) -> f64 {
    if i_activation + i_limiting <= 0.0 {
        return 0.0;
    }
    i_limiting * i_activation / (i_activation + i_limiting)
}

/// Result of the passive-film IR-drop Newton-Raphson correction.
#[derive(Debug, Clone, Copy)]
pub struct FilmCorrectedCurrent {
    pub current_a_cm2: f64,
    pub film_resistance_ohm_cm2: f64,
    pub converged: bool,
    pub iterations: u32,
}

/// Solves `i = i0*exp(C1*(eta - i*R_film))` for `i` by Newton-Raphson,
/// where the passive-film resistance `R_film` itself grows with the
/// elapsed scan time implied by `eta` at
/// [`PASSIVE_FILM_SCAN_RATE_V_S`]. If the iteration has not converged
/// to [`NEWTON_RELATIVE_TOLERANCE`] within [`NEWTON_MAX_ITERATIONS`],
/// `R_film` is relaxed by [`NEWTON_RELAXATION_FACTOR`] and the
/// iteration is retried once before giving up and reporting
/// `converged = false` with the best estimate found.
pub fn passive_film_corrected_current(
    i0_a_cm2: f64,
    eta_v: f64,
    alpha: f64,
    z_electrons: f64,
    temperature_c: f64,
    oxide_molar_mass_g_mol: f64,
    oxide_density_g_cm3: f64,
    oxide_resistivity_ohm_cm: f64,
) -> CorrosionResult<FilmCorrectedCurrent> {
    let t_k = temperature_c + CELSIUS_TO_KELVIN;
    let c1 = alpha * z_electrons * FARADAY / (R_GAS * t_k);

    let time_s = (eta_v.abs() / PASSIVE_FILM_SCAN_RATE_V_S).max(1.0);
    let film_thickness_cm =
        i0_a_cm2.abs() * oxide_molar_mass_g_mol * time_s / (z_electrons * FARADAY * oxide_density_g_cm3);
    let mut r_film = oxide_resistivity_ohm_cm * film_thickness_cm;

    let mut prov = ProvenanceMetadata::calculated("newton-raphson-passive-film-correction")
        .with_assumption("film thickness grows linearly with elapsed scan time at 0.167 mV/s");

    for attempt in 0..2 {
        let (current, converged, iterations) = newton_raphson_current(i0_a_cm2, eta_v, c1, r_film);
        if converged || attempt == 1 {
            if !converged {
                prov.warn(format!(
                    "passive-film correction did not converge within {NEWTON_MAX_ITERATIONS} \
                     iterations even after a {NEWTON_RELAXATION_FACTOR}x relaxation; \
                     reporting the best estimate found"
                ));
            }
            return CorrosionResult::new(
                FilmCorrectedCurrent {
                    current_a_cm2: current,
                    film_resistance_ohm_cm2: r_film,
                    converged,
                    iterations,
                },
                prov,
            );
        }
        r_film *= NEWTON_RELAXATION_FACTOR;
    }
    unreachable!("loop always returns on attempt == 1");
}

fn newton_raphson_current(i0: f64, eta: f64, c1: f64, r_film: f64) -> (f64, bool, u32) {
    let mut i = i0;
    for iteration in 1..=NEWTON_MAX_ITERATIONS {
        let r_correct = (c1 * (eta - i * r_film)).exp();
        let residual = i - i0 * r_correct;
        let derivative = 1.0 + i0 * c1 * r_film * r_correct;
        let step = residual / derivative;
        let next = i - step;
        let relative_change = if next.abs() > 0.0 {
            (step / next).abs()
        } else {
            step.abs()
        };
        i = next;
        if relative_change < NEWTON_RELATIVE_TOLERANCE {
            return (i, true, iteration);
        }
    }
    (i, false, NEWTON_MAX_ITERATIONS)
}

/// Number of evenly spaced potentials in a [`PolarizationCurve`]'s grid.
pub const POLARIZATION_GRID_POINTS: usize = 500;

/// A sampled potentiodynamic scan: an applied-potential grid (V vs SHE,
/// this crate's internal convention) with net anodic, net cathodic, and
/// net total current density at each point. Built once per material
/// state by sampling its closed-form Butler-Volmer response, then
/// queried at arbitrary potentials by Catmull-Rom cubic interpolation.
#[derive(Debug, Clone)]
pub struct PolarizationCurve {
    potentials_v_she: Vec<f64>,
    anodic_a_cm2: Vec<f64>,
    cathodic_a_cm2: Vec<f64>,
    total_a_cm2: Vec<f64>,
}

impl PolarizationCurve {
    /// Builds a curve over `[min_v, max_v]` with [`POLARIZATION_GRID_POINTS`]
    /// evenly spaced points. `current_at` is called once per grid point
    /// and must return `(anodic, cathodic)` current density (A/cm^2),
    /// summed within this crate's reaction-kind buckets (see
    /// `mixed_potential::anodic_cathodic_split`), not split by
    /// instantaneous sign.
    pub fn sample(min_v: f64, max_v: f64, mut current_at: impl FnMut(f64) -> (f64, f64)) -> Self {
        let n = POLARIZATION_GRID_POINTS;
        let step = (max_v - min_v) / (n - 1) as f64;
        let mut potentials_v_she = Vec::with_capacity(n);
        let mut anodic_a_cm2 = Vec::with_capacity(n);
        let mut cathodic_a_cm2 = Vec::with_capacity(n);
        let mut total_a_cm2 = Vec::with_capacity(n);
        for i in 0..n {
            let e = min_v + step * i as f64;
            let (anodic, cathodic) = current_at(e);
            potentials_v_she.push(e);
            anodic_a_cm2.push(anodic);
            cathodic_a_cm2.push(cathodic);
            total_a_cm2.push(anodic + cathodic);
        }
        Self {
            potentials_v_she,
            anodic_a_cm2,
            cathodic_a_cm2,
            total_a_cm2,
        }
    }

    pub fn potentials_v_she(&self) -> &[f64] {
        &self.potentials_v_she
    }

    pub fn anodic_a_cm2(&self) -> &[f64] {
        &self.anodic_a_cm2
    }

    pub fn cathodic_a_cm2(&self) -> &[f64] {
        &self.cathodic_a_cm2
    }

    pub fn total_a_cm2(&self) -> &[f64] {
        &self.total_a_cm2
    }

    /// Net total current at an arbitrary potential, cubic-interpolated
    /// between the two nearest grid points. Clamps to the nearest
    /// endpoint value outside `[min_v, max_v]`.
    pub fn interpolate_total(&self, e_v_she: f64) -> f64 {
        Self::interpolate(&self.potentials_v_she, &self.total_a_cm2, e_v_she)
    }

    /// Net anodic-branch current at an arbitrary potential, same
    /// interpolation as [`Self::interpolate_total`].
    pub fn interpolate_anodic(&self, e_v_she: f64) -> f64 {
        Self::interpolate(&self.potentials_v_she, &self.anodic_a_cm2, e_v_she)
    }

    fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
        let n = xs.len();
        if x <= xs[0] {
            return ys[0];
        }
        if x >= xs[n - 1] {
            return ys[n - 1];
        }
        let idx = match xs.binary_search_by(|probe| probe.partial_cmp(&x).unwrap()) {
            Ok(i) => return ys[i],
            Err(i) => i - 1,
        };
        let i0 = idx.saturating_sub(1);
        let i1 = idx;
        let i2 = (idx + 1).min(n - 1);
        let i3 = (idx + 2).min(n - 1);
        let t = (x - xs[i1]) / (xs[i2] - xs[i1]);
        catmull_rom(ys[i0], ys[i1], ys[i2], ys[i3], t)
    }
}

fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_current_density_increases_as_dg_decreases() {
        let low_barrier = exchange_current_density(20_000.0, 2.0, 25.0);
        let high_barrier = exchange_current_density(60_000.0, 2.0, 25.0);
        assert!(low_barrier > high_barrier);
    }

    #[test]
    fn butler_volmer_is_odd_in_overpotential_at_symmetric_alpha() {
        let i0 = 1e-6;
        let forward = butler_volmer_current(i0, 0.1, 0.5, 2.0, 25.0);
        let backward = butler_volmer_current(i0, -0.1, 0.5, 2.0, 25.0);
        assert!((forward + backward).abs() < 1e-12);
    }

    #[test]
    fn koutecky_levich_is_bounded_by_both_currents() {
        let combined = koutecky_levich(10.0, 2.0);
        assert!(combined < 10.0 && combined < 2.0);
    }

    #[test]
    fn koutecky_levich_handles_zero_currents() {
        assert_eq!(koutecky_levich(0.0, 0.0), 0.0);
    }

    #[test]
    fn nernst_potential_shifts_with_activity_ratio() {
        let higher = nernst_potential(1.229, 4.0, 25.0, 10.0);
        let lower = nernst_potential(1.229, 4.0, 25.0, 0.1);
        assert!(higher > lower);
    }

    #[test]
    fn passive_film_correction_converges_for_a_typical_case() {
        let result = passive_film_corrected_current(
            1e-7, 0.3, 0.6, 2.0, 25.0, 151.99, 5.22, 50_000e9,
        );
        assert!(result.value.converged);
        assert!(result.value.iterations <= 50);
        assert!(result.value.current_a_cm2.is_finite());
    }

    #[test]
    fn polarization_curve_grid_has_the_expected_point_count_and_bounds() {
        let curve = PolarizationCurve::sample(-1.5, 0.5, |e| (e.max(0.0), e.min(0.0)));
        assert_eq!(curve.potentials_v_she().len(), POLARIZATION_GRID_POINTS);
        assert!((curve.potentials_v_she()[0] - (-1.5)).abs() < 1e-9);
        assert!((curve.potentials_v_she()[POLARIZATION_GRID_POINTS - 1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn polarization_curve_interpolation_matches_a_linear_signal_closely() {
        let curve = PolarizationCurve::sample(-1.0, 1.0, |e| (e, 0.0));
        let sample_point = 0.37;
        assert!((curve.interpolate_total(sample_point) - sample_point).abs() < 1e-3);
    }

    #[test]
    fn polarization_curve_interpolation_clamps_outside_the_grid() {
        let curve = PolarizationCurve::sample(-1.0, 1.0, |e| (e, 0.0));
        assert_eq!(curve.interpolate_total(-5.0), curve.total_a_cm2()[0]);
        assert_eq!(
            curve.interpolate_total(5.0),
            curve.total_a_cm2()[POLARIZATION_GRID_POINTS - 1]
        );
    }
}
