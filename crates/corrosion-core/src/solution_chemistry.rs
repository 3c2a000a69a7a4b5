//! Solution-chemistry properties (CORE component C2): dissolved-oxygen
//! saturation in seawater and NaCl brine transport/equilibrium
//! properties used by the kinetics and mixed-potential components.

use crate::common::{clamp, CorrosionResult, ProvenanceMetadata, CELSIUS_TO_KELVIN};

/// mg O2 per mL O2 gas at STP, used to convert the Weiss (1970)
/// correlation's ml/L output to mg/L.
const O2_ML_PER_L_TO_MG_PER_L: f64 = 1.42905;
/// mg O2 per micromole, used to convert the Garcia-Benson (1992)
/// correlation's umol/kg output to mg/L (density taken as 1 kg/L, valid
/// within the dilute-to-seawater range this crate targets).
const O2_UMOL_PER_KG_TO_MG_PER_L: f64 = 0.032;

/// Weiss (1970) dissolved-oxygen saturation correlation.
///
/// `temperature_c` in degrees Celsius, `salinity_psu` in practical
/// salinity units. Returns saturation concentration in mg/L.
pub fn do_saturation_weiss_1970(temperature_c: f64, salinity_psu: f64) -> CorrosionResult<f64> {
    const A1: f64 = -173.4292;
    const A2: f64 = 249.6339;
    const A3: f64 = 143.3483;
    const A4: f64 = -21.8492;
    const B1: f64 = -0.033096;
    const B2: f64 = 0.014259;
    const B3: f64 = -0.0017000;

    let t_k = temperature_c + CELSIUS_TO_KELVIN;
    let t100 = t_k / 100.0;
    let ln_c = A1
        + A2 * (100.0 / t_k)
        + A3 * t100.ln()
        + A4 * t100
        + salinity_psu * (B1 + B2 * t100 + B3 * t100 * t100);
    let c_ml_per_l = ln_c.exp();
    let value = c_ml_per_l * O2_ML_PER_L_TO_MG_PER_L;

    let mut prov = ProvenanceMetadata::calculated("weiss-1970-do-saturation")
        .with_source("Weiss, R.F. (1970), Deep-Sea Research 17(4):721-735")
        .with_assumption("one standard atmosphere, no pressure correction applied here");
    if !(0.0..=40.0).contains(&temperature_c) {
        prov.warn(format!(
            "temperature {temperature_c} C is outside the correlation's validated 0-40 C range"
        ));
    }
    CorrosionResult::new(value, prov)
}

/// Garcia & Benson (1992) dissolved-oxygen saturation correlation, the
/// recommended default model (supersedes Weiss 1970 for most seawater
/// conditions).
///
/// `temperature_c` in degrees Celsius, `salinity_psu` in practical
/// salinity units. Returns saturation concentration in mg/L.
pub fn do_saturation_garcia_benson_1992(
    temperature_c: f64,
    salinity_psu: f64,
) -> CorrosionResult<f64> {
    const A: [f64; 6] = [2.00907, 3.22014, 4.05010, 4.94457, -0.256847, 3.88767];
    const B: [f64; 4] = [-6.24523e-3, -7.37614e-3, -1.03410e-2, -8.17083e-3];
    const C0: f64 = -4.88682e-7;

    let ts = ((298.15 - temperature_c) / (CELSIUS_TO_KELVIN + temperature_c)).ln();
    let mut poly_a = 0.0;
    for (i, a) in A.iter().enumerate() {
        poly_a += a * ts.powi(i as i32);
    }
    let mut poly_b = 0.0;
    for (i, b) in B.iter().enumerate() {
        poly_b += b * ts.powi(i as i32);
    }
    let ln_c = poly_a + salinity_psu * poly_b + C0 * salinity_psu * salinity_psu;
    let c_umol_per_kg = ln_c.exp();
    let value = c_umol_per_kg * O2_UMOL_PER_KG_TO_MG_PER_L;

    let mut prov = ProvenanceMetadata::calculated("garcia-benson-1992-do-saturation")
        .with_source("Garcia, H.E. & Gordon, L.I. (1992), Limnology and Oceanography 37(6):1307-1312")
        .with_assumption("solution density of 1 kg/L used to convert umol/kg to mg/L");
    if !(0.0..=40.0).contains(&temperature_c) {
        prov.warn(format!(
            "temperature {temperature_c} C is outside the correlation's validated 0-40 C range"
        ));
    }
    CorrosionResult::new(value, prov)
}

/// Dispatches to [`do_saturation_garcia_benson_1992`] (the recommended
/// default) or [`do_saturation_weiss_1970`], then applies
/// [`pressure_correction`].
pub fn do_saturation(
    temperature_c: f64,
    salinity_psu: f64,
    pressure_atm: f64,
    use_weiss: bool,
) -> CorrosionResult<f64> {
    let mut base = if use_weiss {
        do_saturation_weiss_1970(temperature_c, salinity_psu)
    } else {
        do_saturation_garcia_benson_1992(temperature_c, salinity_psu)
    };
    let correction = pressure_correction(temperature_c, pressure_atm);
    base.value *= correction;
    base.provenance = base
        .provenance
        .with_assumption("pressure-corrected via the Antoine vapor-pressure / barometric model");
    base
}

/// Barometric-pressure / Antoine-vapor-pressure correction factor for a
/// saturation value computed at one standard atmosphere.
///
/// `pressure_atm` is the ambient total pressure in atmospheres.
pub fn pressure_correction(temperature_c: f64, pressure_atm: f64) -> f64 {
    let p_mmhg = pressure_atm * 760.0;
    let u = 10f64.powf(8.10765 - 1750.286 / (235.0 + temperature_c));
    (p_mmhg - u) / (760.0 - u)
}

/// Converts an altitude above sea level (meters) to an ambient pressure
/// in atmospheres via the standard barometric formula, for callers that
/// know elevation rather than measured pressure.
pub fn pressure_from_altitude(altitude_m: f64) -> f64 {
    (-altitude_m / 8500.0).exp()
}

/// Estimates salinity (PSU) from chloride concentration (mg/L), using
/// the standard seawater Cl:salinity mass ratio (35 PSU / 19354 mg/L
/// Cl).
pub fn estimate_salinity_from_chloride(chloride_mg_l: f64) -> f64 {
    chloride_mg_l * (35.0 / 19354.0)
}

/// Estimates salinity (PSU) from total dissolved solids (mg/L), using an
/// empirical TDS-to-salinity conversion factor of 0.65, appropriate for
/// brackish-to-seawater conditions.
pub fn estimate_salinity_from_tds(tds_mg_l: f64) -> f64 {
    tds_mg_l / 1000.0 * 0.65
}

/// Converts a redox potential (V, SHE) to an equivalent dissolved-oxygen
/// concentration via the Nernst equation for the O2/H2O couple, or the
/// inverse, clamping the DO value away from zero to avoid a logarithm
/// singularity (see [`crate::common::DO_EPSILON_G_CM3`]).
pub fn redox_to_do(eh_v_she: f64, temperature_c: f64, ph: f64) -> CorrosionResult<f64> {
    use crate::common::{FARADAY, R_GAS};
    const E0_O2_SHE: f64 = 1.229;
    let t_k = temperature_c + CELSIUS_TO_KELVIN;
    // O2 + 4H+ + 4e- -> 2H2O; ln(PO2) term folded into DO via Henry's
    // law is out of scope here, this reports the driving DO activity
    // implied purely by the electrode potential and pH.
    let exponent = 4.0 * FARADAY * (eh_v_she - E0_O2_SHE + 0.0591 * ph) / (R_GAS * t_k);
    let do_g_cm3 = exponent.exp();
    let mut prov = ProvenanceMetadata::calculated("nernst-redox-to-do");
    let value = if do_g_cm3 < crate::common::DO_EPSILON_G_CM3 {
        prov.warn(format!(
            "computed DO {do_g_cm3:e} g/cm3 below the {:e} g/cm3 floor; clamped",
            crate::common::DO_EPSILON_G_CM3
        ));
        crate::common::DO_EPSILON_G_CM3
    } else {
        do_g_cm3
    };
    CorrosionResult::new(value, prov)
}

/// Inverse of [`redox_to_do`]: the redox potential implied by a given
/// dissolved-oxygen concentration.
pub fn do_to_redox(do_g_cm3: f64, temperature_c: f64, ph: f64) -> CorrosionResult<f64> {
    use crate::common::{FARADAY, R_GAS};
    const E0_O2_SHE: f64 = 1.229;
    let t_k = temperature_c + CELSIUS_TO_KELVIN;
    let do_clamped = do_g_cm3.max(crate::common::DO_EPSILON_G_CM3);
    let mut prov = ProvenanceMetadata::calculated("nernst-do-to-redox");
    if do_g_cm3 < crate::common::DO_EPSILON_G_CM3 {
        prov.warn(format!(
            "input DO {do_g_cm3:e} g/cm3 below the {:e} g/cm3 floor; clamped before use",
            crate::common::DO_EPSILON_G_CM3
        ));
    }
    let value = E0_O2_SHE - 0.0591 * ph + (R_GAS * t_k / (4.0 * FARADAY)) * do_clamped.ln();
    CorrosionResult::new(value, prov)
}

/// `(b0 + b1*x) / (1 + b2*x)`, the rational form shared by every
/// temperature-dependent parameter in the NaCl Stokes-model diffusivity
/// correlation below.
fn linear_linear(b: [f64; 3], x: f64) -> f64 {
    (b[0] + b[1] * x) / (1.0 + b[2] * x)
}

/// Wilke-Chang association parameter for water as solvent.
const WILKE_CHANG_PHI_WATER: f64 = 2.6;
/// Molar volume of O2 at its normal boiling point, cm^3/mol.
const V_O2_CM3_PER_MOL: f64 = 25.6;
/// Molar mass of water, g/mol.
const M_WATER: f64 = 18.015;

/// NaCl-brine-specific properties needed by the reaction-kinetics and
/// mixed-potential components: dissolved-oxygen concentration,
/// oxygen diffusivity, solution resistivity, and water activity, all at
/// a fixed temperature and NaCl molality.
#[derive(Debug, Clone, Copy)]
pub struct NaClSolution {
    /// Dissolved-oxygen concentration, g/cm^3.
    pub c_o2: f64,
    /// Oxygen diffusivity, cm^2/s.
    pub d_o2: f64,
    /// Solution resistivity, ohm*m (reciprocal of conductivity).
    pub rho_nacl: f64,
    /// Water activity (dimensionless).
    pub a_water: f64,
}

impl NaClSolution {
    /// Builds the brine-property bundle for a NaCl molality (mol/kg
    /// water) at the given temperature and ambient O2 partial pressure
    /// (atm, default 0.21 for air-saturated water).
    pub fn new(molality: f64, temperature_c: f64, po2_atm: f64) -> Self {
        let t_k = temperature_c + CELSIUS_TO_KELVIN;
        NaClSolution {
            c_o2: Self::conc_o2(molality, t_k, po2_atm),
            d_o2: Self::diff_o2(molality, t_k),
            rho_nacl: 1.0 / Self::solution_conductivity(molality, temperature_c),
            a_water: Self::water_activity(molality),
        }
    }

    /// Henry's-law O2 solubility in NaCl brine via a salting-out
    /// correlation: `ln(H) = a1/T + b1 + c1*ln(T) + d1*T`, with a
    /// molality-dependent correction term of the same shape plus a
    /// quadratic salting-out coefficient `d3`.
    fn conc_o2(molality: f64, t_k: f64, po2_atm: f64) -> f64 {
        const A1: f64 = 31820.0;
        const B1: f64 = -229.9;
        const C1: f64 = -19.12;
        const D1: f64 = 0.3081;
        const A2: f64 = -1409.0;
        const B2: f64 = 10.4;
        const C2: f64 = 0.8628;
        const D2: f64 = -0.0005235;
        const D3: f64 = 0.07464;

        let ln_h_water = A1 / t_k + B1 + C1 * t_k.ln() + D1 * t_k;
        let ln_h_salt_term = A2 / t_k + B2 + C2 * t_k.ln() + D2 * t_k;
        let ln_h = ln_h_water + molality * ln_h_salt_term + D3 * molality * molality;
        // H is expressed as atm per mole fraction; invert to a mole
        // fraction, then to g/cm^3 assuming dilute brine density ~1 g/cm^3.
        let h = ln_h.exp();
        let x_o2 = po2_atm / h;
        let moles_water_per_cm3 = 1.0 / (M_WATER / 1000.0);
        x_o2 * moles_water_per_cm3 * 32.0 / 1000.0
    }

    /// O2 diffusivity via the Wilke-Chang correlation with a
    /// temperature- and molality-dependent relative-viscosity
    /// correction, each parameterized through [`linear_linear`].
    fn diff_o2(molality: f64, t_k: f64) -> f64 {
        // Relative-viscosity correction rows, one per decade of
        // molality-weighted Stokes-radius adjustment; in the absence of
        // salt this reduces to pure water viscosity at `t_k`.
        const VISCOSITY_ROWS: [[f64; 3]; 6] = [
            [1.0, 0.0755, 0.0274],
            [1.0, 0.0821, 0.0312],
            [1.0, 0.0891, 0.0354],
            [1.0, 0.0958, 0.0398],
            [1.0, 0.1020, 0.0441],
            [1.0, 0.1086, 0.0487],
        ];
        let t_c = t_k - CELSIUS_TO_KELVIN;
        let row_width = 100.0 / (VISCOSITY_ROWS.len() as f64 - 1.0);
        let idx = ((t_c / row_width).floor() as usize).min(VISCOSITY_ROWS.len() - 2);
        let frac = (t_c - idx as f64 * row_width) / row_width;
        let lo = linear_linear(VISCOSITY_ROWS[idx], molality);
        let hi = linear_linear(VISCOSITY_ROWS[idx + 1], molality);
        let relative_viscosity = lo + (hi - lo) * clamp(frac, 0.0, 1.0);

        let water_viscosity_cp = 2.414e-2 * 10f64.powf(247.8 / (t_k - 140.0));
        let viscosity_cp = water_viscosity_cp * relative_viscosity;

        // Wilke-Chang: D [cm^2/s] = 7.4e-8 * sqrt(phi*M) * T / (mu * V^0.6)
        7.4e-8 * (WILKE_CHANG_PHI_WATER * M_WATER).sqrt() * t_k
            / (viscosity_cp * V_O2_CM3_PER_MOL.powf(0.6))
    }

    /// NaCl solution electrical conductivity, S/m, via a Wadsworth
    /// (2012)-style polynomial in temperature and molality.
    fn solution_conductivity(molality: f64, temperature_c: f64) -> f64 {
        const LAMBDA0: [f64; 3] = [126.45, 0.7, -0.0013];
        const S_TERM: [f64; 3] = [16.32, 0.122, -0.00046];
        const E_TERM: [f64; 3] = [0.95, 0.0041, -0.000011];

        let lambda0 = linear_linear(LAMBDA0, temperature_c);
        let s = linear_linear(S_TERM, temperature_c);
        let e = linear_linear(E_TERM, temperature_c);
        let sqrt_m = molality.max(0.0).sqrt();

        let lambda = lambda0 - s * sqrt_m + e * molality;
        let conductivity_us_cm = lambda * molality;
        (conductivity_us_cm * 1e-6 * 100.0).max(1e-9)
    }

    /// NaCl water activity via an empirical activity-coefficient
    /// correlation: `a_water = gamma(molality)`, where gamma is a
    /// quadratic fit to the NaCl osmotic/activity-coefficient data.
    fn water_activity(molality: f64) -> f64 {
        const C1: f64 = 1.0001;
        const C2: f64 = -0.065634;
        const C3: f64 = -0.033533;
        let gamma = C1 + C2 * molality + C3 * molality * molality;
        clamp(gamma, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garcia_benson_matches_weiss_within_seawater_tolerance() {
        let gb = do_saturation_garcia_benson_1992(25.0, 35.0).value;
        let weiss = do_saturation_weiss_1970(25.0, 35.0).value;
        assert!(
            (gb - weiss).abs() / weiss < 0.2,
            "Garcia-Benson {gb} and Weiss {weiss} should agree within 20% at 25C/35 PSU"
        );
        assert!((6.0..=9.0).contains(&gb), "expected ~8 mg/L DO at 25C/35PSU, got {gb}");
    }

    #[test]
    fn pressure_correction_is_identity_at_one_atm_low_vapor_pressure() {
        let corr = pressure_correction(10.0, 1.0);
        assert!((corr - 1.0).abs() < 0.02);
    }

    #[test]
    fn salinity_estimators_agree_at_seawater_chloride() {
        let salinity = estimate_salinity_from_chloride(19354.0);
        assert!((salinity - 35.0).abs() < 1e-6);
    }

    #[test]
    fn redox_do_round_trip() {
        let do_value = 6.0e-6;
        let eh = do_to_redox(do_value, 25.0, 7.0).value;
        let back = redox_to_do(eh, 25.0, 7.0).value;
        assert!((back - do_value).abs() / do_value < 1e-6);
    }

    #[test]
    fn do_below_epsilon_is_clamped_with_a_warning() {
        let result = redox_to_do(-5.0, 25.0, 7.0);
        assert_eq!(result.value, crate::common::DO_EPSILON_G_CM3);
        assert!(!result.provenance.warnings.is_empty());
    }

    #[test]
    fn nacl_solution_properties_are_physically_reasonable() {
        let soln = NaClSolution::new(0.6, 25.0, 0.21);
        assert!(soln.c_o2 > 0.0);
        assert!(soln.d_o2 > 0.0 && soln.d_o2 < 1e-3);
        assert!(soln.rho_nacl > 0.0);
        assert!(soln.a_water > 0.0 && soln.a_water <= 1.0);
    }
}
