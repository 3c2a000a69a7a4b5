//! Scaling/Langelier assessor (CORE component C8): calcium-carbonate
//! scaling-tendency indices, delegating saturation-state chemistry to
//! C3's [`SpeciationBackend`] trait.

use crate::common::{CorrosionError, CorrosionResult, ProvenanceMetadata};
use crate::speciation::{SolutionInput, SpeciationBackend};

/// Interpretation band for a scaling-tendency index, matching the
/// bands used for the Langelier Saturation Index in
/// `original_source/tools/chemistry/langelier_index.py`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingTendency {
    SevereScaling,
    ModerateScaling,
    MildScaling,
    NearEquilibrium,
    Corrosive,
    SeverelyCorrosive,
}

fn classify_lsi(lsi: f64) -> ScalingTendency {
    if lsi > 2.0 {
        ScalingTendency::SevereScaling
    } else if lsi > 0.5 {
        ScalingTendency::ModerateScaling
    } else if lsi > 0.0 {
        ScalingTendency::MildScaling
    } else if lsi > -0.5 {
        ScalingTendency::NearEquilibrium
    } else if lsi > -2.0 {
        ScalingTendency::Corrosive
    } else {
        ScalingTendency::SeverelyCorrosive
    }
}

/// The four calcium-carbonate scaling indices this assessor computes.
#[derive(Debug, Clone, Copy)]
pub struct ScalingIndices {
    /// Langelier Saturation Index.
    pub lsi: f64,
    /// Ryznar Stability Index.
    pub rsi: f64,
    /// Puckorius Scaling Index.
    pub psi: f64,
    /// Larson-Skold ratio (aggressiveness of Cl-/SO4-2 relative to
    /// HCO3-).
    pub larson_ratio: f64,
    pub tendency: ScalingTendency,
}

fn ion_mg_l(input: &SolutionInput, key: &str) -> Option<f64> {
    input.ion_concentrations_mg_l.get(key).copied()
}

/// Computes the full scaling-index suite for `input`, delegating the
/// calcite saturation index (and therefore the LSI) to `backend`.
/// Requires `Ca2+` and carbonate alkalinity to be present in `input`;
/// returns [`CorrosionError::MissingSpecies`] otherwise rather than
/// guessing a default hardness/alkalinity.
pub fn calculate_scaling_indices(
    input: &SolutionInput,
    backend: &dyn SpeciationBackend,
) -> Result<CorrosionResult<ScalingIndices>, CorrosionError> {
    if ion_mg_l(input, "Ca2+").or_else(|| ion_mg_l(input, "Ca")).is_none() {
        return Err(CorrosionError::MissingSpecies {
            ion: "Ca2+".to_string(),
        });
    }
    if input.alkalinity_mg_l_as_caco3 <= 0.0 {
        return Err(CorrosionError::MissingSpecies {
            ion: "HCO3-/CO3-2 (alkalinity)".to_string(),
        });
    }

    let lsi = backend.saturation_index(input, "Calcite")?;
    let ph_s = input.ph - lsi;
    let rsi = 2.0 * ph_s - input.ph;

    let ph_eq = 1.465 * input.alkalinity_mg_l_as_caco3.log10() + 4.54;
    let psi = 2.0 * ph_s - ph_eq;

    let cl_meq = ion_mg_l(input, "Cl-").unwrap_or(0.0) / 35.45;
    let so4_meq = ion_mg_l(input, "SO4-2").unwrap_or(0.0) / 48.03;
    let hco3_meq = (input.alkalinity_mg_l_as_caco3 / 50.04).max(1e-6);
    let larson_ratio = (cl_meq + so4_meq) / hco3_meq;

    let tendency = classify_lsi(lsi);
    let mut prov = ProvenanceMetadata::calculated("scaling-indices")
        .with_source("Langelier (1936); Ryznar (1944); Puckorius & Brooke (1991); Larson & Skold (1958)");
    if !(6.0..=9.5).contains(&input.ph) {
        prov.warn(format!(
            "input pH {} is outside the typical validated range for these indices",
            input.ph
        ));
    }

    Ok(CorrosionResult::new(
        ScalingIndices {
            lsi,
            rsi,
            psi,
            larson_ratio,
            tendency,
        },
        prov,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speciation::NullSpeciationBackend;
    use std::collections::HashMap;

    fn sample_input() -> SolutionInput {
        let mut ions = HashMap::new();
        ions.insert("Ca2+".to_string(), 80.0);
        ions.insert("Cl-".to_string(), 19000.0);
        ions.insert("SO4-2".to_string(), 2700.0);
        SolutionInput {
            ph: 8.1,
            temperature_c: 25.0,
            alkalinity_mg_l_as_caco3: 120.0,
            ion_concentrations_mg_l: ions,
            gas_partial_pressures_atm: HashMap::new(),
        }
    }

    #[test]
    fn missing_calcium_is_an_error_not_a_default() {
        let mut input = sample_input();
        input.ion_concentrations_mg_l.remove("Ca2+");
        let backend = NullSpeciationBackend;
        let err = calculate_scaling_indices(&input, &backend).unwrap_err();
        assert!(matches!(err, CorrosionError::MissingSpecies { .. }));
    }

    #[test]
    fn missing_alkalinity_is_an_error() {
        let mut input = sample_input();
        input.alkalinity_mg_l_as_caco3 = 0.0;
        let backend = NullSpeciationBackend;
        let err = calculate_scaling_indices(&input, &backend).unwrap_err();
        assert!(matches!(err, CorrosionError::MissingSpecies { .. }));
    }

    #[test]
    fn null_backend_surfaces_backend_failure_once_species_are_present() {
        let input = sample_input();
        let backend = NullSpeciationBackend;
        let err = calculate_scaling_indices(&input, &backend).unwrap_err();
        assert!(matches!(err, CorrosionError::BackendFailure { .. }));
    }

    #[test]
    fn classification_bands_are_ordered() {
        assert_eq!(classify_lsi(2.5), ScalingTendency::SevereScaling);
        assert_eq!(classify_lsi(-3.0), ScalingTendency::SeverelyCorrosive);
        assert_eq!(classify_lsi(0.0), ScalingTendency::NearEquilibrium);
    }
}
