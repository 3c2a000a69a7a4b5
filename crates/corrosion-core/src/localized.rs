//! Localized-corrosion assessor (CORE component C7): pitting and
//! crevice-corrosion susceptibility, with a tabulated/PREN-based Tier 1
//! screen that always runs and a mechanistic Tier 2 check gated on
//! dissolved oxygen and material.

use crate::common::{
    CorrosionError, CorrosionResult, ProvenanceMetadata, CELSIUS_TO_KELVIN, FARADAY, R_GAS,
    SHE_TO_SCE_NRL,
};
use crate::data_store::{get_chloride_threshold, get_cpt_data, get_material_composition};
use crate::material::{Material, ReactionKind};
use crate::reaction::{exchange_current_density, nernst_potential};
use crate::solution_chemistry;

/// Pitting current threshold E_pit is solved for: the potential at
/// which the anodic pitting current reaches this density, per
/// `original_source/utils/pitting_assessment.py`.
const PITTING_CURRENT_THRESHOLD_A_CM2: f64 = 1e-6;
/// Assumed surface concentration of the dissolving metal ion at the
/// pit, mol/L, used to build the pitting reaction's Nernst potential.
const PITTING_SURFACE_ION_CONCENTRATION_M: f64 = 1e-6;

/// Ordered susceptibility classification shared by pitting and crevice
/// assessments; `as u8` gives the rank used for tier-disagreement
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Susceptibility {
    Low,
    Moderate,
    High,
    Critical,
}

fn classify_by_margin(margin_c: f64) -> Susceptibility {
    if margin_c > 20.0 {
        Susceptibility::Low
    } else if margin_c > 10.0 {
        Susceptibility::Moderate
    } else if margin_c >= 0.0 {
        Susceptibility::High
    } else {
        Susceptibility::Critical
    }
}

fn bump_one_level(base: Susceptibility) -> Susceptibility {
    match base {
        Susceptibility::Low => Susceptibility::Moderate,
        Susceptibility::Moderate => Susceptibility::High,
        Susceptibility::High | Susceptibility::Critical => Susceptibility::Critical,
    }
}

fn escalate_if_exceeded(base: Susceptibility, actual: f64, threshold: f64) -> Susceptibility {
    if actual > threshold {
        bump_one_level(base)
    } else {
        base
    }
}

/// PREN-based chloride-threshold correlation used when no ASTM G48 CPT
/// row is available, floored at 10 mg/L (matching
/// `original_source/core/localized_backend.py::_get_base_chloride_threshold`).
fn pren_chloride_threshold(pren: f64) -> f64 {
    10f64.powf((pren - 10.0) / 10.0).max(10.0)
}

/// Tier 1 (always-runs) pitting assessment result.
#[derive(Debug, Clone)]
pub struct PittingTier1 {
    pub margin_c: f64,
    pub chloride_threshold_mg_l: f64,
    pub susceptibility: Susceptibility,
    pub used_astm_g48_data: bool,
}

/// Tier 2 (mechanistic, gated) pitting assessment result. Both
/// potentials are V vs saturated calomel electrode, matching the
/// convention `pitting_assessment.py`'s E_pit/E_mix mechanism is
/// defined in.
#[derive(Debug, Clone, Copy)]
pub struct PittingTier2 {
    pub mixed_potential_v_sce: f64,
    pub pitting_potential_v_sce: f64,
    pub margin_v: f64,
    pub susceptibility: Susceptibility,
}

#[derive(Debug, Clone)]
pub struct PittingResult {
    pub tier1: PittingTier1,
    pub tier2: Option<PittingTier2>,
    pub tier_disagreement: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CreviceResult {
    pub ir_drop_v: f64,
    pub delta_ph: f64,
    pub acidification_factor: f64,
    pub margin_c: f64,
    pub susceptibility: Susceptibility,
}

#[derive(Debug, Clone)]
pub struct LocalizedResult {
    pub pitting: PittingResult,
    pub crevice: CreviceResult,
    pub overall_risk: Susceptibility,
}

/// The three materials the mechanistic Tier 2 pitting check is gated to
/// run on (the NRL subset with a tabulated pitting potential this crate
/// trusts mechanistically); Ti, I625, and CuNi are excluded since their
/// free-corrosion potentials are not validated against this mechanism.
fn tier2_eligible(material: Material) -> bool {
    matches!(material, Material::Hy80 | Material::Hy100 | Material::Ss316)
}

/// Runs the Tier 1 screen, and -- when `material` is Tier-2-eligible and
/// `dissolved_oxygen_g_cm3` is above the crate's DO floor -- the
/// mechanistic Tier 2 check, flagging a tier-disagreement when the two
/// tiers' susceptibility ranks differ by 2 or more.
pub fn assess_pitting(
    material: Material,
    temperature_c: f64,
    chloride_mg_l: f64,
    ph: f64,
    dissolved_oxygen_g_cm3: Option<f64>,
    velocity_m_s: f64,
) -> Result<CorrosionResult<PittingResult>, CorrosionError> {
    let mut prov = ProvenanceMetadata::calculated("localized-corrosion-pitting");

    let cpt = get_cpt_data(material.galvanic_series_name());
    let (margin_c, used_astm_g48_data) = if let Some(cpt) = &cpt {
        (cpt.cpt_c - temperature_c, true)
    } else {
        prov.warn("no ASTM G48 CPT data for this material; falling back to PREN correlation");
        let composition = get_material_composition(material.galvanic_series_name())?;
        let implied_cpt_c = 25.0 + (composition.pren() - 20.0);
        (implied_cpt_c - temperature_c, false)
    };

    let grade_type = material_grade_type(material);
    let chloride_threshold_mg_l = get_chloride_threshold(grade_type, temperature_c, ph)
        .unwrap_or_else(|| {
            let composition = get_material_composition(material.galvanic_series_name())
                .map(|c| c.pren())
                .unwrap_or(16.0);
            pren_chloride_threshold(composition)
        });

    let tier1_susceptibility = escalate_if_exceeded(
        classify_by_margin(margin_c),
        chloride_mg_l,
        chloride_threshold_mg_l,
    );

    let tier1 = PittingTier1 {
        margin_c,
        chloride_threshold_mg_l,
        susceptibility: tier1_susceptibility,
        used_astm_g48_data,
    };

    let mut tier_disagreement = false;
    let tier2 = if tier2_eligible(material) && dissolved_oxygen_g_cm3.is_some() {
        let do_value = dissolved_oxygen_g_cm3.unwrap();
        match mechanistic_tier2(material, temperature_c, chloride_mg_l, ph, do_value, velocity_m_s) {
            Ok(t2) => {
                prov.warnings.extend(t2.provenance.warnings);
                let rank_diff = (t2.value.susceptibility as i32 - tier1_susceptibility as i32).abs();
                if rank_diff >= 2 {
                    tier_disagreement = true;
                    prov.warn(format!(
                        "tier 1 ({tier1_susceptibility:?}) and tier 2 ({:?}) pitting \
                         susceptibility disagree by {rank_diff} ranks",
                        t2.value.susceptibility
                    ));
                }
                Some(t2.value)
            }
            Err(err) => {
                prov.warn(format!("tier 2 mechanistic pitting check failed: {err}"));
                None
            }
        }
    } else {
        None
    };

    Ok(CorrosionResult::new(
        PittingResult {
            tier1,
            tier2,
            tier_disagreement,
        },
        prov,
    ))
}

/// Mechanistic Tier 2 pitting check: solves E_pit from the anodic
/// pitting reaction's NRL Butler-Volmer kinetics via the Nernst
/// potential of the metal/metal-ion couple plus the overpotential
/// needed to reach the pitting current threshold, computes E_mix from
/// dissolved oxygen via the oxygen-electrode Nernst relation, and
/// classifies risk on the four-level margin scheme from
/// `original_source/utils/pitting_assessment.py::assess_pitting_risk_electrochemical`.
fn mechanistic_tier2(
    material: Material,
    temperature_c: f64,
    chloride_mg_l: f64,
    ph: f64,
    dissolved_oxygen_g_cm3: f64,
    velocity_m_s: f64,
) -> Result<CorrosionResult<PittingTier2>, CorrosionError> {
    let e0_metal_ox_v_she = material
        .metal_oxidation_e0_v_she()
        .expect("tier2_eligible materials always have a metal-oxidation Nernst reference");

    let chloride_m = chloride_mg_l / 1000.0 / 35.45;
    let state = material.state_at(chloride_m, temperature_c, ph, velocity_m_s)?;
    let pitting = state.reactions[&ReactionKind::Pitting];
    let alpha = material.alpha(ReactionKind::Pitting);
    let z = pitting.z_electrons;

    let i0_anodic = exchange_current_density(pitting.dg_anodic_j_mol, z, temperature_c);
    let c_products_g_cm3 = PITTING_SURFACE_ION_CONCENTRATION_M * material.metal_mass_g_mol() / 1000.0;
    let e_n_she = nernst_potential(e0_metal_ox_v_she, z, temperature_c, 1.0 / c_products_g_cm3);
    let e_n_vsce = e_n_she - SHE_TO_SCE_NRL;

    let t_k = temperature_c + CELSIUS_TO_KELVIN;
    let eta_pit = (R_GAS * t_k / (alpha * z * FARADAY))
        * (PITTING_CURRENT_THRESHOLD_A_CM2 / i0_anodic).ln();
    let pitting_potential_v_sce = e_n_vsce + eta_pit;

    let e_mix_result = solution_chemistry::do_to_redox(dissolved_oxygen_g_cm3, temperature_c, ph);
    let mixed_potential_v_sce = e_mix_result.value - SHE_TO_SCE_NRL;
    let mut prov = ProvenanceMetadata::calculated("localized-corrosion-pitting-tier2")
        .with_source("NRL Butler-Volmer pitting kinetics + oxygen-electrode Nernst E_mix");
    prov.warnings.extend(e_mix_result.provenance.warnings);

    let margin_v = mixed_potential_v_sce - pitting_potential_v_sce;
    let susceptibility = if margin_v > 0.05 {
        Susceptibility::Critical
    } else if margin_v > 0.0 {
        Susceptibility::High
    } else if margin_v > -0.1 {
        Susceptibility::Moderate
    } else {
        Susceptibility::Low
    };

    Ok(CorrosionResult::new(
        PittingTier2 {
            mixed_potential_v_sce,
            pitting_potential_v_sce,
            margin_v,
            susceptibility,
        },
        prov,
    ))
}

fn material_grade_type(material: Material) -> &'static str {
    match material {
        Material::Hy80 | Material::Hy100 => "hy_steel",
        Material::Ss316 => "austenitic",
        Material::Ti => "titanium",
        Material::I625 => "nickel_alloy",
        Material::CuNi => "copper_nickel",
    }
}

/// Oldfield-Sutton simplified crevice-corrosion assessment: IR drop
/// across the crevice solution resistance, the resulting acidification,
/// and a margin-based susceptibility classification against the ASTM
/// G48 CCT temperature.
pub fn assess_crevice(
    material: Material,
    temperature_c: f64,
    chloride_mg_l: f64,
    ph: f64,
    crevice_gap_m: f64,
    current_density_a_cm2: f64,
) -> CorrosionResult<CreviceResult> {
    let mut prov = ProvenanceMetadata::calculated("localized-corrosion-crevice")
        .with_source("Oldfield & Sutton (1980) crevice-corrosion model");

    let r_solution_ohm_m = 0.2 * (19000.0 / chloride_mg_l.max(100.0));
    let crevice_depth_m = 10.0 * crevice_gap_m;
    let ir_drop_v = current_density_a_cm2 * 1e4 * r_solution_ohm_m * crevice_depth_m;

    let delta_ph = (ph - 2.0).min(2.0 + 20.0 * ir_drop_v);
    let acidification_factor = 10f64.powf(delta_ph);

    let cpt = get_cpt_data(material.galvanic_series_name());
    let margin_c = match cpt {
        Some(data) => data.cct_c - temperature_c,
        None => {
            prov.warn("no ASTM G48 CCT/CPT data for this material; crevice margin is unbounded");
            100.0
        }
    };

    let base_susceptibility = classify_by_margin(margin_c);
    let susceptibility = if acidification_factor > 100.0 {
        bump_one_level(base_susceptibility)
    } else {
        base_susceptibility
    };

    CorrosionResult::new(
        CreviceResult {
            ir_drop_v,
            delta_ph,
            acidification_factor,
            margin_c,
            susceptibility,
        },
        prov,
    )
}

/// Combines [`assess_pitting`] and [`assess_crevice`] into a single
/// localized-corrosion verdict, with `overall_risk` the worse of the
/// two.
pub fn assess_localized_corrosion(
    material: Material,
    temperature_c: f64,
    chloride_mg_l: f64,
    ph: f64,
    dissolved_oxygen_g_cm3: Option<f64>,
    velocity_m_s: f64,
    crevice_gap_m: f64,
    current_density_a_cm2: f64,
) -> Result<CorrosionResult<LocalizedResult>, CorrosionError> {
    let pitting = assess_pitting(
        material,
        temperature_c,
        chloride_mg_l,
        ph,
        dissolved_oxygen_g_cm3,
        velocity_m_s,
    )?;
    let crevice = assess_crevice(
        material,
        temperature_c,
        chloride_mg_l,
        ph,
        crevice_gap_m,
        current_density_a_cm2,
    );

    let overall_risk = pitting
        .value
        .tier1
        .susceptibility
        .max(crevice.value.susceptibility);

    let mut prov = pitting.provenance;
    prov.warnings.extend(crevice.provenance.warnings.clone());

    Ok(CorrosionResult::new(
        LocalizedResult {
            pitting: pitting.value,
            crevice: crevice.value,
            overall_risk,
        },
        prov,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ss316_pitting_tier1_uses_astm_g48_data() {
        let result = assess_pitting(Material::Ss316, 25.0, 50.0, 7.0, None, 0.0).unwrap();
        assert!(result.value.tier1.used_astm_g48_data);
        assert!(result.value.tier2.is_none(), "DO not supplied, tier 2 should not run");
    }

    #[test]
    fn ti_never_runs_tier2_even_with_do_supplied() {
        let result = assess_pitting(Material::Ti, 25.0, 19000.0, 7.0, Some(6.0e-6), 1.0).unwrap();
        assert!(result.value.tier2.is_none());
    }

    #[test]
    fn hy80_tier2_runs_when_eligible_and_do_supplied() {
        // Dilute chloride: HY80's ORR response surface goes negative at
        // seawater-like chloride (exercised directly in material::tests),
        // so construction needs a dilute condition here for tier 2 to
        // actually run rather than fail inside mechanistic_tier2.
        let result = assess_pitting(Material::Hy80, 25.0, 200.0, 7.0, Some(6.0e-6), 1.0).unwrap();
        assert!(result.value.tier2.is_some());
    }

    #[test]
    fn ss316_seawater_pitting_potential_clears_the_half_volt_sce_floor() {
        // Seawater conditions: the mechanistic E_pit for SS316 (Cr-governed,
        // z=3) must clear 0.5 V_SCE here, or the whole Tier-2 mechanism
        // would never find seawater SS316 safely below its own pitting
        // threshold.
        let result = assess_pitting(Material::Ss316, 25.0, 19000.0, 8.0, Some(8e-6), 0.0).unwrap();
        let tier2 = result.value.tier2.expect("SS316 is tier-2 eligible with DO supplied");
        assert!(
            tier2.pitting_potential_v_sce > 0.5,
            "expected E_pit > 0.5 V_SCE, got {}",
            tier2.pitting_potential_v_sce
        );
        assert!(tier2.margin_v < 0.0);
        assert_eq!(tier2.susceptibility, Susceptibility::Low);
    }

    #[test]
    fn crevice_acidification_is_bounded_by_bulk_ph_minus_two() {
        let result = assess_crevice(Material::Ss316, 25.0, 19000.0, 7.0, 0.001, 1e-4);
        assert!(result.value.delta_ph <= 7.0 - 2.0 + 1e-9);
    }

    #[test]
    fn overall_risk_is_the_worse_of_pitting_and_crevice() {
        let result = assess_localized_corrosion(
            Material::Ss316,
            25.0,
            19000.0,
            7.0,
            None,
            1.0,
            0.001,
            1e-4,
        )
        .unwrap();
        assert!(result.value.overall_risk >= result.value.pitting.tier1.susceptibility);
        assert!(result.value.overall_risk >= result.value.crevice.susceptibility);
    }
}
