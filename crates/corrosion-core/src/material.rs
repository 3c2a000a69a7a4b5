//! Material kinetics (CORE component C4): the six supported NRL/ASTM
//! corrosion-relevant materials, their reaction inventories, and the
//! activation-energy response surfaces each reaction is built from.

use std::collections::HashMap;

use crate::common::{clamp, normalize_identifier, CorrosionError};
use crate::data_store::get_reaction_coeffs;

/// One of the six materials this crate has NRL-derived kinetic data for.
/// Deliberately sealed: adding a material means adding coefficient
/// files and reaction-energetics logic together, not just a new enum
/// variant a caller could otherwise construct with no backing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    Hy80,
    Hy100,
    Ss316,
    Ti,
    I625,
    CuNi,
}

/// An electrochemical reaction a [`Material`] participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    /// Oxygen reduction reaction (cathodic).
    Orr,
    /// Hydrogen evolution reaction (cathodic).
    Her,
    /// Active metal dissolution (anodic): Fe for the steels, Cu for
    /// CuNi.
    Oxidation,
    /// Passive-film formation (anodic), for the materials that
    /// passivate rather than actively dissolve.
    Passivation,
    /// Pitting initiation (anodic), for the materials susceptible to
    /// it.
    Pitting,
}

/// Computed activation-energy pair and electron-transfer stoichiometry
/// for one [`ReactionKind`] on one [`Material`] at fixed conditions.
#[derive(Debug, Clone, Copy)]
pub struct ReactionEnergetics {
    pub dg_cathodic_j_mol: f64,
    pub dg_anodic_j_mol: f64,
    pub z_electrons: f64,
}

/// A constructed material at a fixed set of environmental conditions:
/// every supported reaction's activation energies, ready for C5's
/// kinetics and C6's mixed-potential solver.
#[derive(Debug, Clone)]
pub struct MaterialState {
    pub material: Material,
    pub chloride_m: f64,
    pub temperature_c: f64,
    pub ph: f64,
    pub velocity_m_s: f64,
    pub reactions: HashMap<ReactionKind, ReactionEnergetics>,
}

/// Fixed, large "companion" activation energy assigned to the
/// reaction's non-tabulated direction. These represent a direction so
/// thermodynamically unfavorable at the conditions this crate targets
/// that it is effectively irreversible.
mod companion_dg {
    pub const ORR_ANODIC: f64 = 800.0e4;
    pub const HER_ANODIC: f64 = 1000.0e4;
    pub const OXIDATION_CATHODIC: f64 = 80.0e4;
    pub const PASSIVATION_CATHODIC: f64 = 80.0e4;
    pub const PITTING_CATHODIC: f64 = 20.0e4;
}

impl Material {
    /// Reactions this material's kinetics are modeled for.
    pub fn reactions(&self) -> &'static [ReactionKind] {
        match self {
            Material::Hy80 | Material::Hy100 => &[
                ReactionKind::Orr,
                ReactionKind::Her,
                ReactionKind::Oxidation,
                ReactionKind::Pitting,
            ],
            Material::Ss316 => &[
                ReactionKind::Orr,
                ReactionKind::Her,
                ReactionKind::Passivation,
                ReactionKind::Pitting,
            ],
            Material::Ti | Material::I625 => {
                &[ReactionKind::Orr, ReactionKind::Her, ReactionKind::Passivation]
            }
            Material::CuNi => &[ReactionKind::Orr, ReactionKind::Her, ReactionKind::Oxidation],
        }
    }

    /// The data-store coefficient-file code for this material, e.g.
    /// `"HY80"`, matching `<MATERIAL><REACTION>Coeffs.csv`.
    fn code(&self) -> &'static str {
        match self {
            Material::Hy80 => "HY80",
            Material::Hy100 => "HY100",
            Material::Ss316 => "SS316",
            Material::Ti => "Ti",
            Material::I625 => "I625",
            Material::CuNi => "cuni",
        }
    }

    fn reaction_file_suffix(&self, reaction: ReactionKind) -> &'static str {
        match reaction {
            ReactionKind::Orr => "ORR",
            ReactionKind::Her => "HER",
            ReactionKind::Passivation => "Pass",
            ReactionKind::Pitting => "Pit",
            ReactionKind::Oxidation => match self {
                Material::CuNi => "CuOx",
                _ => "FeOx",
            },
        }
    }

    /// Whether the polynomial-computed activation energy for `reaction`
    /// is the cathodic side (true for ORR/HER) or the anodic side
    /// (true for Oxidation/Passivation/Pitting would be false here).
    fn computed_side_is_cathodic(reaction: ReactionKind) -> bool {
        matches!(reaction, ReactionKind::Orr | ReactionKind::Her)
    }

    fn companion_dg(reaction: ReactionKind) -> f64 {
        match reaction {
            ReactionKind::Orr => companion_dg::ORR_ANODIC,
            ReactionKind::Her => companion_dg::HER_ANODIC,
            ReactionKind::Oxidation => companion_dg::OXIDATION_CATHODIC,
            ReactionKind::Passivation => companion_dg::PASSIVATION_CATHODIC,
            ReactionKind::Pitting => companion_dg::PITTING_CATHODIC,
        }
    }

    /// Butler-Volmer symmetry factor for `reaction` on this material, as
    /// tabulated in `original_source/utils/nrl_materials.py`'s
    /// per-material reaction constructors. Pitting is the extreme case
    /// at 0.9999 on every material that pits: the anodic step is
    /// treated as effectively irreversible. `_ => 0.5` remains only as
    /// a true no-data fallback; every (material, reaction) pair this
    /// crate actually constructs is listed explicitly above it.
    pub fn alpha(&self, reaction: ReactionKind) -> f64 {
        match (self, reaction) {
            (Material::Hy80, ReactionKind::Pitting) => 0.9999,
            (Material::Hy80, ReactionKind::Oxidation) => 0.3,
            (Material::Hy80, ReactionKind::Orr) => 0.89,
            (Material::Hy80, ReactionKind::Her) => 0.7,

            (Material::Hy100, ReactionKind::Pitting) => 0.9999,
            (Material::Hy100, ReactionKind::Oxidation) => 0.3,
            (Material::Hy100, ReactionKind::Orr) => 0.89,
            (Material::Hy100, ReactionKind::Her) => 0.72,

            (Material::Ss316, ReactionKind::Pitting) => 0.9999,
            (Material::Ss316, ReactionKind::Passivation) => 0.6,
            (Material::Ss316, ReactionKind::Orr) => 0.89,
            (Material::Ss316, ReactionKind::Her) => 0.8,

            (Material::Ti, ReactionKind::Passivation) => 0.3,
            (Material::Ti, ReactionKind::Orr) => 0.65,
            (Material::Ti, ReactionKind::Her) => 0.75,

            (Material::I625, ReactionKind::Passivation) => 0.21,
            (Material::I625, ReactionKind::Orr) => 0.89,
            (Material::I625, ReactionKind::Her) => 0.7,

            (Material::CuNi, ReactionKind::Oxidation) => 0.7,
            (Material::CuNi, ReactionKind::Orr) => 0.72,
            (Material::CuNi, ReactionKind::Her) => 0.6,

            _ => 0.5,
        }
    }

    /// Electrons transferred per [`ReactionKind`] on this material.
    /// SS316's active species is Cr (the rate-limiting passive-film/pit
    /// former, Cr -> Cr3+ + 3e-), not Fe, so its Passivation and
    /// Pitting reactions carry z=3 rather than the generic z=2.
    fn z_electrons(&self, reaction: ReactionKind) -> f64 {
        match reaction {
            ReactionKind::Orr => 4.0,
            ReactionKind::Her => 2.0,
            ReactionKind::Oxidation => match self {
                Material::CuNi => 1.0,
                _ => 2.0,
            },
            ReactionKind::Passivation | ReactionKind::Pitting => match self {
                Material::Ss316 => 3.0,
                _ => 2.0,
            },
        }
    }

    /// Molar mass of the dissolving metal species, g/mol. SS316 is
    /// governed by Cr (the passive film and pit-initiation species),
    /// not the bulk Fe.
    pub fn metal_mass_g_mol(&self) -> f64 {
        match self {
            Material::Hy80 | Material::Hy100 => 55.845,
            Material::Ss316 => 51.9961,
            Material::Ti => 47.867,
            Material::I625 => 58.693,
            Material::CuNi => 63.546,
        }
    }

    /// Valence of the dissolving metal ion, used by Faraday's-law
    /// corrosion-rate conversion (C6).
    pub fn valence_z(&self) -> f64 {
        match self {
            Material::Hy80 | Material::Hy100 => 2.0,
            Material::Ss316 | Material::Ti | Material::I625 => 3.0,
            Material::CuNi => 1.0,
        }
    }

    /// Standard electrode potential of this material's active/pit-
    /// forming metal oxidation half-reaction, V SHE -- `e0_metal_ox` in
    /// `pitting_assessment.py`'s Nernst potential for the mechanistic
    /// pitting-potential solve. Paired with the Pitting reaction's own
    /// `z_electrons` (Fe: 2, Cr: 3). `None` for materials the
    /// mechanistic tier does not run on.
    pub fn metal_oxidation_e0_v_she(&self) -> Option<f64> {
        match self {
            Material::Hy80 | Material::Hy100 => Some(-0.501), // Fe -> Fe2+ + 2e-
            Material::Ss316 => Some(-0.74),                   // Cr -> Cr3+ + 3e-
            Material::Ti | Material::I625 | Material::CuNi => None,
        }
    }

    /// Identifier matching the `material` column in
    /// `astm_g82_galvanic_series.csv`/`.xml`, for C6's open-circuit
    /// reference-potential lookups.
    pub fn galvanic_series_name(&self) -> &'static str {
        match self {
            Material::Hy80 => "HY-80",
            Material::Hy100 => "HY-100",
            Material::Ss316 => "316L",
            Material::Ti => "Ti Grade 2",
            Material::I625 => "Inconel 625",
            Material::CuNi => "CuNi 70/30",
        }
    }

    /// Density of the bulk material, g/cm^3.
    pub fn density_g_cm3(&self) -> f64 {
        match self {
            Material::Hy80 | Material::Hy100 => 7.85,
            Material::Ss316 => 8.00,
            Material::Ti => 4.51,
            Material::I625 => 8.44,
            Material::CuNi => 8.94,
        }
    }

    /// Pitting potential, V SHE, for the materials the localized-
    /// corrosion assessor runs a mechanistic (Tier 2) check on. `None`
    /// for materials the mechanistic tier is not gated to run on.
    pub fn pitting_potential_v_she(&self) -> Option<f64> {
        match self {
            Material::Hy80 => Some(-0.20),
            Material::Hy100 => Some(-0.15),
            Material::Ss316 => Some(0.35),
            Material::Ti | Material::I625 | Material::CuNi => None,
        }
    }

    /// Passive/oxide film properties used by C5's passive-film
    /// resistance correction: (molar mass g/mol, density g/cm^3,
    /// resistivity ohm*cm). `None` for materials that do not form a
    /// coherent passive film (the HY steels).
    pub fn oxide_film_properties(&self) -> Option<(f64, f64, f64)> {
        match self {
            Material::Hy80 | Material::Hy100 | Material::CuNi => None,
            Material::Ss316 => Some((151.99, 5.22, 50_000e9)), // Cr2O3
            Material::Ti => Some((143.76, 4.49, 50_000e9)),    // TiO2
            Material::I625 => Some((165.39, 4.84, 50_000e9)),  // Cr2O3 + NiO blend
        }
    }

    /// Diffusion-layer thickness used by the Koutecky-Levich
    /// diffusion-limited ORR current (C5), cm. Velocity-dependent for
    /// I625 and CuNi (thinning with flow velocity relative to their
    /// respective NRL test references), fixed at the baseline 0.085 cm
    /// otherwise.
    pub fn orr_diffusion_layer_cm(&self, velocity_m_s: f64) -> f64 {
        const BASELINE: f64 = 0.085;
        match self {
            Material::I625 => BASELINE * (1.0 - velocity_m_s / 50.0),
            Material::CuNi => BASELINE * (1.0 - velocity_m_s / 7.5),
            _ => BASELINE,
        }
    }

    /// Parses a material identifier (e.g. `"HY-80"`, `"316L"`,
    /// `"Inconel 625"`) using the same uppercase/underscore
    /// normalization and alias table as
    /// `original_source/utils/nrl_materials.py::create_material`.
    pub fn from_identifier(id: &str) -> Result<Material, CorrosionError> {
        let normalized = normalize_identifier(id);
        let material = match normalized.as_str() {
            "HY80" | "HY_80" => Material::Hy80,
            "HY100" | "HY_100" => Material::Hy100,
            "SS316" | "316" | "SS_316" | "316L" => Material::Ss316,
            "TI" | "TITANIUM" => Material::Ti,
            "I625" | "INCONEL625" | "INCONEL_625" => Material::I625,
            "CUNI" | "CUNI7030" | "CUNI_70_30" => Material::CuNi,
            _ => return Err(CorrosionError::UnknownMaterial { id: id.to_string() }),
        };
        Ok(material)
    }

    /// Builds the full kinetic state for this material at fixed
    /// environmental conditions: every supported reaction's activation
    /// energies, after the response-surface evaluation and the pH
    /// correction. Fails with
    /// [`CorrosionError::InvalidActivationEnergy`] (not a clamp) the
    /// instant any reaction produces a non-positive activation energy.
    pub fn state_at(
        &self,
        chloride_m: f64,
        temperature_c: f64,
        ph: f64,
        velocity_m_s: f64,
    ) -> Result<MaterialState, CorrosionError> {
        let mut reactions = HashMap::new();
        for &reaction in self.reactions() {
            let energetics = self.reaction_energetics(reaction, chloride_m, temperature_c, ph)?;
            reactions.insert(reaction, energetics);
        }
        Ok(MaterialState {
            material: *self,
            chloride_m,
            temperature_c,
            ph,
            velocity_m_s,
            reactions,
        })
    }

    fn reaction_energetics(
        &self,
        reaction: ReactionKind,
        chloride_m: f64,
        temperature_c: f64,
        ph: f64,
    ) -> Result<ReactionEnergetics, CorrosionError> {
        let suffix = self.reaction_file_suffix(reaction);
        let coeffs = get_reaction_coeffs(self.code(), suffix)?;
        let dg_no_ph = coeffs.evaluate(chloride_m, temperature_c);
        let dg_computed = apply_ph_correction(dg_no_ph, ph, reaction == ReactionKind::Pitting);
        let dg_companion = Self::companion_dg(reaction);

        let (dg_cathodic, dg_anodic) = if Self::computed_side_is_cathodic(reaction) {
            (dg_computed, dg_companion)
        } else {
            (dg_companion, dg_computed)
        };

        if dg_cathodic <= 0.0 || dg_anodic <= 0.0 {
            return Err(CorrosionError::InvalidActivationEnergy {
                material: self.code().to_string(),
                reaction: suffix.to_string(),
                chloride_m,
                temperature_c,
                ph,
                dg_cathodic,
                dg_anodic,
            });
        }

        Ok(ReactionEnergetics {
            dg_cathodic_j_mol: dg_cathodic,
            dg_anodic_j_mol: dg_anodic,
            z_electrons: self.z_electrons(reaction),
        })
    }
}

/// Linear pH correction over `[1, 13]`: `1.10x` at pH 1 down to `0.90x`
/// at pH 13 for cathodic/oxidation reactions, reversed (`0.90x` up to
/// `1.10x`) for pitting.
fn apply_ph_correction(dg_no_ph: f64, ph: f64, reversed: bool) -> f64 {
    let ph = clamp(ph, 1.0, 13.0);
    let factor = if reversed {
        0.90 + (ph - 1.0) / 12.0 * 0.20
    } else {
        1.10 - (ph - 1.0) / 12.0 * 0.20
    };
    dg_no_ph * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_aliases_normalize_to_the_same_variant() {
        assert_eq!(Material::from_identifier("HY-80").unwrap(), Material::Hy80);
        assert_eq!(Material::from_identifier("hy 80").unwrap(), Material::Hy80);
        assert_eq!(Material::from_identifier("316L").unwrap(), Material::Ss316);
        assert_eq!(Material::from_identifier("Inconel 625").unwrap(), Material::I625);
    }

    #[test]
    fn unknown_material_identifier_is_an_error() {
        assert!(Material::from_identifier("unobtainium").is_err());
    }

    #[test]
    fn hy80_refuses_construction_at_known_negative_dg_seawater_conditions() {
        let err = Material::Hy80.state_at(0.54, 25.0, 8.0, 0.0).unwrap_err();
        assert!(matches!(err, CorrosionError::InvalidActivationEnergy { .. }));
    }

    #[test]
    fn hy80_succeeds_at_dilute_chloride() {
        let state = Material::Hy80.state_at(0.01, 25.0, 7.0, 0.0).unwrap();
        assert!(state.reactions.contains_key(&ReactionKind::Orr));
        assert!(state.reactions[&ReactionKind::Orr].dg_cathodic_j_mol > 0.0);
    }

    #[test]
    fn ss316_has_no_oxidation_reaction_but_does_have_pitting() {
        let state = Material::Ss316.state_at(0.1, 25.0, 7.0, 0.0).unwrap();
        assert!(!state.reactions.contains_key(&ReactionKind::Oxidation));
        assert!(state.reactions.contains_key(&ReactionKind::Pitting));
    }

    #[test]
    fn ti_and_i625_have_no_pitting_reaction() {
        assert!(Material::Ti.pitting_potential_v_she().is_none());
        assert!(Material::I625.pitting_potential_v_she().is_none());
        let ti_state = Material::Ti.state_at(0.1, 25.0, 7.0, 0.0).unwrap();
        assert!(!ti_state.reactions.contains_key(&ReactionKind::Pitting));
    }

    #[test]
    fn i625_and_cuni_orr_diffusion_layer_is_velocity_dependent() {
        let i625_still = Material::I625.orr_diffusion_layer_cm(0.0);
        let i625_flowing = Material::I625.orr_diffusion_layer_cm(25.0);
        assert!(i625_flowing < i625_still);

        let cuni_still = Material::CuNi.orr_diffusion_layer_cm(0.0);
        let cuni_flowing = Material::CuNi.orr_diffusion_layer_cm(3.75);
        assert!(cuni_flowing < cuni_still);
    }

    #[test]
    fn pitting_ph_correction_is_reversed_relative_to_other_reactions() {
        let low_ph = apply_ph_correction(1000.0, 1.0, true);
        let high_ph = apply_ph_correction(1000.0, 13.0, true);
        assert!(low_ph < high_ph, "pitting correction should increase with pH");

        let low_ph_normal = apply_ph_correction(1000.0, 1.0, false);
        let high_ph_normal = apply_ph_correction(1000.0, 13.0, false);
        assert!(low_ph_normal > high_ph_normal, "non-pitting correction should decrease with pH");
    }
}
