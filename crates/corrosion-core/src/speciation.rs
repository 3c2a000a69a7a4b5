//! Equilibrium-speciation adapter (CORE component C3).
//!
//! No Rust binding to an equilibrium-chemistry engine (PHREEQC or
//! otherwise) exists anywhere in this crate's retrieval pack, and
//! fabricating an FFI binding would mean shipping a fake dependency.
//! This module instead defines the seam a real binding would plug into
//! -- [`SpeciationBackend`] -- plus a [`NullSpeciationBackend`] that
//! reports [`CorrosionError::BackendFailure`] for every call. Callers in
//! C8 (scaling indices) depend on the trait, not on any concrete engine,
//! so swapping in a real backend later is a one-line change at the call
//! site.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::common::CorrosionError;

/// A single dissolved species' equilibrium properties, as returned by a
/// speciation calculation.
#[derive(Debug, Clone, Default)]
pub struct SpeciesResult {
    pub concentration_mol_l: f64,
    pub activity: f64,
}

/// The charge-balanced input solution composition a [`SpeciationBackend`]
/// speciates. Concentrations are in mg/L, matching the units used
/// throughout the rest of this crate's public API.
#[derive(Debug, Clone, Default)]
pub struct SolutionInput {
    pub ph: f64,
    pub temperature_c: f64,
    pub alkalinity_mg_l_as_caco3: f64,
    pub ion_concentrations_mg_l: HashMap<String, f64>,
    /// Dissolved gas partial pressures in atm (CO2, H2S, O2, ...).
    pub gas_partial_pressures_atm: HashMap<String, f64>,
}

/// The result of a full equilibrium speciation: per-species activities
/// and concentrations, ionic strength, pe/Eh, and named saturation
/// indices (keyed by mineral name, e.g. `"Calcite"`, `"Aragonite"`).
#[derive(Debug, Clone, Default)]
pub struct SpeciationOutput {
    pub ph: f64,
    pub ionic_strength: f64,
    pub pe: f64,
    pub eh_v: f64,
    pub species: HashMap<String, SpeciesResult>,
    pub saturation_indices: HashMap<String, f64>,
}

/// Seam for an external equilibrium-chemistry engine. A production
/// deployment would implement this against a real thermodynamic solver;
/// see [`NullSpeciationBackend`] for the only implementation shipped
/// here.
pub trait SpeciationBackend {
    /// Runs a full equilibrium speciation on `input`.
    fn speciate(&self, input: &SolutionInput) -> Result<SpeciationOutput, CorrosionError>;

    /// Convenience query for a single saturation index (e.g. calcite),
    /// used by the scaling-index component (C8) when it only needs one
    /// number rather than the full speciation.
    fn saturation_index(
        &self,
        input: &SolutionInput,
        mineral: &str,
    ) -> Result<f64, CorrosionError> {
        let output = self.speciate(input)?;
        output
            .saturation_indices
            .get(mineral)
            .copied()
            .ok_or_else(|| CorrosionError::MissingSpecies {
                ion: mineral.to_string(),
            })
    }
}

/// The only [`SpeciationBackend`] implementation in this crate: it
/// performs no chemistry and reports [`CorrosionError::BackendFailure`]
/// for every call, clearly signaling "no equilibrium engine is wired up"
/// rather than returning a fabricated number.
#[derive(Debug, Default)]
pub struct NullSpeciationBackend;

impl SpeciationBackend for NullSpeciationBackend {
    fn speciate(&self, _input: &SolutionInput) -> Result<SpeciationOutput, CorrosionError> {
        Err(CorrosionError::BackendFailure {
            wrapped: Box::new(NoBackendConfigured),
        })
    }
}

#[derive(Debug)]
struct NoBackendConfigured;

impl std::fmt::Display for NoBackendConfigured {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no equilibrium-speciation engine is configured; NullSpeciationBackend refuses every call"
        )
    }
}

impl std::error::Error for NoBackendConfigured {}

thread_local! {
    /// One backend handle per OS thread, matching the way an FFI-backed
    /// equilibrium engine (which is rarely `Send`/`Sync`) would need to
    /// be isolated: each thread gets its own instance rather than
    /// sharing one behind a lock.
    static THREAD_BACKEND: RefCell<NullSpeciationBackend> = RefCell::new(NullSpeciationBackend);
}

/// Runs `f` against the current thread's speciation backend handle.
pub fn with_thread_backend<R>(f: impl FnOnce(&dyn SpeciationBackend) -> R) -> R {
    THREAD_BACKEND.with(|backend| f(&*backend.borrow()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_backend_refuses_rather_than_fabricating() {
        let backend = NullSpeciationBackend;
        let input = SolutionInput::default();
        let err = backend.speciate(&input).unwrap_err();
        assert!(matches!(err, CorrosionError::BackendFailure { .. }));
    }

    #[test]
    fn saturation_index_surfaces_backend_failure() {
        let backend = NullSpeciationBackend;
        let input = SolutionInput::default();
        assert!(backend.saturation_index(&input, "Calcite").is_err());
    }

    #[test]
    fn thread_local_backend_is_accessible_without_locking() {
        let result = with_thread_backend(|backend| {
            backend.speciate(&SolutionInput::default()).is_err()
        });
        assert!(result);
    }
}
