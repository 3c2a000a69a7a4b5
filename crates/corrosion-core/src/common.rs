//! Shared types used across every component: the error taxonomy, the
//! result envelope, and a handful of physical constants that more than
//! one module needs.

use std::fmt;
use std::path::PathBuf;

/// Gas constant, J/(mol*K).
pub const R_GAS: f64 = 8.314462618;
/// Faraday constant, C/mol.
pub const FARADAY: f64 = 96485.3321;
/// Boltzmann constant, J/K.
pub const K_BOLTZMANN: f64 = 1.380649e-23;
/// Planck constant, J*s.
pub const PLANCK_H: f64 = 6.62607015e-34;
/// 0 degC in kelvin.
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// SHE -> SCE offset per ASTM G3 / NACE SP0208, used for the ASTM G82
/// tabular galvanic series and general boundary conversions.
pub const SHE_TO_SCE_ASTM_G3: f64 = 0.241;
/// SHE -> SCE offset used by the NRL polarization-curve data set. Kept
/// distinct from [`SHE_TO_SCE_ASTM_G3`] -- the two data sets were
/// calibrated against different reference conversions and merging them
/// would silently shift one or the other.
pub const SHE_TO_SCE_NRL: f64 = 0.244;

/// Corrected Faraday's-law year constant (cm/s -> mm/year, seconds per
/// year). The legacy value `3.27e6` must never appear here.
pub const FARADAY_RATE_CONSTANT: f64 = 3.15576e8;

/// mils-per-year per mm/year.
pub const MPY_PER_MM_PER_YEAR: f64 = 39.37;

/// Dissolved-oxygen floor below which values are clamped and a warning
/// is attached, to avoid taking the logarithm of (near-)zero in the
/// Nernst DO<->Eh conversion.
pub const DO_EPSILON_G_CM3: f64 = 1e-8;

/// Tagged error variants for every fatal condition in the core. No
/// exception is used for ordinary control flow; this is the sum type
/// callers match on.
#[derive(Debug)]
pub enum CorrosionError {
    /// A required reference-data file is absent.
    DataFileMissing { path: PathBuf },
    /// A material identifier did not resolve in the data store.
    UnknownMaterial { id: String },
    /// A response-surface polynomial produced a negative activation
    /// energy; the design refuses rather than clamping.
    InvalidActivationEnergy {
        material: String,
        reaction: String,
        chloride_m: f64,
        temperature_c: f64,
        ph: f64,
        dg_cathodic: f64,
        dg_anodic: f64,
    },
    /// The mixed-potential solver could not bracket a root.
    SolverNonConvergence { residual: f64, bounds: (f64, f64) },
    /// A required ion species is absent for the requested assessment.
    MissingSpecies { ion: String },
    /// An input fell outside the supported envelope.
    OutOfRange {
        parameter: String,
        value: f64,
        bounds: (f64, f64),
    },
    /// The external equilibrium engine (or another backend collaborator)
    /// failed.
    BackendFailure {
        wrapped: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for CorrosionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrosionError::DataFileMissing { path } => {
                write!(f, "required data file missing: {}", path.display())
            }
            CorrosionError::UnknownMaterial { id } => {
                write!(f, "unknown material identifier: '{id}'")
            }
            CorrosionError::InvalidActivationEnergy {
                material,
                reaction,
                chloride_m,
                temperature_c,
                ph,
                dg_cathodic,
                dg_anodic,
            } => write!(
                f,
                "invalid activation energy for {material}/{reaction} at Cl={chloride_m} M, \
                 T={temperature_c} C, pH={ph}: dG_cathodic={dg_cathodic} J/mol, \
                 dG_anodic={dg_anodic} J/mol (negative activation energy refused, not clamped)"
            ),
            CorrosionError::SolverNonConvergence { residual, bounds } => write!(
                f,
                "mixed-potential solver failed to converge: residual={residual}, bounds={bounds:?}"
            ),
            CorrosionError::MissingSpecies { ion } => {
                write!(f, "required species missing from input: {ion}")
            }
            CorrosionError::OutOfRange {
                parameter,
                value,
                bounds,
            } => write!(
                f,
                "parameter '{parameter}' = {value} outside supported range {bounds:?}"
            ),
            CorrosionError::BackendFailure { wrapped } => {
                write!(f, "backend failure: {wrapped}")
            }
        }
    }
}

impl std::error::Error for CorrosionError {}

/// Confidence level attached to a result's provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
    /// No data was available; the canonical "we did not guess" signal.
    None,
}

/// How a value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    TableLookup,
    Calculated,
    SemanticSearch,
    None,
}

/// Accompanies every public result. Never silently synthesized from
/// defaults: a `method = None, confidence = None` pair is the canonical
/// "no data" signal and must be propagated, not swallowed.
#[derive(Debug, Clone)]
pub struct ProvenanceMetadata {
    pub method: Method,
    pub model_name: &'static str,
    pub model_version: &'static str,
    pub confidence: Confidence,
    pub validation_datasets: Vec<&'static str>,
    pub sources: Vec<&'static str>,
    pub assumptions: Vec<&'static str>,
    pub warnings: Vec<String>,
}

impl ProvenanceMetadata {
    pub fn calculated(model_name: &'static str) -> Self {
        ProvenanceMetadata {
            method: Method::Calculated,
            model_name,
            model_version: env!("CARGO_PKG_VERSION"),
            confidence: Confidence::High,
            validation_datasets: Vec::new(),
            sources: Vec::new(),
            assumptions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn none(model_name: &'static str) -> Self {
        ProvenanceMetadata {
            method: Method::None,
            model_name,
            model_version: env!("CARGO_PKG_VERSION"),
            confidence: Confidence::None,
            validation_datasets: Vec::new(),
            sources: Vec::new(),
            assumptions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: &'static str) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_assumption(mut self, assumption: &'static str) -> Self {
        self.assumptions.push(assumption);
        self
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// The shared result envelope every public calculation returns: a value
/// plus its provenance.
#[derive(Debug, Clone)]
pub struct CorrosionResult<T> {
    pub value: T,
    pub provenance: ProvenanceMetadata,
}

impl<T> CorrosionResult<T> {
    pub fn new(value: T, provenance: ProvenanceMetadata) -> Self {
        CorrosionResult { value, provenance }
    }

    pub fn warnings(&self) -> &[String] {
        &self.provenance.warnings
    }
}

/// Clamp `x` into `[lo, hi]`.
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

/// Normalizes a material/grade identifier the way the data store does:
/// uppercase, spaces and hyphens collapsed to underscore.
pub fn normalize_identifier(raw: &str) -> String {
    raw.to_uppercase().replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_identifier_collapses_separators() {
        assert_eq!(normalize_identifier("HY-80"), "HY_80");
        assert_eq!(normalize_identifier("hy 80"), "HY_80");
        assert_eq!(normalize_identifier("HY_80"), "HY_80");
    }

    #[test]
    fn clamp_bounds_values() {
        assert_eq!(clamp(-5.0, 0.5, 1.5), 0.5);
        assert_eq!(clamp(5.0, 0.5, 1.5), 1.5);
        assert_eq!(clamp(1.0, 0.5, 1.5), 1.0);
    }

    #[test]
    fn faraday_rate_constant_is_not_the_legacy_bug() {
        assert!((FARADAY_RATE_CONSTANT - 3.27e6).abs() > 1e6);
        assert!((FARADAY_RATE_CONSTANT - 3.15576e8).abs() < 1.0);
    }
}
