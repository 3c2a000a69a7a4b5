//! Reference-data store (CORE component C1).
//!
//! Every table lives as a CSV (or, for the galvanic series, optionally an
//! XML mirror) file under `data/` and is loaded lazily on first use, then
//! memoized process-wide behind a [`Mutex`]-guarded cache keyed by the
//! resolved path, mirroring the six `Optional[Dict]` module-level caches
//! in `original_source/data/csv_loaders.py`. [`clear_caches`] is the Rust
//! analog of that module's `clear_caches()`, used by tests that need a
//! clean slate.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use serde::Deserialize;

use crate::common::{normalize_identifier, CorrosionError};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn coeff_dir() -> PathBuf {
    data_dir().join("reaction_coeffs")
}

/// A material's nominal bulk composition and PREN-relevant alloying
/// content, as tabulated from ASTM/mill-cert composition ranges.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialComposition {
    pub uns: String,
    pub common_name: String,
    pub grade_type: String,
    pub cr_wt_pct: f64,
    pub mo_wt_pct: f64,
    pub n_wt_pct: f64,
    pub ni_wt_pct: f64,
    pub fe_bal_wt_pct: f64,
    pub density_kg_m3: f64,
    pub n_electrons: u32,
    pub source: String,
}

impl MaterialComposition {
    /// PREN = %Cr + 3.3*(%Mo) + k*(%N), k = 30 for duplex/super-duplex
    /// grades, 16 otherwise.
    pub fn pren(&self) -> f64 {
        let n_weight = match self.grade_type.as_str() {
            "duplex" | "super_duplex" => 30.0,
            _ => 16.0,
        };
        self.cr_wt_pct + 3.3 * self.mo_wt_pct + n_weight * self.n_wt_pct
    }
}

/// ASTM G48 critical pitting/crevice temperatures for one material.
#[derive(Debug, Clone, Deserialize)]
pub struct CptData {
    pub material: String,
    pub cpt_c: f64,
    pub cct_c: f64,
    pub test_solution: String,
    pub source: String,
}

/// One ASTM G82 tabulated galvanic-series potential.
#[derive(Debug, Clone, Deserialize)]
pub struct GalvanicSeriesEntry {
    pub material: String,
    pub potential_v_sce: f64,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub source: String,
}

/// XML mirror row, same fields, different tag names (quick-xml serde).
#[derive(Debug, Clone, Deserialize)]
struct GalvanicSeriesXmlEntry {
    material: String,
    potential_v_sce: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct GalvanicSeriesXml {
    #[serde(rename = "entry", default)]
    entry: Vec<GalvanicSeriesXmlEntry>,
}

/// ORR diffusion-limiting current density at one of the three tabulated
/// temperatures.
#[derive(Debug, Clone, Deserialize)]
pub struct OrrDiffusionLimit {
    pub temperature_c: f64,
    pub i_lim_a_m2: f64,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub source: String,
}

/// Chloride-threshold baseline and temperature sensitivity for one grade
/// family.
#[derive(Debug, Clone, Deserialize)]
pub struct ChlorideThresholdRow {
    pub grade_type: String,
    pub cl_threshold_25c_mg_l: f64,
    pub temp_coefficient_per_c: f64,
    #[serde(default)]
    pub source: String,
}

/// Temperature coefficient for one grade family (duplicated from
/// [`ChlorideThresholdRow`] in its own table, matching
/// `original_source/data/csv_loaders.py`'s separate
/// `load_temperature_coefficients_from_csv`).
#[derive(Debug, Clone, Deserialize)]
pub struct TemperatureCoefficientRow {
    pub grade_type: String,
    pub temp_coefficient_per_c: f64,
    #[serde(default)]
    pub source: String,
}

/// Response-surface coefficients for one material/reaction activation
/// energy: `p00 + p10*Cl + p01*T + p20*Cl^2 + p11*Cl*T + p02*T^2`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReactionCoeffs {
    pub p00: f64,
    pub p10: f64,
    pub p01: f64,
    pub p20: f64,
    pub p11: f64,
    pub p02: f64,
}

impl ReactionCoeffs {
    pub fn evaluate(&self, chloride_m: f64, temperature_c: f64) -> f64 {
        self.p00
            + self.p10 * chloride_m
            + self.p01 * temperature_c
            + self.p20 * chloride_m * chloride_m
            + self.p11 * chloride_m * temperature_c
            + self.p02 * temperature_c * temperature_c
    }
}

struct Cache<T> {
    table: Mutex<HashMap<PathBuf, Arc<T>>>,
}

impl<T> Cache<T> {
    const fn new() -> Self {
        Cache {
            table: Mutex::new(HashMap::new()),
        }
    }
}

static MATERIALS_CACHE: OnceLock<Cache<Vec<MaterialComposition>>> = OnceLock::new();
static CPT_CACHE: OnceLock<Cache<Vec<CptData>>> = OnceLock::new();
static GALVANIC_CACHE: OnceLock<Cache<Vec<GalvanicSeriesEntry>>> = OnceLock::new();
static ORR_CACHE: OnceLock<Cache<Vec<OrrDiffusionLimit>>> = OnceLock::new();
static CHLORIDE_CACHE: OnceLock<Cache<Vec<ChlorideThresholdRow>>> = OnceLock::new();
static TEMP_COEFF_CACHE: OnceLock<Cache<Vec<TemperatureCoefficientRow>>> = OnceLock::new();
static COEFF_CACHE: OnceLock<Cache<ReactionCoeffs>> = OnceLock::new();

fn load_csv_cached<T>(
    cache: &OnceLock<Cache<Vec<T>>>,
    path: &Path,
) -> Result<Arc<Vec<T>>, CorrosionError>
where
    T: for<'de> Deserialize<'de>,
{
    let cache = cache.get_or_init(Cache::new);
    if let Some(hit) = cache.table.lock().unwrap().get(path) {
        return Ok(Arc::clone(hit));
    }
    let rows = read_csv(path)?;
    let rows = Arc::new(rows);
    cache
        .table
        .lock()
        .unwrap()
        .insert(path.to_path_buf(), Arc::clone(&rows));
    Ok(rows)
}

fn read_csv<T>(path: &Path) -> Result<Vec<T>, CorrosionError>
where
    T: for<'de> Deserialize<'de>,
{
    if !path.exists() {
        return Err(CorrosionError::DataFileMissing {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|_| CorrosionError::DataFileMissing {
        path: path.to_path_buf(),
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for record in reader.deserialize::<T>() {
        match record {
            Ok(row) => rows.push(row),
            Err(err) => {
                tracing::warn!(file = %path.display(), error = %err, "skipping malformed row");
            }
        }
    }
    Ok(rows)
}

/// Loads `materials_compositions.csv`, memoized for the process lifetime.
pub fn load_materials() -> Result<Arc<Vec<MaterialComposition>>, CorrosionError> {
    load_csv_cached(&MATERIALS_CACHE, &data_dir().join("materials_compositions.csv"))
}

/// Looks up a material's composition by identifier: exact normalized
/// match first, falling back to a substring match in either direction
/// (matching `authoritative_materials_data.py::get_material_data`).
pub fn get_material_composition(id: &str) -> Result<MaterialComposition, CorrosionError> {
    let rows = load_materials()?;
    let needle = normalize_identifier(id);
    if let Some(row) = rows
        .iter()
        .find(|row| normalize_identifier(&row.common_name) == needle || row.uns == id)
    {
        return Ok(row.clone());
    }
    if let Some(row) = rows.iter().find(|row| {
        let hay = normalize_identifier(&row.common_name);
        hay.contains(&needle) || needle.contains(&hay)
    }) {
        return Ok(row.clone());
    }
    Err(CorrosionError::UnknownMaterial { id: id.to_string() })
}

/// Loads `astm_g48_cpt_data.csv`, memoized for the process lifetime.
pub fn load_cpt_data() -> Result<Arc<Vec<CptData>>, CorrosionError> {
    load_csv_cached(&CPT_CACHE, &data_dir().join("astm_g48_cpt_data.csv"))
}

/// Looks up ASTM G48 CPT/CCT data for a material. Tries an exact
/// normalized match *before* a substring match, preserving the fix noted
/// in `original_source/core/localized_backend.py` (BUG-017): a naive
/// substring-first search lets "316" absorb "316L"'s row.
pub fn get_cpt_data(material: &str) -> Option<CptData> {
    let rows = load_cpt_data().ok()?;
    let needle = normalize_identifier(material);
    if let Some(row) = rows
        .iter()
        .find(|row| normalize_identifier(&row.material) == needle)
    {
        return Some(row.clone());
    }
    rows.iter()
        .find(|row| normalize_identifier(&row.material).contains(&needle))
        .cloned()
}

/// Loads the ASTM G82 galvanic series from the CSV table.
pub fn load_galvanic_series() -> Result<Arc<Vec<GalvanicSeriesEntry>>, CorrosionError> {
    load_csv_cached(&GALVANIC_CACHE, &data_dir().join("astm_g82_galvanic_series.csv"))
}

/// Loads the same galvanic series from its XML mirror. Not cached:
/// callers that need repeated access should prefer
/// [`load_galvanic_series`].
pub fn load_galvanic_series_xml() -> Result<Vec<GalvanicSeriesEntry>, CorrosionError> {
    let path = data_dir().join("astm_g82_galvanic_series.xml");
    if !path.exists() {
        return Err(CorrosionError::DataFileMissing { path });
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|_| CorrosionError::DataFileMissing { path: path.clone() })?;
    let parsed: GalvanicSeriesXml = quick_xml::de::from_str(&text).map_err(|err| {
        CorrosionError::BackendFailure {
            wrapped: Box::new(err),
        }
    })?;
    Ok(parsed
        .entry
        .into_iter()
        .map(|e| GalvanicSeriesEntry {
            material: e.material,
            potential_v_sce: e.potential_v_sce,
            environment: String::new(),
            source: String::new(),
        })
        .collect())
}

/// Reference electrode a galvanic-series potential is expressed
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceElectrode {
    She,
    Sce,
}

/// Domain aliases for common generic material names that neither exact-
/// match nor substring-match a row in `astm_g82_galvanic_series.csv`,
/// mirroring the keyword-based `grade_type` fallback in
/// `original_source/core/galvanic_backend.py::_get_galvanic_potential`.
/// Tried only after exact and substring matching both miss.
const GALVANIC_DOMAIN_ALIASES: &[(&str, &str)] = &[
    ("CARBON", "carbon_steel"),
    ("ALUMINUM", "Aluminum 6061"),
    ("ALUMINIUM", "Aluminum 6061"),
    ("STAINLESS", "316L"),
    ("TITANIUM", "Ti Grade 2"),
    ("CUPRONICKEL", "CuNi 70/30"),
    ("COPPER_NICKEL", "CuNi 70/30"),
];

/// Looks up a material's ASTM G82 tabulated galvanic-series potential
/// against the requested reference electrode: exact match on the
/// normalized name, then substring match in either direction, then the
/// domain-alias table. Never guesses -- a miss is
/// [`CorrosionError::UnknownMaterial`], not a default potential.
pub fn lookup_galvanic_potential(
    material: &str,
    reference: ReferenceElectrode,
) -> Result<f64, CorrosionError> {
    let rows = load_galvanic_series()?;
    let needle = normalize_identifier(material);
    let row = rows
        .iter()
        .find(|row| normalize_identifier(&row.material) == needle)
        .or_else(|| {
            rows.iter()
                .find(|row| normalize_identifier(&row.material).contains(&needle))
        })
        .or_else(|| {
            GALVANIC_DOMAIN_ALIASES
                .iter()
                .find(|(alias, _)| needle.contains(alias))
                .and_then(|(_, canonical)| {
                    let canonical_needle = normalize_identifier(canonical);
                    rows.iter()
                        .find(|row| normalize_identifier(&row.material) == canonical_needle)
                })
        })
        .ok_or_else(|| CorrosionError::UnknownMaterial {
            id: material.to_string(),
        })?;
    Ok(match reference {
        ReferenceElectrode::Sce => row.potential_v_sce,
        ReferenceElectrode::She => row.potential_v_sce + crate::common::SHE_TO_SCE_ASTM_G3,
    })
}

/// Looks up the SHE potential of a material's ASTM G82 tabulated
/// galvanic-series entry, converting from the SCE scale with
/// [`crate::common::SHE_TO_SCE_ASTM_G3`].
pub fn lookup_galvanic_potential_she(material: &str) -> Result<f64, CorrosionError> {
    lookup_galvanic_potential(material, ReferenceElectrode::She)
}

/// Loads `orr_diffusion_limits.csv`, memoized for the process lifetime.
pub fn load_orr_diffusion_limits() -> Result<Arc<Vec<OrrDiffusionLimit>>, CorrosionError> {
    load_csv_cached(&ORR_CACHE, &data_dir().join("orr_diffusion_limits.csv"))
}

/// Bucketed lookup of the ORR diffusion-limiting current density:
/// `<=30C` -> the 25C row, `<=50C` -> the 40C row, else the 60C row.
/// Falls back to 5.0 A/m^2 if the table is entirely unavailable.
pub fn get_orr_diffusion_limit(temperature_c: f64) -> f64 {
    let Ok(rows) = load_orr_diffusion_limits() else {
        return 5.0;
    };
    let target = if temperature_c <= 30.0 {
        25.0
    } else if temperature_c <= 50.0 {
        40.0
    } else {
        60.0
    };
    rows.iter()
        .find(|row| (row.temperature_c - target).abs() < 1e-6)
        .map(|row| row.i_lim_a_m2)
        .unwrap_or(5.0)
}

/// Loads `iso18070_chloride_thresholds.csv`, memoized for the process
/// lifetime.
pub fn load_chloride_thresholds() -> Result<Arc<Vec<ChlorideThresholdRow>>, CorrosionError> {
    load_csv_cached(
        &CHLORIDE_CACHE,
        &data_dir().join("iso18070_chloride_thresholds.csv"),
    )
}

/// Loads `iso18070_temperature_coefficients.csv`, memoized for the
/// process lifetime.
pub fn load_temperature_coefficients(
) -> Result<Arc<Vec<TemperatureCoefficientRow>>, CorrosionError> {
    load_csv_cached(
        &TEMP_COEFF_CACHE,
        &data_dir().join("iso18070_temperature_coefficients.csv"),
    )
}

/// Temperature- and pH-corrected chloride threshold for pitting
/// initiation, in mg/L, floored at 10 mg/L. Returns `None` if
/// `grade_type` has no base-25C row at all -- the caller should treat
/// that as "no threshold data for this material", not silently
/// substitute a number (see DESIGN.md Open Question 3).
pub fn get_chloride_threshold(
    grade_type: &str,
    temperature_c: f64,
    ph: f64,
) -> Option<f64> {
    let rows = load_chloride_thresholds().ok()?;
    let row = rows.iter().find(|row| row.grade_type == grade_type)?;
    let k = row.temp_coefficient_per_c;
    let delta_t = temperature_c - 25.0;
    let cl_t = row.cl_threshold_25c_mg_l * (-k * delta_t).exp();
    let ph_factor = crate::common::clamp((ph - 4.0) / 6.0 + 0.5, 0.5, 1.5);
    Some((cl_t * ph_factor).max(10.0))
}

/// Loads a `<material><reaction>Coeffs.csv` response-surface file, e.g.
/// `HY80ORRCoeffs.csv`. `reaction` must be one of `ORR`, `HER`, `Pass`,
/// `Pit`, `FeOx`, `CuOx`.
pub fn get_reaction_coeffs(
    material_code: &str,
    reaction: &str,
) -> Result<ReactionCoeffs, CorrosionError> {
    let path = coeff_dir().join(format!("{material_code}{reaction}Coeffs.csv"));
    let cache = COEFF_CACHE.get_or_init(Cache::new);
    if let Some(hit) = cache.table.lock().unwrap().get(&path) {
        return Ok(**hit);
    }
    let rows: Vec<ReactionCoeffs> = read_csv(&path)?;
    let row = rows.into_iter().next().ok_or(CorrosionError::DataFileMissing {
        path: path.clone(),
    })?;
    cache.table.lock().unwrap().insert(path, Arc::new(row));
    Ok(row)
}

/// Drops every cached table, forcing the next lookup to re-read from
/// disk. The Rust analog of `original_source/data/csv_loaders.py`'s
/// `clear_caches()`; used by tests that swap in a different data
/// directory or need to observe a fresh `DataFileMissing`.
pub fn clear_caches() {
    if let Some(c) = MATERIALS_CACHE.get() {
        c.table.lock().unwrap().clear();
    }
    if let Some(c) = CPT_CACHE.get() {
        c.table.lock().unwrap().clear();
    }
    if let Some(c) = GALVANIC_CACHE.get() {
        c.table.lock().unwrap().clear();
    }
    if let Some(c) = ORR_CACHE.get() {
        c.table.lock().unwrap().clear();
    }
    if let Some(c) = CHLORIDE_CACHE.get() {
        c.table.lock().unwrap().clear();
    }
    if let Some(c) = TEMP_COEFF_CACHE.get() {
        c.table.lock().unwrap().clear();
    }
    if let Some(c) = COEFF_CACHE.get() {
        c.table.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materials_load_and_pren_is_nonzero_for_duplex() {
        let row = get_material_composition("2205").expect("2205 should resolve");
        assert!(row.pren() > 30.0, "2205 PREN should clear the 30 duplex threshold, got {}", row.pren());
    }

    #[test]
    fn cpt_lookup_prefers_exact_match_over_substring() {
        // BUG-017: a naive substring search for "316" would match "316L"'s
        // row first since it is scanned earlier in the file; the exact
        // match must win regardless of row order.
        let exact = get_cpt_data("316L").expect("316L should have CPT data");
        assert_eq!(exact.cpt_c, 15.0);
    }

    #[test]
    fn unknown_material_is_an_error_not_a_default() {
        let err = get_material_composition("UNOBTAINIUM").unwrap_err();
        assert!(matches!(err, CorrosionError::UnknownMaterial { .. }));
    }

    #[test]
    fn chloride_threshold_is_floored_at_ten() {
        // An extreme temperature drives the exponential decay term to
        // near zero; the floor must still hold.
        let threshold = get_chloride_threshold("hy_steel", 200.0, 7.0).unwrap();
        assert!(threshold >= 10.0);
    }

    #[test]
    fn unknown_grade_type_returns_none_not_a_fallback_number() {
        assert!(get_chloride_threshold("unobtainium_grade", 25.0, 7.0).is_none());
    }

    #[test]
    fn orr_diffusion_limit_buckets_by_temperature() {
        assert_eq!(get_orr_diffusion_limit(20.0), get_orr_diffusion_limit(30.0));
        assert_ne!(get_orr_diffusion_limit(30.0), get_orr_diffusion_limit(31.0));
    }

    #[test]
    fn galvanic_xml_and_csv_agree() {
        let csv_rows = load_galvanic_series().unwrap();
        let xml_rows = load_galvanic_series_xml().unwrap();
        assert_eq!(csv_rows.len(), xml_rows.len());
        assert_eq!(csv_rows[0].potential_v_sce, xml_rows[0].potential_v_sce);
    }

    #[test]
    fn hy80_orr_coeffs_go_negative_at_seawater_conditions() {
        let coeffs = get_reaction_coeffs("HY80", "ORR").unwrap();
        let dg = coeffs.evaluate(0.54, 25.0);
        assert!(dg < 0.0, "expected the known HY80/ORR negative-dG condition, got {dg}");
    }

    #[test]
    fn galvanic_lookup_she_and_sce_differ_by_the_astm_offset() {
        let she = lookup_galvanic_potential("316L", ReferenceElectrode::She).unwrap();
        let sce = lookup_galvanic_potential("316L", ReferenceElectrode::Sce).unwrap();
        assert!((she - sce - crate::common::SHE_TO_SCE_ASTM_G3).abs() < 1e-9);
    }

    #[test]
    fn galvanic_lookup_falls_back_to_domain_alias() {
        // "titanium" matches neither "Ti Grade 2" exactly nor as a
        // substring in either direction; only the domain-alias table
        // resolves it.
        let aliased = lookup_galvanic_potential("titanium", ReferenceElectrode::Sce).unwrap();
        let canonical = lookup_galvanic_potential("Ti Grade 2", ReferenceElectrode::Sce).unwrap();
        assert_eq!(aliased, canonical);
    }

    #[test]
    fn galvanic_lookup_unaliased_unknown_material_is_an_error() {
        let err = lookup_galvanic_potential("unobtainium", ReferenceElectrode::She).unwrap_err();
        assert!(matches!(err, CorrosionError::UnknownMaterial { .. }));
    }
}
