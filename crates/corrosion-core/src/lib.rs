//! Physics-based, provenance-tagged aqueous corrosion calculations.
//!
//! Every public computation returns a [`common::CorrosionResult`] carrying
//! both the computed value and a [`common::ProvenanceMetadata`] record: how
//! it was obtained, what it assumed, and what it could not determine. There
//! is no silent fallback to a guessed default anywhere in this crate.

mod common;
pub mod data_store;
pub mod localized;
pub mod material;
pub mod mixed_potential;
pub mod reaction;
pub mod scaling;
pub mod solution_chemistry;
pub mod speciation;

pub use common::{
    clamp, normalize_identifier, Confidence, CorrosionError, CorrosionResult, Method,
    ProvenanceMetadata, CELSIUS_TO_KELVIN, DO_EPSILON_G_CM3, FARADAY, FARADAY_RATE_CONSTANT,
    K_BOLTZMANN, MPY_PER_MM_PER_YEAR, PLANCK_H, R_GAS, SHE_TO_SCE_ASTM_G3, SHE_TO_SCE_NRL,
};
pub use material::Material;
