// src/error.rs

use thiserror::Error;

use crate::lattice::LatticeKind;

/// Fatal configuration contradictions, reported before any tick runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("grid extents must be positive, got {nx}x{ny}x{nz}")]
    EmptyGrid { nx: usize, ny: usize, nz: usize },

    #[error("{lattice:?} is {dims}-D but the grid is {nx}x{ny}x{nz}; inactive axes must have extent 1")]
    DimensionMismatch {
        lattice: LatticeKind,
        dims: usize,
        nx: usize,
        ny: usize,
        nz: usize,
    },

    #[error("relaxation rate omega = {0} must lie in (0, 2)")]
    InvalidOmega(f64),

    #[error("MRT collision selected but no relaxation vector was configured")]
    MissingMrtRates,

    #[error("MRT relaxation vector has {got} entries but {lattice:?} has {expected} directions")]
    MrtRateCount {
        lattice: LatticeKind,
        expected: usize,
        got: usize,
    },

    #[error("MRT rate s[{index}] = {value} must lie in [0, 2)")]
    InvalidMrtRate { index: usize, value: f64 },

    #[error("gravity axis {axis} is not available on a {dims}-D lattice")]
    GravityAxis { axis: usize, dims: usize },

    #[error("initial density must be positive and finite, got {0}")]
    InvalidInitialDensity(f64),

    #[error("region {path}: box {lo:?}..{hi:?} is empty or inverted")]
    EmptyRegion {
        path: String,
        lo: [usize; 3],
        hi: [usize; 3],
    },

    #[error("region {path}: box {lo:?}..{hi:?} does not fit in parent extents {extent:?}")]
    RegionOutOfBounds {
        path: String,
        lo: [usize; 3],
        hi: [usize; 3],
        extent: [usize; 3],
    },

    #[error("region {path}: axis {axis} spans {cells} parent cell(s); refinement needs at least 2")]
    RegionTooSmall {
        path: String,
        axis: usize,
        cells: usize,
    },

    #[error("region {path}: inactive axis {axis} must span exactly [0, 1)")]
    InactiveAxisRefined { path: String, axis: usize },

    #[error("regions {a} and {b} overlap")]
    RegionOverlap { a: String, b: String },

    #[error("region {path}: box {lo:?}..{hi:?} intersects the transition rim of its parent level")]
    RegionOnTransitionRim {
        path: String,
        lo: [usize; 3],
        hi: [usize; 3],
    },

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}
