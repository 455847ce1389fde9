// src/lib.rs

pub mod amr;
pub mod collision;
pub mod config;
pub mod error;
pub mod field;
pub mod forcing;
pub mod grid;
pub mod hooks;
pub mod lattice;
pub mod macroscopic;
pub mod mrt;
pub mod params;
pub mod site;
pub mod stream;

pub use amr::{GridLevel, Solver};
pub use config::SolverConfig;
pub use error::ConfigError;
pub use field::LevelField;
pub use lattice::{LatticeKind, VelocitySet};
pub use site::SiteType;
