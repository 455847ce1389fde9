// src/config.rs

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::ConfigError;
use crate::lattice::{LatticeKind, VelocitySet};
use crate::mrt::MomentBasis;
use crate::params::{CollisionOperator, Gravity, LbmParams, LevelRelaxation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionModel {
    Bgk,
    Mrt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionConfig {
    pub model: CollisionModel,
    /// Level-0 shear relaxation rate ω = 1/τ.
    pub omega: f64,
    /// Level-0 moment relaxation rates (MRT only), one per direction.
    #[serde(default)]
    pub mrt_rates: Option<Vec<f64>>,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            model: CollisionModel::Bgk,
            omega: 1.0,
            mrt_rates: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityConfig {
    pub axis: usize,
    pub g: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConfig {
    pub rho: f64,
    pub u: [f64; 3],
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            rho: 1.0,
            u: [0.0; 3],
        }
    }
}

/// A refined child region: half-open box `[lo, hi)` in the parent's cell indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub lo: [usize; 3],
    pub hi: [usize; 3],
    /// Nested regions, in this region's (fine) cell indices.
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
}

fn default_steps() -> usize {
    100
}

fn default_log_every() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub lattice: LatticeKind,
    pub nx: usize,
    #[serde(default = "one")]
    pub ny: usize,
    #[serde(default = "one")]
    pub nz: usize,
    #[serde(default)]
    pub collision: CollisionConfig,
    #[serde(default)]
    pub periodic: bool,
    #[serde(default)]
    pub gravity: Option<GravityConfig>,
    #[serde(default)]
    pub initial: InitialConfig,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_log_every")]
    pub log_every: usize,
}

fn one() -> usize {
    1
}

impl SolverConfig {
    /// Uniform, unrefined lattice with BGK collision and periodic wrap off.
    pub fn uniform(lattice: LatticeKind, nx: usize, ny: usize, nz: usize, omega: f64) -> Self {
        Self {
            lattice,
            nx,
            ny,
            nz,
            collision: CollisionConfig {
                omega,
                ..CollisionConfig::default()
            },
            periodic: false,
            gravity: None,
            initial: InitialConfig::default(),
            regions: Vec::new(),
            steps: default_steps(),
            log_every: default_log_every(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let cfg: SolverConfig = serde_json::from_reader(BufReader::new(file))?;
        Ok(cfg)
    }

    pub fn write_to_dir(&self, out_dir: &Path) -> Result<(), ConfigError> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Check the scalar settings (grid, collision, gravity, initial state).
    ///
    /// Region geometry is checked while the hierarchy is built, since it
    /// depends on each parent's extents.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (nx, ny, nz) = (self.nx, self.ny, self.nz);
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(ConfigError::EmptyGrid { nx, ny, nz });
        }

        let dims = self.lattice.dims();
        let inactive_ok = match dims {
            1 => ny == 1 && nz == 1,
            2 => nz == 1,
            _ => true,
        };
        if !inactive_ok {
            return Err(ConfigError::DimensionMismatch {
                lattice: self.lattice,
                dims,
                nx,
                ny,
                nz,
            });
        }

        let omega = self.collision.omega;
        if !(omega > 0.0 && omega < 2.0) {
            return Err(ConfigError::InvalidOmega(omega));
        }
        if omega > 1.95 {
            log::warn!("omega = {omega} is close to the stability limit 2");
        }

        if self.collision.model == CollisionModel::Mrt {
            let rates = self
                .collision
                .mrt_rates
                .as_ref()
                .ok_or(ConfigError::MissingMrtRates)?;
            let expected = VelocitySet::new(self.lattice).nvel();
            if rates.len() != expected {
                return Err(ConfigError::MrtRateCount {
                    lattice: self.lattice,
                    expected,
                    got: rates.len(),
                });
            }
            for (index, &value) in rates.iter().enumerate() {
                if !(value >= 0.0 && value < 2.0) {
                    return Err(ConfigError::InvalidMrtRate { index, value });
                }
            }
        }

        if let Some(g) = self.gravity {
            if g.axis >= dims {
                return Err(ConfigError::GravityAxis { axis: g.axis, dims });
            }
        }

        let rho0 = self.initial.rho;
        if !(rho0.is_finite() && rho0 > 0.0) {
            return Err(ConfigError::InvalidInitialDensity(rho0));
        }

        Ok(())
    }

    /// Validate and build the shared model parameters plus level-0 relaxation.
    pub fn build_params(&self) -> Result<(LbmParams, LevelRelaxation), ConfigError> {
        self.validate()?;

        let velocities = VelocitySet::new(self.lattice);
        let collision = match self.collision.model {
            CollisionModel::Bgk => CollisionOperator::Bgk,
            CollisionModel::Mrt => CollisionOperator::Mrt(MomentBasis::new(&velocities)),
        };
        let mrt_rates = match self.collision.model {
            CollisionModel::Bgk => None,
            CollisionModel::Mrt => self.collision.mrt_rates.clone(),
        };

        let params = LbmParams {
            velocities,
            collision,
            periodic: self.periodic,
            gravity: self.gravity.map(|g| Gravity {
                axis: g.axis,
                g: g.g,
            }),
        };
        let relax = LevelRelaxation {
            omega: self.collision.omega,
            mrt_rates,
        };
        Ok((params, relax))
    }
}

/// MRT rate vector with every moment relaxed at the shear rate except the
/// conserved ones (density and momentum), which are left at zero.
pub fn mrt_rates_from_omega(lattice: LatticeKind, omega: f64) -> Vec<f64> {
    let conserved: &[usize] = match lattice {
        LatticeKind::D1Q3 => &[0, 1],
        LatticeKind::D2Q9 => &[0, 3, 5],
        LatticeKind::D3Q19 => &[0, 3, 5, 7],
    };
    let n = VelocitySet::new(lattice).nvel();
    (0..n)
        .map(|q| if conserved.contains(&q) { 0.0 } else { omega })
        .collect()
}
