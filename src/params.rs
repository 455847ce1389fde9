// src/params.rs

use crate::lattice::VelocitySet;
use crate::mrt::MomentBasis;

/// Collision model, chosen once for the whole hierarchy.
#[derive(Debug, Clone)]
pub enum CollisionOperator {
    /// Single relaxation time.
    Bgk,
    /// Multiple relaxation times in the given moment basis.
    Mrt(MomentBasis),
}

impl CollisionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bgk => "bgk",
            Self::Mrt(_) => "mrt",
        }
    }
}

/// Uniform body force per unit mass along one Cartesian axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub axis: usize,
    pub g: f64,
}

/// Immutable model parameters shared by every level and component.
#[derive(Debug, Clone)]
pub struct LbmParams {
    pub velocities: VelocitySet,
    pub collision: CollisionOperator,
    /// Periodic wrap of off-grid streams on the coarsest level.
    pub periodic: bool,
    pub gravity: Option<Gravity>,
}

/// Relaxation rates of one level.
///
/// `omega` is the shear rate (BGK rate, and the rate used by Guo forcing);
/// `mrt_rates` holds one rate per moment when MRT is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRelaxation {
    pub omega: f64,
    pub mrt_rates: Option<Vec<f64>>,
}

/// Rate on the next finer level at constant viscosity: τ_f = 2τ_c − 1/2.
///
/// A zero rate (a conserved moment left unrelaxed) stays zero.
#[inline]
pub fn refine_rate(s: f64) -> f64 {
    if s == 0.0 {
        return 0.0;
    }
    let tau = 1.0 / s;
    1.0 / (2.0 * tau - 0.5)
}

impl LevelRelaxation {
    pub fn bgk(omega: f64) -> Self {
        Self {
            omega,
            mrt_rates: None,
        }
    }

    /// Rates for the child level (half the spacing, half the time step).
    pub fn refined(&self) -> Self {
        Self {
            omega: refine_rate(self.omega),
            mrt_rates: self
                .mrt_rates
                .as_ref()
                .map(|r| r.iter().map(|&s| refine_rate(s)).collect()),
        }
    }

    /// Relaxation time τ = 1/ω.
    #[inline]
    pub fn tau(&self) -> f64 {
        1.0 / self.omega
    }
}

/// Time step of `level` in units of the coarsest step: Δt = 2^-level.
#[inline]
pub fn level_dt(level: usize) -> f64 {
    0.5_f64.powi(level as i32)
}
