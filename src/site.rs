// src/site.rs

use serde::{Deserialize, Serialize};

/// Role of a lattice cell within its level. Exactly one tag per cell.
///
/// The refinement tags come in pairs across a parent/child interface:
/// a parent cell on the rim of a child region is `TransitionToCoarser`
/// and covers 2^dims child cells tagged `TransitionReceiveFromFiner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SiteType {
    /// No-slip solid; ρ = 1, u = 0 always.
    Solid,
    /// Ordinary fluid cell (also the coarse-active cells of a refined level).
    #[default]
    Fluid,
    /// Parent cell whose volume is fully resolved by a child level.
    CoveredByFiner,
    /// Child rim cell; populations arrive by explode, never by collision.
    TransitionReceiveFromFiner,
    /// Parent rim cell of a child region; explode source and coalesce target.
    TransitionToCoarser,
    /// Solid whose density is not recovered from populations; coalesce may still fill it.
    SolidVariant,
    /// Open inlet that keeps its own populations through streaming.
    DoNothingInlet,
}

impl SiteType {
    /// Cells that run the collision operator.
    #[inline]
    pub fn collides(self) -> bool {
        !matches!(self, Self::CoveredByFiner | Self::TransitionReceiveFromFiner)
    }

    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, Self::Solid | Self::SolidVariant)
    }

    /// Cells that take part in mass/momentum diagnostics.
    #[inline]
    pub fn is_physical_fluid(self) -> bool {
        !matches!(self, Self::CoveredByFiner | Self::Solid | Self::SolidVariant)
    }
}
