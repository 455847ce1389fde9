// src/hooks.rs
//
// Narrow interfaces to the collaborators the kernel drives but does not own:
// boundary conditions, inter-process halo exchange and immersed boundaries.

use crate::field::LevelField;
use crate::params::LbmParams;
use crate::site::SiteType;

/// Points in the level tick where boundary conditions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPass {
    /// Before forcing and collision (regularised-type inlets).
    PreCollision,
    /// After collision, before streaming (velocity inlets).
    Inlet,
    /// After collision, before streaming (bounce-back walls and solids).
    Wall,
    /// Directly after streaming, before coalesce.
    PostStream,
    /// After coalesce, before macroscopic recovery.
    Outlet,
}

/// Opaque mutator of a level's field, called only at the documented passes.
pub trait BoundaryConditions {
    fn apply(&mut self, pass: BoundaryPass, level: usize, field: &mut LevelField, params: &LbmParams);
}

/// No boundary conditions at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBoundaries;

impl BoundaryConditions for NoBoundaries {
    fn apply(&mut self, _: BoundaryPass, _: usize, _: &mut LevelField, _: &LbmParams) {}
}

/// Half-way bounce-back at `Solid` cells, applied in the `PostStream` pass.
///
/// A population that has just streamed from a fluid cell into a solid along
/// `v` is returned to that fluid cell in direction `opposite[v]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolidBounceBack;

impl BoundaryConditions for SolidBounceBack {
    fn apply(&mut self, pass: BoundaryPass, _level: usize, field: &mut LevelField, params: &LbmParams) {
        if pass != BoundaryPass::PostStream {
            return;
        }
        let vs = &params.velocities;
        let grid = field.grid;
        for idx in 0..field.n_cells() {
            if field.site[idx] != SiteType::Solid {
                continue;
            }
            let p = grid.coords(idx);
            for v in 0..vs.nvel() {
                let c = vs.c[v];
                let Some(src) = grid.offset(p, [-c[0], -c[1], -c[2]]) else {
                    continue;
                };
                let src_idx = grid.idx_of(src);
                if !field.site[src_idx].is_physical_fluid() {
                    continue;
                }
                let incoming = field.f[field.fi(idx, v)];
                let dst = field.fi(src_idx, vs.opposite[v]);
                field.f[dst] = incoming;
            }
        }
    }
}

/// Domain-decomposition layer seen from the coarsest level.
///
/// The adjacency predicates take cell indices of the coarsest level.
pub trait HaloExchange {
    /// Number of exchange directions refreshed per tick.
    fn directions(&self) -> usize;

    /// Overwrite this process's halo cells for `dir` with the neighbour's
    /// current-generation populations; returns the refreshed cell indices.
    fn refresh(&mut self, dir: usize, field: &mut LevelField) -> Vec<usize>;

    /// Cell belongs to a received halo layer.
    fn is_recv_layer(&self, idx: usize) -> bool;

    /// Cell belongs to a locally owned layer that is sent to a neighbour.
    fn is_sender_layer(&self, idx: usize) -> bool;

    /// The halo layer containing `idx` is linked to a periodic neighbour.
    fn is_periodic_overlap(&self, idx: usize) -> bool;
}

/// Immersed-boundary collaborator used by the predictor-corrector tick.
pub trait ImmersedBoundary {
    /// Cartesian force per cell (`n_cells * dims`) computed from the predicted field.
    fn compute_forces(&mut self, field: &LevelField, params: &LbmParams) -> Vec<f64>;

    /// Advance body positions once per completed predictor-corrector pair.
    fn move_bodies(&mut self, field: &LevelField);
}
