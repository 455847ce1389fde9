// src/stream.rs
//
// Push streaming with ordered exclusion rules. The next-generation buffer
// starts zeroed: components nobody writes stay at 0, which is what coalesce
// keys on at the coarse side of a refinement interface.

use crate::field::LevelField;
use crate::hooks::HaloExchange;
use crate::params::LbmParams;
use crate::site::SiteType;

/// Where a level sits in the hierarchy, as far as streaming cares.
#[derive(Clone, Copy, Default)]
pub struct StreamContext<'a> {
    /// The level is the root of the tree (periodic wrap only happens there).
    pub coarsest: bool,
    /// Domain-decomposition layer of the coarsest level, if any.
    pub halo: Option<&'a dyn HaloExchange>,
}

impl<'a> StreamContext<'a> {
    pub fn coarsest(halo: Option<&'a dyn HaloExchange>) -> Self {
        Self {
            coarsest: true,
            halo,
        }
    }

    pub fn refined() -> Self {
        Self {
            coarsest: false,
            halo: None,
        }
    }
}

/// Move every population one lattice link along its velocity.
///
/// Per source cell and direction, first match wins:
///  1. `CoveredByFiner` sources stream nothing.
///  2. `DoNothingInlet` sources keep all their own populations.
///  3. Off-grid destinations wrap (periodic root level without halo, both
///     ends `Fluid`); otherwise the source keeps its opposite population.
///  4. A received-halo source feeding a sender cell across a periodic
///     linkage streams only if periodic and both ends are `Fluid`; otherwise
///     the destination keeps its own value.
///  5. `TransitionToCoarser` to `TransitionToCoarser` and any transfer into
///     a `DoNothingInlet` are skipped.
///  6. Plain copy.
pub fn stream(field: &mut LevelField, params: &LbmParams, ctx: StreamContext<'_>) {
    let vs = &params.velocities;
    let nvel = field.nvel;
    let grid = field.grid;
    let wrap = params.periodic && ctx.coarsest && ctx.halo.is_none();
    // The halo predicates address the coarsest level only.
    let halo = if ctx.coarsest { ctx.halo } else { None };

    let LevelField { f, f_next, site, .. } = field;
    f_next.fill(0.0);

    for src in 0..grid.n_cells() {
        let s_type = site[src];
        match s_type {
            SiteType::CoveredByFiner => continue,
            SiteType::DoNothingInlet => {
                let cell = src * nvel..(src + 1) * nvel;
                f_next[cell.clone()].copy_from_slice(&f[cell]);
                continue;
            }
            _ => {}
        }

        let p = grid.coords(src);
        for v in 0..nvel {
            let c = vs.c[v];

            let Some(q) = grid.offset(p, c) else {
                if wrap {
                    let dest = grid.idx_of(grid.offset_wrapped(p, c));
                    if s_type == SiteType::Fluid && site[dest] == SiteType::Fluid {
                        f_next[dest * nvel + v] = f[src * nvel + v];
                        continue;
                    }
                }
                let o = src * nvel + vs.opposite[v];
                f_next[o] = f[o];
                continue;
            };
            let dest = grid.idx_of(q);
            let d_type = site[dest];

            if let Some(h) = halo {
                if h.is_recv_layer(src) && h.is_sender_layer(dest) && h.is_periodic_overlap(src) {
                    let linked = params.periodic
                        && s_type == SiteType::Fluid
                        && d_type == SiteType::Fluid;
                    f_next[dest * nvel + v] = if linked {
                        f[src * nvel + v]
                    } else {
                        f[dest * nvel + v]
                    };
                    continue;
                }
            }

            if s_type == SiteType::TransitionToCoarser && d_type == SiteType::TransitionToCoarser {
                continue;
            }
            if d_type == SiteType::DoNothingInlet {
                continue;
            }

            f_next[dest * nvel + v] = f[src * nvel + v];
        }
    }

    std::mem::swap(f, f_next);
}
