// src/amr/hierarchy.rs

use crate::amr::rect::Box3i;
use crate::config::{RegionConfig, SolverConfig};
use crate::error::ConfigError;
use crate::field::{FieldSnapshot, LevelField};
use crate::grid::Grid3D;
use crate::params::{LbmParams, LevelRelaxation};
use crate::site::SiteType;

/// Width (in fine cells) of the band of a child level filled by explode.
pub const TRANSITION_WIDTH: usize = 2;

/// One refinement level and the finer levels nested inside it.
///
/// Each level owns its children by value; parent/child exchange goes through
/// `amr::coupling` with both records passed explicitly.
#[derive(Debug, Clone)]
pub struct GridLevel {
    /// 0 for the coarsest level.
    pub level: usize,
    pub field: LevelField,
    pub relax: LevelRelaxation,
    pub children: Vec<RefinedRegion>,
    /// Ticks completed by this level (two per parent tick below the root).
    pub t: u64,
}

/// A child level together with the parent-index box it refines.
#[derive(Debug, Clone)]
pub struct RefinedRegion {
    pub region: Box3i,
    pub grid: GridLevel,
}

/// Deep copy of the evolving state of a level tree.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    field: FieldSnapshot,
    t: u64,
    children: Vec<TreeSnapshot>,
}

impl GridLevel {
    /// Number of levels in this subtree, counting itself.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|c| c.grid.depth())
            .max()
            .unwrap_or(0)
    }

    /// All levels of the subtree, depth-first, parent before children.
    pub fn levels(&self) -> Vec<&GridLevel> {
        let mut out = vec![self];
        for c in &self.children {
            out.extend(c.grid.levels());
        }
        out
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            field: self.field.snapshot(),
            t: self.t,
            children: self.children.iter().map(|c| c.grid.snapshot()).collect(),
        }
    }

    pub fn restore(&mut self, s: &TreeSnapshot) {
        assert_eq!(
            s.children.len(),
            self.children.len(),
            "snapshot taken from a different hierarchy"
        );
        self.field.restore(&s.field);
        self.t = s.t;
        for (c, cs) in self.children.iter_mut().zip(s.children.iter()) {
            c.grid.restore(cs);
        }
    }
}

/// Build and initialise the whole level tree described by `cfg`.
///
/// Every child region is validated against its parent before any cell is
/// tagged; all levels start at the configured uniform equilibrium.
pub fn build_hierarchy(
    cfg: &SolverConfig,
    params: &LbmParams,
    relax: LevelRelaxation,
) -> Result<GridLevel, ConfigError> {
    let grid = Grid3D::new(cfg.nx, cfg.ny, cfg.nz);
    let root = build_level(cfg, params, 0, grid, relax, &cfg.regions, "regions")?;
    log::info!(
        "hierarchy: {} level(s), root {}x{}x{}, {} collision",
        root.depth(),
        cfg.nx,
        cfg.ny,
        cfg.nz,
        params.collision.as_str()
    );
    Ok(root)
}

fn build_level(
    cfg: &SolverConfig,
    params: &LbmParams,
    level: usize,
    grid: Grid3D,
    relax: LevelRelaxation,
    regions: &[RegionConfig],
    path: &str,
) -> Result<GridLevel, ConfigError> {
    let vs = &params.velocities;
    let dims = vs.dims;
    let mut field = LevelField::new(grid, vs);

    // Rim band of a refined level receives its populations from the parent.
    if level > 0 {
        let core = Box3i::covering(grid.extent()).shrink(TRANSITION_WIDTH, dims);
        for idx in 0..field.n_cells() {
            if !core.contains(grid.coords(idx)) {
                field.site[idx] = SiteType::TransitionReceiveFromFiner;
            }
        }
    }

    let boxes = validate_regions(regions, grid.extent(), dims, level, path)?;

    let mut children = Vec::with_capacity(regions.len());
    for (n, (rc, region)) in regions.iter().zip(boxes).enumerate() {
        for p in region.cells() {
            let tag = if region.on_rim(p, dims) {
                SiteType::TransitionToCoarser
            } else {
                SiteType::CoveredByFiner
            };
            field.site[grid.idx_of(p)] = tag;
        }

        let size = region.size();
        let mut ext = [1usize; 3];
        for d in 0..dims {
            ext[d] = 2 * size[d];
        }
        let child_grid = Grid3D::new(ext[0], ext[1], ext[2]);
        let child_path = format!("{path}[{n}].regions");
        let child = build_level(
            cfg,
            params,
            level + 1,
            child_grid,
            relax.refined(),
            &rc.regions,
            &child_path,
        )?;
        children.push(RefinedRegion {
            region,
            grid: child,
        });
    }

    field.initialise_equilibrium(vs, cfg.initial.rho, &cfg.initial.u);

    log::info!(
        "level {level}: {}x{}x{} cells, omega = {:.6}, {} child region(s)",
        grid.nx,
        grid.ny,
        grid.nz,
        relax.omega,
        children.len()
    );

    Ok(GridLevel {
        level,
        field,
        relax,
        children,
        t: 0,
    })
}

/// Check a level's child boxes against its extents and against each other.
fn validate_regions(
    regions: &[RegionConfig],
    extent: [usize; 3],
    dims: usize,
    level: usize,
    path: &str,
) -> Result<Vec<Box3i>, ConfigError> {
    // Nested regions must stay clear of the band filled by explode.
    let allowed = if level > 0 {
        Box3i::covering(extent).shrink(TRANSITION_WIDTH, dims)
    } else {
        Box3i::covering(extent)
    };

    let mut boxes: Vec<Box3i> = Vec::with_capacity(regions.len());
    for (n, rc) in regions.iter().enumerate() {
        let name = format!("{path}[{n}]");
        let (lo, hi) = (rc.lo, rc.hi);
        let region = Box3i::new(lo, hi);

        if region.is_empty() {
            return Err(ConfigError::EmptyRegion { path: name, lo, hi });
        }
        if !region.fits_in(extent) {
            return Err(ConfigError::RegionOutOfBounds {
                path: name,
                lo,
                hi,
                extent,
            });
        }
        for axis in dims..3 {
            if lo[axis] != 0 || hi[axis] != 1 {
                return Err(ConfigError::InactiveAxisRefined { path: name, axis });
            }
        }
        let size = region.size();
        for axis in 0..dims {
            if size[axis] < 2 {
                return Err(ConfigError::RegionTooSmall {
                    path: name,
                    axis,
                    cells: size[axis],
                });
            }
        }
        if !allowed.contains_box(region) {
            return Err(ConfigError::RegionOnTransitionRim { path: name, lo, hi });
        }
        for (m, other) in boxes.iter().enumerate() {
            if region.intersect(*other).is_some() {
                return Err(ConfigError::RegionOverlap {
                    a: format!("{path}[{m}]"),
                    b: name,
                });
            }
        }
        boxes.push(region);
    }
    Ok(boxes)
}
