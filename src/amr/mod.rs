pub mod coupling;
pub mod hierarchy;
pub mod rect;
pub mod stepper;

pub use coupling::{coalesce, explode, fine_siblings};
pub use hierarchy::{build_hierarchy, GridLevel, RefinedRegion, TreeSnapshot};
pub use rect::Box3i;
pub use stepper::{run_level, ForceMode, Solver};
