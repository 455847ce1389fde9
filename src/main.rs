// src/main.rs
//
// Command-line driver for exploratory runs.
//
// Outputs from this driver are written to `runs/` (or the directory
// specified via `out=`) and are not committed to version control.
//
// Examples:
//
//   cargo run --release -- preset=periodic steps=500
//       -> uniform periodic D2Q9 box with a drifting initial state.
//
//   cargo run --release -- preset=refined steps=200 log=debug
//       -> periodic box with two nested refinement levels (MRT collision).
//
//   cargo run --release -- preset=channel steps=5000
//       -> gravity-driven channel between bounce-back walls.
//
//   cargo run --release -- config=my_case.json out=runs run=case1
//       -> any JSON `SolverConfig`.
//
// Typical outputs (per run directory):
//   runs/<run_id>/
//     ├── config.json
//     └── history.csv      (tick, mass, max speed, momentum)

use std::env;
use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use lbm_refine::config::{
    CollisionModel, GravityConfig, RegionConfig, SolverConfig, mrt_rates_from_omega,
};
use lbm_refine::hooks::SolidBounceBack;
use lbm_refine::lattice::LatticeKind;
use lbm_refine::site::SiteType;
use lbm_refine::Solver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preset {
    /// Uniform periodic box, no refinement.
    Periodic,
    /// Periodic box with two nested refinement levels.
    Refined,
    /// Body-force driven channel with solid walls along y.
    Channel,
}

impl Preset {
    fn from_arg(s: &str) -> Option<Self> {
        match s {
            "periodic" => Some(Self::Periodic),
            "refined" => Some(Self::Refined),
            "channel" | "poiseuille" => Some(Self::Channel),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::Refined => "refined",
            Self::Channel => "channel",
        }
    }

    fn config(&self) -> SolverConfig {
        match self {
            Self::Periodic => {
                let mut cfg = SolverConfig::uniform(LatticeKind::D2Q9, 32, 32, 1, 1.0);
                cfg.periodic = true;
                cfg.initial.u = [0.05, 0.0, 0.0];
                cfg
            }
            Self::Refined => {
                let omega = 1.2;
                let mut cfg = SolverConfig::uniform(LatticeKind::D2Q9, 48, 32, 1, omega);
                cfg.periodic = true;
                cfg.collision.model = CollisionModel::Mrt;
                cfg.collision.mrt_rates = Some(mrt_rates_from_omega(LatticeKind::D2Q9, omega));
                cfg.initial.u = [0.02, 0.0, 0.0];
                cfg.regions = vec![RegionConfig {
                    lo: [16, 8, 0],
                    hi: [32, 24, 1],
                    regions: vec![RegionConfig {
                        lo: [8, 8, 0],
                        hi: [24, 24, 1],
                        regions: Vec::new(),
                    }],
                }];
                cfg
            }
            Self::Channel => {
                let mut cfg = SolverConfig::uniform(LatticeKind::D2Q9, 8, 34, 1, 1.0);
                cfg.periodic = true;
                cfg.gravity = Some(GravityConfig { axis: 0, g: 1e-6 });
                cfg.steps = 5000;
                cfg.log_every = 500;
                cfg
            }
        }
    }
}

fn print_usage() {
    eprintln!(
        r#"Usage:
  cargo run -- [config=FILE] [preset=periodic|refined|channel]
             [steps=N] [log=off|error|warn|info|debug|trace]
             [out=DIR] [run=RUN_ID]

Notes:
  - 'config=' takes precedence over 'preset='.
  - Progress (mass, max speed, average wall time per tick) is logged every
    'log_every' ticks of the coarsest level.
"#
    );
}

/// Pick a fresh directory under `out_root` for this run.
///
/// The id defaults to a millisecond timestamp plus `label`; anything outside
/// `[A-Za-z0-9_.-]` becomes `_`, and a numeric suffix avoids clobbering an
/// earlier run with the same id.
fn fresh_run_dir(out_root: &Path, run_id: Option<&str>, label: &str) -> (String, PathBuf) {
    let id: String = match run_id {
        Some(id) => id.to_string(),
        None => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            format!("{}{:03}_{label}", now.as_secs(), now.subsec_millis())
        }
    }
    .chars()
    .map(|c| match c {
        'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.' => c,
        _ => '_',
    })
    .collect();

    let dir = (0..1000)
        .map(|k| match k {
            0 => out_root.join(&id),
            _ => out_root.join(format!("{id}_{k}")),
        })
        .find(|d| !d.exists())
        .unwrap_or_else(|| out_root.join(&id));
    (id, dir)
}

/// Tag the first and last rows of the coarsest level as bounce-back solids.
fn tag_channel_walls(solver: &mut Solver) {
    let field = &mut solver.root_mut().field;
    let (nx, ny) = (field.grid.nx, field.grid.ny);
    for i in 0..nx {
        field.set_site(i, 0, 0, SiteType::Solid);
        field.set_site(i, ny - 1, 0, SiteType::Solid);
    }
}

fn write_history_row(
    w: &mut impl Write,
    solver: &Solver,
) -> std::io::Result<(f64, f64)> {
    let root = &solver.root().field;
    let mass = root.total_mass();
    let umax = solver
        .levels()
        .iter()
        .map(|l| l.field.max_speed())
        .fold(0.0_f64, f64::max);
    let p = root.total_momentum();
    writeln!(
        w,
        "{},{:.12e},{:.6e},{:.6e},{:.6e},{:.6e}",
        solver.tick(),
        mass,
        umax,
        p[0],
        p[1],
        p[2]
    )?;
    Ok((mass, umax))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = env::args().collect();

    let mut preset = Preset::Periodic;
    let mut config_path: Option<PathBuf> = None;
    let mut steps_override: Option<usize> = None;
    let mut log_level = log::LevelFilter::Info;
    let mut out_root_override: Option<String> = None;
    let mut run_id_override: Option<String> = None;

    for arg in argv.iter().skip(1) {
        if arg == "-h" || arg == "--help" || arg == "help" {
            print_usage();
            return Ok(());
        }

        if let Some(v) = arg.strip_prefix("preset=") {
            preset = Preset::from_arg(v).unwrap_or_else(|| {
                eprintln!("Warning: unknown preset '{v}', using periodic");
                Preset::Periodic
            });
            continue;
        }
        if let Some(v) = arg.strip_prefix("config=") {
            config_path = Some(PathBuf::from(v));
            continue;
        }
        if let Some(v) = arg.strip_prefix("steps=") {
            steps_override = v.parse::<usize>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("log=") {
            match v.parse::<log::LevelFilter>() {
                Ok(l) => log_level = l,
                Err(_) => eprintln!("Warning: could not parse log level '{v}', using info"),
            }
            continue;
        }
        if let Some(v) = arg.strip_prefix("out=") {
            out_root_override = Some(v.to_string());
            continue;
        }
        if let Some(v) = arg.strip_prefix("run=") {
            run_id_override = Some(v.to_string());
            continue;
        }

        eprintln!("Warning: ignoring unknown argument '{arg}'");
    }

    env_logger::builder().filter_level(log_level).init();

    let (mut cfg, label) = match &config_path {
        Some(path) => (SolverConfig::from_json_file(path)?, file_label(path)),
        None => (preset.config(), preset.as_str().to_string()),
    };
    if let Some(n) = steps_override {
        cfg.steps = n;
    }

    // -------- output directory setup --------
    let out_root = PathBuf::from(out_root_override.as_deref().unwrap_or("runs"));
    create_dir_all(&out_root)?;
    let (run_id, run_dir) = fresh_run_dir(&out_root, run_id_override.as_deref(), &label);
    create_dir_all(&run_dir)?;
    cfg.write_to_dir(&run_dir)?;

    let mut solver = Solver::new(&cfg)?;
    if config_path.is_none() && preset == Preset::Channel {
        tag_channel_walls(&mut solver);
        solver = solver.with_boundaries(Box::new(SolidBounceBack));
    }

    log::info!(
        "run {}: {} {}x{}x{}, {} level(s), {} steps -> {}",
        run_id,
        cfg.lattice.as_str(),
        cfg.nx,
        cfg.ny,
        cfg.nz,
        solver.root().depth(),
        cfg.steps,
        run_dir.display()
    );

    let mut history = BufWriter::new(File::create(run_dir.join("history.csv"))?);
    writeln!(history, "tick,mass,max_speed,px,py,pz")?;
    write_history_row(&mut history, &solver)?;

    let log_every = cfg.log_every.max(1);
    let started = Instant::now();
    for n in 1..=cfg.steps {
        solver.step();
        let (mass, umax) = write_history_row(&mut history, &solver)?;
        if n % log_every == 0 || n == cfg.steps {
            let ms_per_tick = started.elapsed().as_secs_f64() * 1e3 / n as f64;
            log::info!(
                "tick {:>7}: mass = {:.10}, max |u| = {:.4e}, {:.3} ms/tick",
                solver.tick(),
                mass,
                umax,
                ms_per_tick
            );
            if !umax.is_finite() {
                log::warn!("non-finite velocity at tick {}, stopping", solver.tick());
                break;
            }
        }
    }
    history.flush()?;

    log::info!("done in {:.2} s", started.elapsed().as_secs_f64());
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "config".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_sanitised_and_never_reused() {
        let root = std::env::temp_dir().join(format!("lbm_refine_runs_{}", std::process::id()));
        create_dir_all(&root).unwrap();

        let (id, first) = fresh_run_dir(&root, Some("a b/c"), "periodic");
        assert_eq!(id, "a_b_c");
        assert_eq!(first, root.join("a_b_c"));

        create_dir_all(&first).unwrap();
        let (_, second) = fresh_run_dir(&root, Some("a b/c"), "periodic");
        assert_eq!(second, root.join("a_b_c_1"));

        let (default_id, _) = fresh_run_dir(&root, None, "refined");
        assert!(default_id.ends_with("_refined"));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
