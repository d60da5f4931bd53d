//! delve: generate a multi-floor dungeon from the command line
//!
//! Loads a JSON config (or the defaults), generates the dungeon, prints a
//! summary and optionally an ASCII map of each floor. Runtime state can be
//! written to and read back from a save file.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use strum::IntoEnumIterator;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use delve_core::dungeon::{CellType, CorridorStrategy, set_cell};
use delve_core::{DungeonConfig, FloorParams, World};
use delve_save::{default_save_path, list_saves, load_world, save_dir, save_world};

/// Procedural multi-floor dungeon generator
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(author, version, about = "Delve - generate a dungeon", long_about = None)]
struct Args {
    /// JSON config file (defaults are used when absent)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// RNG seed, overrides the config
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Number of floors; extra floors copy the last configured one
    #[arg(short = 'n', long = "floors")]
    floors: Option<usize>,

    /// Corridor strategy for every floor (tree or flat)
    #[arg(long = "strategy")]
    strategy: Option<String>,

    /// Print an ASCII map of each floor
    #[arg(short = 'a', long = "ascii")]
    ascii: bool,

    /// Only print this floor's map
    #[arg(short = 'f', long = "floor")]
    floor: Option<usize>,

    /// Write runtime state to this file after generating
    #[arg(long = "save")]
    save: Option<PathBuf>,

    /// Save under this name in the default save directory
    #[arg(long = "save-name")]
    save_name: Option<String>,

    /// Regenerate from a save file instead of a config
    #[arg(long = "load")]
    load: Option<PathBuf>,

    /// List saves in the default save directory
    #[arg(long = "list-saves")]
    list_saves: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    if args.list_saves {
        for (path, header) in list_saves(save_dir())? {
            println!(
                "{}  seed {}  {} floors  saved at {}",
                path.display(),
                header.seed,
                header.floors,
                header.timestamp
            );
        }
        return Ok(());
    }

    let (world, config) = match &args.load {
        Some(path) => {
            let save = delve_save::load_save(path)?;
            let config = save.config.clone();
            let (world, report) = save.into_world()?;
            if !report.is_clean() {
                for issue in &report.skipped {
                    println!("skipped: {issue}");
                }
            }
            (world, config)
        }
        None => {
            let config = build_config(args)?;
            let world = World::from_config(&config)?;
            (world, config)
        }
    };

    world.validate()?;
    print_summary(&world);

    if args.ascii {
        for index in 0..world.floors().len() {
            if args.floor.is_none_or(|f| f == index) {
                print_floor(&world, index);
            }
        }
    }

    let save_path = match (&args.save, &args.save_name) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(name)) => Some(default_save_path(name)?),
        (None, None) => None,
    };
    if let Some(path) = save_path {
        save_world(&world, &config, &path)?;
        info!(path = %path.display(), "wrote save");
    }
    Ok(())
}

/// Config file or defaults, with command-line overrides applied
fn build_config(args: &Args) -> Result<DungeonConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => DungeonConfig::from_path(path)?,
        None => DungeonConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(count) = args.floors {
        let template = config.floors.last().cloned().unwrap_or_default();
        config.floors.resize(count, template);
    }
    if let Some(name) = &args.strategy {
        let strategy = parse_strategy(name)
            .ok_or_else(|| format!("unknown corridor strategy: {name}"))?;
        for floor in &mut config.floors {
            floor.corridor_strategy = strategy;
        }
    }

    config.validate()?;
    Ok(config)
}

fn parse_strategy(name: &str) -> Option<CorridorStrategy> {
    CorridorStrategy::iter().find(|s| s.to_string().eq_ignore_ascii_case(name))
}

fn print_summary(world: &World) {
    let (rows, cols) = world.world_size();
    println!(
        "seed {}  {} floors  {}x{}  start on floor {}",
        world.seed(),
        world.floors().len(),
        rows,
        cols,
        world.active_floor()
    );
    for floor in world.floors() {
        let params: &FloorParams = floor.params();
        let locked = floor.doors().iter().filter(|d| d.is_locked()).count();
        println!(
            "  floor {}: {} rooms, {} corridors ({}), {} doors ({} locked), {} staircases",
            floor.index(),
            floor.room_count(),
            floor.connectors().len(),
            params.corridor_strategy,
            floor.doors().len(),
            locked,
            world.staircases_on(floor.index()).len()
        );
    }
}

fn print_floor(world: &World, index: usize) {
    let Some(floor) = world.floor(index) else {
        return;
    };
    let mut grid = floor.rasterize();
    for stairs in world.staircases_on(index) {
        set_cell(&mut grid, stairs.pos, CellType::Stairs);
    }

    println!();
    println!("floor {index}");
    for row in &grid {
        let line: String = row.iter().map(|c| c.symbol()).collect();
        println!("{}", line.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strategy() {
        assert_eq!(parse_strategy("tree"), Some(CorridorStrategy::Tree));
        assert_eq!(parse_strategy("Flat"), Some(CorridorStrategy::Flat));
        assert_eq!(parse_strategy("maze"), None);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from(["delve", "--seed", "5", "--floors", "5", "--strategy", "tree"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.floors.len(), 5);
        assert!(
            config
                .floors
                .iter()
                .all(|f| f.corridor_strategy == CorridorStrategy::Tree)
        );
    }

    #[test]
    fn test_zero_floors_rejected() {
        let args = Args::parse_from(["delve", "--floors", "0"]);
        assert!(build_config(&args).is_err());
    }
}
