//! delve-save: Save/restore of runtime dungeon state
//!
//! A save never stores topology. It keeps the configuration (with the seed
//! filled in) and the runtime state; loading regenerates the dungeon from
//! the configuration and overlays the state by id.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use delve_core::{DungeonConfig, GenError, RestoreReport, RuntimeState, World};

/// Current save file format version
pub const SAVE_VERSION: u32 = 1;

/// Save/restore errors
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Save file not found: {0}")]
    NotFound(PathBuf),

    #[error("Incompatible save version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: u32, found: u32 },

    #[error("Invalid save file header")]
    InvalidHeader,

    #[error("Save file does not record a seed")]
    MissingSeed,

    #[error("Header says {header} floors but the config has {config}")]
    FloorMismatch { header: usize, config: usize },

    #[error("Could not regenerate dungeon: {0}")]
    Generate(#[from] GenError),
}

/// Save file header for versioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    /// Magic identifier
    pub magic: String,
    /// Save format version
    pub version: u32,
    /// Seed the topology regenerates from
    pub seed: u64,
    /// Number of floors
    pub floors: usize,
    /// Timestamp of save
    pub timestamp: u64,
}

impl SaveHeader {
    const MAGIC: &'static str = "DLVS";

    pub fn new(world: &World) -> Self {
        Self {
            magic: Self::MAGIC.to_string(),
            version: SAVE_VERSION,
            seed: world.seed(),
            floors: world.floors().len(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.magic != Self::MAGIC {
            return Err(SaveError::InvalidHeader);
        }
        if self.version != SAVE_VERSION {
            return Err(SaveError::IncompatibleVersion {
                expected: SAVE_VERSION,
                found: self.version,
            });
        }
        Ok(())
    }
}

/// Complete save file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    pub header: SaveHeader,
    pub config: DungeonConfig,
    pub state: RuntimeState,
}

impl SaveFile {
    /// Capture `world`, pinning the config to the world's seed
    pub fn new(world: &World, config: &DungeonConfig) -> Self {
        let config = DungeonConfig {
            seed: Some(world.seed()),
            ..config.clone()
        };
        Self {
            header: SaveHeader::new(world),
            config,
            state: world.snapshot(),
        }
    }

    /// Rebuild the world and overlay the saved state
    pub fn into_world(self) -> Result<(World, RestoreReport), SaveError> {
        self.header.validate()?;
        if self.config.seed != Some(self.header.seed) {
            return Err(SaveError::MissingSeed);
        }
        if self.config.floors.len() != self.header.floors {
            return Err(SaveError::FloorMismatch {
                header: self.header.floors,
                config: self.config.floors.len(),
            });
        }

        let mut world = World::from_config(&self.config)?;
        let report = world.restore(&self.state);
        if !report.is_clean() {
            warn!(
                skipped = report.skipped.len(),
                "save did not match regenerated dungeon"
            );
        }
        Ok((world, report))
    }
}

/// Only the header, for listings
#[derive(Deserialize)]
struct HeaderOnly {
    header: SaveHeader,
}

fn open(path: &Path) -> Result<BufReader<File>, SaveError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SaveError::NotFound(path.to_path_buf()),
        _ => SaveError::Io(e),
    })?;
    Ok(BufReader::new(file))
}

/// Save the runtime state of `world` to a file
pub fn save_world(
    world: &World,
    config: &DungeonConfig,
    path: impl AsRef<Path>,
) -> Result<(), SaveError> {
    let path = path.as_ref();
    let save_file = SaveFile::new(world, config);

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &save_file)?;
    info!(path = %path.display(), records = save_file.state.len(), "saved dungeon");
    Ok(())
}

/// Load a save file without rebuilding the world
pub fn load_save(path: impl AsRef<Path>) -> Result<SaveFile, SaveError> {
    let save_file: SaveFile = serde_json::from_reader(open(path.as_ref())?)?;
    save_file.header.validate()?;
    Ok(save_file)
}

/// Regenerate the saved dungeon and overlay its runtime state
pub fn load_world(path: impl AsRef<Path>) -> Result<(World, RestoreReport), SaveError> {
    let path = path.as_ref();
    let (world, report) = load_save(path)?.into_world()?;
    info!(
        path = %path.display(),
        applied = report.applied,
        skipped = report.skipped.len(),
        "loaded dungeon"
    );
    Ok((world, report))
}

/// Load only the header from a save file (for save browsers)
pub fn load_header(path: impl AsRef<Path>) -> Result<SaveHeader, SaveError> {
    let only: HeaderOnly = serde_json::from_reader(open(path.as_ref())?)?;
    only.header.validate()?;
    Ok(only.header)
}

/// Check if a save file exists
pub fn save_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Delete a save file
pub fn delete_save(path: impl AsRef<Path>) -> Result<(), SaveError> {
    std::fs::remove_file(path)?;
    Ok(())
}

/// Directory saves live in by default
pub fn save_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("delve");
    path.push("saves");
    path
}

/// Path of the named save inside `dir`, creating `dir` if needed
pub fn save_path_in(dir: impl AsRef<Path>, name: &str) -> Result<PathBuf, SaveError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    Ok(dir.join(format!("{}.json", name)))
}

/// Get the default save path for a named save
pub fn default_save_path(name: &str) -> Result<PathBuf, SaveError> {
    save_path_in(save_dir(), name)
}

/// List valid saves in `dir`, newest first
pub fn list_saves(dir: impl AsRef<Path>) -> Result<Vec<(PathBuf, SaveHeader)>, SaveError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut saves = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "json")
            && let Ok(header) = load_header(&path)
        {
            saves.push((path, header));
        }
    }

    saves.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
    Ok(saves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::FloorParams;

    fn config(seed: u64) -> DungeonConfig {
        DungeonConfig {
            seed: Some(seed),
            floors: vec![FloorParams::default(); 2],
            staircase_chance: 1,
            start_floor: None,
        }
    }

    #[test]
    fn test_round_trip_keeps_modified_doors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");

        let config = config(31);
        let mut world = World::from_config(&config).unwrap();
        let door = world.floor(0).unwrap().doors()[0].id;
        world.door_mut(door).unwrap().set_open(false);
        world.door_mut(door).unwrap().set_locked(true);
        save_world(&world, &config, &path).unwrap();

        let (loaded, report) = load_world(&path).unwrap();
        assert!(report.is_clean());
        assert_eq!(loaded.seed(), 31);
        let restored = loaded.door(door).unwrap();
        assert!(!restored.is_open());
        assert!(restored.is_locked());
        assert_eq!(loaded.snapshot(), world.snapshot());
        assert_eq!(loaded.floors(), world.floors());
    }

    #[test]
    fn test_unseeded_config_is_pinned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("random.json");

        let config = DungeonConfig {
            seed: None,
            ..config(0)
        };
        let world = World::from_config(&config).unwrap();
        save_world(&world, &config, &path).unwrap();

        let header = load_header(&path).unwrap();
        assert_eq!(header.seed, world.seed());
        assert_eq!(header.floors, 2);
        let (loaded, _) = load_world(&path).unwrap();
        assert_eq!(loaded.floors(), world.floors());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_world(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SaveError::NotFound(_)));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let world = World::from_config(&config(4)).unwrap();
        let mut save = SaveFile::new(&world, &config(4));
        save.header.magic = "NOPE".to_string();
        std::fs::write(&path, serde_json::to_string(&save).unwrap()).unwrap();

        assert!(matches!(load_header(&path), Err(SaveError::InvalidHeader)));
        assert!(matches!(load_world(&path), Err(SaveError::InvalidHeader)));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let world = World::from_config(&config(4)).unwrap();
        let mut save = SaveFile::new(&world, &config(4));
        save.header.version = SAVE_VERSION + 1;
        assert!(matches!(
            save.into_world(),
            Err(SaveError::IncompatibleVersion { found, .. }) if found == SAVE_VERSION + 1
        ));
    }

    #[test]
    fn test_stale_records_reported() {
        let world = World::from_config(&config(12)).unwrap();
        let mut save = SaveFile::new(&world, &config(12));
        save.state.doors.push(delve_core::dungeon::DoorRecord {
            id: delve_core::DoorId(50_000),
            is_open: true,
            is_locked: false,
        });

        let (_, report) = save.into_world().unwrap();
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_list_saves_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let world = World::from_config(&config(1)).unwrap();
        for (name, timestamp) in [("old", 10), ("new", 20)] {
            let mut save = SaveFile::new(&world, &config(1));
            save.header.timestamp = timestamp;
            let path = dir.path().join(format!("{name}.json"));
            std::fs::write(path, serde_json::to_string(&save).unwrap()).unwrap();
        }
        std::fs::write(dir.path().join("junk.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();

        let saves = list_saves(dir.path()).unwrap();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0].1.timestamp, 20);
        assert!(saves[0].0.ends_with("new.json"));
    }

    #[test]
    fn test_save_path_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let saves = dir.path().join("nested").join("saves");
        let path = save_path_in(&saves, "run").unwrap();
        assert!(saves.is_dir());
        assert_eq!(path, saves.join("run.json"));
    }

    #[test]
    fn test_save_path_reports_unusable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let err = save_path_in(blocker.join("saves"), "run").unwrap_err();
        assert!(matches!(err, SaveError::Io(_)));
    }

    #[test]
    fn test_delete_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.json");
        let world = World::from_config(&config(2)).unwrap();
        save_world(&world, &config(2), &path).unwrap();
        assert!(save_exists(&path));
        delete_save(&path).unwrap();
        assert!(!save_exists(&path));
    }
}
