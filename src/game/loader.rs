//! Level loading from the levels directory.
//!
//! Each `*.json` file below the directory holds one level object. Sub-directories are
//! walked recursively so builders can group areas into folders.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::game::errors::GameError;
use crate::game::level::Level;

fn collect_level_files(dir: &Path, acc: &mut Vec<PathBuf>) -> Result<(), GameError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_level_files(&path, acc)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            acc.push(path);
        }
    }
    Ok(())
}

/// Parse a single level file.
pub fn load_level_from_json<P: AsRef<Path>>(path: P) -> Result<Level, GameError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|source| GameError::LevelFormat {
        path: path.display().to_string(),
        source,
    })
}

/// Load every level below `dir`, in path order.
pub fn load_all_rooms<P: AsRef<Path>>(dir: P) -> Result<Vec<Level>, GameError> {
    let dir = dir.as_ref();
    info!("Loading levels from {}", dir.display());
    let mut files = Vec::new();
    collect_level_files(dir, &mut files)?;
    files.sort();

    let mut levels = Vec::with_capacity(files.len());
    for file in files {
        let level = load_level_from_json(&file)?;
        debug!(" loaded: {} ({})", level.key, file.display());
        levels.push(level);
    }
    info!("{} levels loaded", levels.len());
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_dir() {
        let result = load_all_rooms("does/not/exist");
        assert!(matches!(result, Err(GameError::Io(_))));
    }

    #[test]
    fn loads_nested_json_and_skips_other_files() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join("hall.json"),
            r#"{"key":"hall","tag":"default","name":"Hall"}"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("cellar")).unwrap();
        fs::write(
            dir.path().join("cellar").join("vault.json"),
            r#"{"key":"vault","name":"Vault"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("README.txt"), "not a level").unwrap();

        let levels = load_all_rooms(dir.path()).expect("levels");
        let mut keys: Vec<&str> = levels.iter().map(|l| l.key.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["hall", "vault"]);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let err = load_all_rooms(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
