//! Program persistence for SAVE, LOAD, FILES and KILL
//!
//! The interpreter talks to a [`ProgramStorage`] backend by name. Two backends
//! ship with the crate: an in-memory map and a directory of bincode-encoded
//! `<name>.bas` files.

use crate::error::{BasicError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File extension used by [`DirectoryStorage`]
pub const PROGRAM_EXTENSION: &str = "bas";

/// A saved program: `(line number, statement text)` pairs in ascending order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgramSnapshot {
    pub lines: Vec<(u32, String)>,
}

impl ProgramSnapshot {
    /// Check the snapshot describes a well-formed program.
    ///
    /// Line numbers must be positive and strictly ascending, and every line
    /// must carry statement text.
    pub fn validate(&self) -> Result<()> {
        let mut previous = 0;
        for (number, text) in &self.lines {
            if *number <= previous {
                return Err(BasicError::FileLoadError(format!(
                    "line {} out of order",
                    number
                )));
            }
            if text.trim().is_empty() {
                return Err(BasicError::FileLoadError(format!("line {} is empty", number)));
            }
            previous = *number;
        }
        Ok(())
    }
}

/// Backend for named program snapshots
pub trait ProgramStorage: std::fmt::Debug {
    /// Store a snapshot, replacing any program with the same name
    fn save(&mut self, name: &str, snapshot: &ProgramSnapshot) -> Result<()>;

    /// Fetch a snapshot; FILE NOT FOUND if absent
    fn load(&self, name: &str) -> Result<ProgramSnapshot>;

    /// Names of all stored programs, sorted
    fn list(&self) -> Result<Vec<String>>;

    /// Remove a snapshot; FILE NOT FOUND if absent
    fn delete(&mut self, name: &str) -> Result<()>;
}

/// Validate a quoted file-name argument and fold it to lower case.
///
/// The argument must be exactly one non-empty double-quoted string. Path
/// separators are rejected so a name always maps to a single file.
pub fn parse_file_name(argument: &str) -> Result<String> {
    let inner = argument
        .trim()
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or(BasicError::BadFileName)?;

    let valid = !inner.trim().is_empty()
        && !inner.contains(['"', '/', '\\'])
        && inner != "."
        && inner != "..";
    if !valid {
        return Err(BasicError::BadFileName);
    }

    Ok(inner.to_lowercase())
}

/// In-memory program storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    programs: HashMap<String, ProgramSnapshot>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgramStorage for MemoryStorage {
    fn save(&mut self, name: &str, snapshot: &ProgramSnapshot) -> Result<()> {
        self.programs.insert(name.to_string(), snapshot.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<ProgramSnapshot> {
        self.programs
            .get(name)
            .cloned()
            .ok_or_else(|| BasicError::FileNotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.programs.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        self.programs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BasicError::FileNotFound(name.to_string()))
    }
}

/// Program storage backed by a directory of `<name>.bas` files
#[derive(Debug)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    /// Open a storage directory, creating it if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, PROGRAM_EXTENSION))
    }
}

fn not_found_or_io(name: &str, err: std::io::Error) -> BasicError {
    if err.kind() == ErrorKind::NotFound {
        BasicError::FileNotFound(name.to_string())
    } else {
        BasicError::from(err)
    }
}

impl ProgramStorage for DirectoryStorage {
    fn save(&mut self, name: &str, snapshot: &ProgramSnapshot) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(snapshot, bincode::config::standard())
            .map_err(|err| BasicError::Io(err.to_string()))?;
        let path = self.path_for(name);
        debug!("writing {} bytes to {}", bytes.len(), path.display());
        fs::write(path, bytes)?;
        Ok(())
    }

    fn load(&self, name: &str) -> Result<ProgramSnapshot> {
        let bytes = fs::read(self.path_for(name)).map_err(|err| not_found_or_io(name, err))?;
        let (snapshot, _): (ProgramSnapshot, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|err| BasicError::FileLoadError(err.to_string()))?;
        Ok(snapshot)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PROGRAM_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        fs::remove_file(self.path_for(name)).map_err(|err| not_found_or_io(name, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(lines: &[(u32, &str)]) -> ProgramSnapshot {
        ProgramSnapshot {
            lines: lines.iter().map(|(n, t)| (*n, t.to_string())).collect(),
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "retro-basic-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(parse_file_name(r#" "Hello" "#).unwrap(), "hello");
        assert_eq!(parse_file_name(r#""my prog""#).unwrap(), "my prog");
        assert_eq!(parse_file_name("hello"), Err(BasicError::BadFileName));
        assert_eq!(parse_file_name(r#""""#), Err(BasicError::BadFileName));
        assert_eq!(parse_file_name(r#""a"b""#), Err(BasicError::BadFileName));
        assert_eq!(parse_file_name(r#""../x""#), Err(BasicError::BadFileName));
        assert_eq!(parse_file_name(""), Err(BasicError::BadFileName));
    }

    #[test]
    fn test_snapshot_validation() {
        assert!(snapshot(&[(10, "PRINT 1"), (20, "END")]).validate().is_ok());
        assert!(ProgramSnapshot::default().validate().is_ok());
        assert!(matches!(
            snapshot(&[(0, "PRINT 1")]).validate(),
            Err(BasicError::FileLoadError(_))
        ));
        assert!(matches!(
            snapshot(&[(20, "PRINT 1"), (10, "END")]).validate(),
            Err(BasicError::FileLoadError(_))
        ));
        assert!(matches!(
            snapshot(&[(10, "PRINT 1"), (10, "END")]).validate(),
            Err(BasicError::FileLoadError(_))
        ));
        assert!(matches!(
            snapshot(&[(10, "  ")]).validate(),
            Err(BasicError::FileLoadError(_))
        ));
    }

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        let program = snapshot(&[(10, "PRINT 1")]);

        storage.save("b", &program).unwrap();
        storage.save("a", &program).unwrap();
        assert_eq!(storage.list().unwrap(), vec!["a", "b"]);
        assert_eq!(storage.load("a").unwrap(), program);

        storage.delete("a").unwrap();
        assert_eq!(storage.load("a"), Err(BasicError::FileNotFound("a".to_string())));
        assert_eq!(storage.delete("a"), Err(BasicError::FileNotFound("a".to_string())));
    }

    #[test]
    fn test_directory_storage_roundtrip() {
        let dir = scratch_dir("roundtrip");
        let mut storage = DirectoryStorage::new(&dir).unwrap();
        let program = snapshot(&[(10, "PRINT \"HI\""), (20, "END")]);

        storage.save("demo", &program).unwrap();
        storage.save("alpha", &program).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        assert_eq!(storage.list().unwrap(), vec!["alpha", "demo"]);
        assert_eq!(storage.load("demo").unwrap(), program);

        storage.delete("demo").unwrap();
        assert!(matches!(storage.load("demo"), Err(BasicError::FileNotFound(_))));
        assert!(matches!(storage.delete("demo"), Err(BasicError::FileNotFound(_))));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_directory_storage_corrupt_file() {
        let dir = scratch_dir("corrupt");
        let storage = DirectoryStorage::new(&dir).unwrap();
        fs::write(dir.join("broken.bas"), [0xFF, 0xFF, 0xFF]).unwrap();

        assert!(matches!(
            storage.load("broken"),
            Err(BasicError::FileLoadError(_))
        ));

        let _ = fs::remove_dir_all(&dir);
    }
}
