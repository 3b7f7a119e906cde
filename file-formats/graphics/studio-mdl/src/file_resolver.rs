//! Loading of external sequence group files
//!
//! Sequences in group 0 store their animation data inside the model. Larger
//! models split the rest into `<model>01.mdl`, `<model>02.mdl` and so on,
//! which are only read the first time one of their sequences is evaluated.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunks::StudioSequenceGroup;
use crate::error::{Result, StudioError};

/// Trait for loading the raw bytes of an external sequence group
pub trait FileResolver {
    /// Load the file backing `group`, which is entry `index` of the group table
    fn load_sequence_group(&self, index: usize, group: &StudioSequenceGroup) -> Result<Vec<u8>>;
}

/// Resolves group file names against a directory on disk
///
/// Group names usually carry a game-relative path such as
/// `models/barney01.mdl`; when that path does not exist under the base
/// directory, the bare file name is tried next to the model.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    base_path: PathBuf,
}

impl DirectoryResolver {
    /// Create a resolver rooted at `base_path`
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Base directory used for resolution
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Candidate paths for a group file, in lookup order
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut paths = vec![self.base_path.join(name)];
        if let Some(file_name) = Path::new(name).file_name() {
            let flat = self.base_path.join(file_name);
            if flat != paths[0] {
                paths.push(flat);
            }
        }
        paths
    }
}

impl FileResolver for DirectoryResolver {
    fn load_sequence_group(&self, index: usize, group: &StudioSequenceGroup) -> Result<Vec<u8>> {
        for path in self.candidates(&group.name) {
            if path.is_file() {
                log::debug!("Reading sequence group {} from {}", index, path.display());
                return fs::read(&path).map_err(StudioError::Io);
            }
        }

        Err(StudioError::SequenceGroupLoad {
            group: index,
            reason: format!(
                "'{}' not found under {}",
                group.name,
                self.base_path.display()
            ),
        })
    }
}

/// Serves sequence groups from memory, keyed by group file name
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bytes served for a group file name
    pub fn insert<S: Into<String>>(&mut self, name: S, data: Vec<u8>) {
        self.files.insert(name.into(), data);
    }

    /// Number of registered files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no files are registered
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileResolver for MemoryResolver {
    fn load_sequence_group(&self, index: usize, group: &StudioSequenceGroup) -> Result<Vec<u8>> {
        self.files
            .get(&group.name)
            .cloned()
            .ok_or_else(|| StudioError::SequenceGroupLoad {
                group: index,
                reason: format!("'{}' is not registered", group.name),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn group(name: &str) -> StudioSequenceGroup {
        StudioSequenceGroup {
            label: "default".to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_directory_resolver_candidates() {
        let resolver = DirectoryResolver::new("/game/valve");
        let candidates = resolver.candidates("models/barney01.mdl");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/game/valve/models/barney01.mdl"),
                PathBuf::from("/game/valve/barney01.mdl"),
            ]
        );

        let flat = resolver.candidates("barney01.mdl");
        assert_eq!(flat, vec![PathBuf::from("/game/valve/barney01.mdl")]);
    }

    #[test]
    fn test_directory_resolver_reads_flat_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("barney01.mdl"), b"IDSQ").unwrap();

        let resolver = DirectoryResolver::new(dir.path());
        let data = resolver
            .load_sequence_group(1, &group("models/barney01.mdl"))
            .unwrap();
        assert_eq!(data, b"IDSQ".to_vec());
    }

    #[test]
    fn test_directory_resolver_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DirectoryResolver::new(dir.path());

        let err = resolver
            .load_sequence_group(2, &group("models/missing02.mdl"))
            .unwrap_err();
        assert!(matches!(err, StudioError::SequenceGroupLoad { group: 2, .. }));
    }

    #[test]
    fn test_memory_resolver() {
        let mut resolver = MemoryResolver::new();
        assert!(resolver.is_empty());
        resolver.insert("scientist01.mdl", vec![1, 2, 3]);
        assert_eq!(resolver.len(), 1);

        let data = resolver
            .load_sequence_group(1, &group("scientist01.mdl"))
            .unwrap();
        assert_eq!(data, vec![1, 2, 3]);
        assert!(
            resolver
                .load_sequence_group(1, &group("other01.mdl"))
                .is_err()
        );
    }
}
