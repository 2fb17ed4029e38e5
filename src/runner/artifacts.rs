//! Temp artifact cleanup
//!
//! A run writes its input, result and (for compiled languages) binary beside
//! the source. `RunArtifacts` owns those paths and deletes them when dropped,
//! so cleanup happens on success, error return, timeout kill, panic, and
//! future cancellation alike.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::languages::RunPaths;

#[derive(Debug)]
pub struct RunArtifacts {
    paths: Vec<PathBuf>,
}

impl RunArtifacts {
    /// Track the input and result files, plus the binary when one is produced
    pub fn new(paths: &RunPaths, produces_binary: bool) -> Self {
        let mut tracked = vec![paths.input.clone(), paths.result.clone()];
        if produces_binary {
            tracked.push(paths.binary.clone());
        }
        Self { paths: tracked }
    }
}

impl Drop for RunArtifacts {
    fn drop(&mut self) {
        for path in &self.paths {
            remove_artifact(path);
        }
    }
}

fn remove_artifact(path: &Path) {
    // Class-file outputs (java) are directories
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => debug!("Deleted temporary file: {:?}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to delete temporary file {:?}: {}", path, e),
    }
}
