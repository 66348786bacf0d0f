use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{trace, warn};

use crate::io::common::loader::RawAssetLoader;

/// Loads files relative to a list of directories, earlier directories take precedence.
pub struct DirectoryLoader {
    prioritized_roots: Vec<PathBuf>,
}

impl DirectoryLoader {
    pub fn new<P: AsRef<Path>>(roots: &[P]) -> Self {
        let prioritized_roots = roots
            .iter()
            .map(|root| root.as_ref().to_path_buf())
            .filter(|root| {
                let is_dir = root.is_dir();
                if !is_dir {
                    warn!("DirectoryLoader: {} is not a directory, ignoring it", root.display());
                }
                is_dir
            })
            .collect_vec();

        DirectoryLoader { prioritized_roots }
    }

    fn locate(&self, path: &str) -> Option<PathBuf> {
        // Asset references are case insensitive, but we don't want to enumerate directories for every lookup.
        let normalized = path.replace('\\', "/");
        let lowercase = normalized.to_ascii_lowercase();

        self.prioritized_roots
            .iter()
            .flat_map(|root| [root.join(&normalized), root.join(&lowercase)])
            .find(|candidate| candidate.is_file())
    }
}

impl RawAssetLoader for DirectoryLoader {
    fn load_raw_owned(&self, path: &str) -> Option<Vec<u8>> {
        let Some(file) = self.locate(path) else {
            warn!("Could not locate {}!", path);
            return None;
        };

        trace!("Loading {} from {}", path, file.display());
        match fs::read(&file) {
            Ok(buf) => Some(buf),
            Err(err) => {
                warn!("Failed to read {}: {}", file.display(), err);
                None
            }
        }
    }

    fn contains(&self, path: &str) -> bool {
        self.locate(path).is_some()
    }
}
