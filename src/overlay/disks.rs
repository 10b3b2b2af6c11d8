use std::fs;
use std::path::{Path, PathBuf};

use super::Surface;

const DISK_SUFFIXES: [&str; 4] = [".dsk", ".do", ".po", ".nib"];

/// True for disk image names, optionally gzipped (`game.dsk`, `game.nib.gz`).
pub fn is_disk_image(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    DISK_SUFFIXES
        .iter()
        .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
}

/// Disk image picker over `<data_dir>/disks`.
#[derive(Debug)]
pub struct DisksMenu {
    pub(super) surface: Surface,
    images: Vec<PathBuf>,
}

impl DisksMenu {
    /// List images under `dir`. A missing or unreadable directory yields an
    /// empty menu.
    pub fn scan(dir: &Path) -> Self {
        let mut images: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .filter(|path| {
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(is_disk_image)
                })
                .collect(),
            Err(e) => {
                log::warn!("Cannot list disk images in {}: {}", dir.display(), e);
                Vec::new()
            }
        };
        images.sort();

        Self {
            surface: Surface::new(),
            images,
        }
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn choose(&self, index: usize) -> Option<&Path> {
        self.images.get(index).map(PathBuf::as_path)
    }
}
