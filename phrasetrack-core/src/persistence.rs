//! Saving and loading a project together with its playback snapshot.
//!
//! Files are pretty-printed JSON. Writes go through a temp file in the
//! target directory that is renamed over the destination, so a crash
//! mid-save leaves the previous file intact.

use std::fmt;
use std::io::Write;
use std::path::Path;

use phrasetrack_types::{PlaybackState, Project};
use serde::{Deserialize, Serialize};

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    pub project: Project,
    #[serde(default)]
    pub playback: PlaybackState,
}

impl ProjectFile {
    pub fn new(project: Project, playback: PlaybackState) -> Self {
        Self {
            version: FORMAT_VERSION,
            project,
            playback,
        }
    }
}

/// Error from saving or loading a project file.
#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    Format(serde_json::Error),
    /// Written by a newer version
    UnsupportedVersion(u32),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "I/O error: {}", e),
            PersistError::Format(e) => write!(f, "invalid project file: {}", e),
            PersistError::UnsupportedVersion(v) => write!(
                f,
                "project format version {} is newer than supported ({})",
                v, FORMAT_VERSION
            ),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(e) => Some(e),
            PersistError::Format(e) => Some(e),
            PersistError::UnsupportedVersion(_) => None,
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Io(e)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Format(e)
    }
}

pub fn save_project(path: &Path, project: &Project, playback: &PlaybackState) -> Result<(), PersistError> {
    #[derive(Serialize)]
    struct ProjectFileRef<'a> {
        version: u32,
        project: &'a Project,
        playback: &'a PlaybackState,
    }

    let json = serde_json::to_string_pretty(&ProjectFileRef {
        version: FORMAT_VERSION,
        project,
        playback,
    })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PersistError::Io(e.error))?;

    log::info!(target: "persistence", "saved project to {}", path.display());
    Ok(())
}

/// Load a project file, restoring fixed table sizes.
pub fn load_project(path: &Path) -> Result<ProjectFile, PersistError> {
    let contents = std::fs::read_to_string(path)?;
    let mut file: ProjectFile = serde_json::from_str(&contents)?;
    if file.version > FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion(file.version));
    }
    file.project.normalize();
    log::info!(target: "persistence", "loaded project from {}", path.display());
    Ok(file)
}
