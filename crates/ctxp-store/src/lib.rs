use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the preamble resource looked up next to the binary and in
/// the working directory.
pub const PREAMBLE_FILE: &str = "CORE_PROMPT.md";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not find {} (searched: {})", PREAMBLE_FILE, display_paths(.searched))]
    PreambleNotFound { searched: Vec<PathBuf> },
    #[error("could not find preamble: {}", .0.display())]
    PreambleMissing(PathBuf),
    #[error("could not find thread file: {}", .0.display())]
    ThreadNotFound(PathBuf),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Candidate preamble locations, in lookup order: the executable's directory
/// and its parent, the working directory, then the per-user config dir.
pub fn preamble_candidates(exe_dir: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(dir) = exe_dir {
        out.push(dir.join("..").join(PREAMBLE_FILE));
        out.push(dir.join(PREAMBLE_FILE));
    }
    out.push(cwd.join(PREAMBLE_FILE));
    if let Some(dir) = dirs::config_dir() {
        out.push(dir.join("ctxp").join(PREAMBLE_FILE));
    }
    out
}

/// Resolve the preamble path. An explicit path wins and must exist.
pub fn find_preamble(explicit: Option<&Path>, candidates: &[PathBuf]) -> Result<PathBuf, StoreError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(StoreError::PreambleMissing(path.to_path_buf()))
        };
    }
    candidates
        .iter()
        .find(|p| p.is_file())
        .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
        .ok_or_else(|| StoreError::PreambleNotFound {
            searched: candidates.to_vec(),
        })
}

pub fn read_preamble(path: &Path) -> Result<String, StoreError> {
    read_existing(path, || StoreError::PreambleMissing(path.to_path_buf()))
}

/// Read the whole thread document.
pub fn read_thread(path: &Path) -> Result<String, StoreError> {
    read_existing(path, || StoreError::ThreadNotFound(path.to_path_buf()))
}

fn read_existing(path: &Path, missing: impl FnOnce() -> StoreError) -> Result<String, StoreError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(missing()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomic write: write to temp file in same dir, then rename.
///
/// The thread file is rewritten in full. Nothing is locked between the
/// caller's read and this write.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote file");
    Ok(())
}
