use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("could not create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),
}

/// Creates `path` and any missing parents. An existing directory is left as is,
/// along with whatever it already contains.
pub fn ensure_directory<P: AsRef<Path>>(path: P) -> Result<(), InitError> {
    let path = path.as_ref();
    if path.exists() && !path.is_dir() {
        return Err(InitError::NotADirectory(path.to_path_buf()));
    }
    fs::create_dir_all(path).map_err(|source| InitError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "destination directory ready");
    Ok(())
}
