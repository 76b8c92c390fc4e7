// Fixture generator: a tiny random file, a 10 MiB random file and a zip
// holding both, for tests that need archive input of known shape.
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use zipper::{Compression, Entry};

pub const DEFAULT_DEST: &str = "assets";
pub const SMALL_NAME: &str = "small";
pub const LARGE_NAME: &str = "large";
pub const ARCHIVE_NAME: &str = "test.zip";
pub const SMALL_SIZE: usize = 8;
pub const LARGE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum AssetsError {
    #[error(transparent)]
    Init(#[from] init::InitError),
    #[error(transparent)]
    Fill(#[from] filler::FillError),
    #[error(transparent)]
    Zip(#[from] zipper::ZipperError),
    #[error("could not stat {path}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("verification failed: {0}")]
    Mismatch(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

/// What a run left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub small: Artifact,
    pub large: Artifact,
    pub archive: Artifact,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for a in [&self.small, &self.large, &self.archive] {
            writeln!(f, "{} ({} bytes)", a.path.display(), a.size)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub small: PathBuf,
    pub large: PathBuf,
    pub archive: PathBuf,
}

impl Layout {
    pub fn new<P: AsRef<Path>>(dest: P) -> Self {
        let dest = dest.as_ref();
        Layout {
            small: dest.join(SMALL_NAME),
            large: dest.join(LARGE_NAME),
            archive: dest.join(ARCHIVE_NAME),
        }
    }

    fn entries(&self) -> [Entry; 2] {
        [
            Entry::new(&self.small, SMALL_NAME),
            Entry::new(&self.large, LARGE_NAME),
        ]
    }

    fn report(&self) -> Result<Report, AssetsError> {
        Ok(Report {
            small: artifact(&self.small)?,
            large: artifact(&self.large)?,
            archive: artifact(&self.archive)?,
        })
    }
}

fn artifact(path: &Path) -> Result<Artifact, AssetsError> {
    let meta = fs::metadata(path).map_err(|source| AssetsError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Artifact {
        path: path.to_path_buf(),
        size: meta.len(),
    })
}

/// Writes `small`, `large` and `test.zip` into `dest`, creating it if needed.
/// Previous artifacts are overwritten; anything else in `dest` is left alone.
pub fn generate<P: AsRef<Path>>(dest: P, compression: Compression) -> Result<Report, AssetsError> {
    let dest = dest.as_ref();
    let layout = Layout::new(dest);

    init::ensure_directory(dest)?;
    filler::write_random_file(&layout.small, SMALL_SIZE)?;
    filler::write_random_file(&layout.large, LARGE_SIZE)?;
    zipper::build_archive(&layout.archive, &layout.entries(), compression)?;

    let report = layout.report()?;
    info!(dest = %dest.display(), "fixtures generated");
    Ok(report)
}

/// Checks sizes, archive entry names and order, and that each entry
/// decompresses to the bytes of the file beside it.
pub fn verify<P: AsRef<Path>>(dest: P) -> Result<Report, AssetsError> {
    let layout = Layout::new(dest);
    let report = layout.report()?;

    expect_size(&report.small, SMALL_SIZE)?;
    expect_size(&report.large, LARGE_SIZE)?;

    let listed = zipper::list_entries(&layout.archive)?;
    let names: Vec<&str> = listed.iter().map(|e| e.name.as_str()).collect();
    if names != [SMALL_NAME, LARGE_NAME] {
        return Err(AssetsError::Mismatch(format!(
            "{} lists entries {:?}, expected {:?}",
            layout.archive.display(),
            names,
            [SMALL_NAME, LARGE_NAME]
        )));
    }

    for entry in layout.entries() {
        let on_disk = fs::read(&entry.source).map_err(|source| AssetsError::Stat {
            path: entry.source.clone(),
            source,
        })?;
        if zipper::read_entry(&layout.archive, &entry.name)? != on_disk {
            return Err(AssetsError::Mismatch(format!(
                "entry {} differs from {}",
                entry.name,
                entry.source.display()
            )));
        }
    }
    Ok(report)
}

fn expect_size(artifact: &Artifact, expected: usize) -> Result<(), AssetsError> {
    if artifact.size != expected as u64 {
        return Err(AssetsError::Mismatch(format!(
            "{} is {} bytes, expected {}",
            artifact.path.display(),
            artifact.size,
            expected
        )));
    }
    Ok(())
}
