use rand::RngCore;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
#[error("could not write random bytes to {path}")]
pub struct FillError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Writes `size` uniformly random bytes to `path`, replacing any existing file.
pub fn write_random_file<P: AsRef<Path>>(path: P, size: usize) -> Result<(), FillError> {
    write_random_file_with(&mut rand::rng(), path, size)
}

pub fn write_random_file_with<R, P>(rng: &mut R, path: P, size: usize) -> Result<(), FillError>
where
    R: RngCore + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    fill(rng, path, size).map_err(|source| FillError {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), size, "wrote random file");
    Ok(())
}

fn fill<R: RngCore + ?Sized>(rng: &mut R, path: &Path, size: usize) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut chunk = vec![0u8; CHUNK_SIZE.min(size)];
    let mut remaining = size;
    while remaining > 0 {
        let n = remaining.min(chunk.len());
        rng.fill_bytes(&mut chunk[..n]);
        writer.write_all(&chunk[..n])?;
        remaining -= n;
    }
    // into_inner flushes; sync so the size is visible to whoever zips it next
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;

    #[test]
    fn writes_exact_size() {
        let dir = tempfile::tempdir().unwrap();
        for size in [0, 1, 8, CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE * 3 + 17] {
            let path = dir.path().join(format!("f{}", size));
            write_random_file(&path, size).unwrap();
            assert_eq!(fs::metadata(&path).unwrap().len(), size as u64);
        }
    }

    #[test]
    fn overwrites_longer_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small");
        fs::write(&path, vec![0u8; 1024]).unwrap();
        write_random_file(&path, 8).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), 8);
    }

    #[test]
    fn same_seed_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        write_random_file_with(&mut StdRng::seed_from_u64(7), &a, 100_000).unwrap();
        write_random_file_with(&mut StdRng::seed_from_u64(7), &b, 100_000).unwrap();
        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    }

    #[test]
    fn bytes_cover_the_whole_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large");
        write_random_file_with(&mut StdRng::seed_from_u64(42), &path, 1 << 20).unwrap();
        let mut seen = [false; 256];
        for b in fs::read(&path).unwrap() {
            seen[b as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn missing_parent_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("small");
        let err = write_random_file(&path, 8).unwrap_err();
        assert_eq!(err.path, path);
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
    }
}
