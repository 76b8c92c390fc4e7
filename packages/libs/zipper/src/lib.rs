use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum ZipperError {
    #[error("could not open {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("zip error in {path}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
}

impl ZipperError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| ZipperError::Io { path: path.to_path_buf(), source }
    }

    fn zip(path: &Path) -> impl FnOnce(ZipError) -> Self + '_ {
        move |source| ZipperError::Zip { path: path.to_path_buf(), source }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    Stored,
    Deflated,
}

impl From<Compression> for CompressionMethod {
    fn from(c: Compression) -> Self {
        match c {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// A file on disk and the name it gets inside the archive.
#[derive(Debug, Clone)]
pub struct Entry {
    pub source: PathBuf,
    pub name: String,
}

impl Entry {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(source: P, name: S) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub size: u64,
}

pub struct Zipper {
    archive: PathBuf,
    compression: Compression,
    entries: Vec<Entry>,
}

impl Zipper {
    pub fn new<P: Into<PathBuf>>(archive: P) -> Self {
        Self {
            archive: archive.into(),
            compression: Compression::default(),
            entries: vec![],
        }
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Writes the archive, truncating any file already at that path.
    /// Entries keep the order they were added in.
    pub fn write(&self) -> Result<(), ZipperError> {
        let file = File::create(&self.archive).map_err(ZipperError::io(&self.archive))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default().compression_method(self.compression.into());

        for entry in &self.entries {
            let mut source = File::open(&entry.source).map_err(ZipperError::io(&entry.source))?;
            zip.start_file(entry.name.as_str(), options)
                .map_err(ZipperError::zip(&self.archive))?;
            let copied = io::copy(&mut source, &mut zip).map_err(ZipperError::io(&entry.source))?;
            debug!(entry = %entry.name, source = %entry.source.display(), bytes = copied, "added entry");
        }

        let writer = zip.finish().map_err(ZipperError::zip(&self.archive))?;
        writer
            .into_inner()
            .map_err(|e| ZipperError::Io { path: self.archive.clone(), source: e.into_error() })?
            .sync_all()
            .map_err(ZipperError::io(&self.archive))?;
        info!(archive = %self.archive.display(), entries = self.entries.len(), "archive written");
        Ok(())
    }
}

pub fn build_archive<P: AsRef<Path>>(
    archive: P,
    entries: &[Entry],
    compression: Compression,
) -> Result<(), ZipperError> {
    entries
        .iter()
        .cloned()
        .fold(Zipper::new(archive.as_ref()).compression(compression), Zipper::entry)
        .write()
}

fn open(archive: &Path) -> Result<ZipArchive<BufReader<File>>, ZipperError> {
    let file = File::open(archive).map_err(ZipperError::io(archive))?;
    ZipArchive::new(BufReader::new(file)).map_err(ZipperError::zip(archive))
}

/// Names and uncompressed sizes, in archive order.
pub fn list_entries<P: AsRef<Path>>(archive: P) -> Result<Vec<EntryInfo>, ZipperError> {
    let archive = archive.as_ref();
    let mut zip = open(archive)?;
    (0..zip.len())
        .map(|i| {
            let file = zip.by_index(i).map_err(ZipperError::zip(archive))?;
            Ok(EntryInfo {
                name: file.name().to_string(),
                size: file.size(),
            })
        })
        .collect()
}

pub fn read_entry<P: AsRef<Path>>(archive: P, name: &str) -> Result<Vec<u8>, ZipperError> {
    let archive = archive.as_ref();
    let mut zip = open(archive)?;
    let mut file = zip.by_name(name).map_err(ZipperError::zip(archive))?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes).map_err(ZipperError::io(archive))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sources(dir: &Path) -> Vec<Entry> {
        let nested = dir.join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("a.bin"), b"first entry").unwrap();
        fs::write(dir.join("b.bin"), vec![0xAB; 70_000]).unwrap();
        vec![
            Entry::new(nested.join("a.bin"), "small"),
            Entry::new(dir.join("b.bin"), "large"),
        ]
    }

    #[test]
    fn entries_keep_names_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let entries = sources(dir.path());
        let archive = dir.path().join("test.zip");
        build_archive(&archive, &entries, Compression::Stored).unwrap();

        let listed = list_entries(&archive).unwrap();
        assert_eq!(
            listed,
            vec![
                EntryInfo { name: "small".into(), size: 11 },
                EntryInfo { name: "large".into(), size: 70_000 },
            ]
        );
    }

    #[test]
    fn deflated_entries_decompress_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let entries = sources(dir.path());
        let archive = dir.path().join("test.zip");
        build_archive(&archive, &entries, Compression::Deflated).unwrap();

        for entry in &entries {
            assert_eq!(read_entry(&archive, &entry.name).unwrap(), fs::read(&entry.source).unwrap());
        }
        // 70k of one byte value should shrink
        assert!(fs::metadata(&archive).unwrap().len() < 70_000);
    }

    #[test]
    fn existing_archive_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let entries = sources(dir.path());
        let archive = dir.path().join("test.zip");
        build_archive(&archive, &entries, Compression::Stored).unwrap();
        build_archive(&archive, &entries[..1], Compression::Stored).unwrap();

        let names: Vec<_> = list_entries(&archive).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["small"]);
    }

    #[test]
    fn missing_source_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = build_archive(
            dir.path().join("test.zip"),
            &[Entry::new(&missing, "missing")],
            Compression::Stored,
        )
        .unwrap_err();
        match err {
            ZipperError::Io { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
