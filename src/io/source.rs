//! Price sources: where raw per-period CSV resources come from.
//!
//! A source is either a ZIP archive or a plain directory. Both expose the same
//! thing to ingest: every `*.csv` resource, fully read into memory, in
//! lexicographic order of resource name.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::ResourceError;

const TABULAR_SUFFIX: &str = ".csv";

/// One tabular resource read from a source.
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A container of per-period price files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSource {
    Zip(PathBuf),
    Directory(PathBuf),
}

impl PriceSource {
    /// Classify `path`: directories are read as-is, anything else as a ZIP.
    pub fn from_path(path: &Path) -> Result<Self, ResourceError> {
        let meta = fs::metadata(path).map_err(|source| ResourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if meta.is_dir() {
            Ok(PriceSource::Directory(path.to_path_buf()))
        } else {
            Ok(PriceSource::Zip(path.to_path_buf()))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            PriceSource::Zip(p) | PriceSource::Directory(p) => p,
        }
    }

    /// Read every tabular resource, sorted by name.
    ///
    /// Either all resources are returned or the call fails; there is no
    /// partial result.
    pub fn read_resources(&self) -> Result<Vec<Resource>, ResourceError> {
        let resources = match self {
            PriceSource::Zip(path) => read_zip(path)?,
            PriceSource::Directory(path) => read_dir(path)?,
        };
        if resources.is_empty() {
            return Err(ResourceError::NoResources {
                path: self.path().to_path_buf(),
            });
        }
        Ok(resources)
    }
}

/// True for resource names ending in `.csv` (case-insensitive).
pub fn is_tabular(name: &str) -> bool {
    // Compare bytes: the name may end in multi-byte characters.
    let (name, suffix) = (name.as_bytes(), TABULAR_SUFFIX.as_bytes());
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn read_zip(path: &Path) -> Result<Vec<Resource>, ResourceError> {
    let file = File::open(path).map_err(|source| ResourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(file).map_err(|source| ResourceError::Archive {
        path: path.to_path_buf(),
        source,
    })?;

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/') && is_tabular(name))
        .map(str::to_string)
        .collect();
    names.sort();

    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let mut entry = archive.by_name(&name).map_err(|e| ResourceError::Entry {
            name: name.clone(),
            message: e.to_string(),
        })?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes).map_err(|e| ResourceError::Entry {
            name: name.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(resource = %name, bytes = bytes.len(), "read archive entry");
        out.push(Resource { name, bytes });
    }
    Ok(out)
}

fn read_dir(path: &Path) -> Result<Vec<Resource>, ResourceError> {
    let entries = fs::read_dir(path).map_err(|source| ResourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ResourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }
        let Some(name) = file_path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if is_tabular(name) {
            files.push((name.to_string(), file_path.clone()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = Vec::with_capacity(files.len());
    for (name, file_path) in files {
        let bytes = fs::read(&file_path).map_err(|e| ResourceError::Entry {
            name: name.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(resource = %name, bytes = bytes.len(), "read file");
        out.push(Resource { name, bytes });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[test]
    fn tabular_suffix_is_case_insensitive() {
        assert!(is_tabular("2025-07-01.csv"));
        assert!(is_tabular("DAY.CSV"));
        assert!(!is_tabular("notes.txt"));
        assert!(!is_tabular("csv"));
        assert!(!is_tabular("日本語"));
        assert!(!is_tabular("価格.txt"));
        assert!(is_tabular("価格.csv"));
    }

    #[test]
    fn zip_resources_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.zip");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        for name in ["b.csv", "readme.txt", "a.csv"] {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(b"Ticker,Date,Price\n").unwrap();
        }
        zip.finish().unwrap();

        let source = PriceSource::from_path(&path).unwrap();
        assert_eq!(source, PriceSource::Zip(path.clone()));
        let names: Vec<String> = source.read_resources().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn zip_with_non_ascii_entry_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.zip");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        for name in ["日本語", "a.csv", "株価.csv"] {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(b"Ticker,Date,Price\n").unwrap();
        }
        zip.finish().unwrap();

        let names: Vec<String> = PriceSource::from_path(&path)
            .unwrap()
            .read_resources()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["a.csv", "株価.csv"]);
    }

    #[test]
    fn corrupt_zip_entry_is_entry_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.zip");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("a.csv", stored).unwrap();
        zip.write_all(b"Ticker,Date,Price\nMSFT,2025-07-01,410\n").unwrap();
        zip.finish().unwrap();

        // Flip a byte of the stored payload so the CRC check fails on read.
        let mut bytes = fs::read(&path).unwrap();
        let at = bytes.windows(4).position(|w| w == b"MSFT").unwrap();
        bytes[at + 3] = b'X';
        fs::write(&path, bytes).unwrap();

        let err = PriceSource::from_path(&path).unwrap().read_resources().unwrap_err();
        assert!(matches!(err, ResourceError::Entry { ref name, .. } if name == "a.csv"), "{err}");
    }

    #[test]
    fn directory_resources_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2.csv"), "Ticker,Date,Price\n").unwrap();
        fs::write(dir.path().join("1.csv"), "Ticker,Date,Price\n").unwrap();
        fs::write(dir.path().join("ignore.json"), "{}").unwrap();

        let source = PriceSource::from_path(dir.path()).unwrap();
        let names: Vec<String> = source.read_resources().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["1.csv", "2.csv"]);
    }

    #[test]
    fn missing_path_is_open_error() {
        let err = PriceSource::from_path(Path::new("/definitely/not/here.zip")).unwrap_err();
        assert!(matches!(err, ResourceError::Open { .. }));
    }

    #[test]
    fn non_zip_file_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.zip");
        fs::write(&path, "not a zip").unwrap();
        let err = PriceSource::from_path(&path).unwrap().read_resources().unwrap_err();
        assert!(matches!(err, ResourceError::Archive { .. }));
    }

    #[test]
    fn empty_directory_has_no_resources() {
        let dir = tempfile::tempdir().unwrap();
        let err = PriceSource::from_path(dir.path()).unwrap().read_resources().unwrap_err();
        assert!(matches!(err, ResourceError::NoResources { .. }));
    }
}
