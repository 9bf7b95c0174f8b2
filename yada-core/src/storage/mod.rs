//! Persistence of foods, daily logs and profiles.
//!
//! [`DiaryStore`] is the seam the session saves through; [`TextStore`]
//! keeps everything as human-readable text files in one data directory.

mod text;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::catalog::FoodCatalog;
use crate::ids::FoodKind;
use crate::log_store::LogStore;
use crate::models::{Food, ProfileBook};

/// Loads and saves the diary's collections.
pub trait DiaryStore {
    fn load_foods(&self, kind: FoodKind) -> Result<Vec<Food>, StorageError>;

    /// Writes every given food of one category, replacing the previous file.
    fn save_foods(&self, kind: FoodKind, foods: &[&Food]) -> Result<(), StorageError>;

    fn load_logs(&self) -> Result<LogStore, StorageError>;

    /// Writes the logs, keeping only entries whose food is committed.
    fn save_logs(&self, logs: &LogStore, catalog: &FoodCatalog) -> Result<(), StorageError>;

    /// Returns `None` when no profiles were ever saved.
    fn load_profiles(&self) -> Result<Option<ProfileBook>, StorageError>;

    fn save_profiles(&self, profiles: &ProfileBook) -> Result<(), StorageError>;
}

/// Files kept in the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFile {
    BasicFoods,
    CompositeFoods,
    DailyLogs,
    Profiles,
}

impl DataFile {
    pub fn filename(&self) -> &'static str {
        match self {
            DataFile::BasicFoods => "basic_foods.txt",
            DataFile::CompositeFoods => "composite_foods.txt",
            DataFile::DailyLogs => "daily_logs.txt",
            DataFile::Profiles => "profile.txt",
        }
    }

    pub fn foods(kind: FoodKind) -> Self {
        match kind {
            FoodKind::Basic => DataFile::BasicFoods,
            FoodKind::Composite => DataFile::CompositeFoods,
        }
    }
}

/// Text file storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct TextStore {
    data_dir: PathBuf,
}

impl TextStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, file: DataFile) -> PathBuf {
        self.data_dir.join(file.filename())
    }

    /// Reads a data file. Returns `Ok(None)` if it doesn't exist.
    fn read(&self, file: DataFile) -> Result<Option<(PathBuf, String)>, StorageError> {
        let path = self.path(file);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some((path, contents))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    /// Writes a data file, creating the data directory if needed.
    fn write(&self, file: DataFile, contents: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let path = self.path(file);
        fs::write(&path, contents).map_err(|e| StorageError::IoError(path, e))
    }
}

impl DiaryStore for TextStore {
    fn load_foods(&self, kind: FoodKind) -> Result<Vec<Food>, StorageError> {
        Ok(match self.read(DataFile::foods(kind))? {
            Some((path, contents)) => text::parse_foods(kind, &path, &contents),
            None => Vec::new(),
        })
    }

    fn save_foods(&self, kind: FoodKind, foods: &[&Food]) -> Result<(), StorageError> {
        self.write(DataFile::foods(kind), &text::format_foods(kind, foods))
    }

    fn load_logs(&self) -> Result<LogStore, StorageError> {
        Ok(match self.read(DataFile::DailyLogs)? {
            Some((path, contents)) => text::parse_logs(&path, &contents),
            None => LogStore::new(),
        })
    }

    fn save_logs(&self, logs: &LogStore, catalog: &FoodCatalog) -> Result<(), StorageError> {
        let persistable = logs.persistable(catalog);
        self.write(DataFile::DailyLogs, &text::format_logs(&persistable, catalog))
    }

    fn load_profiles(&self) -> Result<Option<ProfileBook>, StorageError> {
        Ok(self
            .read(DataFile::Profiles)?
            .map(|(path, contents)| text::parse_profiles(&path, &contents)))
    }

    fn save_profiles(&self, profiles: &ProfileBook) -> Result<(), StorageError> {
        self.write(DataFile::Profiles, &text::format_profiles(profiles))
    }
}

/// Errors that can occur while reading or writing data files.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// A line of a data file could not be parsed.
    ParseError(PathBuf, usize, String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::ParseError(path, line, msg) => {
                write!(f, "{}:{}: {}", path.display(), line, msg)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::ParseError(..) => None,
        }
    }
}
