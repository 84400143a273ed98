//! Record loaders.
//!
//! Each loader walks one directory of the export and decodes every `.json`
//! file beneath it into an in-memory lookup structure. There is no
//! cross-referencing here; that happens in [`crate::resolve`].
//!
//! Loading is all-or-nothing. A single unreadable directory or malformed file
//! fails the whole load, because resolution downstream assumes the lookups are
//! complete.
//!
//! ```text
//! dataset/
//! ├── agents/people/*.json          → AgentList
//! ├── subjects/*.json               → SubjectMap
//! └── repositories/2/
//!     ├── digital_objects/*.json    → DigitalObjectMap
//!     └── accessions/*.json         (walked later by generate)
//! ```

use crate::types::{Agent, DigitalObject, Record, Subject};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Can't read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Can't walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Can't decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Can't find the digital object directory in {0}")]
    DigitalObjectsNotFound(PathBuf),
}

pub type SubjectMap = BTreeMap<String, Subject>;
pub type DigitalObjectMap = BTreeMap<String, DigitalObject>;

/// Agents in walk order, searched by URI.
#[derive(Debug, Default, Clone)]
pub struct AgentList(Vec<Agent>);

impl AgentList {
    pub fn new(agents: Vec<Agent>) -> Self {
        AgentList(agents)
    }

    pub fn find(&self, uri: &str) -> Option<&Agent> {
        self.0.iter().find(|a| a.uri == uri)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The three lookup structures a run resolves against.
#[derive(Debug, Default)]
pub struct Lookups {
    pub subjects: SubjectMap,
    pub digital_objects: DigitalObjectMap,
    pub agents: AgentList,
}

/// Directories the lookups are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupDirs {
    pub subjects: PathBuf,
    pub digital_objects: PathBuf,
    pub agents: PathBuf,
}

impl LookupDirs {
    /// Locate the lookup directories under a dataset root.
    ///
    /// `subjects` and `agents/people` are at fixed places; the digital object
    /// directory sits under a repository and has to be searched for.
    pub fn discover(dataset: &Path) -> Result<Self, LoadError> {
        Ok(LookupDirs {
            subjects: dataset.join("subjects"),
            digital_objects: find_digital_objects_dir(dataset)?,
            agents: dataset.join("agents").join("people"),
        })
    }
}

impl Lookups {
    pub fn load(dirs: &LookupDirs) -> Result<Self, LoadError> {
        Ok(Lookups {
            subjects: load_subjects(&dirs.subjects)?,
            digital_objects: load_digital_objects(&dirs.digital_objects)?,
            agents: load_agents(&dirs.agents)?,
        })
    }
}

pub fn load_subjects(dir: &Path) -> Result<SubjectMap, LoadError> {
    Ok(into_map(load_records(dir)?))
}

pub fn load_digital_objects(dir: &Path) -> Result<DigitalObjectMap, LoadError> {
    Ok(into_map(load_records(dir)?))
}

pub fn load_agents(dir: &Path) -> Result<AgentList, LoadError> {
    Ok(AgentList::new(load_records(dir)?))
}

/// Directory named exactly `digital_objects` under the dataset root.
///
/// When several repositories have one, the last in sorted walk order wins.
pub fn find_digital_objects_dir(dataset: &Path) -> Result<PathBuf, LoadError> {
    let mut found = None;
    for entry in WalkDir::new(dataset).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: dataset.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() && entry.file_name() == "digital_objects" {
            found = Some(entry.into_path());
        }
    }
    found.ok_or_else(|| LoadError::DigitalObjectsNotFound(dataset.to_path_buf()))
}

/// Decode one JSON record file.
pub fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let src = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&src).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Every `.json` file under `dir`, sorted by file name within each directory.
pub fn json_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::Io {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_json(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
}

fn load_records<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, LoadError> {
    json_files(dir)?.iter().map(|p| read_record(p)).collect()
}

fn into_map<T: Record>(records: Vec<T>) -> BTreeMap<String, T> {
    records
        .into_iter()
        .map(|r| (r.uri().to_string(), r))
        .collect()
}
