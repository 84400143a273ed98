//! Page emission: one record → `.html`, `.include`, `.json`.
//!
//! The record URI is the path stem under the output root:
//!
//! ```text
//! /repositories/2/accessions/1  →  htdocs/repositories/2/accessions/1.html
//!                                  htdocs/repositories/2/accessions/1.include
//!                                  htdocs/repositories/2/accessions/1.json
//! ```
//!
//! Both templates are rendered and the JSON encoded before anything is
//! written, so a template failure leaves no half-written page behind. Existing
//! files are overwritten.

use crate::render::{RenderError, TemplatePair};
use crate::types::Record;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Record URI {0:?} can't be used as an output path")]
    InvalidUri(String),
    #[error("Can't create {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Problem writing {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Could not JSON encode {uri}: {source}")]
    Json {
        uri: String,
        source: serde_json::Error,
    },
}

/// Files written for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedPage {
    pub uri: String,
    pub html: PathBuf,
    pub include: PathBuf,
    pub json: PathBuf,
}

/// Render `record` through both templates and write the three output files.
pub fn emit_pages<R: Record + Serialize>(
    record: &R,
    templates: &TemplatePair<'_>,
    output_root: &Path,
) -> Result<EmittedPage, EmitError> {
    let uri = record.uri();
    let stem = page_stem(output_root, uri)?;

    let html = templates.render_html(record)?;
    let include = templates.render_include(record)?;
    let json = serde_json::to_vec(record).map_err(|source| EmitError::Json {
        uri: uri.to_string(),
        source,
    })?;

    if let Some(dir) = stem.parent() {
        create_dir(dir).map_err(|source| EmitError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let page = EmittedPage {
        uri: uri.to_string(),
        html: with_suffix(&stem, ".html"),
        include: with_suffix(&stem, ".include"),
        json: with_suffix(&stem, ".json"),
    };
    for (path, bytes) in [
        (&page.html, html.as_bytes()),
        (&page.include, include.as_bytes()),
        (&page.json, json.as_slice()),
    ] {
        write_file(path, bytes).map_err(|source| EmitError::Write {
            path: path.clone(),
            source,
        })?;
    }

    Ok(page)
}

/// Output path stem for a record URI.
///
/// A leading `/` is dropped so the URI stays inside `output_root`. Empty URIs
/// and URIs with `.`/`..` components are rejected.
pub fn page_stem(output_root: &Path, uri: &str) -> Result<PathBuf, EmitError> {
    let rel = Path::new(uri.trim_start_matches('/'));
    let usable = rel.components().next().is_some()
        && rel.components().all(|c| matches!(c, Component::Normal(_)));
    if !usable {
        return Err(EmitError::InvalidUri(uri.to_string()));
    }
    Ok(output_root.join(rel))
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(stem.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// `mkdir -p` with group-writable permissions.
pub(crate) fn create_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o775);
    }
    builder.create(dir)
}

/// Create or truncate `path` with group-writable permissions and write `bytes`.
pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o664);
    }
    options.open(path)?.write_all(bytes)
}
