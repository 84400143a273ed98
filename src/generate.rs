//! Page generation: the walk from dataset to htdocs.
//!
//! A run has two phases after the lookups are built:
//!
//! ```text
//! 1. Lookups    subjects/, */digital_objects/, agents/people/  →  Lookups
//! 2. Agents     agents/people/**/*.json     → filter → emit (agents-people.*)
//! 3. Accessions repositories/**/accessions/**/*.json
//!                                           → filter → resolve → emit (accession.*)
//! ```
//!
//! Lookup failures stop the run before any page is written. A failing record
//! stops the run too, unless the policy is [`ErrorPolicy::Continue`], in which
//! case it is reported and skipped. Template errors stop the run under either
//! policy since they would fail every record of the batch.
//!
//! Progress is reported through [`GenerateEvent`]s; see
//! [`crate::output::format_generate_event`].

use crate::config::{ErrorPolicy, PagesConfig};
use crate::emit::{self, EmitError, EmittedPage};
use crate::filter;
use crate::load::{self, LoadError, LookupDirs, Lookups};
use crate::render::{RenderError, Templates};
use crate::resolve;
use crate::types::{Accession, Agent};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const AGENT_TEMPLATES: (&str, &str) = ("agents-people.html", "agents-people.include");
pub const ACCESSION_TEMPLATES: (&str, &str) = ("accession.html", "accession.include");

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Template(#[from] RenderError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("Can't create {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Can't walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl GenerateError {
    /// Whether [`ErrorPolicy::Continue`] may skip past this error.
    fn is_per_record(&self) -> bool {
        match self {
            GenerateError::Load(_) => true,
            GenerateError::Emit(EmitError::Render(_)) => false,
            GenerateError::Emit(_) => true,
            GenerateError::Template(_)
            | GenerateError::OutputRoot { .. }
            | GenerateError::Walk { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Agent,
    Accession,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Agent => write!(f, "Agents/People"),
            RecordKind::Accession => write!(f, "Accessions"),
        }
    }
}

/// Progress notifications emitted during [`generate`].
#[derive(Debug)]
pub enum GenerateEvent<'a> {
    LoadingLookups(&'a LookupDirs),
    LookupsLoaded {
        subjects: usize,
        digital_objects: usize,
        agents: usize,
    },
    PhaseStarted {
        kind: RecordKind,
        dir: &'a Path,
    },
    PageWritten {
        kind: RecordKind,
        page: &'a EmittedPage,
        unresolved: usize,
    },
    RecordFailed {
        kind: RecordKind,
        path: &'a Path,
        error: &'a GenerateError,
    },
}

/// Per-kind counters for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    /// Record files found by the walk.
    pub seen: usize,
    /// Records that passed the publication filter and were written.
    pub published: usize,
    /// Records skipped after an error (continue policy only).
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub agents: PhaseSummary,
    pub accessions: PhaseSummary,
}

/// Run the full page generation.
pub fn generate(
    config: &PagesConfig,
    mut on_event: impl FnMut(GenerateEvent<'_>),
) -> Result<GenerateSummary, GenerateError> {
    emit::create_dir(&config.htdocs).map_err(|source| GenerateError::OutputRoot {
        path: config.htdocs.clone(),
        source,
    })?;

    let dirs = LookupDirs::discover(&config.dataset)?;
    on_event(GenerateEvent::LoadingLookups(&dirs));
    let lookups = Lookups::load(&dirs)?;
    on_event(GenerateEvent::LookupsLoaded {
        subjects: lookups.subjects.len(),
        digital_objects: lookups.digital_objects.len(),
        agents: lookups.agents.len(),
    });

    let templates = Templates::new(&config.templates);
    let walker = Walker {
        config,
        templates: &templates,
        lookups: &lookups,
    };

    let agents = walker.agents(&mut on_event)?;
    let accessions = walker.accessions(&mut on_event)?;
    Ok(GenerateSummary { agents, accessions })
}

struct Walker<'a> {
    config: &'a PagesConfig,
    templates: &'a Templates,
    lookups: &'a Lookups,
}

impl Walker<'_> {
    fn agents(
        &self,
        on_event: &mut impl FnMut(GenerateEvent<'_>),
    ) -> Result<PhaseSummary, GenerateError> {
        let dir = self.config.dataset.join("agents").join("people");
        let (html, include) = AGENT_TEMPLATES;
        let pair = self.templates.pair(html, include)?;

        self.walk(RecordKind::Agent, &dir, "agents/people", on_event, |path| {
            let agent: Agent = load::read_record(path)?;
            if !filter::agent_is_public(&agent) {
                return Ok(None);
            }
            let page = emit::emit_pages(&agent, &pair, &self.config.htdocs)?;
            Ok(Some((page, 0)))
        })
    }

    fn accessions(
        &self,
        on_event: &mut impl FnMut(GenerateEvent<'_>),
    ) -> Result<PhaseSummary, GenerateError> {
        let dir = self.config.dataset.join("repositories");
        let (html, include) = ACCESSION_TEMPLATES;
        let pair = self.templates.pair(html, include)?;

        self.walk(RecordKind::Accession, &dir, "accessions", on_event, |path| {
            let accession: Accession = load::read_record(path)?;
            if !filter::accession_is_public(&accession) {
                return Ok(None);
            }
            let view = resolve::normalize_with(&accession, self.lookups);
            let page = emit::emit_pages(&view, &pair, &self.config.htdocs)?;
            Ok(Some((page, view.unresolved_count())))
        })
    }

    /// Visit every `.json` file under `dir` whose path contains `marker`.
    ///
    /// `process` returns the written page and its unresolved reference
    /// count, or `None` when the record is not public.
    fn walk(
        &self,
        kind: RecordKind,
        dir: &Path,
        marker: &str,
        on_event: &mut impl FnMut(GenerateEvent<'_>),
        mut process: impl FnMut(&Path) -> Result<Option<(EmittedPage, usize)>, GenerateError>,
    ) -> Result<PhaseSummary, GenerateError> {
        on_event(GenerateEvent::PhaseStarted { kind, dir });
        let mut summary = PhaseSummary::default();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|source| GenerateError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_record_file(path, marker) {
                continue;
            }
            summary.seen += 1;

            match process(path) {
                Ok(Some((page, unresolved))) => {
                    summary.published += 1;
                    on_event(GenerateEvent::PageWritten {
                        kind,
                        page: &page,
                        unresolved,
                    });
                }
                Ok(None) => {}
                Err(error)
                    if self.config.on_error == ErrorPolicy::Continue && error.is_per_record() =>
                {
                    summary.failed += 1;
                    on_event(GenerateEvent::RecordFailed {
                        kind,
                        path,
                        error: &error,
                    });
                }
                Err(error) => return Err(error),
            }
        }
        Ok(summary)
    }
}

/// `.json` files whose path contains `marker`, compared with `/` separators.
fn is_record_file(path: &Path, marker: &str) -> bool {
    let path = path.to_string_lossy().replace('\\', "/");
    path.ends_with(".json") && path.contains(marker)
}
