//! CLI output formatting for page generation and the sitemap.
//!
//! Output is a running log of what was read, written, and skipped, one
//! record per line, with a closing summary.
//!
//! # Output Format
//!
//! ## Pages
//!
//! ```text
//! Reading Subjects from dataset/subjects
//! Reading Digital Objects from dataset/repositories/2/digital_objects
//! Reading Agents/People from dataset/agents/people
//! Loaded 2 subjects, 1 digital objects, 3 agents
//! Processing Agents/People in dataset/agents/people
//! Writing /agents/people/1 → .html .include .json
//! Processing Accessions in dataset/repositories
//! Writing /repositories/2/accessions/1 → .html .include .json
//!     2 unresolved references
//! Failed dataset/repositories/2/accessions/9.json: Can't decode ...
//!
//! Generated 1 agent pages, 1 accession pages (4 not public, 1 failed)
//! ```
//!
//! ## Sitemap
//!
//! ```text
//! Skipping htdocs/404/index.html, because htdocs/40
//! Adding http://x.org/a.html
//! Writing htdocs/sitemap.xml
//! Sitemap lists 1 pages
//! ```
//!
//! # Architecture
//!
//! Each event has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::generate::{GenerateEvent, GenerateSummary};
use crate::sitemap::SitemapEvent;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Pages
// ============================================================================

/// Format a single generate progress event as display lines.
pub fn format_generate_event(event: &GenerateEvent<'_>) -> Vec<String> {
    match event {
        GenerateEvent::LoadingLookups(dirs) => vec![
            format!("Reading Subjects from {}", dirs.subjects.display()),
            format!(
                "Reading Digital Objects from {}",
                dirs.digital_objects.display()
            ),
            format!("Reading Agents/People from {}", dirs.agents.display()),
        ],
        GenerateEvent::LookupsLoaded {
            subjects,
            digital_objects,
            agents,
        } => vec![format!(
            "Loaded {subjects} subjects, {digital_objects} digital objects, {agents} agents"
        )],
        GenerateEvent::PhaseStarted { kind, dir } => {
            vec![format!("Processing {kind} in {}", dir.display())]
        }
        GenerateEvent::PageWritten {
            page, unresolved, ..
        } => {
            let mut lines = vec![format!("Writing {} \u{2192} .html .include .json", page.uri)];
            if *unresolved > 0 {
                lines.push(format!("{}{unresolved} unresolved references", indent(1)));
            }
            lines
        }
        GenerateEvent::RecordFailed { path, error, .. } => {
            vec![format!("Failed {}: {error}", path.display())]
        }
    }
}

/// Print a generate event to stdout.
pub fn print_generate_event(event: &GenerateEvent<'_>) {
    for line in format_generate_event(event) {
        println!("{}", line);
    }
}

/// Format the closing summary of a generate run.
pub fn format_generate_summary(summary: &GenerateSummary) -> Vec<String> {
    let (agents, accessions) = (&summary.agents, &summary.accessions);
    let failed = agents.failed + accessions.failed;
    let not_public = (agents.seen + accessions.seen)
        .saturating_sub(agents.published + accessions.published + failed);

    let mut tail = vec![format!("{not_public} not public")];
    if failed > 0 {
        tail.push(format!("{failed} failed"));
    }
    vec![
        String::new(),
        format!(
            "Generated {} agent pages, {} accession pages ({})",
            agents.published,
            accessions.published,
            tail.join(", ")
        ),
    ]
}

/// Print the generate summary to stdout.
pub fn print_generate_summary(summary: &GenerateSummary) {
    for line in format_generate_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Sitemap
// ============================================================================

/// Format a single sitemap progress event as a display line.
pub fn format_sitemap_event(event: &SitemapEvent<'_>) -> String {
    match event {
        SitemapEvent::Skipped { path, fragment } => {
            format!("Skipping {}, because {fragment}", path.display())
        }
        SitemapEvent::Added(entry) => format!("Adding {}", entry.loc),
        SitemapEvent::Writing(path) => format!("Writing {}", path.display()),
    }
}

/// Print a sitemap event to stdout.
pub fn print_sitemap_event(event: &SitemapEvent<'_>) {
    println!("{}", format_sitemap_event(event));
}

pub fn format_sitemap_summary(count: usize) -> String {
    format!("Sitemap lists {count} pages")
}

// ============================================================================
// Tests
// ============================================================================
