//! # cait-site
//!
//! A static site generator for ArchivesSpace JSON exports. Public accessions
//! and people each get a full HTML page, an embeddable `.include` fragment,
//! and the JSON that was rendered; a sitemap lists the generated pages.
//!
//! # Architecture: Two Passes
//!
//! ```text
//! 1. Pages    dataset/  →  htdocs/<uri>.{html,include,json}
//! 2. Sitemap  htdocs/   →  sitemap.xml
//! ```
//!
//! The page pass first loads every subject, digital object, and person into
//! in-memory lookups. It then walks people and accessions, keeps the public
//! ones, expands each accession's references from the lookups, and renders the
//! result through a pair of templates. The sitemap pass only reads what the
//! page pass left on disk, so it can run on its own or after hand edits.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Record types decoded from the export (`Accession`, `Agent`, `Subject`, `DigitalObject`) |
//! | [`load`] | Lookup loaders: subjects, digital objects, people |
//! | [`filter`] | Publication rules for accessions and people |
//! | [`resolve`] | Accession → normalized view with references expanded |
//! | [`render`] | minijinja environment, template pairs, and the template function library |
//! | [`emit`] | Writes the `.html`, `.include`, `.json` triple for one record |
//! | [`generate`] | Page pass driver: lookups, walks, error policy, progress events |
//! | [`sitemap`] | Sitemap pass: walk htdocs, apply exclusions, write the XML |
//! | [`config`] | Layered `cait-site.toml` loading, overrides, and validation |
//! | [`output`] | CLI output formatting for both passes |
//!
//! # Design Decisions
//!
//! ## Runtime Templates
//!
//! Page layout belongs to the archive, not to this binary, so templates are
//! loaded from a directory at runtime with [minijinja](https://docs.rs/minijinja).
//! Both the page and the fragment are HTML-escaped; the `markdown` filter is
//! the way to emit markup from record text.
//!
//! ## Best-Effort References
//!
//! A reference to a record missing from the export is not an error. It stays
//! in the normalized view as `{"status": "unresolved", "ref": ...}` so
//! templates can decide how to show it and the `.json` output records it.
//!
//! ## Fail Fast by Default
//!
//! A bad record stops the page pass, which matches how the export is normally
//! fixed and rerun. `on_error = "continue"` reports and skips bad records
//! instead. Template errors stop the run either way.
//!
//! ## Reproducible Output
//!
//! Lookups are ordered maps and every directory walk is sorted by file name,
//! so two runs over the same export produce identical trees.

pub mod config;
pub mod emit;
pub mod filter;
pub mod generate;
pub mod load;
pub mod output;
pub mod render;
pub mod resolve;
pub mod sitemap;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
