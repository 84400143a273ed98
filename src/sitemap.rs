//! Sitemap builder: a second pass over the generated htdocs tree.
//!
//! Every `.html` file becomes one `<url>` entry, except error pages and paths
//! matching a configured exclusion fragment:
//!
//! ```text
//! htdocs/a.html        →  <loc>http://x.org/a.html</loc>
//! htdocs/404/x.html    →  skipped (error page)
//! htdocs/a.include     →  ignored
//! ```
//!
//! Entries keep walk order (sorted by file name) and are not deduplicated.

use crate::config::SitemapConfig;
use crate::emit;
use chrono::{DateTime, Local};
use maud::{PreEscaped, html};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const SITEMAP_XMLNS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Path fragments that mark error pages.
const ERROR_PAGE_FRAGMENTS: [&str; 2] = ["htdocs/40", "htdocs/50"];
/// Error page directories directly under the htdocs root.
const ERROR_PAGE_PREFIXES: [&str; 2] = ["40", "50"];

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("Can't walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Can't read modification time of {path}: {source}")]
    Metadata { path: PathBuf, source: io::Error },
    #[error("Can't create {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Can't write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    /// `YYYY-MM-DD`, local time.
    pub lastmod: String,
}

/// Progress notifications emitted while building a sitemap.
#[derive(Debug)]
pub enum SitemapEvent<'a> {
    Skipped { path: &'a Path, fragment: &'a str },
    Added(&'a SitemapEntry),
    Writing(&'a Path),
}

/// Walk `htdocs` and collect one entry per non-excluded `.html` file.
///
/// Empty exclusion fragments are ignored; they would match every path.
pub fn collect_entries(
    htdocs: &Path,
    site_url: &str,
    excludes: &[String],
    mut on_event: impl FnMut(SitemapEvent<'_>),
) -> Result<Vec<SitemapEntry>, SitemapError> {
    let base = site_url.trim_end_matches('/');
    let mut entries = Vec::new();

    for entry in WalkDir::new(htdocs).sort_by_file_name() {
        let entry = entry.map_err(|source| SitemapError::Walk {
            path: htdocs.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "html") {
            continue;
        }
        // Entries from WalkDir always sit under its root.
        let rel = path.strip_prefix(htdocs).unwrap_or(path);

        if let Some(fragment) = excluded_by(path, rel, excludes) {
            on_event(SitemapEvent::Skipped { path, fragment });
            continue;
        }

        let modified = entry
            .metadata()
            .map_err(io::Error::from)
            .and_then(|m| m.modified())
            .map_err(|source| SitemapError::Metadata {
                path: path.to_path_buf(),
                source,
            })?;
        let lastmod = DateTime::<Local>::from(modified)
            .format("%Y-%m-%d")
            .to_string();

        let entry = SitemapEntry {
            loc: format!("{base}/{}", slash_path(rel)),
            lastmod,
        };
        on_event(SitemapEvent::Added(&entry));
        entries.push(entry);
    }
    Ok(entries)
}

/// The exclusion that matches `path`, if any.
fn excluded_by<'a>(path: &Path, rel: &Path, excludes: &'a [String]) -> Option<&'a str> {
    let full = slash_path(path);
    let builtin = ERROR_PAGE_FRAGMENTS
        .into_iter()
        .find(|fragment| full.contains(fragment))
        .or_else(|| {
            let first = rel.components().next()?.as_os_str().to_string_lossy();
            ERROR_PAGE_PREFIXES
                .into_iter()
                .find(|prefix| first.starts_with(prefix))
        });
    if let Some(fragment) = builtin {
        return Some(fragment);
    }
    excludes
        .iter()
        .map(String::as_str)
        .find(|fragment| !fragment.is_empty() && full.contains(fragment))
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Render the sitemap XML document.
pub fn render_sitemap(entries: &[SitemapEntry], changefreq: &str) -> String {
    let body = html! {
        (PreEscaped(XML_DECLARATION))
        "\n"
        urlset xmlns=(SITEMAP_XMLNS) {
            @for entry in entries {
                url {
                    loc { (entry.loc) }
                    lastmod { (entry.lastmod) }
                    changefreq { (changefreq) }
                }
            }
        }
    };
    let mut xml = body.into_string();
    xml.push('\n');
    xml
}

/// Collect entries and render the document in one step.
pub fn build_sitemap(
    htdocs: &Path,
    site_url: &str,
    changefreq: &str,
    excludes: &[String],
    on_event: impl FnMut(SitemapEvent<'_>),
) -> Result<(Vec<u8>, usize), SitemapError> {
    let entries = collect_entries(htdocs, site_url, excludes, on_event)?;
    let xml = render_sitemap(&entries, changefreq);
    Ok((xml.into_bytes(), entries.len()))
}

/// Build the sitemap for `config` and write it to `config.path`.
///
/// Returns the number of entries written.
pub fn write_sitemap(
    config: &SitemapConfig,
    mut on_event: impl FnMut(SitemapEvent<'_>),
) -> Result<usize, SitemapError> {
    let (xml, count) = build_sitemap(
        &config.htdocs,
        &config.site_url,
        &config.changefreq,
        &config.exclude,
        &mut on_event,
    )?;

    if let Some(dir) = config.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        emit::create_dir(dir).map_err(|source| SitemapError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    on_event(SitemapEvent::Writing(&config.path));
    emit::write_file(&config.path, &xml).map_err(|source| SitemapError::Write {
        path: config.path.clone(),
        source,
    })?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "<html></html>").unwrap();
        path
    }

    fn collect(root: &Path, excludes: &[&str]) -> Vec<SitemapEntry> {
        let excludes: Vec<String> = excludes.iter().map(|s| s.to_string()).collect();
        collect_entries(root, "http://x.org", &excludes, |_| {}).unwrap()
    }

    fn locs(entries: &[SitemapEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.loc.as_str()).collect()
    }

    #[test]
    fn error_pages_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let a = touch(tmp.path(), "a.html");
        touch(tmp.path(), "b.html");
        touch(tmp.path(), "404/x.html");

        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_457_740_800);
        fs::File::options()
            .write(true)
            .open(&a)
            .unwrap()
            .set_modified(modified)
            .unwrap();

        let entries = collect(tmp.path(), &[]);

        assert_eq!(locs(&entries), vec!["http://x.org/a.html", "http://x.org/b.html"]);
        let expected = DateTime::<Local>::from(modified).format("%Y-%m-%d").to_string();
        assert_eq!(entries[0].lastmod, expected);
    }

    #[test]
    fn only_html_files_are_listed() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "agents/people/1.html");
        touch(tmp.path(), "agents/people/1.include");
        touch(tmp.path(), "agents/people/1.json");

        assert_eq!(
            locs(&collect(tmp.path(), &[])),
            vec!["http://x.org/agents/people/1.html"]
        );
    }

    #[test]
    fn configured_fragments_exclude_paths() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "drafts/a.html");
        touch(tmp.path(), "repositories/2/accessions/1.html");
        touch(tmp.path(), "repositories/2/accessions/2.html");

        let entries = collect(tmp.path(), &["drafts", "accessions/2"]);
        assert_eq!(
            locs(&entries),
            vec!["http://x.org/repositories/2/accessions/1.html"]
        );
    }

    #[test]
    fn empty_fragments_exclude_nothing() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.html");

        assert_eq!(collect(tmp.path(), &["", ""]).len(), 1);
    }

    #[test]
    fn builtin_fragments_match_htdocs_paths() {
        let tmp = TempDir::new().unwrap();
        let htdocs = tmp.path().join("htdocs");
        touch(&htdocs, "50x.html");
        touch(&htdocs, "index.html");

        assert_eq!(locs(&collect(&htdocs, &[])), vec!["http://x.org/index.html"]);
    }

    #[test]
    fn skips_are_reported_with_their_fragment() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "private/a.html");

        let mut skipped = Vec::new();
        collect_entries(tmp.path(), "http://x.org", &["private".into()], |event| {
            if let SitemapEvent::Skipped { path, fragment } = event {
                skipped.push((path.to_path_buf(), fragment.to_string()));
            }
        })
        .unwrap();

        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].0.ends_with("private/a.html"));
        assert_eq!(skipped[0].1, "private");
    }

    #[test]
    fn trailing_slash_on_site_url_is_trimmed() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.html");

        let entries = collect_entries(tmp.path(), "http://x.org/", &[], |_| {}).unwrap();
        assert_eq!(entries[0].loc, "http://x.org/a.html");
    }

    #[test]
    fn renders_urlset_document() {
        let entries = vec![SitemapEntry {
            loc: "http://x.org/a.html?x=1&y=2".into(),
            lastmod: "2016-03-12".into(),
        }];
        let xml = render_sitemap(&entries, "weekly");

        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains(
            "<url><loc>http://x.org/a.html?x=1&amp;y=2</loc>\
             <lastmod>2016-03-12</lastmod><changefreq>weekly</changefreq></url>"
        ));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn empty_tree_renders_empty_urlset() {
        let xml = render_sitemap(&[], "daily");
        assert!(xml.contains("<urlset"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn write_sitemap_returns_entry_count() {
        let tmp = TempDir::new().unwrap();
        let htdocs = tmp.path().join("site");
        touch(&htdocs, "a.html");
        touch(&htdocs, "b.html");
        let config = SitemapConfig {
            htdocs: htdocs.clone(),
            site_url: "https://archives.example.org".into(),
            path: htdocs.join("sitemap.xml"),
            changefreq: "daily".into(),
            exclude: vec![],
        };

        let count = write_sitemap(&config, |_| {}).unwrap();

        assert_eq!(count, 2);
        let xml = fs::read_to_string(&config.path).unwrap();
        assert!(xml.contains("<loc>https://archives.example.org/b.html</loc>"));
    }

    #[test]
    fn unwritable_sitemap_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.html");
        let config = SitemapConfig {
            htdocs: tmp.path().to_path_buf(),
            site_url: "http://x.org".into(),
            // A directory can't be opened for writing.
            path: tmp.path().to_path_buf(),
            changefreq: "daily".into(),
            exclude: vec![],
        };

        assert!(matches!(
            write_sitemap(&config, |_| {}),
            Err(SitemapError::Write { .. })
        ));
    }
}
