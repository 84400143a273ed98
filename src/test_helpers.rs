//! Shared test utilities for the cait-site test suite.
//!
//! The fixtures under `fixtures/` are a tiny ArchivesSpace export plus a
//! template set:
//!
//! ```text
//! fixtures/dataset/    subjects/, agents/people/, repositories/2/{accessions,digital_objects}/
//! fixtures/templates/  accession.{html,include}, agents-people.{html,include}
//! ```
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = fixture_config(tmp.path());
//! generate(&config, |_| {}).unwrap();
//! assert_page_exists(&config.htdocs, "agents/people/1");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::{ErrorPolicy, PagesConfig};
use crate::load::{LookupDirs, Lookups};

/// The one public accession in the fixture dataset.
pub const FIXTURE_ACCESSION: &str =
    include_str!("../fixtures/dataset/repositories/2/accessions/1.json");

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Pages config pointing at a fixture copy, writing to `<root>/htdocs`.
pub fn fixture_config(root: &Path) -> PagesConfig {
    PagesConfig {
        dataset: root.join("dataset"),
        templates: root.join("templates"),
        htdocs: root.join("htdocs"),
        on_error: ErrorPolicy::Abort,
    }
}

/// Lookups built straight from the source fixtures.
pub fn fixture_lookups() -> Lookups {
    let dataset = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/dataset");
    let dirs = LookupDirs::discover(&dataset).unwrap();
    Lookups::load(&dirs).unwrap()
}

/// Write `content` to `dir/name`, creating `dir` if needed.
pub fn write_json(dir: &Path, name: &str, content: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), content).unwrap();
}

// =========================================================================
// Output assertions
// =========================================================================

/// Assert all three files of a page exist under `htdocs`.
pub fn assert_page_exists(htdocs: &Path, stem: &str) {
    for ext in ["html", "include", "json"] {
        let path = htdocs.join(format!("{stem}.{ext}"));
        assert!(path.is_file(), "expected {} to exist", path.display());
    }
}

/// Assert no file of a page exists under `htdocs`.
pub fn assert_no_page(htdocs: &Path, stem: &str) {
    for ext in ["html", "include", "json"] {
        let path = htdocs.join(format!("{stem}.{ext}"));
        assert!(!path.exists(), "expected {} to be absent", path.display());
    }
}
