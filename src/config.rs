//! Configuration.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. stock defaults ([`SiteConfig::default`])
//! 2. a TOML file (`--config`, or `cait-site.toml` in the working directory)
//! 3. environment variables (`CAIT_DATASET`, `CAIT_HTDOCS`, ...)
//! 4. command-line flags
//!
//! Layers 3 and 4 arrive together as [`Overrides`] (clap resolves the env
//! fallback). Every layer is a TOML value merged with [`merge_toml`], then the
//! result is deserialized and validated once.
//!
//! ## Config File
//!
//! ```toml
//! dataset = "dataset"          # ArchivesSpace export root
//! templates = "templates"      # accession.html, agents-people.html, ...
//! htdocs = "htdocs"            # where pages are written
//! on_error = "abort"           # or "continue"
//!
//! [sitemap]
//! site_url = "http://archives.example.org"
//! path = "htdocs/sitemap.xml"
//! changefreq = "daily"
//! exclude = ["drafts/"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Looked for in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "cait-site.toml";

const CHANGE_FREQUENCIES: &[&str] = &[
    "always", "hourly", "daily", "weekly", "monthly", "yearly", "never",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Can't read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("{key} is required, set --{flag} or {env}")]
    Missing {
        key: &'static str,
        flag: &'static str,
        env: &'static str,
    },
}

/// What the page walk does when a single record fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the whole run at the first failing record.
    #[default]
    Abort,
    /// Report the failing record and keep walking.
    Continue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub dataset: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub htdocs: Option<PathBuf>,
    pub on_error: ErrorPolicy,
    pub sitemap: SitemapSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapSettings {
    pub site_url: Option<String>,
    pub path: Option<PathBuf>,
    pub changefreq: String,
    /// Path fragments; any `.html` file whose path contains one is left out.
    pub exclude: Vec<String>,
}

impl Default for SitemapSettings {
    fn default() -> Self {
        Self {
            site_url: None,
            path: None,
            changefreq: "daily".to_string(),
            exclude: Vec::new(),
        }
    }
}

/// Everything the page generator needs, all required values present.
#[derive(Debug, Clone, PartialEq)]
pub struct PagesConfig {
    pub dataset: PathBuf,
    pub templates: PathBuf,
    pub htdocs: PathBuf,
    pub on_error: ErrorPolicy,
}

/// Everything the sitemap builder needs, all required values present.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapConfig {
    pub htdocs: PathBuf,
    pub site_url: String,
    pub path: PathBuf,
    pub changefreq: String,
    pub exclude: Vec<String>,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !CHANGE_FREQUENCIES.contains(&self.sitemap.changefreq.as_str()) {
            return Err(ConfigError::Validation(format!(
                "sitemap.changefreq must be one of {}, got {:?}",
                CHANGE_FREQUENCIES.join(", "),
                self.sitemap.changefreq
            )));
        }
        match &self.sitemap.site_url {
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                Err(ConfigError::Validation(format!(
                    "sitemap.site_url must be an http(s) URL, got {url:?}"
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn pages(&self) -> Result<PagesConfig, ConfigError> {
        Ok(PagesConfig {
            dataset: required(&self.dataset, "dataset", "dataset", "CAIT_DATASET")?,
            templates: required(&self.templates, "templates", "templates", "CAIT_TEMPLATES")?,
            htdocs: required(&self.htdocs, "htdocs", "htdocs", "CAIT_HTDOCS")?,
            on_error: self.on_error,
        })
    }

    pub fn sitemap(&self) -> Result<SitemapConfig, ConfigError> {
        Ok(SitemapConfig {
            htdocs: required(&self.htdocs, "htdocs", "htdocs", "CAIT_HTDOCS")?,
            site_url: required(&self.sitemap.site_url, "sitemap.site_url", "url", "CAIT_SITE_URL")?,
            path: required(&self.sitemap.path, "sitemap.path", "sitemap", "CAIT_SITEMAP")?,
            changefreq: self.sitemap.changefreq.clone(),
            exclude: self.sitemap.exclude.clone(),
        })
    }
}

fn required<T: Clone>(
    value: &Option<T>,
    key: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<T, ConfigError> {
    value
        .clone()
        .ok_or(ConfigError::Missing { key, flag, env })
}

/// Values from the command line (or their environment fallbacks).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dataset: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub htdocs: Option<PathBuf>,
    pub site_url: Option<String>,
    pub sitemap: Option<PathBuf>,
    pub changefreq: Option<String>,
    /// Colon-delimited path fragments.
    pub exclude: Option<String>,
    pub continue_on_error: bool,
}

impl Overrides {
    /// The overrides as a sparse TOML table, ready to merge.
    pub fn to_toml(&self) -> toml::Value {
        let mut root = toml::Table::new();
        let mut sitemap = toml::Table::new();

        let path_value = |p: &PathBuf| toml::Value::String(p.to_string_lossy().into_owned());
        if let Some(p) = &self.dataset {
            root.insert("dataset".into(), path_value(p));
        }
        if let Some(p) = &self.templates {
            root.insert("templates".into(), path_value(p));
        }
        if let Some(p) = &self.htdocs {
            root.insert("htdocs".into(), path_value(p));
        }
        if self.continue_on_error {
            root.insert("on_error".into(), toml::Value::String("continue".into()));
        }
        if let Some(url) = &self.site_url {
            sitemap.insert("site_url".into(), toml::Value::String(url.clone()));
        }
        if let Some(p) = &self.sitemap {
            sitemap.insert("path".into(), path_value(p));
        }
        if let Some(freq) = &self.changefreq {
            sitemap.insert("changefreq".into(), toml::Value::String(freq.clone()));
        }
        if let Some(list) = &self.exclude {
            let fragments = split_exclusions(list)
                .into_iter()
                .map(toml::Value::String)
                .collect();
            sitemap.insert("exclude".into(), toml::Value::Array(fragments));
        }

        if !sitemap.is_empty() {
            root.insert("sitemap".into(), toml::Value::Table(sitemap));
        }
        toml::Value::Table(root)
    }
}

/// Split a colon-delimited exclusion list, dropping empty entries.
///
/// An empty fragment would match every path, so `""` and `"a::b"` must not
/// produce one.
pub fn split_exclusions(list: &str) -> Vec<String> {
    list.split(':')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Merge layers onto the stock defaults, then deserialize and validate.
pub fn resolve_config(layers: Vec<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let merged = layers.into_iter().fold(stock_defaults_value(), merge_toml);
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
/// used when present in the working directory.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<SiteConfig, ConfigError> {
    let mut layers = Vec::new();
    match path {
        Some(p) => layers.push(load_raw_config(p)?),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                layers.push(load_raw_config(default)?);
            }
        }
    }
    layers.push(overrides.to_toml());
    resolve_config(layers)
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cait-site configuration
# =======================
# Every setting can also be given on the command line or through an
# environment variable; those take precedence over this file.
# Unknown keys will cause an error.

# Root of the ArchivesSpace export (agents/, subjects/, repositories/).
# --dataset / CAIT_DATASET
# dataset = "dataset"

# Directory holding accession.html, accession.include,
# agents-people.html and agents-people.include.
# --templates / CAIT_TEMPLATES
# templates = "templates"

# Where generated .html, .include and .json files are written.
# --htdocs / CAIT_HTDOCS
# htdocs = "htdocs"

# What to do when one record fails: "abort" stops the run,
# "continue" reports the record and moves on.
# Template errors always stop the run.
# --continue-on-error
on_error = "abort"

# ---------------------------------------------------------------------------
# Sitemap
# ---------------------------------------------------------------------------
[sitemap]
# Base URL prepended to every page path.
# --url / CAIT_SITE_URL
# site_url = "http://archives.example.org"

# Where the sitemap document is written.
# --sitemap / CAIT_SITEMAP
# path = "htdocs/sitemap.xml"

# One of: always, hourly, daily, weekly, monthly, yearly, never.
# --changefreq / CAIT_CHANGEFREQ
changefreq = "daily"

# Path fragments to leave out. Error pages (htdocs/40*, htdocs/50*) are
# always left out.
# --exclude a:b / CAIT_EXCLUDE
exclude = []
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.on_error, ErrorPolicy::Abort);
        assert_eq!(config.sitemap.changefreq, "daily");
        assert!(config.dataset.is_none());
        assert!(config.sitemap.exclude.is_empty());
    }

    #[test]
    fn stock_defaults_omit_unset_paths() {
        let value = stock_defaults_value();
        let table = value.as_table().unwrap();
        assert!(!table.contains_key("dataset"));
        assert_eq!(table["sitemap"]["changefreq"].as_str(), Some("daily"));
    }

    #[test]
    fn parse_partial_config() {
        let config: SiteConfig = toml::from_str(
            r#"
dataset = "/data/export"

[sitemap]
changefreq = "weekly"
"#,
        )
        .unwrap();
        assert_eq!(config.dataset, Some(PathBuf::from("/data/export")));
        assert_eq!(config.sitemap.changefreq, "weekly");
        assert!(config.sitemap.exclude.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("datasett = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn on_error_parses_lowercase() {
        let config: SiteConfig = toml::from_str("on_error = \"continue\"").unwrap();
        assert_eq!(config.on_error, ErrorPolicy::Continue);
    }

    #[test]
    fn merge_toml_overlay_wins() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn overrides_beat_file_values() {
        let file: toml::Value = toml::from_str(
            r#"
dataset = "from-file"
htdocs = "from-file"
[sitemap]
changefreq = "monthly"
"#,
        )
        .unwrap();
        let overrides = Overrides {
            htdocs: Some(PathBuf::from("from-cli")),
            continue_on_error: true,
            ..Default::default()
        };

        let config = resolve_config(vec![file, overrides.to_toml()]).unwrap();
        assert_eq!(config.dataset, Some(PathBuf::from("from-file")));
        assert_eq!(config.htdocs, Some(PathBuf::from("from-cli")));
        assert_eq!(config.sitemap.changefreq, "monthly");
        assert_eq!(config.on_error, ErrorPolicy::Continue);
    }

    #[test]
    fn empty_overrides_change_nothing() {
        let config = resolve_config(vec![Overrides::default().to_toml()]).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn exclusion_list_is_colon_delimited() {
        assert_eq!(split_exclusions("drafts/:old/"), vec!["drafts/", "old/"]);
        assert!(split_exclusions("").is_empty());
        assert_eq!(split_exclusions("a::b:"), vec!["a", "b"]);
    }

    #[test]
    fn exclude_override_replaces_file_list() {
        let file: toml::Value = toml::from_str("[sitemap]\nexclude = [\"x\"]").unwrap();
        let overrides = Overrides {
            exclude: Some("a:b".into()),
            ..Default::default()
        };
        let config = resolve_config(vec![file, overrides.to_toml()]).unwrap();
        assert_eq!(config.sitemap.exclude, vec!["a", "b"]);
    }

    #[test]
    fn invalid_changefreq_is_rejected() {
        let overrides = Overrides {
            changefreq: Some("fortnightly".into()),
            ..Default::default()
        };
        let err = resolve_config(vec![overrides.to_toml()]).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn non_http_site_url_is_rejected() {
        let overrides = Overrides {
            site_url: Some("archives.example.org".into()),
            ..Default::default()
        };
        assert!(resolve_config(vec![overrides.to_toml()]).is_err());
    }

    #[test]
    fn missing_required_values_name_flag_and_env() {
        let err = SiteConfig::default().pages().unwrap_err();
        match err {
            ConfigError::Missing { flag, env, .. } => {
                assert_eq!(flag, "dataset");
                assert_eq!(env, "CAIT_DATASET");
            }
            other => panic!("expected missing error, got {other:?}"),
        }
        assert!(err_string(SiteConfig::default().sitemap()).contains("CAIT_HTDOCS"));
    }

    fn err_string<T: std::fmt::Debug>(r: Result<T, ConfigError>) -> String {
        r.unwrap_err().to_string()
    }

    #[test]
    fn complete_config_yields_pages_and_sitemap() {
        let overrides = Overrides {
            dataset: Some("d".into()),
            templates: Some("t".into()),
            htdocs: Some("h".into()),
            site_url: Some("http://x.org".into()),
            sitemap: Some("h/sitemap.xml".into()),
            ..Default::default()
        };
        let config = resolve_config(vec![overrides.to_toml()]).unwrap();

        let pages = config.pages().unwrap();
        assert_eq!(pages.dataset, PathBuf::from("d"));
        assert_eq!(pages.on_error, ErrorPolicy::Abort);

        let sitemap = config.sitemap().unwrap();
        assert_eq!(sitemap.site_url, "http://x.org");
        assert_eq!(sitemap.changefreq, "daily");
    }

    #[test]
    fn load_config_reads_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.toml");
        fs::write(&path, "templates = \"tpl\"\n").unwrap();

        let config = load_config(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(config.templates, Some(PathBuf::from("tpl")));
    }

    #[test]
    fn load_config_missing_explicit_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(Some(&tmp.path().join("nope.toml")), &Overrides::default());
        assert!(matches!(err, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }
}
