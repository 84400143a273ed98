//! Template loading and the shared template function library.
//!
//! Templates live in the template root and are loaded lazily through a
//! minijinja path loader. Every template sees the same library:
//!
//! | Name | Kind | Purpose |
//! |------|------|---------|
//! | `now()` | function | current local time, RFC 3339 |
//! | `year()` | function | current year |
//! | `date(fmt)` | filter | format a unix timestamp, date, or date-time string |
//! | `markdown` | filter | CommonMark → HTML |
//! | `nl2p` | filter | wrap blank-line separated text in `<p>` |
//! | `deslug` | filter | `some-slug` → `some slug` |
//! | `agent_name(agent)` | function | display name of an agent record |
//! | `subject_label(subject)` | function | subject terms joined with ` -- ` |
//! | `digital_object_links(obj)` | function | published file URIs of a digital object |
//! | `resolved` | filter | keep the records of resolved references |
//!
//! Both `.html` and `.include` templates are HTML auto-escaped.

use crate::types::{Agent, DigitalObject, Subject};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use maud::html;
use minijinja::value::{Value, ViaDeserialize};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, Template, path_loader};
use pulldown_cmark::{Parser, html as md_html};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("template {name}: {source:#}")]
pub struct RenderError {
    pub name: String,
    #[source]
    pub source: Error,
}

/// The template environment for one template root.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new(root: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(root));
        env.set_auto_escape_callback(|name| {
            if name.ends_with(".html") || name.ends_with(".include") {
                AutoEscape::Html
            } else {
                AutoEscape::None
            }
        });

        env.add_function("now", now);
        env.add_function("year", year);
        env.add_filter("date", date);
        env.add_filter("markdown", markdown);
        env.add_filter("nl2p", nl2p);
        env.add_filter("deslug", deslug);
        env.add_function("agent_name", agent_name);
        env.add_function("subject_label", subject_label);
        env.add_function("digital_object_links", digital_object_links);
        env.add_filter("resolved", resolved);

        Templates { env }
    }

    /// Load a full-page template and its fragment template.
    ///
    /// Both are parsed here, once per batch, so a broken template fails the
    /// run before any record is walked.
    pub fn pair(&self, html: &str, include: &str) -> Result<TemplatePair<'_>, RenderError> {
        Ok(TemplatePair {
            html: self.get(html)?,
            include: self.get(include)?,
        })
    }

    fn get(&self, name: &str) -> Result<Template<'_, '_>, RenderError> {
        self.env.get_template(name).map_err(|source| RenderError {
            name: name.to_string(),
            source,
        })
    }
}

/// A full-page template and the fragment template it embeds.
pub struct TemplatePair<'env> {
    html: Template<'env, 'env>,
    include: Template<'env, 'env>,
}

impl TemplatePair<'_> {
    pub fn render_html<S: Serialize>(&self, ctx: &S) -> Result<String, RenderError> {
        render(&self.html, ctx)
    }

    pub fn render_include<S: Serialize>(&self, ctx: &S) -> Result<String, RenderError> {
        render(&self.include, ctx)
    }
}

fn render<S: Serialize>(template: &Template<'_, '_>, ctx: &S) -> Result<String, RenderError> {
    template.render(ctx).map_err(|source| RenderError {
        name: template.name().to_string(),
        source,
    })
}

// ============================================================================
// Time
// ============================================================================

fn now() -> String {
    Local::now().to_rfc3339()
}

fn year() -> i32 {
    Local::now().year()
}

fn date(value: Value, fmt: Option<&str>) -> Result<String, Error> {
    let fmt = fmt.unwrap_or("%Y-%m-%d");

    if let Some(ts) = value.as_i64() {
        let datetime = DateTime::from_timestamp(ts, 0).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidOperation,
                "invalid timestamp provided to `date`",
            )
        })?;
        return Ok(datetime.format(fmt).to_string());
    }

    let kind = value.kind();
    let string = value.as_str().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("`date` must be applied to a string or integer, found {kind}"),
        )
    })?;

    string
        .parse::<NaiveDate>()
        .map(|d| d.format(fmt).to_string())
        .or_else(|_| string.parse::<NaiveDateTime>().map(|dt| dt.format(fmt).to_string()))
        .or_else(|_| DateTime::parse_from_rfc3339(string).map(|dt| dt.format(fmt).to_string()))
        .map_err(|e| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("failed to parse {string}: {e}"),
            )
        })
}

// ============================================================================
// Page helpers
// ============================================================================

fn markdown(value: &str) -> Value {
    let mut out = String::new();
    md_html::push_html(&mut out, Parser::new(value));
    Value::from_safe_string(out)
}

fn nl2p(value: &str) -> Value {
    let paragraphs: Vec<&str> = value
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let markup = html! {
        @for para in &paragraphs {
            p { (para) }
        }
    };
    Value::from_safe_string(markup.into_string())
}

fn deslug(value: &str) -> String {
    value.replace('-', " ")
}

// ============================================================================
// Domain helpers
// ============================================================================

fn agent_name(agent: ViaDeserialize<Agent>) -> String {
    agent.name().to_string()
}

fn subject_label(subject: ViaDeserialize<Subject>) -> String {
    subject.label()
}

fn digital_object_links(object: ViaDeserialize<DigitalObject>) -> Vec<String> {
    object
        .published_files()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn resolved(refs: Vec<Value>) -> Result<Vec<Value>, Error> {
    let mut records = Vec::new();
    for r in refs {
        if r.get_attr("status")?.as_str() == Some("resolved") {
            records.push(r.get_attr("record")?);
        }
    }
    Ok(records)
}
