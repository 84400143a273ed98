//! Record types decoded from an ArchivesSpace export.
//!
//! Only the fields the pipeline reads are typed. Everything else on a record
//! is kept in a flattened `extra` map so it survives into the emitted JSON and
//! stays reachable from templates.
//!
//! Field names follow the export (`restrictions_apply`,
//! `is_linked_to_published_record`, ...). The camelCase spellings are accepted
//! as aliases when decoding.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Anything with a stable URI. The URI doubles as the output path stem.
pub trait Record {
    fn uri(&self) -> &str;
}

/// Read an explicit `null` as the field's default, same as a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A reference to another record.
///
/// Exports write these as `{"ref": "/subjects/1"}`; a bare URI string is
/// accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RefRepr")]
pub struct Ref {
    #[serde(rename = "ref")]
    pub uri: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RefRepr {
    Bare(String),
    Object {
        #[serde(rename = "ref")]
        uri: String,
    },
}

impl From<RefRepr> for Ref {
    fn from(repr: RefRepr) -> Self {
        match repr {
            RefRepr::Bare(uri) | RefRepr::Object { uri } => Ref { uri },
        }
    }
}

impl Ref {
    pub fn new(uri: impl Into<String>) -> Self {
        Ref { uri: uri.into() }
    }
}

// ============================================================================
// Subjects and digital objects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub uri: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<Term>,
    #[serde(default, deserialize_with = "null_default")]
    pub publish: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub term: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub term_type: String,
}

impl Subject {
    /// Heading text: terms joined with ` -- `, or the title when untermed.
    pub fn label(&self) -> String {
        if self.terms.is_empty() {
            return self.title.clone();
        }
        self.terms
            .iter()
            .map(|t| t.term.as_str())
            .collect::<Vec<_>>()
            .join(" -- ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalObject {
    pub uri: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "String::is_empty")]
    pub digital_object_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub publish: bool,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub file_versions: Vec<FileVersion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileVersion {
    pub file_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_statement: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub publish: bool,
}

impl DigitalObject {
    /// URIs of the file versions flagged for publication.
    pub fn published_files(&self) -> Vec<&str> {
        self.file_versions
            .iter()
            .filter(|f| f.publish)
            .map(|f| f.file_uri.as_str())
            .collect()
    }
}

// ============================================================================
// Agents
// ============================================================================

/// A person agent (`agents/people`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub uri: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub published: bool,
    #[serde(default, deserialize_with = "null_default", alias = "isLinkedToPublishedRecord")]
    pub is_linked_to_published_record: bool,
    #[serde(default, deserialize_with = "null_default", alias = "displayName")]
    pub display_name: DisplayName,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayName {
    #[serde(default, deserialize_with = "null_default", alias = "text")]
    pub sort_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_of_name: Option<String>,
    #[serde(default, deserialize_with = "null_default", alias = "isDisplayName")]
    pub is_display_name: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub authorized: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Agent {
    pub fn name(&self) -> &str {
        if self.display_name.sort_name.is_empty() {
            &self.title
        } else {
            &self.display_name.sort_name
        }
    }
}

// ============================================================================
// Accessions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accession {
    pub uri: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_0: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_3: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub publish: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub suppressed: bool,
    #[serde(default, deserialize_with = "null_default", alias = "restrictionsApply")]
    pub restrictions_apply: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub subjects: Vec<Ref>,
    #[serde(default, deserialize_with = "null_default")]
    pub linked_agents: Vec<AgentLink>,
    #[serde(default, deserialize_with = "null_default")]
    pub instances: Vec<Instance>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An agent linked to an accession, with the role it plays there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLink {
    #[serde(rename = "ref")]
    pub uri: String,
    #[serde(default, deserialize_with = "null_default")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relator: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default, deserialize_with = "null_default")]
    pub instance_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digital_object: Option<Ref>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Accession {
    /// The four-part accession identifier, empty parts dropped.
    pub fn identifier(&self) -> String {
        [&self.id_0, &self.id_1, &self.id_2, &self.id_3]
            .into_iter()
            .flatten()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl Record for Subject {
    fn uri(&self) -> &str {
        &self.uri
    }
}

impl Record for DigitalObject {
    fn uri(&self) -> &str {
        &self.uri
    }
}

impl Record for Agent {
    fn uri(&self) -> &str {
        &self.uri
    }
}

impl Record for Accession {
    fn uri(&self) -> &str {
        &self.uri
    }
}
