//! Reference resolution: accession → normalized view.
//!
//! An accession points at subjects, agents, and digital objects by URI.
//! [`normalize_view`] swaps each of those references for the referenced
//! record, producing an [`AccessionView`] that templates can render without
//! further lookups.
//!
//! Resolution is best-effort. A reference with no match in the lookups is kept
//! as [`Resolved::Unresolved`] rather than failing, and the distinction is
//! visible in the emitted JSON:
//!
//! ```json
//! {"status": "resolved",   "ref": "/subjects/1",  "record": {"uri": "/subjects/1", ...}}
//! {"status": "unresolved", "ref": "/subjects/99"}
//! ```

use crate::load::{AgentList, DigitalObjectMap, Lookups, SubjectMap};
use crate::types::{Accession, Agent, DigitalObject, Record, Subject};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of looking up one reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolved<T> {
    Resolved {
        #[serde(rename = "ref")]
        uri: String,
        record: T,
    },
    Unresolved {
        #[serde(rename = "ref")]
        uri: String,
    },
}

impl<T> Resolved<T> {
    fn lookup(uri: &str, found: Option<&T>) -> Self
    where
        T: Clone,
    {
        match found {
            Some(record) => Resolved::Resolved {
                uri: uri.to_string(),
                record: record.clone(),
            },
            None => Resolved::Unresolved {
                uri: uri.to_string(),
            },
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            Resolved::Resolved { uri, .. } | Resolved::Unresolved { uri } => uri,
        }
    }

    pub fn record(&self) -> Option<&T> {
        match self {
            Resolved::Resolved { record, .. } => Some(record),
            Resolved::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolved::Resolved { .. })
    }
}

/// An accession with its references expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessionView {
    pub uri: String,
    pub title: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_0: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_3: Option<String>,
    pub publish: bool,
    pub suppressed: bool,
    pub restrictions_apply: bool,
    pub subjects: Vec<Resolved<Subject>>,
    pub linked_agents: Vec<AgentLinkView>,
    pub instances: Vec<InstanceView>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLinkView {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relator: Option<String>,
    pub agent: Resolved<Agent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceView {
    pub instance_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digital_object: Option<Resolved<DigitalObject>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for AccessionView {
    fn uri(&self) -> &str {
        &self.uri
    }
}

impl AccessionView {
    /// Number of references that found no match.
    pub fn unresolved_count(&self) -> usize {
        let subjects = self.subjects.iter().filter(|s| !s.is_resolved()).count();
        let agents = self
            .linked_agents
            .iter()
            .filter(|l| !l.agent.is_resolved())
            .count();
        let objects = self
            .instances
            .iter()
            .filter_map(|i| i.digital_object.as_ref())
            .filter(|d| !d.is_resolved())
            .count();
        subjects + agents + objects
    }
}

/// Build the normalized view of an accession.
///
/// Agents are matched by scanning the list in order; subjects and digital
/// objects by map lookup. The accession itself is not modified.
pub fn normalize_view(
    accession: &Accession,
    agents: &AgentList,
    subjects: &SubjectMap,
    digital_objects: &DigitalObjectMap,
) -> AccessionView {
    let subject_views = accession
        .subjects
        .iter()
        .map(|r| Resolved::lookup(&r.uri, subjects.get(&r.uri)))
        .collect();

    let agent_views = accession
        .linked_agents
        .iter()
        .map(|link| AgentLinkView {
            role: link.role.clone(),
            relator: link.relator.clone(),
            agent: Resolved::lookup(&link.uri, agents.find(&link.uri)),
            extra: link.extra.clone(),
        })
        .collect();

    let instance_views = accession
        .instances
        .iter()
        .map(|instance| InstanceView {
            instance_type: instance.instance_type.clone(),
            digital_object: instance
                .digital_object
                .as_ref()
                .map(|r| Resolved::lookup(&r.uri, digital_objects.get(&r.uri))),
            extra: instance.extra.clone(),
        })
        .collect();

    AccessionView {
        uri: accession.uri.clone(),
        title: accession.title.clone(),
        identifier: accession.identifier(),
        id_0: accession.id_0.clone(),
        id_1: accession.id_1.clone(),
        id_2: accession.id_2.clone(),
        id_3: accession.id_3.clone(),
        publish: accession.publish,
        suppressed: accession.suppressed,
        restrictions_apply: accession.restrictions_apply,
        subjects: subject_views,
        linked_agents: agent_views,
        instances: instance_views,
        extra: accession.extra.clone(),
    }
}

/// [`normalize_view`] against a full set of lookups.
pub fn normalize_with(accession: &Accession, lookups: &Lookups) -> AccessionView {
    normalize_view(
        accession,
        &lookups.agents,
        &lookups.subjects,
        &lookups.digital_objects,
    )
}
