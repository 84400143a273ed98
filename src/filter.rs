//! Publication rules: which records get a public page.

use crate::types::{Accession, Agent};

/// An accession is public when published, not suppressed, and unrestricted.
pub fn accession_is_public(accession: &Accession) -> bool {
    accession.publish && !accession.suppressed && !accession.restrictions_apply
}

/// A person is public when published, linked to a published record, and
/// carrying an authorized display name.
///
/// Which agent restrictions matter is still an open question with the
/// archive; this is the rule in use, not a settled one.
pub fn agent_is_public(agent: &Agent) -> bool {
    agent.published
        && agent.is_linked_to_published_record
        && agent.display_name.is_display_name
        && agent.display_name.authorized
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn accession(publish: bool, suppressed: bool, restrictions_apply: bool) -> Accession {
        serde_json::from_value(json!({
            "uri": "/repositories/2/accessions/1",
            "publish": publish,
            "suppressed": suppressed,
            "restrictions_apply": restrictions_apply,
        }))
        .unwrap()
    }

    fn agent(published: bool, linked: bool, is_display_name: bool, authorized: bool) -> Agent {
        serde_json::from_value(json!({
            "uri": "/agents/people/1",
            "published": published,
            "is_linked_to_published_record": linked,
            "display_name": {"is_display_name": is_display_name, "authorized": authorized},
        }))
        .unwrap()
    }

    #[test]
    fn accession_rule_matches_truth_table() {
        for publish in [false, true] {
            for suppressed in [false, true] {
                for restricted in [false, true] {
                    let expected = publish && !suppressed && !restricted;
                    assert_eq!(
                        accession_is_public(&accession(publish, suppressed, restricted)),
                        expected,
                        "publish={publish} suppressed={suppressed} restricted={restricted}"
                    );
                }
            }
        }
    }

    #[test]
    fn agent_rule_requires_all_four_flags() {
        assert!(agent_is_public(&agent(true, true, true, true)));
        assert!(!agent_is_public(&agent(false, true, true, true)));
        assert!(!agent_is_public(&agent(true, false, true, true)));
        assert!(!agent_is_public(&agent(true, true, false, true)));
        assert!(!agent_is_public(&agent(true, true, true, false)));
    }

    #[test]
    fn agent_without_display_name_is_not_public() {
        let a: Agent = serde_json::from_value(json!({
            "uri": "/agents/people/1", "published": true, "is_linked_to_published_record": true,
        }))
        .unwrap();
        assert!(!agent_is_public(&a));
    }
}
