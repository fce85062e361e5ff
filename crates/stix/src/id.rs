//! Deterministic STIX identifiers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::{uuid, Uuid};

/// Namespace shared with the platform's own id generation, so objects
/// resubmitted across runs collide with their earlier selves instead of
/// duplicating.
const IDENTIFIER_NAMESPACE: Uuid = uuid!("00abedb4-aa42-466c-9c01-fed23315a9b7");

pub fn identity_id(name: &str, identity_class: &str) -> String {
    deterministic(
        "identity",
        &[
            ("name", Value::from(canonical(name))),
            ("identity_class", Value::from(identity_class.to_lowercase())),
        ],
    )
}

pub fn tool_id(name: &str) -> String {
    deterministic("tool", &[("name", Value::from(canonical(name)))])
}

pub fn threat_actor_id(name: &str) -> String {
    deterministic("threat-actor", &[("name", Value::from(canonical(name)))])
}

pub fn report_id(name: &str, published: Option<DateTime<Utc>>) -> String {
    let mut properties = vec![("name", Value::from(canonical(name)))];

    if let Some(published) = published {
        properties.push(("published", Value::from(published.to_rfc3339())));
    }

    deterministic("report", &properties)
}

pub fn relationship_id(relationship_type: &str, source_ref: &str, target_ref: &str) -> String {
    deterministic(
        "relationship",
        &[
            ("relationship_type", Value::from(relationship_type)),
            ("source_ref", Value::from(source_ref)),
            ("target_ref", Value::from(target_ref)),
        ],
    )
}

pub fn bundle_id() -> String {
    format!("bundle--{}", Uuid::new_v4())
}

fn canonical(name: &str) -> String {
    name.trim().to_lowercase()
}

fn deterministic(prefix: &str, properties: &[(&str, Value)]) -> String {
    // Sorted keys give a canonical serialization of the identifying
    // properties.
    let sorted: BTreeMap<&str, &Value> = properties.iter().map(|(k, v)| (*k, v)).collect();

    let canonical =
        serde_json::to_string(&sorted).expect("serializing identifying properties cannot fail");

    format!(
        "{prefix}--{}",
        Uuid::new_v5(&IDENTIFIER_NAMESPACE, canonical.as_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::{identity_id, relationship_id, report_id, threat_actor_id};

    #[test]
    fn ids_are_deterministic() {
        assert_eq!(identity_id("ORKL", "organization"), identity_id("ORKL", "organization"));
        assert_eq!(
            report_id("Lazarus Activity", None),
            report_id("Lazarus Activity", None)
        );
    }

    #[test]
    fn name_is_canonicalized() {
        assert_eq!(identity_id(" Mandiant ", "organization"), identity_id("mandiant", "Organization"));
    }

    #[test]
    fn distinct_inputs_give_distinct_ids() {
        assert_ne!(threat_actor_id("APT1"), threat_actor_id("APT2"));
        assert_ne!(
            relationship_id("uses", "a", "b"),
            relationship_id("uses", "b", "a")
        );
    }

    #[test]
    fn prefix_matches_object_type() {
        assert!(identity_id("ORKL", "organization").starts_with("identity--"));
        assert!(threat_actor_id("APT1").starts_with("threat-actor--"));
    }
}
