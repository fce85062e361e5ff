use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::id;

const SPEC_VERSION: &str = "2.1";

#[derive(Clone, Debug, Serialize)]
pub struct ExternalReference {
    pub source_name: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Identity {
    #[serde(rename = "type")]
    pub object_type: &'static str,
    pub spec_version: &'static str,
    pub id: String,
    pub name: String,
    pub identity_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_ref: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(rename = "x_opencti_score", skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
}

impl Identity {
    #[must_use]
    pub fn organization(name: &str) -> Self {
        Self {
            object_type: "identity",
            spec_version: SPEC_VERSION,
            id: id::identity_id(name, "organization"),
            name: name.to_owned(),
            identity_class: "organization".to_owned(),
            description: None,
            created_by_ref: None,
            labels: Vec::new(),
            score: None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub object_type: &'static str,
    pub spec_version: &'static str,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl Tool {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            object_type: "tool",
            spec_version: SPEC_VERSION,
            id: id::tool_id(name),
            name: name.to_owned(),
            labels: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ThreatActor {
    #[serde(rename = "type")]
    pub object_type: &'static str,
    pub spec_version: &'static str,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_ref: Option<String>,
    #[serde(rename = "x_opencti_score", skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(rename = "x_opencti_aliases", skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ThreatActor {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            object_type: "threat-actor",
            spec_version: SPEC_VERSION,
            id: id::threat_actor_id(name),
            name: name.to_owned(),
            description: None,
            created: None,
            modified: None,
            labels: Vec::new(),
            created_by_ref: None,
            score: None,
            aliases: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Report {
    #[serde(rename = "type")]
    pub object_type: &'static str,
    pub spec_version: &'static str,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_ref: Option<String>,
    pub report_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_marking_refs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_refs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_references: Vec<ExternalReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub confidence: u8,
    #[serde(rename = "x_opencti_report_status")]
    pub report_status: u8,
}

impl Report {
    #[must_use]
    pub fn new(name: &str, published: Option<DateTime<Utc>>) -> Self {
        Self {
            object_type: "report",
            spec_version: SPEC_VERSION,
            id: id::report_id(name, published),
            name: name.to_owned(),
            description: None,
            published,
            created: None,
            modified: None,
            created_by_ref: None,
            report_types: vec!["orkl-report".to_owned()],
            object_marking_refs: Vec::new(),
            object_refs: Vec::new(),
            external_references: Vec::new(),
            labels: Vec::new(),
            confidence: 0,
            report_status: 2,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub object_type: &'static str,
    pub spec_version: &'static str,
    pub id: String,
    pub relationship_type: String,
    pub source_ref: String,
    pub target_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_ref: Option<String>,
}

impl Relationship {
    #[must_use]
    pub fn new(relationship_type: &str, source_ref: &str, target_ref: &str) -> Self {
        Self {
            object_type: "relationship",
            spec_version: SPEC_VERSION,
            id: id::relationship_id(relationship_type, source_ref, target_ref),
            relationship_type: relationship_type.to_owned(),
            source_ref: source_ref.to_owned(),
            target_ref: target_ref.to_owned(),
            created_by_ref: None,
        }
    }
}

/// Any graph object the mapper can emit.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Object {
    Identity(Identity),
    Tool(Tool),
    ThreatActor(ThreatActor),
    Report(Report),
    Relationship(Relationship),
}

impl Object {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Identity(object) => &object.id,
            Self::Tool(object) => &object.id,
            Self::ThreatActor(object) => &object.id,
            Self::Report(object) => &object.id,
            Self::Relationship(object) => &object.id,
        }
    }

    #[must_use]
    pub fn object_type(&self) -> &'static str {
        match self {
            Self::Identity(object) => object.object_type,
            Self::Tool(object) => object.object_type,
            Self::ThreatActor(object) => object.object_type,
            Self::Report(object) => object.object_type,
            Self::Relationship(object) => object.object_type,
        }
    }
}

impl From<Identity> for Object {
    fn from(object: Identity) -> Self {
        Self::Identity(object)
    }
}

impl From<Tool> for Object {
    fn from(object: Tool) -> Self {
        Self::Tool(object)
    }
}

impl From<ThreatActor> for Object {
    fn from(object: ThreatActor) -> Self {
        Self::ThreatActor(object)
    }
}

impl From<Report> for Object {
    fn from(object: Report) -> Self {
        Self::Report(object)
    }
}

impl From<Relationship> for Object {
    fn from(object: Relationship) -> Self {
        Self::Relationship(object)
    }
}

/// Submission unit: a set of graph objects under a fresh bundle id.
#[derive(Clone, Debug, Serialize)]
pub struct Bundle {
    #[serde(rename = "type")]
    pub object_type: &'static str,
    pub id: String,
    pub objects: Vec<Object>,
}

impl Bundle {
    #[must_use]
    pub fn new(objects: Vec<Object>) -> Self {
        Self {
            object_type: "bundle",
            id: id::bundle_id(),
            objects,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
