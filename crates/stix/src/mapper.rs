use std::collections::HashSet;

use orkl_primitives::{LibraryEntry, ReportSource, ThreatActorRecord};
use thiserror::Error;

use crate::objects::{
    ExternalReference, Identity, Object, Relationship, Report, ThreatActor, Tool,
};

pub const DEFAULT_AUTHOR: &str = "ORKL";

/// Knobs of the one report-to-graph conversion. Everything that used to
/// vary between deployments is an explicit flag here rather than a code
/// variant.
#[derive(Clone, Copy, Debug)]
pub struct MapperConfig {
    /// Cap on `uses` relationships emitted per threat actor.
    pub max_tool_relationships: usize,
    /// Score stamped on identities and threat actors.
    pub default_score: u8,
    /// Confidence stamped on report objects.
    pub report_confidence: u8,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_tool_relationships: 10,
            default_score: 50,
            report_confidence: 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("report {id} carries no report names")]
    MissingReportName { id: String },
}

/// Converts one library entry into the graph objects submitted to the
/// platform.
#[derive(Clone, Debug)]
pub struct ReportMapper {
    config: MapperConfig,
    author: Identity,
}

impl ReportMapper {
    #[must_use]
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            author: Identity::organization(DEFAULT_AUTHOR),
        }
    }

    #[must_use]
    pub fn author(&self) -> &Identity {
        &self.author
    }

    pub fn map(&self, report: &LibraryEntry) -> Result<Vec<Object>, MapError> {
        let report_name = report
            .report_names
            .first()
            .and_then(|name| name.split('.').next())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| MapError::MissingReportName {
                id: report.id.clone(),
            })?;

        let mut tools = Vec::new();
        let mut actors = Vec::new();
        let mut relationships = Vec::new();
        let mut actor_sources = Vec::new();

        for actor in &report.threat_actors {
            let actor_tools: Vec<Tool> = actor.tools.iter().map(|tool| self.tool(tool)).collect();

            let source = self.actor_source(&actor.source_name);
            let actor_object = self.threat_actor(actor, &source);

            for tool in actor_tools.iter().take(self.config.max_tool_relationships) {
                relationships.push(self.relationship("uses", &actor_object.id, &tool.id));
            }

            tools.extend(actor_tools);
            actor_sources.push(source);
            actors.push(actor_object);
        }

        let primary_source = report
            .sources
            .first()
            .and_then(|source| source.name.as_deref())
            .map_or_else(|| DEFAULT_AUTHOR.to_owned(), |name| short_source_name(name).to_owned());

        let mut external_references = Vec::new();

        if let Some(files) = &report.files {
            for (rendition, url) in [
                ("PDF", files.pdf.as_deref()),
                ("TEXT", files.text.as_deref()),
                ("IMAGE", files.img.as_deref()),
            ] {
                if let Some(url) = url {
                    external_references.push(ExternalReference {
                        source_name: format!("{primary_source} Report {rendition}"),
                        url: url.to_owned(),
                    });
                }
            }
        }

        if let Some(reference) = report.references.first() {
            external_references.push(ExternalReference {
                source_name: format!("{primary_source} Report source"),
                url: reference.clone(),
            });
        }

        let report_source = report
            .sources
            .first()
            .and_then(|source| self.report_source(source));

        let created_by = report_source
            .as_ref()
            .map_or_else(|| self.author.id.clone(), |source| source.id.clone());

        let mut object_refs: Vec<String> = Vec::new();
        object_refs.extend(tools.iter().map(|tool| tool.id.clone()));
        object_refs.extend(actors.iter().map(|actor| actor.id.clone()));
        object_refs.extend(relationships.iter().map(|rel| rel.id.clone()));

        let mut report_object = Report::new(report_name, report.created_at);
        report_object.description = report.plain_text.clone();
        report_object.created = report.file_creation_date;
        report_object.modified = report.file_modification_date;
        report_object.created_by_ref = Some(created_by);
        report_object.object_refs = object_refs;
        report_object.external_references = external_references;
        report_object.labels = vec!["orkl-threat-report".to_owned()];
        report_object.confidence = self.config.report_confidence;

        let mut result: Vec<Object> = Vec::new();
        result.push(self.author.clone().into());
        result.extend(tools.into_iter().map(Object::from));
        result.extend(actors.into_iter().map(Object::from));
        result.extend(relationships.into_iter().map(Object::from));
        result.extend(actor_sources.into_iter().map(Object::from));
        result.extend(report_source.into_iter().map(Object::from));
        result.push(report_object.into());

        // Deterministic ids make repeats exact duplicates, so keep only the
        // first occurrence of each id.
        let mut seen = HashSet::new();
        result.retain(|object| seen.insert(object.id().to_owned()));

        Ok(result)
    }

    fn tool(&self, name: &str) -> Tool {
        let mut tool = Tool::new(name);
        tool.labels = vec!["orkl-threat-actor-tool".to_owned()];

        tool
    }

    fn actor_source(&self, source_name: &str) -> Identity {
        let short = short_source_name(source_name);

        if short.is_empty() {
            return self.author.clone();
        }

        let mut identity = Identity::organization(short);
        identity.created_by_ref = Some(self.author.id.clone());

        identity
    }

    fn threat_actor(&self, record: &ThreatActorRecord, source: &Identity) -> ThreatActor {
        let mut actor = ThreatActor::new(&record.main_name);
        actor.created = record.created_at;
        actor.modified = record.updated_at;
        actor.labels = vec!["orkl-threat-actor".to_owned()];
        actor.created_by_ref = Some(source.id.clone());
        actor.score = Some(self.config.default_score);
        actor.aliases = record.aliases.clone();

        actor
    }

    fn report_source(&self, source: &ReportSource) -> Option<Identity> {
        let name = source.name.as_deref()?;
        let short = short_source_name(name);

        if short.is_empty() {
            return None;
        }

        let mut identity = Identity::organization(short);
        identity.description = source.description.clone();
        identity.created_by_ref = Some(self.author.id.clone());
        identity.labels = vec!["orkl-report-source".to_owned()];
        identity.score = Some(self.config.default_score);

        Some(identity)
    }

    fn relationship(&self, relationship_type: &str, source_ref: &str, target_ref: &str) -> Relationship {
        let mut relationship = Relationship::new(relationship_type, source_ref, target_ref);
        relationship.created_by_ref = Some(self.author.id.clone());

        relationship
    }
}

impl Default for ReportMapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

/// Source names sometimes embed a qualifier after a colon; only the part
/// before it names the organization.
fn short_source_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((short, _)) => short.trim(),
        None => name.trim(),
    }
}

#[cfg(test)]
mod tests {
    use orkl_primitives::{LibraryEntry, ReportFiles, ReportSource, ThreatActorRecord};

    use super::{MapperConfig, ReportMapper};
    use crate::objects::Object;

    fn sample_report() -> LibraryEntry {
        LibraryEntry {
            id: "entry-1".to_owned(),
            plain_text: Some("summary".to_owned()),
            report_names: vec!["apt_campaign.pdf".to_owned()],
            sources: vec![ReportSource {
                id: "src-1".to_owned(),
                name: Some("Mandiant: Threat Research".to_owned()),
                description: Some("vendor".to_owned()),
            }],
            references: vec!["https://example.com/report".to_owned()],
            threat_actors: vec![ThreatActorRecord {
                id: "ta-1".to_owned(),
                main_name: "APT99".to_owned(),
                aliases: vec!["NinetyNine".to_owned()],
                source_name: "Mandiant: Threat Research".to_owned(),
                tools: vec!["Mimikatz".to_owned(), "Cobalt Strike".to_owned()],
                ..ThreatActorRecord::default()
            }],
            files: Some(ReportFiles {
                pdf: Some("https://example.com/report.pdf".to_owned()),
                text: None,
                img: None,
            }),
            ..LibraryEntry::default()
        }
    }

    fn find_report(objects: &[Object]) -> &crate::objects::Report {
        objects
            .iter()
            .find_map(|object| match object {
                Object::Report(report) => Some(report),
                _ => None,
            })
            .expect("mapper output must contain a report")
    }

    #[test]
    fn mapping_is_deterministic() {
        let mapper = ReportMapper::default();
        let report = sample_report();

        let first = serde_json::to_value(mapper.map(&report).unwrap()).unwrap();
        let second = serde_json::to_value(mapper.map(&report).unwrap()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn report_name_strips_file_extension() {
        let mapper = ReportMapper::default();

        let objects = mapper.map(&sample_report()).unwrap();
        let report = find_report(&objects);

        assert_eq!(report.name, "apt_campaign");
        assert_eq!(report.confidence, 60);
    }

    #[test]
    fn missing_report_names_is_an_error() {
        let mapper = ReportMapper::default();

        let mut report = sample_report();
        report.report_names.clear();

        assert!(mapper.map(&report).is_err());
    }

    #[test]
    fn duplicate_identities_collapse() {
        let mapper = ReportMapper::default();

        // Actor source and report source share a name, so after dedup the
        // identity appears exactly once.
        let objects = mapper.map(&sample_report()).unwrap();

        let mandiant_identities = objects
            .iter()
            .filter(|object| {
                matches!(object, Object::Identity(identity) if identity.name == "Mandiant")
            })
            .count();

        assert_eq!(mandiant_identities, 1);
    }

    #[test]
    fn tool_relationships_are_capped() {
        let config = MapperConfig {
            max_tool_relationships: 1,
            ..MapperConfig::default()
        };
        let mapper = ReportMapper::new(config);

        let objects = mapper.map(&sample_report()).unwrap();

        let tools = objects
            .iter()
            .filter(|object| matches!(object, Object::Tool(_)))
            .count();
        let relationships = objects
            .iter()
            .filter(|object| matches!(object, Object::Relationship(_)))
            .count();

        assert_eq!(tools, 2);
        assert_eq!(relationships, 1);
    }

    #[test]
    fn source_name_qualifier_is_dropped() {
        let mapper = ReportMapper::default();

        let objects = mapper.map(&sample_report()).unwrap();
        let report = find_report(&objects);

        assert!(report
            .external_references
            .iter()
            .all(|reference| reference.source_name.starts_with("Mandiant ")));
    }

    #[test]
    fn sourceless_report_is_created_by_the_author() {
        let mapper = ReportMapper::default();

        let mut entry = sample_report();
        entry.sources.clear();
        entry.threat_actors.clear();

        let objects = mapper.map(&entry).unwrap();
        let report = find_report(&objects);

        assert_eq!(report.created_by_ref.as_deref(), Some(mapper.author().id.as_str()));
    }
}
