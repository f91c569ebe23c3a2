use log::{debug, info};
use uuid::Uuid;

use crate::error::{GenogramError, Result, ValidationError};
use crate::graph_layout::{self, EdgeSpec, GraphLayout, LayoutOptions, NodeSpec};
use crate::parser::derive_year;
use crate::snapshot;
use crate::types::{Person, Relationship, RelationshipPatch, Snapshot};
use crate::validator;

pub const DEFAULT_SOURCE_HANDLE: &str = "right";
pub const DEFAULT_TARGET_HANDLE: &str = "left";

/// Members and relationships of one genogram. Every mutation validates first
/// and leaves the model untouched when it fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphModel {
    persons: Vec<Person>,
    relationships: Vec<Relationship>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(persons: Vec<Person>, relationships: Vec<Relationship>) -> Self {
        Self {
            persons,
            relationships,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot = snapshot::parse(text)?;
        Ok(Self::from_parts(snapshot.members, snapshot.relationships))
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.id == id)
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.relationships.is_empty()
    }

    /// Add a member and return its id. A blank id is replaced by a fresh one.
    pub fn add_person(&mut self, mut person: Person) -> Result<String> {
        if person.name.trim().is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        if person.id.is_empty() {
            person.id = fresh_id(|id| self.person(id).is_some());
        } else if self.person(&person.id).is_some() {
            return Err(ValidationError::DuplicateMemberId(person.id).into());
        }
        if person.birth_year.is_none() {
            person.birth_year = person.birth_date.as_deref().and_then(derive_year);
        }

        debug!("added member {} ({})", person.id, person.name);
        let id = person.id.clone();
        self.persons.push(person);
        Ok(id)
    }

    /// Remove a member and every relationship touching it. Returns `false`
    /// when no member has that id.
    pub fn delete_person(&mut self, id: &str) -> bool {
        let before = self.persons.len();
        self.persons.retain(|p| p.id != id);
        if self.persons.len() == before {
            return false;
        }

        let before = self.relationships.len();
        self.relationships.retain(|r| !r.touches(id));
        debug!(
            "deleted member {id} and {} relationship(s)",
            before - self.relationships.len()
        );
        true
    }

    /// Validate and append a relationship, returning its id. Missing handles
    /// default to right/left.
    pub fn add_relationship(&mut self, mut rel: Relationship) -> Result<String> {
        validator::validate(&self.relationships, &rel, None)?;
        validator::check_endpoints(&self.persons, &rel)?;
        if rel.id.is_empty() {
            rel.id = fresh_id(|id| self.relationship(id).is_some());
        } else if self.relationship(&rel.id).is_some() {
            return Err(ValidationError::DuplicateRelationshipId(rel.id).into());
        }
        rel.source_handle
            .get_or_insert_with(|| DEFAULT_SOURCE_HANDLE.to_string());
        rel.target_handle
            .get_or_insert_with(|| DEFAULT_TARGET_HANDLE.to_string());

        debug!("added {} relationship {} ({} -> {})", rel.kind, rel.id, rel.from, rel.to);
        let id = rel.id.clone();
        self.relationships.push(rel);
        Ok(id)
    }

    /// Overlay `patch` on relationship `id` and re-validate the result,
    /// ignoring the record itself in the duplicate check.
    pub fn update_relationship(&mut self, id: &str, patch: RelationshipPatch) -> Result<()> {
        let index = self.relationship_index(id)?;
        let updated = patch.apply_to(&self.relationships[index]);
        validator::validate(&self.relationships, &updated, Some(id))?;
        validator::check_endpoints(&self.persons, &updated)?;

        debug!("updated relationship {id}");
        self.relationships[index] = updated;
        Ok(())
    }

    pub fn delete_relationship(&mut self, id: &str) -> Result<Relationship> {
        let index = self.relationship_index(id)?;
        debug!("deleted relationship {id}");
        Ok(self.relationships.remove(index))
    }

    /// Id of the relationship shown at table row `index`.
    pub fn relationship_id_at(&self, index: usize) -> Result<&str> {
        self.relationships
            .get(index)
            .map(|r| r.id.as_str())
            .ok_or(GenogramError::RowOutOfRange(index))
    }

    /// Row deletion resolves the row to an id first, then deletes by id.
    pub fn delete_relationship_at(&mut self, index: usize) -> Result<Relationship> {
        let id = self.relationship_id_at(index)?.to_string();
        self.delete_relationship(&id)
    }

    /// Bulk replacement used by import; entries are taken as they are.
    pub fn replace_all(&mut self, persons: Vec<Person>, relationships: Vec<Relationship>) {
        info!(
            "loaded {} member(s) and {} relationship(s)",
            persons.len(),
            relationships.len()
        );
        self.persons = persons;
        self.relationships = relationships;
    }

    /// Parse `text` and replace the whole model. On a parse error nothing
    /// changes.
    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let snapshot = snapshot::parse(text)?;
        self.replace_all(snapshot.members, snapshot.relationships);
        Ok(())
    }

    pub fn export_snapshot(&self) -> Snapshot {
        snapshot::export(&self.persons, &self.relationships)
    }

    pub fn export_json(&self) -> Result<String> {
        snapshot::to_json(&self.export_snapshot())
    }

    pub fn node_specs(&self, options: &LayoutOptions) -> Vec<NodeSpec> {
        self.persons
            .iter()
            .map(|p| NodeSpec::from_person(p, options))
            .collect()
    }

    pub fn edge_specs(&self) -> Vec<EdgeSpec> {
        self.relationships
            .iter()
            .enumerate()
            .map(|(i, r)| EdgeSpec::from_relationship(r, i))
            .collect()
    }

    pub fn compute_layout(&self, options: &LayoutOptions) -> GraphLayout {
        graph_layout::compute_layout(&self.node_specs(options), &self.edge_specs(), options)
    }

    fn relationship_index(&self, id: &str) -> Result<usize> {
        self.relationships
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| GenogramError::RelationshipNotFound(id.to_string()))
    }
}

fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !taken(&id) {
            return id;
        }
    }
}
