//! A model paired with its current layout. Every committed change bumps the
//! revision and lays the whole graph out again.

use crate::error::Result;
use crate::graph_layout::{GraphLayout, LayoutOptions};
use crate::graph_model::GraphModel;
use crate::types::{Person, Relationship, RelationshipKind, RelationshipPatch};

pub const DEFAULT_CONNECT_KIND: RelationshipKind = RelationshipKind::ParentChild;

#[derive(Debug, Clone)]
pub struct Session {
    model: GraphModel,
    options: LayoutOptions,
    layout: GraphLayout,
    revision: u64,
}

impl Session {
    pub fn new(options: LayoutOptions) -> Self {
        Self::from_model(GraphModel::new(), options)
    }

    pub fn from_model(model: GraphModel, options: LayoutOptions) -> Self {
        let layout = model.compute_layout(&options);
        Self {
            model,
            options,
            layout,
            revision: 0,
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn layout(&self) -> &GraphLayout {
        &self.layout
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_options(&mut self, options: LayoutOptions) {
        self.options = options;
        self.relayout();
    }

    pub fn add_person(&mut self, person: Person) -> Result<String> {
        let result = self.model.add_person(person);
        self.commit(result)
    }

    /// Unknown ids change nothing and leave the revision alone.
    pub fn delete_person(&mut self, id: &str) -> bool {
        let removed = self.model.delete_person(id);
        if removed {
            self.bump();
        }
        removed
    }

    pub fn add_relationship(&mut self, rel: Relationship) -> Result<String> {
        let result = self.model.add_relationship(rel);
        self.commit(result)
    }

    pub fn update_relationship(&mut self, id: &str, patch: RelationshipPatch) -> Result<()> {
        let result = self.model.update_relationship(id, patch);
        self.commit(result)
    }

    pub fn delete_relationship(&mut self, id: &str) -> Result<Relationship> {
        let result = self.model.delete_relationship(id);
        self.commit(result)
    }

    pub fn delete_relationship_at(&mut self, index: usize) -> Result<Relationship> {
        let result = self.model.delete_relationship_at(index);
        self.commit(result)
    }

    pub fn replace_all(&mut self, persons: Vec<Person>, relationships: Vec<Relationship>) {
        self.model.replace_all(persons, relationships);
        self.bump();
    }

    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let result = self.model.import_json(text);
        self.commit(result)
    }

    /// Drag-to-connect gesture. The caller picks the kind; the connect
    /// dialog offers [`DEFAULT_CONNECT_KIND`] first.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        kind: RelationshipKind,
        source_handle: Option<String>,
        target_handle: Option<String>,
    ) -> Result<String> {
        let rel = Relationship::new(source, target, kind).with_handles(source_handle, target_handle);
        self.add_relationship(rel)
    }

    /// Move an existing edge onto new endpoints, keeping its type.
    pub fn reconnect(
        &mut self,
        id: &str,
        source: &str,
        target: &str,
        source_handle: Option<String>,
        target_handle: Option<String>,
    ) -> Result<()> {
        let patch = RelationshipPatch {
            from: Some(source.to_string()),
            to: Some(target.to_string()),
            kind: None,
            source_handle,
            target_handle,
        };
        self.update_relationship(id, patch)
    }

    fn commit<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_ok() {
            self.bump();
        }
        result
    }

    fn bump(&mut self) {
        self.revision += 1;
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = self.model.compute_layout(&self.options);
    }
}
