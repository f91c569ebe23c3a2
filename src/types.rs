//! Members, relationships and the JSON exchange shape.
//!
//! Deserialization is deliberately forgiving: hand-written genograms often
//! use numeric ids, `null` for unset fields, or a list of medical conditions
//! instead of a single text.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::parser::derive_year;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MedicalConditions {
    Text(String),
    List(Vec<String>),
}

impl MedicalConditions {
    pub fn is_empty(&self) -> bool {
        match self {
            MedicalConditions::Text(text) => text.trim().is_empty(),
            MedicalConditions::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }

    /// One-line form used for node labels.
    pub fn summary(&self) -> String {
        match self {
            MedicalConditions::Text(text) => text.trim().to_string(),
            MedicalConditions::List(items) => items
                .iter()
                .map(|i| i.trim())
                .filter(|i| !i.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_gender")]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub birth_year: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub deceased: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub death_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub death_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_conditions")]
    pub medical_conditions: Option<MedicalConditions>,
}

impl Person {
    /// A member without an id; one is assigned when it is added to a model.
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            name: name.into(),
            gender,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_birth_date(mut self, date: impl Into<String>) -> Self {
        self.birth_date = Some(date.into());
        self
    }

    pub fn with_death_date(mut self, date: impl Into<String>) -> Self {
        self.deceased = true;
        self.death_date = Some(date.into());
        self
    }

    pub fn with_conditions(mut self, conditions: MedicalConditions) -> Self {
        self.medical_conditions = Some(conditions);
        self
    }

    /// Stored birth year, else the year of the birth date.
    pub fn effective_birth_year(&self) -> Option<String> {
        self.birth_year
            .clone()
            .or_else(|| self.birth_date.as_deref().and_then(derive_year))
    }

    /// Only meaningful for deceased members.
    pub fn effective_death_year(&self) -> Option<String> {
        if !self.deceased {
            return None;
        }
        self.death_year
            .clone()
            .or_else(|| self.death_date.as_deref().and_then(derive_year))
    }

    /// `1950-2010`, `1950`, or `-2010` when only the death year is known.
    pub fn years_label(&self) -> Option<String> {
        match (self.effective_birth_year(), self.effective_death_year()) {
            (None, None) => None,
            (Some(birth), None) => Some(birth),
            (birth, Some(death)) => Some(format!("{}-{death}", birth.unwrap_or_default())),
        }
    }

    pub fn conditions_summary(&self) -> Option<String> {
        self.medical_conditions
            .as_ref()
            .filter(|c| !c.is_empty())
            .map(MedicalConditions::summary)
    }
}

/// Relationship type. Unrecognised type strings survive as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipKind {
    ParentChild,
    Married,
    Divorced,
    Siblings,
    Other(String),
}

impl RelationshipKind {
    pub fn as_str(&self) -> &str {
        match self {
            RelationshipKind::ParentChild => "parent-child",
            RelationshipKind::Married => "married",
            RelationshipKind::Divorced => "divorced",
            RelationshipKind::Siblings => "siblings",
            RelationshipKind::Other(s) => s,
        }
    }

    /// Parent-child is the only kind that spans generations.
    pub fn is_cross_rank(&self) -> bool {
        matches!(self, RelationshipKind::ParentChild)
    }
}

impl From<String> for RelationshipKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "parent-child" => RelationshipKind::ParentChild,
            "married" => RelationshipKind::Married,
            "divorced" => RelationshipKind::Divorced,
            "siblings" => RelationshipKind::Siblings,
            _ => RelationshipKind::Other(s),
        }
    }
}

impl From<&str> for RelationshipKind {
    fn from(s: &str) -> Self {
        RelationshipKind::from(s.to_string())
    }
}

impl From<RelationshipKind> for String {
    fn from(kind: RelationshipKind) -> Self {
        match kind {
            RelationshipKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unspecified_kind() -> RelationshipKind {
    RelationshipKind::Other(String::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub to: String,
    #[serde(rename = "type", default = "unspecified_kind", deserialize_with = "lenient_kind")]
    pub kind: RelationshipKind,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub target_handle: Option<String>,
}

impl Relationship {
    /// A relationship without an id or handles; the model fills both in.
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            id: String::new(),
            from: from.into(),
            to: to.into(),
            kind,
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_handles(mut self, source: Option<String>, target: Option<String>) -> Self {
        self.source_handle = source;
        self.target_handle = target;
        self
    }

    pub fn touches(&self, person_id: &str) -> bool {
        self.from == person_id || self.to == person_id
    }
}

/// Partial update for an existing relationship. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipPatch {
    pub from: Option<String>,
    pub to: Option<String>,
    pub kind: Option<RelationshipKind>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

impl RelationshipPatch {
    pub fn kind(kind: RelationshipKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn endpoints(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            ..Self::default()
        }
    }

    /// The record that results from applying this patch to `current`.
    pub fn apply_to(&self, current: &Relationship) -> Relationship {
        Relationship {
            id: current.id.clone(),
            from: self.from.clone().unwrap_or_else(|| current.from.clone()),
            to: self.to.clone().unwrap_or_else(|| current.to.clone()),
            kind: self.kind.clone().unwrap_or_else(|| current.kind.clone()),
            source_handle: self
                .source_handle
                .clone()
                .or_else(|| current.source_handle.clone()),
            target_handle: self
                .target_handle
                .clone()
                .or_else(|| current.target_handle.clone()),
        }
    }
}

/// The `{ "members": [...], "relationships": [...] }` exchange document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub members: Vec<Person>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// Text form of a JSON scalar. Arrays, objects and `null` have none.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(deserializer)?).filter(|s| !s.trim().is_empty()))
}

fn lenient_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RelationshipKind, D::Error> {
    Ok(scalar_text(Value::deserialize(deserializer)?)
        .map(RelationshipKind::from)
        .unwrap_or_else(unspecified_kind))
}

/// `true`, `"true"` and `1` are true; anything else is false.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    })
}

/// Unknown strings are `Other`; non-strings fall back to the default.
fn lenient_gender<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Gender, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => match s.as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Other,
        },
        _ => Gender::default(),
    })
}

/// A scalar becomes text, an array keeps its scalar items.
fn lenient_conditions<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<MedicalConditions>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(MedicalConditions::List(
            items.into_iter().filter_map(scalar_text).collect(),
        )),
        other => scalar_text(other).map(MedicalConditions::Text),
    })
}
