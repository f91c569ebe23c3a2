//! Whole-genogram JSON import and export.

use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::types::{Person, Relationship, Snapshot};

/// Parse a `{ "members": [...], "relationships": [...] }` document. Only
/// text that is not JSON at all is an error. A list that is missing or not an
/// array is read as empty, and a list entry that is not an object is skipped
/// with a warning. Mistyped fields inside an entry fall back to defaults.
pub fn parse(text: &str) -> Result<Snapshot> {
    let value: Value = serde_json::from_str(text)?;
    Ok(Snapshot {
        members: list(&value, "members"),
        relationships: list(&value, "relationships"),
    })
}

fn list<T: DeserializeOwned>(document: &Value, key: &str) -> Vec<T> {
    let Some(Value::Array(items)) = document.get(key) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            if !item.is_object() {
                warn!("skipping {key}[{i}]: not an object");
                return None;
            }
            T::deserialize(item)
                .map_err(|e| warn!("skipping {key}[{i}]: {e}"))
                .ok()
        })
        .collect()
}

/// The export form of a member: years derived from dates when missing,
/// death fields only for the deceased, empty conditions dropped.
pub fn normalize_person(person: &Person) -> Person {
    Person {
        id: person.id.clone(),
        name: person.name.clone(),
        gender: person.gender,
        birth_date: person.birth_date.clone(),
        birth_year: person.effective_birth_year(),
        deceased: person.deceased,
        death_date: person.death_date.clone().filter(|_| person.deceased),
        death_year: person.effective_death_year(),
        medical_conditions: person
            .medical_conditions
            .clone()
            .filter(|c| !c.is_empty()),
    }
}

pub fn export(persons: &[Person], relationships: &[Relationship]) -> Snapshot {
    Snapshot {
        members: persons.iter().map(normalize_person).collect(),
        relationships: relationships.to_vec(),
    }
}

/// Two-space indented JSON.
pub fn to_json(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenogramError;
    use crate::types::{Gender, MedicalConditions, RelationshipKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_or_non_array_lists_are_empty() {
        let s = parse(r#"{"members": {"a": 1}}"#).unwrap();
        assert!(s.members.is_empty());
        assert!(s.relationships.is_empty());

        let s = parse("[]").unwrap();
        assert_eq!(s, Snapshot::default());
    }

    #[test]
    fn invalid_json_is_malformed_input() {
        let err = parse("{ not json").unwrap_err();
        assert!(matches!(err, GenogramError::MalformedInput(_)), "got: {err:?}");
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let s = parse(
            r#"{
                "members": [{"id": "1", "name": "A"}, 42, "x", null, [1, 2]],
                "relationships": [true, {"id": "r1", "from": "1", "to": "1", "type": "married"}]
            }"#,
        )
        .unwrap();
        let ids: Vec<&str> = s.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
        assert_eq!(s.relationships.len(), 1);
        assert_eq!(s.relationships[0].id, "r1");
    }

    #[test]
    fn mistyped_fields_keep_the_rest_of_the_document() {
        let s = parse(
            r#"{"members": [
                {"id": "1", "name": "A", "deceased": "yes"},
                {"id": "2", "name": "B", "medicalConditions": 5},
                {"id": "3", "name": "C", "deceased": "true", "gender": ["female"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(s.members.len(), 3);
        assert!(!s.members[0].deceased);
        assert_eq!(
            s.members[1].medical_conditions,
            Some(MedicalConditions::Text("5".into()))
        );
        assert!(s.members[2].deceased);
        assert_eq!(s.members[2].gender, Gender::Male);
    }

    #[test]
    fn parses_members_and_relationships() {
        let s = parse(
            r#"{
                "members": [{"id": "1", "name": "John", "gender": "male"}],
                "relationships": [{"id": "r1", "from": "1", "to": "2", "type": "married"}]
            }"#,
        )
        .unwrap();
        assert_eq!(s.members[0].name, "John");
        assert_eq!(s.relationships[0].kind, RelationshipKind::Married);
    }

    #[test]
    fn export_derives_years_and_drops_death_fields_for_living() {
        let mut living = Person::new("Ann", Gender::Female)
            .with_id("a")
            .with_birth_date("1970-04-02")
            .with_death_date("2000-01-01")
            .with_conditions(MedicalConditions::Text("  ".into()));
        living.deceased = false;

        let out = normalize_person(&living);
        assert_eq!(out.birth_year.as_deref(), Some("1970"));
        assert_eq!(out.death_date, None);
        assert_eq!(out.death_year, None);
        assert_eq!(out.medical_conditions, None);

        let dead = Person::new("Bob", Gender::Male).with_death_date("1999-12-31");
        let out = normalize_person(&dead);
        assert_eq!(out.death_year.as_deref(), Some("1999"));
        assert_eq!(out.death_date.as_deref(), Some("1999-12-31"));
    }

    #[test]
    fn export_field_order() {
        let person = Person::new("Ann", Gender::Female)
            .with_id("a")
            .with_birth_date("1970-04-02");
        let rel = Relationship::new("a", "b", RelationshipKind::ParentChild)
            .with_id("r1")
            .with_handles(Some("right".into()), Some("left".into()));
        let json = serde_json::to_string(&export(&[person], &[rel])).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"members":[{"id":"a","name":"Ann","gender":"female","birthDate":"1970-04-02","#,
                r#""birthYear":"1970","deceased":false}],"#,
                r#""relationships":[{"id":"r1","from":"a","to":"b","type":"parent-child","#,
                r#""sourceHandle":"right","targetHandle":"left"}]}"#
            )
        );
    }

    #[test]
    fn pretty_output_uses_two_spaces() {
        let json = to_json(&Snapshot::default()).unwrap();
        assert_eq!(json, "{\n  \"members\": [],\n  \"relationships\": []\n}");
    }
}
