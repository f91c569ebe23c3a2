//! Relationship rules checked before anything is written to the model.

use crate::error::ValidationError;
use crate::types::{Person, Relationship};

/// Check `candidate` against the existing relationships. `exclude_id` names
/// the record being edited so it does not count as its own duplicate.
///
/// Rules run in order and the first violation wins: missing endpoint,
/// self relationship, duplicate. Duplicates are matched in both directions
/// for every type.
pub fn validate(
    existing: &[Relationship],
    candidate: &Relationship,
    exclude_id: Option<&str>,
) -> Result<(), ValidationError> {
    if candidate.from.trim().is_empty() || candidate.to.trim().is_empty() {
        return Err(ValidationError::MissingEndpoint);
    }

    if candidate.from == candidate.to {
        return Err(ValidationError::SelfRelationship);
    }

    let duplicate = existing
        .iter()
        .filter(|rel| exclude_id != Some(rel.id.as_str()))
        .any(|rel| is_duplicate(rel, candidate));
    if duplicate {
        return Err(ValidationError::Duplicate);
    }

    Ok(())
}

/// Both endpoints must name a member that exists right now.
pub fn check_endpoints(persons: &[Person], candidate: &Relationship) -> Result<(), ValidationError> {
    for endpoint in [&candidate.from, &candidate.to] {
        if !persons.iter().any(|p| &p.id == endpoint) {
            return Err(ValidationError::UnknownMember(endpoint.clone()));
        }
    }
    Ok(())
}

fn is_duplicate(existing: &Relationship, candidate: &Relationship) -> bool {
    if existing.kind != candidate.kind {
        return false;
    }
    let same = existing.from == candidate.from && existing.to == candidate.to;
    let reversed = existing.from == candidate.to && existing.to == candidate.from;
    same || reversed
}
