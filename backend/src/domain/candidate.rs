//! Candidate read model.
//!
//! Candidates are managed outside this service; the engine only reads them.
//! Wire fields stay snake_case to match the storage rows the original clients
//! consume directly.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stable candidate identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(Uuid);

impl CandidateId {
    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`CandidateId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate on the ballot, read-only to this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Candidate {
    /// Stable candidate identifier.
    #[schema(value_type = String, example = "7c9e6679-7425-40de-944b-e07fc1f90ae7")]
    pub id: CandidateId,
    /// Name shown on the ballot.
    pub name: String,
    /// Party affiliation; empty for independents is permitted but unusual.
    pub party_name: String,
    /// True when the candidate runs without a party.
    pub is_independent: bool,
    /// Short blurb shown alongside the name.
    pub description: String,
    /// Ballot position; ascending order defines display order.
    pub order_index: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn wire_fields_are_snake_case() {
        let candidate = Candidate {
            id: CandidateId::random(),
            name: "Ada Lovelace".to_owned(),
            party_name: "Analytical Party".to_owned(),
            is_independent: false,
            description: "First programmer".to_owned(),
            order_index: 1,
        };
        let json = serde_json::to_value(&candidate).expect("serialise candidate");
        assert!(json.get("party_name").is_some());
        assert!(json.get("is_independent").is_some());
        assert!(json.get("order_index").is_some());
    }
}
