//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{candidates, users, votes, voting_status};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    #[expect(dead_code, reason = "schema field for future audit trail support")]
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub full_name: &'a str,
    pub role: &'a str,
}

/// Row struct for reading from the candidates table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = candidates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CandidateRow {
    pub id: Uuid,
    pub name: String,
    pub party_name: String,
    pub is_independent: bool,
    pub description: String,
    pub order_index: i32,
    #[expect(dead_code, reason = "schema field for future audit trail support")]
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading the voting window.
#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = voting_status)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VotingStatusRow {
    #[expect(dead_code, reason = "constant-true key only addresses the row")]
    pub singleton: bool,
    pub is_open: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Changeset struct for transitioning the voting window.
#[derive(Debug, Clone, Copy, AsChangeset)]
#[diesel(table_name = voting_status)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct VotingStatusUpdate {
    pub is_open: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Row struct for reading from the votes table.
#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub candidate_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for recording accepted votes.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = votes)]
pub(crate) struct NewVoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub candidate_id: Uuid,
    pub created_at: DateTime<Utc>,
}
