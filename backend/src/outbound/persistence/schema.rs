//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Application users, created on first successful login.
    users (id) {
        /// Primary key: the identity provider's subject UUID.
        id -> Uuid,
        /// Verified email address.
        email -> Varchar,
        /// Display name; the email local part when the provider sends none.
        full_name -> Varchar,
        /// Authorisation role, `user` or `admin`.
        role -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ballot candidates, managed outside this service.
    candidates (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Name shown on the ballot.
        name -> Varchar,
        /// Party affiliation.
        party_name -> Varchar,
        /// True when the candidate runs without a party.
        is_independent -> Bool,
        /// Short blurb shown alongside the name.
        description -> Text,
        /// Ballot position; ascending order defines display order.
        order_index -> Int4,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// The voting window. `singleton` is `DEFAULT true CHECK (singleton)`,
    /// so the table holds exactly one row by constraint.
    voting_status (singleton) {
        /// Constant-true primary key enforcing the single row.
        singleton -> Bool,
        /// True while votes are being accepted.
        is_open -> Bool,
        /// When the current window opened; null while closed.
        start_time -> Nullable<Timestamptz>,
        /// When the last window closed; null while open.
        end_time -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Accepted votes. `user_id` carries a UNIQUE constraint, the storage
    /// half of the one-vote-per-user invariant.
    votes (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The voter; unique across all rows.
        user_id -> Uuid,
        /// The chosen candidate.
        candidate_id -> Uuid,
        /// When the vote was accepted.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(votes -> users (user_id));
diesel::joinable!(votes -> candidates (candidate_id));

diesel::allow_tables_to_appear_in_same_query!(users, candidates, voting_status, votes);
