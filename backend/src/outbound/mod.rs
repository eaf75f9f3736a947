//! Outbound adapters driven by the domain: PostgreSQL persistence and the
//! hosted identity provider.

pub mod identity;
pub mod persistence;
