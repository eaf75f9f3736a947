//! Outbound adapter for the hosted identity provider.

mod http_provider;

pub use http_provider::HttpIdentityProvider;
