//! This crate provides the client-side building blocks for working with
//! the Fedreg registry.
//!
//! - [`client::Client`] talks to the registry's REST API. It is generic
//!   over a small HTTP backend trait; a `reqwest`-based backend ships
//!   behind the `reqwest-client` feature (enabled by default).
//! - [`store::LocalStore`] caches training descriptors on disk, one
//!   directory per record with a YAML descriptor file.
//! - [`submit::Submission`] registers a new draft: it refuses throwaway
//!   test entities, uploads the draft, and moves the local cache entry
//!   from its draft path to the permanent path keyed by the assigned
//!   identifier.
//! - [`fetch`] implements the two-tier reads: the registry is asked
//!   first, and a communication failure falls back to the local cache.
//!   Write paths never fall back.

pub mod client;
pub mod fetch;
pub mod store;
pub mod submit;
mod traits;

pub use self::traits::RegistryClient;
