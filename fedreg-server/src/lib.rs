//! # Fedreg registry service
//!
//! The registry stores the descriptions of federated-training submissions
//! and runs them through the approval workflow. Clients talk to it over a
//! small JSON REST API:
//!
//! - `POST /federated-trainings` registers a new draft. The registry
//!   assigns the identifier and the owner, and enforces that a user owns
//!   at most one pending submission at a time.
//! - `GET /federated-trainings[?mine=1]` lists records, optionally
//!   restricted to the requester's own.
//! - `GET /federated-trainings/{id}` fetches a single record.
//! - `PUT /federated-trainings/{id}` applies a partial update through the
//!   approval state machine; approval decisions are reserved to admins.
//! - `DELETE /federated-trainings/{id}` removes a record (admins only).
//!
//! The layering follows the usual split: [`rest`] exposes the HTTP
//! surface, [`services`] holds the request handling and permission rules,
//! and [`storage`] abstracts the record store behind a trait so backends
//! can be swapped without touching the service code.

pub mod rest;
pub mod services;
pub mod settings;
pub mod storage;
