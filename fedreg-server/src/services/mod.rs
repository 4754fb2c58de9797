//! The services the registry provides on top of the storage layer.
//!
//! [`TrainingService`] carries the request handling for all training
//! endpoints: registration with the single-pending-submission guard,
//! reads, the approval workflow (driven by the transition rules in
//! `fedreg_core::approval`) and the admin-only delete. The REST layer
//! stays a thin translation between HTTP and this service.

pub mod trainings;

pub use self::trainings::{Requester, ServiceError, TrainingService};

#[cfg(test)]
mod tests;
