//! # Fedreg: shared domain model for the federated-training registry
//!
//! This crate defines the vocabulary that the registry server, the client
//! SDK and the tooling around them all speak:
//!
//! - [`TrainingRecord`]: the stored description of a federated-training
//!   submission, from local draft to server-registered record.
//! - [`UpdatePatch`] and [`apply_update`]: the approval state machine. A
//!   record is created `PENDING` and may only ever be approved or rejected
//!   once it left the development stage; operational records freeze every
//!   field except the small set of flags an operator is allowed to touch.
//!
//! The server enforces these rules on every update request; the SDK uses
//! the same types to build submissions and interpret responses, so the two
//! sides cannot drift apart.

pub mod approval;
pub mod training;

pub use self::{
    approval::{apply_update, UpdateError, UpdatePatch},
    training::{ApprovalStatus, SchemaError, Stage, TrainingRecord},
};
