//! The approval state machine.
//!
//! Updates to a stored record arrive as an [`UpdatePatch`] and pass
//! through [`apply_update`], which evaluates the transition guards in a
//! fixed order before anything is mutated:
//!
//! 1. `PENDING` is never a valid target; it is only the creation default.
//! 2. A training still in development cannot be approved or rejected.
//! 3. A decided status is final: a rejected training cannot be approved
//!    (it must be resubmitted as a new record) and an approved one cannot
//!    be rejected.
//! 4. Once a training is operational, every field outside the
//!    operator-editable set (`is_valid`, `is_active`, `user_metadata`,
//!    `approval_status`) is frozen; a patch that would change one rejects
//!    the entire update.
//!
//! A status change stamps `approved_at`; repeating the stored status is a
//! no-op that leaves the timestamp untouched.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::training::{ApprovalStatus, Stage, TrainingRecord};

/// A partial update of a [`TrainingRecord`]. Absent fields keep their
/// stored value. Server-assigned fields (`id`, `owner`, the timestamps)
/// cannot be expressed here and are therefore read-only by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<HashMap<String, serde_json::Value>>,
}

impl UpdatePatch {
    /// A patch that only changes the approval status.
    pub fn approval(status: ApprovalStatus) -> Self {
        Self {
            approval_status: Some(status),
            ..Self::default()
        }
    }
}

/// An error returned when an update violates a transition guard.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateError {
    #[error("a training can only be approved or rejected")]
    PendingTarget,

    #[error("a training still in development cannot be approved or rejected")]
    StillInDevelopment,

    #[error("a rejected training cannot be approved; submit a new one instead")]
    AlreadyRejected,

    #[error("an approved training cannot be rejected")]
    AlreadyApproved,

    #[error("field `{0}` cannot change once the training is operational")]
    FrozenField(&'static str),
}

/// Applies `patch` to `stored`, returning the updated record.
///
/// Guards are evaluated in the order documented at the module level; the
/// stored record is never mutated on failure. `now` becomes the new
/// `approved_at` when the approval status changes, and the new
/// `modified_at` on every successful update.
pub fn apply_update(
    stored: &TrainingRecord,
    patch: &UpdatePatch,
    now: DateTime<Utc>,
) -> Result<TrainingRecord, UpdateError> {
    if let Some(status) = patch.approval_status {
        if status == ApprovalStatus::Pending {
            return Err(UpdateError::PendingTarget);
        }
        if stored.state == Stage::Development {
            return Err(UpdateError::StillInDevelopment);
        }
        if status == ApprovalStatus::Approved
            && stored.approval_status == ApprovalStatus::Rejected
        {
            return Err(UpdateError::AlreadyRejected);
        }
        if status == ApprovalStatus::Rejected
            && stored.approval_status == ApprovalStatus::Approved
        {
            return Err(UpdateError::AlreadyApproved);
        }
    }

    if stored.state == Stage::Operation {
        check_frozen_fields(stored, patch)?;
    }

    let mut updated = stored.clone();
    if let Some(status) = patch.approval_status {
        if status != stored.approval_status {
            updated.approval_status = status;
            updated.approved_at = Some(now);
        }
    }
    if let Some(name) = &patch.name {
        updated.name = name.clone();
    }
    if let Some(description) = &patch.description {
        updated.description = Some(description.clone());
    }
    if let Some(docs_url) = &patch.docs_url {
        updated.docs_url = Some(docs_url.clone());
    }
    if let Some(state) = patch.state {
        updated.state = state;
    }
    if let Some(is_valid) = patch.is_valid {
        updated.is_valid = is_valid;
    }
    if let Some(is_active) = patch.is_active {
        updated.is_active = is_active;
    }
    if let Some(metadata) = &patch.metadata {
        updated.metadata = metadata.clone();
    }
    if let Some(user_metadata) = &patch.user_metadata {
        updated.user_metadata = user_metadata.clone();
    }
    updated.modified_at = Some(now);
    Ok(updated)
}

/// Rejects the update if a patched field outside the operator-editable
/// set differs from its stored value.
fn check_frozen_fields(
    stored: &TrainingRecord,
    patch: &UpdatePatch,
) -> Result<(), UpdateError> {
    if let Some(name) = &patch.name {
        if *name != stored.name {
            return Err(UpdateError::FrozenField("name"));
        }
    }
    if let Some(description) = &patch.description {
        if stored.description.as_deref() != Some(description.as_str()) {
            return Err(UpdateError::FrozenField("description"));
        }
    }
    if let Some(docs_url) = &patch.docs_url {
        if stored.docs_url.as_deref() != Some(docs_url.as_str()) {
            return Err(UpdateError::FrozenField("docs_url"));
        }
    }
    if let Some(state) = patch.state {
        if state != stored.state {
            return Err(UpdateError::FrozenField("state"));
        }
    }
    if let Some(metadata) = &patch.metadata {
        if *metadata != stored.metadata {
            return Err(UpdateError::FrozenField("metadata"));
        }
    }
    Ok(())
}
