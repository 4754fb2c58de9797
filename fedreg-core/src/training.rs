//! The training record and its schema rules.

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Maximum length of a training description, in characters.
pub const DESCRIPTION_MAX_LEN: usize = 20;

/// The deployment stage of a training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// The training is still being put together and may change freely.
    Development,
    /// The training is operational: all fields are frozen except the
    /// operator-editable flags.
    Operation,
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Development
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Development => write!(f, "DEVELOPMENT"),
            Stage::Operation => write!(f, "OPERATION"),
        }
    }
}

/// The approval status of a training.
///
/// Every record starts out `PENDING`. The registry only ever moves it
/// forward via [`apply_update`]; `PENDING` is never a valid target.
///
/// [`apply_update`]: crate::approval::apply_update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        ApprovalStatus::Pending
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "PENDING"),
            ApprovalStatus::Approved => write!(f, "APPROVED"),
            ApprovalStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// An error returned when a draft fails schema validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("a training needs a non-empty name")]
    EmptyName,

    #[error("description must be at most {} characters", DESCRIPTION_MAX_LEN)]
    DescriptionTooLong,

    #[error("docs_url is not a valid HTTP(S) URL")]
    InvalidDocsUrl,
}

/// The description of a federated-training submission.
///
/// A record without an [`id`] is a local draft; the registry assigns the
/// identifier, the owner and the timestamps when the draft is created
/// remotely. The [`generated_uid`] keys the local cache directory until
/// then.
///
/// [`id`]: TrainingRecord::id
/// [`generated_uid`]: TrainingRecord::generated_uid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// Server-assigned identifier. `None` for drafts.
    #[serde(default)]
    pub id: Option<u64>,
    /// Human-readable name of the training.
    pub name: String,
    /// Short free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Link to the training's documentation.
    #[serde(default)]
    pub docs_url: Option<String>,
    /// Identifier of the submitting user. Assigned by the registry on
    /// create, immutable afterwards.
    #[serde(default)]
    pub owner: Option<u64>,
    /// Deployment stage.
    #[serde(default)]
    pub state: Stage,
    /// Approval status. Only the registry's approval workflow moves this.
    #[serde(default)]
    pub approval_status: ApprovalStatus,
    /// Set exactly when `approval_status` leaves `PENDING`.
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_valid: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Free-form metadata populated by tooling.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Free-form metadata owned by the submitting user. Stays editable
    /// even once the training is operational.
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,
    /// Marks a throwaway test entity. Test entities are never uploaded.
    #[serde(default)]
    pub for_test: bool,
    /// Locally generated identifier that keys the cache directory while
    /// no server identifier has been assigned yet.
    #[serde(default)]
    pub generated_uid: String,
}

fn default_true() -> bool {
    true
}

impl TrainingRecord {
    /// Creates a new local draft with a fresh `generated_uid`.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        docs_url: Option<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description,
            docs_url,
            owner: None,
            state: Stage::default(),
            approval_status: ApprovalStatus::default(),
            approved_at: None,
            created_at: None,
            modified_at: None,
            is_valid: true,
            is_active: true,
            metadata: HashMap::new(),
            user_metadata: HashMap::new(),
            for_test: false,
            generated_uid: Uuid::new_v4().to_simple().to_string(),
        }
    }

    /// Checks the schema rules a draft must satisfy before submission.
    ///
    /// # Errors
    /// Fails if the name is empty, the description exceeds
    /// [`DESCRIPTION_MAX_LEN`] characters, or `docs_url` is not a valid
    /// HTTP(S) URL.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_LEN {
                return Err(SchemaError::DescriptionTooLong);
            }
        }
        if let Some(docs_url) = &self.docs_url {
            let url = Url::parse(docs_url).map_err(|_| SchemaError::InvalidDocsUrl)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(SchemaError::InvalidDocsUrl);
            }
        }
        Ok(())
    }

    /// The key under which this record is cached locally: the decimal
    /// server identifier when assigned, the generated uid otherwise.
    pub fn storage_key(&self) -> String {
        match self.id {
            Some(id) => id.to_string(),
            None => self.generated_uid.clone(),
        }
    }
}
