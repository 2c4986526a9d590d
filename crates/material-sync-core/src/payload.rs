//! Push payload as delivered by the source-control host.
//!
//! Only the fields the sync needs are modelled; everything else in the
//! payload is ignored.

use serde::Deserialize;

use crate::error::Error;
use crate::processor::ChangeSet;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    #[serde(default)]
    pub repository: Repository,
    #[serde(default)]
    pub commits: Vec<CommitPayload>,
    #[serde(default)]
    pub head_commit: Option<CommitPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl PushPayload {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Commits in delivery order. Payloads that only carry `head_commit`
    /// yield that single commit.
    pub fn commits(&self) -> Vec<&CommitPayload> {
        if self.commits.is_empty() {
            self.head_commit.iter().collect()
        } else {
            self.commits.iter().collect()
        }
    }
}

impl CommitPayload {
    pub fn change_set(&self) -> ChangeSet {
        ChangeSet {
            added: self.added.clone(),
            modified: self.modified.clone(),
            removed: self.removed.clone(),
        }
    }
}
