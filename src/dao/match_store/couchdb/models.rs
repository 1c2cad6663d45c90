use serde::{Deserialize, Serialize};

use crate::dao::models::PersistedMatch;

/// Stored match document: the snapshot plus CouchDB bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchMatchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub snapshot: PersistedMatch,
}

/// Minimal projection used to learn the current revision.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

impl CouchMatchDocument {
    pub fn new(id: impl Into<String>, rev: Option<String>, snapshot: PersistedMatch) -> Self {
        Self {
            id: id.into(),
            rev,
            snapshot,
        }
    }
}
