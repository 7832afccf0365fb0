//! Team message model.

use serde::{Deserialize, Serialize};

/// A message posted to a project's team chat. Append-only: messages are
/// never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    pub created_at: String,
}

/// Request body for posting a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub message: String,
}
