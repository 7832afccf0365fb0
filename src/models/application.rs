//! Application model, status state machine, and request DTOs.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an application.
///
/// `Approved` and `Rejected` are terminal: once set, no further transition
/// is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

/// An application by a user to join a project in a given role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub project_id: String,
    pub applicant_id: String,
    pub applicant_name: String,
    pub role: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_link: Option<String>,
    pub status: ApplicationStatus,
    /// Joined from the projects table on list endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for applying to a project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    pub role: String,
    pub message: String,
    #[serde(default)]
    pub github_profile: Option<String>,
    #[serde(default)]
    pub portfolio_link: Option<String>,
}

/// Request body for approving or rejecting an application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}
